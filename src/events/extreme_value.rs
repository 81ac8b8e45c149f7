/// Extreme value detection: readings outside the physically expected range.
///
/// Every run of out-of-range samples is an event; there is no length filter.

use serde::Deserialize;

use super::{periods_from_condition, EventKind};
use crate::model::{EventError, TimeSeries};
use crate::periods::TimePeriod;

/// Both bounds are required; there is no sensible default range.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ExtremeValueParams {
    pub expected_max: f64,
    pub expected_min: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct ExtremeValue;

impl EventKind for ExtremeValue {
    type Params = ExtremeValueParams;
    type Event = TimePeriod;

    const NAME: &'static str = "extreme_value";

    fn detect(
        data: &TimeSeries,
        params: &ExtremeValueParams,
    ) -> Result<Vec<TimePeriod>, EventError> {
        let condition = data.condition(|v| v > params.expected_max || v < params.expected_min);
        periods_from_condition(data, &condition, |_| true)
    }
}
