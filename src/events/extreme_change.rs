/// Extreme change detection: first differences beyond a rise or fall limit.
///
/// Either limit may be switched off by leaving it unset, but not both.

use serde::Deserialize;

use super::{periods_from_condition, EventKind};
use crate::model::{EventError, TimeSeries};
use crate::periods::TimePeriod;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ExtremeChangeParams {
    /// Rises of at least this much per step are extreme.
    pub positive_slope_thresh: Option<f64>,
    /// Falls to at most this (negative) change per step are extreme.
    pub negative_slope_thresh: Option<f64>,
    pub min_len: usize,
}

impl Default for ExtremeChangeParams {
    fn default() -> Self {
        Self {
            positive_slope_thresh: None,
            negative_slope_thresh: None,
            min_len: 1,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ExtremeChange;

impl EventKind for ExtremeChange {
    type Params = ExtremeChangeParams;
    type Event = TimePeriod;

    const NAME: &'static str = "extreme_change";

    fn detect(
        data: &TimeSeries,
        params: &ExtremeChangeParams,
    ) -> Result<Vec<TimePeriod>, EventError> {
        if params.positive_slope_thresh.is_none() && params.negative_slope_thresh.is_none() {
            return Err(EventError::ConfigurationError(
                "at least one slope threshold required".to_string(),
            ));
        }

        let diff = data.diff();
        let rising = diff.condition(|d| params.positive_slope_thresh.is_some_and(|t| d >= t));
        let falling = diff.condition(|d| params.negative_slope_thresh.is_some_and(|t| d <= t));
        let condition = rising.or(&falling);

        periods_from_condition(data, &condition, |run| run.len() >= params.min_len)
    }
}
