/// Flat line detection: stretches where a sensor stops moving.
///
/// A sample is flat when its first difference is within `slope_thresh` of
/// zero. Runs of flat samples at least `min_len` observations long are
/// reported. The first sample has no difference and is never flat.

use serde::Deserialize;

use super::{periods_from_condition, EventKind};
use crate::model::{EventError, TimeSeries};
use crate::periods::TimePeriod;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct FlatLineParams {
    /// Largest absolute first difference still considered flat.
    pub slope_thresh: f64,
    /// Minimum number of flat observations in a reported run.
    pub min_len: usize,
}

impl Default for FlatLineParams {
    fn default() -> Self {
        Self {
            slope_thresh: 0.0,
            min_len: 5,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FlatLine;

impl EventKind for FlatLine {
    type Params = FlatLineParams;
    type Event = TimePeriod;

    const NAME: &'static str = "flat_line";

    fn detect(data: &TimeSeries, params: &FlatLineParams) -> Result<Vec<TimePeriod>, EventError> {
        let diff = data.diff();
        let condition = diff.condition(|d| d.abs() <= params.slope_thresh);
        periods_from_condition(data, &condition, |run| run.len() >= params.min_len)
    }
}
