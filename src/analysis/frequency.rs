/// Nominal frequency inference.
///
/// Detectors that need to "add one step" (storm onset back-extension, run
/// durations, gap sizing) ask here for the series' sampling interval.

use std::collections::BTreeSet;

use chrono::Duration;

use crate::model::{Frequency, TimeSeries};

/// Returns the series' nominal frequency.
///
/// An explicit frequency annotation wins. Otherwise the first and last
/// timestamps are dropped and the differences between consecutive interior
/// timestamps are inspected: if exactly one distinct difference occurs it is
/// the frequency, anything else (irregular, or too few interior samples)
/// yields `None`.
pub fn infer_frequency(series: &TimeSeries) -> Option<Frequency> {
    if let Some(freq) = series.frequency() {
        return Some(freq);
    }

    let index = series.index();
    if index.len() < 3 {
        return None;
    }
    let interior = &index[1..index.len() - 1];

    let steps: BTreeSet<Duration> = interior.windows(2).map(|w| w[1] - w[0]).collect();
    if steps.len() == 1 {
        steps.into_iter().next().map(Frequency::new)
    } else {
        None
    }
}
