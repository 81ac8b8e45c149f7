/// Data gap detection.
///
/// A gap is either a run of missing values or a hole in the index (two
/// present samples further apart than the expected frequency). Both kinds
/// are collected as position spans, overlapping or adjacent spans are merged, and the
/// merged spans at least `min_len` sampling steps long are reported.
///
/// Sizing note: a missing run bracketed by present samples is merged into
/// the injected span between those samples, so the reported period includes
/// the bracketing readings and can be longer than the number of missing
/// samples suggests (four missing days report as a five day period). A
/// missing run at either end of the series has no bracketing sample and is
/// sized by its raw span, which is one step shorter. Both behaviours are
/// kept as-is for compatibility with existing gap reports.

use std::ops::RangeInclusive;

use log::debug;
use serde::Deserialize;

use super::{hours, EventKind};
use crate::analysis::frequency::infer_frequency;
use crate::analysis::groupings::group_condition_by_time;
use crate::model::{EventError, TimeSeries};
use crate::periods::TimePeriod;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DataGapParams {
    /// Expected sampling interval in hours; `None` uses the series'
    /// nominal frequency.
    pub expected_frequency_hours: Option<f64>,
    /// Minimum reported gap length, in sampling steps.
    pub min_len: f64,
}

impl Default for DataGapParams {
    fn default() -> Self {
        Self {
            expected_frequency_hours: None,
            min_len: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct DataGap;

impl EventKind for DataGap {
    type Params = DataGapParams;
    type Event = TimePeriod;

    const NAME: &'static str = "data_gap";

    fn detect(data: &TimeSeries, params: &DataGapParams) -> Result<Vec<TimePeriod>, EventError> {
        let step = match params.expected_frequency_hours {
            Some(h) if h > 0.0 => hours("expected_frequency_hours", h)?,
            Some(h) => {
                return Err(EventError::ConfigurationError(format!(
                    "expected frequency must be positive, got {} hours",
                    h
                )))
            }
            None => infer_frequency(data).map(|f| f.step()).ok_or_else(|| {
                EventError::ConfigurationError(
                    "series frequency is unknown; pass an expected frequency".to_string(),
                )
            })?,
        };

        let missing = data.condition(f64::is_nan);
        let mut spans: Vec<RangeInclusive<usize>> = group_condition_by_time(&missing)
            .values()
            .map(|run| run.positions())
            .collect();

        // Holes between consecutive present samples
        let index = data.index();
        let injected: Vec<RangeInclusive<usize>> = data
            .present_positions()
            .windows(2)
            .filter(|pair| index[pair[1]] - index[pair[0]] > step)
            .map(|pair| pair[0]..=pair[1])
            .collect();
        debug!(
            "data_gap: {} missing runs, {} injected spans",
            spans.len(),
            injected.len()
        );
        spans.extend(injected);

        if !params.min_len.is_finite() || params.min_len < 0.0 {
            return Err(EventError::ConfigurationError(format!(
                "min_len must be a finite, non-negative number of steps, got {}",
                params.min_len
            )));
        }
        let min_duration = hours(
            "min_len",
            params.min_len * step.num_milliseconds() as f64 / 3_600_000.0,
        )?;
        merge_overlapping(spans)
            .into_iter()
            .map(|span| TimePeriod::new(data.slice(*span.start()..*span.end() + 1)))
            .filter(|period| match period {
                Ok(p) => p.duration() >= min_duration,
                Err(_) => true,
            })
            .collect()
    }
}

/// Sorts spans by start and unions any that share or abut a position.
fn merge_overlapping(mut spans: Vec<RangeInclusive<usize>>) -> Vec<RangeInclusive<usize>> {
    spans.sort_by_key(|span| (*span.start(), *span.end()));

    let mut merged: Vec<RangeInclusive<usize>> = Vec::with_capacity(spans.len());
    for span in spans {
        match merged.last_mut() {
            Some(last) if *span.start() <= *last.end() + 1 => {
                let end = (*last.end()).max(*span.end());
                *last = *last.start()..=end;
            }
            _ => merged.push(span),
        }
    }
    merged
}
