/// TimeSeries, Frequency, EventError
/// core data structures and error handling
///
/// Core data types for the event detection library.
///
/// This module defines the shared domain model imported by all other modules.
/// It contains no detection logic and no I/O — only types and the small set
/// of series operations every detector needs (slicing, sums, differences).

use chrono::{Duration, NaiveDateTime};
use serde::Serialize;
use std::ops::Range;

// ---------------------------------------------------------------------------
// Frequency
// ---------------------------------------------------------------------------

/// Nominal spacing between consecutive timestamps of a series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frequency {
    step: Duration,
}

impl Frequency {
    pub fn new(step: Duration) -> Self {
        Self { step }
    }

    pub fn days(days: i64) -> Self {
        Self::new(Duration::days(days))
    }

    pub fn hours(hours: i64) -> Self {
        Self::new(Duration::hours(hours))
    }

    pub fn step(&self) -> Duration {
        self.step
    }

    /// Resolution label of the step: the finest unit with a non-zero
    /// component ("D", "H", "T", "S", "L"). A two day step is still "D".
    pub fn label(&self) -> &'static str {
        let ms = self.step.num_milliseconds();
        if ms % 1_000 != 0 {
            "L"
        } else if ms % 60_000 != 0 {
            "S"
        } else if ms % 3_600_000 != 0 {
            "T"
        } else if ms % 86_400_000 != 0 {
            "H"
        } else {
            "D"
        }
    }
}

// ---------------------------------------------------------------------------
// TimeSeries
// ---------------------------------------------------------------------------

/// An ordered mapping from timestamp to value.
///
/// Invariants, enforced at construction:
///   - `index` and `values` have the same length
///   - `index` is strictly increasing (sorted, no duplicates)
///
/// Missing observations are stored as `f64::NAN`.
#[derive(Debug, Clone, Serialize)]
pub struct TimeSeries {
    index: Vec<NaiveDateTime>,
    values: Vec<f64>,
    #[serde(skip)]
    frequency: Option<Frequency>,
}

impl TimeSeries {
    /// Builds a series from an already sorted index.
    ///
    /// # Errors
    /// - `EventError::InvalidSeries` — length mismatch or an index that is
    ///   not strictly increasing.
    pub fn new(index: Vec<NaiveDateTime>, values: Vec<f64>) -> Result<Self, EventError> {
        if index.len() != values.len() {
            return Err(EventError::InvalidSeries(format!(
                "index has {} timestamps but {} values were given",
                index.len(),
                values.len()
            )));
        }
        if let Some(pair) = index.windows(2).find(|w| w[0] >= w[1]) {
            return Err(EventError::InvalidSeries(format!(
                "index must be strictly increasing ({} is followed by {})",
                pair[0], pair[1]
            )));
        }
        Ok(Self { index, values, frequency: None })
    }

    /// Builds a series from (timestamp, value) pairs in any order, sorting
    /// them by timestamp first. Duplicate timestamps are still rejected.
    pub fn from_unsorted(mut pairs: Vec<(NaiveDateTime, f64)>) -> Result<Self, EventError> {
        pairs.sort_by_key(|(t, _)| *t);
        let (index, values) = pairs.into_iter().unzip();
        Self::new(index, values)
    }

    /// Builds a regular series of `values` starting at `start`, one `step`
    /// apart, annotated with that step as its nominal frequency.
    pub fn regular(start: NaiveDateTime, step: Duration, values: Vec<f64>) -> Result<Self, EventError> {
        if step <= Duration::zero() {
            return Err(EventError::InvalidSeries("step must be positive".to_string()));
        }
        let index = (0..values.len())
            .map(|i| {
                i32::try_from(i)
                    .ok()
                    .and_then(|n| step.checked_mul(n))
                    .and_then(|offset| start.checked_add_signed(offset))
                    .ok_or_else(|| {
                        EventError::InvalidSeries(format!("timestamp {} is out of range", i))
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(index, values)?.with_frequency(Frequency::new(step)))
    }

    /// Annotates the series with an explicit nominal frequency.
    pub fn with_frequency(mut self, frequency: Frequency) -> Self {
        self.frequency = Some(frequency);
        self
    }

    pub fn frequency(&self) -> Option<Frequency> {
        self.frequency
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn index(&self) -> &[NaiveDateTime] {
        &self.index
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn first_timestamp(&self) -> Option<NaiveDateTime> {
        self.index.first().copied()
    }

    /// Iterates over (timestamp, value) pairs in index order.
    pub fn iter(&self) -> impl Iterator<Item = (NaiveDateTime, f64)> + '_ {
        self.index.iter().copied().zip(self.values.iter().copied())
    }

    /// Copies the samples at `positions` into a new series. The nominal
    /// frequency carries over.
    pub fn slice(&self, positions: Range<usize>) -> TimeSeries {
        TimeSeries {
            index: self.index[positions.clone()].to_vec(),
            values: self.values[positions].to_vec(),
            frequency: self.frequency,
        }
    }

    /// Positions of all samples with `start <= t <= stop`.
    pub fn positions_between(&self, start: NaiveDateTime, stop: NaiveDateTime) -> Range<usize> {
        let lo = self.index.partition_point(|t| *t < start);
        let hi = self.index.partition_point(|t| *t <= stop);
        lo..hi.max(lo)
    }

    /// Label-based slice: every sample with `start <= t <= stop`.
    pub fn slice_between(&self, start: NaiveDateTime, stop: NaiveDateTime) -> TimeSeries {
        self.slice(self.positions_between(start, stop))
    }

    /// Sum of values with `start <= t <= stop`, skipping missing values.
    pub fn sum_between(&self, start: NaiveDateTime, stop: NaiveDateTime) -> f64 {
        nan_sum(&self.values[self.positions_between(start, stop)])
    }

    /// Sum of all values, skipping missing values.
    pub fn sum(&self) -> f64 {
        nan_sum(&self.values)
    }

    /// First difference `v[i] - v[i-1]`. The first element has no
    /// predecessor and is missing.
    pub fn diff(&self) -> TimeSeries {
        let mut values = Vec::with_capacity(self.values.len());
        if !self.values.is_empty() {
            values.push(f64::NAN);
        }
        values.extend(self.values.windows(2).map(|w| w[1] - w[0]));
        TimeSeries {
            index: self.index.clone(),
            values,
            frequency: self.frequency,
        }
    }

    /// Positions of samples that are not missing.
    pub fn present_positions(&self) -> Vec<usize> {
        self.values
            .iter()
            .enumerate()
            .filter(|(_, v)| !v.is_nan())
            .map(|(i, _)| i)
            .collect()
    }

    /// A boolean mask over this series' index built from a per-value
    /// predicate.
    pub fn condition<F>(&self, predicate: F) -> ConditionSeries<'_>
    where
        F: Fn(f64) -> bool,
    {
        ConditionSeries::new(self.index(), self.values.iter().map(|v| predicate(*v)).collect())
    }
}

/// Missing values compare equal to each other, so two series built from the
/// same observations are equal even when both have gaps.
impl PartialEq for TimeSeries {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index
            && self.frequency == other.frequency
            && self.values.len() == other.values.len()
            && self
                .values
                .iter()
                .zip(other.values.iter())
                .all(|(a, b)| a == b || (a.is_nan() && b.is_nan()))
    }
}

fn nan_sum(values: &[f64]) -> f64 {
    values.iter().filter(|v| !v.is_nan()).sum()
}

// ---------------------------------------------------------------------------
// Condition series
// ---------------------------------------------------------------------------

/// A boolean series sharing the index of the series it was derived from.
/// Lives only for the duration of one detection call.
#[derive(Debug, Clone, PartialEq)]
pub struct ConditionSeries<'a> {
    index: &'a [NaiveDateTime],
    mask: Vec<bool>,
}

impl<'a> ConditionSeries<'a> {
    /// Callers derive `mask` element-wise from `index`; a length mismatch
    /// is a bug and panics.
    pub(crate) fn new(index: &'a [NaiveDateTime], mask: Vec<bool>) -> Self {
        assert_eq!(index.len(), mask.len(), "condition mask must align with its index");
        Self { index, mask }
    }

    pub fn index(&self) -> &'a [NaiveDateTime] {
        self.index
    }

    pub fn mask(&self) -> &[bool] {
        &self.mask
    }

    pub fn len(&self) -> usize {
        self.mask.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mask.is_empty()
    }

    /// Element-wise OR with another condition over the same index.
    pub fn or(mut self, other: &ConditionSeries<'_>) -> Self {
        for (a, b) in self.mask.iter_mut().zip(other.mask.iter()) {
            *a = *a || *b;
        }
        self
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can arise when building series, fetching station data or
/// running a detector.
#[derive(Debug, PartialEq)]
pub enum EventError {
    /// Invalid or missing parameter combination, or an unsupported network.
    ConfigurationError(String),
    /// The data source returned nothing for the requested station/date range.
    DataUnavailable(String),
    /// The series is too short for the requested computation.
    InsufficientData { needed: usize, found: usize },
    /// A series could not be built because its index broke an invariant.
    InvalidSeries(String),
    /// Non-2xx HTTP response from a station data service.
    HttpError(u16),
    /// The request never produced a response (DNS, TLS, timeout, ...).
    RequestError(String),
    /// A response body or configuration file could not be parsed.
    ParseError(String),
}

impl std::fmt::Display for EventError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventError::ConfigurationError(msg) => write!(f, "Configuration error: {}", msg),
            EventError::DataUnavailable(msg) => write!(f, "No data available: {}", msg),
            EventError::InsufficientData { needed, found } => write!(
                f,
                "Insufficient data: need more than {} samples, found {}",
                needed, found
            ),
            EventError::InvalidSeries(msg) => write!(f, "Invalid series: {}", msg),
            EventError::HttpError(code) => write!(f, "HTTP error: {}", code),
            EventError::RequestError(msg) => write!(f, "Request error: {}", msg),
            EventError::ParseError(msg) => write!(f, "Parse error: {}", msg),
        }
    }
}

impl std::error::Error for EventError {}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
