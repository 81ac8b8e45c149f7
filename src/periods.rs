/// Result records: periods of timeseries data that met a detector's criteria.
///
/// A period owns a copy of the slice it describes, so it stays valid after
/// the detector (and its series) is dropped. Derived attributes are computed
/// once at construction.

use std::fmt;
use std::ops::Deref;

use chrono::{Duration, NaiveDateTime};
use serde::Serialize;

use crate::model::{EventError, TimeSeries};

/// A contiguous, non-empty time slice of a series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimePeriod {
    data: TimeSeries,
    start: NaiveDateTime,
    stop: NaiveDateTime,
    #[serde(serialize_with = "serialize_duration_seconds")]
    duration: Duration,
}

impl TimePeriod {
    /// # Errors
    /// - `EventError::InvalidSeries` — `data` is empty, so it has no start.
    pub fn new(data: TimeSeries) -> Result<Self, EventError> {
        let (start, stop) = match (data.index().first(), data.index().last()) {
            (Some(first), Some(last)) => (*first, *last),
            _ => {
                return Err(EventError::InvalidSeries(
                    "a period needs at least one sample".to_string(),
                ))
            }
        };
        Ok(Self {
            data,
            start,
            stop,
            duration: stop - start,
        })
    }

    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    pub fn stop(&self) -> NaiveDateTime {
        self.stop
    }

    /// `stop - start`; a time span, not a count of observations.
    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn data(&self) -> &TimeSeries {
        &self.data
    }

    /// Number of observations in the period.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl fmt::Display for TimePeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Time Period ({} - {})",
            self.start.format("%Y-%m-%dT%H:%M:%S"),
            self.stop.format("%Y-%m-%dT%H:%M:%S")
        )
    }
}

/// A period additionally characterized by the sum of its values, e.g. total
/// storm precipitation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CumulativePeriod {
    #[serde(flatten)]
    period: TimePeriod,
    total: f64,
}

impl CumulativePeriod {
    pub fn new(data: TimeSeries) -> Result<Self, EventError> {
        let total = data.sum();
        Ok(Self {
            period: TimePeriod::new(data)?,
            total,
        })
    }

    /// Sum of the period's values, missing values skipped.
    pub fn total(&self) -> f64 {
        self.total
    }
}

impl Deref for CumulativePeriod {
    type Target = TimePeriod;

    fn deref(&self) -> &TimePeriod {
        &self.period
    }
}

impl fmt::Display for CumulativePeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Cumulative Period ({} - {})",
            self.start().format("%Y-%m-%dT%H:%M:%S"),
            self.stop().format("%Y-%m-%dT%H:%M:%S")
        )
    }
}

fn serialize_duration_seconds<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_i64(duration.num_seconds())
}
