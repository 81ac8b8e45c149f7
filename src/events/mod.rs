/// Event detectors.
///
/// Every detector follows the same shape: derive a boolean condition from
/// the series, group it into runs, then accept, merge or filter those runs
/// according to the event's own rules. The per-event part lives behind the
/// `EventKind` trait; `EventDetector<K>` owns the series and the results and
/// is the same for every kind.
///
/// Submodules:
/// - `storm`          — precipitation storms (run merging state machine)
/// - `spike`          — spikes and valleys (rolling statistics or peak finding)
/// - `data_gap`       — missing values and missing index rows
/// - `flat_line`      — stuck sensors (near-zero first difference)
/// - `extreme_value`  — values outside an expected range
/// - `extreme_change` — first difference beyond slope thresholds
/// - `outlier`        — robust point outliers (modified z-score)

pub mod data_gap;
pub mod extreme_change;
pub mod extreme_value;
pub mod flat_line;
pub mod outlier;
pub mod spike;
pub mod storm;

use std::fmt;
use std::marker::PhantomData;

use chrono::{Duration, NaiveDate};
use log::debug;

use crate::analysis::groupings::{group_condition_by_time, Run};
use crate::ingest;
use crate::model::{ConditionSeries, EventError, TimeSeries};
use crate::periods::TimePeriod;

pub use data_gap::{DataGap, DataGapParams};
pub use extreme_change::{ExtremeChange, ExtremeChangeParams};
pub use extreme_value::{ExtremeValue, ExtremeValueParams};
pub use flat_line::{FlatLine, FlatLineParams};
pub use outlier::{Outlier, OutlierParams, OutlierPoint};
pub use spike::{SpikeStrategy, SpikeValley, SpikeValleyParams};
pub use storm::{Storm, StormParams};

// ---------------------------------------------------------------------------
// Detector contract
// ---------------------------------------------------------------------------

/// The per-event part of a detector: how parameters turn a series into
/// events.
pub trait EventKind {
    /// Tunable thresholds for one detection run.
    type Params;
    /// One detected event.
    type Event: fmt::Debug + Clone;

    /// Short name used in log lines.
    const NAME: &'static str;

    /// Runs the detection. Must be a pure function of its arguments.
    fn detect(data: &TimeSeries, params: &Self::Params) -> Result<Vec<Self::Event>, EventError>;
}

/// Owns a series and the events most recently found in it.
#[derive(Debug)]
pub struct EventDetector<K: EventKind> {
    data: TimeSeries,
    events: Vec<K::Event>,
    kind: PhantomData<K>,
}

pub type StormEvents = EventDetector<Storm>;
pub type SpikeValleyEvent = EventDetector<SpikeValley>;
pub type DataGapEvent = EventDetector<DataGap>;
pub type FlatLineEvent = EventDetector<FlatLine>;
pub type ExtremeValueEvent = EventDetector<ExtremeValue>;
pub type ExtremeChangeEvent = EventDetector<ExtremeChange>;
pub type OutlierEvents = EventDetector<Outlier>;

impl<K: EventKind> EventDetector<K> {
    pub fn new(data: TimeSeries) -> Self {
        Self {
            data,
            events: Vec::new(),
            kind: PhantomData,
        }
    }

    /// Builds a detector over the incremental precipitation of a station,
    /// pulled from `network` (see `ingest::from_station`).
    pub fn from_station(
        station_id: &str,
        start: NaiveDate,
        stop: NaiveDate,
        network: &str,
        station_name: Option<&str>,
    ) -> Result<Self, EventError> {
        let data = ingest::from_station(station_id, start, stop, network, station_name)?;
        Ok(Self::new(data))
    }

    /// Detects events with `params`, replacing any previous results.
    ///
    /// On error the event list is left empty.
    pub fn find(&mut self, params: &K::Params) -> Result<(), EventError> {
        self.events.clear();
        self.events = K::detect(&self.data, params)?;
        debug!("{}: found {} events in {} samples", K::NAME, self.events.len(), self.data.len());
        Ok(())
    }

    pub fn data(&self) -> &TimeSeries {
        &self.data
    }

    pub fn events(&self) -> &[K::Event] {
        &self.events
    }

    /// Number of events found by the last `find`.
    pub fn count(&self) -> usize {
        self.events.len()
    }

    pub fn into_events(self) -> Vec<K::Event> {
        self.events
    }
}

// ---------------------------------------------------------------------------
// Shared pipeline
// ---------------------------------------------------------------------------

/// Groups `condition` into runs and turns every run accepted by `keep` into
/// a `TimePeriod` over the matching slice of `data`, in time order.
pub(crate) fn periods_from_condition<F>(
    data: &TimeSeries,
    condition: &ConditionSeries<'_>,
    keep: F,
) -> Result<Vec<TimePeriod>, EventError>
where
    F: Fn(&Run) -> bool,
{
    group_condition_by_time(condition)
        .values()
        .filter(|run| keep(run))
        .map(|run| TimePeriod::new(data.slice(run.first..run.last + 1)))
        .collect()
}

/// Converts fractional hours from a parameter set into a duration.
///
/// `name` is the parameter the value came from and only appears in the error.
///
/// # Errors
/// `EventError::ConfigurationError` when `hours` is NaN, infinite, negative,
/// or too large for a `Duration`.
pub(crate) fn hours(name: &str, hours: f64) -> Result<Duration, EventError> {
    if !hours.is_finite() || hours < 0.0 {
        return Err(EventError::ConfigurationError(format!(
            "{} must be a finite, non-negative number of hours, got {}",
            name, hours
        )));
    }
    // `as i64` saturates, so the bound is checked on the float
    let millis = (hours * 3_600_000.0).round();
    Some(millis)
        .filter(|ms| *ms < i64::MAX as f64)
        .and_then(|ms| Duration::try_milliseconds(ms as i64))
        .ok_or_else(|| {
            EventError::ConfigurationError(format!("{} of {} hours is out of range", name, hours))
        })
}
