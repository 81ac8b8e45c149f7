/// metevents: timeseries analysis for meteorological events.
///
/// Finds storms, spikes and valleys, data gaps, flat lines, extreme values,
/// extreme changes and point outliers in a timestamped numeric series.
///
/// # Module structure
///
/// ```text
/// metevents
/// ├── model       — shared data types (TimeSeries, Frequency, ConditionSeries, EventError)
/// ├── periods     — result records (TimePeriod, CumulativePeriod)
/// ├── config      — detector thresholds loader (detectors.toml)
/// ├── analysis
/// │   ├── groupings — boolean condition → contiguous time runs
/// │   └── frequency — nominal sampling interval inference
/// ├── events
/// │   ├── storm          — precipitation storms
/// │   ├── spike          — spikes and valleys
/// │   ├── data_gap       — missing values and index holes
/// │   ├── flat_line      — stuck sensors
/// │   ├── extreme_value  — out-of-range values
/// │   ├── extreme_change — out-of-range first differences
/// │   └── outlier        — modified z-score point outliers
/// └── ingest
///     ├── cdec    — CDEC CSV servlet: URL construction + CSV parsing
///     ├── nrcs    — NRCS AWDB REST API: URL construction + JSON parsing
///     └── fixtures (test only) — representative API response payloads
/// ```
///
/// # Example
///
/// ```no_run
/// use chrono::NaiveDate;
/// use metevents::events::{StormEvents, StormParams};
///
/// let start = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
/// let stop = NaiveDate::from_ymd_opt(2023, 3, 31).unwrap();
/// let mut storms = StormEvents::from_station("TUM", start, stop, "CDEC", Some("Tuolumne Meadows"))?;
/// storms.find(&StormParams::default())?;
/// for storm in storms.events() {
///     println!("{} total {:.2}", storm, storm.total());
/// }
/// # Ok::<(), metevents::model::EventError>(())
/// ```

/// Public modules
pub mod analysis;
pub mod config;
pub mod events;
pub mod ingest;
pub mod model;
pub mod periods;

pub use events::{
    DataGapEvent, EventDetector, EventKind, ExtremeChangeEvent, ExtremeValueEvent, FlatLineEvent,
    OutlierEvents, SpikeValleyEvent, StormEvents,
};
pub use model::{EventError, Frequency, TimeSeries};
pub use periods::{CumulativePeriod, TimePeriod};
