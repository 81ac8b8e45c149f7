/// Detector configuration loader - parses detectors.toml
///
/// Keeps detection thresholds out of code so they can be tuned per station
/// or per network without recompiling. Every table is optional and every
/// key inside a table falls back to the detector's documented default,
/// except the extreme value bounds, which have no sensible default.

use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::events::{
    DataGapParams, ExtremeChangeParams, ExtremeValueParams, FlatLineParams, OutlierParams,
    SpikeValleyParams, StormParams,
};
use crate::model::EventError;

/// Root configuration structure for TOML parsing.
///
/// A missing table means "this detector is not configured", which is
/// different from an empty table (configured with all defaults).
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DetectorConfig {
    pub storm: Option<StormParams>,
    pub spike_valley: Option<SpikeValleyParams>,
    pub data_gap: Option<DataGapParams>,
    pub flat_line: Option<FlatLineParams>,
    pub extreme_value: Option<ExtremeValueParams>,
    pub extreme_change: Option<ExtremeChangeParams>,
    pub outlier: Option<OutlierParams>,
}

impl DetectorConfig {
    /// # Errors
    /// - `EventError::ParseError` — malformed TOML, an unknown table, or a
    ///   value of the wrong type.
    pub fn from_toml_str(contents: &str) -> Result<Self, EventError> {
        toml::from_str(contents).map_err(|e| EventError::ParseError(e.to_string()))
    }

    /// Storm thresholds, or the defaults when `[storm]` is absent.
    pub fn storm_or_default(&self) -> StormParams {
        self.storm.clone().unwrap_or_default()
    }
}

/// Loads detector thresholds from a TOML file.
///
/// Unlike station metadata, thresholds are optional: callers that get an
/// error here can fall back to `DetectorConfig::default()`.
///
/// # Errors
/// - `EventError::ConfigurationError` — the file cannot be read
/// - `EventError::ParseError` — the file is not a valid detector config
pub fn load_config(path: impl AsRef<Path>) -> Result<DetectorConfig, EventError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|e| {
        EventError::ConfigurationError(format!("Failed to read {}: {}", path.display(), e))
    })?;
    DetectorConfig::from_toml_str(&contents)
}
