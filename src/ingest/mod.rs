/// Station data sources: pull accumulated precipitation from a network and
/// hand the detectors a series of per-step increments.
///
/// Each network gets its own file under ingest/:
/// - `cdec`  — California Data Exchange Center CSV servlet
/// - `nrcs`  — NRCS AWDB REST API (SNOTEL and other NRCS networks)
/// - `fixtures` (test only) — representative response payloads

pub mod cdec;
pub mod nrcs;

#[cfg(test)]
pub(crate) mod fixtures;

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use chrono::NaiveDate;
use log::info;

use crate::model::{EventError, TimeSeries};

pub use cdec::CdecSource;
pub use nrcs::NrcsSource;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

// ---------------------------------------------------------------------------
// Networks
// ---------------------------------------------------------------------------

/// Supported station networks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Network {
    Cdec,
    Nrcs,
}

impl Network {
    pub const ALL: [Network; 2] = [Network::Cdec, Network::Nrcs];

    pub fn name(&self) -> &'static str {
        match self {
            Network::Cdec => "CDEC",
            Network::Nrcs => "NRCS",
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Case-insensitive; anything else is a configuration error listing the
/// supported names.
impl FromStr for Network {
    type Err = EventError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Network::ALL
            .into_iter()
            .find(|n| n.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                let names: Vec<&str> = Network::ALL.iter().map(|n| n.name()).collect();
                EventError::ConfigurationError(format!(
                    "Datasource {} is invalid. Use {}",
                    s,
                    names.join(", ")
                ))
            })
    }
}

// ---------------------------------------------------------------------------
// Source contract
// ---------------------------------------------------------------------------

/// A network that can report accumulated precipitation for a station.
pub trait StationDataSource {
    fn network(&self) -> Network;

    /// Daily accumulated precipitation for `station_id` between `start` and
    /// `stop` inclusive. An empty series means the network had nothing.
    fn fetch_precip_accum(
        &self,
        station_id: &str,
        start: NaiveDate,
        stop: NaiveDate,
    ) -> Result<TimeSeries, EventError>;
}

/// Fetches accumulated precipitation from `source` and returns its first
/// difference: precipitation per time step, first value missing.
///
/// # Errors
/// - `EventError::ConfigurationError` — `stop` is before `start`
/// - `EventError::DataUnavailable` — the source returned no readings
/// - any error raised by the source itself
pub fn precip_increments(
    source: &impl StationDataSource,
    station_id: &str,
    start: NaiveDate,
    stop: NaiveDate,
    station_name: Option<&str>,
) -> Result<TimeSeries, EventError> {
    if stop < start {
        return Err(EventError::ConfigurationError(format!(
            "stop date {} is before start date {}",
            stop, start
        )));
    }

    let name = station_name.unwrap_or("unknown");
    info!(
        "Pulling precipitation for {} ({}) from {}: {} to {}",
        station_id,
        name,
        source.network(),
        start,
        stop
    );

    let accum = source.fetch_precip_accum(station_id, start, stop)?;
    if accum.present_positions().is_empty() {
        return Err(EventError::DataUnavailable(format!(
            "pulling precip from {} ({}) on {} during {} - {} produced no data; \
             check the station is real and has precip data between the dates",
            station_id,
            name,
            source.network(),
            start,
            stop
        )));
    }

    Ok(accum.diff())
}

/// Incremental precipitation for a station on a named network.
///
/// `network` is matched case-insensitively against the supported networks
/// ("CDEC", "NRCS"). NRCS stations are addressed by triplet, e.g.
/// `"1000:OR:SNTL"`; CDEC stations by their three letter code.
///
/// # Errors
/// - `EventError::ConfigurationError` — unknown network or bad date range
/// - `EventError::DataUnavailable` — no readings for the request
/// - `EventError::RequestError` / `HttpError` / `ParseError` — transport
///   and payload failures from the network
pub fn from_station(
    station_id: &str,
    start: NaiveDate,
    stop: NaiveDate,
    network: &str,
    station_name: Option<&str>,
) -> Result<TimeSeries, EventError> {
    let network: Network = network.parse()?;

    let client = reqwest::blocking::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .map_err(|e| EventError::RequestError(e.to_string()))?;

    match network {
        Network::Cdec => {
            precip_increments(&CdecSource::new(&client), station_id, start, stop, station_name)
        }
        Network::Nrcs => {
            precip_increments(&NrcsSource::new(&client), station_id, start, stop, station_name)
        }
    }
}
