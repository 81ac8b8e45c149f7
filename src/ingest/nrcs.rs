/// NRCS Air and Water Database (AWDB) REST API client.
///
/// Handles URL construction and JSON response parsing for the AWDB data
/// endpoint:
///   https://wcc.sc.egov.usda.gov/awdbRestApi/services/v1/data
///
/// Stations are addressed by triplet (`id:state:network`, e.g.
/// `"1000:OR:SNTL"`). The response is an array with one entry per
/// station, each carrying one `data` block per requested element. See
/// `fixtures.rs` for an annotated example.

use chrono::{NaiveDate, NaiveDateTime};
use log::{info, warn};
use serde::Deserialize;

use super::{Network, StationDataSource};
use crate::model::{EventError, Frequency, TimeSeries};

// ---------------------------------------------------------------------------
// Serde structures for AWDB JSON deserialization
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct StationData {
    #[serde(rename = "stationTriplet")]
    station_triplet: String,
    #[serde(default)]
    data: Vec<ElementData>,
}

#[derive(Deserialize)]
struct ElementData {
    #[serde(rename = "stationElement")]
    station_element: StationElement,
    #[serde(default)]
    values: Vec<ValueEntry>,
}

#[derive(Deserialize)]
struct StationElement {
    #[serde(rename = "elementCode")]
    element_code: String,
}

#[derive(Deserialize)]
struct ValueEntry {
    date: String,
    // Omitted when the station did not report
    value: Option<f64>,
}

// ---------------------------------------------------------------------------
// URL construction
// ---------------------------------------------------------------------------

const DATA_URL: &str = "https://wcc.sc.egov.usda.gov/awdbRestApi/services/v1/data";

/// AWDB element code for accumulated precipitation, inches.
pub const ELEMENT_PRECIP_ACCUM: &str = "PREC";

/// Builds an AWDB data URL for daily values of one element at one station.
pub fn build_data_url(triplet: &str, element: &str, start: NaiveDate, stop: NaiveDate) -> String {
    format!(
        "{}?stationTriplets={}&elements={}&duration=DAILY&beginDate={}&endDate={}",
        DATA_URL,
        urlencoding::encode(triplet),
        element,
        start.format("%Y-%m-%d"),
        stop.format("%Y-%m-%d")
    )
}

/// Checks that a station id has the `id:state:network` triplet shape.
pub fn validate_triplet(station_id: &str) -> Result<(), EventError> {
    let parts: Vec<&str> = station_id.split(':').collect();
    if parts.len() == 3 && parts.iter().all(|p| !p.trim().is_empty()) {
        Ok(())
    } else {
        Err(EventError::ConfigurationError(format!(
            "NRCS station id {:?} is not a triplet like \"1000:OR:SNTL\"",
            station_id
        )))
    }
}

// ---------------------------------------------------------------------------
// Response parsing
// ---------------------------------------------------------------------------

/// Parses an AWDB data response into a daily series of `element` values for
/// the station `triplet`. Values the station did not report are missing.
///
/// # Errors
/// - `EventError::ParseError` — malformed JSON
/// - `EventError::InvalidSeries` — the same date is reported twice
pub fn parse_data_response(json: &str, triplet: &str, element: &str) -> Result<TimeSeries, EventError> {
    let stations: Vec<StationData> = serde_json::from_str(json)
        .map_err(|e| EventError::ParseError(format!("JSON deserialization failed: {}", e)))?;

    let values = stations
        .into_iter()
        .filter(|s| s.station_triplet.eq_ignore_ascii_case(triplet))
        .flat_map(|s| s.data)
        .filter(|d| d.station_element.element_code == element)
        .flat_map(|d| d.values);

    let mut readings = Vec::new();
    for entry in values {
        match parse_date(&entry.date) {
            Some(date) => readings.push((date, entry.value.unwrap_or(f64::NAN))),
            None => warn!("Skipping AWDB value with unreadable date {:?}", entry.date),
        }
    }

    Ok(TimeSeries::from_unsorted(readings)?.with_frequency(Frequency::days(1)))
}

/// Daily values carry a bare date; hourly ones a date and time.
fn parse_date(raw: &str) -> Option<NaiveDateTime> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .or_else(|| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M").ok())
}

// ---------------------------------------------------------------------------
// Source
// ---------------------------------------------------------------------------

/// NRCS stations (SNOTEL, SCAN, ...), addressed by triplet.
pub struct NrcsSource<'a> {
    client: &'a reqwest::blocking::Client,
}

impl<'a> NrcsSource<'a> {
    pub fn new(client: &'a reqwest::blocking::Client) -> Self {
        Self { client }
    }
}

impl StationDataSource for NrcsSource<'_> {
    fn network(&self) -> Network {
        Network::Nrcs
    }

    fn fetch_precip_accum(
        &self,
        station_id: &str,
        start: NaiveDate,
        stop: NaiveDate,
    ) -> Result<TimeSeries, EventError> {
        validate_triplet(station_id)?;

        let url = build_data_url(station_id, ELEMENT_PRECIP_ACCUM, start, stop);
        info!("Fetching: {}", url);

        let response = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .send()
            .map_err(|e| EventError::RequestError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(EventError::HttpError(response.status().as_u16()));
        }

        let body = response
            .text()
            .map_err(|e| EventError::RequestError(e.to_string()))?;
        parse_data_response(&body, station_id, ELEMENT_PRECIP_ACCUM)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::fixtures;

    fn jan(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, 1, d).unwrap()
    }

    // --- URL ----------------------------------------------------------------

    #[test]
    fn test_build_data_url_encodes_triplet() {
        let url = build_data_url("1000:OR:SNTL", ELEMENT_PRECIP_ACCUM, jan(1), jan(5));
        assert_eq!(
            url,
            "https://wcc.sc.egov.usda.gov/awdbRestApi/services/v1/data?stationTriplets=1000%3AOR%3ASNTL&elements=PREC&duration=DAILY&beginDate=2023-01-01&endDate=2023-01-05"
        );
    }

    #[test]
    fn test_validate_triplet() {
        assert!(validate_triplet("1000:OR:SNTL").is_ok());
        assert!(validate_triplet("1000").is_err());
        assert!(validate_triplet("1000::SNTL").is_err());
        assert!(validate_triplet("1:2:3:4").is_err());
    }

    // --- Parsing ------------------------------------------------------------

    #[test]
    fn test_parse_accumulated_precip() {
        let series =
            parse_data_response(fixtures::nrcs_precip_accum_json(), "1000:OR:SNTL", "PREC").unwrap();

        assert_eq!(series.len(), 5);
        assert_eq!(series.frequency(), Some(Frequency::days(1)));
        assert_eq!(series.index()[0], jan(1).and_hms_opt(0, 0, 0).unwrap());
        assert_eq!(series.values()[0], 25.3);
        assert_eq!(series.values()[4], 27.1);
    }

    #[test]
    fn test_unreported_value_is_missing() {
        let series =
            parse_data_response(fixtures::nrcs_precip_accum_json(), "1000:OR:SNTL", "PREC").unwrap();
        assert!(series.values()[2].is_nan(), "value-less entry should be missing");
    }

    #[test]
    fn test_other_elements_are_ignored() {
        let series =
            parse_data_response(fixtures::nrcs_precip_accum_json(), "1000:OR:SNTL", "WTEQ").unwrap();
        assert_eq!(series.len(), 2, "only the WTEQ block is read");
        assert_eq!(series.values(), &[10.2, 10.4]);
    }

    #[test]
    fn test_unknown_station_is_empty_series() {
        let series =
            parse_data_response(fixtures::nrcs_precip_accum_json(), "999:CA:SNTL", "PREC").unwrap();
        assert!(series.is_empty());
    }

    #[test]
    fn test_empty_array_is_empty_series() {
        let series = parse_data_response("[]", "1000:OR:SNTL", "PREC").unwrap();
        assert!(series.is_empty());
    }

    #[test]
    fn test_malformed_json_is_parse_error() {
        let result = parse_data_response("{not json", "1000:OR:SNTL", "PREC");
        assert!(matches!(result, Err(EventError::ParseError(_))));
    }

    #[test]
    fn test_parse_date_accepts_date_and_datetime() {
        assert_eq!(parse_date("2023-01-02"), Some(jan(2).and_hms_opt(0, 0, 0).unwrap()));
        assert_eq!(parse_date("2023-01-02 06:00"), Some(jan(2).and_hms_opt(6, 0, 0).unwrap()));
        assert_eq!(parse_date("01/02/2023"), None);
    }
}
