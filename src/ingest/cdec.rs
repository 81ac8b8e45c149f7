/// California Data Exchange Center (CDEC) CSV servlet client.
///
/// Handles URL construction and CSV parsing for:
///   https://cdec.water.ca.gov/dynamicapp/req/CSVDataServlet
///
/// Response columns:
///   STATION_ID,DURATION,SENSOR_NUMBER,SENSOR_TYPE,DATE TIME,OBS DATE,VALUE,DATA_FLAG,UNITS
///
/// Timestamps are local station time (`%Y%m%d %H%M`) and missing readings
/// are reported as `---`. See `fixtures.rs` for an example payload.

use chrono::{NaiveDate, NaiveDateTime};
use csv::{ReaderBuilder, StringRecord};
use log::{info, warn};

use super::{Network, StationDataSource};
use crate::model::{EventError, Frequency, TimeSeries};

const CSV_SERVLET_URL: &str = "https://cdec.water.ca.gov/dynamicapp/req/CSVDataServlet";

/// CDEC sensor 2: accumulated precipitation, inches.
pub const SENSOR_PRECIP_ACCUM: u32 = 2;

const DATE_FORMAT: &str = "%Y%m%d %H%M";
const QUERY_DATE_FORMAT: &str = "%Y-%m-%d";
const CSV_ROW_LENGTH: usize = 9;

const DATE_TIME_COLUMN: usize = 4;
const VALUE_COLUMN: usize = 6;

// ---------------------------------------------------------------------------
// URL construction
// ---------------------------------------------------------------------------

/// Builds a CSV servlet URL for daily values of one sensor.
pub fn build_csv_url(station_id: &str, sensor: u32, start: NaiveDate, stop: NaiveDate) -> String {
    format!(
        "{}?Stations={}&SensorNums={}&dur_code=D&Start={}&End={}",
        CSV_SERVLET_URL,
        urlencoding::encode(station_id),
        sensor,
        start.format(QUERY_DATE_FORMAT),
        stop.format(QUERY_DATE_FORMAT)
    )
}

// ---------------------------------------------------------------------------
// Response parsing
// ---------------------------------------------------------------------------

/// Parses a CSV servlet body into a daily series.
///
/// Rows with the wrong column count or an unreadable timestamp are skipped
/// with a warning; `---` and other non-numeric values become missing.
///
/// # Errors
/// - `EventError::ParseError` — the body is not CSV at all
/// - `EventError::InvalidSeries` — the same timestamp is reported twice
pub fn parse_csv_response(body: &str) -> Result<TimeSeries, EventError> {
    let records: Vec<StringRecord> = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(body.as_bytes())
        .records()
        .collect::<Result<_, _>>()
        .map_err(|e| EventError::ParseError(format!("CDEC CSV: {}", e)))?;

    let readings: Vec<(NaiveDateTime, f64)> = records
        .iter()
        .filter_map(|record| match parse_record(record) {
            Ok(reading) => Some(reading),
            Err(reason) => {
                warn!("Skipping CDEC row {:?}: {}", record, reason);
                None
            }
        })
        .collect();

    Ok(TimeSeries::from_unsorted(readings)?.with_frequency(Frequency::days(1)))
}

fn parse_record(record: &StringRecord) -> Result<(NaiveDateTime, f64), String> {
    if record.len() != CSV_ROW_LENGTH {
        return Err(format!(
            "expected {} columns, found {}",
            CSV_ROW_LENGTH,
            record.len()
        ));
    }

    let raw_date = record
        .get(DATE_TIME_COLUMN)
        .ok_or_else(|| "missing date".to_string())?;
    let date = NaiveDateTime::parse_from_str(raw_date.trim(), DATE_FORMAT)
        .map_err(|e| format!("bad date {:?}: {}", raw_date, e))?;

    let value = match record.get(VALUE_COLUMN).map(str::trim) {
        Some("---") | Some("") | None => f64::NAN,
        Some(raw) => raw.parse::<f64>().unwrap_or(f64::NAN),
    };

    Ok((date, value))
}

// ---------------------------------------------------------------------------
// Source
// ---------------------------------------------------------------------------

/// CDEC stations, addressed by their three letter code (e.g. `"TUM"`).
pub struct CdecSource<'a> {
    client: &'a reqwest::blocking::Client,
}

impl<'a> CdecSource<'a> {
    pub fn new(client: &'a reqwest::blocking::Client) -> Self {
        Self { client }
    }
}

impl StationDataSource for CdecSource<'_> {
    fn network(&self) -> Network {
        Network::Cdec
    }

    fn fetch_precip_accum(
        &self,
        station_id: &str,
        start: NaiveDate,
        stop: NaiveDate,
    ) -> Result<TimeSeries, EventError> {
        let url = build_csv_url(station_id, SENSOR_PRECIP_ACCUM, start, stop);
        info!("Fetching: {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|e| EventError::RequestError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(EventError::HttpError(response.status().as_u16()));
        }

        let body = response
            .text()
            .map_err(|e| EventError::RequestError(e.to_string()))?;
        parse_csv_response(&body)
    }
}
