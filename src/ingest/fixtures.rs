/// Test fixtures: representative payloads from the station networks.
///
/// Structurally complete but truncated to the minimum needed to exercise
/// the parsers.
///
/// CDEC CSV servlet (`CSVDataServlet?Stations=TUM&SensorNums=2&dur_code=D`):
///   one header row, then one row per day
///     DATE TIME  — `%Y%m%d %H%M`, station local time
///     VALUE      — accumulated precipitation, inches; `---` when missing
///
/// NRCS AWDB (`awdbRestApi/services/v1/data?elements=PREC,...`):
///   [ { stationTriplet, data: [ { stationElement.elementCode, values[] } ] } ]
///     values[].date  — `YYYY-MM-DD` for daily data
///     values[].value — number; key omitted when the station did not report

/// Tuolumne Meadows (TUM), six days of sensor 2 with one missing reading.
#[cfg(test)]
pub(crate) fn cdec_precip_accum_csv() -> &'static str {
    "STATION_ID,DURATION,SENSOR_NUMBER,SENSOR_TYPE,DATE TIME,OBS DATE,VALUE,DATA_FLAG,UNITS\n\
     TUM,D,2,RAIN,20230101 0000,20230101 0000,20.12, ,INCHES\n\
     TUM,D,2,RAIN,20230102 0000,20230102 0000,20.96, ,INCHES\n\
     TUM,D,2,RAIN,20230103 0000,20230103 0000,21.84, ,INCHES\n\
     TUM,D,2,RAIN,20230104 0000,20230104 0000,---, ,INCHES\n\
     TUM,D,2,RAIN,20230105 0000,20230105 0000,22.40, ,INCHES\n\
     TUM,D,2,RAIN,20230106 0000,20230106 0000,22.40, ,INCHES\n"
}

/// Mt Hood Test Site SNOTEL, five days of PREC (one unreported) plus two
/// days of WTEQ that the precipitation parser must ignore.
#[cfg(test)]
pub(crate) fn nrcs_precip_accum_json() -> &'static str {
    r#"[
      {
        "stationTriplet": "1000:OR:SNTL",
        "data": [
          {
            "stationElement": {
              "elementCode": "PREC",
              "ordinal": 1,
              "durationName": "DAILY",
              "storedUnitCode": "in"
            },
            "values": [
              { "date": "2023-01-01", "value": 25.3 },
              { "date": "2023-01-02", "value": 25.9 },
              { "date": "2023-01-03" },
              { "date": "2023-01-04", "value": 26.8 },
              { "date": "2023-01-05", "value": 27.1 }
            ]
          },
          {
            "stationElement": {
              "elementCode": "WTEQ",
              "ordinal": 1,
              "durationName": "DAILY",
              "storedUnitCode": "in"
            },
            "values": [
              { "date": "2023-01-01", "value": 10.2 },
              { "date": "2023-01-02", "value": 10.4 }
            ]
          }
        ]
      }
    ]"#
}
