/// Storm delineation.
///
/// Storms are found in incremental precipitation data. Every sample at or
/// above `instant_mass_to_start` is a storm candidate; contiguous candidates
/// form runs. Runs are then walked in time order and merged into storms:
///
/// 1. **Close a storm** after the current run when either
///    - the dry gap until the next run is longer than `hours_to_stop`, or
///    - the storm has lasted longer than `max_storm_hours`,
///
///    *and* the storm has accumulated at least `min_storm_total`.
/// 2. **Always close** on the last run, whatever its total.
/// 3. **Otherwise keep accumulating**: the pending start stays put and the
///    next run joins the same storm.
///
/// A closed storm starts one sampling step before its first qualifying
/// sample (the rising edge), unless that sample is the first of the series.

use chrono::{Duration, NaiveDateTime};
use log::debug;
use serde::Deserialize;

use super::{hours, EventKind};
use crate::analysis::frequency::infer_frequency;
use crate::analysis::groupings::{group_condition_by_time, Run};
use crate::model::{EventError, TimeSeries};
use crate::periods::CumulativePeriod;

/// Storm delineation thresholds.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct StormParams {
    /// Mass per time step that marks a storm candidate.
    pub instant_mass_to_start: f64,
    /// Total mass a span must accumulate to count as a complete storm.
    pub min_storm_total: f64,
    /// Minimum dry hours between runs to end a storm.
    pub hours_to_stop: f64,
    /// Storm length after which a storm is closed despite ongoing mass.
    pub max_storm_hours: f64,
}

impl Default for StormParams {
    fn default() -> Self {
        Self {
            instant_mass_to_start: 0.1,
            min_storm_total: 0.5,
            hours_to_stop: 24.0,
            max_storm_hours: 336.0,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Storm;

impl EventKind for Storm {
    type Params = StormParams;
    type Event = CumulativePeriod;

    const NAME: &'static str = "storm";

    fn detect(data: &TimeSeries, params: &StormParams) -> Result<Vec<CumulativePeriod>, EventError> {
        let condition = data.condition(|v| v >= params.instant_mass_to_start);
        // Run ids grow with time, so the map is already time ordered
        let runs: Vec<Run> = group_condition_by_time(&condition).into_values().collect();
        debug!("storm: {} candidate runs", runs.len());

        let rules = StormRules {
            min_total: params.min_storm_total,
            dry_gap: hours("hours_to_stop", params.hours_to_stop)?,
            max_duration: hours("max_storm_hours", params.max_storm_hours)?,
            step: infer_frequency(data).map(|f| f.step()),
        };

        let scan = runs
            .iter()
            .enumerate()
            .try_fold(StormScan::default(), |scan, (i, run)| {
                let next_start = runs.get(i + 1).map(|next| next.start);
                scan.advance(data, run, next_start, &rules)
            })?;

        Ok(scan.events)
    }
}

// ---------------------------------------------------------------------------
// Scan state
// ---------------------------------------------------------------------------

struct StormRules {
    min_total: f64,
    dry_gap: Duration,
    max_duration: Duration,
    /// Nominal sampling step, if one could be determined.
    step: Option<Duration>,
}

/// State carried from one run to the next: where the storm being built
/// started, and the storms already closed.
#[derive(Default)]
struct StormScan {
    pending_start: Option<NaiveDateTime>,
    events: Vec<CumulativePeriod>,
}

impl StormScan {
    /// Folds one run into the scan. `next_start` is the start of the
    /// following run, `None` for the last run.
    fn advance(
        mut self,
        data: &TimeSeries,
        run: &Run,
        next_start: Option<NaiveDateTime>,
        rules: &StormRules,
    ) -> Result<Self, EventError> {
        let start = *self.pending_start.get_or_insert(run.start);
        let is_last = next_start.is_none();
        // No more runs: treat the gap as zero and rely on the forced close
        let next_start = next_start.unwrap_or(run.stop);

        let total = data.sum_between(start, run.stop);
        let duration = run.stop - start;

        let dry_long_enough = next_start - run.stop > rules.dry_gap;
        let too_long = duration > rules.max_duration;
        let enough_mass = total >= rules.min_total;

        if !(is_last || ((dry_long_enough || too_long) && enough_mass)) {
            return Ok(self);
        }

        let storm_start = if Some(start) == data.first_timestamp() {
            start
        } else {
            let step = rules.step.ok_or_else(|| {
                EventError::ConfigurationError(
                    "cannot determine the series frequency needed to place the storm start"
                        .to_string(),
                )
            })?;
            start - step
        };

        let storm = CumulativePeriod::new(data.slice_between(storm_start, run.stop))?;
        debug!("storm: closed {} with total {:.3}", storm, storm.total());
        self.events.push(storm);
        self.pending_start = Some(next_start);
        Ok(self)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn series(data: Vec<f64>) -> TimeSeries {
        let start = NaiveDate::from_ymd_opt(2023, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        TimeSeries::regular(start, Duration::days(1), data).unwrap()
    }

    fn day(d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2023, 1, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn detect(data: Vec<f64>, params: StormParams) -> Vec<CumulativePeriod> {
        Storm::detect(&series(data), &params).expect("storm detection should succeed")
    }

    // --- Basic delineation --------------------------------------------------

    #[test]
    fn test_two_storms_separated_by_dry_days() {
        let storms = detect(vec![0.0, 1.0, 1.0, 0.0, 0.0, 1.0, 1.0], StormParams::default());

        assert_eq!(storms.len(), 2);
        let totals: Vec<f64> = storms.iter().map(|s| s.total()).collect();
        assert_eq!(totals, vec![2.0, 2.0]);
        for storm in &storms {
            assert_eq!(storm.duration(), Duration::days(2));
        }
    }

    #[test]
    fn test_storm_start_includes_rising_edge() {
        let storms = detect(vec![0.0, 1.0, 1.0, 0.0, 0.0, 1.0, 1.0], StormParams::default());

        assert_eq!(storms[0].start(), day(1), "one step before the first wet day");
        assert_eq!(storms[0].stop(), day(3));
        assert_eq!(storms[1].start(), day(5));
        assert_eq!(storms[1].stop(), day(7));
    }

    #[test]
    fn test_no_back_extension_at_series_start() {
        let storms = detect(vec![1.0, 1.0, 0.0, 0.0], StormParams::default());

        assert_eq!(storms.len(), 1);
        assert_eq!(storms[0].start(), day(1));
        assert_eq!(storms[0].duration(), Duration::days(1));
    }

    #[test]
    fn test_dry_series_has_no_storms() {
        let storms = detect(vec![0.0; 10], StormParams::default());
        assert!(storms.is_empty());
    }

    // --- Merging ------------------------------------------------------------

    #[test]
    fn test_short_dry_gap_merges_runs() {
        let params = StormParams {
            hours_to_stop: 72.0,
            ..Default::default()
        };
        let storms = detect(vec![0.0, 1.0, 1.0, 0.0, 0.0, 1.0, 1.0], params);

        assert_eq!(storms.len(), 1, "a 72h gap is not longer than hours_to_stop");
        assert_eq!(storms[0].total(), 4.0);
    }

    #[test]
    fn test_small_total_keeps_accumulating_across_long_gap() {
        // The first run alone is 0.2 < 0.5, so the long gap does not close it
        let storms = detect(vec![0.0, 0.2, 0.0, 0.0, 0.0, 1.0, 1.0], StormParams::default());

        assert_eq!(storms.len(), 1, "under-total candidate must merge into the next run");
        assert_eq!(storms[0].start(), day(1));
        assert!((storms[0].total() - 2.2).abs() < 1e-9);
    }

    #[test]
    fn test_last_run_closes_regardless_of_total() {
        let storms = detect(vec![0.0, 2.0, 0.0, 0.0, 0.0, 0.1, 0.0], StormParams::default());

        assert_eq!(storms.len(), 2);
        assert!((storms[1].total() - 0.1).abs() < 1e-9);
    }

    // --- Maximum duration ---------------------------------------------------

    #[test]
    fn test_max_storm_hours_splits_long_storm() {
        let data = vec![0.0, 1.0, 0.0, 1.0, 0.0, 1.0, 0.0, 1.0, 0.0];
        let capped = StormParams {
            hours_to_stop: 72.0,
            max_storm_hours: 24.0,
            ..Default::default()
        };
        let uncapped = StormParams {
            hours_to_stop: 72.0,
            max_storm_hours: 300.0,
            ..Default::default()
        };

        assert_eq!(detect(data.clone(), capped).len(), 2);
        assert_eq!(detect(data, uncapped).len(), 1);
    }

    #[test]
    fn test_sparse_light_storms_with_low_total() {
        let params = StormParams {
            min_storm_total: 0.1,
            hours_to_stop: 24.0,
            max_storm_hours: 24.0,
            ..Default::default()
        };
        let storms = detect(vec![0.0, 0.1, 0.0, 0.1, 0.1, 0.0], params);
        assert_eq!(storms.len(), 2);
    }

    // --- Frequency ----------------------------------------------------------

    #[test]
    fn test_unknown_frequency_is_a_configuration_error() {
        let index = [1, 2, 5, 11, 12]
            .iter()
            .map(|d| day(*d))
            .collect();
        let data = TimeSeries::new(index, vec![0.0, 1.0, 0.0, 1.0, 0.0]).unwrap();
        let result = Storm::detect(&data, &StormParams::default());

        assert!(
            matches!(result, Err(EventError::ConfigurationError(_))),
            "irregular data without a frequency cannot place storm starts, got {:?}",
            result
        );
    }

    #[test]
    fn test_irregular_index_uses_explicit_frequency() {
        let index = [1, 2, 5, 11, 12]
            .iter()
            .map(|d| day(*d))
            .collect();
        let data = TimeSeries::new(index, vec![0.0, 1.0, 0.0, 1.0, 0.0])
            .unwrap()
            .with_frequency(crate::model::Frequency::days(1));
        let storms = Storm::detect(&data, &StormParams::default()).unwrap();

        assert_eq!(storms.len(), 2);
        assert_eq!(storms[0].start(), day(1));
        // Jan 10 is not in the index, so the slice begins at Jan 11
        assert_eq!(storms[1].start(), day(11));
    }

    #[test]
    fn test_three_samples_need_an_annotated_frequency() {
        let index: Vec<NaiveDateTime> = (1..=3).map(day).collect();
        let bare = TimeSeries::new(index, vec![0.0, 1.0, 1.0]).unwrap();
        assert!(matches!(
            Storm::detect(&bare, &StormParams::default()),
            Err(EventError::ConfigurationError(_))
        ));

        let annotated = bare.with_frequency(crate::model::Frequency::days(1));
        let storms = Storm::detect(&annotated, &StormParams::default()).unwrap();
        assert_eq!(storms.len(), 1);
        assert_eq!(storms[0].start(), day(1));
    }

    // --- Parameter validation -----------------------------------------------

    #[test]
    fn test_non_finite_hours_are_configuration_errors() {
        let cases = [
            StormParams {
                hours_to_stop: f64::NEG_INFINITY,
                ..Default::default()
            },
            StormParams {
                hours_to_stop: f64::NAN,
                ..Default::default()
            },
            StormParams {
                max_storm_hours: f64::INFINITY,
                ..Default::default()
            },
            StormParams {
                max_storm_hours: -24.0,
                ..Default::default()
            },
        ];
        for params in cases {
            let result = Storm::detect(&series(vec![0.0, 1.0, 1.0, 0.0]), &params);
            assert!(
                matches!(result, Err(EventError::ConfigurationError(_))),
                "{:?} should be rejected, got {:?}",
                params,
                result
            );
        }
    }
}
