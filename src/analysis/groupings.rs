/// Run grouping: boolean condition → contiguous time runs.
///
/// `group_condition_by_time` takes the boolean condition produced by a
/// detector and organizes its True samples into maximal contiguous `Run`s,
/// making it convenient to ask "when did the value first cross the
/// threshold, and for how long did it stay there?" without re-scanning the
/// mask every time.
///
/// Every detector in `events` goes through this module; it is the one place
/// where a per-sample condition turns into time intervals.

use std::collections::BTreeMap;
use std::ops::RangeInclusive;

use chrono::{Duration, NaiveDateTime};

use crate::model::ConditionSeries;

// ---------------------------------------------------------------------------
// Run
// ---------------------------------------------------------------------------

/// Identifier of a run: the number of False samples seen before it.
pub type RunId = usize;

/// A maximal contiguous span of True samples in a condition series.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Run {
    pub id: RunId,
    /// Position of the first True sample in the source index.
    pub first: usize,
    /// Position of the last True sample in the source index.
    pub last: usize,
    pub start: NaiveDateTime,
    pub stop: NaiveDateTime,
}

impl Run {
    /// Number of observations in the run.
    pub fn len(&self) -> usize {
        self.last - self.first + 1
    }

    pub fn positions(&self) -> RangeInclusive<usize> {
        self.first..=self.last
    }

    /// `stop - start`; zero for a single-sample run.
    pub fn span(&self) -> Duration {
        self.stop - self.start
    }
}

// ---------------------------------------------------------------------------
// Grouping
// ---------------------------------------------------------------------------

/// Groups the True samples of `condition` into maximal contiguous runs,
/// keyed (and therefore ordered) by run id.
///
/// A counter is incremented on every False sample and each True sample is
/// tagged with the counter's current value, so any False sample between two
/// True samples separates them into different runs. A series that starts
/// True puts its first run under id 0.
pub fn group_condition_by_time(condition: &ConditionSeries<'_>) -> BTreeMap<RunId, Run> {
    let index = condition.index();
    let mut runs: BTreeMap<RunId, Run> = BTreeMap::new();
    let mut false_count: RunId = 0;

    for (pos, &flag) in condition.mask().iter().enumerate() {
        if !flag {
            false_count += 1;
            continue;
        }

        // Get or create the run for the current id, then stretch it
        let run = runs.entry(false_count).or_insert_with(|| Run {
            id: false_count,
            first: pos,
            last: pos,
            start: index[pos],
            stop: index[pos],
        });
        run.last = pos;
        run.stop = index[pos];
    }

    runs
}

/// For every True sample, the duration of the run it belongs to, including
/// one nominal `step` past the last sample (a single True sample still
/// represents one sampling interval). `None` for False samples.
pub fn interval_duration(condition: &ConditionSeries<'_>, step: Duration) -> Vec<Option<Duration>> {
    let mut durations = vec![None; condition.len()];
    for run in group_condition_by_time(condition).values() {
        let duration = run.span() + step;
        for pos in run.positions() {
            durations[pos] = Some(duration);
        }
    }
    durations
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn daily_index(n: usize) -> Vec<NaiveDateTime> {
        let start = NaiveDate::from_ymd_opt(2023, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        (0..n).map(|i| start + Duration::days(i as i64)).collect()
    }

    fn ts(d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2023, 1, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    // --- Grouping: basic correctness ----------------------------------------

    #[test]
    fn test_single_run_start_and_stop() {
        let index = daily_index(4);
        let condition = ConditionSeries::new(&index, vec![false, true, true, false]);
        let runs = group_condition_by_time(&condition);

        assert_eq!(runs.len(), 1, "should find exactly one run");
        let run = runs.values().next().expect("run should exist");
        assert_eq!(run.start, ts(2));
        assert_eq!(run.stop, ts(3));
        assert_eq!(run.len(), 2);
    }

    #[test]
    fn test_run_ids_count_preceding_false_samples() {
        let index = daily_index(7);
        let condition =
            ConditionSeries::new(&index, vec![false, true, true, false, false, true, true]);
        let runs = group_condition_by_time(&condition);

        let ids: Vec<RunId> = runs.keys().copied().collect();
        assert_eq!(ids, vec![1, 3], "ids should be the count of False samples before each run");
    }

    #[test]
    fn test_leading_true_run_has_id_zero() {
        let index = daily_index(3);
        let condition = ConditionSeries::new(&index, vec![true, false, true]);
        let runs = group_condition_by_time(&condition);

        let first = runs.get(&0).expect("a series starting True should have run 0");
        assert_eq!(first.start, ts(1));
        assert_eq!(first.stop, ts(1));
        assert!(runs.contains_key(&1));
    }

    #[test]
    fn test_all_false_yields_no_runs() {
        let index = daily_index(5);
        let condition = ConditionSeries::new(&index, vec![false; 5]);
        assert!(group_condition_by_time(&condition).is_empty());
    }

    #[test]
    fn test_empty_condition_yields_no_runs() {
        let index: Vec<NaiveDateTime> = vec![];
        let condition = ConditionSeries::new(&index, vec![]);
        assert!(group_condition_by_time(&condition).is_empty());
    }

    #[test]
    fn test_runs_are_disjoint_ordered_and_cover_true_positions() {
        let mask = vec![
            true, true, false, true, false, false, true, true, true, false, true,
        ];
        let index = daily_index(mask.len());
        let condition = ConditionSeries::new(&index, mask.clone());
        let runs: Vec<Run> = group_condition_by_time(&condition).into_values().collect();

        for pair in runs.windows(2) {
            assert!(
                pair[0].last + 1 < pair[1].first,
                "runs must be separated by at least one False sample"
            );
            assert!(pair[0].stop < pair[1].start, "runs must be time ordered");
        }

        let covered: Vec<usize> = runs.iter().flat_map(|r| r.positions()).collect();
        let expected: Vec<usize> = mask
            .iter()
            .enumerate()
            .filter(|(_, m)| **m)
            .map(|(i, _)| i)
            .collect();
        assert_eq!(covered, expected, "union of runs must equal the True positions");
    }

    #[test]
    fn test_irregular_index_does_not_stretch_run_length() {
        // Jan 1, Jan 2, Jan 10: the missing days are not part of any run
        let index = vec![ts(1), ts(2), ts(10)];
        let condition = ConditionSeries::new(&index, vec![true, true, true]);
        let runs = group_condition_by_time(&condition);
        let run = runs.get(&0).expect("one run");
        assert_eq!(run.len(), 3, "run length counts observations, not days");
        assert_eq!(run.span(), Duration::days(9));
    }

    // --- Interval duration --------------------------------------------------

    #[test]
    fn test_interval_duration_adds_one_step() {
        let index = daily_index(6);
        let condition =
            ConditionSeries::new(&index, vec![false, true, true, false, true, false]);
        let durations = interval_duration(&condition, Duration::days(1));

        assert_eq!(
            durations,
            vec![
                None,
                Some(Duration::days(2)),
                Some(Duration::days(2)),
                None,
                Some(Duration::days(1)),
                None,
            ]
        );
    }
}
