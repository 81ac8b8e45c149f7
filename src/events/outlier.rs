/// Point outlier detection with the modified z-score.
///
/// Scores are computed against the median and the median absolute deviation
/// (MAD) of the present values, so a handful of wild readings does not drag
/// the reference along with them:
///
/// ```text
/// z = 0.6745 * (x - median) / MAD
/// ```
///
/// When more than half the values sit on the median the MAD collapses to
/// zero; the mean absolute deviation, scaled by 1.253314 to estimate the
/// same spread, stands in for it. A series with no spread at all has no
/// outliers.
///
/// Unlike the interval detectors, results are single observations.

use chrono::NaiveDateTime;
use log::debug;
use serde::{Deserialize, Serialize};

use super::{EventDetector, EventKind};
use crate::model::{EventError, TimeSeries};

/// Fewest samples accepted; the series must be strictly longer.
const MIN_SAMPLES: usize = 15;
/// Converts a MAD into a standard deviation estimate under normality.
const MAD_SCALE: f64 = 0.6745;
/// Converts a mean absolute deviation into a MAD estimate.
const MEAN_AD_SCALE: f64 = 1.253314;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct OutlierParams {
    /// Absolute modified z-score above which a point is an outlier.
    pub threshold: f64,
}

impl Default for OutlierParams {
    fn default() -> Self {
        Self { threshold: 3.5 }
    }
}

/// One outlying observation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutlierPoint {
    pub date: NaiveDateTime,
    pub value: f64,
    /// Modified z-score of `value`.
    pub score: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct Outlier;

impl EventKind for Outlier {
    type Params = OutlierParams;
    type Event = OutlierPoint;

    const NAME: &'static str = "outlier";

    fn detect(data: &TimeSeries, params: &OutlierParams) -> Result<Vec<OutlierPoint>, EventError> {
        if data.len() <= MIN_SAMPLES {
            return Err(EventError::InsufficientData {
                needed: MIN_SAMPLES,
                found: data.len(),
            });
        }

        let present: Vec<f64> = data.values().iter().copied().filter(|v| !v.is_nan()).collect();
        let Some(center) = median(&present) else {
            return Ok(Vec::new());
        };

        let deviations: Vec<f64> = present.iter().map(|v| (v - center).abs()).collect();
        let mad = median(&deviations).unwrap_or(0.0);

        // Denominator of the score: MAD / 0.6745, or its mean deviation stand-in
        let spread = if mad > 0.0 {
            mad / MAD_SCALE
        } else {
            let mean_ad = deviations.iter().sum::<f64>() / deviations.len() as f64;
            if mean_ad == 0.0 {
                debug!("outlier: series has no spread, nothing to flag");
                return Ok(Vec::new());
            }
            debug!("outlier: MAD is zero, scoring with mean absolute deviation");
            MEAN_AD_SCALE * mean_ad
        };

        Ok(data
            .iter()
            .filter(|(_, value)| !value.is_nan())
            .map(|(date, value)| OutlierPoint {
                date,
                value,
                score: (value - center) / spread,
            })
            .filter(|point| point.score.abs() > params.threshold)
            .collect())
    }
}

impl EventDetector<Outlier> {
    /// Outlying values, in time order.
    pub fn values(&self) -> Vec<f64> {
        self.events().iter().map(|p| p.value).collect()
    }

    /// Timestamps of the outlying values, parallel to `values()`.
    pub fn dates(&self) -> Vec<NaiveDateTime> {
        self.events().iter().map(|p| p.date).collect()
    }
}

fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}
