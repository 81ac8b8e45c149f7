/// Spike and valley detection.
///
/// Two interchangeable strategies produce the condition:
///
/// - **Rolling statistics** (default): a trailing window mean and sample
///   standard deviation; samples further than `threshold` standard
///   deviations from the window mean are flagged.
/// - **Peak detection**: local maxima of the series and of its negation
///   (valleys), filtered by height, neighbour threshold, prominence and
///   width at half prominence. Each surviving peak flags a window of
///   `±width` samples around it.
///
/// Each run of flagged samples becomes one event; runs are never merged.

use log::debug;
use serde::Deserialize;

use super::{periods_from_condition, EventKind};
use crate::model::{ConditionSeries, EventError, TimeSeries};
use crate::periods::TimePeriod;

/// Minimum rolling window, in samples.
const MIN_WINDOW: usize = 5;

/// Condition strategy for spike/valley detection.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SpikeStrategy {
    RollingStatistics {
        /// Window length in samples; `None` uses `max(len / 4, 5)`.
        #[serde(default)]
        window: Option<usize>,
        /// Number of standard deviations that counts as a spike.
        #[serde(default = "default_sigma")]
        threshold: f64,
    },
    PeakDetection {
        /// Minimum peak value.
        #[serde(default)]
        height: Option<f64>,
        /// Minimum vertical distance to both neighbouring samples.
        #[serde(default)]
        threshold: Option<f64>,
        /// Minimum topographic prominence.
        #[serde(default)]
        prominence: Option<f64>,
        /// Allowed (min, max) width at half prominence, in samples.
        #[serde(default = "default_width")]
        width: (f64, f64),
    },
}

fn default_sigma() -> f64 {
    3.0
}

fn default_width() -> (f64, f64) {
    (0.0, 3.0)
}

impl Default for SpikeStrategy {
    fn default() -> Self {
        SpikeStrategy::RollingStatistics {
            window: None,
            threshold: default_sigma(),
        }
    }
}

impl SpikeStrategy {
    /// Peak detection with no filters other than the default width range.
    pub fn peaks() -> Self {
        SpikeStrategy::PeakDetection {
            height: None,
            threshold: None,
            prominence: None,
            width: default_width(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct SpikeValleyParams {
    pub strategy: SpikeStrategy,
}

#[derive(Debug, Clone, Copy)]
pub struct SpikeValley;

impl EventKind for SpikeValley {
    type Params = SpikeValleyParams;
    type Event = TimePeriod;

    const NAME: &'static str = "spike_valley";

    fn detect(data: &TimeSeries, params: &SpikeValleyParams) -> Result<Vec<TimePeriod>, EventError> {
        let mask = match &params.strategy {
            SpikeStrategy::RollingStatistics { window, threshold } => {
                let window = window.unwrap_or((data.len() / 4).max(MIN_WINDOW));
                if window == 0 {
                    return Err(EventError::ConfigurationError(
                        "rolling window must be at least one sample".to_string(),
                    ));
                }
                rolling_outside_band(data.values(), window, *threshold)
            }
            SpikeStrategy::PeakDetection { height, threshold, prominence, width } => {
                let filters = PeakFilters {
                    height: *height,
                    threshold: *threshold,
                    prominence: *prominence,
                    width: *width,
                };
                peak_windows(data.values(), &filters)
            }
        };
        let condition = ConditionSeries::new(data.index(), mask);
        periods_from_condition(data, &condition, |_| true)
    }
}

// ---------------------------------------------------------------------------
// Rolling statistics
// ---------------------------------------------------------------------------

/// Flags samples outside `mean ± threshold * std` of the trailing window
/// ending at them. Windows that are not yet full or that contain a missing
/// value produce no flag.
fn rolling_outside_band(values: &[f64], window: usize, threshold: f64) -> Vec<bool> {
    let mut mask = vec![false; values.len()];
    if window < 2 {
        // Sample standard deviation is undefined for a single value
        return mask;
    }

    for end in (window - 1)..values.len() {
        let slice = &values[end + 1 - window..=end];
        if slice.iter().any(|v| v.is_nan()) {
            continue;
        }
        let n = window as f64;
        let mean = slice.iter().sum::<f64>() / n;
        let var = slice.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
        let std = var.sqrt();
        mask[end] = (values[end] - mean).abs() > threshold * std;
    }
    mask
}

// ---------------------------------------------------------------------------
// Peak detection
// ---------------------------------------------------------------------------

struct PeakFilters {
    height: Option<f64>,
    threshold: Option<f64>,
    prominence: Option<f64>,
    width: (f64, f64),
}

/// A local maximum with its topographic measurements.
#[derive(Debug, Clone, PartialEq)]
struct Peak {
    index: usize,
    prominence: f64,
    width: f64,
}

/// Marks `[peak - width, peak + width]` for every peak and valley that
/// passes the filters.
fn peak_windows(values: &[f64], filters: &PeakFilters) -> Vec<bool> {
    let inverted: Vec<f64> = values.iter().map(|v| -v).collect();
    let mut mask = vec![false; values.len()];

    for signal in [values, inverted.as_slice()] {
        for peak in find_peaks(signal, filters) {
            let half = peak.width.round() as usize;
            let lo = peak.index.saturating_sub(half);
            let hi = (peak.index + half).min(values.len() - 1);
            for flag in &mut mask[lo..=hi] {
                *flag = true;
            }
        }
    }
    mask
}

fn find_peaks(x: &[f64], filters: &PeakFilters) -> Vec<Peak> {
    let peaks: Vec<Peak> = local_maxima(x)
        .into_iter()
        .filter(|&p| filters.height.is_none_or(|h| x[p] >= h))
        .filter(|&p| {
            filters
                .threshold
                .is_none_or(|t| (x[p] - x[p - 1]).min(x[p] - x[p + 1]) >= t)
        })
        .map(|p| measure_peak(x, p))
        .filter(|peak| filters.prominence.is_none_or(|m| peak.prominence >= m))
        .filter(|peak| peak.width >= filters.width.0 && peak.width <= filters.width.1)
        .collect();
    debug!("spike_valley: {} peaks passed the filters", peaks.len());
    peaks
}

/// Indices of local maxima. A flat-topped peak is reported at the middle
/// of its plateau; the first and last samples are never peaks.
fn local_maxima(x: &[f64]) -> Vec<usize> {
    let mut peaks = Vec::new();
    if x.len() < 3 {
        return peaks;
    }

    let last = x.len() - 1;
    let mut i = 1;
    while i < last {
        if x[i - 1] < x[i] {
            let mut ahead = i + 1;
            while ahead < last && x[ahead] == x[i] {
                ahead += 1;
            }
            if x[ahead] < x[i] {
                peaks.push((i + ahead - 1) / 2);
                i = ahead;
            }
        }
        i += 1;
    }
    peaks
}

/// Prominence and width at half prominence of the peak at `p`.
fn measure_peak(x: &[f64], p: usize) -> Peak {
    // Walk outwards until a strictly higher sample; the lowest point on each
    // side is that side's base
    let mut left_base = p;
    let mut left_min = x[p];
    let mut i = p;
    loop {
        if x[i] > x[p] {
            break;
        }
        if x[i] < left_min {
            left_min = x[i];
            left_base = i;
        }
        if i == 0 {
            break;
        }
        i -= 1;
    }

    let mut right_base = p;
    let mut right_min = x[p];
    for (j, v) in x.iter().enumerate().skip(p) {
        if *v > x[p] {
            break;
        }
        if *v < right_min {
            right_min = *v;
            right_base = j;
        }
    }

    let prominence = x[p] - left_min.max(right_min);
    let height = x[p] - prominence * 0.5;

    let mut i = p;
    while left_base < i && height < x[i] {
        i -= 1;
    }
    let mut left_ip = i as f64;
    if x[i] < height {
        left_ip += (height - x[i]) / (x[i + 1] - x[i]);
    }

    let mut i = p;
    while i < right_base && height < x[i] {
        i += 1;
    }
    let mut right_ip = i as f64;
    if x[i] < height {
        right_ip -= (height - x[i]) / (x[i - 1] - x[i]);
    }

    Peak {
        index: p,
        prominence,
        width: right_ip - left_ip,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
