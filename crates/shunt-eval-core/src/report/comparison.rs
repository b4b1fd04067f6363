//! Box-plot statistics for comparing evaluation phases.

use serde::{Deserialize, Serialize};

use super::trend::Metric;
use crate::models::{MeasurementRecord, Tag};

/// Whisker reach in multiples of the interquartile range.
pub const WHISKER_IQR: f64 = 1.5;

/// Five-number summary with Tukey whiskers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryStats {
    pub count: usize,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
    /// Most extreme values within 1.5 IQR of the quartiles
    pub whisker_low: f64,
    pub whisker_high: f64,
    /// Values past the whiskers, ascending
    pub outliers: Vec<f64>,
}

impl SummaryStats {
    /// `None` for an empty sample.
    pub fn from_values(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);

        let q1 = quantile(&sorted, 0.25);
        let median = quantile(&sorted, 0.5);
        let q3 = quantile(&sorted, 0.75);
        let reach = WHISKER_IQR * (q3 - q1);
        let (low_fence, high_fence) = (q1 - reach, q3 + reach);

        let mut inside = sorted
            .iter()
            .copied()
            .filter(|v| *v >= low_fence && *v <= high_fence);
        let whisker_low = inside.next().unwrap_or(q1);
        let whisker_high = inside.last().unwrap_or(whisker_low);
        let outliers = sorted
            .iter()
            .copied()
            .filter(|v| *v < low_fence || *v > high_fence)
            .collect();

        Some(Self {
            count: sorted.len(),
            min: sorted[0],
            q1,
            median,
            q3,
            max: sorted[sorted.len() - 1],
            whisker_low,
            whisker_high,
            outliers,
        })
    }
}

/// Linear interpolation between closest ranks. `sorted` must be non-empty.
fn quantile(sorted: &[f64], p: f64) -> f64 {
    let pos = p * (sorted.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    let frac = pos - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * frac
}

/// Statistics for one tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagGroup {
    pub tag: Tag,
    /// `None` when no record carries this tag
    pub stats: Option<SummaryStats>,
}

/// Side-by-side statistics of one metric under two tags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagComparison {
    pub metric: Metric,
    pub groups: [TagGroup; 2],
}

/// Summarize `metric` for each of two tags. Records with other tags are ignored.
pub fn compare_tags(records: &[MeasurementRecord], tags: [Tag; 2], metric: Metric) -> TagComparison {
    let group = |tag: Tag| {
        let values: Vec<f64> = records
            .iter()
            .filter(|r| r.tag == tag)
            .map(|r| metric.value(&r.measurements))
            .collect();
        TagGroup {
            tag,
            stats: SummaryStats::from_values(&values),
        }
    };

    TagComparison {
        metric,
        groups: [group(tags[0]), group(tags[1])],
    }
}
