//! Per-metric time series for longitudinal review.

use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::models::{MeasurementRecord, Measurements};

/// Stored clinical parameters that can be charted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Metric {
    Fv,
    Ri,
    Pi,
    Tav,
    Tamv,
    Psv,
    Edv,
}

impl Metric {
    pub const ALL: [Metric; 7] = [
        Metric::Fv,
        Metric::Ri,
        Metric::Pi,
        Metric::Tav,
        Metric::Tamv,
        Metric::Psv,
        Metric::Edv,
    ];

    /// Column name in the record table.
    pub fn label(self) -> &'static str {
        match self {
            Metric::Fv => "FV",
            Metric::Ri => "RI",
            Metric::Pi => "PI",
            Metric::Tav => "TAV",
            Metric::Tamv => "TAMV",
            Metric::Psv => "PSV",
            Metric::Edv => "EDV",
        }
    }

    pub fn value(self, measurements: &Measurements) -> f64 {
        match self {
            Metric::Fv => measurements.fv,
            Metric::Ri => measurements.ri,
            Metric::Pi => measurements.pi,
            Metric::Tav => measurements.tav,
            Metric::Tamv => measurements.tamv,
            Metric::Psv => measurements.psv,
            Metric::Edv => measurements.edv,
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A single charted value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub record_id: i64,
    pub recorded_at: NaiveDateTime,
    pub value: f64,
}

/// Chronological series of one metric. Same-second records keep save order.
pub fn trend_series(records: &[MeasurementRecord], metric: Metric) -> Vec<TrendPoint> {
    let mut points: Vec<TrendPoint> = records
        .iter()
        .map(|record| TrendPoint {
            record_id: record.id,
            recorded_at: record.recorded_at,
            value: metric.value(&record.measurements),
        })
        .collect();
    points.sort_by_key(|p| (p.recorded_at, p.record_id));
    points
}
