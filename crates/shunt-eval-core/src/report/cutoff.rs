//! Latest-record report with per-cutoff banding.

use chrono::{Local, NaiveDateTime, SubsecRound};
use serde::{Deserialize, Serialize};

use crate::engine::{Cutoff, Direction, ScoredParameter, CUTOFFS};
use crate::models::MeasurementRecord;

/// Fraction of the threshold that counts as "near the cutoff".
pub const BORDERLINE_MARGIN: f64 = 0.1;

/// Where a value sits relative to its cutoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Band {
    /// Rule not triggered
    Normal,
    /// Triggered, within 10% of the threshold
    Borderline,
    /// Triggered, more than 10% past the threshold
    Abnormal,
}

/// Classify a value against one cutoff.
pub fn classify(cutoff: &Cutoff, value: f64) -> Band {
    if !cutoff.triggers(value) {
        return Band::Normal;
    }
    let past_margin = match cutoff.direction {
        Direction::AtOrBelow => value < cutoff.threshold * (1.0 - BORDERLINE_MARGIN),
        Direction::AtOrAbove => value > cutoff.threshold * (1.0 + BORDERLINE_MARGIN),
    };
    if past_margin {
        Band::Abnormal
    } else {
        Band::Borderline
    }
}

/// One line of the cutoff table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CutoffRow {
    pub parameter: ScoredParameter,
    pub value: f64,
    pub threshold: f64,
    pub direction: Direction,
    pub band: Band,
}

/// Report over the most recent record of one patient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientReport {
    pub name: String,
    pub anon_id: String,
    pub generated_at: NaiveDateTime,
    pub record: MeasurementRecord,
    /// One row per scoring rule, in rule order
    pub rows: Vec<CutoffRow>,
    /// Findings recomputed from the stored values
    pub findings: Vec<String>,
}

impl PatientReport {
    pub fn from_record(record: &MeasurementRecord) -> Self {
        let rows = CUTOFFS
            .iter()
            .map(|cutoff| {
                let value = record.measurements.scored_value(cutoff.parameter);
                CutoffRow {
                    parameter: cutoff.parameter,
                    value,
                    threshold: cutoff.threshold,
                    direction: cutoff.direction,
                    band: classify(cutoff, value),
                }
            })
            .collect();

        Self {
            name: record.name.clone(),
            anon_id: record.anon_id.clone(),
            generated_at: Local::now().naive_local().trunc_subsecs(0),
            record: record.clone(),
            rows,
            findings: record.measurements.assess().comments,
        }
    }

    /// No abnormal findings.
    pub fn is_normal(&self) -> bool {
        self.findings.is_empty()
    }
}
