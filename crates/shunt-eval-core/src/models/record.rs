//! Stored measurement records.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::measurement::Measurements;
use crate::engine::Assessment;

/// Storage format for `recorded_at` (`YYYY-MM-DD HH:MM:SS`).
pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Clinical evaluation phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Tag {
    /// Pre-operative evaluation
    Preop,
    /// Post-operative evaluation
    Postop,
    /// Periodic follow-up
    Periodic,
    /// Before a vascular access intervention
    PreIntervention,
    /// After a vascular access intervention
    PostIntervention,
}

impl Tag {
    pub const ALL: [Tag; 5] = [
        Tag::Preop,
        Tag::Postop,
        Tag::Periodic,
        Tag::PreIntervention,
        Tag::PostIntervention,
    ];

    /// Stored string form.
    pub fn as_str(self) -> &'static str {
        match self {
            Tag::Preop => "preop",
            Tag::Postop => "postop",
            Tag::Periodic => "periodic",
            Tag::PreIntervention => "pre-intervention",
            Tag::PostIntervention => "post-intervention",
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tag string outside the fixed enumeration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown tag: {0:?}")]
pub struct ParseTagError(pub String);

impl FromStr for Tag {
    type Err = ParseTagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Tag::ALL
            .into_iter()
            .find(|tag| tag.as_str() == s)
            .ok_or_else(|| ParseTagError(s.to_string()))
    }
}

/// Save payload: a record without id, timestamp and anon_id.
///
/// Score and comment are not carried; the store derives them from the
/// measurements so they always agree with the scoring rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewRecord {
    pub name: String,
    pub tag: Tag,
    pub measurements: Measurements,
}

impl NewRecord {
    pub fn new(name: impl Into<String>, tag: Tag, measurements: Measurements) -> Self {
        Self {
            name: name.into(),
            tag,
            measurements,
        }
    }

    pub fn assessment(&self) -> Assessment {
        self.measurements.assess()
    }
}

/// A persisted measurement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementRecord {
    /// Store-assigned unique id
    pub id: i64,
    /// Pseudonymous per-name token (8 hex chars)
    pub anon_id: String,
    /// Patient identifier
    pub name: String,
    /// Save time, second resolution
    pub recorded_at: NaiveDateTime,
    pub measurements: Measurements,
    /// Number of triggered findings (0-4)
    pub score: u8,
    /// Findings joined with "; "
    pub comment: String,
    pub tag: Tag,
}

impl MeasurementRecord {
    /// Timestamp in storage format.
    pub fn date_string(&self) -> String {
        self.recorded_at.format(DATE_FORMAT).to_string()
    }
}

/// One row of the patient management table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientSummary {
    pub name: String,
    /// anon_id of the most recent record
    pub anon_id: String,
    pub record_count: usize,
    pub latest_recorded_at: NaiveDateTime,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_round_trip_strings() {
        for tag in Tag::ALL {
            assert_eq!(tag.as_str().parse::<Tag>().unwrap(), tag);
        }
    }

    #[test]
    fn test_unknown_tag() {
        let err = "VAIVT".parse::<Tag>().unwrap_err();
        assert_eq!(err, ParseTagError("VAIVT".into()));
        assert!("Preop".parse::<Tag>().is_err());
    }

    #[test]
    fn test_tag_serde_matches_storage() {
        let json = serde_json::to_string(&Tag::PreIntervention).unwrap();
        assert_eq!(json, "\"pre-intervention\"");
    }

    #[test]
    fn test_new_record_derives_score() {
        let measurements = Measurements {
            tav: 30.0,
            ri: 0.7,
            ..Measurements::default()
        };
        let assessment = NewRecord::new("Sato", Tag::Periodic, measurements).assessment();
        assert_eq!(assessment.score, 2);
        assert_eq!(
            assessment.comment(),
            "low TAV suggests reduced flow; elevated RI suggests high resistance"
        );
    }
}
