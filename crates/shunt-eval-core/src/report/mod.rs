//! Review helpers over stored records: patient report, trends, tag comparison.

mod comparison;
mod cutoff;
mod trend;

pub use comparison::*;
pub use cutoff::*;
pub use trend::*;

use thiserror::Error;

use crate::db::{Database, DbError};
use crate::models::Tag;

/// Report errors.
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Database error: {0}")]
    Database(#[from] DbError),

    #[error("Comparison needs two different tags, got {0} twice")]
    SameTag(Tag),
}

pub type ReportResult<T> = Result<T, ReportError>;

/// Builds review views from the record store.
pub struct Reporter<'a> {
    db: &'a Database,
}

impl<'a> Reporter<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Report on the most recent record for `name`.
    pub fn patient_report(&self, name: &str) -> ReportResult<Option<PatientReport>> {
        let latest = self.db.latest_by_name(name)?;
        Ok(latest.as_ref().map(PatientReport::from_record))
    }

    /// Chronological series of `metric` for `name`.
    pub fn trend(&self, name: &str, metric: Metric) -> ReportResult<Vec<TrendPoint>> {
        let records = self.db.list_by_name(name)?;
        Ok(trend_series(&records, metric))
    }

    /// Compare `metric` across all records of two different tags.
    pub fn compare_tags(&self, tags: [Tag; 2], metric: Metric) -> ReportResult<TagComparison> {
        if tags[0] == tags[1] {
            return Err(ReportError::SameTag(tags[0]));
        }
        let mut records = self.db.list_by_tag(tags[0])?;
        records.extend(self.db.list_by_tag(tags[1])?);
        Ok(compare_tags(&records, tags, metric))
    }
}
