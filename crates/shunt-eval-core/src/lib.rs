//! Shunt-Eval Core Library
//!
//! Doppler-based evaluation of dialysis vascular access (shunt) function with a
//! longitudinal per-patient record store.
//!
//! # Architecture
//!
//! ```text
//! FV / RI / diameter ──► Formula Engine ──► PSV, EDV, TAV, TAMV, PI, TAVR
//!                                                 │
//!          form values (FV, RI, PI, TAV, TAMV, PSV, EDV)
//!                                                 │
//!                                          Scoring Engine
//!                                      (TAV, RI, PI, EDV cutoffs)
//!                                                 │
//!                               ┌─────────────────┴─────────────────┐
//!                               │                                   │
//!                        simulation view                 Record Store (SQLite)
//!                        (no persistence)          anon_id per name, rename, delete
//!                                                                   │
//!                                          ┌────────────────────────┼───────────────┐
//!                                          ▼                        ▼               ▼
//!                                   Patient report            Trend series     JSON / CSV
//!                                   (cutoff bands)         & tag comparison      export
//! ```
//!
//! # Modules
//!
//! - [`engine`]: Formula and scoring engines (pure, total)
//! - [`models`]: Domain types (MeasurementInput, Measurements, MeasurementRecord, Tag)
//! - [`db`]: SQLite record store
//! - [`report`]: Patient report, trends, tag comparison
//! - [`export`]: JSON and CSV export
//! - [`config`], [`logging`]: Host configuration and tracing setup

pub mod config;
pub mod db;
pub mod engine;
pub mod export;
pub mod logging;
pub mod models;
pub mod report;

// Re-export commonly used types
pub use config::Config;
pub use db::{Database, DbError};
pub use engine::{derive_parameters, score_findings, Assessment, DerivedParameters, CUTOFFS};
pub use models::{
    MeasurementInput, MeasurementRecord, Measurements, NewRecord, PatientSummary, Tag,
};
pub use report::{Metric, PatientReport, Reporter};

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::path::Path;
use std::sync::{Arc, Mutex};

use models::DATE_FORMAT;

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum ShuntEvalError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<db::DbError> for ShuntEvalError {
    fn from(e: db::DbError) -> Self {
        match e {
            db::DbError::Validation(msg) => ShuntEvalError::ValidationError(msg),
            other => ShuntEvalError::StorageUnavailable(other.to_string()),
        }
    }
}

impl From<report::ReportError> for ShuntEvalError {
    fn from(e: report::ReportError) -> Self {
        match e {
            report::ReportError::Database(db_error) => db_error.into(),
            same @ report::ReportError::SameTag(_) => {
                ShuntEvalError::ValidationError(same.to_string())
            }
        }
    }
}

impl From<config::ConfigError> for ShuntEvalError {
    fn from(e: config::ConfigError) -> Self {
        ShuntEvalError::ConfigError(e.to_string())
    }
}

impl From<serde_json::Error> for ShuntEvalError {
    fn from(e: serde_json::Error) -> Self {
        ShuntEvalError::SerializationError(e.to_string())
    }
}

impl<T> From<std::sync::PoisonError<T>> for ShuntEvalError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        ShuntEvalError::StorageUnavailable(format!("Lock poisoned: {}", e))
    }
}

// =========================================================================
// Engine Functions (exported to FFI)
// =========================================================================

/// Derive PSV, EDV, TAV, TAMV, PI and TAVR from FV, RI and vessel diameter.
#[uniffi::export]
pub fn ffi_derive_parameters(
    flow_volume: f64,
    resistance_index: f64,
    vessel_diameter: f64,
) -> FfiDerivedParameters {
    derive_parameters(flow_volume, resistance_index, vessel_diameter).into()
}

/// Score TAV, RI, PI and EDV against the fixed cutoffs.
#[uniffi::export]
pub fn ffi_score_findings(tav: f64, ri: f64, pi: f64, edv: f64) -> FfiAssessment {
    score_findings(tav, ri, pi, edv).into()
}

/// Simulation mode: derive and score without touching the store.
#[uniffi::export]
pub fn simulate(input: FfiMeasurementInput) -> FfiSimulation {
    let input = MeasurementInput {
        flow_volume: input.flow_volume,
        resistance_index: input.resistance_index,
        vessel_diameter: input.vessel_diameter,
    };
    let simulation = input.simulate();
    FfiSimulation {
        parameters: simulation.parameters.into(),
        assessment: simulation.assessment.into(),
        out_of_range: input.out_of_range().into_iter().map(String::from).collect(),
    }
}

/// Simulator starting point.
#[uniffi::export]
pub fn baseline_input() -> FfiMeasurementInput {
    let baseline = MeasurementInput::baseline();
    FfiMeasurementInput {
        flow_volume: baseline.flow_volume,
        resistance_index: baseline.resistance_index,
        vessel_diameter: baseline.vessel_diameter,
    }
}

/// Install the tracing subscriber.
#[uniffi::export]
pub fn init_logging(level: String) {
    logging::init_with_level(&level);
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

fn wrap(db: Database) -> Result<Arc<ShuntEvalCore>, ShuntEvalError> {
    db.migrate()?;
    Ok(Arc::new(ShuntEvalCore {
        db: Arc::new(Mutex::new(db)),
    }))
}

/// Open or create a database at the given path and apply the schema.
#[uniffi::export]
pub fn open_database(path: String) -> Result<Arc<ShuntEvalCore>, ShuntEvalError> {
    wrap(Database::open(&path)?)
}

/// Create an in-memory database (for testing).
#[uniffi::export]
pub fn open_database_in_memory() -> Result<Arc<ShuntEvalCore>, ShuntEvalError> {
    wrap(Database::open_in_memory()?)
}

/// Open the database named in a config file (default location when `None`).
#[uniffi::export]
pub fn open_database_from_config(
    config_path: Option<String>,
) -> Result<Arc<ShuntEvalCore>, ShuntEvalError> {
    let config = match config_path {
        Some(path) => Config::load_from(Path::new(&path))?,
        None => Config::load()?,
    };
    logging::init_with_level(&config.logging.level);
    wrap(Database::open_configured(&config.storage)?)
}

// =========================================================================
// Main API Object
// =========================================================================

/// Thread-safe store handle for FFI. All calls are serialized on one connection.
#[derive(uniffi::Object)]
pub struct ShuntEvalCore {
    db: Arc<Mutex<Database>>,
}

#[uniffi::export]
impl ShuntEvalCore {
    // =========================================================================
    // Record Operations
    // =========================================================================

    /// Save a new record; score and comment are derived from the measurements.
    pub fn save_record(
        &self,
        name: String,
        tag: FfiTag,
        measurements: FfiMeasurements,
    ) -> Result<FfiMeasurementRecord, ShuntEvalError> {
        let db = self.db.lock()?;
        let record = NewRecord::new(name, tag.into(), measurements.into());
        Ok(db.save(&record)?.into())
    }

    pub fn list_records(&self) -> Result<Vec<FfiMeasurementRecord>, ShuntEvalError> {
        let db = self.db.lock()?;
        Ok(db.list_all()?.into_iter().map(Into::into).collect())
    }

    pub fn list_records_by_name(
        &self,
        name: String,
    ) -> Result<Vec<FfiMeasurementRecord>, ShuntEvalError> {
        let db = self.db.lock()?;
        Ok(db.list_by_name(&name)?.into_iter().map(Into::into).collect())
    }

    pub fn list_records_by_tag(
        &self,
        tag: FfiTag,
    ) -> Result<Vec<FfiMeasurementRecord>, ShuntEvalError> {
        let db = self.db.lock()?;
        Ok(db.list_by_tag(tag.into())?.into_iter().map(Into::into).collect())
    }

    pub fn latest_record(
        &self,
        name: String,
    ) -> Result<Option<FfiMeasurementRecord>, ShuntEvalError> {
        let db = self.db.lock()?;
        Ok(db.latest_by_name(&name)?.map(Into::into))
    }

    /// Rename every record of a patient. Returns the number changed.
    pub fn rename_patient(&self, old_name: String, new_name: String) -> Result<u32, ShuntEvalError> {
        let db = self.db.lock()?;
        Ok(db.rename_all(&old_name, &new_name)? as u32)
    }

    /// Delete every record of a patient. Returns the number removed.
    pub fn delete_patient(&self, name: String) -> Result<u32, ShuntEvalError> {
        let db = self.db.lock()?;
        Ok(db.delete_all(&name)? as u32)
    }

    pub fn list_names(&self) -> Result<Vec<String>, ShuntEvalError> {
        let db = self.db.lock()?;
        Ok(db.list_names()?)
    }

    pub fn list_patients(&self) -> Result<Vec<FfiPatientSummary>, ShuntEvalError> {
        let db = self.db.lock()?;
        Ok(db.list_patients()?.into_iter().map(Into::into).collect())
    }

    // =========================================================================
    // Review Operations
    // =========================================================================

    pub fn patient_report(
        &self,
        name: String,
    ) -> Result<Option<FfiPatientReport>, ShuntEvalError> {
        let db = self.db.lock()?;
        Ok(Reporter::new(&db).patient_report(&name)?.map(Into::into))
    }

    pub fn trend(
        &self,
        name: String,
        metric: FfiMetric,
    ) -> Result<Vec<FfiTrendPoint>, ShuntEvalError> {
        let db = self.db.lock()?;
        let points = Reporter::new(&db).trend(&name, metric.into())?;
        Ok(points.into_iter().map(Into::into).collect())
    }

    pub fn compare_tags(
        &self,
        first: FfiTag,
        second: FfiTag,
        metric: FfiMetric,
    ) -> Result<Vec<FfiTagGroup>, ShuntEvalError> {
        let db = self.db.lock()?;
        let comparison =
            Reporter::new(&db).compare_tags([first.into(), second.into()], metric.into())?;
        Ok(comparison.groups.into_iter().map(Into::into).collect())
    }

    // =========================================================================
    // Export Operations
    // =========================================================================

    pub fn export_json(&self) -> Result<String, ShuntEvalError> {
        let db = self.db.lock()?;
        let batch = export::RecordExporter::new(&db).export_all()?;
        Ok(batch.to_json()?)
    }

    pub fn export_csv(&self) -> Result<String, ShuntEvalError> {
        let db = self.db.lock()?;
        let batch = export::RecordExporter::new(&db).export_all()?;
        Ok(batch.to_csv())
    }
}

// =========================================================================
// FFI Types
// =========================================================================

/// FFI-safe evaluation phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
pub enum FfiTag {
    Preop,
    Postop,
    Periodic,
    PreIntervention,
    PostIntervention,
}

impl From<FfiTag> for Tag {
    fn from(tag: FfiTag) -> Self {
        match tag {
            FfiTag::Preop => Tag::Preop,
            FfiTag::Postop => Tag::Postop,
            FfiTag::Periodic => Tag::Periodic,
            FfiTag::PreIntervention => Tag::PreIntervention,
            FfiTag::PostIntervention => Tag::PostIntervention,
        }
    }
}

impl From<Tag> for FfiTag {
    fn from(tag: Tag) -> Self {
        match tag {
            Tag::Preop => FfiTag::Preop,
            Tag::Postop => FfiTag::Postop,
            Tag::Periodic => FfiTag::Periodic,
            Tag::PreIntervention => FfiTag::PreIntervention,
            Tag::PostIntervention => FfiTag::PostIntervention,
        }
    }
}

/// FFI-safe chartable metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
pub enum FfiMetric {
    Fv,
    Ri,
    Pi,
    Tav,
    Tamv,
    Psv,
    Edv,
}

impl From<FfiMetric> for Metric {
    fn from(metric: FfiMetric) -> Self {
        match metric {
            FfiMetric::Fv => Metric::Fv,
            FfiMetric::Ri => Metric::Ri,
            FfiMetric::Pi => Metric::Pi,
            FfiMetric::Tav => Metric::Tav,
            FfiMetric::Tamv => Metric::Tamv,
            FfiMetric::Psv => Metric::Psv,
            FfiMetric::Edv => Metric::Edv,
        }
    }
}

/// FFI-safe simulator input.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiMeasurementInput {
    pub flow_volume: f64,
    pub resistance_index: f64,
    pub vessel_diameter: f64,
}

/// FFI-safe derived parameters.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiDerivedParameters {
    pub psv: f64,
    pub edv: f64,
    pub tav: f64,
    pub tamv: f64,
    pub pi: f64,
    pub tavr: f64,
}

impl From<DerivedParameters> for FfiDerivedParameters {
    fn from(p: DerivedParameters) -> Self {
        Self {
            psv: p.psv,
            edv: p.edv,
            tav: p.tav,
            tamv: p.tamv,
            pi: p.pi,
            tavr: p.tavr,
        }
    }
}

/// FFI-safe scoring result.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiAssessment {
    pub score: u8,
    pub comments: Vec<String>,
}

impl From<Assessment> for FfiAssessment {
    fn from(a: Assessment) -> Self {
        Self {
            score: a.score,
            comments: a.comments,
        }
    }
}

/// FFI-safe simulation result.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiSimulation {
    pub parameters: FfiDerivedParameters,
    pub assessment: FfiAssessment,
    /// Inputs outside the advisory slider ranges
    pub out_of_range: Vec<String>,
}

/// FFI-safe clinical parameter set.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiMeasurements {
    pub fv: f64,
    pub ri: f64,
    pub pi: f64,
    pub tav: f64,
    pub tamv: f64,
    pub psv: f64,
    pub edv: f64,
}

impl From<FfiMeasurements> for Measurements {
    fn from(m: FfiMeasurements) -> Self {
        Measurements {
            fv: m.fv,
            ri: m.ri,
            pi: m.pi,
            tav: m.tav,
            tamv: m.tamv,
            psv: m.psv,
            edv: m.edv,
        }
    }
}

impl From<Measurements> for FfiMeasurements {
    fn from(m: Measurements) -> Self {
        Self {
            fv: m.fv,
            ri: m.ri,
            pi: m.pi,
            tav: m.tav,
            tamv: m.tamv,
            psv: m.psv,
            edv: m.edv,
        }
    }
}

/// FFI-safe stored record.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiMeasurementRecord {
    pub id: i64,
    pub anon_id: String,
    pub name: String,
    /// `YYYY-MM-DD HH:MM:SS`
    pub date: String,
    pub measurements: FfiMeasurements,
    pub score: u8,
    pub comment: String,
    pub tag: FfiTag,
}

impl From<MeasurementRecord> for FfiMeasurementRecord {
    fn from(record: MeasurementRecord) -> Self {
        Self {
            id: record.id,
            date: record.date_string(),
            anon_id: record.anon_id,
            name: record.name,
            measurements: record.measurements.into(),
            score: record.score,
            comment: record.comment,
            tag: record.tag.into(),
        }
    }
}

/// FFI-safe patient summary.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPatientSummary {
    pub name: String,
    pub anon_id: String,
    pub record_count: u32,
    pub latest_date: String,
}

impl From<PatientSummary> for FfiPatientSummary {
    fn from(summary: PatientSummary) -> Self {
        Self {
            name: summary.name,
            anon_id: summary.anon_id,
            record_count: summary.record_count as u32,
            latest_date: summary.latest_recorded_at.format(DATE_FORMAT).to_string(),
        }
    }
}

/// FFI-safe cutoff table row.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiCutoffRow {
    pub parameter: String,
    pub value: f64,
    pub threshold: f64,
    /// "at_or_below" or "at_or_above"
    pub direction: String,
    /// "normal", "borderline" or "abnormal"
    pub band: String,
}

impl From<report::CutoffRow> for FfiCutoffRow {
    fn from(row: report::CutoffRow) -> Self {
        Self {
            parameter: row.parameter.label().to_string(),
            value: row.value,
            threshold: row.threshold,
            direction: match row.direction {
                engine::Direction::AtOrBelow => "at_or_below".into(),
                engine::Direction::AtOrAbove => "at_or_above".into(),
            },
            band: match row.band {
                report::Band::Normal => "normal".into(),
                report::Band::Borderline => "borderline".into(),
                report::Band::Abnormal => "abnormal".into(),
            },
        }
    }
}

/// FFI-safe patient report.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPatientReport {
    pub name: String,
    pub anon_id: String,
    pub generated_at: String,
    pub record: FfiMeasurementRecord,
    pub rows: Vec<FfiCutoffRow>,
    pub findings: Vec<String>,
}

impl From<PatientReport> for FfiPatientReport {
    fn from(report: PatientReport) -> Self {
        Self {
            name: report.name,
            anon_id: report.anon_id,
            generated_at: report.generated_at.format(DATE_FORMAT).to_string(),
            record: report.record.into(),
            rows: report.rows.into_iter().map(Into::into).collect(),
            findings: report.findings,
        }
    }
}

/// FFI-safe trend point.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiTrendPoint {
    pub record_id: i64,
    pub date: String,
    pub value: f64,
}

impl From<report::TrendPoint> for FfiTrendPoint {
    fn from(point: report::TrendPoint) -> Self {
        Self {
            record_id: point.record_id,
            date: point.recorded_at.format(DATE_FORMAT).to_string(),
            value: point.value,
        }
    }
}

/// FFI-safe box-plot statistics.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiSummaryStats {
    pub count: u32,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
    pub whisker_low: f64,
    pub whisker_high: f64,
    pub outliers: Vec<f64>,
}

impl From<report::SummaryStats> for FfiSummaryStats {
    fn from(stats: report::SummaryStats) -> Self {
        Self {
            count: stats.count as u32,
            min: stats.min,
            q1: stats.q1,
            median: stats.median,
            q3: stats.q3,
            max: stats.max,
            whisker_low: stats.whisker_low,
            whisker_high: stats.whisker_high,
            outliers: stats.outliers,
        }
    }
}

/// FFI-safe per-tag statistics.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiTagGroup {
    pub tag: FfiTag,
    pub stats: Option<FfiSummaryStats>,
}

impl From<report::TagGroup> for FfiTagGroup {
    fn from(group: report::TagGroup) -> Self {
        Self {
            tag: group.tag.into(),
            stats: group.stats.map(Into::into),
        }
    }
}
