//! Record export for spreadsheets and downstream analysis.

use serde::{Deserialize, Serialize};

use crate::db::{Database, DbResult};
use crate::models::MeasurementRecord;

/// Header of the CSV export; mirrors the `shunt_records` columns.
pub const CSV_HEADER: &str = "id,anon_id,name,date,FV,RI,PI,TAV,TAMV,PSV,EDV,score,comment,tag";

/// Batch of exported records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordExport {
    /// Export timestamp
    pub exported_at: String,
    pub records: Vec<MeasurementRecord>,
}

impl RecordExport {
    pub fn new(records: Vec<MeasurementRecord>) -> Self {
        Self {
            exported_at: chrono::Utc::now().to_rfc3339(),
            records,
        }
    }

    /// Export to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Export to CSV format.
    pub fn to_csv(&self) -> String {
        let mut csv = String::new();

        csv.push_str(CSV_HEADER);
        csv.push('\n');

        for record in &self.records {
            let m = &record.measurements;
            csv.push_str(&format!(
                "{},{},{},{},{},{},{},{},{},{},{},{},{},{}\n",
                record.id,
                escape_csv(&record.anon_id),
                escape_csv(&record.name),
                record.date_string(),
                m.fv,
                m.ri,
                m.pi,
                m.tav,
                m.tamv,
                m.psv,
                m.edv,
                record.score,
                escape_csv(&record.comment),
                record.tag,
            ));
        }

        csv
    }
}

/// Record exporter.
pub struct RecordExporter<'a> {
    db: &'a Database,
}

impl<'a> RecordExporter<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Export every stored record.
    pub fn export_all(&self) -> DbResult<RecordExport> {
        Ok(RecordExport::new(self.db.list_all()?))
    }

    /// Export the records of one patient name.
    pub fn export_for_name(&self, name: &str) -> DbResult<RecordExport> {
        Ok(RecordExport::new(self.db.list_by_name(name)?))
    }
}

/// Escape a string for CSV.
fn escape_csv(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') || s.contains('\r') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}
