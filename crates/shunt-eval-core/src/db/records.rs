//! Measurement record database operations.

use chrono::{Local, NaiveDateTime, SubsecRound};
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::{debug, warn};

use super::{Database, DbError, DbResult};
use crate::models::{MeasurementRecord, Measurements, NewRecord, PatientSummary, Tag, DATE_FORMAT};

const SELECT_RECORD: &str = r#"
    SELECT id, anon_id, name, date, FV, RI, PI, TAV, TAMV, PSV, EDV, score, comment, tag
    FROM shunt_records
"#;

/// Length of a pseudonymous id.
pub const ANON_ID_LEN: usize = 8;

impl Database {
    /// Save a new record stamped with the current local time.
    pub fn save(&self, record: &NewRecord) -> DbResult<MeasurementRecord> {
        self.save_at(record, Local::now().naive_local())
    }

    /// Save a new record with a known measurement time (e.g. importing history).
    ///
    /// The anon_id of the latest record with the same name is reused; a new
    /// name gets a fresh token. Lookup and insert share one transaction.
    pub fn save_at(
        &self,
        record: &NewRecord,
        recorded_at: NaiveDateTime,
    ) -> DbResult<MeasurementRecord> {
        validate_name(&record.name)?;
        if let Some(field) = record.measurements.first_non_finite() {
            warn!(field, "Rejected record with non-finite measurement");
            return Err(DbError::Validation(format!("{} must be a finite number", field)));
        }

        let assessment = record.assessment();
        let comment = assessment.comment();
        let recorded_at = recorded_at.trunc_subsecs(0);
        let date = recorded_at.format(DATE_FORMAT).to_string();
        let m = &record.measurements;

        let tx = self.write_transaction()?;
        let anon_id = match latest_anon_id(&tx, &record.name)? {
            Some(existing) => existing,
            None => fresh_anon_id(&tx)?,
        };

        tx.execute(
            r#"
            INSERT INTO shunt_records (
                anon_id, name, date, FV, RI, PI, TAV, TAMV, PSV, EDV,
                score, comment, tag
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            "#,
            params![
                anon_id,
                record.name,
                date,
                m.fv,
                m.ri,
                m.pi,
                m.tav,
                m.tamv,
                m.psv,
                m.edv,
                assessment.score,
                comment,
                record.tag.as_str(),
            ],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;

        debug!(id, anon_id = %anon_id, score = assessment.score, tag = %record.tag, "Saved shunt record");

        Ok(MeasurementRecord {
            id,
            anon_id,
            name: record.name.clone(),
            recorded_at,
            measurements: *m,
            score: assessment.score,
            comment,
            tag: record.tag,
        })
    }

    /// List all records in storage order.
    pub fn list_all(&self) -> DbResult<Vec<MeasurementRecord>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{} ORDER BY id", SELECT_RECORD))?;
        let rows = stmt.query_map([], RecordRow::from_row)?;
        collect_records(rows)
    }

    /// List records for one name in storage order.
    pub fn list_by_name(&self, name: &str) -> DbResult<Vec<MeasurementRecord>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{} WHERE name = ? ORDER BY id", SELECT_RECORD))?;
        let rows = stmt.query_map([name], RecordRow::from_row)?;
        collect_records(rows)
    }

    /// List records with a given evaluation phase in storage order.
    pub fn list_by_tag(&self, tag: Tag) -> DbResult<Vec<MeasurementRecord>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{} WHERE tag = ? ORDER BY id", SELECT_RECORD))?;
        let rows = stmt.query_map([tag.as_str()], RecordRow::from_row)?;
        collect_records(rows)
    }

    /// Most recent record for a name.
    pub fn latest_by_name(&self, name: &str) -> DbResult<Option<MeasurementRecord>> {
        self.conn
            .query_row(
                &format!(
                    "{} WHERE name = ? ORDER BY date DESC, id DESC LIMIT 1",
                    SELECT_RECORD
                ),
                [name],
                RecordRow::from_row,
            )
            .optional()?
            .map(|row| row.try_into())
            .transpose()
    }

    /// Distinct non-blank names, sorted.
    pub fn list_names(&self) -> DbResult<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT DISTINCT name FROM shunt_records WHERE trim(name) <> '' ORDER BY name",
        )?;
        let rows = stmt.query_map([], |row| row.get(0))?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Record counts per name, with the anon_id and time of the latest record.
    pub fn list_patients(&self) -> DbResult<Vec<PatientSummary>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT r.name,
                   (SELECT l.anon_id FROM shunt_records l
                    WHERE l.name = r.name
                    ORDER BY l.date DESC, l.id DESC LIMIT 1),
                   COUNT(*),
                   MAX(r.date)
            FROM shunt_records r
            GROUP BY r.name
            ORDER BY r.name
            "#,
        )?;

        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, i64>(2)?,
                row.get::<_, String>(3)?,
            ))
        })?;

        let mut patients = Vec::new();
        for row in rows {
            let (name, anon_id, count, latest) = row?;
            patients.push(PatientSummary {
                name,
                anon_id,
                record_count: count as usize,
                latest_recorded_at: parse_date(&latest)?,
            });
        }
        Ok(patients)
    }

    /// Rename every record carrying `old_name`. anon_ids are left untouched.
    ///
    /// Returns the number of records changed; zero when nothing matches.
    pub fn rename_all(&self, old_name: &str, new_name: &str) -> DbResult<usize> {
        validate_name(new_name)?;
        let affected = self.conn.execute(
            "UPDATE shunt_records SET name = ?1 WHERE name = ?2",
            [new_name, old_name],
        )?;
        debug!(affected, "Renamed shunt records");
        Ok(affected)
    }

    /// Delete every record carrying `name`.
    ///
    /// Returns the number of records removed; zero when nothing matches.
    pub fn delete_all(&self, name: &str) -> DbResult<usize> {
        let affected = self
            .conn
            .execute("DELETE FROM shunt_records WHERE name = ?", [name])?;
        debug!(affected, "Deleted shunt records");
        Ok(affected)
    }
}

fn validate_name(name: &str) -> DbResult<()> {
    if name.trim().is_empty() {
        warn!("Rejected blank patient name");
        return Err(DbError::Validation("name must not be blank".into()));
    }
    Ok(())
}

fn latest_anon_id(conn: &Connection, name: &str) -> DbResult<Option<String>> {
    conn.query_row(
        "SELECT anon_id FROM shunt_records WHERE name = ? ORDER BY date DESC, id DESC LIMIT 1",
        [name],
        |row| row.get(0),
    )
    .optional()
    .map_err(Into::into)
}

fn fresh_anon_id(conn: &Connection) -> DbResult<String> {
    loop {
        let candidate: String = uuid::Uuid::new_v4()
            .simple()
            .to_string()
            .chars()
            .take(ANON_ID_LEN)
            .collect();
        let taken: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM shunt_records WHERE anon_id = ?)",
            [&candidate],
            |row| row.get(0),
        )?;
        if !taken {
            return Ok(candidate);
        }
    }
}

fn parse_date(value: &str) -> DbResult<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, DATE_FORMAT)
        .map_err(|e| DbError::Validation(format!("invalid stored date {:?}: {}", value, e)))
}

fn collect_records(
    rows: impl Iterator<Item = rusqlite::Result<RecordRow>>,
) -> DbResult<Vec<MeasurementRecord>> {
    let mut records = Vec::new();
    for row in rows {
        records.push(row?.try_into()?);
    }
    Ok(records)
}

/// Internal row representation.
struct RecordRow {
    id: i64,
    anon_id: String,
    name: String,
    date: String,
    measurements: Measurements,
    score: i64,
    comment: String,
    tag: String,
}

impl RecordRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(RecordRow {
            id: row.get(0)?,
            anon_id: row.get(1)?,
            name: row.get(2)?,
            date: row.get(3)?,
            measurements: Measurements {
                fv: row.get(4)?,
                ri: row.get(5)?,
                pi: row.get(6)?,
                tav: row.get(7)?,
                tamv: row.get(8)?,
                psv: row.get(9)?,
                edv: row.get(10)?,
            },
            score: row.get(11)?,
            comment: row.get(12)?,
            tag: row.get(13)?,
        })
    }
}

impl TryFrom<RecordRow> for MeasurementRecord {
    type Error = DbError;

    fn try_from(row: RecordRow) -> Result<Self, Self::Error> {
        let tag = row
            .tag
            .parse::<Tag>()
            .map_err(|e| DbError::Validation(e.to_string()))?;
        let score = u8::try_from(row.score)
            .ok()
            .filter(|score| *score <= 4)
            .ok_or_else(|| DbError::Validation(format!("score out of range: {}", row.score)))?;

        Ok(MeasurementRecord {
            id: row.id,
            anon_id: row.anon_id,
            name: row.name,
            recorded_at: parse_date(&row.date)?,
            measurements: row.measurements,
            score,
            comment: row.comment,
            tag,
        })
    }
}
