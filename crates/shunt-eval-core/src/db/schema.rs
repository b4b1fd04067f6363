//! SQLite schema definition.

/// Current schema version, stored in `PRAGMA user_version`.
pub const SCHEMA_VERSION: i64 = 1;

/// Schema for shunt measurement records.
pub const SCHEMA: &str = r#"
-- ============================================================================
-- Shunt Records
-- ============================================================================

CREATE TABLE IF NOT EXISTS shunt_records (
    id INTEGER PRIMARY KEY,
    anon_id TEXT NOT NULL,
    name TEXT NOT NULL CHECK (length(trim(name)) > 0),
    date TEXT NOT NULL,                          -- YYYY-MM-DD HH:MM:SS
    FV REAL NOT NULL,
    RI REAL NOT NULL,
    PI REAL NOT NULL,
    TAV REAL NOT NULL,
    TAMV REAL NOT NULL,
    PSV REAL NOT NULL,
    EDV REAL NOT NULL,
    score INTEGER NOT NULL CHECK (score BETWEEN 0 AND 4),
    comment TEXT NOT NULL DEFAULT '',
    tag TEXT NOT NULL CHECK (tag IN (
        'preop', 'postop', 'periodic', 'pre-intervention', 'post-intervention'
    ))
);

CREATE INDEX IF NOT EXISTS idx_shunt_records_name ON shunt_records(name, date);
CREATE INDEX IF NOT EXISTS idx_shunt_records_tag ON shunt_records(tag);
CREATE INDEX IF NOT EXISTS idx_shunt_records_anon_id ON shunt_records(anon_id);
"#;

/// Rewrites evaluation-phase labels written by the first-generation tool.
///
/// Only affects databases that predate the CHECK constraint on `tag`.
pub const LEGACY_TAG_RELABEL: &str = r#"
UPDATE shunt_records SET tag = CASE tag
    WHEN '術前評価' THEN 'preop'
    WHEN '術後評価' THEN 'postop'
    WHEN '定期評価' THEN 'periodic'
    WHEN 'VAIVT前評価' THEN 'pre-intervention'
    WHEN 'VAIVT後評価' THEN 'post-intervention'
END
WHERE tag IN ('術前評価', '術後評価', '定期評価', 'VAIVT前評価', 'VAIVT後評価')
"#;
