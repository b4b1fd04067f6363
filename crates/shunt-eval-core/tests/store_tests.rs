//! Record store behavior on a file-backed database.

use shunt_eval_core::db::{Database, DbError};
use shunt_eval_core::models::{Measurements, NewRecord, Tag};
use tempfile::TempDir;

fn open_store(dir: &TempDir) -> Database {
    let db = Database::open(dir.path().join("shunt_data.db")).unwrap();
    db.migrate().unwrap();
    db
}

fn periodic(name: &str) -> NewRecord {
    NewRecord::new(name, Tag::Periodic, Measurements::default())
}

#[test]
fn test_save_then_list_all_round_trip() {
    let dir = TempDir::new().unwrap();
    let db = open_store(&dir);

    let measurements = Measurements {
        fv: 512.5,
        ri: 0.71,
        pi: 1.42,
        tav: 33.3,
        tamv: 61.0,
        psv: 98.6,
        edv: 39.9,
    };
    let saved = db
        .save(&NewRecord::new("Tanaka", Tag::PreIntervention, measurements))
        .unwrap();
    assert_eq!(saved.score, 4);

    let all = db.list_all().unwrap();
    assert!(all.contains(&saved));
}

#[test]
fn test_records_survive_reopen() {
    let dir = TempDir::new().unwrap();

    let saved = {
        let db = open_store(&dir);
        let saved = db.save(&periodic("Tanaka")).unwrap();
        db.close().unwrap();
        saved
    };

    let db = open_store(&dir);
    assert_eq!(db.list_all().unwrap(), vec![saved.clone()]);

    // anon_id resolution continues across sessions
    let next = db.save(&periodic("Tanaka")).unwrap();
    assert_eq!(next.anon_id, saved.anon_id);
}

#[test]
fn test_pseudonym_per_name() {
    let dir = TempDir::new().unwrap();
    let db = open_store(&dir);

    let a1 = db.save(&periodic("Tanaka")).unwrap();
    let a2 = db.save(&periodic("Tanaka")).unwrap();
    let b = db.save(&periodic("Kimura")).unwrap();

    assert_eq!(a1.anon_id, a2.anon_id);
    assert_ne!(a1.anon_id, b.anon_id);
}

#[test]
fn test_rename_preserves_everything_but_name() {
    let dir = TempDir::new().unwrap();
    let db = open_store(&dir);

    let before = vec![db.save(&periodic("A")).unwrap(), db.save(&periodic("A")).unwrap()];
    let untouched = db.save(&periodic("C")).unwrap();

    assert_eq!(db.rename_all("A", "B").unwrap(), 2);
    assert!(db.list_by_name("A").unwrap().is_empty());

    let after = db.list_by_name("B").unwrap();
    let expected: Vec<_> = before
        .into_iter()
        .map(|mut r| {
            r.name = "B".into();
            r
        })
        .collect();
    assert_eq!(after, expected);
    assert_eq!(db.list_by_name("C").unwrap(), vec![untouched]);
}

#[test]
fn test_delete_is_scoped_and_repeatable() {
    let dir = TempDir::new().unwrap();
    let db = open_store(&dir);

    db.save(&periodic("A")).unwrap();
    db.save(&periodic("A")).unwrap();
    let other = db.save(&periodic("B")).unwrap();

    assert_eq!(db.delete_all("A").unwrap(), 2);
    assert_eq!(db.delete_all("A").unwrap(), 0);
    assert_eq!(db.list_all().unwrap(), vec![other]);
    assert!(db.latest_by_name("A").unwrap().is_none());
}

#[test]
fn test_failed_save_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let db = open_store(&dir);

    let err = db.save(&periodic("")).unwrap_err();
    assert!(matches!(err, DbError::Validation(_)));
    assert!(db.list_all().unwrap().is_empty());
}

#[test]
fn test_migrate_twice_keeps_data() {
    let dir = TempDir::new().unwrap();
    let db = open_store(&dir);
    let saved = db.save(&periodic("Tanaka")).unwrap();

    db.migrate().unwrap();
    assert_eq!(db.list_all().unwrap(), vec![saved]);
}

#[test]
fn test_legacy_database_is_upgraded() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("legacy.db");

    {
        let conn = rusqlite::Connection::open(&path).unwrap();
        conn.execute_batch(
            "CREATE TABLE shunt_records (id INTEGER PRIMARY KEY, anon_id TEXT, name TEXT, \
             date TEXT, FV REAL, RI REAL, PI REAL, TAV REAL, TAMV REAL, PSV REAL, EDV REAL, \
             score INTEGER, comment TEXT, tag TEXT); \
             INSERT INTO shunt_records \
             (anon_id, name, date, FV, RI, PI, TAV, TAMV, PSV, EDV, score, comment, tag) \
             VALUES ('1a2b3c4d', 'Tanaka', '2023-11-02 14:05:00', 400, 0.6, 1.2, 60, 100, 120, 50, 0, '', '術前評価');",
        )
        .unwrap();
    }

    let db = Database::open(&path).unwrap();
    db.migrate().unwrap();

    let records = db.list_all().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].tag, Tag::Preop);

    // New saves keep the legacy pseudonym
    let next = db.save(&periodic("Tanaka")).unwrap();
    assert_eq!(next.anon_id, "1a2b3c4d");
}

#[test]
fn test_unwritable_location_is_storage_unavailable() {
    let dir = TempDir::new().unwrap();
    let err = Database::open(dir.path().join("no").join("such").join("dir.db"))
        .err()
        .unwrap();
    assert!(err.is_storage_unavailable());
}

#[test]
fn test_concurrent_sessions_serialize_saves() {
    use std::sync::{Arc, Barrier};
    use std::thread;

    const SESSIONS: usize = 4;
    const SAVES_PER_SESSION: usize = 50;

    let dir = TempDir::new().unwrap();
    let path = dir.path().join("shunt_data.db");
    open_store(&dir).close().unwrap();

    let barrier = Arc::new(Barrier::new(SESSIONS));
    let handles: Vec<_> = (0..SESSIONS)
        .map(|session| {
            let path = path.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let db = Database::open(&path).unwrap();
                barrier.wait();
                for i in 0..SAVES_PER_SESSION {
                    db.save(&periodic(&format!("S{}-{}", session, i))).unwrap();
                    db.save(&periodic("Shared")).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let db = open_store(&dir);
    assert_eq!(db.list_all().unwrap().len(), SESSIONS * SAVES_PER_SESSION * 2);

    // one pseudonym per name even when sessions race on the first save
    let shared = db.list_by_name("Shared").unwrap();
    assert_eq!(shared.len(), SESSIONS * SAVES_PER_SESSION);
    assert!(shared.iter().all(|r| r.anon_id == shared[0].anon_id));

    let patients = db.list_patients().unwrap();
    assert_eq!(patients.len(), SESSIONS * SAVES_PER_SESSION + 1);
}

#[test]
fn test_concurrent_migrations() {
    use std::thread;

    let dir = TempDir::new().unwrap();
    let path = dir.path().join("shunt_data.db");

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let path = path.clone();
            thread::spawn(move || Database::open(&path).unwrap().migrate().unwrap())
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let db = Database::open(&path).unwrap();
    assert_eq!(db.schema_version().unwrap(), shunt_eval_core::db::SCHEMA_VERSION);
}
