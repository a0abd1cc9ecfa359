//! Schema migrations for the todo store.
//!
//! Each step runs in its own transaction and bumps `PRAGMA user_version`
//! inside it, so an interrupted upgrade resumes from the last finished step.

use crate::db::{DbError, DbResult};
use log::info;
use rusqlite::Connection;

/// One forward-only schema step.
#[derive(Debug, Clone, Copy)]
struct SchemaStep {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

const SCHEMA_STEPS: &[SchemaStep] = &[
    SchemaStep {
        version: 1,
        name: "init",
        sql: include_str!("0001_init.sql"),
    },
    SchemaStep {
        version: 2,
        name: "ordering_indexes",
        sql: include_str!("0002_ordering_indexes.sql"),
    },
];

/// Highest schema version this build can produce.
pub fn latest_version() -> u32 {
    SCHEMA_STEPS.iter().map(|step| step.version).max().unwrap_or(0)
}

/// Reads the schema version recorded in `PRAGMA user_version`.
pub fn schema_version(conn: &Connection) -> DbResult<u32> {
    Ok(conn.pragma_query_value(None, "user_version", |row| row.get::<_, u32>(0))?)
}

/// Brings `conn` up to `latest_version()`.
///
/// # Errors
/// - `DbError::UnsupportedSchemaVersion` when the file was written by a newer
///   build. Nothing is modified in that case.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    let from_version = schema_version(conn)?;
    let latest = latest_version();
    if from_version > latest {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: from_version,
            latest_supported: latest,
        });
    }

    for step in SCHEMA_STEPS.iter().filter(|step| step.version > from_version) {
        let tx = conn.transaction()?;
        tx.execute_batch(step.sql)?;
        tx.pragma_update(None, "user_version", step.version)?;
        tx.commit()?;
        info!(
            "event=db_migrate module=db status=ok step={} version={}",
            step.name, step.version
        );
    }
    Ok(())
}
