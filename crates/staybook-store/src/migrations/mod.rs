//! Schema migrations, tracked with `PRAGMA user_version`.
//!
//! Each step runs in its own transaction together with the version bump, so
//! a failed step leaves the schema at the previous version.

pub mod v001_initial;
pub mod v002_overlap_guard;

use rusqlite::Connection;

use crate::error::{Result, StoreError};

type Step = fn(&Connection) -> rusqlite::Result<()>;

/// Ordered steps. Step `i` brings the schema to version `i + 1`.
const STEPS: &[(&str, Step)] = &[
    ("v001_initial", v001_initial::up),
    ("v002_overlap_guard", v002_overlap_guard::up),
];

/// Schema version after all steps have run.
pub const CURRENT_VERSION: u32 = STEPS.len() as u32;

pub fn run_migrations(conn: &mut Connection) -> Result<()> {
    let current: u32 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;

    tracing::info!(
        current_version = current,
        target_version = CURRENT_VERSION,
        "checking database migrations"
    );

    if current > CURRENT_VERSION {
        return Err(StoreError::Migration(format!(
            "database schema v{current} is newer than this build (v{CURRENT_VERSION})"
        )));
    }

    for (version, (name, up)) in (1..).zip(STEPS.iter()).skip(current as usize) {
        tracing::info!(migration = name, version, "applying migration");
        let tx = conn.transaction()?;
        up(&tx).map_err(|e| StoreError::Migration(format!("{name}: {e}")))?;
        tx.pragma_update(None, "user_version", version)?;
        tx.commit()?;
    }

    Ok(())
}
