//! Schema steps for the note store.
//!
//! The applied step is recorded in `PRAGMA user_version`. Pending steps and
//! their version bumps commit together or not at all.

use crate::db::{DbError, DbResult};
use log::{debug, info};
use rusqlite::Connection;
use std::cmp::Ordering;

/// `(version, sql)` pairs in ascending version order.
const STEPS: &[(u32, &str)] = &[(1, include_str!("0001_notes.sql"))];

/// Schema version this build writes.
pub fn latest_version() -> u32 {
    STEPS.last().map_or(0, |(version, _)| *version)
}

/// Brings `conn` up to [`latest_version`].
///
/// # Errors
/// - `UnsupportedSchemaVersion` when the file was written by a newer build.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    let from: u32 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;
    let to = latest_version();
    match from.cmp(&to) {
        Ordering::Greater => Err(DbError::UnsupportedSchemaVersion {
            db_version: from,
            latest_supported: to,
        }),
        Ordering::Equal => Ok(()),
        Ordering::Less => {
            let tx = conn.transaction()?;
            for (version, sql) in STEPS.iter().filter(|(version, _)| *version > from) {
                tx.execute_batch(sql)?;
                tx.pragma_update(None, "user_version", version)?;
                debug!("event=db_migrate_step module=db version={version}");
            }
            tx.commit()?;
            info!("event=db_migrate module=db status=ok from_version={from} to_version={to}");
            Ok(())
        }
    }
}
