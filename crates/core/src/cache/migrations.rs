//! Schema migrations for the partition store.
//!
//! Migrations are numbered SQL files applied in order. Each one runs in its
//! own transaction together with its `_migrations` row, so a store is never
//! left half-migrated.

use super::Error;
use tokio_rusqlite::{Connection, params};

struct Migration {
    version: i64,
    name: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration { version: 1, name: "partitions", sql: include_str!("../../migrations/001_partitions.sql") },
    Migration {
        version: 2,
        name: "entry_key_index",
        sql: include_str!("../../migrations/002_entry_key_index.sql"),
    },
    Migration {
        version: 3,
        name: "activated_generation",
        sql: include_str!("../../migrations/003_activated_generation.sql"),
    },
];

/// Apply every migration newer than the store's recorded version.
///
/// # Errors
///
/// Returns `MigrationFailed` naming the migration whose SQL was rejected.
pub async fn run(conn: &Connection) -> Result<(), Error> {
    conn.call(|conn| -> Result<(), Error> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS _migrations (
                version INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                applied_at TEXT NOT NULL
            )",
        )?;

        let current: i64 =
            conn.query_row("SELECT COALESCE(MAX(version), 0) FROM _migrations", [], |row| row.get(0))?;

        for migration in MIGRATIONS.iter().filter(|m| m.version > current) {
            tracing::debug!(version = migration.version, name = migration.name, "applying migration");
            let tx = conn.transaction()?;
            tx.execute_batch(migration.sql).map_err(|e| {
                Error::MigrationFailed(format!("{:03}_{}: {e}", migration.version, migration.name))
            })?;
            tx.execute(
                "INSERT INTO _migrations (version, name, applied_at) VALUES (?1, ?2, ?3)",
                params![migration.version, migration.name, chrono::Utc::now().to_rfc3339()],
            )?;
            tx.commit()?;
        }

        Ok(())
    })
    .await
    .map_err(Error::from)
}
