//! Which generation last completed activation.
//!
//! At most one row is kept. A restart that finds its own generation recorded
//! can skip seeding and serve what the store already holds.

use super::connection::PartitionStore;
use crate::Error;
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite::OptionalExtension;

impl PartitionStore {
    /// Record `name` as the activated generation, replacing any earlier one.
    pub async fn record_activation(&self, name: &str) -> Result<(), Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                let tx = conn.transaction()?;
                tx.execute("DELETE FROM activated_generation", [])?;
                tx.execute(
                    "INSERT INTO activated_generation (name, activated_at) VALUES (?1, ?2)",
                    params![name, chrono::Utc::now().to_rfc3339()],
                )?;
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    pub async fn activated_generation(&self) -> Result<Option<String>, Error> {
        self.conn
            .call(|conn| -> Result<Option<String>, Error> {
                let name = conn
                    .query_row("SELECT name FROM activated_generation LIMIT 1", [], |row| row.get(0))
                    .optional()?;
                Ok(name)
            })
            .await
            .map_err(Error::from)
    }
}
