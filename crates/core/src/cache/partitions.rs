//! Partition lifecycle: open, enumerate, delete.
//!
//! A partition is identified by its name alone; opening the same name twice
//! yields handles onto the same rows.

use super::connection::PartitionStore;
use super::hash::RequestKey;
use crate::Error;
use crate::record::RequestRecord;
use serde::Serialize;
use tokio_rusqlite::params;

/// How a partition derives keys from requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyScheme {
    /// Method + URL (fragment removed).
    #[default]
    Exact,
    /// Method + URL without query or fragment.
    IgnoreQuery,
}

/// Handle to one named partition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition {
    name: String,
    scheme: KeyScheme,
}

impl Partition {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn scheme(&self) -> KeyScheme {
        self.scheme
    }

    pub fn with_scheme(mut self, scheme: KeyScheme) -> Self {
        self.scheme = scheme;
        self
    }

    /// Key for a request under this partition's scheme.
    pub fn key_for(&self, request: &RequestRecord) -> RequestKey {
        match self.scheme {
            KeyScheme::Exact => RequestKey::exact(&request.method, &request.url),
            KeyScheme::IgnoreQuery => RequestKey::ignoring_query(&request.method, &request.url),
        }
    }
}

/// Size summary for one partition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PartitionStats {
    pub name: String,
    pub entries: u64,
    pub bytes: u64,
    pub created_at: String,
}

impl PartitionStore {
    /// Open a partition, creating it if absent. Idempotent.
    pub async fn open_partition(&self, name: &str) -> Result<Partition, Error> {
        let owned = name.to_string();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT OR IGNORE INTO partitions (name, created_at) VALUES (?1, ?2)",
                    params![owned, chrono::Utc::now().to_rfc3339()],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)?;

        Ok(Partition { name: name.to_string(), scheme: KeyScheme::Exact })
    }

    /// Whether a partition with this name exists.
    pub async fn has_partition(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let exists: bool = conn.query_row(
                    "SELECT EXISTS(SELECT 1 FROM partitions WHERE name = ?1)",
                    params![name],
                    |row| row.get(0),
                )?;
                Ok(exists)
            })
            .await
            .map_err(Error::from)
    }

    /// Names of every persisted partition, in creation order.
    pub async fn list_partition_names(&self) -> Result<Vec<String>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT name FROM partitions ORDER BY rowid")?;
                let names = stmt
                    .query_map([], |row| row.get(0))?
                    .collect::<Result<Vec<String>, _>>()?;
                Ok(names)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete a partition and every entry in it.
    ///
    /// Returns whether the partition existed.
    pub async fn delete_partition(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let tx = conn.transaction()?;
                tx.execute("DELETE FROM entries WHERE partition = ?1", params![name])?;
                let removed = tx.execute("DELETE FROM partitions WHERE name = ?1", params![name])?;
                tx.commit()?;
                Ok(removed > 0)
            })
            .await
            .map_err(Error::from)
    }

    /// Entry counts and payload sizes for every partition.
    pub async fn partition_stats(&self) -> Result<Vec<PartitionStats>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<PartitionStats>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT p.name, COUNT(e.key), COALESCE(SUM(LENGTH(e.body)), 0), p.created_at
                     FROM partitions p
                     LEFT JOIN entries e ON e.partition = p.name
                     GROUP BY p.name
                     ORDER BY p.rowid",
                )?;
                let stats = stmt
                    .query_map([], |row| {
                        Ok(PartitionStats {
                            name: row.get(0)?,
                            entries: row.get::<_, i64>(1)? as u64,
                            bytes: row.get::<_, i64>(2)? as u64,
                            created_at: row.get(3)?,
                        })
                    })?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(stats)
            })
            .await
            .map_err(Error::from)
    }
}
