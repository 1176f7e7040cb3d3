//! Entry operations: get, put, delete, cross-partition match.
//!
//! Writes are last-write-wins per `(partition, key)`; there is no expiry.

use super::connection::PartitionStore;
use super::hash::RequestKey;
use super::partitions::Partition;
use crate::Error;
use crate::record::ResponseRecord;
use bytes::Bytes;
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

fn decode_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<(u16, String, Vec<u8>, String)> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
}

fn into_record((status, headers_json, body, url): (u16, String, Vec<u8>, String)) -> Result<ResponseRecord, Error> {
    let headers: Vec<(String, String)> = serde_json::from_str(&headers_json)?;
    Ok(ResponseRecord { status, headers, body: Bytes::from(body), url })
}

impl PartitionStore {
    /// Look up the response stored for `key` in `partition`.
    pub async fn get(&self, partition: &Partition, key: &RequestKey) -> Result<Option<ResponseRecord>, Error> {
        let name = partition.name().to_string();
        let hash = key.hash.clone();
        let row = self
            .conn
            .call(move |conn| -> Result<Option<(u16, String, Vec<u8>, String)>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT status, headers_json, body, url FROM entries WHERE partition = ?1 AND key = ?2",
                )?;
                match stmt.query_row(params![name, hash], decode_row) {
                    Ok(row) => Ok(Some(row)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)?;

        row.map(into_record).transpose()
    }

    /// Store `response` under `key`, replacing any previous entry.
    ///
    /// Recreates the partition row if it was deleted after being opened.
    pub async fn put(&self, partition: &Partition, key: &RequestKey, response: &ResponseRecord) -> Result<(), Error> {
        self.put_all(partition, vec![(key.clone(), response.clone())]).await
    }

    /// Store several entries in one transaction: all land or none do.
    pub async fn put_all(
        &self, partition: &Partition, entries: Vec<(RequestKey, ResponseRecord)>,
    ) -> Result<(), Error> {
        let name = partition.name().to_string();
        let rows = entries
            .into_iter()
            .map(|(key, response)| {
                let headers_json = serde_json::to_string(&response.headers)?;
                Ok((key, response, headers_json))
            })
            .collect::<Result<Vec<_>, Error>>()?;

        self.conn
            .call(move |conn| -> Result<(), Error> {
                let now = chrono::Utc::now().to_rfc3339();
                let tx = conn.transaction()?;
                tx.execute(
                    "INSERT OR IGNORE INTO partitions (name, created_at) VALUES (?1, ?2)",
                    params![name, now],
                )?;
                for (key, response, headers_json) in &rows {
                    tx.execute(
                        "INSERT INTO entries (partition, key, method, url, status, headers_json, body, stored_at)
                         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                         ON CONFLICT(partition, key) DO UPDATE SET
                            method = excluded.method,
                            url = excluded.url,
                            status = excluded.status,
                            headers_json = excluded.headers_json,
                            body = excluded.body,
                            stored_at = excluded.stored_at",
                        params![
                            name,
                            key.hash,
                            key.method,
                            key.url,
                            response.status,
                            headers_json,
                            response.body.as_ref(),
                            now,
                        ],
                    )?;
                }
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Remove one entry. Returns whether it existed.
    pub async fn delete(&self, partition: &Partition, key: &RequestKey) -> Result<bool, Error> {
        let name = partition.name().to_string();
        let hash = key.hash.clone();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let removed =
                    conn.execute("DELETE FROM entries WHERE partition = ?1 AND key = ?2", params![name, hash])?;
                Ok(removed > 0)
            })
            .await
            .map_err(Error::from)
    }

    /// Look `key` up in every partition, oldest partition first.
    pub async fn match_any(&self, key: &RequestKey) -> Result<Option<ResponseRecord>, Error> {
        let hash = key.hash.clone();
        let row = self
            .conn
            .call(move |conn| -> Result<Option<(u16, String, Vec<u8>, String)>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT e.status, e.headers_json, e.body, e.url
                     FROM entries e JOIN partitions p ON p.name = e.partition
                     WHERE e.key = ?1
                     ORDER BY p.rowid
                     LIMIT 1",
                )?;
                match stmt.query_row(params![hash], decode_row) {
                    Ok(row) => Ok(Some(row)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)?;

        row.map(into_record).transpose()
    }

    /// Keys stored in a partition, most recently written first.
    pub async fn keys(&self, partition: &Partition) -> Result<Vec<RequestKey>, Error> {
        let name = partition.name().to_string();
        self.conn
            .call(move |conn| -> Result<Vec<RequestKey>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT key, method, url FROM entries WHERE partition = ?1 ORDER BY stored_at DESC, rowid DESC",
                )?;
                let keys = stmt
                    .query_map(params![name], |row| {
                        Ok(RequestKey { hash: row.get(0)?, method: row.get(1)?, url: row.get(2)? })
                    })?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(keys)
            })
            .await
            .map_err(Error::from)
    }
}
