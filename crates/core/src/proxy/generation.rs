//! Generation cleanup.
//!
//! Each deployment owns the partitions named in its allow-list. Activating a
//! generation deletes every other persisted partition, so at most one
//! generation's data survives and a new generation never reads rows written
//! under an old one's schema. A cleanup interrupted half-way is simply
//! repeated by the next activation.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::Error;
use crate::cache::PartitionStore;

/// Partition names that must never be deleted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllowList(BTreeSet<String>);

impl AllowList {
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for AllowList {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CleanupState {
    PendingCleanup,
    SteadyState,
}

/// What one cleanup pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CleanupReport {
    pub deleted: Vec<String>,
    pub kept: Vec<String>,
    /// Deletions that failed; retried on the next activation.
    pub failed: Vec<String>,
}

impl CleanupReport {
    pub fn is_noop(&self) -> bool {
        self.deleted.is_empty() && self.failed.is_empty()
    }
}

pub struct GenerationManager {
    allow_list: AllowList,
    state: CleanupState,
}

impl GenerationManager {
    pub fn new(allow_list: AllowList) -> Self {
        Self { allow_list, state: CleanupState::PendingCleanup }
    }

    pub fn state(&self) -> CleanupState {
        self.state
    }

    pub fn allow_list(&self) -> &AllowList {
        &self.allow_list
    }

    /// Persisted partitions outside the allow-list.
    pub async fn stale_partitions(&self, store: &PartitionStore) -> Result<Vec<String>, Error> {
        let names = store.list_partition_names().await?;
        Ok(names.into_iter().filter(|name| !self.allow_list.contains(name)).collect())
    }

    /// Delete every partition not in the allow-list, then enter steady state.
    ///
    /// Always rescans, so running it again after a clean pass deletes nothing.
    /// A failed deletion is recorded in the report and does not stop the pass.
    pub async fn activate(&mut self, store: &PartitionStore) -> Result<CleanupReport, Error> {
        let mut report = CleanupReport::default();

        for name in store.list_partition_names().await? {
            if self.allow_list.contains(&name) {
                report.kept.push(name);
                continue;
            }
            match store.delete_partition(&name).await {
                Ok(_) => {
                    tracing::info!(partition = %name, "deleted stale partition");
                    report.deleted.push(name);
                }
                Err(e) => {
                    tracing::warn!(partition = %name, error = %e, "failed to delete stale partition");
                    report.failed.push(name);
                }
            }
        }

        self.state = CleanupState::SteadyState;
        Ok(report)
    }
}
