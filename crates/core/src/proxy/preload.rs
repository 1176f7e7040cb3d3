//! Warming the models partition ahead of use.

use std::collections::HashSet;

use serde::Serialize;
use url::Url;

use super::Proxy;
use crate::Error;
use crate::config::PartitionRole;
use crate::record::RequestRecord;

/// Hosts used as placeholders in plant data; never worth fetching.
const PLACEHOLDER_HOSTS: &[&str] = &["example.com"];

/// Counts from one preload pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PreloadReport {
    /// Fetched from the network and stored.
    pub fetched: usize,
    /// Already present; nothing fetched.
    pub cached: usize,
    /// Empty, placeholder, foreign, non-model or duplicate paths.
    pub skipped: usize,
    pub failed: usize,
}

impl Proxy {
    /// Fetch model assets into the models partition so they are available offline.
    ///
    /// Only an activated generation preloads, so a waiting one never fills a
    /// partition ahead of cleanup. Per-path failures are counted, not returned.
    pub async fn preload_models(&self, paths: &[String]) -> Result<PreloadReport, Error> {
        let state = self.state();
        if !state.controls_requests() {
            return Err(Error::Lifecycle(format!("cannot preload models while {state:?}")));
        }

        let models = self.partition(PartitionRole::Models).await?;
        let mut seen = HashSet::new();
        let mut report = PreloadReport::default();

        for raw in paths {
            let Some(url) = self.preload_target(raw) else {
                tracing::debug!(path = raw.as_str(), "skipping preload path");
                report.skipped += 1;
                continue;
            };
            if !seen.insert(url.clone()) {
                report.skipped += 1;
                continue;
            }

            let request = RequestRecord::get(url);
            let key = models.key_for(&request);
            if matches!(self.executor.store().get(&models, &key).await, Ok(Some(_))) {
                report.cached += 1;
                continue;
            }

            match self.executor.cache_first(&request, &models).await {
                Ok(response) if response.is_cacheable() => report.fetched += 1,
                Ok(response) => {
                    tracing::warn!(url = %request.url, status = response.status, "model preload got error status");
                    report.failed += 1;
                }
                Err(e) => {
                    tracing::warn!(url = %request.url, error = %e, "model preload failed");
                    report.failed += 1;
                }
            }
        }

        tracing::info!(
            fetched = report.fetched,
            cached = report.cached,
            skipped = report.skipped,
            failed = report.failed,
            "model preload finished"
        );
        Ok(report)
    }

    fn preload_target(&self, raw: &str) -> Option<Url> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        let url = self.origin.join(raw).ok()?;
        let host = url.host_str()?;
        if PLACEHOLDER_HOSTS.iter().any(|p| host == *p || host.ends_with(&format!(".{p}"))) {
            return None;
        }
        if url.origin() != self.origin.origin() || !self.config.is_model_path(url.path()) {
            return None;
        }
        Some(url)
    }
}
