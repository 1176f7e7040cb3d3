//! Caching strategies over one partition.
//!
//! Every strategy reads and writes through [`PartitionStore`] and reaches the
//! network through an [`Upstream`]. Network failures are never retried here;
//! each strategy's fallback is the whole of its failure handling. Cache
//! writes are best-effort: a failed write is logged and the network response
//! is still returned. Failed reads count as misses.

use std::sync::{Arc, Mutex, PoisonError};

use tokio::task::JoinSet;

use super::fallback::{FallbackChain, Resolved};
use crate::Error;
use crate::cache::{Partition, PartitionStore, RequestKey};
use crate::record::{RequestRecord, ResponseRecord};
use crate::upstream::Upstream;

/// A cached entry to try once the network and the request's own key have
/// both failed.
#[derive(Debug, Clone)]
pub struct CachedFallback {
    pub label: &'static str,
    pub partition: Partition,
    pub key: RequestKey,
}

/// Runs strategies against a store and an upstream.
#[derive(Clone)]
pub struct Executor {
    store: PartitionStore,
    upstream: Arc<dyn Upstream>,
    revalidations: Arc<Mutex<JoinSet<()>>>,
}

impl Executor {
    pub fn new(store: PartitionStore, upstream: Arc<dyn Upstream>) -> Self {
        Self { store, upstream, revalidations: Arc::new(Mutex::new(JoinSet::new())) }
    }

    pub fn store(&self) -> &PartitionStore {
        &self.store
    }

    /// Serve from the partition when present; otherwise fetch, store, return.
    ///
    /// With nothing cached, a network failure is returned as-is.
    pub async fn cache_first(&self, request: &RequestRecord, partition: &Partition) -> Result<ResponseRecord, Error> {
        let key = partition.key_for(request);
        if let Some(cached) = self.lookup(partition, &key).await {
            tracing::debug!(partition = partition.name(), url = %request.url, "cache-first hit");
            return Ok(cached);
        }

        tracing::debug!(partition = partition.name(), url = %request.url, "cache-first miss");
        let response = self.upstream.fetch(request).await?;
        self.remember(partition, &key, &response).await;
        Ok(response)
    }

    /// Fetch first and store a copy; on network failure serve the cached copy.
    pub async fn network_first(&self, request: &RequestRecord, partition: &Partition) -> Result<ResponseRecord, Error> {
        self.network_first_then(request, partition, &[]).await.map(|resolved| resolved.response)
    }

    /// Network-first, followed by further cached fallbacks in order.
    pub async fn network_first_then(
        &self, request: &RequestRecord, partition: &Partition, fallbacks: &[CachedFallback],
    ) -> Result<Resolved, Error> {
        let key = partition.key_for(request);
        let key = &key;

        let mut chain = FallbackChain::new()
            .then("network", move || async move {
                let response = self.upstream.fetch(request).await?;
                self.remember(partition, key, &response).await;
                Ok(Some(response))
            })
            .then("cache", move || async move { Ok(self.lookup(partition, key).await) });

        for fallback in fallbacks {
            chain = chain.then(fallback.label, move || async move {
                Ok(self.lookup(&fallback.partition, &fallback.key).await)
            });
        }

        let resolved = chain.run().await?;
        if resolved.source != "network" {
            tracing::info!(url = %request.url, source = resolved.source, "network failed, served from cache");
        }
        Ok(resolved)
    }

    /// Serve the cached copy immediately and refresh it in the background.
    ///
    /// With nothing cached, wait for the network instead. Either way exactly
    /// one write is attempted when the fetch succeeds.
    pub async fn stale_while_revalidate(
        &self, request: &RequestRecord, partition: &Partition,
    ) -> Result<ResponseRecord, Error> {
        let key = partition.key_for(request);

        match self.lookup(partition, &key).await {
            Some(cached) => {
                tracing::debug!(partition = partition.name(), url = %request.url, "serving stale, revalidating");
                self.revalidate(request.clone(), partition.clone(), key);
                Ok(cached)
            }
            None => {
                let response = self.upstream.fetch(request).await?;
                self.remember(partition, &key, &response).await;
                Ok(response)
            }
        }
    }

    /// Exact-key lookup across every partition, then the network. Nothing is written.
    pub async fn cache_then_network(&self, request: &RequestRecord) -> Result<ResponseRecord, Error> {
        let key = RequestKey::exact(&request.method, &request.url);
        match self.store.match_any(&key).await {
            Ok(Some(hit)) => {
                tracing::debug!(url = %request.url, "cache-then-network hit");
                return Ok(hit);
            }
            Ok(None) => {}
            Err(e) => tracing::warn!(url = %request.url, error = %e, "cross-partition lookup failed"),
        }
        self.upstream.fetch(request).await
    }

    /// Straight to the network.
    pub async fn bypass(&self, request: &RequestRecord) -> Result<ResponseRecord, Error> {
        self.upstream.fetch(request).await
    }

    /// Wait for every background revalidation started so far.
    pub async fn settle(&self) {
        loop {
            let mut pending = std::mem::take(&mut *self.revalidations.lock().unwrap_or_else(PoisonError::into_inner));
            if pending.is_empty() {
                return;
            }
            while let Some(result) = pending.join_next().await {
                if let Err(e) = result {
                    tracing::warn!(error = %e, "revalidation task did not complete");
                }
            }
        }
    }

    fn revalidate(&self, request: RequestRecord, partition: Partition, key: RequestKey) {
        let this = self.clone();
        let mut tasks = self.revalidations.lock().unwrap_or_else(PoisonError::into_inner);
        while tasks.try_join_next().is_some() {}
        tasks.spawn(async move {
            match this.upstream.fetch(&request).await {
                Ok(fresh) => this.remember(&partition, &key, &fresh).await,
                Err(e) => tracing::debug!(url = %request.url, error = %e, "revalidation fetch failed"),
            }
        });
    }

    async fn lookup(&self, partition: &Partition, key: &RequestKey) -> Option<ResponseRecord> {
        match self.store.get(partition, key).await {
            Ok(hit) => hit,
            Err(e) => {
                tracing::warn!(partition = partition.name(), url = %key.url, error = %e, "cache read failed");
                None
            }
        }
    }

    async fn remember(&self, partition: &Partition, key: &RequestKey, response: &ResponseRecord) {
        if !response.is_cacheable() {
            tracing::debug!(partition = partition.name(), url = %key.url, status = response.status, "not caching");
            return;
        }
        if let Err(e) = self.store.put(partition, key, response).await {
            tracing::warn!(partition = partition.name(), url = %key.url, error = %e, "cache write failed");
        }
    }
}
