//! The offline cache proxy.
//!
//! [`Proxy`] is one generation of the proxy as an explicit state machine:
//! `on_install` seeds the eager partitions, `on_activate` runs generation
//! cleanup, `on_intercept` routes each request through the classifier and a
//! strategy, and `on_control_message` lets the foreground force activation.

pub mod classify;
pub mod fallback;
pub mod generation;
pub mod lifecycle;
pub mod preload;
pub mod strategy;

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use futures::future::try_join_all;
use serde::Serialize;
use tokio::sync::{broadcast, watch};
use url::Url;

pub use classify::{Route, Strategy, classify};
pub use generation::{AllowList, CleanupReport, CleanupState, GenerationManager};
pub use lifecycle::{ControlMessage, ProxyEvent, ProxyState};
pub use preload::PreloadReport;
pub use strategy::{CachedFallback, Executor};

use crate::Error;
use crate::cache::{KeyScheme, Partition, PartitionStats, PartitionStore};
use crate::config::{PartitionRole, ProxyConfig};
use crate::record::{RequestRecord, ResponseRecord};
use crate::upstream::Upstream;

const EVENT_CAPACITY: usize = 16;

/// Outcome of a successful install.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstallReport {
    /// Entries written across the eager partitions.
    pub seeded: usize,
    /// Partitions of a previous generation still present.
    pub waiting_on: Vec<String>,
}

impl InstallReport {
    /// Whether activation should wait for `SKIP_WAITING`.
    pub fn must_wait(&self) -> bool {
        !self.waiting_on.is_empty()
    }
}

/// Snapshot of the proxy for status endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct ProxyStatus {
    pub generation: String,
    pub state: ProxyState,
    pub update_waiting: bool,
    pub skip_waiting_requested: bool,
    pub partitions: Vec<PartitionStats>,
}

pub struct Proxy {
    config: Arc<ProxyConfig>,
    origin: Url,
    executor: Executor,
    state: watch::Sender<ProxyState>,
    skip_waiting: watch::Sender<bool>,
    events: broadcast::Sender<ProxyEvent>,
}

impl Proxy {
    /// Create a proxy generation. `origin` is the base every seed and
    /// document path is resolved against.
    pub fn new(config: ProxyConfig, origin: Url, store: PartitionStore, upstream: Arc<dyn Upstream>) -> Self {
        let (state, _) = watch::channel(ProxyState::Installing);
        let (skip_waiting, _) = watch::channel(false);
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            config: Arc::new(config),
            origin,
            executor: Executor::new(store, upstream),
            state,
            skip_waiting,
            events,
        }
    }

    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }

    pub fn origin(&self) -> &Url {
        &self.origin
    }

    pub fn executor(&self) -> &Executor {
        &self.executor
    }

    pub fn state(&self) -> ProxyState {
        *self.state.borrow()
    }

    pub fn watch_state(&self) -> watch::Receiver<ProxyState> {
        self.state.subscribe()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ProxyEvent> {
        self.events.subscribe()
    }

    /// Seed the shell and offline partitions.
    ///
    /// Every seed is fetched before anything is written; one failure leaves
    /// the store untouched and the proxy `Redundant`.
    pub async fn on_install(&self) -> Result<InstallReport, Error> {
        let current = self.state();
        if !matches!(current, ProxyState::Installing | ProxyState::Redundant) {
            return Err(Error::Lifecycle(format!("cannot install from {current:?}")));
        }
        self.transition(ProxyState::Installing);

        let seeded = match self.seed().await {
            Ok(seeded) => seeded,
            Err(e) => {
                self.transition(ProxyState::Redundant);
                self.emit(ProxyEvent::InstallFailed {
                    generation: self.config.generation.clone(),
                    reason: e.to_string(),
                });
                return Err(e);
            }
        };
        self.transition(ProxyState::Installed);

        let waiting_on = GenerationManager::new(self.config.allow_list())
            .stale_partitions(self.executor.store())
            .await?;
        if !waiting_on.is_empty() {
            self.emit(ProxyEvent::UpdateAvailable {
                generation: self.config.generation.clone(),
                previous: waiting_on.clone(),
            });
        }

        Ok(InstallReport { seeded, waiting_on })
    }

    /// Handle a message from the foreground. No reply is sent.
    pub fn on_control_message(&self, message: ControlMessage) {
        match message {
            ControlMessage::SkipWaiting => {
                tracing::info!(generation = %self.config.generation, "skip waiting requested");
                self.skip_waiting.send_replace(true);
            }
            ControlMessage::Unknown => tracing::debug!("ignoring unknown control message"),
        }
    }

    /// Resolves once `SKIP_WAITING` has been received, including before this call.
    pub async fn wait_for_skip_waiting(&self) {
        let mut rx = self.skip_waiting.subscribe();
        let _ = rx.wait_for(|skip| *skip).await;
    }

    /// Run generation cleanup and start controlling requests.
    ///
    /// Requests intercepted while cleanup runs wait for it. A failed cleanup
    /// is logged and retried by the next activation; it does not block this one.
    pub async fn on_activate(&self) -> Result<CleanupReport, Error> {
        let mut from = ProxyState::Installed;
        let started = self.state.send_if_modified(|state| {
            if *state == ProxyState::Installed {
                *state = ProxyState::Activating;
                true
            } else {
                from = *state;
                false
            }
        });
        if !started {
            return Err(Error::Lifecycle(format!("cannot activate from {from:?}")));
        }
        tracing::info!(generation = %self.config.generation, "activating");

        let mut manager = GenerationManager::new(self.config.allow_list());
        let report = match manager.activate(self.executor.store()).await {
            Ok(report) => report,
            Err(e) => {
                tracing::warn!(error = %e, "generation cleanup failed; retrying on next activation");
                CleanupReport::default()
            }
        };

        if let Err(e) = self.executor.store().record_activation(&self.config.generation).await {
            tracing::warn!(error = %e, "failed to record activation; next start will reseed");
        }

        self.transition(ProxyState::Activated);
        self.emit(ProxyEvent::Activated {
            generation: self.config.generation.clone(),
            deleted: report.deleted.clone(),
        });
        Ok(report)
    }

    /// Skip seeding when this store already completed activation of this
    /// generation. Returns whether the proxy moved to `Installed`.
    ///
    /// Entries from the earlier run stay in place, so a restart without the
    /// network still serves them.
    pub async fn restore(&self) -> Result<bool, Error> {
        let recorded = self.executor.store().activated_generation().await?;
        if recorded.as_deref() != Some(self.config.generation.as_str()) {
            return Ok(false);
        }

        let restored = self.state.send_if_modified(|state| {
            if *state == ProxyState::Installing {
                *state = ProxyState::Installed;
                true
            } else {
                false
            }
        });
        if restored {
            tracing::info!(
                generation = %self.config.generation,
                "generation already active in store; skipping install"
            );
        }
        Ok(restored)
    }

    /// Install, wait for `SKIP_WAITING` if a previous generation is present,
    /// then activate. A generation the store already activated goes straight
    /// to activation.
    pub async fn run_lifecycle(&self) -> Result<CleanupReport, Error> {
        if self.restore().await? {
            return self.on_activate().await;
        }

        let install = self.on_install().await?;
        if install.must_wait() {
            tracing::info!(previous = ?install.waiting_on, "previous generation present; waiting for SKIP_WAITING");
            self.wait_for_skip_waiting().await;
        }
        self.on_activate().await
    }

    /// Satisfy one intercepted request.
    ///
    /// Before activation the request goes straight to the network.
    pub async fn on_intercept(&self, request: RequestRecord) -> Result<ResponseRecord, Error> {
        if !self.settled_state().await.controls_requests() {
            tracing::debug!(url = %request.url, "not active; forwarding");
            return self.executor.bypass(&request).await;
        }

        let (rule, route) = classify::classify_with_rule(&request, &self.config);
        tracing::debug!(rule, method = %request.method, url = %request.url, "classified request");

        let (role, strategy, offline_fallback) = match route {
            Route::Bypass => return self.executor.bypass(&request).await,
            Route::Lookup => return self.executor.cache_then_network(&request).await,
            Route::Cached { role, strategy, offline_fallback } => (role, strategy, offline_fallback),
        };

        let partition = match self.partition(role).await {
            Ok(partition) => partition,
            Err(e) => {
                tracing::warn!(?role, error = %e, "partition unavailable; forwarding");
                return self.executor.bypass(&request).await;
            }
        };

        match strategy {
            Strategy::CacheFirst => self.executor.cache_first(&request, &partition).await,
            Strategy::NetworkFirst if offline_fallback => self.navigate(&request, &partition).await,
            Strategy::NetworkFirst => self.executor.network_first(&request, &partition).await,
            Strategy::StaleWhileRevalidate => self.executor.stale_while_revalidate(&request, &partition).await,
            Strategy::CacheThenNetwork => self.executor.cache_then_network(&request).await,
        }
    }

    pub async fn status(&self) -> Result<ProxyStatus, Error> {
        let partitions = self.executor.store().partition_stats().await?;
        let state = self.state();
        let skip_waiting_requested = *self.skip_waiting.borrow();
        Ok(ProxyStatus {
            generation: self.config.generation.clone(),
            state,
            update_waiting: state == ProxyState::Installed && !skip_waiting_requested,
            skip_waiting_requested,
            partitions,
        })
    }

    /// Network-first for a document, then the offline document, then the root document.
    async fn navigate(&self, request: &RequestRecord, shell: &Partition) -> Result<ResponseRecord, Error> {
        let offline = self.partition(PartitionRole::Offline).await?;
        let offline_document = RequestRecord::get(self.resolve(&self.config.offline_document)?);
        let root_document = RequestRecord::get(self.resolve(&self.config.root_document)?);

        let fallbacks = [
            CachedFallback { label: "offline-document", key: offline.key_for(&offline_document), partition: offline },
            CachedFallback { label: "root-document", key: shell.key_for(&root_document), partition: shell.clone() },
        ];

        self.executor
            .network_first_then(request, shell, &fallbacks)
            .await
            .map(|resolved| resolved.response)
    }

    async fn seed(&self) -> Result<usize, Error> {
        let plan = [
            (PartitionRole::Shell, &self.config.seeds.shell),
            (PartitionRole::Offline, &self.config.seeds.offline),
        ];

        let mut urls = BTreeSet::new();
        for (_, paths) in &plan {
            for path in paths.iter() {
                urls.insert(self.resolve(path)?);
            }
        }

        let responses = try_join_all(urls.iter().map(|url| async move {
            let response = self
                .executor
                .bypass(&RequestRecord::get(url.clone()))
                .await
                .map_err(|e| Error::InstallFailed(format!("{url}: {e}")))?;
            if !response.is_cacheable() {
                return Err(Error::InstallFailed(format!("{url}: status {}", response.status)));
            }
            Ok(response)
        }))
        .await?;
        let fetched: HashMap<Url, ResponseRecord> = urls.into_iter().zip(responses).collect();

        let mut seeded = 0;
        for (role, paths) in plan {
            let partition = self.partition(role).await?;
            let mut entries = Vec::with_capacity(paths.len());
            for path in paths {
                let url = self.resolve(path)?;
                let response = fetched
                    .get(&url)
                    .cloned()
                    .ok_or_else(|| Error::InstallFailed(format!("{url}: not fetched")))?;
                entries.push((partition.key_for(&RequestRecord::get(url)), response));
            }
            seeded += entries.len();
            self.executor.store().put_all(&partition, entries).await?;
        }

        tracing::info!(generation = %self.config.generation, seeded, "seeded install partitions");
        Ok(seeded)
    }

    async fn partition(&self, role: PartitionRole) -> Result<Partition, Error> {
        let partition = self
            .executor
            .store()
            .open_partition(&self.config.partition_name(role))
            .await?;
        Ok(if role.ignores_query() { partition.with_scheme(KeyScheme::IgnoreQuery) } else { partition })
    }

    fn resolve(&self, path: &str) -> Result<Url, Error> {
        self.origin
            .join(path)
            .map_err(|e| Error::InvalidUrl(format!("{path}: {e}")))
    }

    async fn settled_state(&self) -> ProxyState {
        let mut rx = self.state.subscribe();
        match rx.wait_for(|state| *state != ProxyState::Activating).await {
            Ok(state) => *state,
            Err(_) => self.state(),
        }
    }

    fn transition(&self, next: ProxyState) {
        let previous = self.state.send_replace(next);
        if previous != next {
            tracing::info!(generation = %self.config.generation, from = ?previous, to = ?next, "proxy state changed");
        }
    }

    fn emit(&self, event: ProxyEvent) {
        tracing::info!(?event, "proxy event");
        let _ = self.events.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::record::Destination;
    use crate::upstream::fake::ScriptedUpstream;
    use http::Method;

    const ORIGIN: &str = "https://herbs.example";

    fn url(path: &str) -> Url {
        Url::parse(&format!("{ORIGIN}{path}")).unwrap()
    }

    fn seeded_upstream() -> Arc<ScriptedUpstream> {
        let upstream = Arc::new(ScriptedUpstream::new());
        for (path, body) in [
            ("/", "<html>root</html>"),
            ("/index.html", "<html>index</html>"),
            ("/manifest.json", "{}"),
            ("/offline.html", "<html>offline</html>"),
            ("/static/css/main.css", "body{}"),
            ("/static/js/main.js", "main()"),
        ] {
            upstream.respond(url(path).as_str(), 200, body);
        }
        upstream
    }

    async fn proxy_on(store: PartitionStore, upstream: Arc<ScriptedUpstream>) -> Proxy {
        Proxy::new(ProxyConfig::default(), Url::parse(ORIGIN).unwrap(), store, upstream)
    }

    async fn active_proxy() -> (Proxy, Arc<ScriptedUpstream>, PartitionStore) {
        let store = PartitionStore::open_in_memory().await.unwrap();
        let upstream = seeded_upstream();
        let proxy = proxy_on(store.clone(), upstream.clone()).await;
        proxy.run_lifecycle().await.unwrap();
        (proxy, upstream, store)
    }

    #[tokio::test]
    async fn test_install_seeds_eager_partitions() {
        let store = PartitionStore::open_in_memory().await.unwrap();
        let upstream = seeded_upstream();
        let proxy = proxy_on(store.clone(), upstream.clone()).await;

        let report = proxy.on_install().await.unwrap();

        assert_eq!(report.seeded, 7);
        assert!(!report.must_wait());
        assert_eq!(proxy.state(), ProxyState::Installed);
        assert_eq!(upstream.calls_for(url("/offline.html").as_str()), 1);
        assert_eq!(store.list_partition_names().await.unwrap(), vec!["ayush-herbal-plants-v2", "offline-v2"]);
    }

    #[tokio::test]
    async fn test_install_is_all_or_nothing() {
        let store = PartitionStore::open_in_memory().await.unwrap();
        let upstream = seeded_upstream();
        upstream.fail(url("/static/js/main.js").as_str());
        let proxy = proxy_on(store.clone(), upstream).await;
        let mut events = proxy.subscribe();

        let err = proxy.on_install().await.unwrap_err();

        assert!(matches!(err, Error::InstallFailed(_)));
        assert_eq!(proxy.state(), ProxyState::Redundant);
        assert!(store.list_partition_names().await.unwrap().is_empty());
        assert!(matches!(events.recv().await.unwrap(), ProxyEvent::InstallFailed { .. }));
        assert!(proxy.on_activate().await.is_err());
    }

    #[tokio::test]
    async fn test_install_rejects_error_status_seed() {
        let store = PartitionStore::open_in_memory().await.unwrap();
        let upstream = seeded_upstream();
        upstream.respond(url("/manifest.json").as_str(), 404, "not found");
        let proxy = proxy_on(store, upstream).await;

        assert!(matches!(proxy.on_install().await, Err(Error::InstallFailed(_))));
    }

    #[tokio::test]
    async fn test_upgrade_waits_for_skip_waiting() {
        let store = PartitionStore::open_in_memory().await.unwrap();
        store.open_partition("images-v1").await.unwrap();
        store.open_partition("static-v1").await.unwrap();
        let upstream = seeded_upstream();
        let proxy = Arc::new(proxy_on(store.clone(), upstream.clone()).await);
        let mut events = proxy.subscribe();

        let report = proxy.on_install().await.unwrap();
        assert_eq!(report.waiting_on, vec!["images-v1", "static-v1"]);
        assert!(matches!(events.recv().await.unwrap(), ProxyEvent::UpdateAvailable { .. }));
        assert!(proxy.status().await.unwrap().update_waiting);

        // Waiting: requests are not routed through partitions.
        let image = url("/img/tulsi.webp");
        upstream.respond(image.as_str(), 200, "webp");
        let request = RequestRecord::get(image.clone()).with_destination(Destination::Image);
        proxy.on_intercept(request.clone()).await.unwrap();
        proxy.on_intercept(request.clone()).await.unwrap();
        assert_eq!(upstream.calls_for(image.as_str()), 2);

        let waiter = {
            let proxy = proxy.clone();
            tokio::spawn(async move { proxy.wait_for_skip_waiting().await })
        };
        proxy.on_control_message(ControlMessage::SkipWaiting);
        waiter.await.unwrap();

        let cleanup = proxy.on_activate().await.unwrap();
        assert_eq!(cleanup.deleted, vec!["images-v1", "static-v1"]);
        assert_eq!(proxy.state(), ProxyState::Activated);
        assert!(matches!(events.recv().await.unwrap(), ProxyEvent::Activated { .. }));
    }

    #[tokio::test]
    async fn test_restart_without_network_serves_stored_entries() {
        let (proxy, upstream, store) = active_proxy().await;
        let image = url("/img/tulsi.webp");
        upstream.respond(image.as_str(), 200, "leaf");
        let request = RequestRecord::get(image).with_destination(Destination::Image);
        proxy.on_intercept(request.clone()).await.unwrap();
        drop(proxy);

        let offline = Arc::new(ScriptedUpstream::new());
        let restarted = proxy_on(store, offline.clone()).await;
        restarted.run_lifecycle().await.unwrap();
        assert_eq!(restarted.state(), ProxyState::Activated);

        let cached = restarted.on_intercept(request).await.unwrap();
        assert_eq!(cached.body.as_ref(), b"leaf");

        let page = restarted
            .on_intercept(RequestRecord::navigate(url("/plants/tulsi")))
            .await
            .unwrap();
        assert_eq!(page.body.as_ref(), b"<html>offline</html>");
        assert_eq!(offline.calls_for(url("/").as_str()), 0);
    }

    #[tokio::test]
    async fn test_restore_ignores_other_generation() {
        let store = PartitionStore::open_in_memory().await.unwrap();
        store.record_activation("v1").await.unwrap();
        let proxy = proxy_on(store, Arc::new(ScriptedUpstream::new())).await;

        assert!(!proxy.restore().await.unwrap());
        assert!(matches!(proxy.run_lifecycle().await, Err(Error::InstallFailed(_))));
        assert_eq!(proxy.state(), ProxyState::Redundant);
    }

    #[tokio::test]
    async fn test_activation_is_recorded() {
        let (_proxy, _upstream, store) = active_proxy().await;
        assert_eq!(store.activated_generation().await.unwrap().as_deref(), Some("v2"));
    }

    #[tokio::test]
    async fn test_requests_during_activation_wait_then_use_partitions() {
        let (proxy, upstream, _store) = active_proxy().await;
        let image = url("/img/neem.webp");
        upstream.respond(image.as_str(), 200, "neem");
        let request = RequestRecord::get(image.clone()).with_destination(Destination::Image);
        proxy.on_intercept(request.clone()).await.unwrap();
        upstream.fail(image.as_str());

        let proxy = Arc::new(proxy);
        proxy.transition(ProxyState::Activating);
        let mut pending = {
            let proxy = proxy.clone();
            tokio::spawn(async move { proxy.on_intercept(request).await })
        };

        assert!(tokio::time::timeout(Duration::from_millis(50), &mut pending).await.is_err());
        assert_eq!(upstream.calls_for(image.as_str()), 1);

        proxy.transition(ProxyState::Activated);
        let response = pending.await.unwrap().unwrap();
        assert_eq!(response.body.as_ref(), b"neem");
        assert_eq!(upstream.calls_for(image.as_str()), 1);
    }

    #[tokio::test]
    async fn test_unknown_control_message_does_not_release_wait() {
        let store = PartitionStore::open_in_memory().await.unwrap();
        let proxy = proxy_on(store, seeded_upstream()).await;
        proxy.on_control_message(ControlMessage::Unknown);
        assert!(!proxy.status().await.unwrap().skip_waiting_requested);
    }

    #[tokio::test]
    async fn test_activate_requires_install() {
        let store = PartitionStore::open_in_memory().await.unwrap();
        let proxy = proxy_on(store, seeded_upstream()).await;
        assert!(matches!(proxy.on_activate().await, Err(Error::Lifecycle(_))));
    }

    #[tokio::test]
    async fn test_image_cache_first_end_to_end() {
        let (proxy, upstream, store) = active_proxy().await;
        let image = url("/img/neem.webp");
        upstream.respond(image.as_str(), 200, "neem");
        let request = RequestRecord::get(image.clone()).with_destination(Destination::Image);

        proxy.on_intercept(request.clone()).await.unwrap();
        let second = proxy.on_intercept(request.clone()).await.unwrap();

        assert_eq!(second.body.as_ref(), b"neem");
        assert_eq!(upstream.calls_for(image.as_str()), 1);
        let images = store.open_partition("images-v2").await.unwrap();
        assert!(store.get(&images, &images.key_for(&request)).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_offline_navigation_gets_offline_document() {
        let (proxy, upstream, _store) = active_proxy().await;
        let page = url("/plants/ashwagandha");
        upstream.fail(page.as_str());

        let response = proxy.on_intercept(RequestRecord::navigate(page)).await.unwrap();
        assert_eq!(response.body.as_ref(), b"<html>offline</html>");
    }

    #[tokio::test]
    async fn test_navigation_is_keyed_by_document_url() {
        let (proxy, upstream, _store) = active_proxy().await;
        let page = url("/plants/brahmi");
        upstream.respond(page.as_str(), 200, "<html>brahmi</html>");
        proxy.on_intercept(RequestRecord::navigate(page.clone())).await.unwrap();

        let with_query = url("/plants/brahmi?ref=search");
        upstream.fail(with_query.as_str());
        let response = proxy.on_intercept(RequestRecord::navigate(with_query)).await.unwrap();
        assert_eq!(response.body.as_ref(), b"<html>brahmi</html>");
    }

    #[tokio::test]
    async fn test_navigation_falls_back_to_root_without_offline_document() {
        let (proxy, upstream, store) = active_proxy().await;
        store.delete_partition("offline-v2").await.unwrap();
        let page = url("/garden");
        upstream.fail(page.as_str());

        let response = proxy.on_intercept(RequestRecord::navigate(page)).await.unwrap();
        assert_eq!(response.body.as_ref(), b"<html>root</html>");
    }

    #[tokio::test]
    async fn test_post_is_never_cached_or_served_from_cache() {
        let (proxy, upstream, store) = active_proxy().await;
        let feedback = url("/api/feedback");
        upstream.respond(feedback.as_str(), 200, "thanks");

        // A cached GET for the same URL must not answer a POST.
        let get = RequestRecord::get(feedback.clone());
        proxy.on_intercept(get).await.unwrap();

        let post = RequestRecord::get(feedback.clone()).with_method(Method::POST).with_body("stars=5");
        upstream.fail(feedback.as_str());
        assert!(proxy.on_intercept(post.clone()).await.is_err());

        upstream.respond(feedback.as_str(), 200, "posted");
        proxy.on_intercept(post.clone()).await.unwrap();
        let key = crate::cache::RequestKey::exact(&Method::POST, &feedback);
        assert!(store.match_any(&key).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_static_assets_stale_while_revalidate() {
        let (proxy, upstream, _store) = active_proxy().await;
        let script = url("/static/js/chunk.js");
        let request = RequestRecord::get(script.clone()).with_destination(Destination::Script);
        upstream.respond(script.as_str(), 200, "v1");
        proxy.on_intercept(request.clone()).await.unwrap();

        upstream.respond(script.as_str(), 200, "v2");
        let stale = proxy.on_intercept(request.clone()).await.unwrap();
        assert_eq!(stale.body.as_ref(), b"v1");

        proxy.executor().settle().await;
        let fresh = proxy.on_intercept(request).await.unwrap();
        assert_eq!(fresh.body.as_ref(), b"v2");
    }

    #[tokio::test]
    async fn test_default_route_serves_seeded_manifest_offline() {
        let (proxy, upstream, _store) = active_proxy().await;
        let manifest = url("/manifest.json");
        upstream.fail(manifest.as_str());
        let before = upstream.total_calls();

        let response = proxy.on_intercept(RequestRecord::get(manifest)).await.unwrap();
        assert_eq!(response.body.as_ref(), b"{}");
        assert_eq!(upstream.total_calls(), before);
    }
}
