//! Request classification.
//!
//! An ordered rule table maps each request to a [`Route`]. The first rule
//! whose predicate matches wins; anything unmatched falls through to a plain
//! cache lookup.

use http::Method;
use serde::Serialize;

use crate::config::{PartitionRole, ProxyConfig};
use crate::record::{Destination, RequestRecord};

/// How a request is satisfied from cache versus network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    CacheFirst,
    NetworkFirst,
    StaleWhileRevalidate,
    /// Exact-key lookup across all partitions, then network, no write-back.
    CacheThenNetwork,
}

/// Outcome of classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Forward to the network untouched; never read or written.
    Bypass,
    /// Cache-then-network across every partition, nothing stored.
    Lookup,
    /// Run `strategy` against one partition.
    Cached {
        role: PartitionRole,
        strategy: Strategy,
        /// On total failure, fall back to the offline document, then the root document.
        offline_fallback: bool,
    },
}

impl Route {
    const fn cached(role: PartitionRole, strategy: Strategy) -> Self {
        Route::Cached { role, strategy, offline_fallback: false }
    }

    /// The `(partition, strategy)` pair, when the route targets one partition.
    pub fn pair(&self) -> Option<(PartitionRole, Strategy)> {
        match self {
            Route::Cached { role, strategy, .. } => Some((*role, *strategy)),
            Route::Bypass | Route::Lookup => None,
        }
    }

    /// Strategy applied, if the request is intercepted at all.
    pub fn strategy(&self) -> Option<Strategy> {
        match self {
            Route::Bypass => None,
            Route::Lookup => Some(Strategy::CacheThenNetwork),
            Route::Cached { strategy, .. } => Some(*strategy),
        }
    }
}

struct Rule {
    name: &'static str,
    applies: fn(&RequestRecord, &ProxyConfig) -> bool,
    route: Route,
}

fn not_get(request: &RequestRecord, _: &ProxyConfig) -> bool {
    request.method != Method::GET
}

fn navigation(request: &RequestRecord, _: &ProxyConfig) -> bool {
    request.navigation
}

fn script_or_style(request: &RequestRecord, _: &ProxyConfig) -> bool {
    matches!(request.destination, Destination::Script | Destination::Style)
}

fn image(request: &RequestRecord, _: &ProxyConfig) -> bool {
    request.destination == Destination::Image
}

fn model(request: &RequestRecord, config: &ProxyConfig) -> bool {
    config.is_model_path(request.url.path())
}

fn api(request: &RequestRecord, config: &ProxyConfig) -> bool {
    request.url.path().starts_with(config.api_prefix.as_str())
}

const RULES: &[Rule] = &[
    Rule { name: "non-get", applies: not_get, route: Route::Bypass },
    Rule {
        name: "navigation",
        applies: navigation,
        route: Route::Cached {
            role: PartitionRole::Shell,
            strategy: Strategy::NetworkFirst,
            offline_fallback: true,
        },
    },
    Rule {
        name: "script-style",
        applies: script_or_style,
        route: Route::cached(PartitionRole::StaticAssets, Strategy::StaleWhileRevalidate),
    },
    Rule { name: "image", applies: image, route: Route::cached(PartitionRole::Images, Strategy::CacheFirst) },
    Rule { name: "model", applies: model, route: Route::cached(PartitionRole::Models, Strategy::CacheFirst) },
    Rule { name: "api", applies: api, route: Route::cached(PartitionRole::StaticAssets, Strategy::NetworkFirst) },
];

/// Classify a request, returning the matching rule's name with its route.
pub fn classify_with_rule(request: &RequestRecord, config: &ProxyConfig) -> (&'static str, Route) {
    RULES
        .iter()
        .find(|rule| (rule.applies)(request, config))
        .map(|rule| (rule.name, rule.route))
        .unwrap_or(("default", Route::Lookup))
}

/// Classify a request.
pub fn classify(request: &RequestRecord, config: &ProxyConfig) -> Route {
    classify_with_rule(request, config).1
}
