//! Lifecycle states, control messages and events.

use serde::{Deserialize, Serialize};

/// Where a proxy generation is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProxyState {
    Installing,
    /// Seeded and waiting for permission to take over.
    Installed,
    /// Generation cleanup in progress; intercepted requests wait for it.
    Activating,
    Activated,
    /// Install failed; this generation will never activate.
    Redundant,
}

impl ProxyState {
    /// Whether intercepted requests are routed through the partitions.
    pub fn controls_requests(self) -> bool {
        matches!(self, ProxyState::Activated)
    }
}

/// Messages the foreground application can post to the proxy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ControlMessage {
    /// Stop waiting and activate immediately.
    SkipWaiting,
    /// Anything else; ignored.
    #[serde(other)]
    Unknown,
}

/// Signals published to whoever hosts the proxy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum ProxyEvent {
    /// A new generation is installed and waiting; the host should offer a
    /// reload and send `SKIP_WAITING` on acceptance.
    UpdateAvailable { generation: String, previous: Vec<String> },
    Activated { generation: String, deleted: Vec<String> },
    InstallFailed { generation: String, reason: String },
}
