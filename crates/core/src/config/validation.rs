//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use std::collections::HashSet;

use crate::config::{AppConfig, PartitionRole, ProxyConfig};
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },

    #[error("missing required configuration: {field} ({hint})")]
    Missing { field: String, hint: String },
}

fn invalid(field: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid { field: field.into(), reason: reason.into() }
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `max_bytes` is 0 or exceeds 512MB
    /// - `timeout_ms` is less than 100ms or exceeds 5 minutes
    /// - `user_agent` is empty
    /// - `origin` is not an absolute http(s) URL
    /// - the proxy section is inconsistent (see [`ProxyConfig::validate`])
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_bytes == 0 {
            return Err(invalid("max_bytes", "must be greater than 0"));
        }
        if self.max_bytes > 512 * 1024 * 1024 {
            return Err(invalid("max_bytes", "must not exceed 512MB"));
        }

        if self.timeout_ms < 100 {
            return Err(invalid("timeout_ms", "must be at least 100ms"));
        }
        if self.timeout_ms > 300_000 {
            return Err(invalid("timeout_ms", "must not exceed 5 minutes (300000ms)"));
        }

        if self.user_agent.is_empty() {
            return Err(invalid("user_agent", "must not be empty"));
        }

        if self.listen_addr.is_empty() {
            return Err(ConfigError::Missing {
                field: "listen_addr".into(),
                hint: "Set HERBCACHE_LISTEN_ADDR environment variable".into(),
            });
        }

        self.origin_url()?;
        self.proxy.validate()
    }
}

impl ProxyConfig {
    /// Validate the partition layout and routing knobs.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `generation` is empty or contains characters other than `[A-Za-z0-9._]`
    /// - two roles share a logical partition name, or one is empty
    /// - a document path, seed, or the API prefix does not start with `/`
    /// - a model extension does not start with `.`
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.generation.is_empty() {
            return Err(invalid("proxy.generation", "must not be empty"));
        }
        if !self
            .generation
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '_')
        {
            return Err(invalid("proxy.generation", "may only contain letters, digits, '.' and '_'"));
        }

        let mut seen = HashSet::new();
        for role in PartitionRole::ALL {
            let logical = self.partitions.logical(role);
            if logical.is_empty() {
                return Err(invalid("proxy.partitions", "partition names must not be empty"));
            }
            if !seen.insert(logical) {
                return Err(ConfigError::Invalid {
                    field: "proxy.partitions".into(),
                    reason: format!("duplicate partition name: {logical}"),
                });
            }
        }

        for (field, path) in [
            ("proxy.offline_document", &self.offline_document),
            ("proxy.root_document", &self.root_document),
            ("proxy.api_prefix", &self.api_prefix),
        ] {
            if !path.starts_with('/') {
                return Err(invalid(field, "must start with '/'"));
            }
        }

        if let Some(seed) = self
            .seeds
            .shell
            .iter()
            .chain(self.seeds.offline.iter())
            .find(|seed| !seed.starts_with('/'))
        {
            return Err(ConfigError::Invalid { field: "proxy.seeds".into(), reason: format!("not a path: {seed}") });
        }

        if self.model_extensions.is_empty() {
            return Err(invalid("proxy.model_extensions", "must not be empty"));
        }
        if self.model_extensions.iter().any(|ext| !ext.starts_with('.') || ext.len() < 2) {
            return Err(invalid("proxy.model_extensions", "extensions must look like '.glb'"));
        }

        if !self.seeds.offline.contains(&self.offline_document) {
            tracing::warn!(
                offline_document = %self.offline_document,
                "offline document is not seeded into the offline partition; \
                 failed navigations will fall through to the root document"
            );
        }

        Ok(())
    }
}
