//! Partition layout and routing configuration for the proxy.
//!
//! Everything the proxy used to read from scattered constants lives here and
//! is injected once into [`crate::Proxy::new`].

use serde::{Deserialize, Serialize};

use crate::proxy::generation::AllowList;

/// The five logical partitions every generation owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PartitionRole {
    /// Root document, index document, manifest.
    Shell,
    /// Script and style bundles, plus API responses.
    StaticAssets,
    Images,
    /// Binary 3D models (`.glb` / `.gltf`).
    Models,
    /// Offline fallback document and pinned bundles.
    Offline,
}

impl PartitionRole {
    pub const ALL: [PartitionRole; 5] = [
        PartitionRole::Shell,
        PartitionRole::StaticAssets,
        PartitionRole::Images,
        PartitionRole::Models,
        PartitionRole::Offline,
    ];

    /// Whether entries in this partition are keyed without the query string.
    ///
    /// Navigations are keyed by their document URL, so `/?utm=x` and `/`
    /// share one shell entry.
    pub fn ignores_query(self) -> bool {
        matches!(self, PartitionRole::Shell)
    }
}

/// Logical partition names, before the generation suffix is applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionNames {
    #[serde(default = "default_shell_name")]
    pub shell: String,
    #[serde(default = "default_static_name")]
    pub static_assets: String,
    #[serde(default = "default_images_name")]
    pub images: String,
    #[serde(default = "default_models_name")]
    pub models: String,
    #[serde(default = "default_offline_name")]
    pub offline: String,
}

fn default_shell_name() -> String {
    "ayush-herbal-plants".into()
}

fn default_static_name() -> String {
    "static".into()
}

fn default_images_name() -> String {
    "images".into()
}

fn default_models_name() -> String {
    "models".into()
}

fn default_offline_name() -> String {
    "offline".into()
}

impl Default for PartitionNames {
    fn default() -> Self {
        Self {
            shell: default_shell_name(),
            static_assets: default_static_name(),
            images: default_images_name(),
            models: default_models_name(),
            offline: default_offline_name(),
        }
    }
}

impl PartitionNames {
    /// Logical (unsuffixed) name for a role.
    pub fn logical(&self, role: PartitionRole) -> &str {
        match role {
            PartitionRole::Shell => &self.shell,
            PartitionRole::StaticAssets => &self.static_assets,
            PartitionRole::Images => &self.images,
            PartitionRole::Models => &self.models,
            PartitionRole::Offline => &self.offline,
        }
    }
}

/// Paths fetched and stored eagerly at install time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallSeeds {
    #[serde(default = "default_shell_seeds")]
    pub shell: Vec<String>,
    #[serde(default = "default_offline_seeds")]
    pub offline: Vec<String>,
}

fn default_shell_seeds() -> Vec<String> {
    vec!["/".into(), "/index.html".into(), "/manifest.json".into(), "/offline.html".into()]
}

fn default_offline_seeds() -> Vec<String> {
    vec!["/offline.html".into(), "/static/css/main.css".into(), "/static/js/main.js".into()]
}

impl Default for InstallSeeds {
    fn default() -> Self {
        Self { shell: default_shell_seeds(), offline: default_offline_seeds() }
    }
}

/// Proxy configuration object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyConfig {
    /// Generation tag appended to every partition name (`images-v2`).
    #[serde(default = "default_generation")]
    pub generation: String,

    #[serde(default)]
    pub partitions: PartitionNames,

    #[serde(default)]
    pub seeds: InstallSeeds,

    /// Document served when a navigation fails and nothing is cached for it.
    #[serde(default = "default_offline_document")]
    pub offline_document: String,

    /// Last-resort cached document for navigations.
    #[serde(default = "default_root_document")]
    pub root_document: String,

    /// Requests under this path prefix are treated as API calls.
    #[serde(default = "default_api_prefix")]
    pub api_prefix: String,

    /// Path suffixes routed to the models partition.
    #[serde(default = "default_model_extensions")]
    pub model_extensions: Vec<String>,
}

fn default_generation() -> String {
    "v2".into()
}

fn default_offline_document() -> String {
    "/offline.html".into()
}

fn default_root_document() -> String {
    "/".into()
}

fn default_api_prefix() -> String {
    "/api/".into()
}

fn default_model_extensions() -> Vec<String> {
    vec![".glb".into(), ".gltf".into()]
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            generation: default_generation(),
            partitions: PartitionNames::default(),
            seeds: InstallSeeds::default(),
            offline_document: default_offline_document(),
            root_document: default_root_document(),
            api_prefix: default_api_prefix(),
            model_extensions: default_model_extensions(),
        }
    }
}

impl ProxyConfig {
    /// Persisted partition name for a role: `<logical-name>-<generation>`.
    pub fn partition_name(&self, role: PartitionRole) -> String {
        format!("{}-{}", self.partitions.logical(role), self.generation)
    }

    /// Every partition name the current generation knows about.
    pub fn allow_list(&self) -> AllowList {
        PartitionRole::ALL
            .iter()
            .map(|role| self.partition_name(*role))
            .collect()
    }

    /// Whether a URL path names a 3D model asset.
    pub fn is_model_path(&self, path: &str) -> bool {
        self.model_extensions.iter().any(|ext| path.ends_with(ext.as_str()))
    }
}
