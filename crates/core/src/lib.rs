//! Core types and shared functionality for herbcache.
//!
//! This crate provides:
//! - Partitioned response cache with SQLite backend
//! - Request classification and caching strategies
//! - Generation cleanup and the proxy lifecycle
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;
pub mod proxy;
pub mod record;
pub mod upstream;

pub use cache::{Partition, PartitionStore, RequestKey};
pub use config::{AppConfig, PartitionRole, ProxyConfig};
pub use error::Error;
pub use proxy::{
    CleanupReport, ControlMessage, GenerationManager, InstallReport, PreloadReport, Proxy, ProxyEvent, ProxyState,
    ProxyStatus,
};
pub use record::{Destination, RequestRecord, ResponseRecord};
pub use upstream::Upstream;
