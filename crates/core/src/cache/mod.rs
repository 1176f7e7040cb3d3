//! SQLite-backed partition store.
//!
//! This module provides named, persistent key → response partitions using
//! SQLite with async access via tokio-rusqlite. It supports:
//!
//! - Request keys derived from method + normalized URL (SHA-256)
//! - Idempotent partition open, whole-partition deletion
//! - The last activated generation, for restarts without the network
//! - Automatic schema migrations
//! - WAL mode for concurrent access

pub mod connection;
pub mod entries;
pub mod generations;
pub mod hash;
pub mod migrations;
pub mod partitions;

pub use crate::Error;

pub use connection::PartitionStore;
pub use hash::RequestKey;
pub use partitions::{KeyScheme, Partition, PartitionStats};
