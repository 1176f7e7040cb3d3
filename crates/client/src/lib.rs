//! Network side of herbcache.
//!
//! This crate provides the reqwest-backed [`HttpUpstream`] the proxy fetches
//! through, plus origin URL handling shared by the server and CLI.

pub mod fetch;

pub use fetch::{HttpUpstream, UpstreamConfig};
pub use fetch::url::{UrlError, canonicalize_origin, rebase};
