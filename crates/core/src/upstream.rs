//! The network seam.
//!
//! The proxy never talks to the network directly; it goes through an
//! [`Upstream`]. The HTTP implementation lives in `herbcache-client`.

use async_trait::async_trait;

use crate::Error;
use crate::record::{RequestRecord, ResponseRecord};

/// Something that can satisfy a request over the network.
///
/// `Err` means the fetch itself was rejected. An HTTP error status is still
/// `Ok`; callers decide whether it is worth storing.
#[async_trait]
pub trait Upstream: Send + Sync {
    async fn fetch(&self, request: &RequestRecord) -> Result<ResponseRecord, Error>;
}
