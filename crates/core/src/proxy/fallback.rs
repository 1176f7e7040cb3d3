//! Ordered fallback sequences.
//!
//! A chain of labelled attempts tried one after another until one produces
//! a response. Attempts are started lazily, so a later attempt never runs
//! once an earlier one has succeeded.

use std::future::Future;

use futures::FutureExt;
use futures::future::BoxFuture;

use crate::Error;
use crate::record::ResponseRecord;

/// `Ok(Some)` is a hit, `Ok(None)` a miss, `Err` a failure. Misses and
/// failures both move on to the next attempt.
pub type AttemptResult = Result<Option<ResponseRecord>, Error>;

type Attempt<'a> = Box<dyn FnOnce() -> BoxFuture<'a, AttemptResult> + Send + 'a>;

/// A response together with the label of the attempt that produced it.
#[derive(Debug, Clone)]
pub struct Resolved {
    pub response: ResponseRecord,
    pub source: &'static str,
}

#[derive(Default)]
pub struct FallbackChain<'a> {
    attempts: Vec<(&'static str, Attempt<'a>)>,
}

impl<'a> FallbackChain<'a> {
    pub fn new() -> Self {
        Self { attempts: Vec::new() }
    }

    /// Append an attempt.
    pub fn then<F, Fut>(mut self, label: &'static str, attempt: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'a,
        Fut: Future<Output = AttemptResult> + Send + 'a,
    {
        self.attempts.push((label, Box::new(move || attempt().boxed())));
        self
    }

    pub fn len(&self) -> usize {
        self.attempts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attempts.is_empty()
    }

    /// Run attempts in order.
    ///
    /// # Errors
    ///
    /// Returns the last failure when nothing succeeded, or `CacheMiss` when
    /// every attempt was a plain miss.
    pub async fn run(self) -> Result<Resolved, Error> {
        let mut last_error = None;

        for (label, attempt) in self.attempts {
            match attempt().await {
                Ok(Some(response)) => return Ok(Resolved { response, source: label }),
                Ok(None) => tracing::debug!(attempt = label, "fallback attempt missed"),
                Err(e) => {
                    tracing::debug!(attempt = label, error = %e, "fallback attempt failed");
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| Error::CacheMiss("no fallback attempt produced a response".into())))
    }
}
