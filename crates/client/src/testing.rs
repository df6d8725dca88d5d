//! In-process doubles for the capability traits.
//!
//! Compiled for this crate's tests and, behind the `testing` feature, for
//! downstream crates' tests.

use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use url::Url;

use crate::fetch::HttpClient;
use prefixer_core::Error;

/// [`HttpClient`] returning a canned response and recording every request.
pub struct StubHttpClient {
    response: Result<Bytes, String>,
    calls: AtomicUsize,
    requested: Mutex<Vec<Url>>,
}

impl StubHttpClient {
    pub fn ok(body: &[u8]) -> Self {
        Self::with_response(Ok(Bytes::copy_from_slice(body)))
    }

    pub fn failing() -> Self {
        Self::with_response(Err("status 503".to_string()))
    }

    fn with_response(response: Result<Bytes, String>) -> Self {
        Self { response, calls: AtomicUsize::new(0), requested: Mutex::new(Vec::new()) }
    }

    /// Number of requests issued so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requested(&self) -> Vec<Url> {
        self.requested.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait]
impl HttpClient for StubHttpClient {
    async fn get(&self, url: &Url) -> Result<Bytes, Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requested
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(url.clone());

        self.response.clone().map_err(Error::FetchFailed)
    }
}
