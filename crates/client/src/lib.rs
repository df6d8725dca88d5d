//! Favicon acquisition and content rewriting for favicon-prefixer.
//!
//! This crate provides the domain resolver, the two-tier favicon store, the
//! provider fetcher, the service facade and the link rewriter, wired
//! together by [`FaviconPrefixer`] for the server and CLI.

pub mod app;
pub mod domain;
pub mod fetch;
pub mod rewrite;
pub mod service;
pub mod store;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use app::{AutotestFailure, AutotestReport, AutotestStep, FaviconPrefixer, autotest_fragment};
pub use domain::{DomainResolver, UrlError};
pub use fetch::{FaviconFetcher, FetchConfig, HttpClient, ReqwestClient};
pub use rewrite::ContentRewriter;
pub use service::FaviconService;
pub use store::{CacheStatus, CachedFavicon, FaviconStore};
