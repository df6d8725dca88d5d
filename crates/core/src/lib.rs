//! Core types and shared functionality for favicon-prefixer.
//!
//! This crate provides:
//! - SQLite persistence for the favicon index and options
//! - Capability traits the rest of the workspace depends on
//!   ([`ConfigStore`], [`ObjectCache`], [`Authorizer`])
//! - Unified error types
//! - Configuration structures

pub mod auth;
pub mod cache;
pub mod config;
pub mod error;
pub mod object_cache;
pub mod settings;

pub use auth::{Authorizer, StaticAuthorizer};
pub use cache::{CacheDb, Transient};
pub use config::{AppConfig, ConfigError};
pub use error::Error;
pub use object_cache::{MemoryObjectCache, ObjectCache};
pub use settings::{ConfigStore, Settings};
