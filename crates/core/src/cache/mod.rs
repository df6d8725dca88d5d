//! SQLite-backed persistence for the favicon index and plugin options.
//!
//! This module provides the durable half of the favicon cache using SQLite
//! with async access via tokio-rusqlite. It supports:
//!
//! - Expiring, namespaced key/value records (`transients`)
//! - JSON-encoded options behind the [`ConfigStore`](crate::ConfigStore) trait
//! - Hashed cache keys for domains and content fragments
//! - Automatic schema migrations and WAL mode for concurrent access

pub mod connection;
pub mod hash;
pub mod migrations;
pub mod options;
pub mod transients;

pub use crate::Error;

pub use connection::CacheDb;
pub use transients::Transient;
