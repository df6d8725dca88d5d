//! Cache-related MCP tools.
//!
//! This module provides tools for inspecting and clearing the favicon cache.

pub mod clear;
pub mod list;
pub mod status;

pub use clear::{CacheClearOutput, clear_impl};
pub use list::{CacheListOutput, list_impl};
pub use status::{CacheStatusOutput, status_impl};
