//! # Taskmate Shared Library
//!
//! Data-access layer and domain helpers used by the Taskmate API server.
//!
//! ## Module Organization
//!
//! - `db`: connection pool and migrations
//! - `models`: users, tasks and responsibility assignments with their queries

pub mod db;
pub mod models;

/// Current version of the Taskmate shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
