//! # Synergy Shared Library
//!
//! This crate contains the record models, session and permission rules,
//! record store access and display formatters used by the Synergy Hub
//! service layer.
//!
//! ## Module Organization
//!
//! - `models`: record models and their wire mapping
//! - `auth`: explicit session state and role-based permission checks
//! - `store`: record store trait, HTTP client and in-memory store
//! - `format`: date, file size and name formatting

pub mod auth;
pub mod format;
pub mod models;
pub mod store;

/// Current version of the Synergy shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
