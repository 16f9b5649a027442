//! # Synergy Hub Library
//!
//! Service layer of the hub: permission-aware entity services over the
//! remote record store, the task board, spreadsheet import reconciliation
//! and the dashboard summary.
//!
//! ## Modules
//!
//! - `repository`: generic CRUD over one collection
//! - `services`: project, task, user, resource and activity services
//! - `board`: Kanban task board
//! - `import`: parse-then-bulk-create import pipeline
//! - `dashboard`: per-user summary
//! - `config`, `error`: configuration and service errors
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use synergy_hub::services::Services;
//! use synergy_shared::store::MemoryStore;
//!
//! let services = Services::new(Arc::new(MemoryStore::new()));
//! # let _ = services;
//! ```

pub mod board;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod import;
pub mod repository;
pub mod services;
