//! Record store access
//!
//! The hub keeps no local database: every entity lives in a collection of a
//! hosted record store reached over HTTP. This module provides the
//! [`RecordStore`] trait, the [`Query`] descriptor, the HTTP client and an
//! in-memory implementation used by tests and demos.
//!
//! # Modules
//!
//! - [`record_store`]: trait, batch outcomes and error types
//! - [`query`]: field selection, conditions, ordering and paging
//! - [`client`]: [`HttpRecordStore`] and its [`StoreConfig`]
//! - [`memory`]: [`MemoryStore`]

pub mod client;
pub mod memory;
pub mod query;
pub mod record_store;

pub use client::{HttpRecordStore, StoreConfig};
pub use memory::{MemoryStore, StoreCall};
pub use query::{Condition, Operator, Query, SortDirection};
pub use record_store::{
    Page, RecordOutcome, RecordStore, StoreError, StoreOperation, StoreResult,
};
