//! # Dashboard Store
//!
//! In-memory record store shared by the watch adapter and the enrichment
//! loops, plus the loader for static (non-cluster) definitions.
//!
//! ## Example
//!
//! ```rust
//! use dashboard_core::Record;
//! use dashboard_store::RecordStore;
//!
//! let store = RecordStore::new();
//! store.upsert(Record::new("uid-1", "default", "grafana"));
//! assert_eq!(store.snapshot().len(), 1);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod definitions;
mod store;

pub use definitions::{load_definitions, Definition};
pub use store::{RecordStore, StoreStats};
