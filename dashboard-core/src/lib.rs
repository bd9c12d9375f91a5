//! # Dashboard Core
//!
//! Core types, errors, and traits for the ingress dashboard.
//!
//! This crate provides the foundational building blocks used by all other dashboard crates:
//!
//! - **Types**: Enriched records, references, the observed ingress shape and watch events
//! - **Errors**: One error enum shared by every crate, with classification helpers
//! - **Constants**: Annotation keys, scan intervals and thresholds
//! - **Traits**: Capability interfaces for the receiver, cluster queries, enrichment sources and event handlers
//!
//! ## Example
//!
//! ```rust
//! use dashboard_core::{Record, Reference};
//!
//! let mut record = Record::new("uid-1", "default", "grafana");
//! record.refs.push(Reference::new("https://grafana.example.com/").with_pods(2));
//! assert_eq!(record.id, "default.grafana");
//! assert_eq!(record.label(), "grafana");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, clippy::all)]

pub mod constants;
pub mod error;
pub mod traits;
pub mod types;

// Re-export commonly used items at crate root
pub use constants::*;
pub use error::{DashboardError, Result};
pub use traits::*;
pub use types::*;
