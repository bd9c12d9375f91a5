//! Domain types for the dashboard.
//!
//! - [`Record`]: enriched entry published to the presentation layer
//! - [`Reference`]: one reachable URL with its endpoint count
//! - [`IngressResource`]: observed resource shape
//! - [`WatchEvent`]: add/update/delete callback payloads

mod record;
mod resource;

pub use record::*;
pub use resource::*;
