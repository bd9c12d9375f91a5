//! # Dashboard Icons
//!
//! Finds a representative icon for a web page: the best `<link rel=...>`
//! hint in the page head, or the conventional `/favicon.ico`.
//!
//! ## Example
//!
//! ```rust
//! use dashboard_icons::find_icon;
//!
//! let html = r#"<html><head>
//!     <link rel="icon" href="/favicon.png">
//!     <link rel="apple-touch-icon" href="/touch.png">
//! </head><body></body></html>"#;
//! assert_eq!(find_icon(html).as_deref(), Some("/touch.png"));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod finder;
mod html;

pub use finder::{IconConfig, IconFinder};
pub use html::{find_icon, normalize_href};
