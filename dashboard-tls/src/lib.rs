//! # Dashboard TLS
//!
//! Dials a host on the HTTPS port, accepts whatever chain it presents and
//! reports the earliest certificate expiry.
//!
//! Trust is never evaluated: expired, self-signed and mismatched chains are
//! exactly the ones worth reporting.
//!
//! ## Example
//!
//! ```rust,no_run
//! use dashboard_tls::CertificateProber;
//!
//! # async fn example() -> dashboard_core::Result<()> {
//! let prober = CertificateProber::new()?;
//! let info = prober.probe("example.com").await?;
//! println!("expires at {:?}", info.expires_at);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod chain;
mod prober;
mod verifier;

pub use chain::{min_expiry, CertificateInfo};
pub use prober::{CertificateProber, ProberConfig};
