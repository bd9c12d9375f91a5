//! # Dashboard Watch
//!
//! The watch-cache-enrich-notify engine.
//!
//! Resource events are folded into a [`RecordStore`](dashboard_store::RecordStore)
//! by the [`WatchAdapter`]. Every mutation publishes a snapshot and wakes two
//! best-effort enrichment loops: [`LogoLoop`] (icon discovery) and [`TlsLoop`]
//! (certificate expiry). Bursts of changes coalesce into one extra pass per
//! loop.
//!
//! [`Engine::run`] drives the event source and both loops as one task group:
//! when any of them exits, the others are cancelled.
//!
//! ## Example
//!
//! ```rust,ignore
//! use dashboard_watch::{ChannelEventSource, Engine};
//!
//! let (events, source) = ChannelEventSource::new(64);
//! let engine = Engine::new(store, receiver, cluster, icons, certificates);
//! engine.run(Box::new(source), shutdown).await?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod adapter;
mod engine;
mod logo;
mod notifier;
mod source;
mod tls;
mod trigger;

#[cfg(feature = "kube")]
pub mod kubernetes;

pub use adapter::WatchAdapter;
pub use engine::{Engine, EngineConfig};
pub use logo::LogoLoop;
pub use notifier::Notifier;
pub use source::{ChannelEventSource, EventSource, IdleEventSource};
pub use tls::TlsLoop;
pub use trigger::{trigger, Trigger, TriggerReceiver};
