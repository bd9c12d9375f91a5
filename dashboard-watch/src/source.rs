//! Event sources feeding the watch adapter.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use dashboard_core::error::Result;
use dashboard_core::traits::ResourceEventHandler;
use dashboard_core::types::WatchEvent;

/// Delivers add/update/delete callbacks until cancelled.
///
/// Returning (with or without an error) shuts the whole engine down.
#[async_trait]
pub trait EventSource: Send {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Streams events into `handler` until `shutdown` fires or the
    /// subscription ends.
    async fn run(self: Box<Self>, handler: Arc<dyn ResourceEventHandler>, shutdown: CancellationToken) -> Result<()>;
}

/// Source fed through an in-process channel.
pub struct ChannelEventSource {
    rx: mpsc::Receiver<WatchEvent>,
}

impl ChannelEventSource {
    /// Creates a source and the sender feeding it.
    pub fn new(capacity: usize) -> (mpsc::Sender<WatchEvent>, Self) {
        let (tx, rx) = mpsc::channel(capacity);
        (tx, Self { rx })
    }
}

#[async_trait]
impl EventSource for ChannelEventSource {
    fn name(&self) -> &str {
        "channel"
    }

    async fn run(self: Box<Self>, handler: Arc<dyn ResourceEventHandler>, shutdown: CancellationToken) -> Result<()> {
        let mut rx = self.rx;
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => return Ok(()),
                event = rx.recv() => match event {
                    Some(event) => handler.handle(event).await,
                    None => {
                        info!("Event channel closed");
                        return Ok(());
                    }
                },
            }
        }
    }
}

/// Source that never delivers anything.
///
/// Lets the engine serve static definitions alone.
#[derive(Debug, Default)]
pub struct IdleEventSource;

#[async_trait]
impl EventSource for IdleEventSource {
    fn name(&self) -> &str {
        "idle"
    }

    async fn run(self: Box<Self>, _handler: Arc<dyn ResourceEventHandler>, shutdown: CancellationToken) -> Result<()> {
        debug!("Idle event source waiting for shutdown");
        shutdown.cancelled().await;
        Ok(())
    }
}
