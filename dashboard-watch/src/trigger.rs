//! Single-slot wake-up signal.
//!
//! Firing an already armed trigger is a no-op, so any number of fires while
//! a loop is busy result in exactly one queued pass.

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

/// Sending half of a trigger. Cheap to clone.
#[derive(Clone, Debug)]
pub struct Trigger {
    tx: mpsc::Sender<()>,
}

/// Receiving half of a trigger, owned by the loop it wakes.
#[derive(Debug)]
pub struct TriggerReceiver {
    rx: mpsc::Receiver<()>,
}

/// Creates a connected trigger pair.
pub fn trigger() -> (Trigger, TriggerReceiver) {
    let (tx, rx) = mpsc::channel(1);
    (Trigger { tx }, TriggerReceiver { rx })
}

impl Trigger {
    /// Arms the trigger without blocking.
    ///
    /// Returns true if this call armed it, false if it was already armed or
    /// the receiver is gone.
    pub fn fire(&self) -> bool {
        match self.tx.try_send(()) {
            Ok(()) => true,
            Err(TrySendError::Full(())) | Err(TrySendError::Closed(())) => false,
        }
    }
}

impl TriggerReceiver {
    /// Waits until the trigger is armed and disarms it.
    ///
    /// Returns false once every [`Trigger`] has been dropped.
    pub async fn wait(&mut self) -> bool {
        self.rx.recv().await.is_some()
    }

    /// Disarms the trigger if armed. Returns whether it was.
    pub fn take(&mut self) -> bool {
        self.rx.try_recv().is_ok()
    }
}
