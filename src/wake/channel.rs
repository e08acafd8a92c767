//! Programmatic wake triggers over a tokio channel

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::{WakeEvent, WakeOrigin, WakeSource};
use crate::Result;

/// Pending wakes the kiosk loop has not picked up yet
const CHANNEL_CAPACITY: usize = 8;

/// Receiving side; handed to the kiosk loop
pub struct ChannelWake {
    rx: mpsc::Receiver<WakeEvent>,
}

/// Sending side; cloneable, usable from any task
#[derive(Clone)]
pub struct WakeHandle {
    tx: mpsc::Sender<WakeEvent>,
}

impl ChannelWake {
    /// Create a connected source/handle pair
    #[must_use]
    pub fn new() -> (Self, WakeHandle) {
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        (Self { rx }, WakeHandle { tx })
    }
}

impl WakeHandle {
    /// Fire a wake; returns false if it was dropped
    ///
    /// A full or closed channel drops the wake rather than waiting.
    pub fn trigger(&self) -> bool {
        match self.tx.try_send(WakeEvent::now(WakeOrigin::Remote)) {
            Ok(()) => true,
            Err(e) => {
                tracing::debug!(error = %e, "wake dropped");
                false
            }
        }
    }
}

#[async_trait]
impl WakeSource for ChannelWake {
    fn name(&self) -> &'static str {
        "channel"
    }

    async fn next_wake(&mut self) -> Result<Option<WakeEvent>> {
        Ok(self.rx.recv().await)
    }
}
