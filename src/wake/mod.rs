//! Wake triggers
//!
//! Each source implements `WakeSource` so the kiosk loop can treat a button
//! edge, a keypress and a programmatic trigger the same way.

mod channel;
mod gpio;
mod keyboard;

use std::time::Instant;

use async_trait::async_trait;
use serde::Deserialize;

pub use channel::{ChannelWake, WakeHandle};
pub use gpio::{ButtonEdgeDetector, Edge, GpioButton};
pub use keyboard::KeyboardWake;

use crate::Result;

/// Where a wake came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WakeOrigin {
    /// Hardware push button
    Button,
    /// A line typed on stdin
    Keyboard,
    /// Triggered through a `WakeHandle`
    Remote,
}

/// A single wake trigger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WakeEvent {
    /// Source of the trigger
    pub origin: WakeOrigin,
    /// When it fired
    pub at: Instant,
}

impl WakeEvent {
    /// A wake from `origin`, stamped now
    #[must_use]
    pub fn now(origin: WakeOrigin) -> Self {
        Self {
            origin,
            at: Instant::now(),
        }
    }
}

/// Which wake source the kiosk should use
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WakeSourceKind {
    /// Press Enter on the terminal
    #[default]
    Keyboard,
    /// Push button on a GPIO line
    Gpio,
}

impl std::str::FromStr for WakeSourceKind {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "keyboard" => Ok(Self::Keyboard),
            "gpio" => Ok(Self::Gpio),
            other => Err(crate::Error::Config(format!("unknown wake source: {other}"))),
        }
    }
}

/// Produces wake triggers
#[async_trait]
pub trait WakeSource: Send {
    /// Source name for logs
    fn name(&self) -> &'static str;

    /// Wait for the next wake
    ///
    /// Returns `None` once the source is exhausted.
    ///
    /// # Errors
    ///
    /// Returns error if the underlying device cannot be read
    async fn next_wake(&mut self) -> Result<Option<WakeEvent>>;
}

#[async_trait]
impl WakeSource for Box<dyn WakeSource> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    async fn next_wake(&mut self) -> Result<Option<WakeEvent>> {
        (**self).next_wake().await
    }
}
