//! Push button on a Linux GPIO line (sysfs interface)
//!
//! The button is wired active-high, so pressing drives the line to 1 and
//! releasing drives it back to 0. A wake fires on the falling edge.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use async_trait::async_trait;

use super::{WakeEvent, WakeOrigin, WakeSource};
use crate::{Error, Result};

/// Default sysfs GPIO root
const SYSFS_GPIO_ROOT: &str = "/sys/class/gpio";

/// How often the line is sampled
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// How long to wait for the kernel to create the pin directory after export
const EXPORT_TIMEOUT: Duration = Duration::from_secs(1);

/// Direction of a debounced level change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    /// 0 → 1
    Rising,
    /// 1 → 0
    Falling,
}

/// Software debounce: a level must hold for `debounce` before it counts
#[derive(Debug, Clone)]
pub struct ButtonEdgeDetector {
    debounce: Duration,
    stable: bool,
    pending: Option<(bool, Instant)>,
}

impl ButtonEdgeDetector {
    /// Start from a known stable level
    #[must_use]
    pub const fn new(debounce: Duration, initial: bool) -> Self {
        Self {
            debounce,
            stable: initial,
            pending: None,
        }
    }

    /// Feed a sampled level; returns an edge once a change has settled
    pub fn observe(&mut self, level: bool, now: Instant) -> Option<Edge> {
        if level == self.stable {
            self.pending = None;
            return None;
        }

        let since = match self.pending {
            Some((pending, since)) if pending == level => since,
            _ => {
                self.pending = Some((level, now));
                now
            }
        };

        if now.saturating_duration_since(since) < self.debounce {
            return None;
        }

        self.stable = level;
        self.pending = None;
        Some(if level { Edge::Rising } else { Edge::Falling })
    }

    /// Last settled level
    #[must_use]
    pub const fn level(&self) -> bool {
        self.stable
    }
}

/// Polls a sysfs GPIO value file for button releases
pub struct GpioButton {
    pin: u32,
    value_path: PathBuf,
    detector: ButtonEdgeDetector,
    poll_interval: Duration,
}

impl GpioButton {
    /// Export `pin` as an input under `/sys/class/gpio`
    ///
    /// # Errors
    ///
    /// Returns error if the pin cannot be exported, configured or read
    pub async fn open(pin: u32, debounce: Duration) -> Result<Self> {
        Self::open_at(Path::new(SYSFS_GPIO_ROOT), pin, debounce).await
    }

    /// Export `pin` as an input under a custom sysfs root
    ///
    /// # Errors
    ///
    /// Returns error if the pin cannot be exported, configured or read
    pub async fn open_at(root: &Path, pin: u32, debounce: Duration) -> Result<Self> {
        let pin_dir = root.join(format!("gpio{pin}"));

        if !tokio::fs::try_exists(&pin_dir).await? {
            tokio::fs::write(root.join("export"), pin.to_string())
                .await
                .map_err(|e| Error::Wake(format!("unable to export GPIO {pin}: {e}")))?;
            wait_for_dir(&pin_dir).await?;
        }

        tokio::fs::write(pin_dir.join("direction"), "in")
            .await
            .map_err(|e| Error::Wake(format!("unable to set GPIO {pin} as input: {e}")))?;

        let value_path = pin_dir.join("value");
        let initial = read_level(&value_path).await?;

        tracing::info!(pin, debounce_ms = debounce.as_millis(), "GPIO button initialized");

        Ok(Self {
            pin,
            value_path,
            detector: ButtonEdgeDetector::new(debounce, initial),
            poll_interval: POLL_INTERVAL,
        })
    }

    /// Override the sampling interval
    #[must_use]
    pub const fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// GPIO line number
    #[must_use]
    pub const fn pin(&self) -> u32 {
        self.pin
    }
}

#[async_trait]
impl WakeSource for GpioButton {
    fn name(&self) -> &'static str {
        "gpio"
    }

    async fn next_wake(&mut self) -> Result<Option<WakeEvent>> {
        loop {
            tokio::time::sleep(self.poll_interval).await;

            let level = read_level(&self.value_path).await?;
            match self.detector.observe(level, Instant::now()) {
                Some(Edge::Falling) => {
                    tracing::debug!(pin = self.pin, "button released");
                    return Ok(Some(WakeEvent::now(WakeOrigin::Button)));
                }
                Some(Edge::Rising) => tracing::trace!(pin = self.pin, "button pressed"),
                None => {}
            }
        }
    }
}

async fn read_level(path: &Path) -> Result<bool> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| Error::Wake(format!("unable to read {}: {e}", path.display())))?;

    match raw.trim() {
        "1" => Ok(true),
        "0" => Ok(false),
        other => Err(Error::Wake(format!("unexpected GPIO value: {other:?}"))),
    }
}

async fn wait_for_dir(dir: &Path) -> Result<()> {
    let deadline = Instant::now() + EXPORT_TIMEOUT;
    while !tokio::fs::try_exists(dir).await? {
        if Instant::now() > deadline {
            return Err(Error::Wake(format!("{} did not appear after export", dir.display())));
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    Ok(())
}
