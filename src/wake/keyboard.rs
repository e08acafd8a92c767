//! Wake from the terminal: every line on stdin is a button press

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader, Lines};

use super::{WakeEvent, WakeOrigin, WakeSource};
use crate::Result;

/// Treats each input line as a wake
pub struct KeyboardWake<R = tokio::io::Stdin> {
    lines: Lines<BufReader<R>>,
}

impl KeyboardWake {
    /// Read wakes from stdin
    #[must_use]
    pub fn stdin() -> Self {
        Self::from_reader(tokio::io::stdin())
    }
}

impl<R: AsyncRead + Unpin> KeyboardWake<R> {
    /// Read wakes from any async reader
    pub fn from_reader(reader: R) -> Self {
        Self {
            lines: BufReader::new(reader).lines(),
        }
    }
}

#[async_trait]
impl<R: AsyncRead + Unpin + Send> WakeSource for KeyboardWake<R> {
    fn name(&self) -> &'static str {
        "keyboard"
    }

    async fn next_wake(&mut self) -> Result<Option<WakeEvent>> {
        let line = self.lines.next_line().await?;
        Ok(line.map(|_| WakeEvent::now(WakeOrigin::Keyboard)))
    }
}
