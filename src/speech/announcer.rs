//! Spoken feedback

use async_trait::async_trait;

use crate::voice::{AudioPlayback, TextToSpeech};
use crate::{Error, Result};

/// A text-to-speech capability
///
/// `speak` resolves only once the text has finished playing, so a listen
/// started afterwards does not hear the kiosk's own voice.
#[async_trait]
pub trait Announcer: Send + Sync {
    /// Speak `text` and wait for playback to complete
    ///
    /// # Errors
    ///
    /// Returns error if synthesis or playback fails
    async fn speak(&self, text: &str) -> Result<()>;
}

/// Cloud TTS rendered on the default output device
pub struct CloudAnnouncer {
    tts: TextToSpeech,
}

impl CloudAnnouncer {
    /// Wrap a TTS client
    #[must_use]
    pub const fn new(tts: TextToSpeech) -> Self {
        Self { tts }
    }
}

#[async_trait]
impl Announcer for CloudAnnouncer {
    async fn speak(&self, text: &str) -> Result<()> {
        tracing::debug!(text, "speaking");
        let audio = self.tts.synthesize(text).await?;

        // The output device is opened per utterance and released when the
        // blocking task returns, whether or not playback succeeded.
        tokio::task::spawn_blocking(move || AudioPlayback::new()?.play_mp3_blocking(&audio))
            .await
            .map_err(|e| Error::Audio(format!("playback task failed: {e}")))?
    }
}

/// Prints utterances instead of playing them
///
/// For running the kiosk on a machine without speakers or TTS credentials.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleAnnouncer;

#[async_trait]
impl Announcer for ConsoleAnnouncer {
    async fn speak(&self, text: &str) -> Result<()> {
        tracing::debug!(text, "speaking to console");
        println!("kiosk> {}", text.replace('\n', " "));
        Ok(())
    }
}
