//! Kiosk runtime - wires wake sources to the session controller
//!
//! Every wake is handed to its own task. The controller decides whether the
//! wake starts a session or is dropped, so wakes are never queued behind a
//! running session.

use std::future::Future;
use std::sync::Arc;

use tokio::task::JoinSet;

use crate::session::{SessionController, WakeOutcome};
use crate::speech::{Announcer, CloudAnnouncer, CloudRecognizer, ConsoleAnnouncer, Vocabulary};
use crate::voice::{SpeechToText, TextToSpeech};
use crate::wake::WakeSource;
use crate::{Config, Result};

/// The running kiosk
pub struct Kiosk {
    controller: Arc<SessionController>,
}

/// Build the closed-vocabulary name recognizer
///
/// # Errors
///
/// Returns error if the roster is invalid or the STT key is missing
pub fn name_recognizer(config: &Config) -> Result<CloudRecognizer> {
    Ok(CloudRecognizer::new(
        "name",
        Vocabulary::Names(config.constraints()?),
        speech_to_text(config)?,
        config.voice.listen_timeout(),
    ))
}

/// Build the open-vocabulary item recognizer
///
/// # Errors
///
/// Returns error if the STT key is missing
pub fn item_recognizer(config: &Config) -> Result<CloudRecognizer> {
    Ok(CloudRecognizer::new(
        "item",
        Vocabulary::Topic(config.item_topic.clone()),
        speech_to_text(config)?,
        config.voice.listen_timeout(),
    ))
}

/// Build the announcer; `console` prints instead of speaking
///
/// # Errors
///
/// Returns error if speaking is requested and the TTS key is missing
pub fn announcer(config: &Config, console: bool) -> Result<Arc<dyn Announcer>> {
    if console {
        return Ok(Arc::new(ConsoleAnnouncer));
    }

    let tts = TextToSpeech::new(
        config.voice.tts_provider,
        config.tts_api_key()?,
        config.voice.tts_voice.clone(),
        config.voice.tts_model.clone(),
        config.voice.tts_speed,
    )?;
    Ok(Arc::new(CloudAnnouncer::new(tts)))
}

fn speech_to_text(config: &Config) -> Result<SpeechToText> {
    SpeechToText::new(
        config.voice.stt_provider,
        config.stt_api_key()?,
        config.voice.stt_model.clone(),
    )
}

impl Kiosk {
    /// Wrap an existing controller
    #[must_use]
    pub const fn new(controller: Arc<SessionController>) -> Self {
        Self { controller }
    }

    /// Build a kiosk with cloud speech engines from configuration
    ///
    /// # Errors
    ///
    /// Returns error if the configuration is incomplete
    pub fn from_config(config: &Config, console: bool) -> Result<Self> {
        let controller = SessionController::new(
            config.constraints()?,
            Arc::new(name_recognizer(config)?),
            Arc::new(item_recognizer(config)?),
            announcer(config, console)?,
            config.timing.timing(),
        );

        Ok(Self::new(Arc::new(controller)))
    }

    /// The session controller
    #[must_use]
    pub const fn controller(&self) -> &Arc<SessionController> {
        &self.controller
    }

    /// Run until Ctrl-C or the wake source closes
    ///
    /// # Errors
    ///
    /// Returns error if the wake source fails
    pub async fn run<W: WakeSource>(self, wake: W) -> Result<()> {
        self.run_until(wake, async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "unable to listen for Ctrl-C");
                std::future::pending::<()>().await;
            }
        })
        .await
    }

    /// Run until `shutdown` resolves or the wake source closes
    ///
    /// A recognizer that fails to initialize does not stop the kiosk; wakes
    /// are then ignored. Sessions in flight at shutdown run to completion.
    ///
    /// # Errors
    ///
    /// Returns error if the wake source fails
    pub async fn run_until<W, F>(self, mut wake: W, shutdown: F) -> Result<()>
    where
        W: WakeSource,
        F: Future<Output = ()>,
    {
        if let Err(e) = self.controller.prepare().await {
            tracing::error!(error = %e, "listening disabled");
        }

        let source = wake.name();
        tracing::info!(source, ready = self.controller.is_ready(), "kiosk running");

        let mut sessions = JoinSet::new();
        tokio::pin!(shutdown);

        let result = loop {
            tokio::select! {
                () = &mut shutdown => {
                    tracing::info!("shutdown requested");
                    break Ok(());
                }
                next = wake.next_wake() => match next {
                    Ok(Some(event)) => {
                        let controller = Arc::clone(&self.controller);
                        sessions.spawn(async move {
                            let outcome = controller.on_wake().await;
                            tracing::debug!(
                                origin = ?event.origin,
                                elapsed_ms = event.at.elapsed().as_millis(),
                                "wake handled"
                            );
                            outcome
                        });
                    }
                    Ok(None) => {
                        tracing::info!(source, "wake source closed");
                        break Ok(());
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "wake source failed");
                        break Err(e);
                    }
                },
                Some(joined) = sessions.join_next() => log_session(joined),
            }
        };

        while let Some(joined) = sessions.join_next().await {
            log_session(joined);
        }

        let wishlist = self.controller.wishlist();
        for entry in wishlist.all() {
            tracing::info!(requestor = entry.requestor(), item = entry.item(), "wishlist entry");
        }
        tracing::info!(entries = wishlist.len(), "kiosk stopped");

        result
    }
}

fn log_session(joined: std::result::Result<WakeOutcome, tokio::task::JoinError>) {
    match joined {
        Ok(WakeOutcome::Ignored(reason)) => tracing::debug!(?reason, "wake ignored"),
        Ok(WakeOutcome::Completed(_)) => {}
        Err(e) => tracing::error!(error = %e, "session task failed"),
    }
}
