//! The interaction state machine
//!
//! ```text
//!            wake (not busy, ready)
//!   Idle ───────────────────────────▶ AwaitingName
//!    ▲                                   │
//!    │            administrator ┌────────┴────────┐ other roster name
//!    │                          ▼                 ▼
//!    │              AdministratorReview      AwaitingItem
//!    │                          │                 │
//!    └──────────────────────────┴─────────────────┘
//!         (every failure path also returns to Idle)
//! ```
//!
//! One session runs at a time. A wake that arrives while a session is
//! active is dropped, not queued.

mod prompts;
mod state;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

pub use prompts::{
    HEARING_FAILURE, ITEM_NOT_UNDERSTOOD, SPEAKER_NOT_RECOGNIZED, WAKE_PROMPT, confirmation,
    empty_list, item_prompt, list_intro, review_entry,
};
pub use state::{IgnoreReason, SessionOutcome, SessionPhase, Stage, WakeOutcome};

use state::SessionState;

use crate::Result;
use crate::speech::{Announcer, RecognitionOutcome, Recognizer, SpeechConstraintSet};
use crate::wishlist::Wishlist;

/// Fixed pauses inserted between steps of a session
///
/// The values are tuning, not semantics. Tests use `Timing::immediate()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    /// Pause between the wake and the wake prompt
    pub wake_delay: Duration,
    /// Pause between a prompt and the listen that follows it
    pub settle_delay: Duration,
    /// Pause before each entry read back during review
    pub pacing_delay: Duration,
}

impl Timing {
    /// No pauses at all
    #[must_use]
    pub const fn immediate() -> Self {
        Self {
            wake_delay: Duration::ZERO,
            settle_delay: Duration::ZERO,
            pacing_delay: Duration::ZERO,
        }
    }
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            wake_delay: Duration::from_secs(2),
            settle_delay: Duration::from_secs(2),
            pacing_delay: Duration::from_secs(4),
        }
    }
}

/// Coordinates wake, recognition, playback and the wishlist
pub struct SessionController {
    constraints: SpeechConstraintSet,
    names: Arc<dyn Recognizer>,
    items: Arc<dyn Recognizer>,
    announcer: Arc<dyn Announcer>,
    timing: Timing,
    ready: AtomicBool,
    state: Mutex<SessionState>,
}

/// Marks a session active; returning the controller to `Idle` on drop
struct ActiveSession<'a> {
    controller: &'a SessionController,
}

impl Drop for ActiveSession<'_> {
    fn drop(&mut self) {
        let mut state = self.controller.lock();
        state.active = false;
        state.phase = SessionPhase::Idle;
        state.requestor = None;
        drop(state);
        tracing::debug!(phase = %SessionPhase::Idle, "session ended");
    }
}

impl SessionController {
    /// Create a controller; it ignores wakes until `prepare` succeeds
    #[must_use]
    pub fn new(
        constraints: SpeechConstraintSet,
        names: Arc<dyn Recognizer>,
        items: Arc<dyn Recognizer>,
        announcer: Arc<dyn Announcer>,
        timing: Timing,
    ) -> Self {
        Self {
            constraints,
            names,
            items,
            announcer,
            timing,
            ready: AtomicBool::new(false),
            state: Mutex::new(SessionState::default()),
        }
    }

    /// Configure both recognizers, name first
    ///
    /// On failure the controller stays not-ready and every wake is ignored.
    ///
    /// # Errors
    ///
    /// Returns the first `Error::ConstraintCompilation` encountered
    pub async fn prepare(&self) -> Result<()> {
        self.ready.store(false, Ordering::SeqCst);

        for recognizer in [&self.names, &self.items] {
            if let Err(e) = recognizer.configure().await {
                tracing::error!(
                    recognizer = recognizer.name(),
                    error = %e,
                    "unable to initialize listener"
                );
                return Err(e);
            }
        }

        self.ready.store(true, Ordering::SeqCst);
        tracing::info!(roster = self.constraints.roster().len(), "listeners initialized");
        Ok(())
    }

    /// Whether both recognizers are configured
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    /// Whether a session is in flight
    #[must_use]
    pub fn is_session_active(&self) -> bool {
        self.lock().active
    }

    /// Current phase
    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        self.lock().phase
    }

    /// Identity recognized in the current session, if any
    #[must_use]
    pub fn requestor(&self) -> Option<String> {
        self.lock().requestor.clone()
    }

    /// Snapshot of the wishlist
    #[must_use]
    pub fn wishlist(&self) -> Wishlist {
        self.lock().wishlist.clone()
    }

    /// Handle a wake trigger
    ///
    /// Runs a whole session to completion, or returns immediately if the
    /// controller is not ready or already busy.
    pub async fn on_wake(&self) -> WakeOutcome {
        if !self.is_ready() {
            tracing::warn!("wake ignored, listeners not initialized");
            return WakeOutcome::Ignored(IgnoreReason::NotReady);
        }

        let Some(session) = self.begin() else {
            tracing::debug!("wake ignored, session already active");
            return WakeOutcome::Ignored(IgnoreReason::Busy);
        };

        let outcome = self.run_session().await;
        drop(session);

        tracing::info!(?outcome, "session complete");
        WakeOutcome::Completed(outcome)
    }

    /// Check-and-set the active flag under the state lock
    fn begin(&self) -> Option<ActiveSession<'_>> {
        let mut state = self.lock();
        if state.active {
            return None;
        }
        state.active = true;
        state.phase = SessionPhase::AwaitingName;
        drop(state);

        tracing::debug!(phase = %SessionPhase::AwaitingName, "session started");
        Some(ActiveSession { controller: self })
    }

    async fn run_session(&self) -> SessionOutcome {
        pause(self.timing.wake_delay).await;
        self.say(WAKE_PROMPT).await;
        pause(self.timing.settle_delay).await;

        let heard = self.names.listen_once().await;
        let requestor = match heard.accepted_text() {
            Some(name) if self.constraints.matches_known_speaker(name) => name.to_string(),
            _ => {
                if let RecognitionOutcome::EngineFailure(reason) = &heard {
                    tracing::warn!(stage = ?Stage::Name, reason = %reason, "recognition failed");
                    self.say(HEARING_FAILURE).await;
                    return SessionOutcome::EngineFailure { stage: Stage::Name };
                }
                tracing::info!(?heard, "speaker not recognized");
                self.say(SPEAKER_NOT_RECOGNIZED).await;
                return SessionOutcome::SpeakerNotRecognized;
            }
        };

        self.lock().requestor = Some(requestor.clone());

        if self.constraints.is_administrator(&requestor) {
            self.review_wishlist(&requestor).await
        } else {
            self.capture_item(requestor).await
        }
    }

    async fn review_wishlist(&self, administrator: &str) -> SessionOutcome {
        self.transition(SessionPhase::AdministratorReview);
        let entries = self.lock().wishlist.all().to_vec();

        if entries.is_empty() {
            self.say(&empty_list(administrator)).await;
            return SessionOutcome::ListReviewed { entries: 0 };
        }

        self.say(&list_intro(administrator)).await;
        for entry in &entries {
            pause(self.timing.pacing_delay).await;
            self.say(&review_entry(entry)).await;
        }

        SessionOutcome::ListReviewed {
            entries: entries.len(),
        }
    }

    async fn capture_item(&self, requestor: String) -> SessionOutcome {
        self.transition(SessionPhase::AwaitingItem);
        self.say(&item_prompt(&requestor)).await;
        pause(self.timing.settle_delay).await;

        let heard = self.items.listen_once().await;
        let Some(item) = heard.accepted_text() else {
            if let RecognitionOutcome::EngineFailure(reason) = &heard {
                tracing::warn!(stage = ?Stage::Item, reason = %reason, "recognition failed");
                self.say(HEARING_FAILURE).await;
                return SessionOutcome::EngineFailure { stage: Stage::Item };
            }
            tracing::info!(requestor = %requestor, ?heard, "item not understood");
            self.say(ITEM_NOT_UNDERSTOOD).await;
            return SessionOutcome::ItemNotUnderstood { requestor };
        };

        let entry = self.lock().wishlist.append(requestor, item).clone();
        tracing::info!(requestor = entry.requestor(), item = entry.item(), "item added");

        self.say(&confirmation(&entry)).await;
        SessionOutcome::ItemAdded(entry)
    }

    fn transition(&self, phase: SessionPhase) {
        self.lock().phase = phase;
        tracing::debug!(%phase, "session transition");
    }

    /// Speak, logging rather than propagating failure
    async fn say(&self, text: &str) {
        if let Err(e) = self.announcer.speak(text).await {
            tracing::warn!(error = %e, text, "announcement failed");
        }
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

async fn pause(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}
