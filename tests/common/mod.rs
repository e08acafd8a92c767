//! Shared test utilities

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;
use tokio::time::Instant;

use wishlist_kiosk::{
    Announcer, Confidence, Error, RecognitionOutcome, Recognizer, Result, SessionController,
    SpeechConstraintSet, Timing,
};

/// Roster used by the integration tests; the first name is the administrator
pub const ADMIN: &str = "Admin";
pub const BOB: &str = "Bob";

/// A trusted recognition result
pub fn heard(text: &str) -> RecognitionOutcome {
    heard_with(text, Confidence::High)
}

/// A recognition result at a given engine confidence
pub fn heard_with(text: &str, confidence: Confidence) -> RecognitionOutcome {
    RecognitionOutcome::Recognized {
        text: text.to_string(),
        confidence,
    }
}

/// An untrusted recognition result
pub fn mumbled(text: &str) -> RecognitionOutcome {
    RecognitionOutcome::LowConfidence {
        text: text.to_string(),
    }
}

/// A failed recognition
pub fn engine_failure() -> RecognitionOutcome {
    RecognitionOutcome::EngineFailure("microphone unplugged".to_string())
}

/// Recognizer that replays a fixed script of outcomes
pub struct ScriptedRecognizer {
    name: &'static str,
    script: Mutex<VecDeque<RecognitionOutcome>>,
    listens: AtomicUsize,
    listened_at: Mutex<Vec<Instant>>,
    fail_configure: bool,
    gate: Option<Arc<Notify>>,
    started: Arc<Notify>,
}

impl ScriptedRecognizer {
    pub fn new(name: &'static str, script: impl IntoIterator<Item = RecognitionOutcome>) -> Self {
        Self {
            name,
            script: Mutex::new(script.into_iter().collect()),
            listens: AtomicUsize::new(0),
            listened_at: Mutex::new(Vec::new()),
            fail_configure: false,
            gate: None,
            started: Arc::new(Notify::new()),
        }
    }

    /// `configure` fails with a constraint compilation error
    pub fn failing_configure(mut self) -> Self {
        self.fail_configure = true;
        self
    }

    /// Every `listen_once` waits for `gate` before answering
    pub fn gated(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    /// Signalled each time a listen begins
    pub fn started(&self) -> Arc<Notify> {
        Arc::clone(&self.started)
    }

    /// Number of `listen_once` calls so far
    pub fn listens(&self) -> usize {
        self.listens.load(Ordering::SeqCst)
    }

    /// When each `listen_once` began
    pub fn listened_at(&self) -> Vec<Instant> {
        self.listened_at.lock().unwrap().clone()
    }
}

#[async_trait]
impl Recognizer for ScriptedRecognizer {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn configure(&self) -> Result<()> {
        if self.fail_configure {
            return Err(Error::ConstraintCompilation {
                recognizer: self.name,
                reason: "grammar rejected".to_string(),
            });
        }
        Ok(())
    }

    async fn listen_once(&self) -> RecognitionOutcome {
        self.listens.fetch_add(1, Ordering::SeqCst);
        self.listened_at.lock().unwrap().push(Instant::now());
        self.started.notify_one();

        if let Some(gate) = &self.gate {
            gate.notified().await;
        }

        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| RecognitionOutcome::EngineFailure("script exhausted".to_string()))
    }
}

/// Announcer that records everything it is asked to say
#[derive(Default)]
pub struct RecordingAnnouncer {
    spoken: Mutex<Vec<(Instant, String)>>,
    fail: bool,
}

impl RecordingAnnouncer {
    /// Records each phrase, then reports a playback failure
    pub fn failing() -> Self {
        Self {
            spoken: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn spoken(&self) -> Vec<String> {
        self.spoken
            .lock()
            .unwrap()
            .iter()
            .map(|(_, text)| text.clone())
            .collect()
    }

    /// Everything said, with when it was said
    pub fn spoken_at(&self) -> Vec<(Instant, String)> {
        self.spoken.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.spoken.lock().unwrap().clear();
    }
}

#[async_trait]
impl Announcer for RecordingAnnouncer {
    async fn speak(&self, text: &str) -> Result<()> {
        self.spoken
            .lock()
            .unwrap()
            .push((Instant::now(), text.to_string()));
        if self.fail {
            return Err(Error::Tts("speaker unplugged".to_string()));
        }
        Ok(())
    }
}

/// A controller wired to fakes, plus handles to inspect them
pub struct Harness {
    pub controller: Arc<SessionController>,
    pub names: Arc<ScriptedRecognizer>,
    pub items: Arc<ScriptedRecognizer>,
    pub announcer: Arc<RecordingAnnouncer>,
}

/// Build a controller over `Admin` and `Bob` with no pauses
pub fn harness(names: ScriptedRecognizer, items: ScriptedRecognizer) -> Harness {
    harness_with_announcer(names, items, RecordingAnnouncer::default())
}

pub fn harness_with_announcer(
    names: ScriptedRecognizer,
    items: ScriptedRecognizer,
    announcer: RecordingAnnouncer,
) -> Harness {
    build(names, items, announcer, Timing::immediate())
}

/// Build a controller with real pauses
pub fn harness_with_timing(
    names: ScriptedRecognizer,
    items: ScriptedRecognizer,
    timing: Timing,
) -> Harness {
    build(names, items, RecordingAnnouncer::default(), timing)
}

fn build(
    names: ScriptedRecognizer,
    items: ScriptedRecognizer,
    announcer: RecordingAnnouncer,
    timing: Timing,
) -> Harness {
    let constraints =
        SpeechConstraintSet::new(vec![ADMIN.to_string(), BOB.to_string()], "short form web search")
            .expect("valid roster");

    let names = Arc::new(names);
    let items = Arc::new(items);
    let announcer = Arc::new(announcer);

    let controller = SessionController::new(
        constraints,
        names.clone(),
        items.clone(),
        announcer.clone(),
        timing,
    );

    Harness {
        controller: Arc::new(controller),
        names,
        items,
        announcer,
    }
}

/// Build and prepare a controller
pub async fn ready_harness(names: ScriptedRecognizer, items: ScriptedRecognizer) -> Harness {
    let harness = harness(names, items);
    harness.controller.prepare().await.expect("prepare");
    harness
}
