//! Single-shot speech recognition

use std::time::Duration;

use async_trait::async_trait;

use super::{Confidence, RecognitionOutcome, SpeechConstraintSet, validate_roster};
use crate::voice::{
    SAMPLE_RATE, SpeechToText, SttHint, Transcript, probe_input, record_utterance, samples_to_wav,
};
use crate::{Error, Result};

/// A speech-to-text capability that listens for exactly one utterance
///
/// Callers must not overlap `listen_once` calls; the session controller
/// guarantees this across both recognizers.
#[async_trait]
pub trait Recognizer: Send + Sync {
    /// Short label used in logs and errors
    fn name(&self) -> &'static str;

    /// Prepare the recognizer's constraints
    ///
    /// Must succeed before `listen_once` is called.
    ///
    /// # Errors
    ///
    /// Returns `Error::ConstraintCompilation` if the recognizer cannot be used
    async fn configure(&self) -> Result<()>;

    /// Listen for one utterance and report what was heard
    async fn listen_once(&self) -> RecognitionOutcome;
}

/// What a recognizer is allowed to hear
#[derive(Debug, Clone)]
pub enum Vocabulary {
    /// Closed vocabulary: only roster names
    Names(SpeechConstraintSet),
    /// Open vocabulary biased toward a topic
    Topic(String),
}

impl Vocabulary {
    fn check(&self) -> std::result::Result<(), String> {
        match self {
            Self::Names(set) => validate_roster(set.roster()).map_err(|e| e.to_string()),
            Self::Topic(topic) if topic.trim().is_empty() => Err("topic is blank".to_string()),
            Self::Topic(_) => Ok(()),
        }
    }

    fn prompt(&self) -> String {
        match self {
            Self::Names(set) => set.roster().join(", "),
            Self::Topic(topic) => topic.clone(),
        }
    }

    fn keywords(&self) -> Vec<String> {
        match self {
            Self::Names(set) => set.roster().to_vec(),
            Self::Topic(_) => Vec::new(),
        }
    }

    /// Turn a raw transcript into an outcome under this vocabulary
    #[must_use]
    pub fn grade(&self, transcript: Transcript) -> RecognitionOutcome {
        // Whisper ends most transcripts with sentence punctuation
        let text = transcript
            .text
            .trim_end_matches(is_trailing_punctuation)
            .to_string();

        let confidence = if text.is_empty() {
            Confidence::Rejected
        } else {
            Confidence::from_score(transcript.score)
        };

        match self {
            Self::Names(set) => match set.resolve_speaker(&text) {
                Some(name) => RecognitionOutcome::from_transcript(name, confidence),
                None => RecognitionOutcome::LowConfidence { text },
            },
            Self::Topic(_) => RecognitionOutcome::from_transcript(text, confidence),
        }
    }
}

fn is_trailing_punctuation(c: char) -> bool {
    matches!(c, '.' | '!' | '?' | ',' | ';' | ':') || c.is_whitespace()
}

/// Microphone plus cloud STT, constrained by a `Vocabulary`
pub struct CloudRecognizer {
    name: &'static str,
    vocabulary: Vocabulary,
    prompt: String,
    keywords: Vec<String>,
    stt: SpeechToText,
    listen_timeout: Duration,
}

impl CloudRecognizer {
    /// Create a recognizer; nothing is opened until `configure`
    #[must_use]
    pub fn new(
        name: &'static str,
        vocabulary: Vocabulary,
        stt: SpeechToText,
        listen_timeout: Duration,
    ) -> Self {
        let prompt = vocabulary.prompt();
        let keywords = vocabulary.keywords();
        Self {
            name,
            vocabulary,
            prompt,
            keywords,
            stt,
            listen_timeout,
        }
    }
}

#[async_trait]
impl Recognizer for CloudRecognizer {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn configure(&self) -> Result<()> {
        let fail = |reason: String| Error::ConstraintCompilation {
            recognizer: self.name,
            reason,
        };

        self.vocabulary.check().map_err(fail)?;

        tokio::task::spawn_blocking(probe_input)
            .await
            .map_err(|e| fail(format!("device probe task failed: {e}")))?
            .map_err(|e| fail(e.to_string()))?;

        tracing::debug!(
            recognizer = self.name,
            provider = ?self.stt.provider(),
            "recognizer configured"
        );
        Ok(())
    }

    async fn listen_once(&self) -> RecognitionOutcome {
        let timeout = self.listen_timeout;
        let samples = match tokio::task::spawn_blocking(move || record_utterance(timeout)).await {
            Ok(Ok(samples)) => samples,
            Ok(Err(e)) => return RecognitionOutcome::EngineFailure(e.to_string()),
            Err(e) => {
                return RecognitionOutcome::EngineFailure(format!("capture task failed: {e}"));
            }
        };

        if samples.is_empty() {
            tracing::debug!(recognizer = self.name, "no speech heard");
            return RecognitionOutcome::LowConfidence {
                text: String::new(),
            };
        }

        let wav = match samples_to_wav(&samples, SAMPLE_RATE) {
            Ok(wav) => wav,
            Err(e) => return RecognitionOutcome::EngineFailure(e.to_string()),
        };

        let hint = SttHint {
            prompt: Some(self.prompt.as_str()),
            keywords: &self.keywords,
        };

        match self.stt.transcribe(&wav, hint).await {
            Ok(transcript) => self.vocabulary.grade(transcript),
            Err(e) => RecognitionOutcome::EngineFailure(e.to_string()),
        }
    }
}
