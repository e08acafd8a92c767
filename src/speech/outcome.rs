//! Recognition results and confidence grading

/// Engine confidence, ordered from most to least trusted
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Confidence {
    /// Strong match
    High,
    /// Acceptable match
    Medium,
    /// Heard something, but not trustworthy
    Low,
    /// Engine discarded the result
    Rejected,
}

/// Score at or above which a result is graded `High`
const HIGH_SCORE: f32 = 0.85;

/// Score at or above which a result is graded `Medium`
const MEDIUM_SCORE: f32 = 0.60;

/// Score at or above which a result is graded `Low`
const LOW_SCORE: f32 = 0.30;

impl Confidence {
    /// Grade an engine score in `[0, 1]`
    #[must_use]
    pub fn from_score(score: f32) -> Self {
        if score.is_nan() {
            Self::Rejected
        } else if score >= HIGH_SCORE {
            Self::High
        } else if score >= MEDIUM_SCORE {
            Self::Medium
        } else if score >= LOW_SCORE {
            Self::Low
        } else {
            Self::Rejected
        }
    }

    /// High and Medium are trusted; everything else is not
    #[must_use]
    pub const fn is_acceptable(self) -> bool {
        matches!(self, Self::High | Self::Medium)
    }
}

/// Result of a single `listen_once`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognitionOutcome {
    /// Engine produced text
    Recognized {
        /// Transcript (canonical roster spelling for the name stage)
        text: String,
        /// Engine confidence
        confidence: Confidence,
    },
    /// Engine produced text it does not trust
    LowConfidence {
        /// What was heard, possibly empty
        text: String,
    },
    /// Engine call failed
    EngineFailure(String),
}

impl RecognitionOutcome {
    /// Build an outcome from a transcript, demoting untrusted results
    #[must_use]
    pub fn from_transcript(text: impl Into<String>, confidence: Confidence) -> Self {
        let text = text.into();
        if confidence.is_acceptable() {
            Self::Recognized { text, confidence }
        } else {
            Self::LowConfidence { text }
        }
    }

    /// Text of a trusted result, if any
    #[must_use]
    pub fn accepted_text(&self) -> Option<&str> {
        match self {
            Self::Recognized { text, confidence } if confidence.is_acceptable() => Some(text),
            _ => None,
        }
    }
}
