//! Energy-based endpointing for a single spoken utterance
//!
//! A listen starts in `Waiting`, moves to `Speaking` on the first loud chunk
//! and to `Complete` once enough speech is followed by enough silence.

/// Minimum RMS energy treated as speech
const ENERGY_THRESHOLD: f32 = 0.03;

/// Minimum speech length before an utterance can end (0.3s at 16kHz)
const MIN_SPEECH_SAMPLES: usize = 4800;

/// Trailing silence that ends an utterance (0.5s at 16kHz)
const SILENCE_SAMPLES: usize = 8000;

/// Where the detector is within one utterance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UtteranceState {
    /// No speech heard yet
    Waiting,
    /// Speech in progress
    Speaking,
    /// Speech followed by trailing silence
    Complete,
}

/// Accumulates microphone chunks until one utterance has been spoken
#[derive(Debug)]
pub struct UtteranceDetector {
    state: UtteranceState,
    speech_buffer: Vec<f32>,
    silence_counter: usize,
}

impl Default for UtteranceDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl UtteranceDetector {
    /// Create a detector waiting for speech
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: UtteranceState::Waiting,
            speech_buffer: Vec::new(),
            silence_counter: 0,
        }
    }

    /// Feed a chunk of samples; returns true once the utterance is complete
    pub fn process(&mut self, samples: &[f32]) -> bool {
        if samples.is_empty() {
            return self.is_complete();
        }

        let energy = calculate_energy(samples);
        let is_speech = energy > ENERGY_THRESHOLD;

        match self.state {
            UtteranceState::Waiting => {
                if is_speech {
                    self.state = UtteranceState::Speaking;
                    self.speech_buffer.extend_from_slice(samples);
                    self.silence_counter = 0;
                    tracing::trace!(energy, "speech started");
                }
            }
            UtteranceState::Speaking => {
                self.speech_buffer.extend_from_slice(samples);

                if is_speech {
                    self.silence_counter = 0;
                } else {
                    self.silence_counter += samples.len();
                }

                if self.silence_counter > SILENCE_SAMPLES {
                    if self.speech_buffer.len() > MIN_SPEECH_SAMPLES + self.silence_counter {
                        tracing::debug!(samples = self.speech_buffer.len(), "utterance complete");
                        self.state = UtteranceState::Complete;
                    } else {
                        // A click or cough, keep waiting for real speech
                        tracing::trace!("speech too short, resetting");
                        self.reset();
                    }
                }
            }
            UtteranceState::Complete => {}
        }

        self.is_complete()
    }

    /// Whether speech has been followed by trailing silence
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.state == UtteranceState::Complete
    }

    /// Whether any speech has been heard yet
    #[must_use]
    pub fn heard_speech(&self) -> bool {
        self.state != UtteranceState::Waiting
    }

    /// Current state
    #[must_use]
    pub const fn state(&self) -> UtteranceState {
        self.state
    }

    /// Take the captured audio and reset to `Waiting`
    pub fn take_speech_buffer(&mut self) -> Vec<f32> {
        let samples = std::mem::take(&mut self.speech_buffer);
        self.reset();
        samples
    }

    /// Reset to `Waiting`, discarding audio
    pub fn reset(&mut self) {
        self.state = UtteranceState::Waiting;
        self.speech_buffer.clear();
        self.silence_counter = 0;
    }
}

/// RMS energy of audio samples
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn calculate_energy(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }

    let sum_squares: f32 = samples.iter().map(|s| s * s).sum();
    (sum_squares / samples.len() as f32).sqrt()
}
