//! Voice processing module
//!
//! Microphone capture with utterance endpointing, speaker playback, and the
//! cloud STT/TTS clients the concrete recognizer and announcer are built on.

mod capture;
mod playback;
mod stt;
mod tts;
mod utterance;

pub use capture::{AudioCapture, SAMPLE_RATE, probe_input, record_utterance, samples_to_wav};
pub use playback::{AudioPlayback, DecodedAudio, PLAYBACK_SAMPLE_RATE, decode_mp3, resample};
pub use stt::{SpeechToText, SttHint, SttProvider, Transcript};
pub use tts::{TextToSpeech, TtsProvider};
pub use utterance::{UtteranceDetector, UtteranceState, calculate_energy};
