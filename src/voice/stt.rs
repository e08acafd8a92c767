//! Speech-to-text (STT) processing

use serde::Deserialize;

use crate::{Error, Result};

/// Verbose response from `OpenAI` Whisper transcription API
#[derive(Deserialize)]
struct WhisperResponse {
    text: String,
    #[serde(default)]
    segments: Vec<WhisperSegment>,
}

#[derive(Deserialize)]
struct WhisperSegment {
    avg_logprob: f32,
    #[serde(default)]
    no_speech_prob: f32,
}

/// Response from Deepgram transcription API
#[derive(Deserialize)]
struct DeepgramResponse {
    results: DeepgramResults,
}

#[derive(Deserialize)]
struct DeepgramResults {
    channels: Vec<DeepgramChannel>,
}

#[derive(Deserialize)]
struct DeepgramChannel {
    alternatives: Vec<DeepgramAlternative>,
}

#[derive(Deserialize)]
struct DeepgramAlternative {
    transcript: String,
    #[serde(default)]
    confidence: f32,
}

/// STT provider backend
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SttProvider {
    /// `OpenAI` Whisper
    Whisper,
    /// Deepgram
    Deepgram,
}

/// Text plus the engine's confidence in it
#[derive(Debug, Clone, PartialEq)]
pub struct Transcript {
    /// Recognized text, trimmed
    pub text: String,
    /// Engine confidence in `[0, 1]`
    pub score: f32,
}

/// Vocabulary bias passed along with the audio
#[derive(Debug, Clone, Copy, Default)]
pub struct SttHint<'a> {
    /// Free-text context (Whisper `prompt`)
    pub prompt: Option<&'a str>,
    /// Words to boost (Deepgram `keywords`)
    pub keywords: &'a [String],
}

/// Transcribes speech to text
pub struct SpeechToText {
    client: reqwest::Client,
    api_key: String,
    model: String,
    provider: SttProvider,
}

impl SpeechToText {
    /// Create a new STT instance for the given provider
    ///
    /// # Errors
    ///
    /// Returns error if API key is missing
    pub fn new(provider: SttProvider, api_key: String, model: String) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::Config(format!("{provider:?} API key required for STT")));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            model,
            provider,
        })
    }

    /// Which backend this instance talks to
    #[must_use]
    pub const fn provider(&self) -> SttProvider {
        self.provider
    }

    /// Transcribe WAV audio to text
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the provider reports an error
    pub async fn transcribe(&self, audio: &[u8], hint: SttHint<'_>) -> Result<Transcript> {
        match self.provider {
            SttProvider::Whisper => self.transcribe_whisper(audio, hint).await,
            SttProvider::Deepgram => self.transcribe_deepgram(audio, hint).await,
        }
    }

    /// Transcribe using `OpenAI` Whisper
    async fn transcribe_whisper(&self, audio: &[u8], hint: SttHint<'_>) -> Result<Transcript> {
        tracing::debug!(audio_bytes = audio.len(), "starting Whisper transcription");

        let mut form = reqwest::multipart::Form::new()
            .part(
                "file",
                reqwest::multipart::Part::bytes(audio.to_vec())
                    .file_name("audio.wav")
                    .mime_str("audio/wav")
                    .map_err(|e| Error::Stt(e.to_string()))?,
            )
            .text("model", self.model.clone())
            .text("response_format", "verbose_json");

        if let Some(prompt) = hint.prompt {
            form = form.text("prompt", prompt.to_string());
        }

        let response = self
            .client
            .post("https://api.openai.com/v1/audio/transcriptions")
            .header("Authorization", format!("Bearer {}", self.api_key))
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Whisper request failed");
                e
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "Whisper API error");
            return Err(Error::Stt(format!("Whisper API error {status}: {body}")));
        }

        let result: WhisperResponse = response.json().await?;
        let transcript = Transcript {
            text: result.text.trim().to_string(),
            score: whisper_score(&result.segments),
        };

        tracing::info!(
            transcript = %transcript.text,
            score = transcript.score,
            "transcription complete"
        );
        Ok(transcript)
    }

    /// Transcribe using Deepgram
    async fn transcribe_deepgram(&self, audio: &[u8], hint: SttHint<'_>) -> Result<Transcript> {
        tracing::debug!(audio_bytes = audio.len(), "starting Deepgram transcription");

        let mut query = vec![
            ("model", self.model.clone()),
            ("punctuate", "true".to_string()),
        ];
        query.extend(hint.keywords.iter().map(|k| ("keywords", format!("{k}:2"))));

        let response = self
            .client
            .post("https://api.deepgram.com/v1/listen")
            .query(&query)
            .header("Authorization", format!("Token {}", self.api_key))
            .header("Content-Type", "audio/wav")
            .body(audio.to_vec())
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Deepgram request failed");
                e
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "Deepgram API error");
            return Err(Error::Stt(format!("Deepgram API error {status}: {body}")));
        }

        let result: DeepgramResponse = response.json().await?;
        let transcript = result
            .results
            .channels
            .into_iter()
            .next()
            .and_then(|c| c.alternatives.into_iter().next())
            .map_or_else(
                || Transcript {
                    text: String::new(),
                    score: 0.0,
                },
                |a| Transcript {
                    text: a.transcript.trim().to_string(),
                    score: a.confidence,
                },
            );

        tracing::info!(
            transcript = %transcript.text,
            score = transcript.score,
            "transcription complete"
        );
        Ok(transcript)
    }
}

/// Collapse Whisper segment statistics into a single score
///
/// Each segment contributes `exp(avg_logprob)` discounted by its
/// no-speech probability.
#[allow(clippy::cast_precision_loss)]
fn whisper_score(segments: &[WhisperSegment]) -> f32 {
    if segments.is_empty() {
        return 0.0;
    }

    let total: f32 = segments
        .iter()
        .map(|s| s.avg_logprob.exp() * (1.0 - s.no_speech_prob.clamp(0.0, 1.0)))
        .sum();
    (total / segments.len() as f32).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_api_key_rejected() {
        assert!(
            SpeechToText::new(SttProvider::Whisper, String::new(), "whisper-1".into()).is_err()
        );
    }

    #[test]
    fn test_whisper_score_from_segments() {
        let body = r#"{
            "text": " Lego set ",
            "segments": [
                {"avg_logprob": 0.0, "no_speech_prob": 0.0},
                {"avg_logprob": -0.6931472, "no_speech_prob": 0.0}
            ]
        }"#;
        let parsed: WhisperResponse = serde_json::from_str(body).unwrap();
        let score = whisper_score(&parsed.segments);
        assert!((score - 0.75).abs() < 1e-4);
    }

    #[test]
    fn test_whisper_score_penalizes_silence() {
        let segments = vec![WhisperSegment { avg_logprob: 0.0, no_speech_prob: 0.9 }];
        assert!(whisper_score(&segments) < 0.2);
        assert!(whisper_score(&[]).abs() < f32::EPSILON);
    }
}
