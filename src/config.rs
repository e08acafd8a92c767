//! Configuration management for the kiosk
//!
//! Settings come from a TOML file, then environment overrides. API keys are
//! only ever read from the environment.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::session::Timing;
use crate::speech::{SpeechConstraintSet, validate_roster};
use crate::voice::{SttProvider, TtsProvider};
use crate::wake::WakeSourceKind;
use crate::{Error, Result};

/// Config file name looked up in the platform config directory
pub const CONFIG_FILE_NAME: &str = "kiosk.toml";

/// Kiosk configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Recognizable speakers; the first is the administrator
    pub roster: Vec<String>,

    /// Topic hint for open-vocabulary item capture
    pub item_topic: String,

    /// Pauses between session steps
    pub timing: TimingConfig,

    /// Speech engine configuration
    pub voice: VoiceConfig,

    /// Wake trigger configuration
    pub wake: WakeConfig,

    /// API keys (environment only)
    #[serde(skip)]
    pub api_keys: ApiKeys,

    /// File the configuration was loaded from, if any
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

/// Session pacing, in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TimingConfig {
    /// Pause between the wake and the wake prompt
    pub wake_delay_ms: u64,
    /// Pause between a prompt and the following listen
    pub settle_delay_ms: u64,
    /// Pause before each entry during review
    pub pacing_delay_ms: u64,
}

/// Speech engine configuration
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VoiceConfig {
    /// STT backend
    pub stt_provider: SttProvider,

    /// STT model (e.g. `whisper-1`, `nova-2`)
    pub stt_model: String,

    /// TTS backend
    pub tts_provider: TtsProvider,

    /// TTS model (e.g. `tts-1`, `eleven_monolingual_v1`)
    pub tts_model: String,

    /// TTS voice name or id
    pub tts_voice: String,

    /// TTS speed multiplier (0.25 to 4.0)
    pub tts_speed: f32,

    /// Longest a single listen may run
    pub listen_timeout_ms: u64,
}

/// Wake trigger configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WakeConfig {
    /// Which trigger to use
    pub source: WakeSourceKind,

    /// GPIO line for the push button
    pub gpio_pin: u32,

    /// Button debounce window
    pub debounce_ms: u64,
}

/// API keys for external services
#[derive(Debug, Clone, Default)]
pub struct ApiKeys {
    /// `OpenAI` API key (Whisper and TTS)
    pub openai: Option<String>,

    /// `Deepgram` API key (optional STT)
    pub deepgram: Option<String>,

    /// `ElevenLabs` API key (optional TTS)
    pub elevenlabs: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            roster: vec![
                "Prasantha".to_string(),
                "Michele".to_string(),
                "Lotus".to_string(),
            ],
            item_topic: "short form web search".to_string(),
            timing: TimingConfig::default(),
            voice: VoiceConfig::default(),
            wake: WakeConfig::default(),
            api_keys: ApiKeys::default(),
            source: None,
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            wake_delay_ms: 2000,
            settle_delay_ms: 2000,
            pacing_delay_ms: 4000,
        }
    }
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            stt_provider: SttProvider::Whisper,
            stt_model: "whisper-1".to_string(),
            tts_provider: TtsProvider::OpenAI,
            tts_model: "tts-1".to_string(),
            tts_voice: "alloy".to_string(),
            tts_speed: 1.0,
            listen_timeout_ms: 8000,
        }
    }
}

impl Default for WakeConfig {
    fn default() -> Self {
        Self {
            source: WakeSourceKind::Keyboard,
            gpio_pin: 5,
            debounce_ms: 50,
        }
    }
}

impl TimingConfig {
    /// Convert to the controller's pacing policy
    #[must_use]
    pub const fn timing(&self) -> Timing {
        Timing {
            wake_delay: Duration::from_millis(self.wake_delay_ms),
            settle_delay: Duration::from_millis(self.settle_delay_ms),
            pacing_delay: Duration::from_millis(self.pacing_delay_ms),
        }
    }
}

impl VoiceConfig {
    /// Listen timeout as a `Duration`
    #[must_use]
    pub const fn listen_timeout(&self) -> Duration {
        Duration::from_millis(self.listen_timeout_ms)
    }
}

impl WakeConfig {
    /// Debounce window as a `Duration`
    #[must_use]
    pub const fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

/// Platform config path, e.g. `~/.config/wishlist-kiosk/kiosk.toml` on Linux
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("dev", "kiosk", "wishlist-kiosk")
        .map(|d| d.config_dir().join(CONFIG_FILE_NAME))
}

impl Config {
    /// Load configuration
    ///
    /// Uses `path` if given, else the platform config file if it exists,
    /// else defaults. Environment overrides are applied last.
    ///
    /// # Errors
    ///
    /// Returns error if an explicit file is missing, any file fails to
    /// parse, or the result fails validation
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => match default_config_path() {
                Some(path) if path.exists() => Self::from_file(&path)?,
                _ => {
                    tracing::debug!("no config file, using defaults");
                    Self::default()
                }
            },
        };

        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML file
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or parsed
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("unable to read {}: {e}", path.display())))?;
        let mut config = Self::from_toml_str(&content)?;
        config.source = Some(path.to_path_buf());

        tracing::info!(path = %path.display(), "loaded config file");
        Ok(config)
    }

    /// Parse TOML text
    ///
    /// # Errors
    ///
    /// Returns error if the text is not a valid config
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Apply environment overrides through a lookup function
    ///
    /// # Errors
    ///
    /// Returns error if an override has an invalid value
    pub fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(roster) = var("KIOSK_ROSTER") {
            self.roster = roster
                .split(',')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(ToString::to_string)
                .collect();
        }

        if let Some(source) = var("KIOSK_WAKE_SOURCE") {
            self.wake.source = source.parse()?;
        }

        if let Some(pin) = var("KIOSK_GPIO_PIN") {
            self.wake.gpio_pin = pin
                .trim()
                .parse()
                .map_err(|_| Error::Config(format!("invalid KIOSK_GPIO_PIN: {pin}")))?;
        }

        self.api_keys = ApiKeys {
            openai: var("OPENAI_API_KEY"),
            deepgram: var("DEEPGRAM_API_KEY"),
            elevenlabs: var("ELEVENLABS_API_KEY"),
        };

        Ok(())
    }

    /// Check values a running kiosk depends on
    ///
    /// # Errors
    ///
    /// Returns error describing the first invalid setting
    pub fn validate(&self) -> Result<()> {
        validate_roster(&self.roster)?;

        if self.item_topic.trim().is_empty() {
            return Err(Error::Config("item_topic must not be blank".to_string()));
        }

        if !(0.25..=4.0).contains(&self.voice.tts_speed) {
            return Err(Error::Config(format!(
                "voice.tts_speed must be between 0.25 and 4.0, got {}",
                self.voice.tts_speed
            )));
        }

        if self.voice.listen_timeout_ms == 0 {
            return Err(Error::Config("voice.listen_timeout_ms must be positive".to_string()));
        }

        Ok(())
    }

    /// Vocabulary constraints for the recognizers
    ///
    /// # Errors
    ///
    /// Returns error if the roster or topic is invalid
    pub fn constraints(&self) -> Result<SpeechConstraintSet> {
        SpeechConstraintSet::new(self.roster.clone(), self.item_topic.clone())
    }

    /// API key for the configured STT provider
    ///
    /// # Errors
    ///
    /// Returns error if the key is not set
    pub fn stt_api_key(&self) -> Result<String> {
        let (key, env) = match self.voice.stt_provider {
            SttProvider::Whisper => (&self.api_keys.openai, "OPENAI_API_KEY"),
            SttProvider::Deepgram => (&self.api_keys.deepgram, "DEEPGRAM_API_KEY"),
        };
        key.clone()
            .ok_or_else(|| Error::Config(format!("{env} is required for speech recognition")))
    }

    /// API key for the configured TTS provider
    ///
    /// # Errors
    ///
    /// Returns error if the key is not set
    pub fn tts_api_key(&self) -> Result<String> {
        let (key, env) = match self.voice.tts_provider {
            TtsProvider::OpenAI => (&self.api_keys.openai, "OPENAI_API_KEY"),
            TtsProvider::ElevenLabs => (&self.api_keys.elevenlabs, "ELEVENLABS_API_KEY"),
        };
        key.clone()
            .ok_or_else(|| Error::Config(format!("{env} is required for speech output")))
    }
}
