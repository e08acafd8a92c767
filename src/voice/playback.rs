//! Audio playback to speakers

use std::io::Cursor;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, SampleRate, StreamConfig};

use crate::{Error, Result};

/// Sample rate for playback (matches common TTS output)
pub const PLAYBACK_SAMPLE_RATE: u32 = 24000;

/// Grace period past the expected duration before giving up on the device
const PLAYBACK_SLACK: Duration = Duration::from_millis(500);

/// Input frames fed to the resampler per call
const RESAMPLE_CHUNK: usize = 1024;

/// Plays audio to the default output device
///
/// Holds the device for its lifetime; the output stream only exists for the
/// duration of a single `play_blocking` call.
pub struct AudioPlayback {
    device: Device,
    config: StreamConfig,
}

impl AudioPlayback {
    /// Open the default output device
    ///
    /// # Errors
    ///
    /// Returns error if audio device cannot be opened
    pub fn new() -> Result<Self> {
        let device = cpal::default_host()
            .default_output_device()
            .ok_or_else(|| Error::Audio("no output device available".to_string()))?;

        let rate = SampleRate(PLAYBACK_SAMPLE_RATE);
        let supports = |channels: u16| {
            device.supported_output_configs().ok()?.find(|c| {
                c.channels() == channels
                    && c.min_sample_rate() <= rate
                    && c.max_sample_rate() >= rate
            })
        };

        let supported_config = supports(1)
            .or_else(|| supports(2))
            .ok_or_else(|| Error::Audio("no suitable output config found".to_string()))?;

        let config = supported_config.with_sample_rate(rate).config();

        tracing::debug!(
            device = device.name().unwrap_or_default(),
            sample_rate = PLAYBACK_SAMPLE_RATE,
            channels = config.channels,
            "audio playback initialized"
        );

        Ok(Self { device, config })
    }

    /// Play mono f32 samples and block until they have been rendered
    ///
    /// # Errors
    ///
    /// Returns error if the output stream cannot be built or started
    pub fn play_blocking(&self, samples: Vec<f32>) -> Result<()> {
        if samples.is_empty() {
            return Ok(());
        }

        let channels = usize::from(self.config.channels);
        let sample_count = samples.len();
        let samples = Arc::new(samples);
        let position = Arc::new(AtomicUsize::new(0));
        let finished = Arc::new(AtomicBool::new(false));

        let stream = {
            let samples = Arc::clone(&samples);
            let position = Arc::clone(&position);
            let finished = Arc::clone(&finished);

            self.device
                .build_output_stream(
                    &self.config,
                    move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                        for frame in data.chunks_mut(channels) {
                            let pos = position.load(Ordering::Relaxed);
                            let sample = samples.get(pos).copied().unwrap_or_else(|| {
                                finished.store(true, Ordering::Release);
                                0.0
                            });
                            frame.fill(sample);
                            if pos < samples.len() {
                                position.store(pos + 1, Ordering::Relaxed);
                            }
                        }
                    },
                    |err| {
                        tracing::error!(error = %err, "audio playback error");
                    },
                    None,
                )
                .map_err(|e| Error::Audio(e.to_string()))?
        };

        stream.play().map_err(|e| Error::Audio(e.to_string()))?;

        let duration_ms = (sample_count as u64 * 1000) / u64::from(PLAYBACK_SAMPLE_RATE);
        let deadline = Instant::now() + Duration::from_millis(duration_ms) + PLAYBACK_SLACK;

        while !finished.load(Ordering::Acquire) {
            if Instant::now() > deadline {
                tracing::warn!(samples = sample_count, "playback did not finish in time");
                break;
            }
            std::thread::sleep(Duration::from_millis(50));
        }

        // Let the device drain its last buffer
        std::thread::sleep(Duration::from_millis(100));

        drop(stream);
        tracing::debug!(samples = sample_count, "playback complete");

        Ok(())
    }

    /// Decode MP3 bytes and play them to completion
    ///
    /// The stream is resampled to `PLAYBACK_SAMPLE_RATE` when the encoder
    /// used another rate (`ElevenLabs` defaults to 44.1 kHz).
    ///
    /// # Errors
    ///
    /// Returns error if decoding, resampling or playback fails
    pub fn play_mp3_blocking(&self, mp3_data: &[u8]) -> Result<()> {
        let decoded = decode_mp3(mp3_data)?;
        let samples = resample(decoded.samples, decoded.sample_rate, PLAYBACK_SAMPLE_RATE)?;
        self.play_blocking(samples)
    }
}

/// Mono samples together with the rate they were encoded at
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedAudio {
    /// Mono f32 samples in `[-1, 1]`
    pub samples: Vec<f32>,
    /// Sample rate of `samples` in Hz
    pub sample_rate: u32,
}

/// Decode MP3 bytes to mono f32 samples
///
/// # Errors
///
/// Returns error if the data is not valid MP3
pub fn decode_mp3(mp3_data: &[u8]) -> Result<DecodedAudio> {
    let mut decoder = minimp3::Decoder::new(Cursor::new(mp3_data));
    let mut samples = Vec::new();
    let mut sample_rate = PLAYBACK_SAMPLE_RATE;

    loop {
        match decoder.next_frame() {
            Ok(frame) => {
                sample_rate = u32::try_from(frame.sample_rate).map_err(|_| {
                    Error::Audio(format!("invalid MP3 sample rate: {}", frame.sample_rate))
                })?;
                if frame.channels == 2 {
                    samples.extend(frame.data.chunks(2).map(|chunk| {
                        let left = f32::from(chunk[0]) / 32768.0;
                        let right = f32::from(chunk.get(1).copied().unwrap_or(chunk[0])) / 32768.0;
                        f32::midpoint(left, right)
                    }));
                } else {
                    samples.extend(frame.data.iter().map(|&s| f32::from(s) / 32768.0));
                }
            }
            Err(minimp3::Error::Eof) => break,
            Err(e) => return Err(Error::Audio(format!("MP3 decode error: {e}"))),
        }
    }

    Ok(DecodedAudio {
        samples,
        sample_rate,
    })
}

/// Resample mono audio from `from_rate` to `to_rate`
///
/// The output holds `len * to_rate / from_rate` samples with the resampler
/// delay removed.
///
/// # Errors
///
/// Returns error if either rate is zero or the resampler fails
#[allow(clippy::cast_possible_truncation)]
pub fn resample(samples: Vec<f32>, from_rate: u32, to_rate: u32) -> Result<Vec<f32>> {
    use rubato::{FftFixedIn, Resampler};

    if from_rate == 0 || to_rate == 0 {
        return Err(Error::Audio(format!("cannot resample {from_rate} Hz to {to_rate} Hz")));
    }
    if from_rate == to_rate || samples.is_empty() {
        return Ok(samples);
    }

    let mut resampler =
        FftFixedIn::<f64>::new(from_rate as usize, to_rate as usize, RESAMPLE_CHUNK, 2, 1)
            .map_err(|e| Error::Audio(format!("resampler init failed: {e}")))?;

    let delay = resampler.output_delay();
    let expected = (samples.len() as u64 * u64::from(to_rate) / u64::from(from_rate)) as usize;
    let mut output: Vec<f64> = Vec::with_capacity(expected + delay);

    let chunk_size = resampler.input_frames_next();
    let input: Vec<f64> = samples.iter().map(|&s| f64::from(s)).collect();
    let mut chunks = input.chunks(chunk_size);

    // The final partial chunk is zero padded, then silence flushes the delay
    while output.len() < expected + delay {
        let mut block = chunks.next().map_or_else(Vec::new, <[f64]>::to_vec);
        block.resize(chunk_size, 0.0);

        let result = resampler
            .process(&[block], None)
            .map_err(|e| Error::Audio(format!("resample failed: {e}")))?;
        output.extend_from_slice(&result[0]);
    }

    Ok(output
        .into_iter()
        .skip(delay)
        .take(expected)
        .map(|s| s as f32)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::voice::calculate_energy;

    #[allow(clippy::cast_precision_loss)]
    fn tone(rate: u32, seconds: u32) -> Vec<f32> {
        (0..rate * seconds)
            .map(|i| (2.0 * std::f32::consts::PI * 440.0 * i as f32 / rate as f32).sin() * 0.3)
            .collect()
    }

    #[test]
    fn test_matching_rate_is_untouched() {
        let samples = tone(PLAYBACK_SAMPLE_RATE, 1);
        let out = resample(samples.clone(), PLAYBACK_SAMPLE_RATE, PLAYBACK_SAMPLE_RATE).unwrap();
        assert_eq!(out, samples);
    }

    #[test]
    fn test_elevenlabs_rate_keeps_duration() {
        let out = resample(tone(44_100, 1), 44_100, PLAYBACK_SAMPLE_RATE).unwrap();

        // One second in, one second out
        assert_eq!(out.len(), PLAYBACK_SAMPLE_RATE as usize);

        // The tone survives with roughly its original loudness
        let middle = &out[4_000..20_000];
        let energy = calculate_energy(middle);
        assert!((0.18..0.24).contains(&energy), "energy {energy}");
    }

    #[test]
    fn test_upsampling_scales_length() {
        let out = resample(tone(16_000, 1), 16_000, PLAYBACK_SAMPLE_RATE).unwrap();
        assert_eq!(out.len(), PLAYBACK_SAMPLE_RATE as usize);
    }

    #[test]
    fn test_zero_rate_is_rejected() {
        assert!(resample(vec![0.1; 64], 0, PLAYBACK_SAMPLE_RATE).is_err());
    }
}
