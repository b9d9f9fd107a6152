//! Microphone capture — cpal input stream with energy-based phrase detection.
//!
//! The stream is opened per capture attempt and dropped on every exit path,
//! so the device is never held between activations.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, SampleRate, StreamConfig};
use thiserror::Error;

use crate::config::AudioConfig;

/// One captured phrase, mono f32 samples.
pub struct Clip {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

/// Capture failure taxonomy. `Timeout` means no speech started within the
/// listen window; everything else lands in `Other`.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("listening timed out")]
    Timeout,
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Trait for microphone sources.
pub trait AudioSource: Send + Sync {
    /// Record one phrase: wait for speech onset (bounded by the listen
    /// timeout), then capture until trailing silence or the phrase cap.
    fn capture(&self) -> Result<Clip, CaptureError>;
    /// Human-readable name for logs.
    fn name(&self) -> &str;
}

// ── cpal implementation ────────────────────────────────────────────────────

/// Captures from the default (or pattern-matched) cpal input device.
pub struct CpalSource {
    cfg: AudioConfig,
}

impl CpalSource {
    pub fn new(cfg: AudioConfig) -> Self {
        Self { cfg }
    }

    /// Poll the shared buffer in 50 ms analysis windows until a full phrase
    /// is in hand. Three outcomes: no onset before the listen deadline
    /// (timeout), trailing silence after speech, or the phrase cap.
    fn wait_for_phrase(
        &self,
        buffer: &Mutex<Vec<f32>>,
        sample_rate: u32,
    ) -> Result<Vec<f32>, CaptureError> {
        let window = (sample_rate as usize / 20).max(1);
        let listen_deadline =
            Instant::now() + Duration::from_secs(self.cfg.listen_timeout_secs);
        let silence_windows = (self.cfg.silence_hold_ms / 50).max(1) as usize;
        let max_samples = self.cfg.max_phrase_secs as usize * sample_rate as usize;

        let mut cursor = 0usize;
        let mut onset: Option<usize> = None;
        let mut quiet_run = 0usize;

        loop {
            std::thread::sleep(Duration::from_millis(50));
            let buf = buffer.lock().unwrap();

            while buf.len() - cursor >= window {
                let speech = rms(&buf[cursor..cursor + window]) > self.cfg.energy_threshold;
                cursor += window;
                match onset {
                    None if speech => {
                        // keep one window of pre-roll so the phrase start isn't clipped
                        onset = Some(cursor.saturating_sub(2 * window));
                    }
                    None => {}
                    Some(_) if speech => quiet_run = 0,
                    Some(start) => {
                        quiet_run += 1;
                        if quiet_run >= silence_windows {
                            return Ok(buf[start..cursor].to_vec());
                        }
                    }
                }
            }

            match onset {
                None if Instant::now() >= listen_deadline => {
                    return Err(CaptureError::Timeout);
                }
                Some(start) if cursor - start >= max_samples => {
                    log::debug!("Phrase cap reached at {}s", self.cfg.max_phrase_secs);
                    return Ok(buf[start..cursor].to_vec());
                }
                _ => {}
            }
        }
    }
}

impl AudioSource for CpalSource {
    fn capture(&self) -> Result<Clip, CaptureError> {
        let (device, stream_config, actual_rate, channels) =
            resolve_input_device(&self.cfg.device_pattern, self.cfg.sample_rate)?;

        let device_name = device.name().unwrap_or_else(|_| "<unknown>".into());
        log::info!("Capture device: {device_name} ({actual_rate}Hz, {channels}ch)");

        let buffer = Arc::new(Mutex::new(Vec::<f32>::new()));
        let buffer_cb = Arc::clone(&buffer);
        let stream = device
            .build_input_stream(
                &stream_config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    let mut buf = buffer_cb.lock().unwrap();
                    if channels <= 1 {
                        buf.extend_from_slice(data);
                    } else {
                        buf.extend(downmix_to_mono(data, channels));
                    }
                },
                |err| log::error!("Capture stream error: {err}"),
                None,
            )
            .context("Failed to build audio input stream")?;
        stream.play().context("Failed to start audio stream")?;

        let result = self.wait_for_phrase(&buffer, actual_rate);

        // Release the device before handing the clip on.
        drop(stream);

        result.map(|samples| Clip {
            samples,
            sample_rate: actual_rate,
        })
    }

    fn name(&self) -> &str {
        "cpal"
    }
}

// ── Device / signal helpers ────────────────────────────────────────────────

/// Pick an input device (by substring pattern, else the default) and build a
/// mono `StreamConfig` at the requested rate, falling back to the device
/// default when that rate isn't supported.
fn resolve_input_device(
    pattern: &str,
    sample_rate: u32,
) -> Result<(Device, StreamConfig, u32, u16)> {
    let host = cpal::default_host();
    let device = if pattern.is_empty() {
        host.default_input_device()
    } else {
        let pat = pattern.to_lowercase();
        host.input_devices()
            .context("Failed to enumerate input devices")?
            .find(|d| {
                d.name()
                    .map(|n| n.to_lowercase().contains(&pat))
                    .unwrap_or(false)
            })
            .or_else(|| host.default_input_device())
    }
    .context("No input audio device found")?;

    let desired_rate = SampleRate(sample_rate);
    let stream_config: StreamConfig = match device
        .supported_input_configs()
        .context("Cannot query device input configs")?
        .find(|c| {
            c.channels() >= 1
                && c.min_sample_rate() <= desired_rate
                && desired_rate <= c.max_sample_rate()
        }) {
        Some(range) => {
            let mut sc: StreamConfig = range.with_sample_rate(desired_rate).into();
            sc.channels = 1;
            sc
        }
        None => {
            let default = device
                .default_input_config()
                .context("No default input config")?;
            log::warn!(
                "{}Hz not supported; falling back to {}Hz, {}ch",
                sample_rate,
                default.sample_rate().0,
                default.channels(),
            );
            default.into()
        }
    };

    let actual_rate = stream_config.sample_rate.0;
    let channels = stream_config.channels;
    Ok((device, stream_config, actual_rate, channels))
}

/// Downmix interleaved multi-channel audio to mono by averaging each frame.
#[inline]
fn downmix_to_mono(data: &[f32], channels: u16) -> Vec<f32> {
    let ch = channels as usize;
    data.chunks_exact(ch)
        .map(|frame| frame.iter().sum::<f32>() / ch as f32)
        .collect()
}

/// Root-mean-square energy of a chunk.
fn rms(samples: &[f32]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_sq: f64 = samples.iter().map(|&s| (s as f64) * (s as f64)).sum();
    (sum_sq / samples.len() as f64).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn silence_is_below_threshold() {
        let silence = vec![0.0f32; 1600];
        assert!(rms(&silence) <= 0.015);
    }

    #[test]
    fn loud_signal_is_above_threshold() {
        let loud = vec![0.5f32; 1600];
        assert!(rms(&loud) > 0.015);
    }

    #[test]
    fn empty_buffer_has_zero_energy() {
        assert_eq!(rms(&[]), 0.0);
    }

    #[test]
    fn rms_of_constant_signal_is_its_amplitude() {
        let at = vec![0.1f32; 1600];
        assert!((rms(&at) - 0.1).abs() < 1e-6);
    }

    #[test]
    fn sine_wave_has_speech_level_energy() {
        let samples: Vec<f32> = (0..1600)
            .map(|i| 0.3 * (2.0 * std::f32::consts::PI * 440.0 * i as f32 / 16000.0).sin())
            .collect();
        assert!(rms(&samples) > 0.015);
    }

    #[test]
    fn downmix_averages_stereo_frames() {
        let stereo = [0.2f32, 0.4, -0.2, -0.4];
        let mono = downmix_to_mono(&stereo, 2);
        assert_eq!(mono.len(), 2);
        assert!((mono[0] - 0.3).abs() < 1e-6);
        assert!((mono[1] + 0.3).abs() < 1e-6);
    }
}
