//! Audio sinks.
//!
//! [`AudioSink::play`] is blocking: it returns once the utterance has been
//! handed to the device and drained, so the frame loop naturally waits for
//! speech to finish before reading the next frame.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use thiserror::Error;

use super::buffer::AudioBuffer;
use super::resample::{mono_to_interleaved, resample};

// ---------------------------------------------------------------------------
// PlaybackError
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum PlaybackError {
    #[error("no output device found on the default audio host")]
    NoDevice,

    #[error("failed to query default output config: {0}")]
    DefaultConfig(#[from] cpal::DefaultStreamConfigError),

    #[error("failed to build output stream: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),

    #[error("failed to start audio stream: {0}")]
    PlayStream(#[from] cpal::PlayStreamError),
}

// ---------------------------------------------------------------------------
// AudioSink trait
// ---------------------------------------------------------------------------

/// Object-safe interface for blocking audio output.
pub trait AudioSink: Send {
    fn play(&mut self, audio: &AudioBuffer) -> Result<(), PlaybackError>;
}

const _: fn() = || {
    fn _assert_object_safe(_: Box<dyn AudioSink>) {}
};

// ---------------------------------------------------------------------------
// CpalSink
// ---------------------------------------------------------------------------

/// Extra wait after the expected duration before giving up on a stream.
const DRAIN_GRACE: Duration = Duration::from_millis(500);
const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Plays through the system default output device.
///
/// Only the stream configuration is kept between calls; the device handle
/// is looked up again for every utterance, so the sink stays `Send` and
/// follows default-device changes.
pub struct CpalSink {
    config: cpal::StreamConfig,
    device_rate: u32,
    channels: u16,
}

impl CpalSink {
    /// Query the default output device.  Fails at startup when none exists.
    pub fn new() -> Result<Self, PlaybackError> {
        let host = cpal::default_host();
        let device = host.default_output_device().ok_or(PlaybackError::NoDevice)?;
        let supported = device.default_output_config()?;

        let device_rate = supported.sample_rate().0;
        let channels = supported.channels();
        log::info!(
            "audio output: {} @ {device_rate} Hz, {channels} ch",
            device.name().unwrap_or_else(|_| "unknown".into())
        );

        Ok(Self {
            config: supported.into(),
            device_rate,
            channels,
        })
    }
}

impl AudioSink for CpalSink {
    fn play(&mut self, audio: &AudioBuffer) -> Result<(), PlaybackError> {
        if audio.is_empty() {
            return Ok(());
        }

        let device = cpal::default_host()
            .default_output_device()
            .ok_or(PlaybackError::NoDevice)?;

        let mono = resample(&audio.samples, audio.sample_rate, self.device_rate);
        let frames = mono.len();
        let data = Arc::new(mono_to_interleaved(&mono, self.channels));
        let position = Arc::new(AtomicUsize::new(0));
        let finished = Arc::new(AtomicBool::new(false));

        let stream = {
            let data = Arc::clone(&data);
            let position = Arc::clone(&position);
            let finished = Arc::clone(&finished);
            device.build_output_stream(
                &self.config,
                move |out: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    let start = position.load(Ordering::Relaxed);
                    let available = data.len().saturating_sub(start);
                    let n = available.min(out.len());
                    out[..n].copy_from_slice(&data[start..start + n]);
                    out[n..].fill(0.0);
                    position.store(start + n, Ordering::Relaxed);
                    if n < out.len() {
                        finished.store(true, Ordering::Release);
                    }
                },
                |err: cpal::StreamError| {
                    log::error!("cpal output stream error: {err}");
                },
                None,
            )?
        };
        stream.play()?;

        let rate = u64::from(self.device_rate.max(1));
        let expected = Duration::from_millis(frames as u64 * 1_000 / rate);
        let deadline = Instant::now() + expected + DRAIN_GRACE;
        while !finished.load(Ordering::Acquire) {
            if Instant::now() > deadline {
                log::warn!("playback did not drain within {:?}", expected + DRAIN_GRACE);
                break;
            }
            std::thread::sleep(POLL_INTERVAL);
        }

        drop(stream);
        log::debug!("played {frames} frames");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// NullSink
// ---------------------------------------------------------------------------

/// Discards audio.  Used when playback is disabled.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl AudioSink for NullSink {
    fn play(&mut self, _audio: &AudioBuffer) -> Result<(), PlaybackError> {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// WavRecorderSink
// ---------------------------------------------------------------------------

/// Writes every utterance to `dir/utterance-NNNN.wav` and then forwards it
/// to the wrapped sink.  A write failure is logged and playback proceeds.
pub struct WavRecorderSink {
    inner: Box<dyn AudioSink>,
    dir: PathBuf,
    count: usize,
}

impl WavRecorderSink {
    pub fn new(inner: Box<dyn AudioSink>, dir: impl Into<PathBuf>) -> Self {
        Self {
            inner,
            dir: dir.into(),
            count: 0,
        }
    }

    /// Number of utterances seen so far (including failed writes).
    pub fn count(&self) -> usize {
        self.count
    }
}

impl AudioSink for WavRecorderSink {
    fn play(&mut self, audio: &AudioBuffer) -> Result<(), PlaybackError> {
        self.count += 1;
        let path = self.dir.join(format!("utterance-{:04}.wav", self.count));
        match write_wav(&path, audio) {
            Ok(()) => log::debug!("recorded {}", path.display()),
            Err(e) => log::warn!("cannot record {}: {e}", path.display()),
        }
        self.inner.play(audio)
    }
}

/// Write `audio` as 16-bit PCM mono.
pub fn write_wav(path: &Path, audio: &AudioBuffer) -> Result<(), hound::Error> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: audio.sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec)?;
    for &s in &audio.samples {
        writer.write_sample((s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16)?;
    }
    writer.finalize()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
