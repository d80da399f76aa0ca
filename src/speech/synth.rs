//! Text → waveform synthesizers.
//!
//! [`SpeechSynthesizer`] turns a token into one [`AudioBuffer`] at 16 kHz.
//! Every implementation must accept the `"Unknown"` sentinel.
//!
//! * [`ModelSynthesizer`]: encoder/decoder projection loaded from a
//!   safetensors file, followed by a band-oscillator vocoder.  Always emits
//!   exactly one second of audio.
//! * [`ToneSynthesizer`]: needs no weights; one short tone per letter.

use std::collections::HashMap;
use std::f32::consts::PI;
use std::path::Path;

use candle_core::{DType, Device, Tensor};
use thiserror::Error;

use super::buffer::{AudioBuffer, SAMPLE_RATE};
use crate::gesture::UNKNOWN_TOKEN;

/// Samples per utterance produced by [`ModelSynthesizer`] (one second).
pub const UTTERANCE_SAMPLES: usize = SAMPLE_RATE as usize;

// ---------------------------------------------------------------------------
// SynthError
// ---------------------------------------------------------------------------

/// Errors from the speech synthesis subsystem.
#[derive(Debug, Clone, Error)]
pub enum SynthError {
    #[error("speech model not found: {0}")]
    ModelNotFound(String),

    #[error("cannot load speech model: {0}")]
    Load(String),

    #[error("speech model lacks tensor `{0}`")]
    MissingTensor(String),

    #[error("tensor `{tensor}` has shape {got:?}, expected {expected:?}")]
    ShapeMismatch {
        tensor: String,
        expected: Vec<usize>,
        got: Vec<usize>,
    },

    #[error("synthesis failed: {0}")]
    Inference(String),
}

// ---------------------------------------------------------------------------
// SpeechSynthesizer trait
// ---------------------------------------------------------------------------

/// Object-safe interface for speech synthesizers.
pub trait SpeechSynthesizer: Send {
    fn synthesize(&self, text: &str) -> Result<AudioBuffer, SynthError>;
}

const _: fn() = || {
    fn _assert_object_safe(_: Box<dyn SpeechSynthesizer>) {}
};

// ---------------------------------------------------------------------------
// ModelSynthesizer
// ---------------------------------------------------------------------------

/// Dimensions the weight file must agree with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelDims {
    pub input: usize,
    pub hidden: usize,
    pub output: usize,
}

/// Two-layer projection: characters → hidden → acoustic bands.
pub struct ModelSynthesizer {
    /// `[input, hidden]`, pre-transposed for row-major matmul.
    encoder_t: Tensor,
    /// `[hidden, output]`
    decoder_t: Tensor,
    dims: ModelDims,
    device: Device,
}

impl std::fmt::Debug for ModelSynthesizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelSynthesizer")
            .field("dims", &self.dims)
            .finish_non_exhaustive()
    }
}

impl ModelSynthesizer {
    /// Load `encoder.weight` (`[hidden, input]`) and `decoder.weight`
    /// (`[output, hidden]`) from a safetensors file.
    pub fn load(model_path: impl AsRef<Path>, dims: ModelDims) -> Result<Self, SynthError> {
        let path = model_path.as_ref();
        if !path.exists() {
            return Err(SynthError::ModelNotFound(path.display().to_string()));
        }

        let mut tensors: HashMap<String, Tensor> =
            candle_core::safetensors::load(path, &Device::Cpu)
                .map_err(|e| SynthError::Load(format!("{}: {e}", path.display())))?;
        let mut take = |name: &str| {
            tensors
                .remove(name)
                .ok_or_else(|| SynthError::MissingTensor(name.to_string()))
        };
        let encoder = take("encoder.weight")?;
        let decoder = take("decoder.weight")?;

        Self::from_tensors(encoder, decoder, dims)
    }

    /// Build from in-memory weights, validating shapes against `dims`.
    pub fn from_tensors(
        encoder: Tensor,
        decoder: Tensor,
        dims: ModelDims,
    ) -> Result<Self, SynthError> {
        if dims.input == 0 || dims.hidden == 0 || dims.output == 0 {
            return Err(SynthError::Load(format!("degenerate model dimensions {dims:?}")));
        }
        check_shape("encoder.weight", &encoder, &[dims.hidden, dims.input])?;
        check_shape("decoder.weight", &decoder, &[dims.output, dims.hidden])?;

        let prepare = |t: Tensor| {
            t.to_dtype(DType::F32)
                .and_then(|t| t.t())
                .and_then(|t| t.contiguous())
                .map_err(|e| SynthError::Load(e.to_string()))
        };
        Ok(Self {
            encoder_t: prepare(encoder)?,
            decoder_t: prepare(decoder)?,
            dims,
            device: Device::Cpu,
        })
    }

    pub fn dims(&self) -> ModelDims {
        self.dims
    }

    /// One feature row per character: the character code and its position,
    /// each hashed into the input width.
    fn text_features(&self, text: &str) -> Vec<f32> {
        let width = self.dims.input;
        let chars: Vec<char> = text.chars().collect();
        let mut features = vec![0.0_f32; chars.len() * width];
        for (i, c) in chars.iter().enumerate() {
            let row = &mut features[i * width..(i + 1) * width];
            row[*c as usize % width] += 1.0;
            row[(i * 31 + 7) % width] += 0.5;
        }
        features
    }

    /// Per-character band magnitudes in `[0, 1]`, shape `[chars, output]`.
    fn acoustic_frames(&self, text: &str) -> Result<Vec<Vec<f32>>, SynthError> {
        let rows = text.chars().count();
        let inference = |e: candle_core::Error| SynthError::Inference(e.to_string());

        let x = Tensor::from_vec(self.text_features(text), (rows, self.dims.input), &self.device)
            .map_err(inference)?;
        x.matmul(&self.encoder_t)
            .and_then(|h| h.tanh())
            .and_then(|h| h.matmul(&self.decoder_t))
            .and_then(|y| y.tanh())
            .and_then(|y| y.affine(0.5, 0.5))
            .and_then(|y| y.to_vec2::<f32>())
            .map_err(inference)
    }
}

impl SpeechSynthesizer for ModelSynthesizer {
    fn synthesize(&self, text: &str) -> Result<AudioBuffer, SynthError> {
        if text.trim().is_empty() {
            return Ok(AudioBuffer::silence(UTTERANCE_SAMPLES));
        }
        let frames = self.acoustic_frames(text)?;
        Ok(AudioBuffer::new(vocode(&frames, UTTERANCE_SAMPLES)))
    }
}

fn check_shape(name: &str, tensor: &Tensor, expected: &[usize]) -> Result<(), SynthError> {
    if tensor.dims() != expected {
        return Err(SynthError::ShapeMismatch {
            tensor: name.to_string(),
            expected: expected.to_vec(),
            got: tensor.dims().to_vec(),
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Vocoder
// ---------------------------------------------------------------------------

const LOWEST_BAND_HZ: f32 = 100.0;
const HIGHEST_BAND_HZ: f32 = 4_000.0;
const PEAK_LEVEL: f32 = 0.8;

/// Render `frames` (one per character, equal time slots) as a sum of band
/// oscillators, `total` samples long, normalised to [`PEAK_LEVEL`].
fn vocode(frames: &[Vec<f32>], total: usize) -> Vec<f32> {
    let mut out = vec![0.0_f32; total];
    if frames.is_empty() {
        return out;
    }

    let slot = total / frames.len();
    let bands = frames[0].len().max(1);
    let step = (HIGHEST_BAND_HZ / LOWEST_BAND_HZ).powf(1.0 / bands as f32);
    let freqs: Vec<f32> = (0..bands).map(|k| LOWEST_BAND_HZ * step.powi(k as i32)).collect();

    for (i, frame) in frames.iter().enumerate() {
        let start = i * slot;
        let end = if i + 1 == frames.len() { total } else { start + slot };
        for (n, sample) in out[start..end].iter_mut().enumerate() {
            let t = (start + n) as f32 / SAMPLE_RATE as f32;
            *sample = frame
                .iter()
                .zip(&freqs)
                .map(|(amp, f)| amp * (2.0 * PI * f * t).sin())
                .sum::<f32>()
                * envelope(n, end - start);
        }
    }

    let peak = out.iter().fold(0.0_f32, |m, s| m.max(s.abs()));
    if peak > f32::EPSILON {
        let gain = PEAK_LEVEL / peak;
        out.iter_mut().for_each(|s| *s *= gain);
    }
    out
}

/// Linear 5 ms fade at both ends of a slot.
fn envelope(n: usize, len: usize) -> f32 {
    let fade = (SAMPLE_RATE as usize / 200).min(len / 2).max(1);
    let from_edge = n.min(len.saturating_sub(n + 1));
    (from_edge as f32 / fade as f32).min(1.0)
}

// ---------------------------------------------------------------------------
// ToneSynthesizer
// ---------------------------------------------------------------------------

/// Model-free synthesizer: each letter becomes a short sine tone on a
/// chromatic scale starting at A3.  `"Unknown"` and empty text are silent.
#[derive(Debug, Clone)]
pub struct ToneSynthesizer {
    /// Duration of one letter in samples.
    pub letter_samples: usize,
    pub amplitude: f32,
}

impl Default for ToneSynthesizer {
    fn default() -> Self {
        Self {
            letter_samples: SAMPLE_RATE as usize / 4,
            amplitude: 0.3,
        }
    }
}

impl ToneSynthesizer {
    fn letter_frequency(c: char) -> Option<f32> {
        let c = c.to_ascii_uppercase();
        c.is_ascii_uppercase()
            .then(|| 220.0 * 2.0_f32.powf((c as u8 - b'A') as f32 / 12.0))
    }
}

impl SpeechSynthesizer for ToneSynthesizer {
    fn synthesize(&self, text: &str) -> Result<AudioBuffer, SynthError> {
        if text == UNKNOWN_TOKEN || text.trim().is_empty() {
            return Ok(AudioBuffer::silence(self.letter_samples));
        }

        let len = self.letter_samples;
        let mut samples = Vec::with_capacity(text.chars().count() * len);
        for c in text.chars() {
            match Self::letter_frequency(c) {
                Some(f) => samples.extend((0..len).map(|n| {
                    let t = n as f32 / SAMPLE_RATE as f32;
                    self.amplitude * (2.0 * PI * f * t).sin() * envelope(n, len)
                })),
                None => samples.extend(std::iter::repeat(0.0).take(len)),
            }
        }
        Ok(AudioBuffer::new(samples))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const DIMS: ModelDims = ModelDims {
        input: 16,
        hidden: 8,
        output: 6,
    };

    /// Deterministic non-trivial weights.
    fn weights(rows: usize, cols: usize, seed: u32) -> Tensor {
        let data: Vec<f32> = (0..rows * cols)
            .map(|i| {
                let h = (i as u32).wrapping_mul(2_654_435_761).wrapping_add(seed) >> 16;
                (h % 200) as f32 / 100.0 - 1.0
            })
            .collect();
        Tensor::from_vec(data, (rows, cols), &Device::Cpu).unwrap()
    }

    fn model() -> ModelSynthesizer {
        ModelSynthesizer::from_tensors(weights(8, 16, 1), weights(6, 8, 2), DIMS).unwrap()
    }

    #[test]
    fn model_emits_one_second() {
        let audio = model().synthesize("A").unwrap();
        assert_eq!(audio.sample_rate, 16_000);
        assert_eq!(audio.len(), UTTERANCE_SAMPLES);
        assert!(audio.samples.iter().all(|s| s.is_finite()));
        assert!(audio.peak() <= PEAK_LEVEL + 1e-4);
        assert!(audio.peak() > 0.0);
    }

    #[test]
    fn model_accepts_unknown_and_empty() {
        let synth = model();
        assert_eq!(synth.synthesize(UNKNOWN_TOKEN).unwrap().len(), UTTERANCE_SAMPLES);
        let empty = synth.synthesize("").unwrap();
        assert_eq!(empty.len(), UTTERANCE_SAMPLES);
        assert_eq!(empty.peak(), 0.0);
    }

    #[test]
    fn model_is_deterministic_and_token_sensitive() {
        let synth = model();
        let a1 = synth.synthesize("A").unwrap();
        let a2 = synth.synthesize("A").unwrap();
        let b = synth.synthesize("B").unwrap();
        assert_eq!(a1, a2);
        assert_ne!(a1, b);
    }

    #[test]
    fn model_rejects_mismatched_dims() {
        let err = ModelSynthesizer::from_tensors(weights(8, 16, 1), weights(6, 8, 2), ModelDims {
            output: 80,
            ..DIMS
        })
        .unwrap_err();
        assert!(matches!(
            err,
            SynthError::ShapeMismatch { ref tensor, .. } if tensor == "decoder.weight"
        ));
    }

    #[test]
    fn model_load_missing_file() {
        let result = ModelSynthesizer::load("/nonexistent/tts.safetensors", DIMS);
        assert!(matches!(result, Err(SynthError::ModelNotFound(_))));
    }

    #[test]
    fn model_load_from_safetensors() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("tts.safetensors");
        let tensors: HashMap<String, Tensor> = [
            ("encoder.weight".to_string(), weights(8, 16, 1)),
            ("decoder.weight".to_string(), weights(6, 8, 2)),
        ]
        .into();
        candle_core::safetensors::save(&tensors, &path).unwrap();

        let loaded = ModelSynthesizer::load(&path, DIMS).unwrap();
        assert_eq!(loaded.dims(), DIMS);
        assert_eq!(loaded.synthesize("C").unwrap(), model().synthesize("C").unwrap());
    }

    #[test]
    fn model_load_without_decoder() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("tts.safetensors");
        let tensors: HashMap<String, Tensor> =
            [("encoder.weight".to_string(), weights(8, 16, 1))].into();
        candle_core::safetensors::save(&tensors, &path).unwrap();
        assert!(matches!(
            ModelSynthesizer::load(&path, DIMS),
            Err(SynthError::MissingTensor(ref t)) if t == "decoder.weight"
        ));
    }

    #[test]
    fn tone_letters_have_sound_unknown_is_silent() {
        let synth = ToneSynthesizer::default();
        let a = synth.synthesize("A").unwrap();
        assert_eq!(a.len(), 4_000);
        assert!(a.peak() > 0.1);
        assert!(a.peak() <= 0.3 + 1e-6);

        let unknown = synth.synthesize(UNKNOWN_TOKEN).unwrap();
        assert_eq!(unknown.peak(), 0.0);
    }

    #[test]
    fn tone_word_gets_one_slot_per_letter() {
        let synth = ToneSynthesizer::default();
        assert_eq!(synth.synthesize("hi").unwrap().len(), 8_000);
        assert_eq!(synth.synthesize("A").unwrap(), synth.synthesize("a").unwrap());
    }

    #[test]
    fn envelope_fades_both_ends() {
        assert_eq!(envelope(0, 1_000), 0.0);
        assert_eq!(envelope(999, 1_000), 0.0);
        assert_eq!(envelope(500, 1_000), 1.0);
    }
}
