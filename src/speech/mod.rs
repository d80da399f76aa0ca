//! Speech output: token → waveform → speakers.
//!
//! ```text
//! token → SpeechSynthesizer → AudioBuffer (16 kHz mono)
//!       → [WavRecorderSink] → CpalSink (resample → interleave → cpal stream)
//! ```

pub mod buffer;
pub mod playback;
pub mod resample;
pub mod synth;

pub use buffer::{AudioBuffer, SAMPLE_RATE};
pub use playback::{write_wav, AudioSink, CpalSink, NullSink, PlaybackError, WavRecorderSink};
pub use resample::{mono_to_interleaved, resample};
pub use synth::{ModelDims, ModelSynthesizer, SpeechSynthesizer, SynthError, ToneSynthesizer};
