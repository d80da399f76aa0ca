//! `settings.toml` and the file layout around it.
//!
//! [`AppConfig`] groups one sub-config per subsystem; a missing file or
//! section falls back to defaults that reproduce the stock 26-letter setup.

pub mod paths;
pub mod settings;

pub use paths::AppPaths;
pub use settings::{
    AppConfig, CaptureBackend, CaptureConfig, DetectorConfig, DisplayConfig, GestureConfig,
    LoggingConfig, OverlayConfig, SessionConfig, SpeechConfig, SynthBackend,
};
