//! Application settings structs, defaults and TOML persistence.
//!
//! All structs implement `Serialize`, `Deserialize`, `Default` and `Clone`
//! so they can be round-tripped through TOML files and handed to the
//! session thread.

use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::AppPaths;

// ---------------------------------------------------------------------------
// GestureConfig
// ---------------------------------------------------------------------------

/// Settings for the gesture classifier and the stabilizer in front of it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureConfig {
    /// Classifier weights (safetensors).
    pub model_path: PathBuf,
    /// Number of classes the classifier emits.  Must match the weights and the
    /// label list.
    pub num_classes: usize,
    /// Side length of the square the frame is resized to before inference.
    pub input_size: u32,
    /// Optional JSON array of labels replacing the default A–Z alphabet.
    pub labels_file: Option<PathBuf>,
    /// Consecutive identical observations required before a new gesture is
    /// confirmed.  `1` confirms on the first differing frame.
    pub min_stable_frames: u32,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            model_path: AppPaths::new().classifier_model,
            num_classes: 26,
            input_size: 224,
            labels_file: None,
            min_stable_frames: 1,
        }
    }
}

// ---------------------------------------------------------------------------
// SynthBackend / SpeechConfig
// ---------------------------------------------------------------------------

/// Selects which speech synthesizer bootstrap builds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SynthBackend {
    /// Weight-file backed synthesizer; requires `speech.model_path`.
    Model,
    /// Model-free tone synthesizer, for runs without trained weights.
    Tone,
}

impl Default for SynthBackend {
    fn default() -> Self {
        Self::Model
    }
}

/// Settings for speech synthesis and playback.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    /// Which synthesizer to construct.
    pub backend: SynthBackend,
    /// Synthesizer weights (safetensors), used by [`SynthBackend::Model`].
    pub model_path: PathBuf,
    /// Width of the per-character text features fed to the model.
    pub input_dim: usize,
    /// Hidden width of the model.
    pub hidden_dim: usize,
    /// Width of the acoustic frames produced by the model.
    pub output_dim: usize,
    /// Output sample rate in Hz (must be 16 000).
    pub sample_rate: u32,
    /// Play utterances on the default output device.  `false` uses a silent
    /// sink (headless runs).
    pub playback: bool,
    /// When set, every utterance is also written here as a WAV file.
    pub record_dir: Option<PathBuf>,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            backend: SynthBackend::default(),
            model_path: AppPaths::new().speech_model,
            input_dim: 256,
            hidden_dim: 512,
            output_dim: 80,
            sample_rate: 16_000,
            playback: true,
            record_dir: None,
        }
    }
}

// ---------------------------------------------------------------------------
// CaptureBackend / CaptureConfig
// ---------------------------------------------------------------------------

/// Where frames come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CaptureBackend {
    /// Packed RGB24 frames of a fixed size read from a file, FIFO or stdin
    /// (`-`), e.g. `ffmpeg -f v4l2 -i /dev/video0 -f rawvideo -pix_fmt rgb24 -`.
    RawPipe,
    /// A directory of PNG/JPEG files replayed in file-name order.
    ImageDir,
}

impl Default for CaptureBackend {
    fn default() -> Self {
        Self::RawPipe
    }
}

/// Video source settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Source kind.
    pub backend: CaptureBackend,
    /// File, FIFO, `-` for stdin, or a directory for [`CaptureBackend::ImageDir`].
    pub path: PathBuf,
    /// Frame width in pixels (raw pipe only).
    pub width: u32,
    /// Frame height in pixels (raw pipe only).
    pub height: u32,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            backend: CaptureBackend::default(),
            path: PathBuf::from("-"),
            width: 640,
            height: 480,
        }
    }
}

// ---------------------------------------------------------------------------
// DetectorConfig
// ---------------------------------------------------------------------------

/// Thresholds for the skin-tone hand detector (YCbCr chroma box).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    pub cb_min: u8,
    pub cb_max: u8,
    pub cr_min: u8,
    pub cr_max: u8,
    /// Fraction of the frame that must be skin before a hand is reported.
    pub min_area_fraction: f32,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            cb_min: 77,
            cb_max: 127,
            cr_min: 133,
            cr_max: 173,
            min_area_fraction: 0.02,
        }
    }
}

// ---------------------------------------------------------------------------
// DisplayConfig
// ---------------------------------------------------------------------------

/// Appearance of the token drawn onto the frame when a gesture is emitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    /// Left edge of the text in pixels.
    pub x: u32,
    /// Baseline of the text in pixels.
    pub y: u32,
    /// RGB colour.
    pub color: [u8; 3],
    /// Integer glyph scale factor.
    pub scale: u32,
    /// Stroke thickness in pixels.
    pub thickness: u32,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            x: 10,
            y: 50,
            color: [0, 255, 0],
            scale: 1,
            thickness: 2,
        }
    }
}

/// Preview window settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Open the preview window.  `false` runs headless.
    pub enabled: bool,
    /// Window title.
    pub window_title: String,
    /// Single-letter key that ends the session.
    pub exit_key: String,
    /// Token overlay style.
    pub overlay: OverlayConfig,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            window_title: "GLAVOX - Sign Language Recognition".into(),
            exit_key: "q".into(),
            overlay: OverlayConfig::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// SessionConfig / LoggingConfig
// ---------------------------------------------------------------------------

/// Session-level behaviour.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Append each session's gesture history to this file on teardown.
    pub transcript_file: Option<PathBuf>,
    /// Stop after this many frames (unattended runs).
    pub max_frames: Option<u64>,
}

/// Operational log settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Mirror the log to `file`.  `false` logs to stderr only.
    pub to_file: bool,
    pub file: PathBuf,
}

impl LoggingConfig {
    /// The log file, if file logging is on.
    pub fn log_file(&self) -> Option<&Path> {
        self.to_file.then_some(self.file.as_path())
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            to_file: true,
            file: AppPaths::new().log_file,
        }
    }
}

// ---------------------------------------------------------------------------
// AppConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level application configuration, serialised as `settings.toml`.
///
/// ```rust,no_run
/// use glavox::config::AppConfig;
///
/// // Load (returns Default when file is missing)
/// let config = AppConfig::load().unwrap();
/// assert_eq!(config.speech.sample_rate, 16_000);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub gesture: GestureConfig,
    pub speech: SpeechConfig,
    pub capture: CaptureConfig,
    pub detector: DetectorConfig,
    pub display: DisplayConfig,
    pub session: SessionConfig,
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from the platform-appropriate `settings.toml`.
    ///
    /// Returns `Ok(AppConfig::default())` when the file does not exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&AppPaths::new().settings_file)
    }

    /// Load from an explicit path (useful for tests).
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the platform-appropriate `settings.toml`,
    /// creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&AppPaths::new().settings_file)
    }

    /// Save to an explicit path (useful for tests).
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn round_trip_toml() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("settings.toml");

        let original = AppConfig::default();
        original.save_to(&path).expect("save");

        let loaded = AppConfig::load_from(&path).expect("load");

        assert_eq!(original.gesture.model_path, loaded.gesture.model_path);
        assert_eq!(original.gesture.num_classes, loaded.gesture.num_classes);
        assert_eq!(original.speech.backend, loaded.speech.backend);
        assert_eq!(original.speech.hidden_dim, loaded.speech.hidden_dim);
        assert_eq!(original.capture.backend, loaded.capture.backend);
        assert_eq!(original.capture.path, loaded.capture.path);
        assert_eq!(original.display.overlay.color, loaded.display.overlay.color);
        assert_eq!(original.logging.file, loaded.logging.file);
    }

    #[test]
    fn load_missing_returns_default() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("nonexistent.toml");

        let config = AppConfig::load_from(&path).expect("should not error");
        assert_eq!(config.gesture.num_classes, 26);
        assert_eq!(config.speech.sample_rate, 16_000);
    }

    #[test]
    fn defaults_reproduce_stock_setup() {
        let cfg = AppConfig::default();

        assert_eq!(cfg.gesture.num_classes, 26);
        assert_eq!(cfg.gesture.input_size, 224);
        assert_eq!(cfg.gesture.min_stable_frames, 1);
        assert_eq!(cfg.speech.input_dim, 256);
        assert_eq!(cfg.speech.hidden_dim, 512);
        assert_eq!(cfg.speech.output_dim, 80);
        assert_eq!(cfg.display.exit_key, "q");
        assert_eq!(cfg.display.overlay.x, 10);
        assert_eq!(cfg.display.overlay.y, 50);
        assert_eq!(cfg.display.overlay.color, [0, 255, 0]);
        assert!(cfg.session.max_frames.is_none());
    }

    #[test]
    fn partial_file_fills_missing_sections_with_defaults() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("partial.toml");
        std::fs::write(
            &path,
            "[session]\nmax_frames = 120\n\n\
             [speech]\nbackend = \"Tone\"\nmodel_path = \"x\"\ninput_dim = 1\n\
             hidden_dim = 2\noutput_dim = 3\nsample_rate = 16000\nplayback = false\n",
        )
        .expect("write");

        let cfg = AppConfig::load_from(&path).expect("load");
        assert_eq!(cfg.session.max_frames, Some(120));
        assert_eq!(cfg.speech.backend, SynthBackend::Tone);
        assert!(!cfg.speech.playback);
        assert_eq!(cfg.gesture.num_classes, 26);
        assert!(cfg.display.enabled);
    }

    #[test]
    fn partial_section_keeps_remaining_defaults() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("sparse.toml");
        std::fs::write(
            &path,
            "[speech]\nbackend = \"Tone\"\nplayback = false\n\n\
             [display.overlay]\nx = 40\n\n[logging]\nto_file = false\n",
        )
        .expect("write");

        let cfg = AppConfig::load_from(&path).expect("load");
        assert_eq!(cfg.speech.backend, SynthBackend::Tone);
        assert!(!cfg.speech.playback);
        assert_eq!(cfg.speech.hidden_dim, 512);
        assert_eq!(cfg.speech.sample_rate, 16_000);
        assert_eq!(cfg.speech.model_path, SpeechConfig::default().model_path);
        assert_eq!(cfg.display.overlay.x, 40);
        assert_eq!(cfg.display.overlay.y, 50);
        assert_eq!(cfg.display.exit_key, "q");
        assert!(cfg.logging.log_file().is_none());
        assert_eq!(cfg.logging.file, LoggingConfig::default().file);
    }

    #[test]
    fn round_trip_modified_values() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("modified.toml");

        let mut cfg = AppConfig::default();
        cfg.capture.backend = CaptureBackend::ImageDir;
        cfg.capture.path = PathBuf::from("/tmp/frames");
        cfg.gesture.labels_file = Some(PathBuf::from("labels.json"));
        cfg.gesture.min_stable_frames = 3;
        cfg.session.transcript_file = Some(PathBuf::from("transcript.txt"));
        cfg.logging.to_file = false;

        cfg.save_to(&path).expect("save");
        let loaded = AppConfig::load_from(&path).expect("load");

        assert_eq!(loaded.capture.backend, CaptureBackend::ImageDir);
        assert_eq!(loaded.capture.path, PathBuf::from("/tmp/frames"));
        assert_eq!(loaded.gesture.labels_file, Some(PathBuf::from("labels.json")));
        assert_eq!(loaded.gesture.min_stable_frames, 3);
        assert_eq!(
            loaded.session.transcript_file,
            Some(PathBuf::from("transcript.txt"))
        );
        assert!(loaded.logging.log_file().is_none());
    }
}
