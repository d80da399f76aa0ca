//! Where GLAVOX keeps its files, resolved with the `dirs` crate.
//!
//! ```text
//! <config_dir>/glavox/settings.toml
//! <data_local_dir>/glavox/models/sign_language_model.safetensors
//! <data_local_dir>/glavox/models/tts_model.safetensors
//! <data_local_dir>/glavox/glavox.log
//! ```
//!
//! On Linux that is `~/.config/glavox` and `~/.local/share/glavox`.

use std::path::{Path, PathBuf};

const APP_NAME: &str = "glavox";

#[derive(Debug, Clone)]
pub struct AppPaths {
    pub config_dir: PathBuf,
    pub data_dir: PathBuf,
    pub settings_file: PathBuf,
    pub models_dir: PathBuf,
    /// Default gesture classifier weights.
    pub classifier_model: PathBuf,
    /// Default speech synthesizer weights.
    pub speech_model: PathBuf,
    pub log_file: PathBuf,
}

impl AppPaths {
    /// Platform directories, or the current directory where the platform
    /// has none.
    pub fn new() -> Self {
        let here = || PathBuf::from(".");
        Self::rooted(
            &dirs::config_dir().unwrap_or_else(here),
            &dirs::data_local_dir().unwrap_or_else(here),
        )
    }

    /// The same layout under explicit roots.
    pub fn rooted(config_root: &Path, data_root: &Path) -> Self {
        let config_dir = config_root.join(APP_NAME);
        let data_dir = data_root.join(APP_NAME);
        let models_dir = data_dir.join("models");

        Self {
            settings_file: config_dir.join("settings.toml"),
            classifier_model: models_dir.join("sign_language_model.safetensors"),
            speech_model: models_dir.join("tts_model.safetensors"),
            log_file: data_dir.join("glavox.log"),
            config_dir,
            data_dir,
            models_dir,
        }
    }
}

impl Default for AppPaths {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_under_roots() {
        let paths = AppPaths::rooted(Path::new("/cfg"), Path::new("/data"));
        assert_eq!(paths.settings_file, Path::new("/cfg/glavox/settings.toml"));
        assert_eq!(
            paths.classifier_model,
            Path::new("/data/glavox/models/sign_language_model.safetensors")
        );
        assert_eq!(paths.speech_model.parent(), Some(paths.models_dir.as_path()));
        assert_eq!(paths.log_file, Path::new("/data/glavox/glavox.log"));
        assert!(paths.log_file.starts_with(&paths.data_dir));
    }

    #[test]
    fn platform_paths_end_in_app_dir() {
        let paths = AppPaths::new();
        assert!(paths.config_dir.ends_with(APP_NAME));
        assert!(paths.data_dir.ends_with(APP_NAME));
    }
}
