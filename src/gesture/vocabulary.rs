//! Class-index → token mapping.
//!
//! The default vocabulary is the 26-letter alphabet (index 0 = `"A"`).  A
//! custom label set can be loaded from a JSON array of strings:
//!
//! ```json
//! ["A", "B", "C", "hello", "thanks"]
//! ```
//!
//! [`GestureVocabulary::lookup`] is total: anything outside the label range,
//! negative indices included, maps to [`UNKNOWN_TOKEN`].

use std::path::Path;

use thiserror::Error;

/// Token returned for indices outside the vocabulary.
pub const UNKNOWN_TOKEN: &str = "Unknown";

// ---------------------------------------------------------------------------
// VocabularyError
// ---------------------------------------------------------------------------

/// Errors raised while building a vocabulary (startup only).
#[derive(Debug, Error)]
pub enum VocabularyError {
    #[error("cannot read label file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("label file {path} is not a JSON array of strings: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("vocabulary has no labels")]
    Empty,
}

// ---------------------------------------------------------------------------
// GestureVocabulary
// ---------------------------------------------------------------------------

/// Immutable list of labels indexed by classifier output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GestureVocabulary {
    labels: Vec<String>,
}

impl GestureVocabulary {
    /// Letters `A`–`Z` for indices 0–25.
    pub fn alphabet() -> Self {
        Self {
            labels: ('A'..='Z').map(String::from).collect(),
        }
    }

    /// Build from an explicit label list.
    pub fn from_labels(labels: Vec<String>) -> Result<Self, VocabularyError> {
        if labels.is_empty() {
            return Err(VocabularyError::Empty);
        }
        Ok(Self { labels })
    }

    /// Load a JSON array of labels from `path`.
    pub fn load_from(path: &Path) -> Result<Self, VocabularyError> {
        let data = std::fs::read_to_string(path).map_err(|source| VocabularyError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let labels: Vec<String> =
            serde_json::from_str(&data).map_err(|source| VocabularyError::Parse {
                path: path.display().to_string(),
                source,
            })?;
        Self::from_labels(labels)
    }

    /// Token for `index`; [`UNKNOWN_TOKEN`] when out of range.
    pub fn lookup(&self, index: i64) -> &str {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.labels.get(i))
            .map_or(UNKNOWN_TOKEN, String::as_str)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

impl Default for GestureVocabulary {
    fn default() -> Self {
        Self::alphabet()
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
    fn alphabet_maps_indices_to_letters() {
        let vocab = GestureVocabulary::alphabet();
        assert_eq!(vocab.len(), 26);
        assert_eq!(vocab.lookup(0), "A");
        assert_eq!(vocab.lookup(2), "C");
        assert_eq!(vocab.lookup(25), "Z");
    }

    #[test]
    fn lookup_is_total() {
        let vocab = GestureVocabulary::alphabet();
        for index in [26, 27, 1_000, -1, -26, i64::MIN, i64::MAX] {
            assert_eq!(vocab.lookup(index), UNKNOWN_TOKEN, "index {index}");
        }
        for index in -100..100_i64 {
            let token = vocab.lookup(index);
            assert!(!token.is_empty());
        }
    }

    #[test]
    fn from_labels_rejects_empty_list() {
        assert!(matches!(
            GestureVocabulary::from_labels(Vec::new()),
            Err(VocabularyError::Empty)
        ));
    }

    #[test]
    fn load_from_json_file() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("labels.json");
        std::fs::write(&path, r#"["hello", "thanks", "yes"]"#).unwrap();

        let vocab = GestureVocabulary::load_from(&path).unwrap();
        assert_eq!(vocab.len(), 3);
        assert_eq!(vocab.lookup(1), "thanks");
        assert_eq!(vocab.lookup(3), UNKNOWN_TOKEN);
    }

    #[test]
    fn load_from_rejects_malformed_json() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("labels.json");
        std::fs::write(&path, r#"{"A": 0}"#).unwrap();

        assert!(matches!(
            GestureVocabulary::load_from(&path),
            Err(VocabularyError::Parse { .. })
        ));
    }

    #[test]
    fn load_from_missing_file_is_read_error() {
        let err = GestureVocabulary::load_from(Path::new("/nonexistent/labels.json")).unwrap_err();
        assert!(matches!(err, VocabularyError::Read { .. }));
        assert!(err.to_string().contains("/nonexistent/labels.json"));
    }
}
