//! Gesture recognition: classifier → vocabulary → stabilizer.
//!
//! ```text
//! Frame → GestureClassifier::predict → i64 → GestureVocabulary::lookup → token
//!       → GestureStabilizer::observe → Some(token) on a confirmed transition
//! ```

pub mod classifier;
pub mod stabilizer;
pub mod vocabulary;

pub use classifier::{ClassifierError, GestureClassifier, LinearGestureClassifier};
pub use stabilizer::GestureStabilizer;
pub use vocabulary::{GestureVocabulary, VocabularyError, UNKNOWN_TOKEN};
