//! Gesture classifier trait and the candle-backed linear classifier.
//!
//! # Overview
//!
//! [`GestureClassifier`] is the interface used by the pipeline: one frame in,
//! one class index out.  Indices are plain `i64` so out-of-range answers from
//! a misbehaving model reach the vocabulary, which maps them to `Unknown`.
//!
//! [`LinearGestureClassifier`] loads a `head.weight` / `head.bias` pair from a
//! safetensors file and scores an average-pooled, normalised copy of the
//! frame.  Any checkpoint exported with those two tensors can be dropped in.

use std::collections::HashMap;
use std::path::Path;

use candle_core::{DType, Device, Tensor, D};
use thiserror::Error;

use crate::vision::preprocess;
use crate::vision::Frame;

/// The pooled feature grid is `POOL_GRID x POOL_GRID` per colour plane.
pub const POOL_GRID: usize = 16;
/// Length of the feature vector the linear head consumes.
pub const FEATURE_LEN: usize = 3 * POOL_GRID * POOL_GRID;

// ---------------------------------------------------------------------------
// ClassifierError
// ---------------------------------------------------------------------------

/// All errors that can arise from the classifier subsystem.
#[derive(Debug, Clone, Error)]
pub enum ClassifierError {
    /// The weight file was not found at the given path.
    #[error("classifier model not found: {0}")]
    ModelNotFound(String),

    /// The weight file exists but could not be parsed.
    #[error("cannot load classifier weights: {0}")]
    Load(String),

    /// A required tensor is absent from the weight file.
    #[error("classifier weights lack tensor `{0}`")]
    MissingTensor(String),

    /// A tensor does not have the shape the configuration implies.
    #[error("tensor `{tensor}` has shape {got:?}, expected {expected:?}")]
    ShapeMismatch {
        tensor: String,
        expected: Vec<usize>,
        got: Vec<usize>,
    },

    /// The model input size cannot be pooled to the feature grid.
    #[error("input size {0} must be a positive multiple of 16")]
    InputSize(u32),

    /// An error occurred during the forward pass.
    #[error("classification failed: {0}")]
    Inference(String),
}

// ---------------------------------------------------------------------------
// GestureClassifier trait
// ---------------------------------------------------------------------------

/// Object-safe interface for gesture classifiers.
pub trait GestureClassifier: Send {
    /// Classify `frame` and return the winning class index.
    fn predict(&self, frame: &Frame) -> Result<i64, ClassifierError>;
}

const _: fn() = || {
    fn _assert_object_safe(_: Box<dyn GestureClassifier>) {}
};

// ---------------------------------------------------------------------------
// Feature extraction
// ---------------------------------------------------------------------------

/// Average-pool a CHW `[0, 1]` square of side `size` to the feature grid.
fn pool_features(chw: &[f32], size: usize) -> Vec<f32> {
    let cell = size / POOL_GRID;
    let plane = size * size;
    let norm = (cell * cell) as f32;
    let mut out = Vec::with_capacity(FEATURE_LEN);

    for c in 0..3 {
        for gy in 0..POOL_GRID {
            for gx in 0..POOL_GRID {
                let mut sum = 0.0;
                for y in gy * cell..(gy + 1) * cell {
                    let row = c * plane + y * size;
                    sum += chw[row + gx * cell..row + (gx + 1) * cell].iter().sum::<f32>();
                }
                out.push(sum / norm);
            }
        }
    }
    out
}

// ---------------------------------------------------------------------------
// LinearGestureClassifier
// ---------------------------------------------------------------------------

/// Linear head over pooled pixels, run on the CPU with candle.
pub struct LinearGestureClassifier {
    /// `[num_classes, FEATURE_LEN]`
    weight: Tensor,
    /// `[num_classes]`
    bias: Tensor,
    input_size: u32,
    device: Device,
}

impl std::fmt::Debug for LinearGestureClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinearGestureClassifier")
            .field("classes", &self.num_classes())
            .field("input_size", &self.input_size)
            .finish_non_exhaustive()
    }
}

impl LinearGestureClassifier {
    /// Load `head.weight` and `head.bias` from a safetensors file.
    ///
    /// # Errors
    ///
    /// - [`ClassifierError::ModelNotFound`]: `model_path` does not exist.
    /// - [`ClassifierError::Load`]: the file is not valid safetensors.
    /// - [`ClassifierError::MissingTensor`] / [`ClassifierError::ShapeMismatch`]
    ///   when the weights do not fit `num_classes`.
    pub fn load(
        model_path: impl AsRef<Path>,
        num_classes: usize,
        input_size: u32,
    ) -> Result<Self, ClassifierError> {
        let path = model_path.as_ref();
        if !path.exists() {
            return Err(ClassifierError::ModelNotFound(path.display().to_string()));
        }

        let device = Device::Cpu;
        let mut tensors: HashMap<String, Tensor> = candle_core::safetensors::load(path, &device)
            .map_err(|e| ClassifierError::Load(format!("{}: {e}", path.display())))?;

        let weight = tensors
            .remove("head.weight")
            .ok_or_else(|| ClassifierError::MissingTensor("head.weight".into()))?;
        let bias = tensors
            .remove("head.bias")
            .ok_or_else(|| ClassifierError::MissingTensor("head.bias".into()))?;

        Self::from_tensors(weight, bias, num_classes, input_size)
    }

    /// Build from in-memory tensors, checking shapes against `num_classes`.
    pub fn from_tensors(
        weight: Tensor,
        bias: Tensor,
        num_classes: usize,
        input_size: u32,
    ) -> Result<Self, ClassifierError> {
        if input_size == 0 || input_size as usize % POOL_GRID != 0 {
            return Err(ClassifierError::InputSize(input_size));
        }
        check_shape("head.weight", &weight, &[num_classes, FEATURE_LEN])?;
        check_shape("head.bias", &bias, &[num_classes])?;

        let to_f32 = |t: Tensor| {
            t.to_dtype(DType::F32)
                .map_err(|e| ClassifierError::Load(e.to_string()))
        };
        Ok(Self {
            weight: to_f32(weight)?,
            bias: to_f32(bias)?,
            input_size,
            device: Device::Cpu,
        })
    }

    pub fn num_classes(&self) -> usize {
        self.bias.dims().first().copied().unwrap_or(0)
    }

    /// Raw class scores for `frame`.
    pub fn logits(&self, frame: &Frame) -> Result<Vec<f32>, ClassifierError> {
        let size = self.input_size as usize;
        let features = pool_features(&preprocess::prepare(frame, self.input_size), size);
        let inference = |e: candle_core::Error| ClassifierError::Inference(e.to_string());

        let x = Tensor::from_vec(features, (FEATURE_LEN, 1), &self.device).map_err(inference)?;
        let scores = self
            .weight
            .matmul(&x)
            .and_then(|t| t.squeeze(1))
            .and_then(|t| t.add(&self.bias))
            .map_err(inference)?;
        scores.to_vec1::<f32>().map_err(inference)
    }
}

impl GestureClassifier for LinearGestureClassifier {
    fn predict(&self, frame: &Frame) -> Result<i64, ClassifierError> {
        let scores = self.logits(frame)?;
        let inference = |e: candle_core::Error| ClassifierError::Inference(e.to_string());
        let best = Tensor::new(scores.as_slice(), &self.device)
            .and_then(|t| t.argmax(D::Minus1))
            .and_then(|t| t.to_scalar::<u32>())
            .map_err(inference)?;
        Ok(i64::from(best))
    }
}

fn check_shape(name: &str, tensor: &Tensor, expected: &[usize]) -> Result<(), ClassifierError> {
    if tensor.dims() != expected {
        return Err(ClassifierError::ShapeMismatch {
            tensor: name.to_string(),
            expected: expected.to_vec(),
            got: tensor.dims().to_vec(),
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    /// Class 0 scores the red plane, class 1 the green plane, class 2 blue.
    fn plane_detector() -> (Tensor, Tensor) {
        let plane = POOL_GRID * POOL_GRID;
        let mut w = vec![0.0_f32; 3 * FEATURE_LEN];
        for class in 0..3 {
            for i in 0..plane {
                w[class * FEATURE_LEN + class * plane + i] = 1.0;
            }
        }
        let weight = Tensor::from_vec(w, (3, FEATURE_LEN), &Device::Cpu).unwrap();
        let bias = Tensor::zeros(3, DType::F32, &Device::Cpu).unwrap();
        (weight, bias)
    }

    #[test]
    fn predicts_dominant_colour_plane() {
        let (w, b) = plane_detector();
        let clf = LinearGestureClassifier::from_tensors(w, b, 3, 32).unwrap();
        assert_eq!(clf.predict(&Frame::filled(40, 30, [250, 10, 10])).unwrap(), 0);
        assert_eq!(clf.predict(&Frame::filled(40, 30, [10, 250, 10])).unwrap(), 1);
        assert_eq!(clf.predict(&Frame::filled(40, 30, [10, 10, 250])).unwrap(), 2);
    }

    #[test]
    fn bias_breaks_ties() {
        let weight = Tensor::zeros((4, FEATURE_LEN), DType::F32, &Device::Cpu).unwrap();
        let bias = Tensor::new(&[0.0_f32, 0.5, 2.0, 1.0], &Device::Cpu).unwrap();
        let clf = LinearGestureClassifier::from_tensors(weight, bias, 4, 16).unwrap();
        assert_eq!(clf.predict(&Frame::filled(8, 8, [0, 0, 0])).unwrap(), 2);
    }

    #[test]
    fn wrong_class_count_is_shape_mismatch() {
        let (w, b) = plane_detector();
        let err = LinearGestureClassifier::from_tensors(w, b, 26, 224).unwrap_err();
        assert!(matches!(
            err,
            ClassifierError::ShapeMismatch { ref tensor, .. } if tensor == "head.weight"
        ));
    }

    #[test]
    fn input_size_must_pool_evenly() {
        let (w, b) = plane_detector();
        assert!(matches!(
            LinearGestureClassifier::from_tensors(w, b, 3, 100),
            Err(ClassifierError::InputSize(100))
        ));
    }

    #[test]
    fn load_missing_model_returns_model_not_found() {
        let result = LinearGestureClassifier::load("/nonexistent/model.safetensors", 26, 224);
        assert!(
            matches!(result, Err(ClassifierError::ModelNotFound(_))),
            "expected ModelNotFound, got: {result:?}"
        );
    }

    #[test]
    fn load_round_trips_through_safetensors() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("classifier.safetensors");
        let (w, b) = plane_detector();
        let tensors: HashMap<String, Tensor> =
            [("head.weight".to_string(), w), ("head.bias".to_string(), b)].into();
        candle_core::safetensors::save(&tensors, &path).unwrap();

        let clf = LinearGestureClassifier::load(&path, 3, 224).unwrap();
        assert_eq!(clf.num_classes(), 3);
        assert_eq!(clf.predict(&Frame::filled(64, 64, [0, 0, 255])).unwrap(), 2);
    }

    #[test]
    fn load_without_bias_reports_missing_tensor() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("classifier.safetensors");
        let (w, _) = plane_detector();
        let tensors: HashMap<String, Tensor> = [("head.weight".to_string(), w)].into();
        candle_core::safetensors::save(&tensors, &path).unwrap();

        assert!(matches!(
            LinearGestureClassifier::load(&path, 3, 224),
            Err(ClassifierError::MissingTensor(ref t)) if t == "head.bias"
        ));
    }

    #[test]
    fn garbage_file_is_load_error() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("classifier.safetensors");
        std::fs::write(&path, b"not a safetensors file").unwrap();
        assert!(matches!(
            LinearGestureClassifier::load(&path, 3, 224),
            Err(ClassifierError::Load(_))
        ));
    }

    #[test]
    fn pooled_features_average_cells() {
        let size = POOL_GRID * 2;
        let mut chw = vec![0.0_f32; 3 * size * size];
        // Top-left 2x2 block of the red plane fully lit.
        for y in 0..2 {
            for x in 0..2 {
                chw[y * size + x] = 1.0;
            }
        }
        let features = pool_features(&chw, size);
        assert_eq!(features.len(), FEATURE_LEN);
        assert!((features[0] - 1.0).abs() < 1e-6);
        assert!(features[1..].iter().all(|v| v.abs() < 1e-6));
    }
}
