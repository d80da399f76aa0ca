//! Hand detector trait and the built-in skin-tone implementation.
//!
//! [`HandDetector`] is the interface used by the pipeline.  It is object-safe
//! and `Send` so a boxed detector can move onto the session thread.
//!
//! [`SkinToneDetector`] classifies each pixel by its YCbCr chroma, reports a
//! hand when enough of the frame is skin, and outlines the skin region on
//! the annotated frame.

use thiserror::Error;

use super::frame::Frame;
use super::overlay::{draw_rect, Rect};
use crate::config::DetectorConfig;

// ---------------------------------------------------------------------------
// DetectorError
// ---------------------------------------------------------------------------

/// All errors that can arise from a hand detector.
#[derive(Debug, Clone, Error)]
pub enum DetectorError {
    /// The frame layout is not one the detector can read.
    #[error("unsupported frame format: {0}")]
    UnsupportedFrame(String),

    /// The detector backend failed.
    #[error("hand detection failed: {0}")]
    Backend(String),
}

// ---------------------------------------------------------------------------
// DetectionResult
// ---------------------------------------------------------------------------

/// Where the detector found the hand.
#[derive(Debug, Clone, PartialEq)]
pub struct HandLandmarks {
    /// Bounding box of the hand region.
    pub bbox: Rect,
    /// Centre of mass of the hand pixels, in pixels.
    pub centroid: (f32, f32),
    /// Fraction of the frame covered by hand pixels.
    pub coverage: f32,
}

/// Output of one [`HandDetector::detect`] call.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionResult {
    /// The input frame, possibly with detection markings drawn on it.
    pub annotated: Frame,
    /// `true` when a hand was found.
    pub hand_present: bool,
    /// Structured hand data when the backend provides it.
    pub landmarks: Option<HandLandmarks>,
}

impl DetectionResult {
    /// A "no hand" result that passes `frame` through untouched.
    pub fn absent(frame: Frame) -> Self {
        Self {
            annotated: frame,
            hand_present: false,
            landmarks: None,
        }
    }
}

// ---------------------------------------------------------------------------
// HandDetector trait
// ---------------------------------------------------------------------------

/// Object-safe interface for hand detectors.
pub trait HandDetector: Send {
    /// Look for a hand in `frame`.
    fn detect(&self, frame: &Frame) -> Result<DetectionResult, DetectorError>;
}

// Compile-time assertion: Box<dyn HandDetector> must be constructible.
const _: fn() = || {
    fn _assert_object_safe(_: Box<dyn HandDetector>) {}
};

// ---------------------------------------------------------------------------
// SkinToneDetector
// ---------------------------------------------------------------------------

/// Outline colour of the detected hand region.
const BOX_COLOR: [u8; 3] = [255, 200, 0];

/// Chroma-threshold hand detector.
#[derive(Debug, Clone)]
pub struct SkinToneDetector {
    config: DetectorConfig,
}

impl SkinToneDetector {
    pub fn new(config: DetectorConfig) -> Self {
        Self { config }
    }

    fn is_skin(&self, [r, g, b]: [u8; 3]) -> bool {
        let (r, g, b) = (r as f32, g as f32, b as f32);
        let cb = 128.0 - 0.168_736 * r - 0.331_264 * g + 0.5 * b;
        let cr = 128.0 + 0.5 * r - 0.418_688 * g - 0.081_312 * b;
        let c = &self.config;
        (c.cb_min as f32..=c.cb_max as f32).contains(&cb)
            && (c.cr_min as f32..=c.cr_max as f32).contains(&cr)
    }
}

impl Default for SkinToneDetector {
    fn default() -> Self {
        Self::new(DetectorConfig::default())
    }
}

impl HandDetector for SkinToneDetector {
    fn detect(&self, frame: &Frame) -> Result<DetectionResult, DetectorError> {
        if frame.channels() < 3 {
            return Err(DetectorError::UnsupportedFrame(format!(
                "{} channel(s), colour input required",
                frame.channels()
            )));
        }

        let mut count = 0_u64;
        let (mut sx, mut sy) = (0_f64, 0_f64);
        let mut bbox: Option<Rect> = None;

        for y in 0..frame.height() {
            for x in 0..frame.width() {
                let Some(px) = frame.rgb(x, y) else { continue };
                if !self.is_skin(px) {
                    continue;
                }
                count += 1;
                sx += x as f64;
                sy += y as f64;
                bbox = Some(match bbox {
                    None => Rect { x0: x, y0: y, x1: x, y1: y },
                    Some(r) => Rect {
                        x0: r.x0.min(x),
                        y0: r.y0.min(y),
                        x1: r.x1.max(x),
                        y1: r.y1.max(y),
                    },
                });
            }
        }

        let total = frame.width() as f64 * frame.height() as f64;
        let coverage = (count as f64 / total) as f32;

        match bbox {
            Some(bbox) if coverage >= self.config.min_area_fraction => {
                let mut annotated = frame.clone();
                draw_rect(&mut annotated, bbox, BOX_COLOR, 2);
                log::trace!("detector: hand at {bbox:?} coverage={coverage:.3}");
                Ok(DetectionResult {
                    annotated,
                    hand_present: true,
                    landmarks: Some(HandLandmarks {
                        bbox,
                        centroid: ((sx / count as f64) as f32, (sy / count as f64) as f32),
                        coverage,
                    }),
                })
            }
            _ => Ok(DetectionResult::absent(frame.clone())),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
