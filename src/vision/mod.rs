//! Vision side of the pipeline: capture, detection, classifier input.
//!
//! # Pipeline
//!
//! ```text
//! VideoSource → Frame → HandDetector → DetectionResult
//!                                        └─ annotated Frame → preprocess::prepare → classifier
//! ```
//!
//! [`overlay`] draws recognised tokens and detection boxes back onto frames.

pub mod detector;
pub mod frame;
pub mod overlay;
pub mod preprocess;
pub mod source;

pub use detector::{DetectionResult, DetectorError, HandDetector, HandLandmarks, SkinToneDetector};
pub use frame::{Frame, FrameError};
pub use overlay::{draw_rect, draw_text, Rect, TextStyle};
pub use source::{CaptureError, ImageDirSource, RawVideoSource, VideoSource};
