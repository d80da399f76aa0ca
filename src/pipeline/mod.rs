//! Per-frame recognition → speech pipeline.
//!
//! [`FramePipeline`] is a function of `(frame, state) → (frame, state)` with
//! side effects limited to synthesis and playback.  [`PipelineState`] holds
//! the gesture stabilizer and is owned by the session controller.

pub mod processor;
pub mod state;

pub use processor::{FramePipeline, ProcessedFrame};
pub use state::{FrameOutcome, PipelineState, Stage};
