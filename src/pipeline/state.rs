//! Per-session pipeline state and per-frame outcome records.
//!
//! [`PipelineState`] is an explicit value: the session controller owns it,
//! hands it to [`FramePipeline::process`](super::FramePipeline::process) and
//! receives the new value back.  Nothing about a session lives in globals.

use crate::gesture::GestureStabilizer;

// ---------------------------------------------------------------------------
// PipelineState
// ---------------------------------------------------------------------------

/// Mutable state carried from one frame to the next.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PipelineState {
    stabilizer: GestureStabilizer,
}

impl PipelineState {
    /// Fresh state for a new session.
    pub fn new(min_stable_frames: u32) -> Self {
        Self {
            stabilizer: GestureStabilizer::with_min_stable_frames(min_stable_frames),
        }
    }

    /// Every token emitted so far in this session, oldest first.
    pub fn history(&self) -> &[String] {
        self.stabilizer.history()
    }

    pub fn last_token(&self) -> Option<&str> {
        self.stabilizer.last_token()
    }

    pub fn stabilizer(&self) -> &GestureStabilizer {
        &self.stabilizer
    }

    pub(crate) fn stabilizer_mut(&mut self) -> &mut GestureStabilizer {
        &mut self.stabilizer
    }
}

// ---------------------------------------------------------------------------
// Stage
// ---------------------------------------------------------------------------

/// Collaborator stages of the per-frame pipeline, in call order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Detect,
    Classify,
    Synthesize,
    Playback,
}

impl Stage {
    /// Short label used in log lines.
    pub fn label(&self) -> &'static str {
        match self {
            Stage::Detect => "detect",
            Stage::Classify => "classify",
            Stage::Synthesize => "synthesize",
            Stage::Playback => "playback",
        }
    }
}

// ---------------------------------------------------------------------------
// FrameOutcome
// ---------------------------------------------------------------------------

/// What happened to one frame.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FrameOutcome {
    /// The detector reported a hand.
    pub hand_present: bool,
    /// Token the classified gesture mapped to, if classification ran.
    pub token: Option<String>,
    /// The stabilizer confirmed a transition on this frame.
    pub emitted: bool,
    /// The stage whose collaborator failed, if any.
    pub degraded: Option<Stage>,
}

impl FrameOutcome {
    /// Emitted token, when this frame confirmed one.
    pub fn emitted_token(&self) -> Option<&str> {
        self.token.as_deref().filter(|_| self.emitted)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
