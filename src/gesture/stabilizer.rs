//! Change-detection debouncer for classified tokens.
//!
//! A steadily held gesture is classified identically on every frame; only
//! the first frame of each run should reach speech.  [`GestureStabilizer`]
//! keeps the last confirmed token and an append-only history of every
//! confirmed token.
//!
//! Invariants:
//!
//! * `history` never holds two equal adjacent tokens.
//! * `last_token() == history().last()` at all times.
//! * Both change only when [`observe`](GestureStabilizer::observe) returns
//!   `Some(_)`.
//!
//! With `min_stable_frames > 1` a differing token must be seen that many
//! times in a row before it is confirmed; the pending candidate is auxiliary
//! and never shows up in the history.

// ---------------------------------------------------------------------------
// GestureStabilizer
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GestureStabilizer {
    last_token: Option<String>,
    history: Vec<String>,
    min_stable_frames: u32,
    /// Token waiting for confirmation and how many times in a row it was seen.
    candidate: Option<(String, u32)>,
}

impl GestureStabilizer {
    /// Confirm on the first frame that differs from the last token.
    pub fn new() -> Self {
        Self::with_min_stable_frames(1)
    }

    /// Require `frames` consecutive identical observations (0 is treated as 1).
    pub fn with_min_stable_frames(frames: u32) -> Self {
        Self {
            last_token: None,
            history: Vec::new(),
            min_stable_frames: frames.max(1),
            candidate: None,
        }
    }

    /// Feed one classified token.  Returns `Some(token)` exactly when a
    /// transition is confirmed.
    pub fn observe(&mut self, token: &str) -> Option<String> {
        if self.last_token.as_deref() == Some(token) {
            self.candidate = None;
            return None;
        }

        if self.min_stable_frames > 1 {
            let seen = match &mut self.candidate {
                Some((pending, n)) if pending.as_str() == token => {
                    *n += 1;
                    *n
                }
                _ => {
                    self.candidate = Some((token.to_string(), 1));
                    1
                }
            };
            if seen < self.min_stable_frames {
                return None;
            }
            self.candidate = None;
        }

        self.history.push(token.to_string());
        self.last_token = Some(token.to_string());
        Some(token.to_string())
    }

    /// Forget any pending candidate.  Confirmed state is untouched.
    pub fn reset_candidate(&mut self) {
        self.candidate = None;
    }

    /// The most recently confirmed token.
    pub fn last_token(&self) -> Option<&str> {
        self.last_token.as_deref()
    }

    /// Every confirmed token, oldest first.
    pub fn history(&self) -> &[String] {
        &self.history
    }

    pub fn min_stable_frames(&self) -> u32 {
        self.min_stable_frames
    }
}

impl Default for GestureStabilizer {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
