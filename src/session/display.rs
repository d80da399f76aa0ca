//! Display sinks for processed frames.
//!
//! The session shows every processed frame and then asks the display whether
//! the operator has requested exit.  [`close`](DisplaySink::close) is called
//! exactly once, during session teardown.

use thiserror::Error;

use crate::vision::Frame;

#[derive(Debug, Error)]
pub enum DisplayError {
    /// The window or device behind the display has gone away.
    #[error("display closed")]
    Closed,
}

/// Object-safe interface for frame output.
pub trait DisplaySink: Send {
    /// Present `frame`.  Should not block for long.
    fn show(&mut self, frame: &Frame) -> Result<(), DisplayError>;

    /// `true` once the operator has asked to end the session.
    fn poll_exit(&mut self) -> bool;

    /// Release the window or device.
    fn close(&mut self);
}

const _: fn() = || {
    fn _assert_object_safe(_: Box<dyn DisplaySink>) {}
};

// ---------------------------------------------------------------------------
// HeadlessDisplay
// ---------------------------------------------------------------------------

/// Log every this many frames at debug level.
const PROGRESS_EVERY: u64 = 100;

/// Display that shows nothing and never requests exit.  Sessions using it
/// end at end-of-stream, on a frame limit or on error.
#[derive(Debug, Default)]
pub struct HeadlessDisplay {
    shown: u64,
}

impl HeadlessDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames_shown(&self) -> u64 {
        self.shown
    }
}

impl DisplaySink for HeadlessDisplay {
    fn show(&mut self, _frame: &Frame) -> Result<(), DisplayError> {
        self.shown += 1;
        if self.shown % PROGRESS_EVERY == 0 {
            log::debug!("headless: {} frames processed", self.shown);
        }
        Ok(())
    }

    fn poll_exit(&mut self) -> bool {
        false
    }

    fn close(&mut self) {
        log::debug!("headless display closed after {} frames", self.shown);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headless_counts_and_never_exits() {
        let mut display = HeadlessDisplay::new();
        let frame = Frame::filled(2, 2, [0, 0, 0]);
        for _ in 0..3 {
            display.show(&frame).unwrap();
            assert!(!display.poll_exit());
        }
        assert_eq!(display.frames_shown(), 3);
        display.close();
    }
}
