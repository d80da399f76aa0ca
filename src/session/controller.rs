//! Session lifecycle: capture → process → display until something ends it.
//!
//! # State machine
//!
//! ```text
//! Idle ──start()──▶ Running ──exit / end-of-stream / frame limit──▶ Stopping ──▶ Stopped
//!   │                  └──read failure / display failure / panic──▶ Stopping (error)
//!   └──open failure──────────────────────────────────────────────────────────▶ Stopped
//! ```
//!
//! Leaving `Stopping` runs the single teardown: the video source is released
//! and the display closed exactly once.  Teardown is guarded by the state, so
//! a second call (including the one from `Drop`) does nothing.  An open
//! failure skips teardown because nothing was acquired.

use std::any::Any;
use std::fs::OpenOptions;
use std::io::Write;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::time::{Duration, Instant};

use thiserror::Error;

use super::display::DisplaySink;
use crate::config::SessionConfig;
use crate::pipeline::{FrameOutcome, FramePipeline, PipelineState};
use crate::vision::{CaptureError, VideoSource};

// ---------------------------------------------------------------------------
// SessionState / StopReason
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Idle,
    Running,
    Stopping,
    Stopped,
}

impl SessionState {
    pub fn label(&self) -> &'static str {
        match self {
            SessionState::Idle => "Idle",
            SessionState::Running => "Running",
            SessionState::Stopping => "Stopping",
            SessionState::Stopped => "Stopped",
        }
    }
}

/// Why the frame loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The operator pressed the exit key or closed the window.
    ExitRequested,
    /// The video source ran out of frames.
    EndOfStream,
    /// `session.max_frames` was reached.
    FrameLimit,
    /// Reading a frame failed.
    ReadFailed,
    /// Showing a frame failed.
    DisplayFailed,
    /// A stage panicked.
    Panicked,
}

impl StopReason {
    /// `true` for the reasons that set the session's error flag.
    pub fn is_error(&self) -> bool {
        matches!(
            self,
            StopReason::ReadFailed | StopReason::DisplayFailed | StopReason::Panicked
        )
    }

    pub fn label(&self) -> &'static str {
        match self {
            StopReason::ExitRequested => "exit requested",
            StopReason::EndOfStream => "end of stream",
            StopReason::FrameLimit => "frame limit",
            StopReason::ReadFailed => "read failed",
            StopReason::DisplayFailed => "display failed",
            StopReason::Panicked => "panicked",
        }
    }
}

// ---------------------------------------------------------------------------
// SessionError / SessionReport
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("cannot open video source: {0}")]
    CaptureOpen(#[source] CaptureError),

    #[error("session is already running")]
    AlreadyStarted,

    #[error("session has already stopped")]
    AlreadyStopped,
}

/// Summary returned by [`SessionController::run`].
#[derive(Debug, Clone, PartialEq)]
pub struct SessionReport {
    pub frames: u64,
    /// Frames on which the detector reported a hand.
    pub hands_seen: u64,
    /// Confirmed gesture transitions.
    pub emitted: u64,
    /// Frames on which some collaborator failed.
    pub stage_failures: u64,
    /// Emitted tokens in order.
    pub history: Vec<String>,
    pub stop_reason: StopReason,
    pub elapsed: Duration,
}

impl SessionReport {
    /// Space-separated history, as written to the transcript.
    pub fn transcript(&self) -> String {
        self.history.join(" ")
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct Counters {
    frames: u64,
    hands_seen: u64,
    emitted: u64,
    stage_failures: u64,
}

// ---------------------------------------------------------------------------
// SessionController
// ---------------------------------------------------------------------------

/// Owns the video source, the frame pipeline and the display for one session.
pub struct SessionController {
    source: Box<dyn VideoSource>,
    pipeline: FramePipeline,
    display: Box<dyn DisplaySink>,
    config: SessionConfig,
    state: SessionState,
    pipeline_state: PipelineState,
    /// Emitted tokens, kept here as well so a panic that loses the pipeline
    /// state mid-frame does not lose the transcript.
    transcript: Vec<String>,
    counters: Counters,
    stop_reason: Option<StopReason>,
    started_at: Option<Instant>,
}

impl SessionController {
    pub fn new(
        source: Box<dyn VideoSource>,
        pipeline: FramePipeline,
        display: Box<dyn DisplaySink>,
    ) -> Self {
        Self {
            source,
            pipeline,
            display,
            config: SessionConfig::default(),
            state: SessionState::Idle,
            pipeline_state: PipelineState::default(),
            transcript: Vec::new(),
            counters: Counters::default(),
            stop_reason: None,
            started_at: None,
        }
    }

    /// Start from `state` instead of a default one (e.g. a dwell setting).
    pub fn with_pipeline_state(mut self, state: PipelineState) -> Self {
        self.pipeline_state = state;
        self
    }

    pub fn with_config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn stop_reason(&self) -> Option<StopReason> {
        self.stop_reason
    }

    /// Tokens emitted so far.
    pub fn history(&self) -> &[String] {
        &self.transcript
    }

    /// Open the video source.  `Idle → Running`, or `Idle → Stopped` when the
    /// source cannot be opened.
    pub fn start(&mut self) -> Result<(), SessionError> {
        match self.state {
            SessionState::Idle => {}
            SessionState::Running => return Err(SessionError::AlreadyStarted),
            SessionState::Stopping | SessionState::Stopped => {
                return Err(SessionError::AlreadyStopped)
            }
        }

        if let Err(e) = self.source.open() {
            log::error!("session: {} failed to open: {e}", self.source.describe());
            self.state = SessionState::Stopped;
            return Err(SessionError::CaptureOpen(e));
        }

        log::info!("session started: {}", self.source.describe());
        self.started_at = Some(Instant::now());
        self.state = SessionState::Running;
        Ok(())
    }

    /// Run the frame loop to completion, starting the session first if it is
    /// still idle.  Teardown has happened by the time this returns `Ok`.
    pub fn run(&mut self) -> Result<SessionReport, SessionError> {
        if self.state == SessionState::Idle {
            self.start()?;
        }
        if self.state != SessionState::Running {
            return Err(SessionError::AlreadyStopped);
        }

        let reason = self.run_loop();
        self.stop_reason = Some(reason);
        self.state = SessionState::Stopping;
        if reason.is_error() {
            log::error!("session stopping: {}", reason.label());
        } else {
            log::info!("session stopping: {}", reason.label());
        }
        self.teardown();

        Ok(self.report(reason))
    }

    fn run_loop(&mut self) -> StopReason {
        loop {
            if let Some(max) = self.config.max_frames {
                if self.counters.frames >= max {
                    return StopReason::FrameLimit;
                }
            }

            match panic::catch_unwind(AssertUnwindSafe(|| self.step())) {
                Ok(None) => {}
                Ok(Some(reason)) => return reason,
                Err(payload) => {
                    log::error!("session: stage panicked: {}", panic_message(payload.as_ref()));
                    return StopReason::Panicked;
                }
            }
        }
    }

    /// One iteration: read → process → show → poll.  `Some` ends the loop.
    fn step(&mut self) -> Option<StopReason> {
        let frame = match self.source.read_frame() {
            Ok(Some(frame)) => frame,
            Ok(None) => return Some(StopReason::EndOfStream),
            Err(e) => {
                log::error!("session: frame read failed: {e}");
                return Some(StopReason::ReadFailed);
            }
        };
        self.counters.frames += 1;

        let state = std::mem::take(&mut self.pipeline_state);
        let processed = self.pipeline.process(frame, state);
        self.pipeline_state = processed.state;
        self.record(&processed.outcome);

        if let Err(e) = self.display.show(&processed.frame) {
            log::error!("session: display failed: {e}");
            return Some(StopReason::DisplayFailed);
        }
        if self.display.poll_exit() {
            return Some(StopReason::ExitRequested);
        }
        None
    }

    fn record(&mut self, outcome: &FrameOutcome) {
        if outcome.hand_present {
            self.counters.hands_seen += 1;
        }
        if outcome.degraded.is_some() {
            self.counters.stage_failures += 1;
        }
        if let Some(token) = outcome.emitted_token() {
            self.counters.emitted += 1;
            self.transcript.push(token.to_string());
        }
    }

    /// Release everything acquired by [`start`](Self::start).  Runs at most
    /// once per session.
    fn teardown(&mut self) {
        match self.state {
            SessionState::Running | SessionState::Stopping => {}
            SessionState::Idle | SessionState::Stopped => return,
        }
        self.state = SessionState::Stopping;

        self.source.release();
        self.display.close();
        self.state = SessionState::Stopped;

        log::info!(
            "session stopped after {} frames: [{}]",
            self.counters.frames,
            self.transcript.join(" ")
        );
        if let Some(path) = &self.config.transcript_file {
            if let Err(e) = append_transcript(path, &self.transcript) {
                log::warn!("cannot write transcript {}: {e}", path.display());
            }
        }
    }

    fn report(&self, stop_reason: StopReason) -> SessionReport {
        SessionReport {
            frames: self.counters.frames,
            hands_seen: self.counters.hands_seen,
            emitted: self.counters.emitted,
            stage_failures: self.counters.stage_failures,
            history: self.transcript.clone(),
            stop_reason,
            elapsed: self.started_at.map(|t| t.elapsed()).unwrap_or_default(),
        }
    }
}

impl Drop for SessionController {
    fn drop(&mut self) {
        self.teardown();
    }
}

fn append_transcript(path: &Path, history: &[String]) -> std::io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(file, "{}", history.join(" "))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
