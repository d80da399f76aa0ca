//! Session control: one continuous run of the capture → process → display
//! loop, with a single guaranteed teardown.

pub mod controller;
pub mod display;

pub use controller::{SessionController, SessionError, SessionReport, SessionState, StopReason};
pub use display::{DisplayError, DisplaySink, HeadlessDisplay};
