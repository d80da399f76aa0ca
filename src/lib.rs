//! GLAVOX: real-time sign-language to speech.
//!
//! A video stream of hand gestures is turned into spoken letters:
//!
//! ```text
//! VideoSource → HandDetector → GestureClassifier → GestureVocabulary
//!             → GestureStabilizer → SpeechSynthesizer → AudioSink
//! ```
//!
//! [`session::SessionController`] runs the loop and owns teardown;
//! [`pipeline::FramePipeline`] handles one frame at a time and never lets a
//! collaborator failure escape.

pub mod app;
pub mod bootstrap;
pub mod config;
pub mod gesture;
pub mod hotkey;
pub mod logging;
pub mod pipeline;
pub mod session;
pub mod speech;
pub mod vision;
