//! GLAVOX entry point.
//!
//! # Startup sequence
//!
//! 1. Load [`AppConfig`] (first argument, or the platform settings file).
//!    When the platform file does not exist yet, defaults are used and
//!    written there as a starting point.
//! 2. Initialise logging (stderr plus the configured log file).
//! 3. Build detector, classifier, vocabulary, synthesizer and audio sink.
//!    Any failure here is fatal.
//! 4. With the preview enabled: run the session on its own thread and
//!    [`eframe::run_native`] on the main thread until the window closes.
//!    Headless: run the session on the main thread.
//! 5. Log the session report.  Exit non-zero when the session ended on an
//!    error.

use std::path::PathBuf;
use std::sync::atomic::Ordering;

use anyhow::{anyhow, bail, Context};
use glavox::{
    app::{native_options, preview_channel},
    bootstrap::{self, Components},
    config::{AppConfig, AppPaths},
    logging,
    pipeline::PipelineState,
    session::{HeadlessDisplay, SessionController, SessionError, SessionReport},
    vision::TextStyle,
};

/// The configuration to run with, whether a default settings file should be
/// written, and the load error if defaults had to stand in.
fn load_config() -> (AppConfig, bool, Option<String>) {
    let (result, first_run) = match std::env::args_os().nth(1).map(PathBuf::from) {
        Some(path) => {
            let loaded = AppConfig::load_from(&path)
                .with_context(|| format!("config file {}", path.display()));
            (loaded, false)
        }
        None => (AppConfig::load(), !AppPaths::new().settings_file.exists()),
    };
    match result {
        Ok(config) => (config, first_run, None),
        Err(e) => (AppConfig::default(), false, Some(format!("{e:#}"))),
    }
}

fn main() -> anyhow::Result<()> {
    // 1-2. Configuration, then logging (the log file location is configurable)
    let (config, first_run, config_error) = load_config();
    logging::init(config.logging.log_file());
    log::info!("GLAVOX starting up");
    if let Some(e) = config_error {
        log::warn!("Failed to load config ({e}); using defaults");
    }
    if first_run {
        match config.save() {
            Ok(()) => log::info!(
                "wrote default settings to {}",
                AppPaths::new().settings_file.display()
            ),
            Err(e) => log::warn!("cannot write default settings: {e:#}"),
        }
    }

    // 3. Collaborators
    let components = Components::build(&config).map_err(|e| {
        log::error!("startup failed: {e}");
        anyhow!(e)
    })?;
    let pipeline = components.into_pipeline(TextStyle::from(&config.display.overlay));
    let source = bootstrap::build_source(&config.capture);
    let state = PipelineState::new(config.gesture.min_stable_frames);

    // 4. Session
    let outcome = if config.display.enabled {
        let (display, app) = preview_channel(&config.display);
        let exit = display.exit_flag();
        let mut session = SessionController::new(source, pipeline, Box::new(display))
            .with_pipeline_state(state)
            .with_config(config.session.clone());

        let handle = std::thread::Builder::new()
            .name("glavox-session".into())
            .spawn(move || session.run())
            .context("failed to spawn session thread")?;

        let ui = eframe::run_native(
            &config.display.window_title,
            native_options(&config.display),
            Box::new(move |_cc| Ok(Box::new(app))),
        );
        // The window is gone either way; make sure the session follows.
        exit.store(true, Ordering::Release);
        if let Err(e) = ui {
            log::error!("preview window failed: {e}");
        }

        handle
            .join()
            .map_err(|_| anyhow!("session thread panicked outside the frame loop"))?
    } else {
        let mut session = SessionController::new(source, pipeline, Box::new(HeadlessDisplay::new()))
            .with_pipeline_state(state)
            .with_config(config.session.clone());
        session.run()
    };

    // 5. Report
    finish(outcome)
}

fn finish(outcome: Result<SessionReport, SessionError>) -> anyhow::Result<()> {
    let report = outcome.map_err(|e| {
        log::error!("session failed: {e}");
        anyhow!(e)
    })?;

    log::info!(
        "session ended ({}) after {:.1}s: {} frames, {} with a hand, {} gestures, {} degraded",
        report.stop_reason.label(),
        report.elapsed.as_secs_f32(),
        report.frames,
        report.hands_seen,
        report.emitted,
        report.stage_failures,
    );
    if !report.history.is_empty() {
        log::info!("transcript: {}", report.transcript());
    }

    if report.stop_reason.is_error() {
        bail!("session ended with an error: {}", report.stop_reason.label());
    }
    Ok(())
}
