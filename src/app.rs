//! GLAVOX preview window (eframe/egui).
//!
//! # Architecture
//!
//! eframe must own the main thread, so the session loop runs on its own
//! thread and talks to the window through two endpoints created together by
//! [`preview_channel`]:
//!
//! * [`PreviewDisplay`]: the session side.  Implements
//!   [`DisplaySink`]: `show` pushes frames into a bounded channel (a full
//!   channel drops the frame instead of blocking the loop), `poll_exit` reads
//!   the shared exit flag, `close` drops the sender.
//! * [`PreviewApp`]: the window side.  Drains the channel each repaint and
//!   keeps only the newest frame, sets the exit flag on the exit key, Escape
//!   or a window close, and closes the window once the session hangs up.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, SyncSender, TryRecvError, TrySendError};
use std::sync::Arc;
use std::time::Duration;

use eframe::egui;

use crate::config::DisplayConfig;
use crate::hotkey::{parse_key, DEFAULT_EXIT_KEY};
use crate::session::{DisplayError, DisplaySink};
use crate::vision::Frame;

/// Frames buffered between the session and the window.
const FRAME_QUEUE: usize = 2;
/// Repaint interval while waiting for frames (~60 fps).
const REPAINT_EVERY: Duration = Duration::from_millis(16);

/// Create the linked session/window endpoints for one session.
pub fn preview_channel(config: &DisplayConfig) -> (PreviewDisplay, PreviewApp) {
    let (tx, rx) = mpsc::sync_channel(FRAME_QUEUE);
    let exit = Arc::new(AtomicBool::new(false));

    let exit_key = parse_key(&config.exit_key).unwrap_or_else(|| {
        log::warn!(
            "unknown exit key {:?}; using {}",
            config.exit_key,
            DEFAULT_EXIT_KEY.name()
        );
        DEFAULT_EXIT_KEY
    });

    let display = PreviewDisplay {
        tx: Some(tx),
        exit: Arc::clone(&exit),
        dropped: 0,
    };
    let app = PreviewApp {
        rx,
        exit,
        exit_key,
        texture: None,
        hung_up: false,
    };
    (display, app)
}

/// Native window options for the preview.
pub fn native_options(config: &DisplayConfig) -> eframe::NativeOptions {
    let viewport = egui::ViewportBuilder::default()
        .with_title(config.window_title.clone())
        .with_inner_size([660.0, 500.0])
        .with_min_inner_size([320.0, 240.0]);

    eframe::NativeOptions {
        viewport,
        ..Default::default()
    }
}

// ---------------------------------------------------------------------------
// PreviewDisplay (session side)
// ---------------------------------------------------------------------------

pub struct PreviewDisplay {
    tx: Option<SyncSender<Frame>>,
    exit: Arc<AtomicBool>,
    dropped: u64,
}

impl PreviewDisplay {
    /// Shared exit flag; setting it ends the session at the next poll.
    pub fn exit_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.exit)
    }
}

impl DisplaySink for PreviewDisplay {
    fn show(&mut self, frame: &Frame) -> Result<(), DisplayError> {
        let tx = self.tx.as_ref().ok_or(DisplayError::Closed)?;
        match tx.try_send(frame.clone()) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => {
                self.dropped += 1;
                Ok(())
            }
            // The window went away because the operator closed it: that is
            // an exit request, reported by `poll_exit`, not a failure.
            Err(TrySendError::Disconnected(_)) if self.exit.load(Ordering::Acquire) => Ok(()),
            Err(TrySendError::Disconnected(_)) => Err(DisplayError::Closed),
        }
    }

    fn poll_exit(&mut self) -> bool {
        self.exit.load(Ordering::Acquire)
    }

    fn close(&mut self) {
        self.tx = None;
        if self.dropped > 0 {
            log::debug!("preview dropped {} frames while the window was busy", self.dropped);
        }
    }
}

// ---------------------------------------------------------------------------
// PreviewApp (window side)
// ---------------------------------------------------------------------------

/// eframe application showing the latest processed frame.
pub struct PreviewApp {
    rx: Receiver<Frame>,
    exit: Arc<AtomicBool>,
    exit_key: egui::Key,
    texture: Option<egui::TextureHandle>,
    hung_up: bool,
}

impl PreviewApp {
    /// Take every pending frame and return the newest one.
    fn latest_frame(&mut self) -> Option<Frame> {
        let mut latest = None;
        loop {
            match self.rx.try_recv() {
                Ok(frame) => latest = Some(frame),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.hung_up = true;
                    break;
                }
            }
        }
        latest
    }

    fn request_exit(&self) {
        if !self.exit.swap(true, Ordering::AcqRel) {
            log::info!("exit requested from preview window");
        }
    }
}

impl eframe::App for PreviewApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if let Some(frame) = self.latest_frame() {
            let image = to_color_image(&frame);
            match &mut self.texture {
                Some(texture) => texture.set(image, egui::TextureOptions::LINEAR),
                None => {
                    let texture = ctx.load_texture("frame", image, egui::TextureOptions::LINEAR);
                    self.texture = Some(texture);
                }
            }
        }

        let exit_key = self.exit_key;
        let exit_pressed =
            ctx.input(|i| i.key_pressed(exit_key) || i.key_pressed(egui::Key::Escape));
        let close_requested = ctx.input(|i| i.viewport().close_requested());
        if exit_pressed || close_requested {
            self.request_exit();
        }
        if exit_pressed || self.hung_up {
            ctx.send_viewport_cmd(egui::ViewportCommand::Close);
        }

        egui::CentralPanel::default().show(ctx, |ui| match &self.texture {
            Some(texture) => {
                ui.centered_and_justified(|ui| {
                    ui.add(egui::Image::new(texture).shrink_to_fit());
                });
            }
            None => {
                ui.centered_and_justified(|ui| {
                    ui.label(
                        egui::RichText::new("waiting for video…")
                            .color(egui::Color32::from_rgb(150, 150, 150)),
                    );
                });
            }
        });

        ctx.request_repaint_after(REPAINT_EVERY);
    }
}

/// Convert a frame into an egui image.
pub fn to_color_image(frame: &Frame) -> egui::ColorImage {
    let size = [frame.width() as usize, frame.height() as usize];
    match frame.channels() {
        4 => egui::ColorImage::from_rgba_unmultiplied(size, frame.as_bytes()),
        1 => egui::ColorImage::from_gray(size, frame.as_bytes()),
        _ => egui::ColorImage::from_rgb(size, frame.as_bytes()),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn frame() -> Frame {
        Frame::filled(4, 3, [10, 20, 30])
    }

    #[test]
    fn frames_reach_the_window_newest_last() {
        let (mut display, mut app) = preview_channel(&DisplayConfig::default());
        display.show(&frame()).unwrap();
        display.show(&Frame::filled(4, 3, [1, 1, 1])).unwrap();

        let latest = app.latest_frame().expect("frame");
        assert_eq!(latest.rgb(0, 0), Some([1, 1, 1]));
        assert!(app.latest_frame().is_none());
    }

    #[test]
    fn full_queue_drops_instead_of_blocking() {
        let (mut display, _app) = preview_channel(&DisplayConfig::default());
        for _ in 0..FRAME_QUEUE + 3 {
            display.show(&frame()).unwrap();
        }
        assert_eq!(display.dropped, 3);
    }

    #[test]
    fn exit_flag_is_shared() {
        let (mut display, app) = preview_channel(&DisplayConfig::default());
        assert!(!display.poll_exit());
        app.request_exit();
        assert!(display.poll_exit());
        assert!(display.exit_flag().load(Ordering::SeqCst));
    }

    #[test]
    fn window_gone_without_exit_is_a_failure() {
        let (mut display, app) = preview_channel(&DisplayConfig::default());
        drop(app);
        assert!(matches!(display.show(&frame()), Err(DisplayError::Closed)));
    }

    #[test]
    fn window_closed_by_operator_is_an_exit() {
        let (mut display, app) = preview_channel(&DisplayConfig::default());
        app.request_exit();
        drop(app);
        assert!(display.show(&frame()).is_ok());
        assert!(display.poll_exit());
    }

    #[test]
    fn close_hangs_up_the_window() {
        let (mut display, mut app) = preview_channel(&DisplayConfig::default());
        display.close();
        assert!(app.latest_frame().is_none());
        assert!(app.hung_up);
        assert!(matches!(display.show(&frame()), Err(DisplayError::Closed)));
    }

    #[test]
    fn unknown_exit_key_falls_back_to_q() {
        let config = DisplayConfig {
            exit_key: "Hyper+Q".into(),
            ..DisplayConfig::default()
        };
        let (_display, app) = preview_channel(&config);
        assert_eq!(app.exit_key, DEFAULT_EXIT_KEY);
    }

    #[test]
    fn color_image_matches_frame() {
        let image = to_color_image(&frame());
        assert_eq!(image.size, [4, 3]);
        assert_eq!(image.pixels[0], egui::Color32::from_rgb(10, 20, 30));
    }
}
