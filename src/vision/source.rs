//! Video sources.
//!
//! [`VideoSource`] separates acquisition ([`open`](VideoSource::open)) from
//! reading so that the session can fail fast before entering its loop, and
//! exposes [`release`](VideoSource::release) as the single teardown hook.
//!
//! `read_frame` returns `Ok(None)` at end-of-stream, which is distinct from
//! `Err(_)` for a failed read.
//!
//! Two backends are provided:
//!
//! * [`RawVideoSource`]: packed RGB24 frames of a fixed size from a file,
//!   FIFO or stdin.  Pipe a camera through ffmpeg to run live:
//!   `ffmpeg -f v4l2 -i /dev/video0 -f rawvideo -pix_fmt rgb24 - | glavox`
//! * [`ImageDirSource`]: PNG/JPEG files replayed in file-name order.

use std::fs::File;
use std::io::{BufReader, ErrorKind, Read};
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::frame::{Frame, FrameError};

// ---------------------------------------------------------------------------
// CaptureError
// ---------------------------------------------------------------------------

/// Errors that can occur while opening or reading a video source.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("cannot open video source {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("no frames found in {0}")]
    Empty(String),

    #[error("video source read before open")]
    NotOpen,

    #[error("read failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("stream ended mid-frame ({got} of {expected} bytes)")]
    Truncated { expected: usize, got: usize },

    #[error("cannot decode {path}: {message}")]
    Decode { path: String, message: String },

    #[error("invalid frame: {0}")]
    Frame(#[from] FrameError),
}

// ---------------------------------------------------------------------------
// VideoSource trait
// ---------------------------------------------------------------------------

/// A producer of frames owned by the session controller.
pub trait VideoSource: Send {
    /// Acquire the underlying device or file.
    fn open(&mut self) -> Result<(), CaptureError>;

    /// Next frame, or `Ok(None)` once the stream has ended.
    fn read_frame(&mut self) -> Result<Option<Frame>, CaptureError>;

    /// Release the underlying device or file.  Further reads fail with
    /// [`CaptureError::NotOpen`].
    fn release(&mut self);

    /// Short description for logs.
    fn describe(&self) -> String;
}

// ---------------------------------------------------------------------------
// RawVideoSource
// ---------------------------------------------------------------------------

/// Fixed-size RGB24 frames read back to back from a byte stream.
pub struct RawVideoSource {
    path: PathBuf,
    width: u32,
    height: u32,
    reader: Option<Box<dyn Read + Send>>,
}

impl RawVideoSource {
    /// `path` of `-` reads from stdin.
    pub fn new(path: impl Into<PathBuf>, width: u32, height: u32) -> Self {
        Self {
            path: path.into(),
            width,
            height,
            reader: None,
        }
    }

    /// Read from an already-open stream (tests, in-memory playback).
    pub fn from_reader(reader: impl Read + Send + 'static, width: u32, height: u32) -> Self {
        Self {
            path: PathBuf::from("<reader>"),
            width,
            height,
            reader: Some(Box::new(reader)),
        }
    }

    fn frame_len(&self) -> usize {
        self.width as usize * self.height as usize * 3
    }
}

impl VideoSource for RawVideoSource {
    fn open(&mut self) -> Result<(), CaptureError> {
        if self.reader.is_some() {
            return Ok(());
        }
        if self.width == 0 || self.height == 0 {
            return Err(CaptureError::Frame(FrameError::Empty {
                width: self.width,
                height: self.height,
            }));
        }
        let reader: Box<dyn Read + Send> = if self.path == Path::new("-") {
            Box::new(BufReader::new(std::io::stdin()))
        } else {
            let file = File::open(&self.path).map_err(|source| CaptureError::Open {
                path: self.path.display().to_string(),
                source,
            })?;
            Box::new(BufReader::new(file))
        };
        self.reader = Some(reader);
        Ok(())
    }

    fn read_frame(&mut self) -> Result<Option<Frame>, CaptureError> {
        let expected = self.frame_len();
        let reader = self.reader.as_mut().ok_or(CaptureError::NotOpen)?;

        let mut buf = vec![0_u8; expected];
        let mut got = 0;
        while got < expected {
            match reader.read(&mut buf[got..]) {
                Ok(0) => break,
                Ok(n) => got += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(CaptureError::Io(e)),
            }
        }

        match got {
            0 => Ok(None),
            n if n < expected => Err(CaptureError::Truncated { expected, got: n }),
            _ => Ok(Some(Frame::new(self.width, self.height, 3, buf)?)),
        }
    }

    fn release(&mut self) {
        self.reader = None;
    }

    fn describe(&self) -> String {
        format!("raw rgb24 {}x{} from {}", self.width, self.height, self.path.display())
    }
}

// ---------------------------------------------------------------------------
// ImageDirSource
// ---------------------------------------------------------------------------

/// Replays the PNG/JPEG files of a directory as a video stream.
pub struct ImageDirSource {
    dir: PathBuf,
    files: Vec<PathBuf>,
    cursor: usize,
    opened: bool,
}

impl ImageDirSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            files: Vec::new(),
            cursor: 0,
            opened: false,
        }
    }

    fn is_image(path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| matches!(e.to_ascii_lowercase().as_str(), "png" | "jpg" | "jpeg"))
    }
}

impl VideoSource for ImageDirSource {
    fn open(&mut self) -> Result<(), CaptureError> {
        let entries = std::fs::read_dir(&self.dir).map_err(|source| CaptureError::Open {
            path: self.dir.display().to_string(),
            source,
        })?;

        let mut files: Vec<PathBuf> = entries
            .filter_map(|e| e.ok().map(|e| e.path()))
            .filter(|p| Self::is_image(p))
            .collect();
        files.sort();

        if files.is_empty() {
            return Err(CaptureError::Empty(self.dir.display().to_string()));
        }

        self.files = files;
        self.cursor = 0;
        self.opened = true;
        Ok(())
    }

    fn read_frame(&mut self) -> Result<Option<Frame>, CaptureError> {
        if !self.opened {
            return Err(CaptureError::NotOpen);
        }
        let Some(path) = self.files.get(self.cursor) else {
            return Ok(None);
        };
        self.cursor += 1;

        let image = image::open(path).map_err(|e| CaptureError::Decode {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        let rgb = image.to_rgb8();
        let (w, h) = rgb.dimensions();
        Ok(Some(Frame::new(w, h, 3, rgb.into_raw())?))
    }

    fn release(&mut self) {
        self.files.clear();
        self.opened = false;
    }

    fn describe(&self) -> String {
        format!("image directory {}", self.dir.display())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
