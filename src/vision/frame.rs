//! Owned pixel buffer passed through the pipeline.
//!
//! A [`Frame`] is produced by a [`VideoSource`](crate::vision::VideoSource),
//! moved into [`FramePipeline::process`](crate::pipeline::FramePipeline::process)
//! for exactly one iteration, and handed to the display afterwards.  Sources
//! always return freshly owned buffers, so nothing downstream can observe a
//! capture buffer being reused.

use thiserror::Error;

// ---------------------------------------------------------------------------
// FrameError
// ---------------------------------------------------------------------------

/// Reasons a pixel buffer cannot be turned into a [`Frame`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    #[error("frame has zero width or height ({width}x{height})")]
    Empty { width: u32, height: u32 },

    #[error("unsupported channel count {0} (expected 1, 3 or 4)")]
    Channels(u8),

    #[error("buffer holds {got} bytes, {width}x{height}x{channels} needs {expected}")]
    Length {
        width: u32,
        height: u32,
        channels: u8,
        expected: usize,
        got: usize,
    },
}

// ---------------------------------------------------------------------------
// Frame
// ---------------------------------------------------------------------------

/// Row-major, interleaved 8-bit image (gray, RGB or RGBA).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    width: u32,
    height: u32,
    channels: u8,
    data: Vec<u8>,
}

impl Frame {
    /// Wrap `data` after checking that its length matches the dimensions.
    pub fn new(width: u32, height: u32, channels: u8, data: Vec<u8>) -> Result<Self, FrameError> {
        if width == 0 || height == 0 {
            return Err(FrameError::Empty { width, height });
        }
        if !matches!(channels, 1 | 3 | 4) {
            return Err(FrameError::Channels(channels));
        }
        let expected = width as usize * height as usize * channels as usize;
        if data.len() != expected {
            return Err(FrameError::Length {
                width,
                height,
                channels,
                expected,
                got: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            channels,
            data,
        })
    }

    /// An RGB frame where every pixel is `rgb`.
    ///
    /// # Panics
    ///
    /// Panics if either dimension is zero.
    pub fn filled(width: u32, height: u32, rgb: [u8; 3]) -> Self {
        assert!(width > 0 && height > 0, "frame dimensions must be > 0");
        let data = rgb
            .iter()
            .copied()
            .cycle()
            .take(width as usize * height as usize * 3)
            .collect();
        Self {
            width,
            height,
            channels: 3,
            data,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    /// Raw interleaved bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Consume the frame and return its bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    fn offset(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * self.channels as usize
    }

    /// Pixel at `(x, y)` as an RGB triple.  Gray frames replicate the single
    /// channel; alpha is ignored.  Returns `None` outside the frame.
    pub fn rgb(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = self.offset(x, y);
        Some(match self.channels {
            1 => [self.data[i]; 3],
            _ => [self.data[i], self.data[i + 1], self.data[i + 2]],
        })
    }

    /// Overwrite the pixel at `(x, y)`.  Out-of-bounds writes are clipped.
    pub fn put_rgb(&mut self, x: u32, y: u32, rgb: [u8; 3]) {
        if x >= self.width || y >= self.height {
            return;
        }
        let i = self.offset(x, y);
        match self.channels {
            1 => {
                let luma = 0.299 * rgb[0] as f32 + 0.587 * rgb[1] as f32 + 0.114 * rgb[2] as f32;
                self.data[i] = luma.round().clamp(0.0, 255.0) as u8;
            }
            _ => self.data[i..i + 3].copy_from_slice(&rgb),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
