//! Frame normalisation for the gesture classifier.
//!
//! The classifier expects a fixed square RGB input scaled to `[0, 1]` in
//! channel-major (CHW) order.  Resampling is done by `image::imageops` with a
//! triangle (bilinear) filter; this module only adapts [`Frame`] to and from
//! `image` buffers and lays out the planes.

use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};

use super::frame::Frame;

/// Copy `frame` into an RGB image.  Gray is replicated, alpha dropped.
pub fn to_rgb_image(frame: &Frame) -> RgbImage {
    RgbImage::from_fn(frame.width(), frame.height(), |x, y| {
        Rgb(frame.rgb(x, y).unwrap_or_default())
    })
}

/// Resample `frame` to `width` x `height` RGB with a bilinear filter.
pub fn resize(frame: &Frame, width: u32, height: u32) -> RgbImage {
    let rgb = to_rgb_image(frame);
    if rgb.dimensions() == (width, height) {
        return rgb;
    }
    imageops::resize(&rgb, width, height, FilterType::Triangle)
}

/// Planar `f32` in `[0, 1]`: the R plane, then G, then B.
pub fn to_chw_unit(image: &RgbImage) -> Vec<f32> {
    let plane = image.width() as usize * image.height() as usize;
    let mut out = vec![0.0_f32; plane * 3];

    for (i, px) in image.pixels().enumerate() {
        for (c, v) in px.0.iter().enumerate() {
            out[c * plane + i] = *v as f32 / 255.0;
        }
    }

    out
}

/// Resize to `size` x `size` and normalise: the classifier's input contract.
pub fn prepare(frame: &Frame, size: u32) -> Vec<f32> {
    to_chw_unit(&resize(frame, size, size))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
