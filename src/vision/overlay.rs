//! Text and box rendering directly into a [`Frame`].
//!
//! Tokens are drawn with a built-in 5x7 bitmap font (A–Z, 0–9, space).
//! Lowercase input is drawn uppercase; any other character is drawn as a
//! hollow box so unexpected labels stay visible.

use super::frame::Frame;
use crate::config::OverlayConfig;

const GLYPH_W: u32 = 5;
const GLYPH_H: u32 = 7;
/// Pixels per font cell at scale 1 (gives ~21 px tall capitals).
const CELL: u32 = 3;

// ---------------------------------------------------------------------------
// TextStyle
// ---------------------------------------------------------------------------

/// Where and how a token is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextStyle {
    /// Left edge in pixels.
    pub x: u32,
    /// Baseline (bottom of the glyphs) in pixels.
    pub y: u32,
    pub color: [u8; 3],
    /// Integer glyph magnification, at least 1.
    pub scale: u32,
    /// Stroke thickness in pixels, at least 1.
    pub thickness: u32,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self::from(&OverlayConfig::default())
    }
}

impl From<&OverlayConfig> for TextStyle {
    fn from(cfg: &OverlayConfig) -> Self {
        Self {
            x: cfg.x,
            y: cfg.y,
            color: cfg.color,
            scale: cfg.scale.max(1),
            thickness: cfg.thickness.max(1),
        }
    }
}

// ---------------------------------------------------------------------------
// Rect
// ---------------------------------------------------------------------------

/// Axis-aligned pixel rectangle, inclusive of `(x0, y0)` and `(x1, y1)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x0: u32,
    pub y0: u32,
    pub x1: u32,
    pub y1: u32,
}

impl Rect {
    pub fn width(&self) -> u32 {
        self.x1.saturating_sub(self.x0) + 1
    }

    pub fn height(&self) -> u32 {
        self.y1.saturating_sub(self.y0) + 1
    }
}

// ---------------------------------------------------------------------------
// Drawing
// ---------------------------------------------------------------------------

/// Fill a rectangle, clipped to the frame.
fn fill(frame: &mut Frame, x: u32, y: u32, w: u32, h: u32, color: [u8; 3]) {
    let x_end = x.saturating_add(w).min(frame.width());
    let y_end = y.saturating_add(h).min(frame.height());
    for yy in y..y_end {
        for xx in x..x_end {
            frame.put_rgb(xx, yy, color);
        }
    }
}

/// Draw the outline of `rect` with the given stroke thickness.
pub fn draw_rect(frame: &mut Frame, rect: Rect, color: [u8; 3], thickness: u32) {
    let t = thickness.max(1);
    let (w, h) = (rect.width(), rect.height());
    fill(frame, rect.x0, rect.y0, w, t, color);
    fill(frame, rect.x0, rect.y1.saturating_sub(t - 1), w, t, color);
    fill(frame, rect.x0, rect.y0, t, h, color);
    fill(frame, rect.x1.saturating_sub(t - 1), rect.y0, t, h, color);
}

/// Draw `text` onto `frame`.  Pixels falling outside the frame are clipped.
pub fn draw_text(frame: &mut Frame, text: &str, style: &TextStyle) {
    let cell = CELL.saturating_mul(style.scale.max(1));
    let pad = style.thickness.max(1) - 1;
    let dot = cell.saturating_add(pad.saturating_mul(2));
    let advance = (GLYPH_W + 1).saturating_mul(cell);
    let top = style.y.saturating_sub(GLYPH_H.saturating_mul(cell));

    for (i, ch) in text.chars().enumerate() {
        let left = style.x.saturating_add((i as u32).saturating_mul(advance));
        let rows = glyph(ch);
        for (row, bits) in rows.iter().enumerate() {
            for col in 0..GLYPH_W {
                if bits & (1 << (GLYPH_W - 1 - col)) == 0 {
                    continue;
                }
                let px = left.saturating_add(col.saturating_mul(cell)).saturating_sub(pad);
                let py = top
                    .saturating_add((row as u32).saturating_mul(cell))
                    .saturating_sub(pad);
                fill(frame, px, py, dot, dot, style.color);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Font
// ---------------------------------------------------------------------------

/// Row bitmaps, most significant of the low five bits is the leftmost column.
fn glyph(ch: char) -> [u8; 7] {
    match ch.to_ascii_uppercase() {
        'A' => [0b01110, 0b10001, 0b10001, 0b11111, 0b10001, 0b10001, 0b10001],
        'B' => [0b11110, 0b10001, 0b10001, 0b11110, 0b10001, 0b10001, 0b11110],
        'C' => [0b01110, 0b10001, 0b10000, 0b10000, 0b10000, 0b10001, 0b01110],
        'D' => [0b11110, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b11110],
        'E' => [0b11111, 0b10000, 0b10000, 0b11110, 0b10000, 0b10000, 0b11111],
        'F' => [0b11111, 0b10000, 0b10000, 0b11110, 0b10000, 0b10000, 0b10000],
        'G' => [0b01110, 0b10001, 0b10000, 0b10111, 0b10001, 0b10001, 0b01111],
        'H' => [0b10001, 0b10001, 0b10001, 0b11111, 0b10001, 0b10001, 0b10001],
        'I' => [0b01110, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110],
        'J' => [0b00111, 0b00010, 0b00010, 0b00010, 0b00010, 0b10010, 0b01100],
        'K' => [0b10001, 0b10010, 0b10100, 0b11000, 0b10100, 0b10010, 0b10001],
        'L' => [0b10000, 0b10000, 0b10000, 0b10000, 0b10000, 0b10000, 0b11111],
        'M' => [0b10001, 0b11011, 0b10101, 0b10101, 0b10001, 0b10001, 0b10001],
        'N' => [0b10001, 0b10001, 0b11001, 0b10101, 0b10011, 0b10001, 0b10001],
        'O' => [0b01110, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01110],
        'P' => [0b11110, 0b10001, 0b10001, 0b11110, 0b10000, 0b10000, 0b10000],
        'Q' => [0b01110, 0b10001, 0b10001, 0b10001, 0b10101, 0b10010, 0b01101],
        'R' => [0b11110, 0b10001, 0b10001, 0b11110, 0b10100, 0b10010, 0b10001],
        'S' => [0b01111, 0b10000, 0b10000, 0b01110, 0b00001, 0b00001, 0b11110],
        'T' => [0b11111, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100],
        'U' => [0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01110],
        'V' => [0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01010, 0b00100],
        'W' => [0b10001, 0b10001, 0b10001, 0b10101, 0b10101, 0b10101, 0b01010],
        'X' => [0b10001, 0b10001, 0b01010, 0b00100, 0b01010, 0b10001, 0b10001],
        'Y' => [0b10001, 0b10001, 0b01010, 0b00100, 0b00100, 0b00100, 0b00100],
        'Z' => [0b11111, 0b00001, 0b00010, 0b00100, 0b01000, 0b10000, 0b11111],
        '0' => [0b01110, 0b10001, 0b10011, 0b10101, 0b11001, 0b10001, 0b01110],
        '1' => [0b00100, 0b01100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110],
        '2' => [0b01110, 0b10001, 0b00001, 0b00010, 0b00100, 0b01000, 0b11111],
        '3' => [0b11111, 0b00010, 0b00100, 0b00010, 0b00001, 0b10001, 0b01110],
        '4' => [0b00010, 0b00110, 0b01010, 0b10010, 0b11111, 0b00010, 0b00010],
        '5' => [0b11111, 0b10000, 0b11110, 0b00001, 0b00001, 0b10001, 0b01110],
        '6' => [0b00110, 0b01000, 0b10000, 0b11110, 0b10001, 0b10001, 0b01110],
        '7' => [0b11111, 0b00001, 0b00010, 0b00100, 0b01000, 0b01000, 0b01000],
        '8' => [0b01110, 0b10001, 0b10001, 0b01110, 0b10001, 0b10001, 0b01110],
        '9' => [0b01110, 0b10001, 0b10001, 0b01111, 0b00001, 0b00010, 0b01100],
        ' ' => [0; 7],
        _ => [0b11111, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b11111],
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
