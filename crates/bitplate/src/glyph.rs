//! Glyph masks: rasterised text and Code 39 barcodes for plate labels.
//!
//! Text is rendered with `ab_glyph` onto a grayscale canvas and thresholded
//! into a [`GlyphMask`]; barcodes are drawn straight into a [`BitImage`] as
//! stacked horizontal bars.

use ab_glyph::{Font, FontRef, PxScale, ScaleFont};
use image::{GrayImage, Luma};
use imageproc::drawing::draw_text_mut;
use tracing::debug;

use crate::bitimage::BitImage;
use crate::{RasterError, Result};

/// Coverage above which a rendered glyph pixel counts as "on".
const THRESHOLD: u8 = 128;

/// Thickness in pixels of a wide barcode element.
pub const WIDE_BAR: u32 = 39;

/// Thickness in pixels of a narrow barcode element.
pub const NARROW_BAR: u32 = 13;

/// Length in pixels of every barcode bar.
pub const BAR_LENGTH: u32 = 500;

/// A 2-D boolean mask, addressed 0-based as `(col, row)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlyphMask {
    width: u32,
    height: u32,
    cells: Vec<bool>,
}

impl GlyphMask {
    /// Create an all-off mask.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            cells: vec![false; width as usize * height as usize],
        }
    }

    /// Build a mask by evaluating `f(col, row)` for every cell.
    pub fn from_fn(width: u32, height: u32, f: impl Fn(u32, u32) -> bool) -> Self {
        let mut mask = Self::new(width, height);
        for row in 0..height {
            for col in 0..width {
                mask.set(col, row, f(col, row));
            }
        }
        mask
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Cell value; out-of-range cells read as off.
    pub fn get(&self, col: u32, row: u32) -> bool {
        if col >= self.width || row >= self.height {
            return false;
        }
        self.cells[(row * self.width + col) as usize]
    }

    pub fn set(&mut self, col: u32, row: u32, value: bool) {
        if col < self.width && row < self.height {
            self.cells[(row * self.width + col) as usize] = value;
        }
    }

    /// Number of "on" cells.
    pub fn count_on(&self) -> usize {
        self.cells.iter().filter(|&&c| c).count()
    }
}

/// Measure the pixel width of a string at the given font and scale.
fn measure_text_width(font: &FontRef<'_>, scale: PxScale, text: &str) -> u32 {
    let scaled = font.as_scaled(scale);
    let mut width = 0.0f32;
    let mut prev_glyph: Option<ab_glyph::GlyphId> = None;

    for ch in text.chars() {
        let glyph_id = scaled.glyph_id(ch);
        if let Some(prev) = prev_glyph {
            width += scaled.kern(prev, glyph_id);
        }
        width += scaled.h_advance(glyph_id);
        prev_glyph = Some(glyph_id);
    }

    width.ceil() as u32
}

/// Rasterise `text` into a mask sized to fit it.
///
/// `font_data` is the raw bytes of a TrueType/OpenType font.
pub fn render_text(font_data: &[u8], size: f32, text: &str) -> Result<GlyphMask> {
    let font = FontRef::try_from_slice(font_data).map_err(|e| RasterError::Font(e.to_string()))?;
    let scale = PxScale::from(size);

    let scaled = font.as_scaled(scale);
    let height = (scaled.ascent() - scaled.descent()).ceil().max(1.0) as u32;
    let width = measure_text_width(&font, scale, text).max(1);
    debug!(width, height, size, "Rendering text mask");

    let mut canvas = GrayImage::from_pixel(width, height, Luma([0]));
    draw_text_mut(&mut canvas, Luma([255]), 0, 0, scale, &font, text);

    Ok(GlyphMask::from_fn(width, height, |col, row| {
        canvas.get_pixel(col, row).0[0] >= THRESHOLD
    }))
}

/// Code 39 element pattern for a character.
///
/// `B`/`b` are wide/narrow black bars, `W`/`w` wide/narrow white gaps.
/// Characters outside the Code 39 set encode as a space.
pub fn code39_pattern(ch: char) -> &'static str {
    match ch.to_ascii_uppercase() {
        'A' => "BwbwbWbwB",
        'B' => "bwBwbWbwB",
        'C' => "BwBwbWbwb",
        'D' => "bwbwBWbwB",
        'E' => "BwbwBWbwb",
        'F' => "bwBwBWbwb",
        'G' => "bwbwbWBwB",
        'H' => "BwbwbWBwb",
        'I' => "bwBwbWBwb",
        'J' => "bwbwBWBwb",
        'K' => "BwbwbwbWB",
        'L' => "bwBwbwbWB",
        'M' => "BwBwbwbWb",
        'N' => "bwbwBwbWB",
        'O' => "BwbwBwbWb",
        'P' => "bwBwBwbWb",
        'Q' => "bwbwbwBWB",
        'R' => "BwbwbwBWb",
        'S' => "bwBwbwBWb",
        'T' => "bwbwBwBWb",
        'U' => "BWbwbwbwB",
        'V' => "bWBwbwbwB",
        'W' => "BWBwbwbwb",
        'X' => "bWbwBwbwB",
        'Y' => "BWbwBwbwb",
        'Z' => "bWBwBwbwb",
        '0' => "bwbWBwBwb",
        '1' => "BwbWbwbwB",
        '2' => "bwBWbwbwB",
        '3' => "BwBWbwbwb",
        '4' => "bwbWBwbwB",
        '5' => "BwbWBwbwb",
        '6' => "bwBWBwbwb",
        '7' => "bwbWbwBwB",
        '8' => "BwbWbwBwb",
        '9' => "bwBWbwBwb",
        '-' => "bWbwbwBwB",
        '$' => "bWbWbWbwb",
        '%' => "bwbWbWbWb",
        '.' => "BWbwbwBwb",
        '/' => "bWbWbwbWb",
        '+' => "bWbwbWbWb",
        '*' => "bWbwBwBwb",
        _ => "bWBwbwBwb",
    }
}

impl BitImage {
    /// Draw `text` as a Code 39 barcode whose bars run horizontally from
    /// `x` and stack downward from `y`.
    ///
    /// Every character is followed by a narrow white gap. Returns `false` if
    /// a pattern contains an unknown element.
    pub fn write_barcode(&mut self, text: &str, x: i64, mut y: i64) -> bool {
        for ch in text.chars() {
            let pattern = code39_pattern(ch);
            for element in pattern.chars().chain(std::iter::once('w')) {
                let (thickness, value) = match element {
                    'W' => (WIDE_BAR, false),
                    'w' => (NARROW_BAR, false),
                    'B' => (WIDE_BAR, true),
                    'b' => (NARROW_BAR, true),
                    _ => return false,
                };
                self.draw_line(x, y, thickness, BAR_LENGTH, value);
                y += i64::from(thickness);
            }
        }
        true
    }
}
