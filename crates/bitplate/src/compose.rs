//! Image composition utilities: overlay, merge, bars and glyph masks.

use tracing::debug;

use crate::bitimage::BitImage;
use crate::glyph::GlyphMask;

impl BitImage {
    /// Copy every pixel of `other` into this image, displaced by `(x, y)`.
    ///
    /// Pixel `(i, j)` of `other` lands on `(x + i, y + j)`. Pixels falling
    /// outside this image are dropped. Both "on" and "off" pixels are copied,
    /// so inserting a blank image erases the covered area.
    pub fn insert(&mut self, other: &BitImage, x: i64, y: i64) {
        for j in 1..=i64::from(other.height()) {
            for i in 1..=i64::from(other.width()) {
                self.set_pixel(x + i, y + j, other.get_pixel(i, j));
            }
        }
    }

    /// Place `left` and `right` side by side in a new image.
    ///
    /// The result is as tall as the taller input; the shorter one is centred
    /// vertically with offset `(height - source_height) / 2`.
    pub fn merge(left: &BitImage, right: &BitImage) -> BitImage {
        let width = left.width() + right.width();
        let height = left.height().max(right.height());
        debug!(width, height, "Merging images side by side");

        let mut merged = BitImage::new(width, height);
        let left_offset = (height - left.height()) / 2;
        merged.insert(left, 0, i64::from(left_offset));

        let right_offset = (height - right.height()) / 2;
        merged.insert(right, i64::from(left.width()), i64::from(right_offset));
        merged
    }

    /// Fill a horizontal bar starting at pixel `(x, y)`.
    ///
    /// Covers `(x..=x + length, y..=y + thickness)`, bounds inclusive.
    pub fn draw_line(&mut self, x: i64, y: i64, thickness: u32, length: u32, value: bool) {
        for n in 0..=i64::from(thickness) {
            for m in 0..=i64::from(length) {
                self.set_pixel(x + m, y + n, value);
            }
        }
    }

    /// Overlay a glyph mask with its top-left cell at `(x + 1, y + 1)`.
    pub fn write_mask(&mut self, mask: &GlyphMask, x: i64, y: i64) {
        for row in 0..mask.height() {
            for col in 0..mask.width() {
                self.set_pixel(
                    x + i64::from(col) + 1,
                    y + i64::from(row) + 1,
                    mask.get(col, row),
                );
            }
        }
    }

    /// Overlay a glyph mask turned a quarter clockwise, so horizontal text
    /// runs down the plate edge.
    ///
    /// Mask cell `(col, row)` lands on `(x + h - row, y + col + 1)` where `h`
    /// is the mask height.
    pub fn write_mask_rotated(&mut self, mask: &GlyphMask, x: i64, y: i64) {
        let h = i64::from(mask.height());
        for row in 0..mask.height() {
            for col in 0..mask.width() {
                self.set_pixel(
                    x + h - i64::from(row),
                    y + i64::from(col) + 1,
                    mask.get(col, row),
                );
            }
        }
    }
}
