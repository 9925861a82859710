//! Bit-packed monochrome raster with 1-based pixel addressing.
//!
//! Each row occupies `stride_bits / 8` bytes; the most significant bit of a
//! byte is the leftmost pixel. Bits past `width` in the last byte of a row are
//! padding and are never touched by pixel writes.

use crate::{RasterError, Result};

/// A 1-bit-per-pixel image owning its packed buffer.
///
/// Invariant: `stride_bits >= width`, `stride_bits % 8 == 0` and
/// `buffer.len() == stride_bits / 8 * height` after every operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitImage {
    pub(crate) width: u32,
    pub(crate) height: u32,
    pub(crate) stride_bits: u32,
    pub(crate) buffer: Vec<u8>,
}

/// Number of padding bits needed to round `width` up to a whole byte.
pub fn padding_for(width: u32) -> u32 {
    (8 - width % 8) % 8
}

impl BitImage {
    /// Create a zero-filled (all "off") image.
    pub fn new(width: u32, height: u32) -> Self {
        let stride_bits = width + padding_for(width);
        let len = (stride_bits / 8) as usize * height as usize;
        Self {
            width,
            height,
            stride_bits,
            buffer: vec![0; len],
        }
    }

    /// Wrap an already packed buffer, validating its length.
    pub fn from_raw(width: u32, height: u32, buffer: Vec<u8>) -> Result<Self> {
        let stride_bits = width + padding_for(width);
        let expected = (stride_bits / 8) as usize * height as usize;
        if buffer.len() != expected {
            return Err(RasterError::BufferSize {
                width,
                height,
                expected,
                actual: buffer.len(),
            });
        }
        Ok(Self {
            width,
            height,
            stride_bits,
            buffer,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Row length in bits, always a multiple of 8.
    pub fn stride_bits(&self) -> u32 {
        self.stride_bits
    }

    /// Row length in bytes.
    pub fn row_bytes(&self) -> usize {
        (self.stride_bits / 8) as usize
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// The packed buffer, rows top to bottom.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer
    }

    /// Packed bytes of 1-based row `y`, or `None` outside the image.
    pub fn row(&self, y: u32) -> Option<&[u8]> {
        let range = self.row_range(y)?;
        Some(&self.buffer[range])
    }

    /// Mutable packed bytes of 1-based row `y`.
    pub fn row_mut(&mut self, y: u32) -> Option<&mut [u8]> {
        let range = self.row_range(y)?;
        Some(&mut self.buffer[range])
    }

    fn row_range(&self, y: u32) -> Option<std::ops::Range<usize>> {
        if y == 0 || y > self.height {
            return None;
        }
        let start = (y - 1) as usize * self.row_bytes();
        Some(start..start + self.row_bytes())
    }

    /// Byte index and bit mask of pixel (x, y), or `None` when out of range.
    fn locate(&self, x: i64, y: i64) -> Option<(usize, u8)> {
        if x < 1 || y < 1 || x > i64::from(self.width) || y > i64::from(self.height) {
            return None;
        }
        let (x0, y0) = ((x - 1) as usize, (y - 1) as usize);
        let index = y0 * self.row_bytes() + x0 / 8;
        let mask = 1u8 << (7 - (x0 % 8));
        Some((index, mask))
    }

    /// Read pixel (x, y). Out-of-range coordinates read as "off".
    pub fn get_pixel(&self, x: i64, y: i64) -> bool {
        match self.locate(x, y) {
            Some((index, mask)) => self.buffer[index] & mask != 0,
            None => false,
        }
    }

    /// Write pixel (x, y). Returns `false` without touching the buffer when
    /// the coordinates are out of range.
    pub fn set_pixel(&mut self, x: i64, y: i64, value: bool) -> bool {
        let Some((index, mask)) = self.locate(x, y) else {
            return false;
        };
        if value {
            self.buffer[index] |= mask;
        } else {
            self.buffer[index] &= !mask;
        }
        true
    }

    /// Number of "on" pixels, padding excluded.
    pub fn count_on(&self) -> usize {
        let full_bytes = (self.width / 8) as usize;
        let tail_bits = self.width % 8;
        let tail_mask = if tail_bits == 0 {
            0
        } else {
            0xffu8 << (8 - tail_bits)
        };

        self.buffer
            .chunks(self.row_bytes().max(1))
            .take(self.height as usize)
            .map(|row| {
                let body: u32 = row[..full_bytes].iter().map(|b| b.count_ones()).sum();
                let tail = if tail_bits == 0 {
                    0
                } else {
                    (row[full_bytes] & tail_mask).count_ones()
                };
                (body + tail) as usize
            })
            .sum()
    }

    /// Area-coverage sample used by the colour preview.
    ///
    /// Both coordinates are decremented first, then the 3x3 neighbourhood
    /// `(x-1..=x+1, y-1..=y+1)` is counted. The preview renderer depends on
    /// this one-pixel offset.
    pub fn area_coverage(&self, x: i64, y: i64) -> u16 {
        let (cx, cy) = (x - 1, y - 1);
        let mut count = 0u16;
        for dy in -1..=1 {
            for dx in -1..=1 {
                if self.get_pixel(cx + dx, cy + dy) {
                    count += 1;
                }
            }
        }
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_padding_rounds_to_byte() {
        assert_eq!(padding_for(8), 0);
        assert_eq!(padding_for(9), 7);
        assert_eq!(padding_for(1000), 0);
        assert_eq!(padding_for(1001), 7);
        assert_eq!(padding_for(0), 0);
    }

    #[test]
    fn test_new_is_zero_filled() {
        let img = BitImage::new(10, 3);
        assert_eq!(img.stride_bits(), 16);
        assert_eq!(img.row_bytes(), 2);
        assert_eq!(img.as_bytes().len(), 6);
        assert!(img.as_bytes().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_set_then_get_round_trip() {
        let mut img = BitImage::new(13, 7);
        for (x, y) in [(1, 1), (8, 1), (9, 2), (13, 7), (5, 4)] {
            assert!(img.set_pixel(x, y, true));
            assert!(img.get_pixel(x, y), "pixel ({x}, {y}) should be on");
            assert!(img.set_pixel(x, y, false));
            assert!(!img.get_pixel(x, y), "pixel ({x}, {y}) should be off");
        }
    }

    #[test]
    fn test_bit_addressing_is_msb_first() {
        let mut img = BitImage::new(16, 2);
        img.set_pixel(1, 1, true);
        img.set_pixel(10, 2, true);
        assert_eq!(img.as_bytes(), &[0b1000_0000, 0, 0, 0b0100_0000]);
    }

    #[test]
    fn test_out_of_range_write_is_rejected() {
        let mut img = BitImage::new(9, 4);
        let before = img.clone();
        for (x, y) in [(0, 1), (1, 0), (10, 1), (1, 5), (-3, -3)] {
            assert!(!img.set_pixel(x, y, true), "({x}, {y}) should be rejected");
            assert!(!img.get_pixel(x, y));
        }
        assert_eq!(img, before);
    }

    #[test]
    fn test_padding_bits_never_written() {
        let mut img = BitImage::new(9, 1);
        for x in 1..=9 {
            img.set_pixel(x, 1, true);
        }
        assert_eq!(img.as_bytes(), &[0xff, 0b1000_0000]);
        assert_eq!(img.count_on(), 9);
    }

    #[test]
    fn test_from_raw_validates_length() {
        assert!(BitImage::from_raw(9, 2, vec![0; 4]).is_ok());
        let err = BitImage::from_raw(9, 2, vec![0; 3]).unwrap_err();
        assert!(matches!(err, RasterError::BufferSize { expected: 4, actual: 3, .. }));
    }

    #[test]
    fn test_row_accessors() {
        let mut img = BitImage::new(8, 3);
        img.row_mut(2).unwrap()[0] = 0xaa;
        assert_eq!(img.row(2), Some(&[0xaa][..]));
        assert!(img.row(0).is_none());
        assert!(img.row(4).is_none());
        assert!(img.get_pixel(1, 2));
        assert!(!img.get_pixel(2, 2));
    }

    #[test]
    fn test_area_coverage_uses_shifted_centre() {
        let mut img = BitImage::new(10, 10);
        // Fill the 3x3 block centred on (4, 4).
        for y in 3..=5 {
            for x in 3..=5 {
                img.set_pixel(x, y, true);
            }
        }
        // Sampling at (5, 5) evaluates the block centred on (4, 4).
        assert_eq!(img.area_coverage(5, 5), 9);
        assert_eq!(img.area_coverage(4, 4), 4);
    }

    #[test]
    fn test_area_coverage_at_corner_ignores_outside() {
        let mut img = BitImage::new(4, 4);
        img.set_pixel(1, 1, true);
        assert_eq!(img.area_coverage(1, 1), 1);
        assert_eq!(img.area_coverage(2, 2), 1);
    }
}
