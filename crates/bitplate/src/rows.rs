//! Row-level operations: decimation, zero padding, and vertical shifting.

use std::fmt;

use tracing::debug;

use crate::bitimage::BitImage;
use crate::{RasterError, Result};

/// Vertical direction for [`BitImage::move_image`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shift {
    /// Content moves toward the top; rows are dropped at the top.
    Up,
    /// Content moves toward the bottom; rows are dropped at the bottom.
    Down,
}

impl fmt::Display for Shift {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Shift::Up => f.write_str("up"),
            Shift::Down => f.write_str("down"),
        }
    }
}

impl BitImage {
    /// Shrink the image by removing every row whose 1-based index is a
    /// multiple of `scale`. Returns the number of rows removed.
    ///
    /// The resulting height is `truncate(height * (1 - 1/scale))`. When the
    /// height is not a multiple of `scale` this is one row less than the
    /// number of surviving rows, and the trailing row is dropped. A scale of
    /// zero leaves the image untouched.
    pub fn downsize_height(&mut self, scale: u32) -> u32 {
        if scale == 0 {
            return 0;
        }

        let row_bytes = self.row_bytes();
        let original = self.height;

        // Compact surviving rows toward the front of the buffer.
        let mut write = 0usize;
        for y in 1..=original {
            if y % scale == 0 {
                continue;
            }
            let read = (y - 1) as usize * row_bytes;
            if read != write {
                self.buffer.copy_within(read..read + row_bytes, write);
            }
            write += row_bytes;
        }

        let new_height =
            (u64::from(original) * u64::from(scale - 1) / u64::from(scale)) as u32;
        self.buffer.truncate(new_height as usize * row_bytes);
        self.height = new_height;

        debug!(scale, original, new_height, "Downsized image height");
        original - new_height
    }

    /// Insert `amount` zero rows so that the first of them becomes 1-based row
    /// `at_row`. Positions past the end append at the bottom.
    pub fn pad_height(&mut self, at_row: u32, amount: u32) {
        if amount == 0 {
            return;
        }
        let row_bytes = self.row_bytes();
        let at = at_row.clamp(1, self.height + 1);
        let offset = (at - 1) as usize * row_bytes;
        let zeros = std::iter::repeat(0u8).take(amount as usize * row_bytes);
        self.buffer.splice(offset..offset, zeros);
        self.height += amount;
    }

    /// Shift the content `amount` rows in the given direction while keeping
    /// the height: rows leaving the image are discarded and the vacated edge
    /// is filled with zero rows.
    pub fn move_image(&mut self, shift: Shift, amount: u32) -> Result<()> {
        if amount > self.height {
            return Err(RasterError::ShiftOutOfRange {
                amount,
                height: self.height,
            });
        }
        if amount == 0 {
            return Ok(());
        }

        let span = amount as usize * self.row_bytes();
        match shift {
            Shift::Up => {
                self.buffer.drain(..span);
                self.buffer.resize(self.buffer.len() + span, 0);
            }
            Shift::Down => {
                self.buffer.truncate(self.buffer.len() - span);
                let zeros = std::iter::repeat(0u8).take(span);
                self.buffer.splice(0..0, zeros);
            }
        }

        debug!(%shift, amount, "Moved image");
        Ok(())
    }
}
