//! Bit-packed monochrome raster engine for printing plates.
//!
//! Provides a 1-bit-per-pixel image with row insertion/removal, directional
//! shifting, region overlay, glyph masks (text and Code 39 barcodes),
//! a bilevel TIFF codec (uncompressed, CCITT Group 4, PackBits and Deflate
//! strips), and low-fidelity CMYK preview sampling.

pub mod bitimage;
pub mod codec;
pub mod compose;
pub mod glyph;
pub mod preview;
pub mod rows;
mod strips;

// Re-exports for convenience
pub use bitimage::BitImage;
pub use codec::{MAX_PLATE_PIXELS, PlateCodec, TiffCodec};
pub use glyph::GlyphMask;
pub use preview::{CmykCoverage, CmykPlates};
pub use rows::Shift;

/// Plate resolution used when nothing else is configured.
pub const DEFAULT_DPI: u32 = 1200;

/// Errors that can occur during raster operations.
#[derive(Debug, thiserror::Error)]
pub enum RasterError {
    #[error("Buffer length {actual} does not match {width}x{height} image (expected {expected} bytes)")]
    BufferSize {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },

    #[error("Cannot shift {amount} rows in an image of height {height}")]
    ShiftOutOfRange { amount: u32, height: u32 },

    #[error("Invalid container field {field}: expected {expected}, got {actual}")]
    Validation {
        field: &'static str,
        expected: String,
        actual: String,
    },

    #[error("Malformed container: {0}")]
    Malformed(String),

    #[error("TIFF error: {0}")]
    Tiff(#[from] tiff::TiffError),

    #[error("Font error: {0}")]
    Font(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl RasterError {
    /// Whether the error describes bad input data rather than an I/O failure.
    pub fn is_validation(&self) -> bool {
        !matches!(
            self,
            RasterError::Io(_) | RasterError::Tiff(tiff::TiffError::IoError(_))
        )
    }
}

/// Result type alias for raster operations.
pub type Result<T> = std::result::Result<T, RasterError>;
