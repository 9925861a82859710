//! Fan-out compensation for web-feed press plates.
//!
//! Paper stretches sideways as it runs through successive printing towers, so
//! each colour plate must be shortened by a tower-specific amount to land on
//! the black reference layer. This crate turns the physical fan-out distance
//! into a row decimation factor plus a vertical shift, and applies both to a
//! [`bitplate::BitImage`] while keeping the alignment marks in place.

pub mod colour;
pub mod compensator;
pub mod direction;
pub mod geometry;
pub mod marks;
pub mod scale;

// Re-exports for convenience
pub use colour::Colour;
pub use compensator::{CompensationReport, FanoutCompensator, SkipReason};
pub use direction::{Direction, compute_direction, compute_shift_pixels};
pub use geometry::{
    GeometryDocument, GeometryError, GeometryParameters, GeometrySource, JsonGeometryFile,
    TowerGeometry,
};
pub use marks::{AlignmentMarks, MarkPlacement};

use bitplate::RasterError;

/// Errors that make a plate impossible to compensate.
#[derive(Debug, thiserror::Error)]
pub enum CompensationError {
    #[error("Cylinder 0 does not name a printing unit")]
    InvalidCylinder,

    #[error("Fan-out distance {0} mm is not a finite, non-negative number")]
    InvalidFanout(f64),

    #[error("Pixel fan-out {pixel_fanout} is not smaller than the plate height {height}")]
    FanoutExceedsHeight { pixel_fanout: u32, height: u32 },

    #[error("Roll position pattern {0:?} must be 1 to 4 characters long")]
    InvalidPattern(String),

    #[error("Raster error: {0}")]
    Raster(#[from] RasterError),
}

/// Result type alias for compensation operations.
pub type Result<T> = std::result::Result<T, CompensationError>;
