//! Press-wide error type and its handling classification.

use std::fmt;

use bitplate::RasterError;
use fanout::{CompensationError, GeometryError};

use crate::conveyor::ConveyorError;
use crate::plate_name::PlateNameError;

/// How the conveyor loop reacts to a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The plate itself is bad: reject it and keep polling.
    Validation,
    /// Likely to clear up on its own: log and try again next iteration.
    Transient,
    /// Needs someone to tidy a folder: warn and keep polling.
    OperatorAction,
    /// Stop the service.
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Severity::Validation => "validation",
            Severity::Transient => "transient",
            Severity::OperatorAction => "operator action",
            Severity::Fatal => "fatal",
        };
        f.write_str(name)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PressError {
    #[error("Invalid plate name: {0}")]
    PlateName(#[from] PlateNameError),

    #[error("Geometry error: {0}")]
    Geometry(#[from] GeometryError),

    #[error("Compensation error: {0}")]
    Compensation(#[from] CompensationError),

    #[error("Plate error: {0}")]
    Raster(#[from] RasterError),

    #[error("Conveyor error: {0}")]
    Conveyor(#[from] ConveyorError),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl PressError {
    pub fn severity(&self) -> Severity {
        match self {
            PressError::PlateName(_) => Severity::Validation,
            PressError::Geometry(e) if e.is_validation() => Severity::Validation,
            PressError::Geometry(_) => Severity::Transient,
            PressError::Compensation(CompensationError::Raster(e)) | PressError::Raster(e) => {
                if e.is_validation() {
                    Severity::Validation
                } else {
                    Severity::Transient
                }
            }
            PressError::Compensation(_) => Severity::Validation,
            PressError::Conveyor(e) => e.severity(),
            PressError::Config(_) => Severity::Fatal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_plate_problems_are_validation() {
        let err = PressError::from(PlateNameError::InvalidCylinder("x".into()));
        assert_eq!(err.severity(), Severity::Validation);

        let err = PressError::from(CompensationError::InvalidCylinder);
        assert_eq!(err.severity(), Severity::Validation);

        let err = PressError::from(GeometryError::UnknownTower("07".into()));
        assert_eq!(err.severity(), Severity::Validation);

        let err = PressError::from(RasterError::Malformed("short strip".into()));
        assert_eq!(err.severity(), Severity::Validation);
    }

    #[test]
    fn test_io_problems_are_transient() {
        let err = PressError::from(RasterError::Io(io::Error::other("disk")));
        assert_eq!(err.severity(), Severity::Transient);

        let err = PressError::from(GeometryError::Io {
            path: "geometry.json".into(),
            source: io::Error::from(io::ErrorKind::NotFound),
        });
        assert_eq!(err.severity(), Severity::Transient);
    }

    #[test]
    fn test_conveyor_classification() {
        let anomaly = PressError::from(ConveyorError::Anomaly {
            slot: crate::conveyor::Slot::Intake,
            files: vec!["a.tif".into(), "b.tif".into()],
        });
        assert_eq!(anomaly.severity(), Severity::OperatorAction);

        let exhausted = PressError::from(ConveyorError::Io {
            action: "move to delivery".into(),
            source: io::Error::other("gone"),
        });
        assert_eq!(exhausted.severity(), Severity::Fatal);
        assert_eq!(PressError::Config("x".into()).severity(), Severity::Fatal);
    }
}
