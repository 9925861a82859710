//! Per-plate processing: name → geometry → decode → compensate → write back.

use std::path::Path;

use bitplate::{PlateCodec, TiffCodec};
use fanout::{
    Colour, CompensationReport, FanoutCompensator, GeometryParameters, GeometrySource, SkipReason,
};

use crate::error::PressError;
use crate::plate_name::{NameLayout, PlateName};

/// Turns one plate file in the processing folder into its compensated form.
pub struct PlatePipeline<G> {
    layout: NameLayout,
    geometry: G,
    codec: TiffCodec,
    compensator: FanoutCompensator,
}

impl<G: GeometrySource> PlatePipeline<G> {
    pub fn new(
        layout: NameLayout,
        geometry: G,
        codec: TiffCodec,
        compensator: FanoutCompensator,
    ) -> Self {
        Self {
            layout,
            geometry,
            codec,
            compensator,
        }
    }

    /// Compensate the plate at `path` in place.
    ///
    /// Black plates are left untouched without being decoded. The file is
    /// only replaced once the new plate has been fully written.
    pub fn process(&self, path: &Path) -> Result<CompensationReport, PressError> {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| PressError::Config(format!("unusable plate path {}", path.display())))?;

        let name = PlateName::parse(file_name, &self.layout)?;
        let colour = Colour::from_cylinder(name.cylinder)?;
        tracing::info!(file = file_name, %name, %colour, "Plate identified");

        if colour.is_reference() {
            return Ok(CompensationReport::Skipped {
                reason: SkipReason::BlackReference,
            });
        }

        let geometry = self.geometry.lookup(&name.tower, colour)?;
        let params = GeometryParameters {
            tower: name.tower,
            cylinder: name.cylinder,
            section: name.section,
            fanout_mm: geometry.fanout_mm,
            roll_position: geometry.roll_position,
            dpi: self.codec.dpi(),
        };

        let mut plate = self.codec.load(path)?;
        let report = self.compensator.apply(&mut plate, &params)?;
        if report.is_applied() {
            let staging = path.with_file_name(format!("{file_name}.tmp"));
            self.codec.save(&staging, &plate)?;
            std::fs::rename(&staging, path).map_err(bitplate::RasterError::from)?;
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Severity;
    use bitplate::BitImage;
    use fanout::GeometryDocument;

    const GEOMETRY: &str =
        r#"{"towers": {"07": {"roll_position": "ABC", "fanout_mm": {"C": 0.5, "M": 0.0}}}}"#;

    fn pipeline() -> PlatePipeline<GeometryDocument> {
        PlatePipeline::new(
            NameLayout::default(),
            GeometryDocument::from_json(GEOMETRY).unwrap(),
            TiffCodec::default(),
            FanoutCompensator::without_marks(),
        )
    }

    fn write_plate(path: &Path, height: u32) {
        let mut plate = BitImage::new(64, height);
        plate.set_pixel(3, 100, true);
        TiffCodec::default().save(path, &plate).unwrap();
    }

    #[test]
    fn test_cyan_plate_is_compensated_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("071A1.tif");
        write_plate(&path, 2000);

        let report = pipeline().process(&path).unwrap();
        let CompensationReport::Applied {
            colour,
            removed_rows,
            height,
            ..
        } = report
        else {
            panic!("expected compensation, got {report:?}");
        };
        assert_eq!(colour, Colour::Cyan);
        assert_eq!(removed_rows, 24);
        assert_eq!(height, 2000);

        let written = TiffCodec::default().load(&path).unwrap();
        assert_eq!(written.dimensions(), (64, 2000));
        assert!(!dir.path().join("071A1.tif.tmp").exists());
    }

    #[test]
    fn test_black_plate_passes_without_decoding() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("077A1.tif");
        std::fs::write(&path, b"not a tiff").unwrap();

        let report = pipeline().process(&path).unwrap();
        assert_eq!(
            report,
            CompensationReport::Skipped {
                reason: SkipReason::BlackReference
            }
        );
        assert_eq!(std::fs::read(&path).unwrap(), b"not a tiff");
    }

    #[test]
    fn test_zero_fanout_leaves_file_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("073A1.tif");
        write_plate(&path, 500);
        let before = std::fs::read(&path).unwrap();

        let report = pipeline().process(&path).unwrap();
        assert!(!report.is_applied());
        assert_eq!(std::fs::read(&path).unwrap(), before);
    }

    #[test]
    fn test_bad_plates_are_validation_errors() {
        let dir = tempfile::tempdir().unwrap();

        let short = dir.path().join("x.tif");
        std::fs::write(&short, b"x").unwrap();
        let err = pipeline().process(&short).unwrap_err();
        assert_eq!(err.severity(), Severity::Validation);

        let unknown_tower = dir.path().join("991A1.tif");
        write_plate(&unknown_tower, 100);
        let err = pipeline().process(&unknown_tower).unwrap_err();
        assert!(matches!(err, PressError::Geometry(_)));
        assert_eq!(err.severity(), Severity::Validation);

        let garbage = dir.path().join("071A1.tif");
        std::fs::write(&garbage, b"not a tiff").unwrap();
        let err = pipeline().process(&garbage).unwrap_err();
        assert_eq!(err.severity(), Severity::Validation);
    }
}
