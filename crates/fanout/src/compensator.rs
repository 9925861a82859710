//! Fan-out compensation of a single colour plate.

use std::fmt;

use bitplate::BitImage;
use tracing::{debug, warn};

use crate::colour::Colour;
use crate::direction::{Direction, compute_direction, compute_shift_pixels};
use crate::geometry::GeometryParameters;
use crate::marks::AlignmentMarks;
use crate::scale::{decimation_factor, pixel_fanout};
use crate::Result;

/// Why a plate passed through unmodified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Black is the reference every other colour is fitted to.
    BlackReference,
    /// The tower reports no fan-out for this colour.
    ZeroFanout,
    /// The fan-out is smaller than one row at this resolution.
    BelowResolution,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::BlackReference => f.write_str("black reference layer"),
            SkipReason::ZeroFanout => f.write_str("zero fan-out"),
            SkipReason::BelowResolution => f.write_str("fan-out below one row"),
        }
    }
}

/// Outcome of [`FanoutCompensator::apply`].
#[derive(Debug, Clone, PartialEq)]
pub enum CompensationReport {
    Skipped {
        reason: SkipReason,
    },
    Applied {
        colour: Colour,
        pixel_fanout: u32,
        scale: u32,
        direction: Direction,
        shift: u32,
        removed_rows: u32,
        height: u32,
    },
}

impl CompensationReport {
    pub fn is_applied(&self) -> bool {
        matches!(self, CompensationReport::Applied { .. })
    }
}

impl fmt::Display for CompensationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompensationReport::Skipped { reason } => write!(f, "skipped ({reason})"),
            CompensationReport::Applied {
                colour,
                pixel_fanout,
                scale,
                direction,
                shift,
                removed_rows,
                height,
            } => write!(
                f,
                "{colour}: fan-out {pixel_fanout} px, every {scale}th row removed \
                 ({removed_rows} rows), shifted {direction} {shift} px, height {height}"
            ),
        }
    }
}

/// Shortens colour plates to match the black reference and shifts them
/// according to the tower's roll position.
#[derive(Debug, Clone, Default)]
pub struct FanoutCompensator {
    marks: Option<AlignmentMarks>,
}

impl FanoutCompensator {
    /// Compensator that keeps the given alignment marks fixed.
    pub fn new(marks: AlignmentMarks) -> Self {
        Self { marks: Some(marks) }
    }

    /// Compensator for plates without registration marks.
    pub fn without_marks() -> Self {
        Self { marks: None }
    }

    /// Compensate `plate` in place.
    ///
    /// All parameters are validated before the plate is touched, so an error
    /// leaves the plate unmodified.
    pub fn apply(
        &self,
        plate: &mut BitImage,
        params: &GeometryParameters,
    ) -> Result<CompensationReport> {
        let colour = Colour::from_cylinder(params.cylinder)?;
        if colour.is_reference() {
            return Ok(CompensationReport::Skipped {
                reason: SkipReason::BlackReference,
            });
        }

        let pixel_fanout = pixel_fanout(params.dpi, params.fanout_mm)?;
        if params.fanout_mm == 0.0 {
            return Ok(CompensationReport::Skipped {
                reason: SkipReason::ZeroFanout,
            });
        }
        if pixel_fanout == 0 {
            return Ok(CompensationReport::Skipped {
                reason: SkipReason::BelowResolution,
            });
        }

        let original_height = plate.height();
        let scale = decimation_factor(original_height, pixel_fanout)?;
        let direction = compute_direction(&params.roll_position, params.section, params.cylinder)?;
        let shift = compute_shift_pixels(&params.roll_position, params.section, pixel_fanout)?;
        debug!(
            %colour,
            pixel_fanout,
            scale,
            %direction,
            shift,
            original_height,
            "Compensating plate"
        );

        if let Some(marks) = &self.marks {
            marks.remove(plate);
        }

        let removed_rows = plate.downsize_height(scale);
        match direction {
            Direction::Up => plate.pad_height(plate.height() + 1, removed_rows),
            Direction::Down => plate.pad_height(1, removed_rows),
            Direction::Middle => {
                let half = removed_rows / 2;
                if removed_rows % 2 != 0 {
                    warn!(
                        removed_rows,
                        "Odd number of removed rows, plate ends one row short"
                    );
                }
                plate.pad_height(1, half);
                plate.pad_height(plate.height() + 1, half);
            }
        }

        if let Some(shift_dir) = direction.as_shift() {
            plate.move_image(shift_dir, shift)?;
        }

        if let Some(marks) = &self.marks {
            marks.restore(plate);
        }

        Ok(CompensationReport::Applied {
            colour,
            pixel_fanout,
            scale,
            direction,
            shift,
            removed_rows,
            height: plate.height(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CompensationError;
    use crate::marks::MarkPlacement;

    fn params(cylinder: u32, section: char, pattern: &str, fanout_mm: f64) -> GeometryParameters {
        GeometryParameters {
            tower: "07".to_string(),
            cylinder,
            section,
            fanout_mm,
            roll_position: pattern.to_string(),
            dpi: 1200,
        }
    }

    fn plate_with_pixel(width: u32, height: u32, y: i64) -> BitImage {
        let mut plate = BitImage::new(width, height);
        plate.set_pixel(5, y, true);
        plate
    }

    fn lit_rows(plate: &BitImage) -> Vec<u32> {
        (1..=plate.height())
            .filter(|&y| plate.get_pixel(5, i64::from(y)))
            .collect()
    }

    #[test]
    fn test_reference_plate_front_leading_section() {
        let mut plate = plate_with_pixel(1000, 2000, 1);
        let report = FanoutCompensator::without_marks()
            .apply(&mut plate, &params(1, 'A', "ABCD", 0.5))
            .unwrap();

        assert_eq!(
            report,
            CompensationReport::Applied {
                colour: Colour::Cyan,
                pixel_fanout: 23,
                scale: 86,
                direction: Direction::Down,
                shift: 23,
                removed_rows: 24,
                height: 2000,
            }
        );
        assert_eq!(plate.height(), 2000);
        // 24 rows padded on top, then moved down 23.
        assert_eq!(lit_rows(&plate), vec![48]);
    }

    #[test]
    fn test_even_cylinder_moves_up() {
        let mut plate = plate_with_pixel(64, 2000, 100);
        let report = FanoutCompensator::without_marks()
            .apply(&mut plate, &params(2, 'A', "ABCD", 0.5))
            .unwrap();

        let CompensationReport::Applied { direction, shift, .. } = report else {
            panic!("expected compensation, got {report:?}");
        };
        assert_eq!(direction, Direction::Up);
        assert_eq!(shift, 23);
        assert_eq!(plate.height(), 2000);
        // Row 86 is removed before row 100, then the content moves up 23.
        assert_eq!(lit_rows(&plate), vec![76]);
    }

    #[test]
    fn test_middle_with_odd_removal_drops_a_row() {
        // 0.064 mm at 1200 dpi is 3 rows; 12 / 3 = 4 removes rows 4, 8, 12.
        let mut plate = BitImage::new(16, 12);
        let report = FanoutCompensator::without_marks()
            .apply(&mut plate, &params(3, 'A', "A", 0.064))
            .unwrap();

        let CompensationReport::Applied {
            colour,
            removed_rows,
            height,
            direction,
            ..
        } = report
        else {
            panic!("expected compensation, got {report:?}");
        };
        assert_eq!(colour, Colour::Magenta);
        assert_eq!(direction, Direction::Middle);
        assert_eq!(removed_rows, 3);
        assert_eq!(height, 11);
        assert_eq!(plate.as_bytes().len(), 2 * 11);
    }

    #[test]
    fn test_marks_stay_in_place() {
        let mut mark = BitImage::new(4, 4);
        mark.draw_line(1, 1, 4, 4, true);
        let marks = AlignmentMarks::new(
            MarkPlacement::new(mark.clone(), 10, 10),
            MarkPlacement::new(mark.clone(), 50, 1980),
        );

        let mut plate = plate_with_pixel(100, 2000, 500);
        marks.restore(&mut plate);
        FanoutCompensator::new(marks)
            .apply(&mut plate, &params(5, 'D', "ABCD", 0.5))
            .unwrap();

        for (x, y) in [(11, 11), (14, 14), (51, 1981), (54, 1984)] {
            assert!(plate.get_pixel(x, y), "mark pixel ({x}, {y})");
        }
        assert_eq!(plate.count_on(), 16 + 16 + 1);
        // Row 500 loses five rows above it, then moves up 23.
        assert!(plate.get_pixel(5, 472));
    }

    #[test]
    fn test_black_and_zero_fanout_pass_through() {
        let compensator = FanoutCompensator::without_marks();
        let mut plate = plate_with_pixel(32, 100, 7);
        let before = plate.clone();

        let report = compensator.apply(&mut plate, &params(7, 'A', "AB", 0.5)).unwrap();
        assert_eq!(report, CompensationReport::Skipped { reason: SkipReason::BlackReference });

        let report = compensator.apply(&mut plate, &params(1, 'A', "AB", 0.0)).unwrap();
        assert_eq!(report, CompensationReport::Skipped { reason: SkipReason::ZeroFanout });

        let report = compensator.apply(&mut plate, &params(1, 'A', "AB", 0.01)).unwrap();
        assert_eq!(report, CompensationReport::Skipped { reason: SkipReason::BelowResolution });
        assert!(!report.is_applied());

        assert_eq!(plate, before);
    }

    #[test]
    fn test_invalid_parameters_leave_plate_untouched() {
        let compensator = FanoutCompensator::without_marks();
        let mut plate = plate_with_pixel(32, 20, 3);
        let before = plate.clone();

        assert!(matches!(
            compensator.apply(&mut plate, &params(0, 'A', "AB", 0.5)),
            Err(CompensationError::InvalidCylinder)
        ));
        assert!(matches!(
            compensator.apply(&mut plate, &params(1, 'A', "AB", -1.0)),
            Err(CompensationError::InvalidFanout(_))
        ));
        // 0.5 mm is 23 rows, more than the plate holds.
        assert!(matches!(
            compensator.apply(&mut plate, &params(1, 'A', "AB", 0.5)),
            Err(CompensationError::FanoutExceedsHeight { .. })
        ));
        assert!(matches!(
            compensator.apply(&mut plate, &params(1, 'A', "ABCDE", 0.1)),
            Err(CompensationError::InvalidPattern(_))
        ));
        assert_eq!(plate, before);
    }

    #[test]
    fn test_report_display() {
        let report = CompensationReport::Skipped { reason: SkipReason::ZeroFanout };
        assert_eq!(report.to_string(), "skipped (zero fan-out)");
    }
}
