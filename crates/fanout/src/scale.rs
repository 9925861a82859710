//! Unit conversion from millimetres of fan-out to plate rows.

use crate::{CompensationError, Result};

/// Inches per millimetre as used by the plate setters.
pub const INCHES_PER_MM: f64 = 0.0393701;

/// Dots per millimetre at the given resolution.
pub fn dots_per_mm(dpi: u32) -> f64 {
    f64::from(dpi) * INCHES_PER_MM
}

/// Fan-out distance in whole pixel rows, truncated toward zero.
pub fn pixel_fanout(dpi: u32, fanout_mm: f64) -> Result<u32> {
    if !fanout_mm.is_finite() || fanout_mm < 0.0 {
        return Err(CompensationError::InvalidFanout(fanout_mm));
    }
    Ok((dots_per_mm(dpi) * fanout_mm) as u32)
}

/// Every `scale`-th row is removed to shorten a plate of `height` rows by
/// roughly `pixel_fanout` rows.
///
/// Evaluates `truncate(1 / (1 - (height - pixel_fanout) / height))`, which
/// reduces to `height / pixel_fanout` in integer arithmetic. A zero fan-out
/// yields scale 0, which decimation treats as a no-op.
pub fn decimation_factor(height: u32, pixel_fanout: u32) -> Result<u32> {
    if pixel_fanout >= height {
        return Err(CompensationError::FanoutExceedsHeight {
            pixel_fanout,
            height,
        });
    }
    if pixel_fanout == 0 {
        return Ok(0);
    }
    Ok(height / pixel_fanout)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dots_per_mm_at_1200_dpi() {
        assert!((dots_per_mm(1200) - 47.24412).abs() < 1e-9);
    }

    #[test]
    fn test_pixel_fanout_truncates() {
        assert_eq!(pixel_fanout(1200, 0.5).unwrap(), 23);
        assert_eq!(pixel_fanout(1200, 0.0).unwrap(), 0);
        assert_eq!(pixel_fanout(2400, 1.0).unwrap(), 94);
    }

    #[test]
    fn test_pixel_fanout_rejects_bad_distances() {
        for bad in [-0.1, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                pixel_fanout(1200, bad),
                Err(CompensationError::InvalidFanout(_))
            ));
        }
    }

    #[test]
    fn test_decimation_factor_for_reference_plate() {
        // 1 / (1 - 1977/2000) = 86.96
        assert_eq!(decimation_factor(2000, 23).unwrap(), 86);
        assert_eq!(decimation_factor(2000, 20).unwrap(), 100);
        assert_eq!(decimation_factor(2000, 0).unwrap(), 0);
    }

    #[test]
    fn test_decimation_factor_rejects_fanout_at_height() {
        assert!(matches!(
            decimation_factor(100, 100),
            Err(CompensationError::FanoutExceedsHeight { pixel_fanout: 100, height: 100 })
        ));
        assert!(decimation_factor(0, 0).is_err());
    }
}
