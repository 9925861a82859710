//! Alignment marks that must survive compensation untouched.
//!
//! The lead and trail marks are registration targets at fixed plate
//! positions. They are blanked before the plate is decimated and shifted,
//! then stamped back at the same place so only the printed content moves.

use bitplate::BitImage;
use tracing::debug;

/// One mark together with its placement and an equally sized blank mask.
#[derive(Debug, Clone)]
pub struct MarkPlacement {
    image: BitImage,
    blank: BitImage,
    x: i64,
    y: i64,
}

impl MarkPlacement {
    /// Place `image` with its top-left pixel displaced by `(x, y)`.
    pub fn new(image: BitImage, x: i64, y: i64) -> Self {
        let blank = BitImage::new(image.width(), image.height());
        Self { image, blank, x, y }
    }

    pub fn image(&self) -> &BitImage {
        &self.image
    }

    pub fn position(&self) -> (i64, i64) {
        (self.x, self.y)
    }

    fn clear(&self, plate: &mut BitImage) {
        plate.insert(&self.blank, self.x, self.y);
    }

    fn stamp(&self, plate: &mut BitImage) {
        plate.insert(&self.image, self.x, self.y);
    }
}

/// Lead and trail registration marks.
#[derive(Debug, Clone)]
pub struct AlignmentMarks {
    pub lead: MarkPlacement,
    pub trail: MarkPlacement,
}

impl AlignmentMarks {
    pub fn new(lead: MarkPlacement, trail: MarkPlacement) -> Self {
        Self { lead, trail }
    }

    /// Blank both mark areas.
    pub fn remove(&self, plate: &mut BitImage) {
        self.lead.clear(plate);
        self.trail.clear(plate);
        debug!("Removed alignment marks");
    }

    /// Stamp both marks back at their fixed positions.
    pub fn restore(&self, plate: &mut BitImage) {
        self.lead.stamp(plate);
        self.trail.stamp(plate);
        debug!("Restored alignment marks");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(width: u32, height: u32) -> BitImage {
        let mut img = BitImage::new(width, height);
        img.draw_line(1, 1, height, width, true);
        img
    }

    fn marks() -> AlignmentMarks {
        AlignmentMarks::new(
            MarkPlacement::new(solid(3, 2), 0, 0),
            MarkPlacement::new(solid(2, 2), 10, 18),
        )
    }

    #[test]
    fn test_remove_blanks_only_mark_areas() {
        let mut plate = solid(20, 20);
        marks().remove(&mut plate);
        assert_eq!(plate.count_on(), 400 - 6 - 4);
        assert!(!plate.get_pixel(3, 2));
        assert!(!plate.get_pixel(12, 20));
        assert!(plate.get_pixel(4, 1));
    }

    #[test]
    fn test_restore_stamps_marks_at_position() {
        let mut plate = BitImage::new(20, 20);
        marks().restore(&mut plate);
        assert_eq!(plate.count_on(), 10);
        assert!(plate.get_pixel(1, 1));
        assert!(plate.get_pixel(11, 19));
        assert!(plate.get_pixel(12, 20));
        assert!(!plate.get_pixel(13, 20));
    }

    #[test]
    fn test_placement_accessors() {
        let placement = MarkPlacement::new(solid(4, 5), 7, 9);
        assert_eq!(placement.position(), (7, 9));
        assert_eq!(placement.image().dimensions(), (4, 5));
    }
}
