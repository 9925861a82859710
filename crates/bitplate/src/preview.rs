//! Low-fidelity colour preview of a four-plate CMYK set.
//!
//! Each preview pixel samples a 3x3 neighbourhood on every plate with
//! [`BitImage::area_coverage`]; no colour-management accuracy is intended.

use image::{Rgb, RgbImage};
use tracing::debug;

use crate::bitimage::BitImage;

/// Weight of one covered cyan/magenta/yellow pixel on its anti-channel.
const PROCESS_WEIGHT: u16 = 12;

/// Weight of one covered black pixel on every channel.
const BLACK_WEIGHT: u16 = 16;

/// Channel value of an uncovered sample.
const PAPER_LEVEL: u16 = 252;

/// The four separations of one page.
#[derive(Debug, Clone)]
pub struct CmykPlates {
    pub cyan: BitImage,
    pub magenta: BitImage,
    pub yellow: BitImage,
    pub black: BitImage,
}

/// Fraction of "on" pixels per separation, each in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CmykCoverage {
    pub c: f64,
    pub m: f64,
    pub y: f64,
    pub k: f64,
}

impl CmykPlates {
    /// Render an RGB preview a third of the requested size.
    ///
    /// Border pixels of the preview are left white.
    pub fn render_preview(&self, out_width: u32, out_height: u32) -> RgbImage {
        let (width, height) = (out_width / 3, out_height / 3);
        debug!(width, height, "Rendering CMYK preview");

        let mut preview = RgbImage::from_pixel(width, height, Rgb([255, 255, 255]));
        for i in 1..width.saturating_sub(1) {
            for j in 1..height.saturating_sub(1) {
                let (x, y) = (i64::from(i) * 3, i64::from(j) * 3);
                let black = self.black.area_coverage(x, y) * BLACK_WEIGHT;
                let channel = |plate: &BitImage| {
                    (PAPER_LEVEL - (plate.area_coverage(x, y) * PROCESS_WEIGHT + black)) as u8
                };
                preview.put_pixel(
                    i,
                    j,
                    Rgb([
                        channel(&self.cyan),
                        channel(&self.magenta),
                        channel(&self.yellow),
                    ]),
                );
            }
        }
        preview
    }

    /// Coverage of the `area x area` square whose top-left pixel is `(x, y)`.
    pub fn sample_coverage(&self, x: i64, y: i64, area: u32) -> CmykCoverage {
        if area == 0 {
            return CmykCoverage::default();
        }

        let count = |plate: &BitImage| {
            let mut on = 0u64;
            for dy in 0..i64::from(area) {
                for dx in 0..i64::from(area) {
                    if plate.get_pixel(x + dx, y + dy) {
                        on += 1;
                    }
                }
            }
            on as f64 / (f64::from(area) * f64::from(area))
        };

        CmykCoverage {
            c: count(&self.cyan),
            m: count(&self.magenta),
            y: count(&self.yellow),
            k: count(&self.black),
        }
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

    fn blank_set(width: u32, height: u32) -> CmykPlates {
        CmykPlates {
            cyan: BitImage::new(width, height),
            magenta: BitImage::new(width, height),
            yellow: BitImage::new(width, height),
            black: BitImage::new(width, height),
        }
    }

    #[test]
    fn test_preview_dimensions_are_a_third() {
        let plates = blank_set(30, 21);
        let preview = plates.render_preview(30, 21);
        assert_eq!(preview.dimensions(), (10, 7));
    }

    #[test]
    fn test_blank_plates_render_paper_level() {
        let plates = blank_set(30, 30);
        let preview = plates.render_preview(30, 30);
        assert_eq!(preview.get_pixel(5, 5), &Rgb([252, 252, 252]));
        // Border stays white.
        assert_eq!(preview.get_pixel(0, 0), &Rgb([255, 255, 255]));
    }

    #[test]
    fn test_full_cyan_darkens_red_only() {
        let mut plates = blank_set(30, 30);
        plates.cyan = solid(30, 30);
        let preview = plates.render_preview(30, 30);
        assert_eq!(preview.get_pixel(4, 4), &Rgb([252 - 9 * 12, 252, 252]));
    }

    #[test]
    fn test_full_black_and_cyan_reaches_zero_red() {
        let mut plates = blank_set(30, 30);
        plates.cyan = solid(30, 30);
        plates.black = solid(30, 30);
        let preview = plates.render_preview(30, 30);
        assert_eq!(preview.get_pixel(4, 4), &Rgb([0, 108, 108]));
    }

    #[test]
    fn test_sample_coverage_fractions() {
        let mut plates = blank_set(10, 10);
        plates.magenta = solid(10, 10);
        plates.black.set_pixel(1, 1, true);

        let coverage = plates.sample_coverage(1, 1, 2);
        assert_eq!(coverage.c, 0.0);
        assert_eq!(coverage.m, 1.0);
        assert_eq!(coverage.k, 0.25);
        assert_eq!(plates.sample_coverage(1, 1, 0), CmykCoverage::default());
    }
}
