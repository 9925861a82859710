//! Plate container codec.
//!
//! Plates travel as single-page bilevel TIFF files: one sample of one bit
//! per pixel, `WhiteIsZero` photometric, chunky planar layout and inch
//! resolution unit. A set bit is an inked ("on") pixel, matching the
//! [`BitImage`] buffer layout exactly, so strips unpack straight into it.

use std::io::Cursor;
use std::path::Path;

use tiff::decoder::Decoder;
use tiff::encoder::{Rational, TiffEncoder};
use tiff::tags::Tag;
use tracing::debug;

use crate::bitimage::BitImage;
use crate::strips::{
    COMPRESSION_GROUP4, COMPRESSION_NONE, StripCompression, StripLayout, decode_strips,
    encode_group4,
};
use crate::{DEFAULT_DPI, RasterError, Result};

const FILL_ORDER_MSB_FIRST: u32 = 1;
const FILL_ORDER_LSB_FIRST: u32 = 2;
const PHOTOMETRIC_WHITE_IS_ZERO: u32 = 0;
const PLANAR_CHUNKY: u32 = 1;
const RESOLUTION_UNIT_INCH: u32 = 2;

/// Largest plate accepted by the decoder, in pixels.
pub const MAX_PLATE_PIXELS: u64 = 1 << 32;

/// Decode and encode plates to their on-disk container.
pub trait PlateCodec {
    /// Decode container bytes into a bit image.
    fn decode(&self, data: &[u8]) -> Result<BitImage>;

    /// Encode a bit image into container bytes.
    fn encode(&self, image: &BitImage) -> Result<Vec<u8>>;

    /// Read and decode a plate file.
    fn load(&self, path: &Path) -> Result<BitImage> {
        let data = std::fs::read(path)?;
        self.decode(&data)
    }

    /// Encode a plate and write it to `path`, replacing any existing file.
    fn save(&self, path: &Path, image: &BitImage) -> Result<()> {
        let data = self.encode(image)?;
        std::fs::write(path, data)?;
        Ok(())
    }
}

/// Strip-based bilevel TIFF codec.
///
/// Decoding reads uncompressed, CCITT Group 4, PackBits and Deflate strips.
/// Encoding writes one Group 4 strip, or one uncompressed strip for plates
/// too large for Group 4 line counters.
#[derive(Debug, Clone, Copy)]
pub struct TiffCodec {
    dpi: u32,
}

impl Default for TiffCodec {
    fn default() -> Self {
        Self { dpi: DEFAULT_DPI }
    }
}

impl TiffCodec {
    pub fn new(dpi: u32) -> Self {
        Self { dpi }
    }

    pub fn dpi(&self) -> u32 {
        self.dpi
    }
}

/// Read an unsigned tag, falling back to `default` when absent.
fn tag_or<R: std::io::Read + std::io::Seek>(
    decoder: &mut Decoder<R>,
    tag: Tag,
    default: u32,
) -> Result<u32> {
    Ok(match decoder.find_tag(tag)? {
        Some(value) => value.into_u32()?,
        None => default,
    })
}

/// Read an unsigned tag, falling back to its baseline default when absent,
/// and reject any value other than `expected`.
fn expect_tag<R: std::io::Read + std::io::Seek>(
    decoder: &mut Decoder<R>,
    tag: Tag,
    field: &'static str,
    default: u32,
    expected: u32,
) -> Result<()> {
    let actual = tag_or(decoder, tag, default)?;
    if actual != expected {
        return Err(RasterError::Validation {
            field,
            expected: expected.to_string(),
            actual: actual.to_string(),
        });
    }
    Ok(())
}

impl PlateCodec for TiffCodec {
    fn decode(&self, data: &[u8]) -> Result<BitImage> {
        let mut decoder = Decoder::new(Cursor::new(data))?;
        let (width, height) = decoder.dimensions()?;

        let pixels = u64::from(width) * u64::from(height);
        if pixels > MAX_PLATE_PIXELS {
            return Err(RasterError::Malformed(format!(
                "{width}x{height} plate exceeds {MAX_PLATE_PIXELS} pixels"
            )));
        }

        expect_tag(&mut decoder, Tag::SamplesPerPixel, "SamplesPerPixel", 1, 1)?;
        expect_tag(&mut decoder, Tag::BitsPerSample, "BitsPerSample", 1, 1)?;
        expect_tag(
            &mut decoder,
            Tag::PhotometricInterpretation,
            "PhotometricInterpretation",
            PHOTOMETRIC_WHITE_IS_ZERO,
            PHOTOMETRIC_WHITE_IS_ZERO,
        )?;
        expect_tag(
            &mut decoder,
            Tag::PlanarConfiguration,
            "PlanarConfiguration",
            PLANAR_CHUNKY,
            PLANAR_CHUNKY,
        )?;
        expect_tag(
            &mut decoder,
            Tag::ResolutionUnit,
            "ResolutionUnit",
            RESOLUTION_UNIT_INCH,
            RESOLUTION_UNIT_INCH,
        )?;

        let compression_tag = tag_or(&mut decoder, Tag::Compression, COMPRESSION_NONE)?;
        let compression = StripCompression::from_tag(compression_tag)?;
        let fill_order = tag_or(&mut decoder, Tag::FillOrder, FILL_ORDER_MSB_FIRST)?;
        let layout = StripLayout {
            width,
            height,
            rows_per_strip: tag_or(&mut decoder, Tag::RowsPerStrip, u32::MAX)?,
            lsb_first: fill_order == FILL_ORDER_LSB_FIRST,
        };
        debug!(width, height, compression = compression_tag, fill_order, "Decoding plate");

        let offsets = decoder.get_tag_u32_vec(Tag::StripOffsets)?;
        let counts = decoder.get_tag_u32_vec(Tag::StripByteCounts)?;
        let buffer = decode_strips(data, &offsets, &counts, layout, compression)?;

        BitImage::from_raw(width, height, buffer)
    }

    fn encode(&self, image: &BitImage) -> Result<Vec<u8>> {
        let (compression, strip) = match encode_group4(image) {
            Some(strip) => (COMPRESSION_GROUP4, strip),
            None => (COMPRESSION_NONE, image.as_bytes().to_vec()),
        };

        let mut cursor = Cursor::new(Vec::new());
        {
            let mut encoder = TiffEncoder::new(&mut cursor)?;
            let mut dir = encoder.new_directory()?;

            let strip_offset = dir.write_data(&strip[..])?;
            let resolution = Rational { n: self.dpi, d: 1 };

            dir.write_tag(Tag::ImageWidth, image.width())?;
            dir.write_tag(Tag::ImageLength, image.height())?;
            dir.write_tag(Tag::BitsPerSample, 1u16)?;
            dir.write_tag(Tag::Compression, compression as u16)?;
            dir.write_tag(
                Tag::PhotometricInterpretation,
                PHOTOMETRIC_WHITE_IS_ZERO as u16,
            )?;
            dir.write_tag(Tag::FillOrder, FILL_ORDER_MSB_FIRST as u16)?;
            dir.write_tag(Tag::StripOffsets, strip_offset as u32)?;
            dir.write_tag(Tag::SamplesPerPixel, 1u16)?;
            dir.write_tag(Tag::RowsPerStrip, image.height())?;
            dir.write_tag(Tag::StripByteCounts, strip.len() as u32)?;
            dir.write_tag(Tag::XResolution, resolution.clone())?;
            dir.write_tag(Tag::YResolution, resolution)?;
            dir.write_tag(Tag::PlanarConfiguration, PLANAR_CHUNKY as u16)?;
            dir.write_tag(Tag::ResolutionUnit, RESOLUTION_UNIT_INCH as u16)?;
            dir.finish()?;
        }

        let bytes = cursor.into_inner();
        debug!(
            width = image.width(),
            height = image.height(),
            compression,
            size = bytes.len(),
            dpi = self.dpi,
            "Encoded plate"
        );
        Ok(bytes)
    }
}
