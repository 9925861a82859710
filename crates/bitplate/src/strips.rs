//! Strip compression for bilevel plates.
//!
//! Strips are always unpacked into the [`BitImage`] layout directly: set bit
//! means inked, rows padded to whole bytes. No photometric inversion happens
//! here; the codec only accepts `WhiteIsZero`.

use std::io::Read;

use fax::decoder::{decode_g4, pels};
use fax::encoder::Encoder;
use fax::{Color, VecWriter};
use flate2::read::ZlibDecoder;

use crate::bitimage::BitImage;
use crate::{RasterError, Result};

pub(crate) const COMPRESSION_NONE: u32 = 1;
pub(crate) const COMPRESSION_GROUP4: u32 = 4;
const COMPRESSION_DEFLATE: u32 = 8;
const COMPRESSION_PACKBITS: u32 = 32773;
const COMPRESSION_OLD_DEFLATE: u32 = 32946;

/// Compression schemes readable from a plate strip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StripCompression {
    None,
    Group4,
    PackBits,
    Deflate,
}

impl StripCompression {
    pub(crate) fn from_tag(value: u32) -> Result<Self> {
        match value {
            COMPRESSION_NONE => Ok(Self::None),
            COMPRESSION_GROUP4 => Ok(Self::Group4),
            COMPRESSION_PACKBITS => Ok(Self::PackBits),
            COMPRESSION_DEFLATE | COMPRESSION_OLD_DEFLATE => Ok(Self::Deflate),
            other => Err(RasterError::Validation {
                field: "Compression",
                expected: "1, 4, 8, 32773 or 32946".to_string(),
                actual: other.to_string(),
            }),
        }
    }
}

/// Geometry of the strips making up one plate.
#[derive(Debug, Clone, Copy)]
pub(crate) struct StripLayout {
    pub width: u32,
    pub height: u32,
    pub rows_per_strip: u32,
    /// FillOrder 2: the least significant bit comes first.
    pub lsb_first: bool,
}

impl StripLayout {
    fn row_bytes(&self) -> usize {
        self.width.div_ceil(8) as usize
    }
}

/// Unpack every strip of a plate into one packed buffer.
///
/// The buffer only grows as strip data is actually decoded, so header
/// dimensions alone never drive an allocation.
pub(crate) fn decode_strips(
    data: &[u8],
    offsets: &[u32],
    counts: &[u32],
    layout: StripLayout,
    compression: StripCompression,
) -> Result<Vec<u8>> {
    if offsets.len() != counts.len() {
        return Err(RasterError::Malformed(format!(
            "{} strip offsets but {} strip byte counts",
            offsets.len(),
            counts.len()
        )));
    }

    let rows_per_strip = layout.rows_per_strip.clamp(1, layout.height.max(1));
    let strip_count = layout.height.div_ceil(rows_per_strip) as usize;
    if offsets.len() < strip_count {
        return Err(RasterError::Malformed(format!(
            "{} strips present, image needs {strip_count}",
            offsets.len()
        )));
    }

    let mut buffer = Vec::new();
    for (index, (&offset, &count)) in offsets.iter().zip(counts).take(strip_count).enumerate() {
        let first_row = index as u32 * rows_per_strip;
        let rows = rows_per_strip.min(layout.height - first_row);
        let strip_len = (rows as usize)
            .checked_mul(layout.row_bytes())
            .ok_or_else(|| RasterError::Malformed(format!("strip {index} is too large")))?;
        let strip = strip_bytes(data, offset, count)?;

        let start = buffer.len();
        match compression {
            StripCompression::None => {
                let raw = strip
                    .get(..strip_len)
                    .ok_or_else(|| short_strip(index, strip.len(), strip_len))?;
                buffer.extend_from_slice(raw);
            }
            StripCompression::PackBits => unpack_bits(strip, strip_len, &mut buffer)?,
            StripCompression::Deflate => inflate(strip, strip_len, &mut buffer)?,
            StripCompression::Group4 => {
                let reversed: Vec<u8>;
                let input = if layout.lsb_first {
                    reversed = strip.iter().map(|b| b.reverse_bits()).collect();
                    &reversed[..]
                } else {
                    strip
                };
                decode_group4(input, layout.width, rows, &mut buffer)?;
            }
        }

        let decoded = buffer.len() - start;
        if decoded < strip_len {
            return Err(short_strip(index, decoded, strip_len));
        }
        if layout.lsb_first && compression != StripCompression::Group4 {
            buffer[start..].iter_mut().for_each(|b| *b = b.reverse_bits());
        }
    }
    Ok(buffer)
}

fn strip_bytes(data: &[u8], offset: u32, count: u32) -> Result<&[u8]> {
    let start = offset as usize;
    let end = start.checked_add(count as usize);
    end.and_then(|end| data.get(start..end)).ok_or_else(|| {
        RasterError::Malformed(format!(
            "strip at {start} of {count} bytes lies outside the {}-byte file",
            data.len()
        ))
    })
}

fn short_strip(index: usize, got: usize, needed: usize) -> RasterError {
    RasterError::Malformed(format!(
        "strip {index} holds {got} bytes, image needs {needed}"
    ))
}

/// PackBits run-length decoding, stopping once `limit` bytes are produced.
fn unpack_bits(input: &[u8], limit: usize, out: &mut Vec<u8>) -> Result<()> {
    let end = out.len().saturating_add(limit);
    let mut i = 0;
    while i < input.len() && out.len() < end {
        let header = input[i] as i8;
        i += 1;
        match header {
            0..=127 => {
                let n = header as usize + 1;
                let literal = input.get(i..i + n).ok_or_else(|| {
                    RasterError::Malformed("PackBits literal run past end of strip".to_string())
                })?;
                out.extend_from_slice(literal);
                i += n;
            }
            -127..=-1 => {
                let value = *input.get(i).ok_or_else(|| {
                    RasterError::Malformed("PackBits repeat run past end of strip".to_string())
                })?;
                let n = (1 - i16::from(header)) as usize;
                out.extend(std::iter::repeat_n(value, n));
                i += 1;
            }
            // -128 is a no-op
            _ => {}
        }
    }
    out.truncate(end);
    Ok(())
}

fn inflate(input: &[u8], limit: usize, out: &mut Vec<u8>) -> Result<()> {
    ZlibDecoder::new(input)
        .take(limit as u64)
        .read_to_end(out)
        .map_err(|e| RasterError::Malformed(format!("Deflate strip: {e}")))?;
    Ok(())
}

fn group4_dimension(value: u32, what: &str) -> Result<u16> {
    u16::try_from(value).map_err(|_| {
        RasterError::Malformed(format!("Group 4 {what} {value} exceeds {}", u16::MAX))
    })
}

fn decode_group4(input: &[u8], width: u32, rows: u32, out: &mut Vec<u8>) -> Result<()> {
    let line_width = group4_dimension(width, "width")?;
    let line_count = group4_dimension(rows, "strip height")?;
    let row_bytes = width.div_ceil(8) as usize;

    decode_g4(input.iter().copied(), line_width, Some(line_count), |transitions| {
        let mut row = vec![0u8; row_bytes];
        for (x, colour) in pels(transitions, line_width).enumerate() {
            if colour == Color::Black {
                row[x / 8] |= 0x80 >> (x % 8);
            }
        }
        out.extend_from_slice(&row);
    })
    .ok_or_else(|| RasterError::Malformed("invalid Group 4 data".to_string()))
}

/// Encode the whole plate as one Group 4 strip.
///
/// Returns `None` for empty plates and plates wider or taller than Group 4
/// line counters allow.
pub(crate) fn encode_group4(image: &BitImage) -> Option<Vec<u8>> {
    let width = u16::try_from(image.width()).ok().filter(|w| *w > 0)?;
    u16::try_from(image.height()).ok().filter(|h| *h > 0)?;

    let mut encoder = Encoder::new(VecWriter::new());
    for row in image.as_bytes().chunks(image.row_bytes()) {
        let line = (0..usize::from(width)).map(|x| {
            if row[x / 8] & (0x80 >> (x % 8)) != 0 {
                Color::Black
            } else {
                Color::White
            }
        });
        encoder
            .encode_line(line, width)
            .unwrap_or_else(|never| match never {});
    }
    let writer = encoder.finish().unwrap_or_else(|never| match never {});
    Some(writer.finish())
}
