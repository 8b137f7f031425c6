//! Strip decoding for the layouts the `tiff` decoder does not expand: two
//! samples per pixel (gray with alpha, red and green) and separate sample
//! planes (`PlanarConfiguration` = 2).
//!
//! Only uncompressed and Deflate compressed strips without a predictor are
//! handled here. Anything else is reported as
//! `ConvertError::InvalidStrips`.

use crate::error::{ConvertError, Result};
use crate::pixel::{SAMPLE_FORMAT_FLOAT, SAMPLE_FORMAT_INT};
use crate::source::RasterData;
use byteordered::{ByteOrdered, Endianness};
use flate2::read::ZlibDecoder;
use std::convert::TryFrom;
use std::io::Read;

/// `Compression` value of uncompressed strips.
pub const COMPRESSION_NONE: u16 = 1;
/// `Compression` value of Adobe Deflate strips.
pub const COMPRESSION_DEFLATE: u16 = 8;
/// Legacy `Compression` value of Deflate strips.
pub const COMPRESSION_DEFLATE_OLD: u16 = 32946;

/// Where and how the samples of one image are stored.
#[derive(Debug, Clone, PartialEq)]
pub struct StripLayout {
    /// width in pixels
    pub width: u32,
    /// height in pixels
    pub height: u32,
    /// samples per pixel
    pub samples_per_pixel: u16,
    /// bits of every sample
    pub bits_per_sample: u16,
    /// `SampleFormat` tag value, 1 when absent
    pub sample_format: u16,
    /// `Compression` tag value
    pub compression: u16,
    /// `Predictor` tag value, 1 when absent
    pub predictor: u16,
    /// whether each sample is stored in a plane of its own
    pub planar: bool,
    /// `RowsPerStrip` tag value
    pub rows_per_strip: u32,
    /// file offset of each strip
    pub offsets: Vec<u64>,
    /// stored length of each strip
    pub byte_counts: Vec<u64>,
}

impl StripLayout {
    fn sample_bytes(&self) -> usize {
        usize::from(self.bits_per_sample / 8)
    }

    fn strips_per_plane(&self) -> usize {
        let rows = match self.rows_per_strip {
            0 => self.height,
            r => r.min(self.height),
        }
        .max(1);
        ((self.height + rows - 1) / rows) as usize
    }

    /// Decode the strips of the image out of the whole `file`, producing
    /// samples interleaved by pixel.
    ///
    /// # Errors
    ///
    /// - `ConvertError::UnsupportedPixelFormat` if the sample width or format
    ///   cannot be represented.
    /// - `ConvertError::InvalidStrips` if the compression is not handled or
    ///   the strips do not lie within the file or are too short.
    pub fn decode(&self, file: &[u8], byte_order: Endianness) -> Result<RasterData> {
        let spp = usize::from(self.samples_per_pixel);
        if !self.sample_layout_supported() {
            return Err(ConvertError::UnsupportedPixelFormat(
                u32::from(self.bits_per_sample) * u32::from(self.samples_per_pixel),
                self.samples_per_pixel,
            ));
        }
        if ![COMPRESSION_NONE, COMPRESSION_DEFLATE, COMPRESSION_DEFLATE_OLD]
            .contains(&self.compression)
        {
            return Err(ConvertError::InvalidStrips("unsupported compression"));
        }
        if self.predictor != 1 {
            return Err(ConvertError::InvalidStrips("unsupported predictor"));
        }

        let planes = if self.planar { spp } else { 1 };
        let per_plane = self.strips_per_plane();
        let n_strips = planes * per_plane;
        if self.offsets.len() < n_strips || self.byte_counts.len() < n_strips {
            return Err(ConvertError::InvalidStrips("missing strip offsets"));
        }

        let pixels = self.width as usize * self.height as usize;
        let plane_len = pixels * self.sample_bytes() * (spp / planes);
        let mut raw = Vec::with_capacity(plane_len * planes);
        for plane in 0..planes {
            let mut plane_bytes = Vec::with_capacity(plane_len);
            for strip in plane * per_plane..(plane + 1) * per_plane {
                self.read_strip(file, strip, &mut plane_bytes)?;
            }
            if plane_bytes.len() < plane_len {
                return Err(ConvertError::InvalidStrips("strip data is too short"));
            }
            // the last strip may be padded to whole rows
            plane_bytes.truncate(plane_len);
            raw.extend_from_slice(&plane_bytes);
        }

        if planes > 1 {
            raw = interleave(&raw, spp, self.sample_bytes());
        }
        to_samples(&raw, self.bits_per_sample, self.sample_format, byte_order)
    }

    fn sample_layout_supported(&self) -> bool {
        match (self.sample_format, self.bits_per_sample) {
            (SAMPLE_FORMAT_FLOAT, 32) | (SAMPLE_FORMAT_FLOAT, 64) => true,
            (SAMPLE_FORMAT_FLOAT, _) => false,
            (_, 8) | (_, 16) | (_, 32) => true,
            _ => false,
        }
    }

    /// Append the decompressed bytes of strip `index` to `out`.
    fn read_strip(&self, file: &[u8], index: usize, out: &mut Vec<u8>) -> Result<()> {
        let bounds = usize::try_from(self.offsets[index])
            .ok()
            .zip(usize::try_from(self.byte_counts[index]).ok())
            .and_then(|(start, len)| Some(start..start.checked_add(len)?))
            .filter(|range| range.end <= file.len());
        let chunk = match bounds {
            Some(range) => &file[range],
            None => return Err(ConvertError::InvalidStrips("strip lies outside of the file")),
        };
        match self.compression {
            COMPRESSION_NONE => out.extend_from_slice(chunk),
            _ => {
                let _ = ZlibDecoder::new(chunk).read_to_end(out)?;
            }
        }
        Ok(())
    }
}

/// Interleave `spp` consecutive sample planes of `sample_bytes` wide samples.
fn interleave(planes: &[u8], spp: usize, sample_bytes: usize) -> Vec<u8> {
    let plane_len = planes.len() / spp;
    let pixels = plane_len / sample_bytes;
    let mut out = Vec::with_capacity(planes.len());
    for px in 0..pixels {
        for s in 0..spp {
            let start = s * plane_len + px * sample_bytes;
            out.extend_from_slice(&planes[start..start + sample_bytes]);
        }
    }
    out
}

fn to_samples(raw: &[u8], bits: u16, format: u16, byte_order: Endianness) -> Result<RasterData> {
    macro_rules! read_all {
        ($variant: ident, $read: ident, $size: expr) => {{
            let mut reader = ByteOrdered::runtime(raw, byte_order);
            let values = (0..raw.len() / $size)
                .map(|_| reader.$read())
                .collect::<std::io::Result<Vec<_>>>()?;
            RasterData::$variant(values)
        }};
    }

    Ok(match (format, bits) {
        (SAMPLE_FORMAT_FLOAT, 32) => read_all!(F32, read_f32, 4),
        (SAMPLE_FORMAT_FLOAT, _) => read_all!(F64, read_f64, 8),
        (SAMPLE_FORMAT_INT, 8) => RasterData::I8(raw.iter().map(|&b| b as i8).collect()),
        (SAMPLE_FORMAT_INT, 16) => read_all!(I16, read_i16, 2),
        (SAMPLE_FORMAT_INT, _) => read_all!(I32, read_i32, 4),
        (_, 8) => RasterData::U8(raw.to_vec()),
        (_, 16) => read_all!(U16, read_u16, 2),
        _ => read_all!(U32, read_u32, 4),
    })
}
