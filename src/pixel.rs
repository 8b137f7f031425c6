//! Selection of the NIfTI voxel type of a stack.
use crate::error::{ConvertError, Result};
use crate::typedef::NiftiType;

/// `SampleFormat` value of signed integer samples.
pub const SAMPLE_FORMAT_INT: u16 = 2;
/// `SampleFormat` value of floating point samples.
pub const SAMPLE_FORMAT_FLOAT: u16 = 3;

/// The voxel type chosen for a stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelType {
    /// NIfTI data type of the output
    pub datatype: NiftiType,
    /// samples per pixel in the input
    pub channels: u16,
    /// whether two channel (red, green) pixels are padded with a zero blue
    /// channel
    pub pad_rg: bool,
}

impl PixelType {
    /// Choose the voxel type for pixels of `bit_depth` bits split into
    /// `channels` samples. `sample_format` is the first value of the
    /// `SampleFormat` tag, if present.
    ///
    /// # Errors
    ///
    /// - `ConvertError::UnsupportedPixelFormat` if NIfTI-1 has no matching
    ///   data type.
    pub fn select(bit_depth: u32, channels: u16, sample_format: Option<u16>) -> Result<Self> {
        use NiftiType::*;
        let (datatype, pad_rg) = match (bit_depth, channels, sample_format) {
            (8, 1, _) => (Uint8, false),
            (16, 1, Some(SAMPLE_FORMAT_INT)) => (Int16, false),
            (16, 1, _) => (Uint16, false),
            (16, 2, _) => (Rgb24, true),
            (24, 3, _) => (Rgb24, false),
            (32, 1, Some(SAMPLE_FORMAT_INT)) => (Int32, false),
            (32, 1, Some(SAMPLE_FORMAT_FLOAT)) => (Float32, false),
            (32, 1, _) => (Uint32, false),
            (32, 4, _) => (Rgba32, false),
            _ => return Err(ConvertError::UnsupportedPixelFormat(bit_depth, channels)),
        };
        Ok(PixelType {
            datatype,
            channels,
            pad_rg,
        })
    }

    /// Bits per voxel of the output.
    pub fn bitpix(&self) -> i16 {
        self.datatype.bitpix()
    }
}
