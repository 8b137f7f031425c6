//! Types for error handling go here.
use crate::stack::StackConfig;
use std::io::Error as IOError;
use tiff::TiffError;

quick_error! {
    /// Error type for all error variants originated by this crate.
    #[derive(Debug)]
    pub enum ConvertError {
        /// The input buffer is not a TIFF (or BigTIFF) file.
        UnsupportedInputType {
            display("Unsupported input type: expected a TIFF byte buffer")
        }
        /// The pixel layout of the stack has no NIfTI-1 counterpart.
        UnsupportedPixelFormat(bit_depth: u32, channels: u16) {
            display("Unsupported TIFF bit depth: {}, channels: {}", bit_depth, channels)
        }
        /// Slice dimensions vary while the slice order is not sequential,
        /// so there is no defined way to remap the slices.
        DimensionMismatch(expected: StackConfig, found: StackConfig) {
            display("Slice order is not sequential and slice dimensions vary \
                     (expected {}, found {})", expected, found)
        }
        /// The volume does not fit in the signed 16-bit extents of a
        /// NIfTI-1 header.
        VolumeTooLarge(width: u32, height: u32, n_frames: usize) {
            display("Volume of {}x{} pixels and {} slices exceeds the NIfTI-1 limit of 32767 per axis",
                    width, height, n_frames)
        }
        /// A slice was mapped outside of the output volume.
        SliceIndexOutOfRange(index: usize, n_frames: usize) {
            display("Slice index {} out of range for {} frames", index, n_frames)
        }
        /// A metadata block could not be interpreted.
        MalformedMetadata(what: &'static str) {
            display("Malformed {} metadata", what)
        }
        /// A decoded raster does not hold the number of samples its
        /// directory announces.
        InvalidRaster { slice: usize, expected: usize, found: usize } {
            display("Unexpected sample count in slice {}: expected {}, got {}",
                    slice, expected, found)
        }
        /// The strips of a slice cannot be decoded.
        InvalidStrips(what: &'static str) {
            display("Cannot decode TIFF strips: {}", what)
        }
        /// The file does not contain any image.
        NoSlices {
            display("No image slices available")
        }
        /// TIFF decoding error
        Tiff(err: TiffError) {
            from()
            source(err)
            display("TIFF decoding error: {}", err)
        }
        /// I/O Error
        Io(err: IOError) {
            from()
            source(err)
            display("I/O error: {}", err)
        }
    }
}

/// Alias type for results originated from this crate.
pub type Result<T> = ::std::result::Result<T, ConvertError>;
