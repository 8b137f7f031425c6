//! Codes defined by the NIfTI-1 standard which are written by this crate.
//! Primitive integer values can be converted to these types and vice versa
//! through `num_traits::FromPrimitive`.

/// Voxel data type of an output volume.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, FromPrimitive)]
pub enum NiftiType {
    /// unsigned char.
    // NIFTI_TYPE_UINT8           2
    Uint8 = 2,
    /// signed short.
    // NIFTI_TYPE_INT16           4
    Int16 = 4,
    /// signed int.
    // NIFTI_TYPE_INT32           8
    Int32 = 8,
    /// 32 bit float.
    // NIFTI_TYPE_FLOAT32        16
    Float32 = 16,
    /// 3 8 bit bytes.
    // NIFTI_TYPE_RGB24         128
    Rgb24 = 128,
    /// unsigned short.
    // NIFTI_TYPE_UINT16        512
    Uint16 = 512,
    /// unsigned int.
    // NIFTI_TYPE_UINT32        768
    Uint32 = 768,
    /// 4 8 bit bytes.
    // NIFTI_TYPE_RGBA32       2304
    Rgba32 = 2304,
}

impl NiftiType {
    /// Retrieve the size of an element of this data type, in bytes.
    pub fn size_of(self) -> usize {
        use NiftiType::*;
        match self {
            Uint8 => 1,
            Int16 | Uint16 => 2,
            Rgb24 => 3,
            Int32 | Uint32 | Float32 | Rgba32 => 4,
        }
    }

    /// The number of bits per voxel (`bitpix`) of this data type.
    pub fn bitpix(self) -> i16 {
        (self.size_of() * 8) as i16
    }
}

/// Spatial and temporal units, as stored in `xyzt_units`.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, FromPrimitive)]
pub enum Unit {
    /// NIFTI code for unspecified units.
    Unknown = 0,
    /* Space codes are multiples of 1. */
    /// NIFTI code for meters.
    Meter = 1,
    /// NIFTI code for millimeters.
    Mm = 2,
    /// NIFTI code for micrometers.
    Micron = 3,
    /* Time codes are multiples of 8. */
    /// NIFTI code for seconds.
    Sec = 8,
    /// NIFTI code for milliseconds.
    Msec = 16,
    /// NIFTI code for microseconds.
    Usec = 24,
}

/// Coordinate system of the `qform` and `sform` transformations.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, FromPrimitive)]
pub enum XForm {
    /// Arbitrary coordinates (Method 1).
    Unknown = 0,
    /// Scanner-based anatomical coordinates
    ScannerAnat = 1,
    /// Coordinates aligned to another file's,
    /// or to anatomical "truth".
    AlignedAnat = 2,
    /// Coordinates aligned to Talairach-Tournoux
    /// Atlas; (0,0,0)=AC, etc.
    Talairach = 3,
    /// MNI 152 normalized coordinates.
    Mni152 = 4,
}

#[cfg(test)]
mod tests {
    use super::{NiftiType, Unit};
    use num_traits::FromPrimitive;

    #[test]
    fn datatype_codes() {
        assert_eq!(NiftiType::from_i16(512), Some(NiftiType::Uint16));
        assert_eq!(NiftiType::from_i16(2304), Some(NiftiType::Rgba32));
        assert_eq!(NiftiType::from_i16(64), None);
        assert_eq!(NiftiType::Rgb24.bitpix(), 24);
        assert_eq!(NiftiType::Float32.bitpix(), 32);
    }

    #[test]
    fn unit_codes_combine() {
        assert_eq!(Unit::Micron as u8 + Unit::Sec as u8, 11);
        assert_eq!(Unit::from_u8(16), Some(Unit::Msec));
    }
}
