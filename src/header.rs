//! This module defines the `NiftiHeader` struct, which holds the 348-byte
//! NIfTI-1 header record of an output volume, along with its binary
//! encoding.

use crate::affine::Affine;
use crate::dimension::DimensionSpec;
use crate::error::{ConvertError, Result};
use crate::pixel::PixelType;
use crate::typedef::{NiftiType, Unit, XForm};
use byteordered::{ByteOrdered, Endian, Endianness};
use num_traits::FromPrimitive;
use std::io::{Read, Write};

/// Magic code for NIFTI-1 header files (extention ".hdr[.gz]").
pub const MAGIC_CODE_NI1: &[u8; 4] = b"ni1\0";
/// Magic code for full NIFTI-1 files (extention ".nii[.gz]").
pub const MAGIC_CODE_NIP1: &[u8; 4] = b"n+1\0";
/// Size of the header record, in bytes.
pub const HEADER_SIZE: i32 = 348;
/// Offset of the voxel data in a single file volume: the header followed
/// by a four byte extender without extensions.
pub const VOX_OFFSET: f32 = 352.;
/// Default `xyzt_units`: millimeters and seconds.
const DEFAULT_XYZT_UNITS: u8 = Unit::Mm as u8 | Unit::Sec as u8;
/// Characters removed from the text fields.
const SHELL_CHARACTERS: &[char] = &['`', '$'];

/// The NIFTI-1 header data type.
/// All fields are public and named after the specification's header file.
///
/// # Examples
///
/// ```
/// use tiff2nii::NiftiHeader;
/// # use tiff2nii::Result;
///
/// # fn run() -> Result<()> {
/// let mut hdr = NiftiHeader::default();
/// hdr.set_description("acquired with `$scope`");
/// assert_eq!(hdr.description(), b"acquired with scope");
///
/// let mut bytes = Vec::new();
/// hdr.write_to(&mut bytes)?;
/// assert_eq!(bytes.len(), 352);
/// assert_eq!(NiftiHeader::from_reader(&bytes[..])?.description(), b"acquired with scope");
/// # Ok(())
/// # }
/// # run().unwrap();
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct NiftiHeader {
    /// Header size, must be 348
    pub sizeof_hdr: i32,
    /// Unused in NIFTI-1
    pub data_type: [u8; 10],
    /// Unused in NIFTI-1
    pub db_name: [u8; 18],
    /// Unused in NIFTI-1
    pub extents: i32,
    /// Unused in NIFTI-1
    pub session_error: i16,
    /// Unused in NIFTI-1, `b'r'` for Analyze compatibility
    pub regular: u8,
    /// MRI slice ordering
    pub dim_info: u8,
    /// Data array dimensions
    pub dim: [u16; 8],
    /// 1st intent parameter
    pub intent_p1: f32,
    /// 2nd intent parameter
    pub intent_p2: f32,
    /// 3rd intent parameter
    pub intent_p3: f32,
    /// NIFTI_INTENT_* code
    pub intent_code: i16,
    /// Defines the data type!
    pub datatype: i16,
    /// Number of bits per voxel
    pub bitpix: i16,
    /// First slice index
    pub slice_start: i16,
    /// Grid spacings
    pub pixdim: [f32; 8],
    /// Offset into .nii file to reach the volume
    pub vox_offset: f32,
    /// Data scaling: slope
    pub scl_slope: f32,
    /// Data scaling: offset
    pub scl_inter: f32,
    /// Last slice index
    pub slice_end: i16,
    /// Slice timing order
    pub slice_code: u8,
    /// Units of pixdim[1..4]
    pub xyzt_units: u8,
    /// Max display intensity
    pub cal_max: f32,
    /// Min display intensity
    pub cal_min: f32,
    /// Time for 1 slice
    pub slice_duration: f32,
    /// Time axis shift
    pub toffset: f32,
    /// Unused in NIFTI-1
    pub glmax: i32,
    /// Unused in NIFTI-1
    pub glmin: i32,

    /// Any text you like
    pub descrip: [u8; 80],
    /// Auxiliary filename
    pub aux_file: [u8; 24],
    /// NIFTI_XFORM_* code
    pub qform_code: i16,
    /// NIFTI_XFORM_* code
    pub sform_code: i16,
    /// Quaternion b param
    pub quatern_b: f32,
    /// Quaternion c param
    pub quatern_c: f32,
    /// Quaternion d param
    pub quatern_d: f32,
    /// Quaternion x shift
    pub quatern_x: f32,
    /// Quaternion y shift
    pub quatern_y: f32,
    /// Quaternion z shift
    pub quatern_z: f32,

    /// 1st row affine transform
    pub srow_x: [f32; 4],
    /// 2nd row affine transform
    pub srow_y: [f32; 4],
    /// 3rd row affine transform
    pub srow_z: [f32; 4],

    /// 'name' or meaning of data
    pub intent_name: [u8; 16],

    /// Magic code. Must be `b"ni1\0"` or `b"n+1\0"`
    pub magic: [u8; 4],

    /// Byte order of the record it was read from
    pub endianness: Endianness,
}

impl Default for NiftiHeader {
    fn default() -> NiftiHeader {
        NiftiHeader {
            sizeof_hdr: HEADER_SIZE,
            data_type: [0; 10],
            db_name: [0; 18],
            extents: 0,
            session_error: 0,
            regular: b'r',
            dim_info: 0,
            dim: [1, 0, 0, 0, 0, 0, 0, 0],
            intent_p1: 0.,
            intent_p2: 0.,
            intent_p3: 0.,
            intent_code: 0,
            datatype: 0,
            bitpix: 0,
            slice_start: 0,
            pixdim: [1., 1., 1., 1., 1., 0., 0., 0.],
            vox_offset: VOX_OFFSET,
            scl_slope: 1.,
            scl_inter: 0.,
            slice_end: 0,
            slice_code: 0,
            xyzt_units: 0,
            cal_max: 0.,
            cal_min: 0.,
            slice_duration: 0.,
            toffset: 0.,
            glmax: 0,
            glmin: 0,

            descrip: [0; 80],
            aux_file: [0; 24],
            qform_code: 0,
            sform_code: 0,
            quatern_b: 0.,
            quatern_c: 0.,
            quatern_d: 0.,
            quatern_x: 0.,
            quatern_y: 0.,
            quatern_z: 0.,

            srow_x: [0.; 4],
            srow_y: [0.; 4],
            srow_z: [0.; 4],

            intent_name: [0; 16],

            magic: *MAGIC_CODE_NIP1,

            endianness: Endianness::Little,
        }
    }
}

impl NiftiHeader {
    /// Build the header of a single file volume.
    pub fn for_volume(
        dim: [u16; 8],
        pixel: &PixelType,
        spec: &DimensionSpec,
        affine: &Affine,
    ) -> NiftiHeader {
        NiftiHeader {
            dim,
            datatype: pixel.datatype as i16,
            bitpix: pixel.bitpix(),
            pixdim: spec.pixdim(),
            xyzt_units: spec.xyzt_units(),
            sform_code: XForm::ScannerAnat as i16,
            srow_x: affine.srow_x(),
            srow_y: affine.srow_y(),
            srow_z: affine.srow_z(),
            ..Default::default()
        }
    }

    /// Read a NIfTI-1 header, along with its byte order, from the given byte
    /// stream. It is assumed that the input is currently at the start of the
    /// header.
    ///
    /// # Errors
    ///
    /// - `ConvertError::MalformedMetadata` if the input is not a NIfTI-1
    ///   header.
    /// - `ConvertError::Io` if the input ends before the header does.
    pub fn from_reader<R: Read>(mut input: R) -> Result<NiftiHeader> {
        let mut sizeof_hdr = [0; 4];
        input.read_exact(&mut sizeof_hdr)?;
        let endianness = if i32::from_le_bytes(sizeof_hdr) == HEADER_SIZE {
            Endianness::Little
        } else if i32::from_be_bytes(sizeof_hdr) == HEADER_SIZE {
            Endianness::Big
        } else {
            return Err(ConvertError::MalformedMetadata("NIfTI-1 header"));
        };
        let h = parse_header(ByteOrdered::runtime(input, endianness))?;
        if &h.magic != MAGIC_CODE_NI1 && &h.magic != MAGIC_CODE_NIP1 {
            return Err(ConvertError::MalformedMetadata("NIfTI-1 header"));
        }
        Ok(NiftiHeader { endianness, ..h })
    }

    /// Write the header in little endian, followed by the four byte
    /// extender. Zero `xyzt_units` are written as millimeters and seconds,
    /// an unset `sform_code` as scanner anatomical coordinates, and
    /// `vox_offset` is always 352.
    pub fn write_to<W: Write>(&self, writer: W) -> Result<()> {
        let mut w = ByteOrdered::le(writer);
        w.write_i32(HEADER_SIZE)?;
        w.write_all(&self.data_type)?;
        w.write_all(&self.db_name)?;
        w.write_i32(self.extents)?;
        w.write_i16(self.session_error)?;
        w.write_u8(self.regular)?;
        w.write_u8(self.dim_info)?;
        for s in &self.dim {
            w.write_u16(*s)?;
        }
        w.write_f32(self.intent_p1)?;
        w.write_f32(self.intent_p2)?;
        w.write_f32(self.intent_p3)?;
        w.write_i16(self.intent_code)?;
        w.write_i16(self.datatype)?;
        w.write_i16(self.bitpix)?;
        w.write_i16(self.slice_start)?;
        for f in &self.pixdim {
            w.write_f32(*f)?;
        }
        w.write_f32(VOX_OFFSET)?;
        w.write_f32(self.scl_slope)?;
        w.write_f32(self.scl_inter)?;
        w.write_i16(self.slice_end)?;
        w.write_u8(self.slice_code)?;
        w.write_u8(if self.xyzt_units == 0 {
            DEFAULT_XYZT_UNITS
        } else {
            self.xyzt_units
        })?;
        w.write_f32(self.cal_max)?;
        w.write_f32(self.cal_min)?;
        w.write_f32(self.slice_duration)?;
        w.write_f32(self.toffset)?;
        w.write_i32(self.glmax)?;
        w.write_i32(self.glmin)?;

        w.write_all(&self.descrip)?;
        w.write_all(&self.aux_file)?;
        w.write_i16(self.qform_code)?;
        w.write_i16(if self.sform_code < 1 {
            XForm::ScannerAnat as i16
        } else {
            self.sform_code
        })?;
        for f in &[
            self.quatern_b,
            self.quatern_c,
            self.quatern_d,
            self.quatern_x,
            self.quatern_y,
            self.quatern_z,
        ] {
            w.write_f32(*f)?;
        }
        for f in self.srow_x.iter().chain(&self.srow_y).chain(&self.srow_z) {
            w.write_f32(*f)?;
        }
        w.write_all(&self.intent_name)?;
        w.write_all(MAGIC_CODE_NIP1)?;

        // no extensions
        w.write_u32(0)?;
        Ok(())
    }

    /// Get the data type as a validated enum.
    pub fn data_type(&self) -> Option<NiftiType> {
        FromPrimitive::from_i16(self.datatype)
    }

    /// Get the spatial units type as a validated unit enum.
    pub fn xyzt_to_space(&self) -> Option<Unit> {
        FromPrimitive::from_u8(self.xyzt_units & 0o0007)
    }

    /// Get the time units type as a validated unit enum.
    pub fn xyzt_to_time(&self) -> Option<Unit> {
        FromPrimitive::from_u8(self.xyzt_units & 0o0070)
    }

    /// Get the sform coordinate mapping method as a validated enum.
    pub fn sform(&self) -> Option<XForm> {
        FromPrimitive::from_i16(self.sform_code)
    }

    /// The affine stored in the `srow_*` fields.
    pub fn affine(&self) -> Affine {
        Affine::from_rows([self.srow_x, self.srow_y, self.srow_z, [0., 0., 0., 1.]])
    }

    /// The `descrip` field up to its first null byte.
    pub fn description(&self) -> &[u8] {
        until_nul(&self.descrip)
    }

    /// The `aux_file` field up to its first null byte.
    pub fn aux_file(&self) -> &[u8] {
        until_nul(&self.aux_file)
    }

    /// Set the `descrip` field. Backticks and dollar signs are removed and
    /// the text is truncated to 80 bytes.
    pub fn set_description(&mut self, description: &str) {
        self.descrip = [0; 80];
        copy_text(description, &mut self.descrip);
    }

    /// Set the `aux_file` field. Backticks and dollar signs are removed and
    /// the text is truncated to 24 bytes.
    pub fn set_aux_file(&mut self, aux_file: &str) {
        self.aux_file = [0; 24];
        copy_text(aux_file, &mut self.aux_file);
    }
}

fn until_nul(field: &[u8]) -> &[u8] {
    let end = field.iter().position(|b| *b == 0).unwrap_or(field.len());
    &field[..end]
}

fn copy_text(text: &str, field: &mut [u8]) {
    let text: String = text.chars().filter(|c| !SHELL_CHARACTERS.contains(c)).collect();
    let len = text.len().min(field.len());
    field[..len].copy_from_slice(&text.as_bytes()[..len]);
}

/// Parse the header after its `sizeof_hdr` field.
fn parse_header<S, E>(mut input: ByteOrdered<S, E>) -> Result<NiftiHeader>
where
    S: Read,
    E: Endian,
{
    let mut h = NiftiHeader::default();

    input.read_exact(&mut h.data_type)?;
    input.read_exact(&mut h.db_name)?;
    h.extents = input.read_i32()?;
    h.session_error = input.read_i16()?;
    h.regular = input.read_u8()?;
    h.dim_info = input.read_u8()?;
    for v in &mut h.dim {
        *v = input.read_u16()?;
    }
    h.intent_p1 = input.read_f32()?;
    h.intent_p2 = input.read_f32()?;
    h.intent_p3 = input.read_f32()?;
    h.intent_code = input.read_i16()?;
    h.datatype = input.read_i16()?;
    h.bitpix = input.read_i16()?;
    h.slice_start = input.read_i16()?;
    for v in &mut h.pixdim {
        *v = input.read_f32()?;
    }
    h.vox_offset = input.read_f32()?;
    h.scl_slope = input.read_f32()?;
    h.scl_inter = input.read_f32()?;
    h.slice_end = input.read_i16()?;
    h.slice_code = input.read_u8()?;
    h.xyzt_units = input.read_u8()?;
    h.cal_max = input.read_f32()?;
    h.cal_min = input.read_f32()?;
    h.slice_duration = input.read_f32()?;
    h.toffset = input.read_f32()?;
    h.glmax = input.read_i32()?;
    h.glmin = input.read_i32()?;

    input.read_exact(&mut h.descrip)?;
    input.read_exact(&mut h.aux_file)?;
    h.qform_code = input.read_i16()?;
    h.sform_code = input.read_i16()?;
    h.quatern_b = input.read_f32()?;
    h.quatern_c = input.read_f32()?;
    h.quatern_d = input.read_f32()?;
    h.quatern_x = input.read_f32()?;
    h.quatern_y = input.read_f32()?;
    h.quatern_z = input.read_f32()?;
    for v in &mut h.srow_x {
        *v = input.read_f32()?;
    }
    for v in &mut h.srow_y {
        *v = input.read_f32()?;
    }
    for v in &mut h.srow_z {
        *v = input.read_f32()?;
    }
    input.read_exact(&mut h.intent_name)?;
    input.read_exact(&mut h.magic)?;

    Ok(h)
}
