//! This module defines the data element API, which describes how scalar
//! voxel values are produced from TIFF samples and written to a NIfTI file.
use crate::typedef::NiftiType;
use byteordered::{ByteOrdered, Endian};
use bytemuck::Pod;
use std::io::{Result as IoResult, Write};

/// Trait type for characterizing a scalar NIfTI data element, implemented
/// for the primitive numeric types which the converter writes.
pub trait DataElement: 'static + Sized + Copy + Default + Pod {
    /// The `datatype` mapped to the type T
    const DATA_TYPE: NiftiType;

    /// Write a single element with the given byte order.
    fn write_raw<W, E>(self, dst: &mut ByteOrdered<W, E>) -> IoResult<()>
    where
        W: Write,
        E: Endian;

    /// Write a sequence of elements in little endian. On little endian
    /// machines the memory of the slice is written as is.
    fn write_slice_le<W>(values: &[Self], mut dst: W) -> IoResult<()>
    where
        W: Write,
    {
        if cfg!(target_endian = "little") {
            dst.write_all(bytemuck::cast_slice(values))
        } else {
            let mut dst = ByteOrdered::le(dst);
            for v in values {
                v.write_raw(&mut dst)?;
            }
            Ok(())
        }
    }
}

impl DataElement for u8 {
    const DATA_TYPE: NiftiType = NiftiType::Uint8;
    fn write_raw<W, E>(self, dst: &mut ByteOrdered<W, E>) -> IoResult<()>
    where
        W: Write,
        E: Endian,
    {
        dst.write_u8(self)
    }
    fn write_slice_le<W>(values: &[Self], mut dst: W) -> IoResult<()>
    where
        W: Write,
    {
        dst.write_all(values)
    }
}
impl DataElement for i16 {
    const DATA_TYPE: NiftiType = NiftiType::Int16;
    fn write_raw<W, E>(self, dst: &mut ByteOrdered<W, E>) -> IoResult<()>
    where
        W: Write,
        E: Endian,
    {
        dst.write_i16(self)
    }
}
impl DataElement for u16 {
    const DATA_TYPE: NiftiType = NiftiType::Uint16;
    fn write_raw<W, E>(self, dst: &mut ByteOrdered<W, E>) -> IoResult<()>
    where
        W: Write,
        E: Endian,
    {
        dst.write_u16(self)
    }
}
impl DataElement for i32 {
    const DATA_TYPE: NiftiType = NiftiType::Int32;
    fn write_raw<W, E>(self, dst: &mut ByteOrdered<W, E>) -> IoResult<()>
    where
        W: Write,
        E: Endian,
    {
        dst.write_i32(self)
    }
}
impl DataElement for u32 {
    const DATA_TYPE: NiftiType = NiftiType::Uint32;
    fn write_raw<W, E>(self, dst: &mut ByteOrdered<W, E>) -> IoResult<()>
    where
        W: Write,
        E: Endian,
    {
        dst.write_u32(self)
    }
}
impl DataElement for f32 {
    const DATA_TYPE: NiftiType = NiftiType::Float32;
    fn write_raw<W, E>(self, dst: &mut ByteOrdered<W, E>) -> IoResult<()>
    where
        W: Write,
        E: Endian,
    {
        dst.write_f32(self)
    }
}
