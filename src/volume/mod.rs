//! This module defines the voxel buffer of an output volume and its
//! assembly from decoded TIFF slices.
//!
//! Slices are copied one at a time at the position given by the slice
//! order, so only the output buffer and a single raster are held in memory.

pub mod element;

use self::element::DataElement;
use crate::error::{ConvertError, Result};
use crate::pixel::PixelType;
use crate::source::{RasterData, RasterSlice};
use crate::typedef::NiftiType;
use num_traits::AsPrimitive;
use rgb::{RGB8, RGBA8};
use std::io::{Result as IoResult, Write};

/// All voxels of a volume in canonical order, in the output data type.
#[derive(Debug, Clone, PartialEq)]
pub enum VoxelBuffer {
    /// `NIFTI_TYPE_UINT8`
    Uint8(Vec<u8>),
    /// `NIFTI_TYPE_INT16`
    Int16(Vec<i16>),
    /// `NIFTI_TYPE_UINT16`
    Uint16(Vec<u16>),
    /// `NIFTI_TYPE_INT32`
    Int32(Vec<i32>),
    /// `NIFTI_TYPE_UINT32`
    Uint32(Vec<u32>),
    /// `NIFTI_TYPE_FLOAT32`
    Float32(Vec<f32>),
    /// `NIFTI_TYPE_RGB24`
    Rgb24(Vec<RGB8>),
    /// `NIFTI_TYPE_RGBA32`
    Rgba32(Vec<RGBA8>),
}

impl VoxelBuffer {
    /// Create a zeroed buffer of `len` voxels of the given type.
    pub fn new(datatype: NiftiType, len: usize) -> Self {
        match datatype {
            NiftiType::Uint8 => VoxelBuffer::Uint8(vec![0; len]),
            NiftiType::Int16 => VoxelBuffer::Int16(vec![0; len]),
            NiftiType::Uint16 => VoxelBuffer::Uint16(vec![0; len]),
            NiftiType::Int32 => VoxelBuffer::Int32(vec![0; len]),
            NiftiType::Uint32 => VoxelBuffer::Uint32(vec![0; len]),
            NiftiType::Float32 => VoxelBuffer::Float32(vec![0.; len]),
            NiftiType::Rgb24 => VoxelBuffer::Rgb24(vec![RGB8::default(); len]),
            NiftiType::Rgba32 => VoxelBuffer::Rgba32(vec![RGBA8::default(); len]),
        }
    }

    /// The NIfTI data type of the voxels.
    pub fn data_type(&self) -> NiftiType {
        match self {
            VoxelBuffer::Uint8(_) => u8::DATA_TYPE,
            VoxelBuffer::Int16(_) => i16::DATA_TYPE,
            VoxelBuffer::Uint16(_) => u16::DATA_TYPE,
            VoxelBuffer::Int32(_) => i32::DATA_TYPE,
            VoxelBuffer::Uint32(_) => u32::DATA_TYPE,
            VoxelBuffer::Float32(_) => f32::DATA_TYPE,
            VoxelBuffer::Rgb24(_) => NiftiType::Rgb24,
            VoxelBuffer::Rgba32(_) => NiftiType::Rgba32,
        }
    }

    /// Number of voxels.
    pub fn len(&self) -> usize {
        match self {
            VoxelBuffer::Uint8(v) => v.len(),
            VoxelBuffer::Int16(v) => v.len(),
            VoxelBuffer::Uint16(v) => v.len(),
            VoxelBuffer::Int32(v) => v.len(),
            VoxelBuffer::Uint32(v) => v.len(),
            VoxelBuffer::Float32(v) => v.len(),
            VoxelBuffer::Rgb24(v) => v.len(),
            VoxelBuffer::Rgba32(v) => v.len(),
        }
    }

    /// Whether the buffer holds no voxels.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Size of the voxel data in bytes.
    pub fn byte_len(&self) -> usize {
        self.len() * self.data_type().size_of()
    }

    /// Write all voxels in little endian.
    pub fn write_to<W: Write>(&self, mut writer: W) -> IoResult<()> {
        match self {
            VoxelBuffer::Uint8(v) => u8::write_slice_le(v, writer),
            VoxelBuffer::Int16(v) => i16::write_slice_le(v, writer),
            VoxelBuffer::Uint16(v) => u16::write_slice_le(v, writer),
            VoxelBuffer::Int32(v) => i32::write_slice_le(v, writer),
            VoxelBuffer::Uint32(v) => u32::write_slice_le(v, writer),
            VoxelBuffer::Float32(v) => f32::write_slice_le(v, writer),
            VoxelBuffer::Rgb24(v) => {
                for p in v {
                    writer.write_all(&[p.r, p.g, p.b])?;
                }
                Ok(())
            }
            VoxelBuffer::Rgba32(v) => {
                for p in v {
                    writer.write_all(&[p.r, p.g, p.b, p.a])?;
                }
                Ok(())
            }
        }
    }

    /// The voxels as little endian bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.byte_len());
        // writing into a vector cannot fail
        let _ = self.write_to(&mut out);
        out
    }
}

/// Copy `src` into `dst`, converting each sample with a numeric cast.
fn cast_into<S, T>(src: &[S], dst: &mut [T])
where
    S: AsPrimitive<T>,
    T: 'static + Copy,
{
    for (d, s) in dst.iter_mut().zip(src) {
        *d = s.as_();
    }
}

macro_rules! cast_raster {
    ($raster: expr, $dst: expr) => {
        match $raster {
            RasterData::U8(v) => cast_into(v, $dst),
            RasterData::I8(v) => cast_into(v, $dst),
            RasterData::U16(v) => cast_into(v, $dst),
            RasterData::I16(v) => cast_into(v, $dst),
            RasterData::U32(v) => cast_into(v, $dst),
            RasterData::I32(v) => cast_into(v, $dst),
            RasterData::U64(v) => cast_into(v, $dst),
            RasterData::I64(v) => cast_into(v, $dst),
            RasterData::F32(v) => cast_into(v, $dst),
            RasterData::F64(v) => cast_into(v, $dst),
        }
    };
}

/// Collects decoded slices into a voxel buffer.
#[derive(Debug)]
pub struct VoxelAssembler {
    buffer: VoxelBuffer,
    pixel: PixelType,
    plane_len: usize,
    n_frames: usize,
}

impl VoxelAssembler {
    /// Prepare a zeroed volume of `n_frames` slices of `width` by `height`
    /// pixels.
    pub fn new(pixel: PixelType, width: u32, height: u32, n_frames: usize) -> Self {
        let plane_len = width as usize * height as usize;
        VoxelAssembler {
            buffer: VoxelBuffer::new(pixel.datatype, plane_len * n_frames),
            pixel,
            plane_len,
            n_frames,
        }
    }

    /// Copy the raster of source slice `slice` to canonical position
    /// `position`.
    ///
    /// # Errors
    ///
    /// - `ConvertError::SliceIndexOutOfRange` if `position` is not a frame
    ///   of the volume.
    /// - `ConvertError::InvalidRaster` if the raster does not hold one sample
    ///   per channel and pixel of a slice.
    pub fn insert(&mut self, slice: usize, position: usize, raster: &RasterSlice) -> Result<()> {
        if position >= self.n_frames {
            return Err(ConvertError::SliceIndexOutOfRange(position, self.n_frames));
        }
        let expected = self.plane_len * usize::from(self.pixel.channels);
        if raster.data.len() != expected {
            return Err(ConvertError::InvalidRaster {
                slice,
                expected,
                found: raster.data.len(),
            });
        }

        let range = position * self.plane_len..(position + 1) * self.plane_len;
        match &mut self.buffer {
            VoxelBuffer::Uint8(v) => cast_raster!(&raster.data, &mut v[range]),
            VoxelBuffer::Int16(v) => cast_raster!(&raster.data, &mut v[range]),
            VoxelBuffer::Uint16(v) => cast_raster!(&raster.data, &mut v[range]),
            VoxelBuffer::Int32(v) => cast_raster!(&raster.data, &mut v[range]),
            VoxelBuffer::Uint32(v) => cast_raster!(&raster.data, &mut v[range]),
            VoxelBuffer::Float32(v) => cast_raster!(&raster.data, &mut v[range]),
            VoxelBuffer::Rgb24(v) => {
                let samples = byte_samples(&raster.data);
                let dst = &mut v[range];
                if self.pixel.pad_rg {
                    for (p, rg) in dst.iter_mut().zip(samples.chunks_exact(2)) {
                        *p = RGB8::new(rg[0], rg[1], 0);
                    }
                } else {
                    for (p, rgb) in dst.iter_mut().zip(samples.chunks_exact(3)) {
                        *p = RGB8::new(rgb[0], rgb[1], rgb[2]);
                    }
                }
            }
            VoxelBuffer::Rgba32(v) => {
                let samples = byte_samples(&raster.data);
                for (p, rgba) in v[range].iter_mut().zip(samples.chunks_exact(4)) {
                    *p = RGBA8::new(rgba[0], rgba[1], rgba[2], rgba[3]);
                }
            }
        }
        Ok(())
    }

    /// Number of frames of the volume.
    pub fn n_frames(&self) -> usize {
        self.n_frames
    }

    /// Retrieve the assembled voxels.
    pub fn finish(self) -> VoxelBuffer {
        self.buffer
    }
}

fn byte_samples(raster: &RasterData) -> Vec<u8> {
    match raster {
        RasterData::U8(v) => v.clone(),
        other => {
            let mut out = vec![0u8; other.len()];
            cast_raster!(other, &mut out[..]);
            out
        }
    }
}
