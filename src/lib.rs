//! Conversion of multi-page TIFF microscopy images into NIfTI-1 volumes.
//!
//! Plain TIFF stacks, Zeiss LSM files, ImageJ hyperstacks and OME-TIFF files
//! are supported. The Z, T and C extents and the voxel spacing are taken from
//! whichever metadata the file carries, the slices are reordered so that Z
//! varies fastest, then T, then C, and the result is a single `.nii` byte
//! buffer: a 348-byte header, a four byte extender and the voxels, all in
//! little endian.
//!
//! # Example
//!
//! ```no_run
//! use tiff2nii::convert_first_stack;
//! # use tiff2nii::Result;
//!
//! # fn run() -> Result<()> {
//! let tiff = std::fs::read("flybrain.tif")?;
//! let nifti = convert_first_stack(&tiff, true)?;
//! std::fs::write("flybrain.nii", nifti)?;
//! # Ok(())
//! # }
//! ```
//!
//! Files mixing slices of several shapes, such as full resolution images
//! and their thumbnails, hold one stack group per shape. See
//! [`convert_stack`] and [`ConvertOptions`] for converting the other groups.
//!
//! [`convert_stack`]: ./fn.convert_stack.html
//! [`ConvertOptions`]: ./struct.ConvertOptions.html
#![deny(missing_debug_implementations)]
#![warn(missing_docs, unused_extern_crates, trivial_casts, unused_results)]

#[macro_use]
extern crate quick_error;
#[macro_use]
extern crate num_derive;

pub mod affine;
pub mod convert;
pub mod dimension;
pub mod error;
pub mod header;
pub mod metadata;
pub mod order;
pub mod pixel;
pub mod source;
pub mod stack;
mod strip;
pub mod typedef;
mod util;
pub mod volume;

pub use crate::affine::Affine;
pub use crate::convert::{convert_first_stack, convert_stack, ConvertOptions, ConvertedStack};
pub use crate::dimension::DimensionSpec;
pub use crate::error::{ConvertError, Result};
pub use crate::header::NiftiHeader;
pub use crate::metadata::MetadataSource;
pub use crate::order::{Diagnostic, SliceOrder};
pub use crate::pixel::PixelType;
pub use crate::source::{FileDirectory, ImageInfo, RasterData, RasterSlice, TiffReader, TiffSource};
pub use crate::stack::StackConfig;
pub use crate::typedef::{NiftiType, Unit};
pub use crate::volume::VoxelBuffer;
