//! Conversion of a multi-page TIFF file into a single file NIfTI-1 volume.
//!
//! The slices of one stack group are resolved against the file's metadata,
//! mapped onto the canonical Z, T, C order, and copied into a voxel buffer
//! which follows the header in the output.
//!
//! # Examples
//!
//! ```no_run
//! use tiff2nii::ConvertOptions;
//! # use tiff2nii::Result;
//!
//! # fn run() -> Result<()> {
//! let bytes = std::fs::read("stack.lsm")?;
//! let converted = ConvertOptions::new().stack_group(1).convert(&bytes)?;
//! println!("{} stack groups", converted.stack_configs.len());
//! std::fs::write("stack_thumbnails.nii", &converted.nifti)?;
//! # Ok(())
//! # }
//! ```
use crate::affine::Affine;
use crate::dimension::DimensionSpec;
use crate::error::{ConvertError, Result};
use crate::header::NiftiHeader;
use crate::metadata::MetadataSource;
use crate::order::{Diagnostic, SliceMapping};
use crate::pixel::PixelType;
use crate::source::{TiffReader, TiffSource};
use crate::stack::{StackConfig, StackGroups};
use crate::volume::VoxelAssembler;
use log::{log, warn, Level};
use std::fs;
use std::path::Path;

/// The output of converting one stack group.
#[derive(Debug, Clone, PartialEq)]
pub struct ConvertedStack {
    /// header, extender and voxels, ready to be written to a `.nii` file
    pub nifti: Vec<u8>,
    /// every distinct slice configuration of the file, in order of first
    /// appearance; the index of a configuration is its stack group
    pub stack_configs: Vec<StackConfig>,
    /// inconsistencies in the file which were worked around
    pub diagnostics: Vec<Diagnostic>,
}

/// Options of a conversion.
#[derive(Debug, Clone, PartialEq)]
pub struct ConvertOptions {
    verbose: bool,
    stack_group: usize,
    group_stacks: bool,
    description: Option<String>,
    aux_file: Option<String>,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        ConvertOptions {
            verbose: false,
            stack_group: 0,
            group_stacks: true,
            description: None,
            aux_file: None,
        }
    }
}

impl ConvertOptions {
    /// Default options: quiet, first stack group.
    pub fn new() -> Self {
        Self::default()
    }

    /// Log progress at the `info` level instead of `debug`.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// The stack group to convert. Out of range groups fall back to 0.
    pub fn stack_group(mut self, group: usize) -> Self {
        self.stack_group = group;
        self
    }

    /// Whether to split the slices into stack groups. When disabled, every
    /// slice is considered and those not shaped like the first one are left
    /// out.
    pub fn group_stacks(mut self, group_stacks: bool) -> Self {
        self.group_stacks = group_stacks;
        self
    }

    /// Text for the `descrip` header field.
    pub fn description<S: Into<String>>(mut self, description: S) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Text for the `aux_file` header field.
    pub fn aux_file<S: Into<String>>(mut self, aux_file: S) -> Self {
        self.aux_file = Some(aux_file.into());
        self
    }

    /// Convert a TIFF file held in memory.
    ///
    /// # Errors
    ///
    /// - `ConvertError::UnsupportedInputType` if the bytes are not a TIFF
    ///   file.
    /// - `ConvertError::Tiff` if the file cannot be decoded.
    /// - any error of [`convert_source`](#method.convert_source).
    pub fn convert(&self, bytes: &[u8]) -> Result<ConvertedStack> {
        let mut reader = TiffReader::new(bytes)?;
        self.convert_source(&mut reader)
    }

    /// Convert the file behind a TIFF source.
    ///
    /// # Errors
    ///
    /// - `ConvertError::NoSlices` if the file holds no image.
    /// - `ConvertError::UnsupportedPixelFormat` if NIfTI-1 cannot represent
    ///   the pixels of the stack.
    /// - `ConvertError::VolumeTooLarge` if an extent of the volume exceeds
    ///   what a NIfTI-1 header can hold.
    /// - `ConvertError::DimensionMismatch` if slices of different shapes are
    ///   stacked while their order is not sequential.
    /// - `ConvertError::InvalidRaster` if a decoded slice does not have the
    ///   announced size.
    pub fn convert_source<S: TiffSource>(&self, source: &mut S) -> Result<ConvertedStack> {
        let level = if self.verbose { Level::Info } else { Level::Debug };

        let n_images = source.image_count();
        let configs = (0..n_images)
            .map(|i| source.image(i).map(|info| info.config()))
            .collect::<Option<Vec<_>>>()
            .ok_or(ConvertError::NoSlices)?;
        let groups = StackGroups::new(configs.iter().copied());
        if groups.is_empty() {
            return Err(ConvertError::NoSlices);
        }

        let selection = if self.group_stacks && groups.len() > 1 {
            let selection = groups.select(self.stack_group);
            log!(
                level,
                "{} of {} slices match dimensions of stack group {}",
                selection.slices.len(),
                n_images,
                selection.group
            );
            selection
        } else {
            groups.select_all()
        };
        let slices = selection.slices;
        let first = slices[0];
        let first_info = source.image(first).ok_or(ConvertError::NoSlices)?;
        let config = first_info.config();
        let sample_format = first_info.directory.sample_format();

        // writers of multi-page metadata only fill the first directory
        let directory = if first_info.directory.has_metadata() {
            first_info.directory.clone()
        } else {
            source
                .image(0)
                .ok_or(ConvertError::NoSlices)?
                .directory
                .clone()
        };
        let metadata = MetadataSource::detect(&directory);
        log!(level, "Metadata convention: {}", metadata.name());

        let (spec, layout) =
            DimensionSpec::resolve(&metadata, &directory, config.width, config.height);
        let mut mapping = SliceMapping::new(spec, &layout, slices.len());

        let keep: Vec<bool> = slices.iter().map(|i| configs[*i] == config).collect();
        if keep.iter().any(|k| !k) {
            if !mapping.exclude_slices(&keep) {
                let found = slices
                    .iter()
                    .map(|i| configs[*i])
                    .find(|c| *c != config)
                    .unwrap_or(config);
                return Err(ConvertError::DimensionMismatch(config, found));
            }
        }
        for d in &mapping.diagnostics {
            warn!("{}", d);
        }

        let pixel = PixelType::select(config.bit_depth, config.samples_per_pixel, sample_format)?;
        let n_frames = mapping.order.n_frames();
        let dim = mapping.spec.dims(config.width, config.height, n_frames)?;
        let [dx, dy, dz] = mapping.spec.spacing;
        log!(
            level,
            "NIfTI dimensions: {}, bit-depth: {}, channels: {}, pixdim: {}\u{d7}{}\u{d7}{} unit: {}",
            dim[1..]
                .iter()
                .map(|d| d.to_string())
                .collect::<Vec<_>>()
                .join("\u{d7}"),
            config.bit_depth,
            config.samples_per_pixel,
            dx,
            dy,
            dz,
            mapping.spec.xyzt_units()
        );

        let mut assembler = VoxelAssembler::new(pixel, config.width, config.height, n_frames);
        for (slice, position) in slices.iter().zip(mapping.order.positions()) {
            if let Some(position) = position {
                let raster = source.read_raster(*slice)?;
                assembler.insert(*slice, *position, &raster)?;
            }
        }
        let voxels = assembler.finish();

        let affine = Affine::centered(mapping.spec.spacing, [dim[1], dim[2], dim[3]]);
        let mut header = NiftiHeader::for_volume(dim, &pixel, &mapping.spec, &affine);
        if let Some(description) = &self.description {
            header.set_description(description);
        }
        if let Some(aux_file) = &self.aux_file {
            header.set_aux_file(aux_file);
        }

        let mut nifti = Vec::with_capacity(352 + voxels.byte_len());
        header.write_to(&mut nifti)?;
        voxels.write_to(&mut nifti)?;

        Ok(ConvertedStack {
            nifti,
            stack_configs: groups.configs().to_vec(),
            diagnostics: mapping.diagnostics,
        })
    }

    /// Convert the TIFF file at `input` and write the volume to `output`.
    ///
    /// # Errors
    ///
    /// - `ConvertError::Io` if either file cannot be accessed.
    /// - any error of [`convert`](#method.convert).
    pub fn convert_file<P, Q>(&self, input: P, output: Q) -> Result<ConvertedStack>
    where
        P: AsRef<Path>,
        Q: AsRef<Path>,
    {
        let bytes = fs::read(input)?;
        let converted = self.convert(&bytes)?;
        fs::write(output, &converted.nifti)?;
        Ok(converted)
    }
}

/// Convert the first stack group of a TIFF file into a NIfTI-1 volume.
pub fn convert_first_stack(bytes: &[u8], verbose: bool) -> Result<Vec<u8>> {
    ConvertOptions::new()
        .verbose(verbose)
        .convert(bytes)
        .map(|converted| converted.nifti)
}

/// Convert one stack group of a TIFF file into a NIfTI-1 volume, also
/// listing the stack groups available in the file.
pub fn convert_stack(bytes: &[u8], verbose: bool, group: usize) -> Result<ConvertedStack> {
    ConvertOptions::new()
        .verbose(verbose)
        .stack_group(group)
        .convert(bytes)
}
