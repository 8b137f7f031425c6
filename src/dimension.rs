//! Resolution of the Z, T and C extents of a stack and of its physical
//! voxel spacing, from whichever metadata convention the file follows.
use crate::error::{ConvertError, Result};
use crate::metadata::{ImageJDescription, LsmInfo, MetadataSource, OmeMetadata};
use crate::order::SliceLayout;
use crate::source::{FileDirectory, Rational};
use crate::typedef::Unit;

/// `ResolutionUnit` value for inches.
const RESOLUTION_UNIT_INCH: u16 = 2;
const CM_PER_INCH: f64 = 2.54;
/// Largest extent of a NIfTI-1 axis, `dim` being a signed short.
pub const MAX_EXTENT: usize = i16::MAX as usize;

/// The resolved extents, spacing and units of a stack.
#[derive(Debug, Clone, PartialEq)]
pub struct DimensionSpec {
    /// number of Z slices
    pub size_z: usize,
    /// number of time points
    pub size_t: usize,
    /// number of channels
    pub size_c: usize,
    /// voxel spacing along X, Y and Z
    pub spacing: [f32; 3],
    /// time between consecutive time points
    pub time_interval: f32,
    /// unit of `spacing`
    pub length_unit: Unit,
    /// unit of `time_interval`
    pub time_unit: Unit,
}

impl Default for DimensionSpec {
    fn default() -> DimensionSpec {
        DimensionSpec {
            size_z: 1,
            size_t: 1,
            size_c: 1,
            spacing: [1.; 3],
            time_interval: 1.,
            length_unit: Unit::Unknown,
            time_unit: Unit::Unknown,
        }
    }
}

impl DimensionSpec {
    /// Resolve the dimensions described by the given metadata. `directory`
    /// provides the resolution tags and `width`/`height` the observed size
    /// of the selected slices. This never fails: without usable metadata,
    /// every extent is 1 and slices are taken in file order.
    pub fn resolve(
        source: &MetadataSource,
        directory: &FileDirectory,
        width: u32,
        height: u32,
    ) -> (DimensionSpec, SliceLayout) {
        match source {
            MetadataSource::Lsm(info) => (Self::from_lsm(info, width, height), SliceLayout::Sequential),
            MetadataSource::ImageJ(desc) => (
                Self::from_imagej(desc, directory),
                SliceLayout::Hyperstack {
                    key_positions: desc.key_positions,
                },
            ),
            MetadataSource::Ome(ome) => {
                let layout = if ome.planes.is_empty() {
                    SliceLayout::Sequential
                } else {
                    SliceLayout::Planes(ome.planes.clone())
                };
                (Self::from_ome(ome), layout)
            }
            MetadataSource::None => (DimensionSpec::default(), SliceLayout::Sequential),
        }
    }

    /// Dimensions of a Zeiss LSM stack. The in-plane spacing is scaled by
    /// the ratio between the acquired and the observed size, so that
    /// thumbnails get a proportionally larger spacing.
    pub fn from_lsm(info: &LsmInfo, width: u32, height: u32) -> DimensionSpec {
        let at_least_one = |v: u32| if v == 0 { 1 } else { v as usize };
        let scale_x = f64::from(info.dimension_x) / f64::from(width.max(1));
        let scale_y = f64::from(info.dimension_y) / f64::from(height.max(1));
        DimensionSpec {
            size_z: at_least_one(info.dimension_z),
            size_t: at_least_one(info.dimension_time),
            size_c: at_least_one(info.dimension_channels),
            spacing: [
                (scale_x * info.voxel_size_x * 1e6) as f32,
                (scale_y * info.voxel_size_y * 1e6) as f32,
                (info.voxel_size_z * 1e6) as f32,
            ],
            time_interval: info.time_interval as f32,
            length_unit: Unit::Micron,
            // Zeiss does not state the unit of TimeInterval
            time_unit: Unit::Sec,
        }
    }

    /// Dimensions of an ImageJ stack.
    pub fn from_imagej(desc: &ImageJDescription, directory: &FileDirectory) -> DimensionSpec {
        // ImageJ writes pixels per unit, where unit 1 (none) means centimeters
        let scale = if directory.resolution_unit() == Some(RESOLUTION_UNIT_INCH) {
            CM_PER_INCH
        } else {
            1.
        };
        let in_plane = |resolution: Option<Rational>| {
            resolution
                .and_then(Rational::to_f64)
                .filter(|r| *r > 0.)
                .map_or(desc.spacing, |r| scale / r)
        };

        let (time_interval, time_unit) = match desc.frame_interval {
            Some(dt) => (dt as f32, Unit::Sec),
            None => (1., Unit::Unknown),
        };
        DimensionSpec {
            size_z: desc.slices.max(1),
            size_t: desc.frames.max(1),
            size_c: desc.channels.max(1),
            spacing: [
                in_plane(directory.x_resolution()) as f32,
                in_plane(directory.y_resolution()) as f32,
                desc.spacing as f32,
            ],
            time_interval,
            length_unit: if desc.is_micrometer() {
                Unit::Micron
            } else {
                Unit::Unknown
            },
            time_unit,
        }
    }

    /// Dimensions of an OME-TIFF image.
    pub fn from_ome(ome: &OmeMetadata) -> DimensionSpec {
        let (time_interval, time_unit) = match ome.time_increment {
            Some((dt, unit)) => (dt as f32, unit),
            None => (1., Unit::Unknown),
        };
        DimensionSpec {
            size_z: ome.size_z,
            size_t: ome.size_t,
            size_c: ome.size_c,
            spacing: [
                ome.physical_size[0] as f32,
                ome.physical_size[1] as f32,
                ome.physical_size[2] as f32,
            ],
            time_interval,
            length_unit: ome.length_unit.unwrap_or(Unit::Unknown),
            time_unit,
        }
    }

    /// The number of slices these extents account for.
    pub fn slice_count(&self) -> usize {
        self.size_z
            .saturating_mul(self.size_t)
            .saturating_mul(self.size_c)
    }

    /// The combined `xyzt_units` code.
    pub fn xyzt_units(&self) -> u8 {
        self.length_unit as u8 | self.time_unit as u8
    }

    /// The `pixdim` field of the header.
    pub fn pixdim(&self) -> [f32; 8] {
        let [dx, dy, dz] = self.spacing;
        [1., dx, dy, dz, self.time_interval, 0., 0., 0.]
    }

    /// The `dim` field of a volume of `n_frames` slices of the given size.
    /// Time and channel axes are only laid out when these extents account
    /// for every slice.
    ///
    /// # Errors
    ///
    /// - `ConvertError::VolumeTooLarge` if the width, the height or the
    ///   number of slices exceeds 32767.
    pub fn dims(&self, width: u32, height: u32, n_frames: usize) -> Result<[u16; 8]> {
        let extent = |v: usize| {
            if v <= MAX_EXTENT {
                Ok(v as u16)
            } else {
                Err(ConvertError::VolumeTooLarge(width, height, n_frames))
            }
        };
        let mut dim = [
            3,
            extent(width as usize)?,
            extent(height as usize)?,
            extent(n_frames)?,
            0,
            0,
            0,
            0,
        ];
        // each extent divides n_frames, so none of them overflows
        if self.slice_count() == n_frames && n_frames > 1 && self.size_t * self.size_c > 1 {
            dim[0] = 4;
            dim[3] = self.size_z as u16;
            dim[4] = self.size_t as u16;
            if self.size_c > 1 {
                dim[0] = 5;
                dim[5] = self.size_c as u16;
            }
        }
        Ok(dim)
    }
}

#[cfg(test)]
mod tests {
    use super::DimensionSpec;
    use crate::error::ConvertError;
    use crate::metadata::lsm::encode_lsm_info;
    use crate::metadata::{ImageJDescription, LsmInfo, MetadataSource, OmeMetadata, PlaneIndex};
    use crate::order::SliceLayout;
    use crate::source::{FileDirectory, Rational};
    use crate::typedef::Unit;
    use approx::assert_abs_diff_eq;

    #[test]
    fn lsm_thumbnail_spacing() {
        let bytes = encode_lsm_info([512, 512, 20, 2, 1], [2e-7, 2e-7, 1e-6], 0.5);
        let info = LsmInfo::from_bytes(&bytes).unwrap();
        let spec = DimensionSpec::from_lsm(&info, 128, 256);
        assert_abs_diff_eq!(spec.spacing[0], 0.8, epsilon = 1e-6);
        assert_abs_diff_eq!(spec.spacing[1], 0.4, epsilon = 1e-6);
        assert_abs_diff_eq!(spec.spacing[2], 1.0, epsilon = 1e-6);
        assert_eq!((spec.size_z, spec.size_t, spec.size_c), (20, 1, 2));
        assert_eq!(spec.time_interval, 0.5);
        assert_eq!(spec.xyzt_units(), 11);
    }

    #[test]
    fn lsm_zero_sizes_count_as_one() {
        let bytes = encode_lsm_info([64, 64, 0, 0, 0], [1e-6; 3], 0.);
        let info = LsmInfo::from_bytes(&bytes).unwrap();
        let spec = DimensionSpec::from_lsm(&info, 64, 64);
        assert_eq!(spec.slice_count(), 1);
    }

    #[test]
    fn imagej_resolution_tags() {
        let desc = ImageJDescription::parse("ImageJ=1.53t\nslices=4\nunit=micron\nspacing=2.0\n");
        let directory = FileDirectory::default()
            .with_resolution_unit(1)
            .with_resolution(Rational { num: 2, den: 1 }, Rational { num: 4, den: 1 });
        let spec = DimensionSpec::from_imagej(&desc, &directory);
        assert_eq!(spec.spacing, [0.5, 0.25, 2.0]);
        assert_eq!(spec.length_unit, Unit::Micron);
        assert_eq!(spec.time_unit, Unit::Unknown);
        assert_eq!(spec.xyzt_units(), 3);

        let inch = FileDirectory::default()
            .with_resolution_unit(2)
            .with_resolution(Rational { num: 254, den: 100 }, Rational { num: 0, den: 0 });
        let spec = DimensionSpec::from_imagej(&desc, &inch);
        assert_abs_diff_eq!(spec.spacing[0], 1.0, epsilon = 1e-6);
        // unusable resolution falls back to the spacing
        assert_eq!(spec.spacing[1], 2.0);
    }

    #[test]
    fn imagej_without_resolution() {
        let desc = ImageJDescription::parse("ImageJ=1.53t\nframes=3\nfinterval=0.25\nspacing=1.5\n");
        let spec = DimensionSpec::from_imagej(&desc, &FileDirectory::default());
        assert_eq!(spec.spacing, [1.5; 3]);
        assert_eq!(spec.size_t, 3);
        assert_eq!(spec.time_interval, 0.25);
        assert_eq!(spec.time_unit, Unit::Sec);
        assert_eq!(spec.xyzt_units(), 8);
    }

    #[test]
    fn ome_planes_become_layout() {
        let ome = OmeMetadata {
            size_z: 2,
            size_t: 1,
            size_c: 1,
            physical_size: [0.5, 0.5, 3.0],
            length_unit: Some(Unit::Mm),
            time_increment: None,
            planes: vec![PlaneIndex { z: 1, t: 0, c: 0 }, PlaneIndex::default()],
        };
        let (spec, layout) = DimensionSpec::resolve(
            &MetadataSource::Ome(ome.clone()),
            &FileDirectory::default(),
            8,
            8,
        );
        assert_eq!(spec.spacing, [0.5, 0.5, 3.0]);
        assert_eq!(spec.xyzt_units(), 2);
        assert_eq!(layout, SliceLayout::Planes(ome.planes));
    }

    #[test]
    fn no_metadata() {
        let (spec, layout) =
            DimensionSpec::resolve(&MetadataSource::None, &FileDirectory::default(), 8, 8);
        assert_eq!(spec, DimensionSpec::default());
        assert_eq!(layout, SliceLayout::Sequential);
        assert_eq!(spec.pixdim(), [1., 1., 1., 1., 1., 0., 0., 0.]);
    }

    #[test]
    fn dims_by_extents() {
        let spec = DimensionSpec {
            size_z: 3,
            size_t: 2,
            size_c: 2,
            ..Default::default()
        };
        assert_eq!(spec.dims(16, 8, 12).unwrap(), [5, 16, 8, 3, 2, 2, 0, 0]);
        assert_eq!(spec.dims(16, 8, 7).unwrap(), [3, 16, 8, 7, 0, 0, 0, 0]);
        let spec = DimensionSpec {
            size_z: 3,
            size_t: 2,
            ..Default::default()
        };
        assert_eq!(spec.dims(16, 8, 6).unwrap(), [4, 16, 8, 3, 2, 0, 0, 0]);
        let spec = DimensionSpec {
            size_z: 6,
            ..Default::default()
        };
        assert_eq!(spec.dims(16, 8, 6).unwrap(), [3, 16, 8, 6, 0, 0, 0, 0]);
    }

    #[test]
    fn extents_beyond_nifti_range() {
        let spec = DimensionSpec::default();
        assert_eq!(spec.dims(32767, 1, 1).unwrap(), [3, 32767, 1, 1, 0, 0, 0, 0]);
        for &(width, height, n_frames) in &[(70000, 1, 1), (4, 32768, 1), (4, 4, 40000)] {
            match spec.dims(width, height, n_frames) {
                Err(ConvertError::VolumeTooLarge(w, h, n)) => {
                    assert_eq!((w, h, n), (width, height, n_frames));
                }
                other => panic!("unexpected result: {:?}", other),
            }
        }
    }
}
