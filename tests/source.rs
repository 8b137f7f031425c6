extern crate tiff2nii;
#[macro_use]
extern crate pretty_assertions;
#[macro_use]
extern crate approx;

mod util;

use tiff2nii::order::Diagnostic;
use tiff2nii::source::Rational;
use tiff2nii::{ConvertError, ConvertOptions, FileDirectory, ImageInfo, RasterData, Unit};
use util::{filled, gray8_info, lsm_info_block, split_nifti, MemorySource};

const OME_3Z_2T: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<OME xmlns="http://www.openmicroscopy.org/Schemas/OME/2016-06">
  <Image ID="Image:0">
    <Pixels ID="Pixels:0" DimensionOrder="XYTZC" Type="uint8"
            SizeX="2" SizeY="1" SizeZ="3" SizeT="2" SizeC="1"
            PhysicalSizeX="0.5" PhysicalSizeY="0.5" PhysicalSizeZ="4" PhysicalSizeXUnit="mm"
            TimeIncrement="0.5">
      <Plane TheZ="0" TheT="0" TheC="0"/>
      <Plane TheZ="0" TheT="1" TheC="0"/>
      <Plane TheZ="1" TheT="0" TheC="0"/>
      <Plane TheZ="1" TheT="1" TheC="0"/>
      <Plane TheZ="2" TheT="0" TheC="0"/>
      <Plane TheZ="2" TheT="1" TheC="0"/>
    </Pixels>
  </Image>
</OME>"#;

/// A source of `n` 2x1 grayscale slices, slice `i` filled with `i`, the
/// first one carrying the given directory.
fn stack(n: usize, directory: FileDirectory) -> MemorySource {
    let mut source = MemorySource::default();
    for i in 0..n {
        let dir = if i == 0 {
            directory.clone()
        } else {
            FileDirectory::default()
        };
        source.push(gray8_info(2, 1, dir), filled(2, i as u8));
    }
    source
}

fn frame_values(voxels: &[u8], plane_len: usize) -> Vec<u8> {
    voxels.chunks(plane_len).map(|frame| frame[0]).collect()
}

#[test]
fn lsm_stack_with_thumbnails() {
    let block = lsm_info_block([4, 4, 3, 1, 1], [2e-7, 3e-7, 1e-6], 0.);
    let mut source = MemorySource::default();
    for i in 0..3 {
        let dir = if i == 0 {
            FileDirectory::default().with_lsm_info(block.clone())
        } else {
            FileDirectory::default()
        };
        source.push(gray8_info(4, 4, dir), filled(16, i));
        source.push(gray8_info(2, 2, FileDirectory::default()), filled(4, 100 + i));
    }

    let full = ConvertOptions::new().convert_source(&mut source).unwrap();
    assert_eq!(full.stack_configs.len(), 2);
    let (header, voxels) = split_nifti(&full.nifti);
    assert_eq!(header.dim, [3, 4, 4, 3, 0, 0, 0, 0]);
    assert_relative_eq!(header.pixdim[1], 0.2, max_relative = 1e-6);
    assert_relative_eq!(header.pixdim[2], 0.3, max_relative = 1e-6);
    assert_relative_eq!(header.pixdim[3], 1.0, max_relative = 1e-6);
    assert_eq!(header.xyzt_to_space(), Some(Unit::Micron));
    assert_eq!(header.xyzt_to_time(), Some(Unit::Sec));
    assert_eq!(frame_values(voxels, 16), vec![0, 1, 2]);

    // thumbnails take their metadata from the first file directory and
    // scale the in-plane spacing by the reduction factor
    let thumbnails = ConvertOptions::new()
        .stack_group(1)
        .convert_source(&mut source)
        .unwrap();
    let (header, voxels) = split_nifti(&thumbnails.nifti);
    assert_eq!(header.dim, [3, 2, 2, 3, 0, 0, 0, 0]);
    assert_relative_eq!(header.pixdim[1], 0.4, max_relative = 1e-6);
    assert_relative_eq!(header.pixdim[2], 0.6, max_relative = 1e-6);
    assert_relative_eq!(header.pixdim[3], 1.0, max_relative = 1e-6);
    assert_eq!(frame_values(voxels, 4), vec![100, 101, 102]);
}

#[test]
fn lsm_time_series() {
    let block = lsm_info_block([2, 1, 2, 1, 3], [1e-6, 1e-6, 2e-6], 1.5);
    let mut source = stack(6, FileDirectory::default().with_lsm_info(block));

    let converted = ConvertOptions::new().convert_source(&mut source).unwrap();
    let (header, voxels) = split_nifti(&converted.nifti);
    assert_eq!(header.dim, [4, 2, 1, 2, 3, 0, 0, 0]);
    assert_relative_eq!(header.pixdim[4], 1.5);
    assert_eq!(header.xyzt_units, Unit::Micron as u8 | Unit::Sec as u8);
    assert_eq!(frame_values(voxels, 2), vec![0, 1, 2, 3, 4, 5]);
}

#[test]
fn ome_planes_are_reordered() {
    let mut source = stack(6, FileDirectory::default().with_image_description(OME_3Z_2T));

    let converted = ConvertOptions::new().convert_source(&mut source).unwrap();
    assert!(converted.diagnostics.is_empty());
    let (header, voxels) = split_nifti(&converted.nifti);
    assert_eq!(header.dim, [4, 2, 1, 3, 2, 0, 0, 0]);
    assert_eq!(header.pixdim, [1., 0.5, 0.5, 4., 0.5, 0., 0., 0.]);
    assert_eq!(header.xyzt_to_space(), Some(Unit::Mm));
    assert_eq!(header.xyzt_to_time(), Some(Unit::Sec));
    assert_eq!(frame_values(voxels, 2), vec![0, 2, 4, 1, 3, 5]);
}

#[test]
fn colliding_ome_planes_fall_back_to_file_order() {
    let xml = OME_3Z_2T.replace(r#"TheZ="1" TheT="1""#, r#"TheZ="0" TheT="0""#);
    let mut source = stack(6, FileDirectory::default().with_image_description(xml));

    let converted = ConvertOptions::new().convert_source(&mut source).unwrap();
    assert_eq!(
        converted.diagnostics,
        vec![Diagnostic::InvalidSliceOrder { n_frames: 6 }]
    );
    let (header, voxels) = split_nifti(&converted.nifti);
    assert_eq!(header.dim, [4, 2, 1, 3, 2, 0, 0, 0]);
    assert_eq!(frame_values(voxels, 2), vec![0, 1, 2, 3, 4, 5]);
}

#[test]
fn channels_split_over_groups_are_collapsed() {
    let description = "ImageJ=1.52p\nimages=6\nchannels=2\nslices=3\nunit=micron\n";
    let mut source = stack(3, FileDirectory::default().with_image_description(description));

    let converted = ConvertOptions::new().convert_source(&mut source).unwrap();
    assert_eq!(
        converted.diagnostics,
        vec![Diagnostic::ChannelsCollapsed {
            sizes: [3, 1, 2],
            n_frames: 3
        }]
    );
    let (header, voxels) = split_nifti(&converted.nifti);
    assert_eq!(header.dim, [3, 2, 1, 3, 0, 0, 0, 0]);
    assert_eq!(frame_values(voxels, 2), vec![0, 1, 2]);
}

#[test]
fn inconsistent_counts_become_a_plain_stack() {
    let description = "ImageJ=1.52p\nimages=5\nslices=5\n";
    let mut source = stack(3, FileDirectory::default().with_image_description(description));

    let converted = ConvertOptions::new().convert_source(&mut source).unwrap();
    assert_eq!(
        converted.diagnostics,
        vec![Diagnostic::InconsistentDimensions {
            sizes: [5, 1, 1],
            n_frames: 3
        }]
    );
    let (header, _) = split_nifti(&converted.nifti);
    assert_eq!(header.dim, [3, 2, 1, 3, 0, 0, 0, 0]);
}

#[test]
fn imagej_resolution_in_inches() {
    let directory = FileDirectory::default()
        .with_image_description("ImageJ=1.52p\nimages=2\nslices=2\nspacing=3\n")
        .with_resolution_unit(2)
        .with_resolution(Rational { num: 254, den: 100 }, Rational { num: 127, den: 100 });
    let mut source = stack(2, directory);

    let converted = ConvertOptions::new().convert_source(&mut source).unwrap();
    let (header, _) = split_nifti(&converted.nifti);
    assert_relative_eq!(header.pixdim[1], 1.0, max_relative = 1e-6);
    assert_relative_eq!(header.pixdim[2], 2.0, max_relative = 1e-6);
    assert_relative_eq!(header.pixdim[3], 3.0, max_relative = 1e-6);
}

#[test]
fn reordered_slices_of_other_shapes() {
    let xml = r#"<OME><Image><Pixels SizeZ="3" SizeT="1" SizeC="1">
        <Plane TheZ="2"/><Plane TheZ="1"/><Plane TheZ="0"/>
        </Pixels></Image></OME>"#;
    let mut source = MemorySource::default();
    source.push(
        gray8_info(2, 1, FileDirectory::default().with_image_description(xml)),
        filled(2, 0),
    );
    source.push(gray8_info(1, 1, FileDirectory::default()), filled(1, 1));
    source.push(gray8_info(2, 1, FileDirectory::default()), filled(2, 2));

    let result = ConvertOptions::new()
        .group_stacks(false)
        .convert_source(&mut source);
    match result {
        Err(ConvertError::DimensionMismatch(expected, found)) => {
            assert_eq!((expected.width, expected.height), (2, 1));
            assert_eq!((found.width, found.height), (1, 1));
        }
        other => panic!("unexpected result: {:?}", other.map(|c| c.diagnostics)),
    }
}

#[test]
fn unsupported_pixel_format() {
    let mut source = MemorySource::default();
    source.push(
        ImageInfo {
            width: 2,
            height: 1,
            samples_per_pixel: 1,
            bits_per_sample: vec![64],
            directory: FileDirectory::default().with_sample_format(3),
        },
        RasterData::F64(vec![0.; 2]),
    );

    match ConvertOptions::new().convert_source(&mut source) {
        Err(ConvertError::UnsupportedPixelFormat(64, 1)) => {}
        other => panic!("unexpected result: {:?}", other.map(|c| c.diagnostics)),
    }
}

#[test]
fn signed_and_float_samples() {
    let mut source = MemorySource::default();
    source.push(
        ImageInfo {
            width: 2,
            height: 1,
            samples_per_pixel: 1,
            bits_per_sample: vec![16],
            directory: FileDirectory::default().with_sample_format(2),
        },
        RasterData::I16(vec![-2, 3]),
    );
    let converted = ConvertOptions::new().convert_source(&mut source).unwrap();
    let (header, voxels) = split_nifti(&converted.nifti);
    assert_eq!(header.datatype, 4);
    assert_eq!(voxels, &[0xFE, 0xFF, 3, 0]);

    let mut source = MemorySource::default();
    source.push(
        ImageInfo {
            width: 1,
            height: 1,
            samples_per_pixel: 1,
            bits_per_sample: vec![32],
            directory: FileDirectory::default().with_sample_format(3),
        },
        RasterData::F32(vec![1.5]),
    );
    let converted = ConvertOptions::new().convert_source(&mut source).unwrap();
    let (header, voxels) = split_nifti(&converted.nifti);
    assert_eq!(header.datatype, 16);
    assert_eq!(voxels, &1.5f32.to_le_bytes()[..]);
}

#[test]
fn short_raster() {
    let mut source = MemorySource::default();
    source.push(gray8_info(2, 2, FileDirectory::default()), filled(3, 0));

    match ConvertOptions::new().convert_source(&mut source) {
        Err(ConvertError::InvalidRaster {
            slice: 0,
            expected: 4,
            found: 3,
        }) => {}
        other => panic!("unexpected result: {:?}", other.map(|c| c.diagnostics)),
    }
}

#[test]
fn volume_too_large_for_header() {
    let mut source = MemorySource::default();
    source.push(gray8_info(70000, 1, FileDirectory::default()), filled(70000, 1));

    match ConvertOptions::new().convert_source(&mut source) {
        Err(ConvertError::VolumeTooLarge(70000, 1, 1)) => {}
        other => panic!("unexpected result: {:?}", other.map(|c| c.diagnostics)),
    }
}

#[test]
fn empty_source() {
    let mut source = MemorySource::default();
    match ConvertOptions::new().convert_source(&mut source) {
        Err(ConvertError::NoSlices) => {}
        other => panic!("unexpected result: {:?}", other.map(|c| c.diagnostics)),
    }
}
