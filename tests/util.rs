use std::io::Cursor;
use tiff::encoder::{colortype, TiffEncoder};
use tiff::tags::Tag;
use tiff2nii::{
    ConvertError, FileDirectory, ImageInfo, NiftiHeader, RasterData, RasterSlice, Result,
    TiffSource,
};

/// A TIFF source backed by slices held in memory.
#[allow(dead_code)]
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    pub images: Vec<ImageInfo>,
    pub rasters: Vec<RasterData>,
}

impl MemorySource {
    /// Append a slice.
    #[allow(dead_code)]
    pub fn push(&mut self, info: ImageInfo, raster: RasterData) {
        self.images.push(info);
        self.rasters.push(raster);
    }
}

impl TiffSource for MemorySource {
    fn image_count(&self) -> usize {
        self.images.len()
    }

    fn image(&self, index: usize) -> Option<&ImageInfo> {
        self.images.get(index)
    }

    fn read_raster(&mut self, index: usize) -> Result<RasterSlice> {
        let info = self
            .images
            .get(index)
            .ok_or(ConvertError::SliceIndexOutOfRange(index, self.images.len()))?;
        Ok(RasterSlice {
            width: info.width,
            height: info.height,
            samples_per_pixel: info.samples_per_pixel,
            data: self.rasters[index].clone(),
        })
    }
}

/// Geometry of an 8-bit grayscale slice.
#[allow(dead_code)]
pub fn gray8_info(width: u32, height: u32, directory: FileDirectory) -> ImageInfo {
    ImageInfo {
        width,
        height,
        samples_per_pixel: 1,
        bits_per_sample: vec![8],
        directory,
    }
}

/// A slice of `len` samples all set to `value`.
#[allow(dead_code)]
pub fn filled(len: usize, value: u8) -> RasterData {
    RasterData::U8(vec![value; len])
}

/// Encode 8-bit grayscale pages of the same size into a TIFF file. The
/// description, if any, is written to the first page only.
#[allow(dead_code)]
pub fn encode_gray8(width: u32, height: u32, pages: &[Vec<u8>], description: Option<&str>) -> Vec<u8> {
    let sizes: Vec<_> = pages.iter().map(|_| (width, height)).collect();
    encode_gray8_sized(&sizes, pages, description)
}

/// Encode 8-bit grayscale pages of any size into a TIFF file.
#[allow(dead_code)]
pub fn encode_gray8_sized(
    sizes: &[(u32, u32)],
    pages: &[Vec<u8>],
    description: Option<&str>,
) -> Vec<u8> {
    let mut buf = Vec::new();
    {
        let mut encoder = TiffEncoder::new(Cursor::new(&mut buf)).unwrap();
        for (i, (page, (width, height))) in pages.iter().zip(sizes).enumerate() {
            let mut image = encoder
                .new_image::<colortype::Gray8>(*width, *height)
                .unwrap();
            if let (0, Some(description)) = (i, description) {
                image
                    .encoder()
                    .write_tag(Tag::ImageDescription, description)
                    .unwrap();
            }
            image.write_data(page).unwrap();
        }
    }
    buf
}

/// Split a `.nii` buffer into its header and voxel bytes.
#[allow(dead_code)]
pub fn split_nifti(nifti: &[u8]) -> (NiftiHeader, &[u8]) {
    let header = NiftiHeader::from_reader(nifti).unwrap();
    (header, &nifti[352..])
}

/// A Zeiss LSM information block with the given X, Y, Z, C and T extents,
/// voxel size in meters and time interval. Other fields are zero.
#[allow(dead_code)]
pub fn lsm_info_block(dims: [u32; 5], voxel_size: [f64; 3], time_interval: f64) -> Vec<u8> {
    let mut block = vec![0u8; 224];
    block[..4].copy_from_slice(&[0x4C, 0x49, 0x00, 0x04]);
    block[4..8].copy_from_slice(&224u32.to_le_bytes());
    for (i, d) in dims.iter().enumerate() {
        block[8 + 4 * i..12 + 4 * i].copy_from_slice(&d.to_le_bytes());
    }
    for (i, v) in voxel_size.iter().enumerate() {
        block[40 + 8 * i..48 + 8 * i].copy_from_slice(&v.to_le_bytes());
    }
    block[112..120].copy_from_slice(&time_interval.to_le_bytes());
    block
}

/// Encode a little endian TIFF file of one 8-bit image whose samples are
/// stored in separate planes, one strip per plane.
#[allow(dead_code)]
pub fn encode_planar_u8(width: u32, height: u32, planes: &[Vec<u8>], photometric: u16) -> Vec<u8> {
    const SHORT: u16 = 3;
    const LONG: u16 = 4;
    const N_ENTRIES: usize = 10;

    let spp = planes.len();
    let le16 = |v: u16| v.to_le_bytes().to_vec();
    let le32 = |v: u32| v.to_le_bytes().to_vec();
    let bits: Vec<u8> = (0..spp).flat_map(|_| le16(8)).collect();

    // out of line values follow the directory, then the planes
    let data_start = 8 + 2 + 12 * N_ENTRIES + 4;
    let extra_len: usize = [bits.len(), 4 * spp, 4 * spp]
        .iter()
        .filter(|len| **len > 4)
        .sum();
    let plane_len = (width * height) as usize;
    let pixel_start = data_start + extra_len;
    let offsets: Vec<u8> = (0..spp)
        .flat_map(|i| le32((pixel_start + i * plane_len) as u32))
        .collect();
    let counts: Vec<u8> = (0..spp).flat_map(|_| le32(plane_len as u32)).collect();

    let entries: [(u16, u16, usize, Vec<u8>); N_ENTRIES] = [
        (256, LONG, 1, le32(width)),
        (257, LONG, 1, le32(height)),
        (258, SHORT, spp, bits),
        (259, SHORT, 1, le16(1)),
        (262, SHORT, 1, le16(photometric)),
        (273, LONG, spp, offsets),
        (277, SHORT, 1, le16(spp as u16)),
        (278, LONG, 1, le32(height)),
        (279, LONG, spp, counts),
        (284, SHORT, 1, le16(2)),
    ];

    let mut file = b"II*\0".to_vec();
    file.extend(le32(8));
    file.extend(le16(N_ENTRIES as u16));
    let mut extra = Vec::new();
    for (tag, field_type, count, value) in &entries {
        file.extend(le16(*tag));
        file.extend(le16(*field_type));
        file.extend(le32(*count as u32));
        if value.len() <= 4 {
            let mut inline = value.clone();
            inline.resize(4, 0);
            file.extend(inline);
        } else {
            file.extend(le32((data_start + extra.len()) as u32));
            extra.extend_from_slice(value);
        }
    }
    file.extend(le32(0));
    file.extend(extra);
    for plane in planes {
        file.extend_from_slice(plane);
    }
    file
}
