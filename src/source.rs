//! Access to the slices of a multi-page TIFF file.
//!
//! The converter does not decode TIFF structures by itself. Instead, it works
//! over a [`TiffSource`], which lists the image file directories (IFDs) of a
//! file and decodes the raster of each one on request. [`TiffReader`] is the
//! default implementation, backed by the `tiff` crate.
//!
//! [`TiffSource`]: ./trait.TiffSource.html
//! [`TiffReader`]: ./struct.TiffReader.html

use crate::error::{ConvertError, Result};
use crate::stack::StackConfig;
use crate::strip::StripLayout;
use crate::util::is_tiff;
use byteordered::Endianness;
use log::{debug, warn};
use std::convert::TryFrom;
use std::io::Cursor;
use tiff::decoder::ifd::Value;
use tiff::decoder::{Decoder, DecodingResult, Limits};
use tiff::tags::Tag;
use tiff::TiffResult;

/// Private tag holding the Zeiss `CZ_LSMINFO` structure.
pub const TAG_CZ_LSMINFO: u16 = 34412;

/// Interface to an already opened multi-page TIFF file.
pub trait TiffSource {
    /// Number of image file directories (2D slices) in the file.
    fn image_count(&self) -> usize;

    /// Geometry and metadata of the slice at `index`, if it exists.
    fn image(&self, index: usize) -> Option<&ImageInfo>;

    /// Decode the raster of the slice at `index`, samples interleaved.
    fn read_raster(&mut self, index: usize) -> Result<RasterSlice>;
}

/// Rational value of a TIFF tag.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rational {
    /// numerator
    pub num: u32,
    /// denominator
    pub den: u32,
}

impl Rational {
    /// The value as a floating point number, or `None` if the denominator is 0.
    pub fn to_f64(self) -> Option<f64> {
        if self.den == 0 {
            None
        } else {
            Some(f64::from(self.num) / f64::from(self.den))
        }
    }
}

/// The subset of a file directory's tags which is relevant to the
/// conversion. Every tag may be absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FileDirectory {
    image_description: Option<String>,
    sample_format: Option<u16>,
    resolution_unit: Option<u16>,
    x_resolution: Option<Rational>,
    y_resolution: Option<Rational>,
    lsm_info: Option<Vec<u8>>,
}

impl FileDirectory {
    /// The free text `ImageDescription` tag.
    pub fn image_description(&self) -> Option<&str> {
        self.image_description.as_deref()
    }

    /// First value of the `SampleFormat` tag (1 = uint, 2 = int, 3 = float).
    pub fn sample_format(&self) -> Option<u16> {
        self.sample_format
    }

    /// The `ResolutionUnit` tag (1 = none, 2 = inch, 3 = centimeter).
    pub fn resolution_unit(&self) -> Option<u16> {
        self.resolution_unit
    }

    /// The `XResolution` tag, in pixels per resolution unit.
    pub fn x_resolution(&self) -> Option<Rational> {
        self.x_resolution
    }

    /// The `YResolution` tag, in pixels per resolution unit.
    pub fn y_resolution(&self) -> Option<Rational> {
        self.y_resolution
    }

    /// Raw bytes of the Zeiss LSM private tag.
    pub fn lsm_info(&self) -> Option<&[u8]> {
        self.lsm_info.as_deref()
    }

    /// Whether this directory holds any microscopy metadata.
    pub fn has_metadata(&self) -> bool {
        self.image_description.is_some() || self.lsm_info.is_some()
    }

    /// Set the `ImageDescription` tag.
    pub fn with_image_description<S: Into<String>>(mut self, description: S) -> Self {
        self.image_description = Some(description.into());
        self
    }

    /// Set the `SampleFormat` tag.
    pub fn with_sample_format(mut self, sample_format: u16) -> Self {
        self.sample_format = Some(sample_format);
        self
    }

    /// Set the `ResolutionUnit` tag.
    pub fn with_resolution_unit(mut self, unit: u16) -> Self {
        self.resolution_unit = Some(unit);
        self
    }

    /// Set the `XResolution` and `YResolution` tags.
    pub fn with_resolution(mut self, x: Rational, y: Rational) -> Self {
        self.x_resolution = Some(x);
        self.y_resolution = Some(y);
        self
    }

    /// Set the raw LSM private tag.
    pub fn with_lsm_info(mut self, lsm_info: Vec<u8>) -> Self {
        self.lsm_info = Some(lsm_info);
        self
    }
}

/// Geometry and metadata of one 2D slice.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageInfo {
    /// width in pixels
    pub width: u32,
    /// height in pixels
    pub height: u32,
    /// number of samples (channels) per pixel
    pub samples_per_pixel: u16,
    /// bits of each sample
    pub bits_per_sample: Vec<u16>,
    /// tags of the slice's file directory
    pub directory: FileDirectory,
}

impl ImageInfo {
    /// Number of bytes in one pixel, each sample rounded up to whole bytes.
    pub fn bytes_per_pixel(&self) -> u32 {
        let per_sample = |bits: u16| (u32::from(bits) + 7) / 8;
        match self.bits_per_sample.len() {
            0 => 0,
            // a single value applies to every sample
            1 => per_sample(self.bits_per_sample[0]) * u32::from(self.samples_per_pixel),
            _ => self.bits_per_sample.iter().map(|b| per_sample(*b)).sum(),
        }
    }

    /// Bits of a whole pixel across all samples.
    pub fn bit_depth(&self) -> u32 {
        self.bytes_per_pixel() * 8
    }

    /// The stacking configuration of this slice.
    pub fn config(&self) -> StackConfig {
        StackConfig {
            width: self.width,
            height: self.height,
            samples_per_pixel: self.samples_per_pixel,
            bit_depth: self.bit_depth(),
        }
    }
}

/// Decoded samples of one slice, interleaved by sample.
#[derive(Debug, Clone, PartialEq)]
#[allow(missing_docs)]
pub enum RasterData {
    U8(Vec<u8>),
    I8(Vec<i8>),
    U16(Vec<u16>),
    I16(Vec<i16>),
    U32(Vec<u32>),
    I32(Vec<i32>),
    U64(Vec<u64>),
    I64(Vec<i64>),
    F32(Vec<f32>),
    F64(Vec<f64>),
}

impl RasterData {
    /// Number of samples held.
    pub fn len(&self) -> usize {
        match self {
            RasterData::U8(v) => v.len(),
            RasterData::I8(v) => v.len(),
            RasterData::U16(v) => v.len(),
            RasterData::I16(v) => v.len(),
            RasterData::U32(v) => v.len(),
            RasterData::I32(v) => v.len(),
            RasterData::U64(v) => v.len(),
            RasterData::I64(v) => v.len(),
            RasterData::F32(v) => v.len(),
            RasterData::F64(v) => v.len(),
        }
    }

    /// Whether no samples are held.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<DecodingResult> for RasterData {
    fn from(result: DecodingResult) -> Self {
        match result {
            DecodingResult::U8(v) => RasterData::U8(v),
            DecodingResult::I8(v) => RasterData::I8(v),
            DecodingResult::U16(v) => RasterData::U16(v),
            DecodingResult::I16(v) => RasterData::I16(v),
            DecodingResult::U32(v) => RasterData::U32(v),
            DecodingResult::I32(v) => RasterData::I32(v),
            DecodingResult::U64(v) => RasterData::U64(v),
            DecodingResult::I64(v) => RasterData::I64(v),
            DecodingResult::F32(v) => RasterData::F32(v),
            DecodingResult::F64(v) => RasterData::F64(v),
        }
    }
}

/// One decoded 2D plane.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterSlice {
    /// width in pixels
    pub width: u32,
    /// height in pixels
    pub height: u32,
    /// samples per pixel
    pub samples_per_pixel: u16,
    /// interleaved samples
    pub data: RasterData,
}

/// A [`TiffSource`] decoding an in-memory TIFF file with the `tiff` crate.
///
/// All file directories are scanned when the reader is created, rasters
/// are only decoded on request. Slices of two samples per pixel or with
/// separate sample planes are decoded from their strips directly.
///
/// [`TiffSource`]: ./trait.TiffSource.html
pub struct TiffReader<'a> {
    bytes: &'a [u8],
    byte_order: Endianness,
    decoder: Decoder<Cursor<&'a [u8]>>,
    images: Vec<ImageInfo>,
}

impl<'a> std::fmt::Debug for TiffReader<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TiffReader")
            .field("images", &self.images)
            .finish()
    }
}

impl<'a> TiffReader<'a> {
    /// Open a TIFF file held in memory and read all of its directories.
    ///
    /// # Errors
    ///
    /// - `ConvertError::UnsupportedInputType` if the buffer is not a TIFF file.
    /// - `ConvertError::Tiff` if the directories cannot be decoded.
    pub fn new(bytes: &'a [u8]) -> Result<Self> {
        if !is_tiff(bytes) {
            return Err(ConvertError::UnsupportedInputType);
        }
        let mut decoder = Decoder::new(Cursor::new(bytes))?.with_limits(Limits::unlimited());
        let mut images = vec![read_image_info(&mut decoder)?];
        while decoder.more_images() {
            decoder.next_image()?;
            images.push(read_image_info(&mut decoder)?);
        }
        let byte_order = if bytes.starts_with(b"II") {
            Endianness::Little
        } else {
            Endianness::Big
        };
        Ok(TiffReader {
            bytes,
            byte_order,
            decoder,
            images,
        })
    }
}

impl<'a> TiffSource for TiffReader<'a> {
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
        let (width, height, samples_per_pixel) = (info.width, info.height, info.samples_per_pixel);
        self.decoder.seek_to_image(index)?;
        let planar = self
            .decoder
            .find_tag_unsigned::<u16>(Tag::PlanarConfiguration)?
            .map_or(false, |v| v == 2);
        let data = if samples_per_pixel == 2 || (planar && samples_per_pixel > 1) {
            debug!("Decoding strips of slice {} (planar: {})", index, planar);
            read_strip_layout(&mut self.decoder, info, planar)?
                .decode(self.bytes, self.byte_order)?
        } else {
            self.decoder.read_image()?.into()
        };
        Ok(RasterSlice {
            width,
            height,
            samples_per_pixel,
            data,
        })
    }
}

/// Gather the strip tags of the current directory.
fn read_strip_layout<R>(
    decoder: &mut Decoder<R>,
    info: &ImageInfo,
    planar: bool,
) -> Result<StripLayout>
where
    R: std::io::Read + std::io::Seek,
{
    if decoder.find_tag(Tag::TileWidth)?.is_some() {
        return Err(ConvertError::InvalidStrips("tiled layout"));
    }
    let bits_per_sample = match info.bits_per_sample.split_first() {
        Some((first, rest)) if rest.iter().all(|b| b == first) => *first,
        _ => {
            return Err(ConvertError::UnsupportedPixelFormat(
                info.bit_depth(),
                info.samples_per_pixel,
            ))
        }
    };
    let offsets = decoder
        .find_tag_unsigned_vec::<u64>(Tag::StripOffsets)?
        .ok_or(ConvertError::InvalidStrips("missing strip offsets"))?;
    let byte_counts = decoder
        .find_tag_unsigned_vec::<u64>(Tag::StripByteCounts)?
        .ok_or(ConvertError::InvalidStrips("missing strip byte counts"))?;
    Ok(StripLayout {
        width: info.width,
        height: info.height,
        samples_per_pixel: info.samples_per_pixel,
        bits_per_sample,
        sample_format: info.directory.sample_format().unwrap_or(1),
        compression: decoder
            .find_tag_unsigned::<u16>(Tag::Compression)?
            .unwrap_or(1),
        predictor: decoder.find_tag_unsigned::<u16>(Tag::Predictor)?.unwrap_or(1),
        planar,
        rows_per_strip: decoder
            .find_tag_unsigned::<u32>(Tag::RowsPerStrip)?
            .unwrap_or(info.height),
        offsets,
        byte_counts,
    })
}

fn read_image_info<R>(decoder: &mut Decoder<R>) -> Result<ImageInfo>
where
    R: std::io::Read + std::io::Seek,
{
    let (width, height) = decoder.dimensions()?;
    let samples_per_pixel = decoder
        .find_tag_unsigned::<u16>(Tag::SamplesPerPixel)?
        .unwrap_or(1);
    let bits_per_sample = decoder
        .find_tag_unsigned_vec::<u16>(Tag::BitsPerSample)?
        .unwrap_or_else(|| vec![1]);
    let directory = read_directory(decoder);
    Ok(ImageInfo {
        width,
        height,
        samples_per_pixel,
        bits_per_sample,
        directory,
    })
}

/// Collect the tags of the current directory. A tag which cannot be decoded
/// is reported and treated as absent.
fn read_directory<R>(decoder: &mut Decoder<R>) -> FileDirectory
where
    R: std::io::Read + std::io::Seek,
{
    fn optional<T>(tag: Tag, value: TiffResult<Option<T>>) -> Option<T> {
        value.unwrap_or_else(|e| {
            warn!("Ignoring unreadable TIFF tag {:?}: {}", tag, e);
            None
        })
    }

    let image_description = optional(
        Tag::ImageDescription,
        decoder
            .find_tag(Tag::ImageDescription)
            .and_then(|v| v.map(|v| v.into_string()).transpose()),
    );
    let sample_format = optional(
        Tag::SampleFormat,
        decoder
            .find_tag_unsigned_vec::<u16>(Tag::SampleFormat)
            .map(|v| v.and_then(|v| v.first().copied())),
    );
    let resolution_unit = optional(
        Tag::ResolutionUnit,
        decoder.find_tag_unsigned::<u16>(Tag::ResolutionUnit),
    );
    let x_resolution = optional(Tag::XResolution, find_rational(decoder, Tag::XResolution));
    let y_resolution = optional(Tag::YResolution, find_rational(decoder, Tag::YResolution));
    let lsm_tag = Tag::Unknown(TAG_CZ_LSMINFO);
    let lsm_info = optional(
        lsm_tag,
        decoder.find_tag(lsm_tag).map(|v| v.and_then(into_bytes)),
    );

    FileDirectory {
        image_description,
        sample_format,
        resolution_unit,
        x_resolution,
        y_resolution,
        lsm_info,
    }
}

/// The bytes of a BYTE or UNDEFINED tag. The decoder widens BYTE values to
/// integers, so any unsigned value of at most 255 is accepted.
fn into_bytes(value: Value) -> Option<Vec<u8>> {
    fn byte(value: Value) -> Option<u8> {
        match value {
            Value::Byte(b) => Some(b),
            other => u8::try_from(other.into_u64().ok()?).ok(),
        }
    }

    match value {
        Value::List(values) => values.into_iter().map(byte).collect(),
        other => byte(other).map(|b| vec![b]),
    }
}

fn find_rational<R>(decoder: &mut Decoder<R>, tag: Tag) -> TiffResult<Option<Rational>>
where
    R: std::io::Read + std::io::Seek,
{
    Ok(match decoder.find_tag(tag)? {
        Some(Value::Rational(num, den)) => Some(Rational { num, den }),
        Some(Value::List(values)) => match values.first() {
            Some(Value::Rational(num, den)) => Some(Rational {
                num: *num,
                den: *den,
            }),
            _ => None,
        },
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::{into_bytes, FileDirectory, ImageInfo, Rational, TiffReader};
    use crate::error::ConvertError;
    use tiff::decoder::ifd::Value;

    fn info(samples_per_pixel: u16, bits_per_sample: Vec<u16>) -> ImageInfo {
        ImageInfo {
            width: 4,
            height: 2,
            samples_per_pixel,
            bits_per_sample,
            directory: FileDirectory::default(),
        }
    }

    #[test]
    fn bit_depth_sums_samples() {
        assert_eq!(info(1, vec![8]).bit_depth(), 8);
        assert_eq!(info(1, vec![12]).bit_depth(), 16);
        assert_eq!(info(3, vec![8, 8, 8]).bit_depth(), 24);
        assert_eq!(info(2, vec![8]).bit_depth(), 16);
        assert_eq!(info(4, vec![8, 8, 8, 8]).bit_depth(), 32);
    }

    #[test]
    fn rational_value() {
        assert_eq!(Rational { num: 3, den: 2 }.to_f64(), Some(1.5));
        assert_eq!(Rational { num: 3, den: 0 }.to_f64(), None);
    }

    #[test]
    fn directory_accessors() {
        let dir = FileDirectory::default();
        assert!(!dir.has_metadata());
        assert_eq!(dir.image_description(), None);
        let dir = dir.with_image_description("ImageJ=1.53t").with_sample_format(2);
        assert!(dir.has_metadata());
        assert_eq!(dir.image_description(), Some("ImageJ=1.53t"));
        assert_eq!(dir.sample_format(), Some(2));
        assert_eq!(dir.lsm_info(), None);
    }

    #[test]
    fn reject_non_tiff() {
        match TiffReader::new(b"GIF89a....") {
            Err(ConvertError::UnsupportedInputType) => {}
            other => panic!("unexpected result: {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn tag_bytes_of_any_width() {
        let widened = Value::List(vec![Value::UnsignedBig(0x4C), Value::UnsignedBig(0x49)]);
        assert_eq!(into_bytes(widened), Some(vec![0x4C, 0x49]));
        let undefined = Value::List(vec![Value::Byte(4), Value::Byte(0)]);
        assert_eq!(into_bytes(undefined), Some(vec![4, 0]));
        assert_eq!(into_bytes(Value::Unsigned(7)), Some(vec![7]));
        let too_wide = Value::List(vec![Value::Unsigned(1), Value::Unsigned(300)]);
        assert_eq!(into_bytes(too_wide), None);
        assert_eq!(into_bytes(Value::Ascii("LSM".to_string())), None);
    }
}
