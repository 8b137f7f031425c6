//! Microscopy metadata conventions describing how the slices of a TIFF file
//! map onto space, time and channels.
//!
//! Three independent grammars are supported: the Zeiss LSM binary block, the
//! ImageJ `key=value` description and OME-XML. [`MetadataSource::detect`]
//! picks the first one present in a file directory.
//!
//! [`MetadataSource::detect`]: ./enum.MetadataSource.html#method.detect
pub mod imagej;
pub mod lsm;
pub mod ome;

pub use self::imagej::ImageJDescription;
pub use self::lsm::LsmInfo;
pub use self::ome::{OmeMetadata, PlaneIndex};

use crate::source::FileDirectory;
use log::warn;

/// The metadata convention found in a file, with its parsed contents.
#[derive(Debug, Clone, PartialEq)]
pub enum MetadataSource {
    /// Zeiss LSM information block
    Lsm(LsmInfo),
    /// ImageJ image description
    ImageJ(ImageJDescription),
    /// OME-XML image description
    Ome(OmeMetadata),
    /// plain TIFF stack
    None,
}

impl MetadataSource {
    /// Detect and parse the metadata of a file directory. LSM takes
    /// precedence over ImageJ, which takes precedence over OME.
    ///
    /// Malformed metadata is reported and treated as absent.
    pub fn detect(directory: &FileDirectory) -> Self {
        if let Some(bytes) = directory.lsm_info().filter(|b| lsm::is_lsm_info(b)) {
            return match LsmInfo::from_bytes(bytes) {
                Ok(info) => MetadataSource::Lsm(info),
                Err(e) => {
                    warn!("{}, ignoring it", e);
                    MetadataSource::None
                }
            };
        }

        match directory.image_description() {
            Some(text) if imagej::is_imagej_description(text) => {
                MetadataSource::ImageJ(ImageJDescription::parse(text))
            }
            Some(text) if ome::is_ome_description(text) => match OmeMetadata::parse(text) {
                Ok(ome) => MetadataSource::Ome(ome),
                Err(e) => {
                    warn!("{}, ignoring it", e);
                    MetadataSource::None
                }
            },
            _ => MetadataSource::None,
        }
    }

    /// A short name of the convention, for logging.
    pub fn name(&self) -> &'static str {
        match self {
            MetadataSource::Lsm(_) => "LSM",
            MetadataSource::ImageJ(_) => "ImageJ",
            MetadataSource::Ome(_) => "OME",
            MetadataSource::None => "none",
        }
    }
}
