//! The Zeiss `CZ_LSMINFO` structure, stored in the private TIFF tag 34412 of
//! LSM files. All values are little endian. Sizes are in meters and times in
//! seconds.
use crate::error::{ConvertError, Result};
use crate::util::StructReader;

/// Leading bytes of a supported `CZ_LSMINFO` block.
pub const LSM_MAGIC: [u8; 4] = [0x4C, 0x49, 0x00, 0x04];
/// Size of the fixed layout part of the structure, in bytes.
pub const LSM_INFO_SIZE: usize = 224;

/// Whether the given private tag bytes hold an LSM information block.
pub fn is_lsm_info(bytes: &[u8]) -> bool {
    bytes.len() >= LSM_INFO_SIZE && bytes[..4] == LSM_MAGIC
}

/// The fixed layout part of the Zeiss LSM information block.
#[allow(missing_docs)]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LsmInfo {
    pub magic_number: u32,
    pub structure_size: u32,
    pub dimension_x: u32,
    pub dimension_y: u32,
    pub dimension_z: u32,
    pub dimension_channels: u32,
    pub dimension_time: u32,
    pub intensity_data_type: u32,
    pub thumbnail_x: u32,
    pub thumbnail_y: u32,
    pub voxel_size_x: f64,
    pub voxel_size_y: f64,
    pub voxel_size_z: f64,
    pub origin_x: f64,
    pub origin_y: f64,
    pub origin_z: f64,
    pub scan_type: u16,
    pub spectral_scan: u16,
    pub data_type: u32,
    pub offset_vector_overlay: u32,
    pub offset_input_lut: u32,
    pub offset_output_lut: u32,
    pub offset_channel_colors: u32,
    pub time_interval: f64,
    pub offset_channel_data_types: u32,
    pub offset_scan_information: u32,
    pub offset_ks_data: u32,
    pub offset_time_stamps: u32,
    pub offset_event_list: u32,
    pub offset_roi: u32,
    pub offset_bleach_roi: u32,
    pub offset_next_recording: u32,
    pub display_aspect_x: f64,
    pub display_aspect_y: f64,
    pub display_aspect_z: f64,
    pub display_aspect_time: f64,
    pub offset_mean_of_rois_overlay: u32,
    pub offset_topo_isoline_overlay: u32,
    pub offset_topo_profile_overlay: u32,
    pub offset_linescan_overlay: u32,
    pub toolbar_flags: u32,
    pub offset_channel_wavelength: u32,
    pub offset_channel_factors: u32,
    pub objective_sphere_correction: f64,
    pub offset_unmix_parameters: u32,
}

impl LsmInfo {
    /// Decode the structure from the raw bytes of the private tag.
    ///
    /// # Errors
    ///
    /// - `ConvertError::MalformedMetadata` if the block does not start with
    ///   the LSM magic number or is shorter than the fixed layout.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if !is_lsm_info(bytes) {
            return Err(ConvertError::MalformedMetadata("LSM"));
        }
        let mut r = StructReader::new(bytes);
        let info = Self::read_fields(&mut r).map_err(|_| ConvertError::MalformedMetadata("LSM"))?;
        debug_assert_eq!(r.position(), LSM_INFO_SIZE);
        Ok(info)
    }

    fn read_fields(r: &mut StructReader) -> std::io::Result<Self> {
        Ok(LsmInfo {
            magic_number: r.read_u32()?,
            structure_size: r.read_u32()?,
            dimension_x: r.read_u32()?,
            dimension_y: r.read_u32()?,
            dimension_z: r.read_u32()?,
            dimension_channels: r.read_u32()?,
            dimension_time: r.read_u32()?,
            intensity_data_type: r.read_u32()?,
            thumbnail_x: r.read_u32()?,
            thumbnail_y: r.read_u32()?,
            voxel_size_x: r.read_f64()?,
            voxel_size_y: r.read_f64()?,
            voxel_size_z: r.read_f64()?,
            origin_x: r.read_f64()?,
            origin_y: r.read_f64()?,
            origin_z: r.read_f64()?,
            scan_type: r.read_u16()?,
            spectral_scan: r.read_u16()?,
            data_type: r.read_u32()?,
            offset_vector_overlay: r.read_u32()?,
            offset_input_lut: r.read_u32()?,
            offset_output_lut: r.read_u32()?,
            offset_channel_colors: r.read_u32()?,
            time_interval: r.read_f64()?,
            offset_channel_data_types: r.read_u32()?,
            offset_scan_information: r.read_u32()?,
            offset_ks_data: r.read_u32()?,
            offset_time_stamps: r.read_u32()?,
            offset_event_list: r.read_u32()?,
            offset_roi: r.read_u32()?,
            offset_bleach_roi: r.read_u32()?,
            offset_next_recording: r.read_u32()?,
            display_aspect_x: r.read_f64()?,
            display_aspect_y: r.read_f64()?,
            display_aspect_z: r.read_f64()?,
            display_aspect_time: r.read_f64()?,
            offset_mean_of_rois_overlay: r.read_u32()?,
            offset_topo_isoline_overlay: r.read_u32()?,
            offset_topo_profile_overlay: r.read_u32()?,
            offset_linescan_overlay: r.read_u32()?,
            toolbar_flags: r.read_u32()?,
            offset_channel_wavelength: r.read_u32()?,
            offset_channel_factors: r.read_u32()?,
            objective_sphere_correction: r.read_f64()?,
            offset_unmix_parameters: r.read_u32()?,
        })
    }
}

/// Test helper: encode the leading fields of an LSM block.
#[cfg(test)]
pub(crate) fn encode_lsm_info(
    dims: [u32; 5],
    voxel_size: [f64; 3],
    time_interval: f64,
) -> Vec<u8> {
    let mut out = Vec::with_capacity(LSM_INFO_SIZE);
    out.extend_from_slice(&LSM_MAGIC);
    out.extend_from_slice(&(LSM_INFO_SIZE as u32).to_le_bytes());
    for d in &dims {
        out.extend_from_slice(&d.to_le_bytes());
    }
    // intensity data type, thumbnail x/y
    out.extend_from_slice(&[0; 12]);
    for v in &voxel_size {
        out.extend_from_slice(&v.to_le_bytes());
    }
    // origin, scan type, spectral scan, data type, 4 offsets
    out.extend_from_slice(&[0; 24 + 4 + 4 + 16]);
    out.extend_from_slice(&time_interval.to_le_bytes());
    out.resize(LSM_INFO_SIZE, 0);
    out
}
