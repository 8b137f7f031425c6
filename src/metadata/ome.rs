//! OME-XML metadata embedded in the `ImageDescription` tag of OME-TIFF files.
use crate::error::{ConvertError, Result};
use crate::typedef::Unit;
use roxmltree::{Document, Node};

/// Substring identifying an OME-XML description.
pub const OME_MARKER: &str = "<OME";

/// Whether the description holds OME-XML.
pub fn is_ome_description(description: &str) -> bool {
    description.contains(OME_MARKER)
}

/// Position of one TIFF plane in the (Z, T, C) grid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlaneIndex {
    /// Z slice
    pub z: usize,
    /// time point
    pub t: usize,
    /// channel
    pub c: usize,
}

/// Dimensions, spacing and plane positions of an OME image.
#[derive(Debug, Clone, PartialEq)]
pub struct OmeMetadata {
    /// SizeZ
    pub size_z: usize,
    /// SizeT
    pub size_t: usize,
    /// SizeC
    pub size_c: usize,
    /// PhysicalSizeX, PhysicalSizeY, PhysicalSizeZ
    pub physical_size: [f64; 3],
    /// unit of the physical sizes, when one NIfTI can express
    pub length_unit: Option<Unit>,
    /// TimeIncrement and its unit
    pub time_increment: Option<(f64, Unit)>,
    /// one entry per `<Plane>` element, in document order
    pub planes: Vec<PlaneIndex>,
}

impl OmeMetadata {
    /// Parse the OME-XML document and read its first `<Pixels>` element.
    ///
    /// # Errors
    ///
    /// - `ConvertError::MalformedMetadata` if the document is not well formed
    ///   or has no `<Pixels>` element.
    pub fn parse(xml: &str) -> Result<Self> {
        let doc = Document::parse(xml).map_err(|_| ConvertError::MalformedMetadata("OME-XML"))?;
        let pixels = doc
            .descendants()
            .find(|n| n.tag_name().name() == "Pixels")
            .ok_or(ConvertError::MalformedMetadata("OME-XML"))?;

        let size = |name| positive_int(pixels, name).unwrap_or(1);
        let physical = |name| positive_float(pixels, name).unwrap_or(1.0);

        let length_unit = match pixels.attribute("PhysicalSizeXUnit") {
            Some("\u{B5}m") => Some(Unit::Micron),
            Some("mm") => Some(Unit::Mm),
            _ => None,
        };
        let time_increment = positive_float(pixels, "TimeIncrement").and_then(|dt| {
            let unit = match pixels.attribute("TimeIncrementUnit") {
                None | Some("s") => Some(Unit::Sec),
                Some("ms") => Some(Unit::Msec),
                Some("\u{B5}s") => Some(Unit::Usec),
                _ => None,
            };
            unit.map(|u| (dt, u))
        });

        let planes = doc
            .descendants()
            .filter(|n| n.tag_name().name() == "Plane")
            .map(|plane| PlaneIndex {
                z: int_or_zero(plane, "TheZ"),
                t: int_or_zero(plane, "TheT"),
                c: int_or_zero(plane, "TheC"),
            })
            .collect();

        Ok(OmeMetadata {
            size_z: size("SizeZ"),
            size_t: size("SizeT"),
            size_c: size("SizeC"),
            physical_size: [
                physical("PhysicalSizeX"),
                physical("PhysicalSizeY"),
                physical("PhysicalSizeZ"),
            ],
            length_unit,
            time_increment,
            planes,
        })
    }
}

fn positive_int(node: Node, name: &str) -> Option<usize> {
    node.attribute(name)
        .and_then(|v| v.trim().parse::<usize>().ok())
        .filter(|v| *v > 0)
}

fn positive_float(node: Node, name: &str) -> Option<f64> {
    node.attribute(name)
        .and_then(|v| v.trim().parse::<f64>().ok())
        .filter(|v| *v != 0.0 && v.is_finite())
}

fn int_or_zero(node: Node, name: &str) -> usize {
    node.attribute(name)
        .and_then(|v| v.trim().parse::<usize>().ok())
        .unwrap_or(0)
}
