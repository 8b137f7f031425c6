//! ImageJ metadata, stored as `key=value` lines in the `ImageDescription`
//! tag of ImageJ TIFF files and hyperstacks.
use regex::Regex;
use std::str::FromStr;
use std::sync::LazyLock;

static SLICES: LazyLock<Regex> = LazyLock::new(|| key_regex("slices", r"\d+"));
static FRAMES: LazyLock<Regex> = LazyLock::new(|| key_regex("frames", r"\d+"));
static CHANNELS: LazyLock<Regex> = LazyLock::new(|| key_regex("channels", r"\d+"));
static SPACING: LazyLock<Regex> = LazyLock::new(|| key_regex("spacing", r"[\d.]+"));
static UNIT: LazyLock<Regex> = LazyLock::new(|| key_regex("unit", r"\S+"));
static FINTERVAL: LazyLock<Regex> = LazyLock::new(|| key_regex("finterval", r"[\d.]+"));

/// A `key=value` pattern, the key starting at a word boundary.
fn key_regex(key: &str, value_pattern: &str) -> Regex {
    Regex::new(&format!(r"\b{}=({})", key, value_pattern)).expect("Invalid ImageJ key regex")
}

/// Substring identifying an ImageJ description.
pub const IMAGEJ_MARKER: &str = "ImageJ=";

/// Spellings of the micrometer unit found in ImageJ descriptions, including
/// the Latin-1 micro sign decoded as a replacement character.
const MICROMETER_SPELLINGS: &[&str] = &[
    "\u{B5}m",
    "\u{3BC}m",
    "\u{FFFD}m",
    "\\u00B5m",
    "um",
    "micron",
];

/// Whether the description was written by ImageJ.
pub fn is_imagej_description(description: &str) -> bool {
    description.contains(IMAGEJ_MARKER)
}

/// Whether the unit string names micrometers.
pub fn is_micrometer(unit: &str) -> bool {
    MICROMETER_SPELLINGS.contains(&unit)
}

/// Values extracted from an ImageJ description.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageJDescription {
    /// number of Z slices
    pub slices: usize,
    /// number of time frames
    pub frames: usize,
    /// number of channels
    pub channels: usize,
    /// Z spacing
    pub spacing: f64,
    /// length unit, verbatim
    pub unit: Option<String>,
    /// frame interval in seconds
    pub frame_interval: Option<f64>,
    /// Where the `slices=`, `frames=` and `channels=` keys were found, in
    /// this order. Keys listed first vary fastest in the file.
    pub key_positions: [Option<usize>; 3],
}

impl ImageJDescription {
    /// Extract the known keys from the description. Missing or unparsable
    /// counts default to 1, a missing spacing to 1.0.
    pub fn parse(description: &str) -> Self {
        let slices = find_value(description, &SLICES);
        let frames = find_value(description, &FRAMES);
        let channels = find_value(description, &CHANNELS);
        let count = |found: Option<(usize, &str)>| {
            found
                .and_then(|(_, v)| usize::from_str(v).ok())
                .unwrap_or(1)
        };

        ImageJDescription {
            slices: count(slices),
            frames: count(frames),
            channels: count(channels),
            spacing: find_value(description, &SPACING)
                .and_then(|(_, v)| f64::from_str(v).ok())
                .unwrap_or(1.0),
            unit: find_value(description, &UNIT).map(|(_, v)| v.to_string()),
            frame_interval: find_value(description, &FINTERVAL)
                .and_then(|(_, v)| f64::from_str(v).ok()),
            key_positions: [
                slices.map(|(p, _)| p),
                frames.map(|(p, _)| p),
                channels.map(|(p, _)| p),
            ],
        }
    }

    /// Whether the length unit is micrometers.
    pub fn is_micrometer(&self) -> bool {
        self.unit.as_deref().map_or(false, is_micrometer)
    }
}

/// Find the first `key=value` pair matched by `re`, returning the position
/// of the key and the value.
fn find_value<'t>(text: &'t str, re: &Regex) -> Option<(usize, &'t str)> {
    let caps = re.captures(text)?;
    Some((caps.get(0)?.start(), caps.get(1)?.as_str()))
}
