//! Partitioning of a file's slices into stackable groups.
//!
//! A TIFF file may hold slices of different shapes, such as a full resolution
//! stack interleaved with its thumbnails. Only slices which share a
//! [`StackConfig`] can be stacked into one volume, so each group is converted
//! separately.
//!
//! [`StackConfig`]: ./struct.StackConfig.html
use std::fmt;

/// The configuration identifying slices that can be stacked together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StackConfig {
    /// width in pixels
    pub width: u32,
    /// height in pixels
    pub height: u32,
    /// samples per pixel
    pub samples_per_pixel: u16,
    /// bits of a whole pixel
    pub bit_depth: u32,
}

impl fmt::Display for StackConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}x{}c{}b{}",
            self.width, self.height, self.samples_per_pixel, self.bit_depth
        )
    }
}

/// The distinct configurations of a file and the group of each slice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackGroups {
    configs: Vec<StackConfig>,
    assignments: Vec<usize>,
}

impl StackGroups {
    /// Group the given per-slice configurations, numbering groups in order
    /// of first appearance.
    pub fn new<I>(slices: I) -> Self
    where
        I: IntoIterator<Item = StackConfig>,
    {
        let mut configs: Vec<StackConfig> = Vec::new();
        let assignments = slices
            .into_iter()
            .map(|config| match configs.iter().position(|c| *c == config) {
                Some(i) => i,
                None => {
                    configs.push(config);
                    configs.len() - 1
                }
            })
            .collect();
        StackGroups {
            configs,
            assignments,
        }
    }

    /// The distinct configurations, in order of first appearance.
    pub fn configs(&self) -> &[StackConfig] {
        &self.configs
    }

    /// Number of distinct configurations.
    pub fn len(&self) -> usize {
        self.configs.len()
    }

    /// Whether there are no slices at all.
    pub fn is_empty(&self) -> bool {
        self.configs.is_empty()
    }

    /// The group index of each slice.
    pub fn assignments(&self) -> &[usize] {
        &self.assignments
    }

    /// Select the slices of one group. A group index out of range falls back
    /// to the first group. When the file holds a single configuration, every
    /// slice is selected.
    pub fn select(&self, group: usize) -> StackSelection {
        let group = if group < self.configs.len() { group } else { 0 };
        let slices = self
            .assignments
            .iter()
            .enumerate()
            .filter(|&(_, g)| *g == group)
            .map(|(i, _)| i)
            .collect();
        StackSelection { group, slices }
    }

    /// Select every slice regardless of its configuration.
    pub fn select_all(&self) -> StackSelection {
        StackSelection {
            group: 0,
            slices: (0..self.assignments.len()).collect(),
        }
    }
}

/// Slices chosen for one conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackSelection {
    /// the effective group index
    pub group: usize,
    /// indices of the selected slices in the source file
    pub slices: Vec<usize>,
}

#[cfg(test)]
mod tests {
    use super::{StackConfig, StackGroups};

    fn config(width: u32, height: u32) -> StackConfig {
        StackConfig {
            width,
            height,
            samples_per_pixel: 1,
            bit_depth: 8,
        }
    }

    fn full_and_thumbnails() -> StackGroups {
        let slices = (0..10).map(|i| if i < 7 { config(512, 512) } else { config(128, 128) });
        StackGroups::new(slices)
    }

    #[test]
    fn thumbnails_form_second_group() {
        let groups = full_and_thumbnails();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups.configs(), &[config(512, 512), config(128, 128)]);
        assert_eq!(groups.select(0).slices, (0..7).collect::<Vec<_>>());
        assert_eq!(groups.select(1).slices, vec![7, 8, 9]);
    }

    #[test]
    fn out_of_range_group_falls_back() {
        let groups = full_and_thumbnails();
        let selection = groups.select(5);
        assert_eq!(selection.group, 0);
        assert_eq!(selection.slices.len(), 7);
    }

    #[test]
    fn interleaved_groups_keep_first_seen_order() {
        let groups = StackGroups::new(vec![
            config(64, 64),
            config(16, 16),
            config(64, 64),
            config(16, 16),
        ]);
        assert_eq!(groups.assignments(), &[0, 1, 0, 1]);
        assert_eq!(groups.select(1).slices, vec![1, 3]);
        assert_eq!(groups.select_all().slices, vec![0, 1, 2, 3]);
    }

    #[test]
    fn config_key() {
        let c = StackConfig {
            width: 512,
            height: 256,
            samples_per_pixel: 3,
            bit_depth: 24,
        };
        assert_eq!(c.to_string(), "512x256c3b24");
    }
}
