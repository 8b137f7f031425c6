//! Mapping of the slices of a file onto the canonical NIfTI order, where Z
//! varies fastest, then T, then C.
//!
//! Each convention stores slices in its own order. The mapping is
//! reconciled with the number of slices actually found and validated before
//! any voxel is copied, so that a malformed file degrades to a plain stack
//! instead of scrambling its slices.
use crate::dimension::DimensionSpec;
use crate::metadata::PlaneIndex;
use std::fmt;

/// How the slices of a file are laid out with respect to Z, T and C.
#[derive(Debug, Clone, PartialEq)]
pub enum SliceLayout {
    /// Slices are stored in canonical order.
    Sequential,
    /// ImageJ hyperstack: axes whose key appears first in the description
    /// vary fastest. Key positions are given for Z, T and C.
    Hyperstack {
        /// positions of the `slices=`, `frames=` and `channels=` keys
        key_positions: [Option<usize>; 3],
    },
    /// Explicit (Z, T, C) position of each slice, in file order.
    Planes(Vec<PlaneIndex>),
}

/// A recoverable inconsistency found while mapping slices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// Z·T matched the slice count but Z·T·C did not, so the channel axis
    /// was dropped.
    ChannelsCollapsed {
        /// declared Z, T and C extents
        sizes: [usize; 3],
        /// number of slices found
        n_frames: usize,
    },
    /// The declared extents do not account for the slices found. The
    /// slices are stacked in file order.
    InconsistentDimensions {
        /// declared Z, T and C extents
        sizes: [usize; 3],
        /// number of slices found
        n_frames: usize,
    },
    /// The declared slice positions are out of range or collide. The slices
    /// are stacked in file order.
    InvalidSliceOrder {
        /// number of slices found
        n_frames: usize,
    },
    /// Slices of a different shape than the first one were left out.
    SlicesExcluded {
        /// number of slices left out
        excluded: usize,
        /// number of slices considered
        total: usize,
    },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::ChannelsCollapsed { sizes, n_frames } => write!(
                f,
                "{}\u{d7}{}\u{d7}{} != {} slices, each channel is a separate stack group",
                sizes[0], sizes[1], sizes[2], n_frames
            ),
            Diagnostic::InconsistentDimensions { sizes, n_frames } => write!(
                f,
                "Inconsistent dimensions {}\u{d7}{}\u{d7}{} != {} slices (perhaps multi-dimensional)",
                sizes[0], sizes[1], sizes[2], n_frames
            ),
            Diagnostic::InvalidSliceOrder { n_frames } => write!(
                f,
                "Slice positions are not a permutation of {} slices, using file order",
                n_frames
            ),
            Diagnostic::SlicesExcluded { excluded, total } => write!(
                f,
                "{} of {} slices do not match the dimensions of the first slice",
                excluded, total
            ),
        }
    }
}

/// Canonical position of each source slice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SliceOrder {
    positions: Vec<Option<usize>>,
    n_frames: usize,
}

impl SliceOrder {
    /// The order of slices stored canonically.
    pub fn identity(n_frames: usize) -> Self {
        SliceOrder {
            positions: (0..n_frames).map(Some).collect(),
            n_frames,
        }
    }

    /// Build an order from explicit positions. Excluded slices are `None`,
    /// and the frame count is the number of included slices.
    pub fn from_positions(positions: Vec<Option<usize>>) -> Self {
        let n_frames = positions.iter().filter(|p| p.is_some()).count();
        SliceOrder {
            positions,
            n_frames,
        }
    }

    /// The canonical position of each source slice.
    pub fn positions(&self) -> &[Option<usize>] {
        &self.positions
    }

    /// Number of slices in the output volume.
    pub fn n_frames(&self) -> usize {
        self.n_frames
    }

    /// Whether every slice keeps its position in the file.
    pub fn is_identity(&self) -> bool {
        self.positions
            .iter()
            .enumerate()
            .all(|(i, p)| *p == Some(i))
    }

    /// Whether the included slices map one to one onto `0..n_frames`.
    pub fn is_bijection(&self) -> bool {
        let mut seen = vec![false; self.n_frames];
        for p in self.positions.iter().flatten() {
            match seen.get_mut(*p) {
                Some(s) if !*s => *s = true,
                _ => return false,
            }
        }
        true
    }
}

/// The result of mapping the slices of a stack.
#[derive(Debug, Clone, PartialEq)]
pub struct SliceMapping {
    /// extents reconciled with the slice count
    pub spec: DimensionSpec,
    /// canonical position of each slice
    pub order: SliceOrder,
    /// inconsistencies which were worked around
    pub diagnostics: Vec<Diagnostic>,
}

impl SliceMapping {
    /// Map `n_frames` slices laid out as described onto the canonical
    /// order.
    pub fn new(mut spec: DimensionSpec, layout: &SliceLayout, n_frames: usize) -> Self {
        let mut diagnostics = Vec::new();
        let sizes = [spec.size_z, spec.size_t, spec.size_c];

        let mut consistent = true;
        let mut collapsed = false;
        if spec.slice_count() != n_frames {
            if spec.size_z.saturating_mul(spec.size_t) == n_frames {
                spec.size_c = 1;
                collapsed = true;
                diagnostics.push(Diagnostic::ChannelsCollapsed { sizes, n_frames });
            } else {
                spec.size_z = n_frames;
                spec.size_t = 1;
                spec.size_c = 1;
                consistent = false;
                diagnostics.push(Diagnostic::InconsistentDimensions { sizes, n_frames });
            }
        }

        let order = if !consistent {
            SliceOrder::identity(n_frames)
        } else {
            match layout {
                SliceLayout::Sequential => SliceOrder::identity(n_frames),
                SliceLayout::Hyperstack { key_positions } => {
                    if n_frames > 1 {
                        hyperstack_order(&spec, *key_positions, n_frames)
                    } else {
                        SliceOrder::identity(n_frames)
                    }
                }
                SliceLayout::Planes(planes) => plane_order(&spec, planes, n_frames, collapsed),
            }
        };

        let order = if order.is_bijection() {
            order
        } else {
            diagnostics.push(Diagnostic::InvalidSliceOrder { n_frames });
            SliceOrder::identity(n_frames)
        };

        SliceMapping {
            spec,
            order,
            diagnostics,
        }
    }

    /// Leave out the slices not marked in `keep`, stacking the others in
    /// file order. Returns `false` without changes if the slices are not in
    /// file order, as there is no way to remap them.
    pub fn exclude_slices(&mut self, keep: &[bool]) -> bool {
        if !self.order.is_identity() {
            return false;
        }
        let total = self.order.positions.len();
        let mut next = 0;
        let positions: Vec<_> = (0..total)
            .map(|i| {
                if keep.get(i).copied().unwrap_or(false) {
                    next += 1;
                    Some(next - 1)
                } else {
                    None
                }
            })
            .collect();
        let order = SliceOrder::from_positions(positions);
        let excluded = total - order.n_frames;
        if excluded == 0 {
            return true;
        }

        if self.spec.slice_count() != order.n_frames {
            self.spec.size_z = order.n_frames;
            self.spec.size_t = 1;
            self.spec.size_c = 1;
        }
        self.order = order;
        self.diagnostics
            .push(Diagnostic::SlicesExcluded { excluded, total });
        true
    }
}

/// Order of an ImageJ hyperstack. The step of each axis is the product of
/// the extents of the axes whose key comes first.
fn hyperstack_order(spec: &DimensionSpec, keys: [Option<usize>; 3], n_frames: usize) -> SliceOrder {
    let sizes = [spec.size_z, spec.size_t, spec.size_c];
    let mut steps = [1usize; 3];
    for (axis, step) in steps.iter_mut().enumerate() {
        for other in 0..3 {
            if keys[axis] > keys[other] {
                *step *= sizes[other];
            }
        }
    }

    let positions = (0..n_frames)
        .map(|i| {
            let z = (i / steps[0]) % sizes[0];
            let t = (i / steps[1]) % sizes[1];
            let c = (i / steps[2]) % sizes[2];
            Some(z + t * sizes[0] + c * sizes[0] * sizes[1])
        })
        .collect();
    SliceOrder::from_positions(positions)
}

/// Order given by explicit plane positions. Slices without a plane entry
/// are taken as (0, 0, 0).
fn plane_order(
    spec: &DimensionSpec,
    planes: &[PlaneIndex],
    n_frames: usize,
    ignore_channel: bool,
) -> SliceOrder {
    let positions = (0..n_frames)
        .map(|i| {
            let plane = planes.get(i).copied().unwrap_or_default();
            let c = if ignore_channel { 0 } else { plane.c };
            let position = plane
                .z
                .saturating_add(plane.t.saturating_mul(spec.size_z))
                .saturating_add(c.saturating_mul(spec.size_z).saturating_mul(spec.size_t));
            Some(position)
        })
        .collect();
    SliceOrder::from_positions(positions)
}
