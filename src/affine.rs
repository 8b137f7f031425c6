//! Voxel to world transformation of an output volume.
//!
//! The converter knows nothing about the acquisition geometry besides the
//! voxel spacing, so the affine is a diagonal scaling which places the
//! center of the volume at the origin.
#[cfg(feature = "nalgebra_affine")]
use nalgebra::Matrix4;

/// 4x4 affine as a `nalgebra` matrix.
#[cfg(feature = "nalgebra_affine")]
pub type Affine4 = Matrix4<f32>;

/// A 4x4 voxel to world affine, stored row by row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Affine {
    rows: [[f32; 4]; 4],
}

impl Default for Affine {
    fn default() -> Affine {
        Affine::centered([1.; 3], [0; 3])
    }
}

impl Affine {
    /// Build the affine of a volume with the given voxel spacing and extent
    /// along X, Y and Z. Row `i` scales by `spacing[i]` and translates by
    /// `-spacing[i] * extent[i] / 2`.
    pub fn centered(spacing: [f32; 3], extent: [u16; 3]) -> Self {
        let mut rows = [[0.; 4]; 4];
        for (i, row) in rows.iter_mut().take(3).enumerate() {
            row[i] = spacing[i];
            row[3] = -(spacing[i] * f32::from(extent[i])) / 2.;
        }
        rows[3][3] = 1.;
        Affine { rows }
    }

    /// Build an affine from its rows.
    pub fn from_rows(rows: [[f32; 4]; 4]) -> Self {
        Affine { rows }
    }

    /// All four rows.
    pub fn rows(&self) -> &[[f32; 4]; 4] {
        &self.rows
    }

    /// First row, as stored in `srow_x`.
    pub fn srow_x(&self) -> [f32; 4] {
        self.rows[0]
    }

    /// Second row, as stored in `srow_y`.
    pub fn srow_y(&self) -> [f32; 4] {
        self.rows[1]
    }

    /// Third row, as stored in `srow_z`.
    pub fn srow_z(&self) -> [f32; 4] {
        self.rows[2]
    }
}

#[cfg(feature = "nalgebra_affine")]
impl From<Affine> for Affine4 {
    fn from(affine: Affine) -> Affine4 {
        let r = affine.rows;
        Affine4::from_fn(|i, j| r[i][j])
    }
}
