//! Regular 3D scalar grid with world placement.

use crate::geom::{BBox, Point3, Vec3};

/// Default name of a volume's scalar array.
pub const DEFAULT_SCALAR_NAME: &str = "ImageScalars";

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum VolumeError {
    #[error("volume dimensions must be at least 1 along every axis, got {dimensions:?}")]
    EmptyDimensions { dimensions: [usize; 3] },

    #[error("volume spacing must be finite and positive, got ({x}, {y}, {z})")]
    InvalidSpacing { x: f64, y: f64, z: f64 },

    #[error("volume origin must be finite")]
    InvalidOrigin,

    #[error("expected {expected} scalars for dimensions {dimensions:?}, got {actual}")]
    ScalarCountMismatch {
        dimensions: [usize; 3],
        expected: usize,
        actual: usize,
    },
}

/// Scalar grid addressed by voxel index `(i, j, k)`, stored x-fastest.
///
/// World position of voxel `(i, j, k)` is `origin + (i·sx, j·sy, k·sz)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Volume {
    dimensions: [usize; 3],
    origin: Point3,
    spacing: Vec3,
    scalars: Vec<f64>,
    name: String,
}

impl Volume {
    /// # Errors
    /// Returns an error for empty dimensions, non-positive spacing, a
    /// non-finite origin or a scalar count that does not match the dimensions.
    pub fn new(
        dimensions: [usize; 3],
        origin: Point3,
        spacing: Vec3,
        scalars: Vec<f64>,
    ) -> Result<Self, VolumeError> {
        if dimensions.contains(&0) {
            return Err(VolumeError::EmptyDimensions { dimensions });
        }
        let spacing_ok = [spacing.x, spacing.y, spacing.z]
            .iter()
            .all(|s| s.is_finite() && *s > 0.0);
        if !spacing_ok {
            return Err(VolumeError::InvalidSpacing {
                x: spacing.x,
                y: spacing.y,
                z: spacing.z,
            });
        }
        if !origin.is_finite() {
            return Err(VolumeError::InvalidOrigin);
        }
        let expected = dimensions.iter().product();
        if scalars.len() != expected {
            return Err(VolumeError::ScalarCountMismatch {
                dimensions,
                expected,
                actual: scalars.len(),
            });
        }
        Ok(Self {
            dimensions,
            origin,
            spacing,
            scalars,
            name: DEFAULT_SCALAR_NAME.to_string(),
        })
    }

    /// Builds a volume by evaluating `f` at every voxel's world position.
    ///
    /// # Errors
    /// Same conditions as [`Volume::new`], except the scalar count.
    pub fn from_fn<F>(
        dimensions: [usize; 3],
        origin: Point3,
        spacing: Vec3,
        mut f: F,
    ) -> Result<Self, VolumeError>
    where
        F: FnMut(Point3) -> f64,
    {
        let [nx, ny, nz] = dimensions;
        let mut scalars = Vec::with_capacity(nx * ny * nz);
        for k in 0..nz {
            for j in 0..ny {
                for i in 0..nx {
                    scalars.push(f(voxel_world(origin, spacing, i, j, k)));
                }
            }
        }
        Self::new(dimensions, origin, spacing, scalars)
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    #[must_use]
    pub const fn dimensions(&self) -> [usize; 3] {
        self.dimensions
    }

    #[must_use]
    pub const fn origin(&self) -> Point3 {
        self.origin
    }

    #[must_use]
    pub const fn spacing(&self) -> Vec3 {
        self.spacing
    }

    #[must_use]
    pub fn scalars(&self) -> &[f64] {
        &self.scalars
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Inclusive index-space bounds `[i0, i1, j0, j1, k0, k1]`.
    #[must_use]
    pub const fn extent(&self) -> [usize; 6] {
        let [nx, ny, nz] = self.dimensions;
        [0, nx - 1, 0, ny - 1, 0, nz - 1]
    }

    #[must_use]
    pub fn voxel_count(&self) -> usize {
        self.scalars.len()
    }

    #[must_use]
    pub fn value(&self, i: usize, j: usize, k: usize) -> Option<f64> {
        let [nx, ny, nz] = self.dimensions;
        if i >= nx || j >= ny || k >= nz {
            return None;
        }
        Some(self.scalars[(k * ny + j) * nx + i])
    }

    /// Value at an arbitrary integer index, each axis clamped to the grid.
    #[allow(clippy::cast_possible_wrap, clippy::cast_sign_loss)]
    pub(crate) fn value_clamped(&self, i: isize, j: isize, k: isize) -> f64 {
        let clamp = |v: isize, n: usize| v.clamp(0, n as isize - 1) as usize;
        let [nx, ny, nz] = self.dimensions;
        let (i, j, k) = (clamp(i, nx), clamp(j, ny), clamp(k, nz));
        self.scalars[(k * ny + j) * nx + i]
    }

    #[must_use]
    pub fn index_to_world(&self, i: usize, j: usize, k: usize) -> Point3 {
        voxel_world(self.origin, self.spacing, i, j, k)
    }

    /// Continuous index coordinates of a world point.
    #[must_use]
    pub fn world_to_index(&self, p: Point3) -> [f64; 3] {
        [
            (p.x - self.origin.x) / self.spacing.x,
            (p.y - self.origin.y) / self.spacing.y,
            (p.z - self.origin.z) / self.spacing.z,
        ]
    }

    /// World-space box spanned by the voxel centers.
    #[must_use]
    pub fn bounds(&self) -> BBox {
        let [nx, ny, nz] = self.dimensions;
        BBox::new(self.origin, self.index_to_world(nx - 1, ny - 1, nz - 1))
    }
}

#[allow(clippy::cast_precision_loss)]
fn voxel_world(origin: Point3, spacing: Vec3, i: usize, j: usize, k: usize) -> Point3 {
    Point3::new(
        origin.x + i as f64 * spacing.x,
        origin.y + j as f64 * spacing.y,
        origin.z + k as f64 * spacing.z,
    )
}
