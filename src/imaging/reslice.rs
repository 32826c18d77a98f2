//! Reslice transform and the cubic volume resampler.
//!
//! [`ResliceAxes`] stores an orthonormal rotation whose rows are the
//! binormal, normal and tangent of the frame at the slice center, plus the
//! translation that puts raster index `(0, 0)` at the slice corner. Raster
//! sample `(i, j)` lies at world position
//! `Rᵀ·(i·sx, j·sy, 0) + translation = corner + b·i·sx + n·j·sy`,
//! so the image's horizontal axis follows the binormal, its vertical axis the
//! normal, and the slice plane faces along the tangent.

use super::interpolate::cubic_at;
use super::slice::{ImageSlice, SliceGeometry};
use super::volume::Volume;
use crate::geom::{FrenetTriad, Point3, Tolerance, Vec3};

/// Rows of a rotation may deviate this much from orthonormal before the
/// transform is rejected.
const ORTHONORMAL_TOLERANCE: Tolerance = Tolerance::LOOSE;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ResliceError {
    #[error("frame axes are not orthonormal (tangent {tangent:?}, normal {normal:?}, binormal {binormal:?})")]
    NonOrthonormalFrame {
        tangent: Vec3,
        normal: Vec3,
        binormal: Vec3,
    },

    #[error("slice corner is not finite")]
    NonFiniteCorner,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResampleError {
    #[error("output raster {extent:?} has no samples")]
    EmptyRaster { extent: [usize; 2] },

    #[error("output raster {extent:?} is too large to allocate")]
    RasterTooLarge { extent: [usize; 2] },
}

// ============================================================================
// Reslice axes
// ============================================================================

/// Rotation (rows binormal, normal, tangent) plus translation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResliceAxes {
    rotation: [Vec3; 3],
    translation: Vec3,
}

impl ResliceAxes {
    /// Builds the axes for a slice whose raster origin sits at `corner`.
    ///
    /// # Errors
    /// Returns an error if the triad is not orthonormal or the corner is not
    /// finite.
    pub fn from_frame(triad: &FrenetTriad, corner: Point3) -> Result<Self, ResliceError> {
        if !triad.is_orthonormal(ORTHONORMAL_TOLERANCE) {
            return Err(ResliceError::NonOrthonormalFrame {
                tangent: triad.tangent,
                normal: triad.normal,
                binormal: triad.binormal,
            });
        }
        if !corner.is_finite() {
            return Err(ResliceError::NonFiniteCorner);
        }

        let rotation = [triad.binormal, triad.normal, triad.tangent];
        let translation = place_slice_origin(&rotation, corner);
        Ok(Self {
            rotation,
            translation,
        })
    }

    /// Rotation rows: binormal, normal, tangent.
    #[must_use]
    pub const fn rotation(&self) -> [Vec3; 3] {
        self.rotation
    }

    #[must_use]
    pub const fn translation(&self) -> Vec3 {
        self.translation
    }

    /// Row-major homogeneous matrix: rotation rows in the upper-left 3×3,
    /// translation in the last column.
    #[must_use]
    pub const fn to_matrix(&self) -> [[f64; 4]; 4] {
        let [b, n, t] = self.rotation;
        let o = self.translation;
        [
            [b.x, b.y, b.z, o.x],
            [n.x, n.y, n.z, o.y],
            [t.x, t.y, t.z, o.z],
            [0.0, 0.0, 0.0, 1.0],
        ]
    }

    /// World position of a point given in slice coordinates
    /// `(along binormal, along normal, along tangent)`.
    #[must_use]
    pub fn slice_to_world(&self, local: [f64; 3]) -> Point3 {
        let offset = transpose_mul(&self.rotation, Vec3::from_array(local));
        Point3::from(self.translation.add(offset))
    }

    /// Inverse of [`ResliceAxes::slice_to_world`].
    #[must_use]
    pub fn world_to_slice(&self, world: Point3) -> [f64; 3] {
        rotate(&self.rotation, world.to_vec3().sub(self.translation)).to_array()
    }
}

/// Translation for the reslice transform: the corner is rotated into slice
/// space (`R·corner`) and carried back through the transposed rotation
/// (`Rᵀ·(R·corner)`).
///
/// For an exactly orthonormal `R` this returns `corner` up to rounding. The
/// two-step form is kept as is and pinned by regression tests.
#[must_use]
pub fn place_slice_origin(rotation: &[Vec3; 3], corner: Point3) -> Vec3 {
    let rotated = rotate(rotation, corner.to_vec3());
    transpose_mul(rotation, rotated)
}

fn rotate(rows: &[Vec3; 3], v: Vec3) -> Vec3 {
    Vec3::new(rows[0].dot(v), rows[1].dot(v), rows[2].dot(v))
}

fn transpose_mul(rows: &[Vec3; 3], v: Vec3) -> Vec3 {
    rows[0]
        .mul_scalar(v.x)
        .add(rows[1].mul_scalar(v.y))
        .add(rows[2].mul_scalar(v.z))
}

// ============================================================================
// Resampling
// ============================================================================

/// Resamples a volume through reslice axes into a single-slice raster.
///
/// Implementations return one sample per raster position, x fastest, at
/// `axes.slice_to_world((i·sx, j·sy, 0))`; positions outside the volume take
/// a background value.
pub trait VolumeResampler {
    /// # Errors
    /// Returns an error if the raster geometry cannot be sampled.
    fn reslice(
        &self,
        volume: &Volume,
        axes: &ResliceAxes,
        geometry: SliceGeometry,
    ) -> Result<ImageSlice, ResampleError>;
}

/// Tricubic (Catmull-Rom) resampler.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CubicResampler {
    /// Value written where the slice leaves the volume.
    pub background: f64,
}

impl CubicResampler {
    #[must_use]
    pub const fn new() -> Self {
        Self { background: 0.0 }
    }

    #[must_use]
    pub const fn with_background(mut self, background: f64) -> Self {
        self.background = background;
        self
    }
}

impl Default for CubicResampler {
    fn default() -> Self {
        Self::new()
    }
}

impl VolumeResampler for CubicResampler {
    #[allow(clippy::cast_precision_loss)]
    fn reslice(
        &self,
        volume: &Volume,
        axes: &ResliceAxes,
        geometry: SliceGeometry,
    ) -> Result<ImageSlice, ResampleError> {
        let [nx, ny] = geometry.extent;
        let Some(count) = nx.checked_mul(ny) else {
            return Err(ResampleError::RasterTooLarge {
                extent: geometry.extent,
            });
        };
        if count == 0 {
            return Err(ResampleError::EmptyRaster {
                extent: geometry.extent,
            });
        }

        let [sx, sy] = geometry.spacing;
        let background = self.background;
        let scalars = sample_rows(nx, ny, |i, j| {
            let world = axes.slice_to_world([i as f64 * sx, j as f64 * sy, 0.0]);
            cubic_at(volume, volume.world_to_index(world)).unwrap_or(background)
        });

        log::trace!("resliced {nx}x{ny} raster from {} voxels", volume.voxel_count());
        Ok(ImageSlice::from_samples(geometry, scalars))
    }
}

cfg_if::cfg_if! {
    if #[cfg(feature = "parallel")] {
        fn sample_rows<F>(nx: usize, ny: usize, sample: F) -> Vec<f64>
        where
            F: Fn(usize, usize) -> f64 + Sync,
        {
            use rayon::prelude::*;
            (0..ny)
                .into_par_iter()
                .flat_map_iter(|j| (0..nx).map(move |i| (i, j)))
                .map(|(i, j)| sample(i, j))
                .collect()
        }
    } else {
        fn sample_rows<F>(nx: usize, ny: usize, sample: F) -> Vec<f64>
        where
            F: Fn(usize, usize) -> f64,
        {
            (0..ny)
                .flat_map(|j| (0..nx).map(move |i| (i, j)))
                .map(|(i, j)| sample(i, j))
                .collect()
        }
    }
}
