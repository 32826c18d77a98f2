//! Resliced 2D rasters and the append-only slice stack.

use serde::{Deserialize, Serialize};

use super::volume::{Volume, VolumeError};
use crate::geom::{Point3, Vec3};

/// Name given to the scalars of every resliced raster.
pub const RESLICED_SCALAR_NAME: &str = "ReslicedImage";

/// Raster layout shared by all slices of one slicer: `Nx×Ny` samples at
/// spacing `(sx, sy)`, one voxel of `thickness` deep.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SliceGeometry {
    pub extent: [usize; 2],
    pub spacing: [f64; 2],
    pub thickness: f64,
}

impl SliceGeometry {
    #[must_use]
    pub const fn sample_count(&self) -> usize {
        self.extent[0] * self.extent[1]
    }

    /// Physical width and height of the raster, `(Nx·sx, Ny·sy)`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn physical_size(&self) -> [f64; 2] {
        [
            self.extent[0] as f64 * self.spacing[0],
            self.extent[1] as f64 * self.spacing[1],
        ]
    }
}

/// One resliced image: row-major (x fastest) scalars on a zero-origin grid.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageSlice {
    geometry: SliceGeometry,
    scalars: Vec<f64>,
    name: String,
}

impl ImageSlice {
    /// A 0×0 image, the value held by a slicer before its first invocation.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            geometry: SliceGeometry {
                extent: [0, 0],
                spacing: [1.0, 1.0],
                thickness: 1.0,
            },
            scalars: Vec::new(),
            name: RESLICED_SCALAR_NAME.to_string(),
        }
    }

    /// Wraps already resampled scalars. `scalars.len()` must equal
    /// `geometry.sample_count()`.
    pub(crate) fn from_samples(geometry: SliceGeometry, scalars: Vec<f64>) -> Self {
        debug_assert_eq!(scalars.len(), geometry.sample_count());
        Self {
            geometry,
            scalars,
            name: RESLICED_SCALAR_NAME.to_string(),
        }
    }

    #[must_use]
    pub const fn geometry(&self) -> SliceGeometry {
        self.geometry
    }

    #[must_use]
    pub const fn extent(&self) -> [usize; 2] {
        self.geometry.extent
    }

    #[must_use]
    pub const fn spacing(&self) -> [f64; 2] {
        self.geometry.spacing
    }

    /// Output origin; resliced images always start at (0, 0, 0).
    #[must_use]
    pub const fn origin(&self) -> Point3 {
        Point3::ORIGIN
    }

    #[must_use]
    pub fn scalars(&self) -> &[f64] {
        &self.scalars
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scalars.is_empty()
    }

    #[must_use]
    pub fn value(&self, i: usize, j: usize) -> Option<f64> {
        let [nx, ny] = self.geometry.extent;
        if i >= nx || j >= ny {
            return None;
        }
        Some(self.scalars[j * nx + i])
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SliceStackError {
    #[error("slice stack holds no non-empty slices")]
    NoSlices,

    #[error("slice {index} has extent {actual:?}, expected {expected:?}")]
    ExtentMismatch {
        index: usize,
        expected: [usize; 2],
        actual: [usize; 2],
    },

    #[error(transparent)]
    Volume(#[from] VolumeError),
}

/// Append-only sequence of slices, one per slicer invocation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SliceStack {
    slices: Vec<ImageSlice>,
}

impl SliceStack {
    #[must_use]
    pub const fn new() -> Self {
        Self { slices: Vec::new() }
    }

    pub fn push(&mut self, slice: ImageSlice) {
        self.slices.push(slice);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.slices.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slices.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&ImageSlice> {
        self.slices.get(index)
    }

    #[must_use]
    pub fn slices(&self) -> &[ImageSlice] {
        &self.slices
    }

    pub fn iter(&self) -> impl Iterator<Item = &ImageSlice> {
        self.slices.iter()
    }

    pub(crate) fn clear(&mut self) {
        self.slices.clear();
    }

    /// Stitches the non-empty slices along a third axis into a volume.
    ///
    /// Slice `n` becomes plane `k = n`; spacing is `(sx, sy, thickness)` of
    /// the first non-empty slice and the origin is zero.
    ///
    /// # Errors
    /// Returns an error if no slice has data or the non-empty slices do not
    /// share one extent.
    pub fn to_volume(&self) -> Result<Volume, SliceStackError> {
        let mut filled = self.slices.iter().enumerate().filter(|(_, s)| !s.is_empty());
        let Some((_, first)) = filled.next() else {
            return Err(SliceStackError::NoSlices);
        };
        let geometry = first.geometry();

        let mut scalars = first.scalars().to_vec();
        let mut depth = 1;
        for (index, slice) in filled {
            if slice.extent() != geometry.extent {
                return Err(SliceStackError::ExtentMismatch {
                    index,
                    expected: geometry.extent,
                    actual: slice.extent(),
                });
            }
            scalars.extend_from_slice(slice.scalars());
            depth += 1;
        }

        let spacing = Vec3::new(geometry.spacing[0], geometry.spacing[1], geometry.thickness);
        let volume = Volume::new(
            [geometry.extent[0], geometry.extent[1], depth],
            Point3::ORIGIN,
            spacing,
            scalars,
        )?;
        Ok(volume.with_name(RESLICED_SCALAR_NAME))
    }
}
