//! Slice plane descriptor and scalar probing over its vertex grid.

use serde::{Deserialize, Serialize};

use super::interpolate::trilinear_at;
use super::slice::SliceGeometry;
use super::volume::Volume;
use crate::geom::{FrenetTriad, Point3, Vec3};

/// Rectangle in world space spanned by `point1 − origin` and
/// `point2 − origin`, subdivided into `resolution[0] × resolution[1]` quads.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlaneDescriptor {
    pub origin: Point3,
    pub point1: Point3,
    pub point2: Point3,
    pub resolution: [usize; 2],
}

impl PlaneDescriptor {
    /// Plane of `Nx·sx × Ny·sy` centered on `center`, spanned by the
    /// binormal (first axis) and the normal (second axis) of `triad`.
    #[must_use]
    pub fn from_frame(center: Point3, triad: &FrenetTriad, geometry: SliceGeometry) -> Self {
        let [width, height] = geometry.physical_size();
        let origin = center - triad.normal * (height / 2.0) - triad.binormal * (width / 2.0);
        Self {
            origin,
            point1: origin + triad.binormal * width,
            point2: origin + triad.normal * height,
            resolution: geometry.extent,
        }
    }

    #[must_use]
    pub fn axis1(&self) -> Vec3 {
        self.point1 - self.origin
    }

    #[must_use]
    pub fn axis2(&self) -> Vec3 {
        self.point2 - self.origin
    }

    #[must_use]
    pub fn center(&self) -> Point3 {
        self.origin + (self.axis1() + self.axis2()) * 0.5
    }

    /// Unit plane normal `axis1 × axis2`, `None` for a degenerate plane.
    #[must_use]
    pub fn normal(&self) -> Option<Vec3> {
        self.axis1().cross(self.axis2()).normalized()
    }

    /// Number of grid vertices, `(Nx + 1)·(Ny + 1)`.
    #[must_use]
    pub const fn vertex_count(&self) -> usize {
        (self.resolution[0] + 1) * (self.resolution[1] + 1)
    }

    /// Grid vertices, first axis fastest.
    #[must_use]
    pub fn grid_points(&self) -> Vec<Point3> {
        let [nx, ny] = self.resolution;
        let (axis1, axis2) = (self.axis1(), self.axis2());
        let mut points = Vec::with_capacity(self.vertex_count());
        for j in 0..=ny {
            let v = fraction(j, ny);
            for i in 0..=nx {
                points.push(self.origin + axis1 * fraction(i, nx) + axis2 * v);
            }
        }
        points
    }
}

#[allow(clippy::cast_precision_loss)]
fn fraction(i: usize, n: usize) -> f64 {
    if n == 0 { 0.0 } else { i as f64 / n as f64 }
}

// ============================================================================
// Probing
// ============================================================================

/// Samples a volume at a world position.
pub trait ScalarProbe {
    /// Interpolated value, or `None` when `world` lies outside the volume.
    fn probe(&self, volume: &Volume, world: Point3) -> Option<f64>;
}

/// Trilinear point probe. Points outside the box spanned by the voxel
/// centers are rejected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrilinearProbe;

impl ScalarProbe for TrilinearProbe {
    fn probe(&self, volume: &Volume, world: Point3) -> Option<f64> {
        if !volume.bounds().contains_point(world) {
            return None;
        }
        trilinear_at(volume, volume.world_to_index(world))
    }
}

/// Plane whose grid vertices carry probed scalars.
///
/// Vertices outside the volume hold `0.0` and are cleared in `valid`.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbedPlane {
    pub plane: PlaneDescriptor,
    pub values: Vec<f64>,
    pub valid: Vec<bool>,
}

impl ProbedPlane {
    /// Probes `volume` at every grid vertex of `plane`.
    #[must_use]
    pub fn sample<P>(plane: PlaneDescriptor, volume: &Volume, probe: &P) -> Self
    where
        P: ScalarProbe + ?Sized,
    {
        let (values, valid): (Vec<f64>, Vec<bool>) = plane
            .grid_points()
            .into_iter()
            .map(|p| probe.probe(volume, p).map_or((0.0, false), |v| (v, true)))
            .unzip();
        Self {
            plane,
            values,
            valid,
        }
    }

    #[must_use]
    pub fn valid_count(&self) -> usize {
        self.valid.iter().filter(|v| **v).count()
    }
}

/// Second output of the slicer: plain geometry, or geometry with samples.
#[derive(Debug, Clone, PartialEq)]
pub enum PlaneOutput {
    Geometry(PlaneDescriptor),
    Probed(ProbedPlane),
}

impl PlaneOutput {
    #[must_use]
    pub const fn plane(&self) -> &PlaneDescriptor {
        match self {
            Self::Geometry(plane) => plane,
            Self::Probed(probed) => &probed.plane,
        }
    }

    #[must_use]
    pub const fn probed(&self) -> Option<&ProbedPlane> {
        match self {
            Self::Geometry(_) => None,
            Self::Probed(probed) => Some(probed),
        }
    }
}
