//! Discrete Frenet frames along polyline cells.
//!
//! Every point referenced by a cell receives an orthonormal triad
//! (tangent, normal, binormal). Tangents come from centered differences,
//! normals either from the discrete second derivative (independent mode) or
//! by transporting the previous normal along the cell (consistent mode).
//!
//! # Example
//!
//! ```ignore
//! use cpr_engine::geom::{FrenetOptions, Point3, PolylineSet, compute_frenet_frames};
//!
//! let path = PolylineSet::from_points(vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(2.0, 1.0, 0.0),
//! ]);
//! let (frames, diag) = compute_frenet_frames(&path, FrenetOptions::default())?;
//! ```

use super::core::{Tolerance, Vec3};
use super::polyline::{PolylineError, PolylineSet};

/// Reference axis for the consistency sign test of transported normals.
const CONSISTENCY_AXIS: Vec3 = Vec3::new(0.0, 0.0, -1.0);

/// Below this length `tangent × X` is too close to zero to serve as a
/// straight-segment normal, and `tangent × Y` is used instead.
const FALLBACK_AXIS_MIN: f64 = 1e-6;

// ============================================================================
// Options, errors, diagnostics
// ============================================================================

/// Options for Frenet frame computation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrenetOptions {
    /// Transport normals along each cell instead of recomputing them per point.
    /// The normals then no longer follow the curvature, but they do not flip.
    pub consistent_normals: bool,
    /// Also produce `tangent × normal` for every point.
    pub compute_binormal: bool,
    /// Rotation (radians) of the first normal of each cell about its tangent.
    /// Only used with `consistent_normals`.
    pub view_up: f64,
}

impl FrenetOptions {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            consistent_normals: true,
            compute_binormal: true,
            view_up: 0.0,
        }
    }

    #[must_use]
    pub const fn with_consistent_normals(mut self, consistent: bool) -> Self {
        self.consistent_normals = consistent;
        self
    }

    #[must_use]
    pub const fn with_binormal(mut self, compute: bool) -> Self {
        self.compute_binormal = compute;
        self
    }

    #[must_use]
    pub const fn with_view_up(mut self, angle: f64) -> Self {
        self.view_up = angle;
        self
    }
}

impl Default for FrenetOptions {
    fn default() -> Self {
        Self::new()
    }
}

/// Errors that can occur while computing frames.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FrenetError {
    /// The polyline set is malformed.
    #[error(transparent)]
    Polyline(#[from] PolylineError),

    /// Neighbouring points coincide, so the tangent difference has no direction.
    #[error("zero-length tangent at point {point} (cell {cell}, position {position})")]
    DegenerateTangent {
        cell: usize,
        position: usize,
        point: usize,
    },
}

/// Diagnostics for frame computation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrenetDiagnostics {
    /// Number of cells processed.
    pub cell_count: usize,
    /// Number of distinct points that received a triad.
    pub computed_point_count: usize,
    /// Points on locally straight segments that used the fixed-axis normal.
    pub straight_fallback_count: usize,
    /// Transported normals negated by the consistency test.
    pub consistency_flip_count: usize,
    /// Points where transport collapsed and the independent normal was used.
    pub transport_fallback_count: usize,
    /// Warnings generated during the operation.
    pub warnings: Vec<String>,
}

// ============================================================================
// Frames
// ============================================================================

/// Orthonormal frame at one point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrenetTriad {
    pub tangent: Vec3,
    pub normal: Vec3,
    pub binormal: Vec3,
}

impl FrenetTriad {
    /// True when all three vectors are unit length and mutually orthogonal.
    #[must_use]
    pub fn is_orthonormal(&self, tol: Tolerance) -> bool {
        let unit = |v: Vec3| tol.approx_eq_f64(v.length(), 1.0);
        unit(self.tangent)
            && unit(self.normal)
            && unit(self.binormal)
            && tol.approx_zero_f64(self.tangent.dot(self.normal))
            && tol.approx_zero_f64(self.normal.dot(self.binormal))
            && tol.approx_zero_f64(self.tangent.dot(self.binormal))
    }
}

/// Per-point frame arrays, indexed like the polyline point array.
///
/// Points not referenced by any cell keep zero vectors and report
/// `is_computed(i) == false`.
#[derive(Debug, Clone, PartialEq)]
pub struct FrenetFrames {
    tangents: Vec<Vec3>,
    normals: Vec<Vec3>,
    binormals: Option<Vec<Vec3>>,
    computed: Vec<bool>,
}

impl FrenetFrames {
    fn zeroed(point_count: usize, with_binormals: bool) -> Self {
        Self {
            tangents: vec![Vec3::ZERO; point_count],
            normals: vec![Vec3::ZERO; point_count],
            binormals: with_binormals.then(|| vec![Vec3::ZERO; point_count]),
            computed: vec![false; point_count],
        }
    }

    fn store(&mut self, point: usize, tangent: Vec3, normal: Vec3) {
        self.tangents[point] = tangent;
        self.normals[point] = normal;
        if let Some(binormals) = self.binormals.as_mut() {
            binormals[point] = tangent.cross(normal);
        }
        self.computed[point] = true;
    }

    #[must_use]
    pub fn tangents(&self) -> &[Vec3] {
        &self.tangents
    }

    #[must_use]
    pub fn normals(&self) -> &[Vec3] {
        &self.normals
    }

    /// Binormals, present only when requested in [`FrenetOptions`].
    #[must_use]
    pub fn binormals(&self) -> Option<&[Vec3]> {
        self.binormals.as_deref()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tangents.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tangents.is_empty()
    }

    #[must_use]
    pub fn is_computed(&self, point: usize) -> bool {
        self.computed.get(point).copied().unwrap_or(false)
    }

    /// Triad at `point`, or `None` if no cell references it.
    ///
    /// The binormal is read from the stored array when present and derived
    /// as `tangent × normal` otherwise.
    #[must_use]
    pub fn triad(&self, point: usize) -> Option<FrenetTriad> {
        if !self.is_computed(point) {
            return None;
        }
        let tangent = self.tangents[point];
        let normal = self.normals[point];
        let binormal = self
            .binormals
            .as_ref()
            .map_or_else(|| tangent.cross(normal), |b| b[point]);
        Some(FrenetTriad {
            tangent,
            normal,
            binormal,
        })
    }
}

// ============================================================================
// Computation
// ============================================================================

/// Computes frames for every cell with the default tolerance.
///
/// # Errors
/// See [`compute_frenet_frames_with_tolerance`].
pub fn compute_frenet_frames(
    polylines: &PolylineSet,
    options: FrenetOptions,
) -> Result<(FrenetFrames, FrenetDiagnostics), FrenetError> {
    compute_frenet_frames_with_tolerance(polylines, options, Tolerance::default_geom())
}

/// Computes tangent, normal and (optionally) binormal arrays for a polyline set.
///
/// Cells are processed in order; a point shared by several cells keeps the
/// triad of the last cell that visits it. Within a cell, tangents and normals
/// are computed from the cell's own point sequence, so a closed loop that
/// repeats its first index does not feed its closing tangent back into its
/// opening normal.
///
/// `tol` decides when a curvature or transported normal is too short to
/// use. Tangent degeneracy is exact: only coincident neighbours fail.
///
/// # Errors
/// Returns an error if the polyline set is malformed (short cell, bad index,
/// non-finite point) or if a tangent difference has zero length.
pub fn compute_frenet_frames_with_tolerance(
    polylines: &PolylineSet,
    options: FrenetOptions,
    tol: Tolerance,
) -> Result<(FrenetFrames, FrenetDiagnostics), FrenetError> {
    polylines.validate()?;

    let mut frames = FrenetFrames::zeroed(polylines.point_count(), options.compute_binormal);
    let mut diagnostics = FrenetDiagnostics {
        cell_count: polylines.cell_count(),
        ..Default::default()
    };

    for (cell_index, cell) in polylines.cells().iter().enumerate() {
        let tangents = cell_tangents(polylines, cell_index, cell)?;
        let normals = if options.consistent_normals {
            consistent_normals(&tangents, options.view_up, tol, &mut diagnostics)
        } else {
            (0..tangents.len())
                .map(|position| independent_normal(&tangents, position, tol, &mut diagnostics))
                .collect()
        };

        for ((&point, &tangent), &normal) in cell.iter().zip(&tangents).zip(&normals) {
            frames.store(point, tangent, normal);
        }
    }

    diagnostics.computed_point_count = frames.computed.iter().filter(|c| **c).count();
    if diagnostics.transport_fallback_count > 0 {
        let message = format!(
            "{} transported normals collapsed onto the tangent; recomputed from curvature",
            diagnostics.transport_fallback_count
        );
        log::warn!("{message}");
        diagnostics.warnings.push(message);
    }
    log::debug!(
        "frenet frames: {} cells, {} points, {} straight fallbacks",
        diagnostics.cell_count,
        diagnostics.computed_point_count,
        diagnostics.straight_fallback_count
    );

    Ok((frames, diagnostics))
}

/// Unit tangents for one cell, by position within the cell.
///
/// The difference is `previous − next`, halved and negated, so tangents run
/// from earlier to later points. Endpoints use their single neighbour.
/// Only coincident neighbours are degenerate; the result does not depend on
/// the scale of the coordinates.
fn cell_tangents(
    polylines: &PolylineSet,
    cell_index: usize,
    cell: &[usize],
) -> Result<Vec<Vec3>, FrenetError> {
    let points = polylines.points();
    let last = cell.len() - 1;

    (0..cell.len())
        .map(|position| {
            let previous = points[cell[position.saturating_sub(1)]];
            let next = points[cell[(position + 1).min(last)]];
            let difference = previous.sub_point(next).mul_scalar(0.5).neg();

            unit_direction(difference).ok_or(FrenetError::DegenerateTangent {
                cell: cell_index,
                position,
                point: cell[position],
            })
        })
        .collect()
}

/// Direction of `v`, `None` only when `v` is exactly zero or non-finite.
///
/// Scaling by the largest component first keeps tiny but distinct
/// differences from underflowing to zero length.
fn unit_direction(v: Vec3) -> Option<Vec3> {
    let scale = v.x.abs().max(v.y.abs()).max(v.z.abs());
    if !scale.is_finite() || scale <= 0.0 {
        return None;
    }
    (v / scale).normalized()
}

/// Normal from the discrete second derivative `tangent[next] − tangent[previous]`,
/// with endpoints clamped to the point itself.
fn independent_normal(
    tangents: &[Vec3],
    position: usize,
    tol: Tolerance,
    diagnostics: &mut FrenetDiagnostics,
) -> Vec3 {
    let last = tangents.len() - 1;
    let tangent = tangents[position];
    let curvature = tangents[(position + 1).min(last)].sub(tangents[position.saturating_sub(1)]);

    perpendicular_unit(curvature, tangent, tol).unwrap_or_else(|| {
        diagnostics.straight_fallback_count += 1;
        log::trace!("straight segment at cell position {position}; using fixed-axis normal");
        straight_segment_normal(tangent)
    })
}

/// Consistent normals for one cell as a left fold carrying the previous normal.
fn consistent_normals(
    tangents: &[Vec3],
    view_up: f64,
    tol: Tolerance,
    diagnostics: &mut FrenetDiagnostics,
) -> Vec<Vec3> {
    let first_tangent = tangents[0];
    let initial = independent_normal(tangents, 0, tol, diagnostics);
    let initial = orient_against_axis(initial, first_tangent, diagnostics);
    let first = perpendicular_unit(initial.rotated_about(first_tangent, view_up), first_tangent, tol)
        .unwrap_or(initial);

    let mut normals = Vec::with_capacity(tangents.len());
    normals.push(first);

    tangents
        .iter()
        .enumerate()
        .skip(1)
        .fold(first, |previous, (position, &tangent)| {
            let normal = transport_normal(tangents, position, tangent, previous, tol, diagnostics);
            normals.push(normal);
            normal
        });

    normals
}

/// Projects the previous normal onto the plane orthogonal to `tangent` via
/// `tangent × (previous × tangent)`, then applies the sign test of
/// [`orient_against_axis`].
fn transport_normal(
    tangents: &[Vec3],
    position: usize,
    tangent: Vec3,
    previous: Vec3,
    tol: Tolerance,
    diagnostics: &mut FrenetDiagnostics,
) -> Vec3 {
    let projected = tangent.cross(previous.cross(tangent));
    let candidate = perpendicular_unit(projected, tangent, tol).unwrap_or_else(|| {
        diagnostics.transport_fallback_count += 1;
        independent_normal(tangents, position, tol, diagnostics)
    });

    orient_against_axis(candidate, tangent, diagnostics)
}

/// Negates `normal` when `(normal × tangent) · (0, 0, −1) < 0`.
///
/// Applied to the seed normal of a cell as well as to every transported
/// normal, so a cell starts in the same orientation its fold maintains.
/// Testing only transported normals would let a clockwise planar arc flip
/// between its first and second points, since the fold orients every normal
/// after the seed and the curvature seed of such an arc points the other way.
fn orient_against_axis(normal: Vec3, tangent: Vec3, diagnostics: &mut FrenetDiagnostics) -> Vec3 {
    if normal.cross(tangent).dot(CONSISTENCY_AXIS) < 0.0 {
        diagnostics.consistency_flip_count += 1;
        normal.neg()
    } else {
        normal
    }
}

/// Any unit vector orthogonal to `tangent`: `tangent × X`, or `tangent × Y`
/// when the tangent runs along X.
fn straight_segment_normal(tangent: Vec3) -> Vec3 {
    let along_x = tangent.cross(Vec3::X);
    let axis = if along_x.length() < FALLBACK_AXIS_MIN {
        tangent.cross(Vec3::Y)
    } else {
        along_x
    };
    axis.normalized().unwrap_or(Vec3::Z)
}

/// Component of `v` orthogonal to the unit `tangent`, normalized.
///
/// Returns `None` when that component is shorter than `tol`. The projection
/// runs twice so the result stays orthogonal even when `v` was nearly
/// parallel to the tangent.
fn perpendicular_unit(v: Vec3, tangent: Vec3, tol: Tolerance) -> Option<Vec3> {
    let projected = v.sub(tangent.mul_scalar(v.dot(tangent)));
    if tol.is_zero_vec3(projected) {
        return None;
    }
    let unit = projected.normalized()?;
    unit.sub(tangent.mul_scalar(unit.dot(tangent))).normalized()
}
