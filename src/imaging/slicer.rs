//! Curve-driven volume slicer.
//!
//! Each call to [`SplineDrivenSlicer::slice`] computes Frenet frames for a
//! polyline set, picks one point, and resamples the volume on the plane
//! orthogonal to the curve there. Calling it for successive points of a
//! path builds a curved planar reformation in the slicer's [`SliceStack`].
//!
//! # Example
//!
//! ```ignore
//! use cpr_engine::imaging::{SlicerConfig, SplineDrivenSlicer, TargetSelector};
//!
//! let mut slicer = SplineDrivenSlicer::new(SlicerConfig::new().with_extent(64, 64))?;
//! for offset in 0..path.cell(0).map_or(0, <[usize]>::len) {
//!     slicer.slice(&volume, &path, TargetSelector::new(0, offset))?;
//! }
//! let cpr = slicer.stack().to_volume()?;
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use super::plane::{PlaneDescriptor, PlaneOutput, ProbedPlane, ScalarProbe, TrilinearProbe};
use super::reslice::{CubicResampler, ResampleError, ResliceAxes, ResliceError, VolumeResampler};
use super::slice::{ImageSlice, RESLICED_SCALAR_NAME, SliceGeometry, SliceStack};
use super::volume::Volume;
use crate::geom::{
    FrenetDiagnostics, FrenetError, FrenetOptions, FrenetTriad, Point3, PolylineSet,
    compute_frenet_frames,
};

// ============================================================================
// Configuration
// ============================================================================

/// Slicer configuration. Missing fields deserialize to their defaults.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlicerConfig {
    /// Raster size `[Nx, Ny]` in samples.
    pub slice_extent: [usize; 2],
    /// Sample spacing `[sx, sy]` in world units.
    pub slice_spacing: [f64; 2],
    /// Depth of the single-voxel slab, used as the stack's third spacing.
    pub slice_thickness: f64,
    /// View-up rotation (radians) of the first normal of each cell.
    pub incidence: f64,
    /// Transport normals along the path instead of following curvature.
    pub consistent_normals: bool,
    /// Sample the volume on the plane grid instead of returning bare geometry.
    pub probe_input: bool,
}

impl SlicerConfig {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            slice_extent: [15, 15],
            slice_spacing: [1.0, 1.0],
            slice_thickness: 1.0,
            incidence: 0.0,
            consistent_normals: true,
            probe_input: false,
        }
    }

    #[must_use]
    pub const fn with_extent(mut self, nx: usize, ny: usize) -> Self {
        self.slice_extent = [nx, ny];
        self
    }

    #[must_use]
    pub const fn with_spacing(mut self, sx: f64, sy: f64) -> Self {
        self.slice_spacing = [sx, sy];
        self
    }

    #[must_use]
    pub const fn with_thickness(mut self, thickness: f64) -> Self {
        self.slice_thickness = thickness;
        self
    }

    #[must_use]
    pub const fn with_incidence(mut self, incidence: f64) -> Self {
        self.incidence = incidence;
        self
    }

    #[must_use]
    pub const fn with_consistent_normals(mut self, consistent: bool) -> Self {
        self.consistent_normals = consistent;
        self
    }

    #[must_use]
    pub const fn with_probe_input(mut self, probe: bool) -> Self {
        self.probe_input = probe;
        self
    }

    /// # Errors
    /// Returns the first field that is out of range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.slice_extent.contains(&0) {
            return Err(ConfigError::InvalidExtent {
                extent: self.slice_extent,
            });
        }
        let [sx, sy] = self.slice_spacing;
        if !is_positive(sx) || !is_positive(sy) {
            return Err(ConfigError::InvalidSpacing { sx, sy });
        }
        if !is_positive(self.slice_thickness) {
            return Err(ConfigError::InvalidThickness {
                thickness: self.slice_thickness,
            });
        }
        if !self.incidence.is_finite() {
            return Err(ConfigError::InvalidIncidence {
                incidence: self.incidence,
            });
        }
        Ok(())
    }

    #[must_use]
    pub const fn geometry(&self) -> SliceGeometry {
        SliceGeometry {
            extent: self.slice_extent,
            spacing: self.slice_spacing,
            thickness: self.slice_thickness,
        }
    }

    /// Frame options for this configuration; binormals are always requested.
    #[must_use]
    pub const fn frenet_options(&self) -> FrenetOptions {
        FrenetOptions::new()
            .with_consistent_normals(self.consistent_normals)
            .with_binormal(true)
            .with_view_up(self.incidence)
    }
}

impl Default for SlicerConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn is_positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("slice extent must be at least 1x1, got {extent:?}")]
    InvalidExtent { extent: [usize; 2] },

    #[error("slice spacing must be finite and positive, got ({sx}, {sy})")]
    InvalidSpacing { sx: f64, sy: f64 },

    #[error("slice thickness must be finite and positive, got {thickness}")]
    InvalidThickness { thickness: f64 },

    #[error("incidence angle must be finite, got {incidence}")]
    InvalidIncidence { incidence: f64 },
}

/// Which point of which cell to slice at. The offset is clamped to the
/// cell's last point.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetSelector {
    pub cell_index: usize,
    pub point_offset: usize,
}

impl TargetSelector {
    #[must_use]
    pub const fn new(cell_index: usize, point_offset: usize) -> Self {
        Self {
            cell_index,
            point_offset,
        }
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Stage of a slicer invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SliceStage {
    Configuration,
    FrameComputation,
    TargetResolution,
    TransformConstruction,
    Resampling,
}

impl fmt::Display for SliceStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Configuration => "configuration",
            Self::FrameComputation => "frame computation",
            Self::TargetResolution => "target resolution",
            Self::TransformConstruction => "transform construction",
            Self::Resampling => "resampling",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SlicerError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("frame computation failed: {0}")]
    Frames(#[from] FrenetError),

    #[error("cell {cell_index} requested but the polyline set has {cell_count} cells")]
    InvalidCell { cell_index: usize, cell_count: usize },

    #[error("no frame available at point {point}")]
    UnresolvedPoint { point: usize },

    #[error("reslice transform could not be built: {0}")]
    Transform(#[from] ResliceError),

    #[error("resampling failed: {0}")]
    Resample(#[from] ResampleError),
}

impl SlicerError {
    #[must_use]
    pub const fn stage(&self) -> SliceStage {
        match self {
            Self::Config(_) => SliceStage::Configuration,
            Self::Frames(_) => SliceStage::FrameComputation,
            Self::InvalidCell { .. } | Self::UnresolvedPoint { .. } => SliceStage::TargetResolution,
            Self::Transform(_) => SliceStage::TransformConstruction,
            Self::Resample(_) => SliceStage::Resampling,
        }
    }
}

// ============================================================================
// Outputs
// ============================================================================

/// Everything one invocation produces.
#[derive(Debug, Clone, PartialEq)]
pub struct SliceOutput {
    /// Resliced raster, also held as the slicer's current image.
    pub image: ImageSlice,
    pub plane: PlaneOutput,
    pub axes: ResliceAxes,
    /// Index into the polyline point array of the sliced point.
    pub point: usize,
    pub center: Point3,
    pub triad: FrenetTriad,
    pub diagnostics: FrenetDiagnostics,
}

/// Output metadata known before any data is resampled.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutputInformation {
    /// Inclusive extent `[0, Nx−1, 0, Ny−1, 0, 0]`.
    pub whole_extent: [usize; 6],
    /// `(sx, sy, thickness)`.
    pub spacing: [f64; 3],
    pub origin: Point3,
    pub scalar_name: &'static str,
}

// ============================================================================
// Slicer
// ============================================================================

/// Stateful slicer owning the current image and the slice stack.
///
/// The resampler and probe are pluggable; the defaults are
/// [`CubicResampler`] and [`TrilinearProbe`].
#[derive(Debug, Clone)]
pub struct SplineDrivenSlicer<R = CubicResampler, P = TrilinearProbe> {
    config: SlicerConfig,
    resampler: R,
    probe: P,
    current: ImageSlice,
    stack: SliceStack,
}

impl SplineDrivenSlicer {
    /// Slicer with the default cubic resampler and trilinear probe.
    ///
    /// # Errors
    /// Returns [`SlicerError::Config`] if the configuration is invalid.
    pub fn new(config: SlicerConfig) -> Result<Self, SlicerError> {
        Self::with_primitives(config, CubicResampler::new(), TrilinearProbe)
    }
}

impl<R, P> SplineDrivenSlicer<R, P>
where
    R: VolumeResampler,
    P: ScalarProbe,
{
    /// # Errors
    /// Returns [`SlicerError::Config`] if the configuration is invalid.
    pub fn with_primitives(config: SlicerConfig, resampler: R, probe: P) -> Result<Self, SlicerError> {
        config.validate()?;
        Ok(Self {
            config,
            resampler,
            probe,
            current: ImageSlice::empty(),
            stack: SliceStack::new(),
        })
    }

    #[must_use]
    pub const fn config(&self) -> &SlicerConfig {
        &self.config
    }

    /// Most recent resliced image; empty before the first invocation.
    #[must_use]
    pub const fn current_image(&self) -> &ImageSlice {
        &self.current
    }

    #[must_use]
    pub const fn stack(&self) -> &SliceStack {
        &self.stack
    }

    /// Starts a new session: clears the stack and the current image.
    pub fn reset_stack(&mut self) {
        self.stack.clear();
        self.current = ImageSlice::empty();
    }

    #[must_use]
    pub fn output_information(&self) -> OutputInformation {
        let [nx, ny] = self.config.slice_extent;
        let [sx, sy] = self.config.slice_spacing;
        OutputInformation {
            whole_extent: [0, nx.saturating_sub(1), 0, ny.saturating_sub(1), 0, 0],
            spacing: [sx, sy, self.config.slice_thickness],
            origin: Point3::ORIGIN,
            scalar_name: RESLICED_SCALAR_NAME,
        }
    }

    /// Slices `volume` at the point chosen by `selector`.
    ///
    /// On success the previous current image is appended to the stack and
    /// replaced by the new slice, so after `k` calls the stack holds the
    /// initial empty image followed by the first `k − 1` slices.
    ///
    /// # Errors
    /// Returns an error naming the failing stage. The slicer state is left
    /// untouched on error.
    pub fn slice(
        &mut self,
        volume: &Volume,
        polylines: &PolylineSet,
        selector: TargetSelector,
    ) -> Result<SliceOutput, SlicerError> {
        let (frames, diagnostics) = compute_frenet_frames(polylines, self.config.frenet_options())?;
        let (point, center) = resolve_target(polylines, selector)?;
        let triad = frames
            .triad(point)
            .ok_or(SlicerError::UnresolvedPoint { point })?;

        let geometry = self.config.geometry();
        let plane = PlaneDescriptor::from_frame(center, &triad, geometry);
        let plane_output = if self.config.probe_input {
            PlaneOutput::Probed(ProbedPlane::sample(plane, volume, &self.probe))
        } else {
            PlaneOutput::Geometry(plane)
        };

        let axes = ResliceAxes::from_frame(&triad, plane.origin)?;
        let image = self.resampler.reslice(volume, &axes, geometry)?;

        let previous = std::mem::replace(&mut self.current, image.clone());
        self.stack.push(previous);

        log::debug!(
            "slice at cell {} point {point} ({:.3}, {:.3}, {:.3}): {}x{} raster, stack size {}",
            selector.cell_index,
            center.x,
            center.y,
            center.z,
            geometry.extent[0],
            geometry.extent[1],
            self.stack.len()
        );

        Ok(SliceOutput {
            image,
            plane: plane_output,
            axes,
            point,
            center,
            triad,
            diagnostics,
        })
    }

    /// Slices at every point of one cell, in order.
    ///
    /// # Errors
    /// Stops at the first failing invocation; slices taken before it stay on
    /// the stack.
    pub fn sweep(
        &mut self,
        volume: &Volume,
        polylines: &PolylineSet,
        cell_index: usize,
    ) -> Result<Vec<SliceOutput>, SlicerError> {
        let cell = polylines.cell(cell_index).ok_or(SlicerError::InvalidCell {
            cell_index,
            cell_count: polylines.cell_count(),
        })?;
        (0..cell.len())
            .map(|offset| self.slice(volume, polylines, TargetSelector::new(cell_index, offset)))
            .collect()
    }
}

fn resolve_target(
    polylines: &PolylineSet,
    selector: TargetSelector,
) -> Result<(usize, Point3), SlicerError> {
    let cell = polylines
        .cell(selector.cell_index)
        .ok_or(SlicerError::InvalidCell {
            cell_index: selector.cell_index,
            cell_count: polylines.cell_count(),
        })?;
    let offset = selector.point_offset.min(cell.len().saturating_sub(1));
    let point = *cell
        .get(offset)
        .ok_or(SlicerError::UnresolvedPoint { point: offset })?;
    let center = polylines
        .point(point)
        .ok_or(SlicerError::UnresolvedPoint { point })?;
    Ok((point, center))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = SlicerConfig::default();
        assert_eq!(config.slice_extent, [15, 15]);
        assert_eq!(config.slice_spacing, [1.0, 1.0]);
        assert_eq!(config.slice_thickness, 1.0);
        assert_eq!(config.incidence, 0.0);
        assert!(config.consistent_normals);
        assert!(!config.probe_input);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validation_rejects_bad_fields() {
        assert!(matches!(
            SlicerConfig::new().with_extent(0, 4).validate(),
            Err(ConfigError::InvalidExtent { .. })
        ));
        assert!(matches!(
            SlicerConfig::new().with_spacing(1.0, -1.0).validate(),
            Err(ConfigError::InvalidSpacing { .. })
        ));
        assert!(matches!(
            SlicerConfig::new().with_thickness(f64::NAN).validate(),
            Err(ConfigError::InvalidThickness { .. })
        ));
        assert!(matches!(
            SlicerConfig::new().with_incidence(f64::INFINITY).validate(),
            Err(ConfigError::InvalidIncidence { .. })
        ));
    }

    #[test]
    fn construction_reports_configuration_stage() {
        let err = SplineDrivenSlicer::new(SlicerConfig::new().with_spacing(0.0, 1.0)).unwrap_err();
        assert_eq!(err.stage(), SliceStage::Configuration);
        assert_eq!(err.stage().to_string(), "configuration");
    }

    #[test]
    fn output_information_describes_raster() {
        let slicer = SplineDrivenSlicer::new(
            SlicerConfig::new()
                .with_extent(4, 3)
                .with_spacing(0.5, 2.0)
                .with_thickness(1.5),
        )
        .unwrap();
        let info = slicer.output_information();
        assert_eq!(info.whole_extent, [0, 3, 0, 2, 0, 0]);
        assert_eq!(info.spacing, [0.5, 2.0, 1.5]);
        assert_eq!(info.origin, Point3::ORIGIN);
        assert_eq!(info.scalar_name, "ReslicedImage");
    }
}
