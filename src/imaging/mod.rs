//! Volume data and the curve-driven slicer built on top of it.

mod interpolate;
mod plane;
mod reslice;
mod slice;
mod slicer;
mod volume;

pub use interpolate::{cubic_at, trilinear_at};
pub use plane::{PlaneDescriptor, PlaneOutput, ProbedPlane, ScalarProbe, TrilinearProbe};
pub use reslice::{
    CubicResampler, ResampleError, ResliceAxes, ResliceError, VolumeResampler, place_slice_origin,
};
pub use slice::{ImageSlice, RESLICED_SCALAR_NAME, SliceGeometry, SliceStack, SliceStackError};
pub use slicer::{
    ConfigError, OutputInformation, SliceOutput, SliceStage, SlicerConfig, SlicerError,
    SplineDrivenSlicer, TargetSelector,
};
pub use volume::{DEFAULT_SCALAR_NAME, Volume, VolumeError};

#[cfg(test)]
mod tests;
