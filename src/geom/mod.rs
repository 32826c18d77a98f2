mod core;
mod frenet;
mod polyline;

pub use self::core::{BBox, Point3, Tolerance, Vec3};
pub use frenet::{
    FrenetDiagnostics, FrenetError, FrenetFrames, FrenetOptions, FrenetTriad,
    compute_frenet_frames, compute_frenet_frames_with_tolerance,
};
pub use polyline::{PolylineError, PolylineSet};

#[cfg(test)]
mod tests;
