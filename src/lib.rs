#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

//! Curved planar reformation: Frenet frames along polylines and a
//! curve-driven volume slicer.
//!
//! [`geom`] holds the vector types, polyline sets and the frame engine.
//! [`imaging`] holds the scalar volume, the reslice transform, the slicer
//! and its slice stack.

pub mod geom;
pub mod imaging;

pub use geom::{FrenetOptions, Point3, PolylineSet, Vec3, compute_frenet_frames};
pub use imaging::{SlicerConfig, SplineDrivenSlicer, TargetSelector, Volume};
