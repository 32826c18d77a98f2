//! Scalar interpolation kernels over a [`Volume`].
//!
//! Both kernels take continuous *index* coordinates and return `None` for
//! samples outside the voxel grid. Samples within `EDGE_SLACK` of the grid
//! boundary are snapped onto it so that slices lying exactly on a face of the
//! volume are not lost to rounding.

use super::volume::Volume;

const EDGE_SLACK: f64 = 1e-6;

/// Catmull-Rom tricubic interpolation.
///
/// Neighbours beyond the grid are linearly extrapolated from the two nearest
/// voxels, so data that is linear along an axis is reproduced exactly up to
/// the boundary.
#[must_use]
#[allow(clippy::cast_possible_wrap)]
pub fn cubic_at(volume: &Volume, index: [f64; 3]) -> Option<f64> {
    let [nx, ny, nz] = volume.dimensions();
    let (ix, tx) = cell_coordinate(index[0], nx)?;
    let (iy, ty) = cell_coordinate(index[1], ny)?;
    let (iz, tz) = cell_coordinate(index[2], nz)?;

    let mut planes = [None; 4];
    for (dz, plane) in planes.iter_mut().enumerate() {
        let k = iz + dz as isize - 1;
        if !in_range(k, nz) {
            continue;
        }
        let mut rows = [None; 4];
        for (dy, row) in rows.iter_mut().enumerate() {
            let j = iy + dy as isize - 1;
            if !in_range(j, ny) {
                continue;
            }
            let mut samples = [None; 4];
            for (dx, sample) in samples.iter_mut().enumerate() {
                let i = ix + dx as isize - 1;
                if in_range(i, nx) {
                    *sample = Some(volume.value_clamped(i, j, k));
                }
            }
            *row = catmull_rom(samples, tx);
        }
        *plane = catmull_rom(rows, ty);
    }
    catmull_rom(planes, tz)
}

/// Trilinear interpolation.
#[must_use]
pub fn trilinear_at(volume: &Volume, index: [f64; 3]) -> Option<f64> {
    let [nx, ny, nz] = volume.dimensions();
    let (ix, tx) = cell_coordinate(index[0], nx)?;
    let (iy, ty) = cell_coordinate(index[1], ny)?;
    let (iz, tz) = cell_coordinate(index[2], nz)?;

    let v = |di: isize, dj: isize, dk: isize| volume.value_clamped(ix + di, iy + dj, iz + dk);
    let lerp = |a: f64, b: f64, t: f64| a + (b - a) * t;

    let c00 = lerp(v(0, 0, 0), v(1, 0, 0), tx);
    let c10 = lerp(v(0, 1, 0), v(1, 1, 0), tx);
    let c01 = lerp(v(0, 0, 1), v(1, 0, 1), tx);
    let c11 = lerp(v(0, 1, 1), v(1, 1, 1), tx);
    let c0 = lerp(c00, c10, ty);
    let c1 = lerp(c01, c11, ty);
    Some(lerp(c0, c1, tz))
}

/// Splits a continuous index into a base voxel and a fraction in `[0, 1]`.
///
/// The base is kept at most `n − 2` so both `base` and `base + 1` exist
/// whenever the axis has two or more voxels.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_precision_loss
)]
fn cell_coordinate(x: f64, n: usize) -> Option<(isize, f64)> {
    let upper = (n - 1) as f64;
    if !x.is_finite() || x < -EDGE_SLACK || x > upper + EDGE_SLACK {
        return None;
    }
    if n == 1 {
        return Some((0, 0.0));
    }
    let x = x.clamp(0.0, upper);
    let base = x.floor().min(upper - 1.0);
    Some((base as isize, x - base))
}

#[allow(clippy::cast_possible_wrap)]
fn in_range(i: isize, n: usize) -> bool {
    i >= 0 && i < n as isize
}

/// One-dimensional Catmull-Rom interpolation between `s[1]` and `s[2]`.
///
/// Missing outer samples are extrapolated linearly; a missing `s[2]` (single
/// voxel axis) repeats `s[1]`.
fn catmull_rom(s: [Option<f64>; 4], t: f64) -> Option<f64> {
    let p0 = s[1]?;
    let p1 = s[2].unwrap_or(p0);
    let pm = s[0].unwrap_or(2.0 * p0 - p1);
    let p2 = s[3].unwrap_or(2.0 * p1 - p0);

    let t2 = t * t;
    let t3 = t2 * t;
    let wm = 0.5 * (-t3 + 2.0 * t2 - t);
    let w0 = 0.5 * (3.0 * t3 - 5.0 * t2 + 2.0);
    let w1 = 0.5 * (-3.0 * t3 + 4.0 * t2 + t);
    let w2 = 0.5 * (t3 - t2);
    Some(wm * pm + w0 * p0 + w1 * p1 + w2 * p2)
}
