//! Polyline sets: a shared point array plus cells of point indices.
//!
//! A cell is one polyline. Cells may share points (closed loops repeat their
//! first index at the end, branching paths share a junction).

use super::core::Point3;

/// Errors reported when a polyline set violates its structural invariants.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PolylineError {
    /// A cell references a point index outside the point array.
    #[error("cell {cell} references point {index}, but only {point_count} points exist")]
    IndexOutOfRange {
        cell: usize,
        index: usize,
        point_count: usize,
    },

    /// A cell is too short to define a tangent.
    #[error("cell {cell} must have at least 2 points, got {count}")]
    InsufficientPoints { cell: usize, count: usize },

    /// A referenced point has non-finite coordinates.
    #[error("point {index} has non-finite coordinates")]
    NonFinitePoint { index: usize },
}

/// Ordered collection of polyline cells over a shared point array.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PolylineSet {
    points: Vec<Point3>,
    cells: Vec<Vec<usize>>,
}

impl PolylineSet {
    #[must_use]
    pub fn new(points: Vec<Point3>, cells: Vec<Vec<usize>>) -> Self {
        Self { points, cells }
    }

    /// A set with a single cell visiting every point in order.
    #[must_use]
    pub fn from_points(points: Vec<Point3>) -> Self {
        let cell = (0..points.len()).collect();
        Self {
            points,
            cells: vec![cell],
        }
    }

    /// Appends a cell and returns its index.
    pub fn push_cell(&mut self, cell: Vec<usize>) -> usize {
        self.cells.push(cell);
        self.cells.len() - 1
    }

    #[must_use]
    pub fn points(&self) -> &[Point3] {
        &self.points
    }

    #[must_use]
    pub fn cells(&self) -> &[Vec<usize>] {
        &self.cells
    }

    #[must_use]
    pub fn point_count(&self) -> usize {
        self.points.len()
    }

    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    #[must_use]
    pub fn cell(&self, index: usize) -> Option<&[usize]> {
        self.cells.get(index).map(Vec::as_slice)
    }

    #[must_use]
    pub fn point(&self, index: usize) -> Option<Point3> {
        self.points.get(index).copied()
    }

    /// Checks every cell: at least two points, all indices valid, all
    /// referenced coordinates finite.
    ///
    /// # Errors
    /// Returns the first violated invariant, scanning cells in order.
    pub fn validate(&self) -> Result<(), PolylineError> {
        let point_count = self.points.len();
        for (cell_index, cell) in self.cells.iter().enumerate() {
            if cell.len() < 2 {
                return Err(PolylineError::InsufficientPoints {
                    cell: cell_index,
                    count: cell.len(),
                });
            }
            for &index in cell {
                let Some(point) = self.points.get(index) else {
                    return Err(PolylineError::IndexOutOfRange {
                        cell: cell_index,
                        index,
                        point_count,
                    });
                };
                if !point.is_finite() {
                    return Err(PolylineError::NonFinitePoint { index });
                }
            }
        }
        Ok(())
    }
}
