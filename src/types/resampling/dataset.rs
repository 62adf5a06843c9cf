use std::fmt::Debug;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::types::geometry::{BoundingBox, Cell, Vec3};

use super::ResampleError;

/// Association of the scalar attribute with the dataset topology.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldAssociation {
    /// One value per point.
    Points,
    /// One value per cell.
    Cells,
}

/// Contract for datasets that can be resampled onto a hyper tree grid.
///
/// A dataset exposes its bounds, its samples and the single scalar attribute driving the
/// refinement. Point-associated datasets may still carry cells, which are then used for
/// geometry analysis only.
pub trait ScalarDataset<T> {
    /// The axis-aligned bounds of the dataset.
    fn bounds(&self) -> BoundingBox<T>;

    /// The association of the scalar attribute.
    fn association(&self) -> FieldAssociation;

    /// The number of points in the dataset.
    fn n_points(&self) -> usize;

    /// The position of a point.
    fn point(&self, index: usize) -> Vec3<T>;

    /// The scalar value carried by a point.
    fn point_value(&self, index: usize) -> T;

    /// The number of cells in the dataset.
    fn n_cells(&self) -> usize;

    /// A cell of the dataset.
    fn cell(&self, index: usize) -> &Cell<T>;

    /// The scalar value carried by a cell.
    fn cell_value(&self, index: usize) -> T;
}

/// Simple in-memory dataset carrying one scalar attribute.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone)]
pub struct UnstructuredData<T> {
    points: Vec<Vec3<T>>,
    point_values: Vec<T>,
    cells: Vec<Cell<T>>,
    cell_values: Vec<T>,
    association: FieldAssociation,
    bounds: Option<BoundingBox<T>>,
}

impl<T: num_traits::Float> UnstructuredData<T> {
    /// Create a dataset from points with one value per point.
    ///
    /// # Arguments
    ///
    /// * `points` - The sample positions.
    /// * `values` - One scalar value per point.
    pub fn from_points(points: Vec<Vec3<T>>, values: Vec<T>) -> Result<Self, ResampleError> {
        if points.len() != values.len() {
            return Err(ResampleError::MismatchedValues {
                samples: points.len(),
                values: values.len(),
            });
        }
        Ok(Self {
            points,
            point_values: values,
            cells: Vec::new(),
            cell_values: Vec::new(),
            association: FieldAssociation::Points,
            bounds: None,
        })
    }

    /// Create a dataset from cells with one value per cell.
    ///
    /// # Arguments
    ///
    /// * `cells` - The sample cells.
    /// * `values` - One scalar value per cell.
    pub fn from_cells(cells: Vec<Cell<T>>, values: Vec<T>) -> Result<Self, ResampleError> {
        if cells.len() != values.len() {
            return Err(ResampleError::MismatchedValues {
                samples: cells.len(),
                values: values.len(),
            });
        }
        Ok(Self {
            points: Vec::new(),
            point_values: Vec::new(),
            cells,
            cell_values: values,
            association: FieldAssociation::Cells,
            bounds: None,
        })
    }

    /// Attach cells carrying no values of their own, e.g. for geometry analysis of a
    /// point-associated dataset. Returns self for chaining.
    ///
    /// # Arguments
    ///
    /// * `cells` - The cells to attach.
    pub fn with_cells(mut self, cells: Vec<Cell<T>>) -> Self {
        self.cells = cells;
        self
    }

    /// Override the computed bounds, e.g. to resample onto a larger domain.
    /// Returns self for chaining.
    ///
    /// # Arguments
    ///
    /// * `bounds` - The bounds to use.
    pub fn with_bounds(mut self, bounds: BoundingBox<T>) -> Self {
        self.bounds = Some(bounds);
        self
    }
}

impl<T: num_traits::Float> ScalarDataset<T> for UnstructuredData<T> {
    fn bounds(&self) -> BoundingBox<T> {
        if let Some(bounds) = self.bounds {
            return bounds;
        }

        let mut combined: Option<BoundingBox<T>> = None;
        for point in self.points.iter() {
            let bounds = BoundingBox::new(*point, *point);
            combined = Some(match combined {
                Some(existing) => existing.union(&bounds),
                None => bounds,
            });
        }
        for cell in self.cells.iter() {
            let bounds = cell.bounds();
            combined = Some(match combined {
                Some(existing) => existing.union(&bounds),
                None => bounds,
            });
        }

        combined.unwrap_or_else(BoundingBox::zero)
    }

    fn association(&self) -> FieldAssociation {
        self.association
    }

    fn n_points(&self) -> usize {
        self.points.len()
    }

    fn point(&self, index: usize) -> Vec3<T> {
        self.points[index]
    }

    fn point_value(&self, index: usize) -> T {
        self.point_values[index]
    }

    fn n_cells(&self) -> usize {
        self.cells.len()
    }

    fn cell(&self, index: usize) -> &Cell<T> {
        &self.cells[index]
    }

    fn cell_value(&self, index: usize) -> T {
        self.cell_values[index]
    }
}
