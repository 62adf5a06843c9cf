use std::fmt::Debug;

use crate::types::geometry::{BoundingBox, Vec3};
use crate::utils::math_helper::{tree_index1d, tree_index3d};

use super::GridFloat;

/// Geometry of the coarse lattice of trees and the per-depth refinement resolutions.
///
/// The lattice tiles the dataset bounds uniformly with `(Dx-1)·(Dy-1)·(Dz-1)` trees. At
/// depth `d` each tree resolves `B^d` boxes per axis for a branch factor `B`, giving a
/// virtual global grid of `cells·B^d` boxes per axis.
#[derive(Debug, Clone)]
pub(crate) struct Lattice<T> {
    bounds: BoundingBox<T>,
    cells: [usize; 3],
    branch_factor: usize,
    max_depth: usize,
    resolutions: Vec<usize>,
}

impl<T: GridFloat> Lattice<T> {
    /// Create a new lattice over the given bounds.
    ///
    /// # Arguments
    ///
    /// * `bounds` - The domain to tile.
    /// * `dimensions` - The number of lattice vertices per axis, each at least 2.
    /// * `branch_factor` - Subdivisions per axis and refinement level, at least 2.
    /// * `max_depth` - The deepest refinement level.
    pub fn new(
        bounds: BoundingBox<T>,
        dimensions: [usize; 3],
        branch_factor: usize,
        max_depth: usize,
    ) -> Self {
        let resolutions = (0..=max_depth)
            .map(|depth| branch_factor.pow(depth as u32))
            .collect();
        Self {
            bounds,
            cells: [dimensions[0] - 1, dimensions[1] - 1, dimensions[2] - 1],
            branch_factor,
            max_depth,
            resolutions,
        }
    }

    pub fn bounds(&self) -> &BoundingBox<T> {
        &self.bounds
    }

    /// The number of trees per axis.
    pub fn cells(&self) -> [usize; 3] {
        self.cells
    }

    /// The total number of trees in the lattice.
    pub fn n_trees(&self) -> usize {
        self.cells[0] * self.cells[1] * self.cells[2]
    }

    pub fn branch_factor(&self) -> usize {
        self.branch_factor
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// The number of boxes per axis inside one tree at a depth.
    pub fn resolution(&self, depth: usize) -> usize {
        self.resolutions[depth]
    }

    /// The number of children of a refined node.
    pub fn children_per_node(&self) -> usize {
        self.branch_factor * self.branch_factor * self.branch_factor
    }

    /// The packed index of the tree at a lattice coordinate.
    pub fn tree_index(&self, coords: [usize; 3]) -> usize {
        tree_index1d(coords[0], coords[1], coords[2], self.cells[1], self.cells[2])
    }

    /// The lattice coordinate of a tree from its packed index.
    pub fn tree_coords(&self, index: usize) -> [usize; 3] {
        let (i, j, k) = tree_index3d(index, self.cells[1], self.cells[2]);
        [i, j, k]
    }

    /// The global box index of a position at a depth, per axis.
    ///
    /// Positions are normalized against the bounds and scaled with a `1 - ε` guard so the
    /// maximum corner still maps to the last box.
    pub fn position_index(&self, point: &Vec3<T>, depth: usize) -> [usize; 3] {
        let mut indices = [0; 3];
        for (axis, index) in indices.iter_mut().enumerate() {
            *index = self.axis_index(point.component(axis), axis, depth);
        }
        indices
    }

    /// The inclusive global index range at a depth overlapped by a bounds, per axis.
    pub fn index_range(&self, bounds: &BoundingBox<T>, depth: usize) -> [[usize; 2]; 3] {
        let mut ranges = [[0; 2]; 3];
        for (axis, range) in ranges.iter_mut().enumerate() {
            range[0] = self.axis_index(bounds.min.component(axis), axis, depth);
            range[1] = self.axis_index(bounds.max.component(axis), axis, depth);
        }
        ranges
    }

    fn axis_index(&self, value: T, axis: usize, depth: usize) -> usize {
        let n = self.cells[axis] * self.resolutions[depth];
        let min = self.bounds.min.component(axis);
        let extent = self.bounds.max.component(axis) - min;
        if extent <= T::zero() {
            return 0;
        }
        let guard = T::one() - T::epsilon();
        let scaled = (value - min) / extent * T::from(n).expect("Failed to convert number to T") * guard;
        let index = scaled.floor().to_isize().unwrap_or(0).max(0) as usize;
        index.min(n - 1)
    }

    /// Split a global box index into its tree coordinate and the local coordinate inside
    /// the tree.
    pub fn split(&self, global: [usize; 3], depth: usize) -> ([usize; 3], [usize; 3]) {
        let r = self.resolutions[depth];
        let tree = [global[0] / r, global[1] / r, global[2] / r];
        let local = [global[0] % r, global[1] % r, global[2] % r];
        (tree, local)
    }

    /// The box of a node at a `(tree, depth, local)` position.
    pub fn node_bounds(
        &self,
        tree: [usize; 3],
        depth: usize,
        local: [usize; 3],
    ) -> BoundingBox<T> {
        let r = self.resolutions[depth];
        let mut min = Vec3::origin();
        let mut max = Vec3::origin();
        for axis in 0..3 {
            let extent =
                self.bounds.max.component(axis) - self.bounds.min.component(axis);
            let tree_width = extent / T::from(self.cells[axis]).expect("Failed to convert number to T");
            let box_width = tree_width / T::from(r).expect("Failed to convert number to T");
            let lo = self.bounds.min.component(axis)
                + tree_width * T::from(tree[axis]).expect("Failed to convert number to T")
                + box_width * T::from(local[axis]).expect("Failed to convert number to T");
            set_axis(&mut min, axis, lo);
            set_axis(&mut max, axis, lo + box_width);
        }
        BoundingBox::new(min, max)
    }
}

#[inline]
fn set_axis<T: Copy>(point: &mut Vec3<T>, axis: usize, value: T) {
    match axis {
        0 => point.x = value,
        1 => point.y = value,
        _ => point.z = value,
    }
}
