use std::fmt::Debug;

use hashbrown::HashMap;

use crate::types::geometry::{polyhedron_box_volume, voxel_box_volume, Cell, Vec3};
use crate::utils::math_helper::{local_index1d, local_index3d};

use super::grid_element::GridElement;
use super::lattice::Lattice;
use super::measurement::MeasurementSet;
use super::{Accumulator, GridFloat};

/// The sparse multi-resolution grid of aggregated sample data.
///
/// For each tree of the coarse lattice the grid keeps one sparse map per depth, from the
/// packed local index to the aggregated element. Positions without samples have no entry.
#[derive(Debug)]
pub(crate) struct MultiResGrid<T> {
    lattice: Lattice<T>,
    trees: HashMap<usize, Vec<HashMap<usize, GridElement<T>>>>,
}

impl<T: GridFloat> MultiResGrid<T> {
    /// Create an empty grid over a lattice.
    pub fn new(lattice: Lattice<T>) -> Self {
        Self {
            lattice,
            trees: HashMap::new(),
        }
    }

    pub fn lattice(&self) -> &Lattice<T> {
        &self.lattice
    }

    /// The total number of elements over all trees and depths.
    pub fn n_elements(&self) -> usize {
        self.trees
            .values()
            .flat_map(|maps| maps.iter())
            .map(|map| map.len())
            .sum()
    }

    /// The per-depth maps of a tree, if any of its positions received samples.
    pub fn tree(&self, tree: usize) -> Option<&[HashMap<usize, GridElement<T>>]> {
        self.trees.get(&tree).map(|maps| maps.as_slice())
    }

    /// Release a tree's maps once its data has been consumed.
    pub fn release_tree(&mut self, tree: usize) {
        self.trees.remove(&tree);
    }

    /// The element at a `(tree, depth, local)` position, if present.
    pub fn element(&self, tree: usize, depth: usize, local: usize) -> Option<&GridElement<T>> {
        self.trees.get(&tree).and_then(|maps| maps[depth].get(&local))
    }

    /// Mutable access to the element at a `(tree, depth, local)` position.
    pub fn element_mut(
        &mut self,
        tree: usize,
        depth: usize,
        local: usize,
    ) -> Option<&mut GridElement<T>> {
        self.trees
            .get_mut(&tree)
            .and_then(|maps| maps[depth].get_mut(&local))
    }

    /// Insert an empty marker element at a `(tree, depth, local)` position.
    pub fn insert_empty(
        &mut self,
        tree: usize,
        depth: usize,
        local: usize,
        prototypes: &[Accumulator<T>],
    ) {
        let max_depth = self.lattice.max_depth();
        let maps = self
            .trees
            .entry(tree)
            .or_insert_with(|| vec![HashMap::new(); max_depth + 1]);
        maps[depth]
            .entry(local)
            .or_insert_with(|| GridElement::empty(prototypes));
    }

    /// Bin a point sample into the finest depth.
    ///
    /// # Arguments
    ///
    /// * `point` - The sample position.
    /// * `value` - The sample value.
    /// * `prototypes` - Accumulator prototypes for new elements.
    pub fn insert_point(&mut self, point: &Vec3<T>, value: T, prototypes: &[Accumulator<T>]) {
        let depth = self.lattice.max_depth();
        let resolution = self.lattice.resolution(depth);
        let global = self.lattice.position_index(point, depth);
        let (tree_coords, local_coords) = self.lattice.split(global, depth);
        let tree = self.lattice.tree_index(tree_coords);
        let local = local_index1d(local_coords[0], local_coords[1], local_coords[2], resolution);

        let maps = self
            .trees
            .entry(tree)
            .or_insert_with(|| vec![HashMap::new(); depth + 1]);
        maps[depth]
            .entry(local)
            .and_modify(|element| element.add_sample(value, T::one()))
            .or_insert_with(|| GridElement::from_sample(value, T::one(), prototypes));
    }

    /// Bin a cell sample, weighted by its volume of overlap with each grid box.
    ///
    /// The cell lands at the shallowest depth at which its bounds span at least two boxes
    /// in every axis, so small cells neither explode into the finest boxes nor drown at
    /// the root.
    ///
    /// # Arguments
    ///
    /// * `cell` - The sample cell.
    /// * `value` - The sample value.
    /// * `prototypes` - Accumulator prototypes for new elements.
    ///
    /// # Returns
    ///
    /// `true` if the cell contributed to at least one position.
    pub fn insert_cell(
        &mut self,
        cell: &Cell<T>,
        value: T,
        prototypes: &[Accumulator<T>],
    ) -> bool {
        let cell_bounds = cell.bounds();
        if !cell_bounds.intersects(self.lattice.bounds()) {
            return false;
        }

        let max_depth = self.lattice.max_depth();
        let mut depth = 0;
        while depth < max_depth {
            let ranges = self.lattice.index_range(&cell_bounds, depth);
            if ranges.iter().all(|range| range[0] < range[1]) {
                break;
            }
            depth += 1;
        }

        let resolution = self.lattice.resolution(depth);
        let ranges = self.lattice.index_range(&cell_bounds, depth);
        let mut any = false;
        for i in ranges[0][0]..=ranges[0][1] {
            for j in ranges[1][0]..=ranges[1][1] {
                for k in ranges[2][0]..=ranges[2][1] {
                    let (tree_coords, local_coords) = self.lattice.split([i, j, k], depth);
                    let bounds = self.lattice.node_bounds(tree_coords, depth, local_coords);
                    let (non_zero, volume) = match cell {
                        Cell::Voxel(voxel) => voxel_box_volume(&bounds, voxel),
                        Cell::Polyhedron(polyhedron) => polyhedron_box_volume(&bounds, polyhedron),
                    };
                    if !non_zero {
                        continue;
                    }

                    let tree = self.lattice.tree_index(tree_coords);
                    let local = local_index1d(
                        local_coords[0],
                        local_coords[1],
                        local_coords[2],
                        resolution,
                    );
                    let maps = self
                        .trees
                        .entry(tree)
                        .or_insert_with(|| vec![HashMap::new(); max_depth + 1]);
                    maps[depth]
                        .entry(local)
                        .and_modify(|element| element.add_sample(value, volume))
                        .or_insert_with(|| GridElement::from_sample(value, volume, prototypes));
                    any = true;
                }
            }
        }

        any
    }

    /// Propagate the sparse elements bottom-up from the finest depth to the root.
    ///
    /// Parents aggregate their children's counts, weights and accumulators, and learn
    /// whether subdividing them is legal under the configured policies.
    ///
    /// # Arguments
    ///
    /// * `min_points` - Minimum number of samples a child needs to allow subdivision.
    /// * `measurements` - The configured measurements, gating subdivision on feasibility.
    pub fn propagate(&mut self, min_points: u64, measurements: &MeasurementSet) {
        let max_depth = self.lattice.max_depth();
        let branch_factor = self.lattice.branch_factor();
        let n_children = self.lattice.children_per_node();

        for maps in self.trees.values_mut() {
            for depth in (1..=max_depth).rev() {
                let resolution = branch_factor.pow(depth as u32);
                let parent_resolution = resolution / branch_factor;
                let (lower, upper) = maps.split_at_mut(depth);
                let parent_map = &mut lower[depth - 1];
                let child_map = &upper[0];

                for (&local, child) in child_map.iter() {
                    let (i, j, k) = local_index3d(local, resolution);
                    let parent_local = local_index1d(
                        i / branch_factor,
                        j / branch_factor,
                        k / branch_factor,
                        parent_resolution,
                    );

                    let legal = child.n_points >= min_points
                        && measurements.can_measure(child.n_points, child.weight);
                    // An element without recorded children is a data leaf of the sparse
                    // grid, nothing below it can be masked.
                    let complete = child.children_fully_populated
                        && (child.n_unmasked_children == n_children
                            || child.n_unmasked_children == 0);

                    parent_map
                        .entry(parent_local)
                        .and_modify(|parent| parent.absorb_child(child, legal, complete))
                        .or_insert_with(|| GridElement::from_child(child, legal, complete));
                }
            }
        }
    }
}
