use std::fmt::Debug;

use crate::types::geometry::{BoundingBox, Cell};
use crate::utils::math_helper::local_index1d;

use super::lattice::Lattice;
use super::multi_res_grid::MultiResGrid;
use super::{Accumulator, GridFloat, ScalarDataset};

/// Walk the input cells against the sparse grid to handle the empty regions their
/// geometry passes through.
///
/// In forbid mode, a node whose recursion discovers an empty descendant with the cell
/// geometry inside loses its right to subdivide, so the region stays a single leaf with a
/// defined value instead of leaving a hole. In mark mode such descendants are created as
/// empty elements, to be filled by extrapolation after emission.
pub(crate) fn analyze_cells<T: GridFloat, D: ScalarDataset<T>>(
    grid: &mut MultiResGrid<T>,
    dataset: &D,
    mark_empty: bool,
    forbid_empty: bool,
    prototypes: &[Accumulator<T>],
) {
    let lattice = grid.lattice().clone();

    for index in 0..dataset.n_cells() {
        let cell = dataset.cell(index);
        let cell_bounds = cell.bounds();
        if !cell_bounds.intersects(lattice.bounds()) {
            continue;
        }

        // At depth 0 the global index ranges enumerate the overlapping trees directly.
        let ranges = lattice.index_range(&cell_bounds, 0);
        for i in ranges[0][0]..=ranges[0][1] {
            for j in ranges[1][0]..=ranges[1][1] {
                for k in ranges[2][0]..=ranges[2][1] {
                    analyze_node(
                        grid,
                        &lattice,
                        cell,
                        &cell_bounds,
                        [i, j, k],
                        0,
                        [0, 0, 0],
                        mark_empty,
                        forbid_empty,
                        prototypes,
                    );
                }
            }
        }
    }
}

/// Recursive descent of one tree against one cell.
///
/// Returns whether the region below this position is safe to refine over, i.e. holds
/// data or is not actually reached by the cell geometry.
#[allow(clippy::too_many_arguments)]
fn analyze_node<T: GridFloat>(
    grid: &mut MultiResGrid<T>,
    lattice: &Lattice<T>,
    cell: &Cell<T>,
    cell_bounds: &BoundingBox<T>,
    tree_coords: [usize; 3],
    depth: usize,
    local_coords: [usize; 3],
    mark_empty: bool,
    forbid_empty: bool,
    prototypes: &[Accumulator<T>],
) -> bool {
    let tree = lattice.tree_index(tree_coords);
    let resolution = lattice.resolution(depth);
    let local = local_index1d(local_coords[0], local_coords[1], local_coords[2], resolution);

    let (can_subdivide, complete) = match grid.element(tree, depth, local) {
        Some(element) => (
            element.can_subdivide,
            element.n_unmasked_children == lattice.children_per_node()
                && element.children_fully_populated,
        ),
        None => {
            // No data here. Probe whether the cell geometry actually reaches this box.
            let bounds = lattice.node_bounds(tree_coords, depth, local_coords);
            let inside = cell.contains(&bounds.centroid());
            if mark_empty && inside {
                grid.insert_empty(tree, depth, local, prototypes);
            }
            return !inside;
        }
    };

    if depth == lattice.max_depth() || !can_subdivide || complete {
        return true;
    }

    let branch_factor = lattice.branch_factor();
    let mut children_safe = true;
    for c in 0..branch_factor {
        for b in 0..branch_factor {
            for a in 0..branch_factor {
                let child_coords = [
                    local_coords[0] * branch_factor + a,
                    local_coords[1] * branch_factor + b,
                    local_coords[2] * branch_factor + c,
                ];
                let child_bounds = lattice.node_bounds(tree_coords, depth + 1, child_coords);
                if !child_bounds.intersects(cell_bounds) {
                    continue;
                }
                children_safe &= analyze_node(
                    grid,
                    lattice,
                    cell,
                    cell_bounds,
                    tree_coords,
                    depth + 1,
                    child_coords,
                    mark_empty,
                    forbid_empty,
                    prototypes,
                );
            }
        }
    }

    if forbid_empty && !children_safe {
        if let Some(element) = grid.element_mut(tree, depth, local) {
            element.can_subdivide = false;
        }
    }

    true
}
