use std::fmt::Debug;
use std::time::Instant;

use hashbrown::HashMap;
use log::info;

use crate::utils::math_helper::{format_integer, local_index1d};

use super::grid_element::GridElement;
use super::hyper_tree_grid::HyperTreeGrid;
use super::lattice::Lattice;
use super::measurement::MeasurementSet;
use super::multi_res_grid::MultiResGrid;
use super::resampler::RangePredicate;
use super::GridFloat;

/// Emit the adaptive trees from the sparse multi-resolution grid.
///
/// Every tree of the lattice is walked top-down. Each node receives its measured
/// value(s), subtree counts and mask bit, parents before children, and is subdivided
/// while the aggregated data and the configured policies allow it. Consumed trees are
/// released from the sparse grid as emission proceeds.
pub(crate) fn materialize<T: GridFloat>(
    grid: &mut MultiResGrid<T>,
    measurements: &MeasurementSet,
    range: &RangePredicate<T>,
    output: &mut HyperTreeGrid<T>,
) {
    let before = Instant::now();
    let lattice = grid.lattice().clone();
    let cells = lattice.cells();

    for i in 0..cells[0] {
        for j in 0..cells[1] {
            for k in 0..cells[2] {
                let tree = lattice.tree_index([i, j, k]);
                let root = output.create_tree(tree);
                emit_node(
                    grid.tree(tree),
                    &lattice,
                    measurements,
                    range,
                    output,
                    0,
                    [0, 0, 0],
                    root,
                );
                grid.release_tree(tree);
            }
        }
    }

    let masked = (0..output.n_nodes()).filter(|&node| output.is_masked(node)).count();
    info!(
        "Emitted {} trees with {} nodes ({} masked) in {:.2?}",
        format_integer(output.n_trees()),
        format_integer(output.n_nodes()),
        format_integer(masked),
        before.elapsed()
    );
}

/// Emit one node and recurse into its children when it subdivides.
#[allow(clippy::too_many_arguments)]
fn emit_node<T: GridFloat>(
    maps: Option<&[HashMap<usize, GridElement<T>>]>,
    lattice: &Lattice<T>,
    measurements: &MeasurementSet,
    range: &RangePredicate<T>,
    output: &mut HyperTreeGrid<T>,
    depth: usize,
    local_coords: [usize; 3],
    node: usize,
) {
    let resolution = lattice.resolution(depth);
    let local = local_index1d(local_coords[0], local_coords[1], local_coords[2], resolution);
    let element = maps.and_then(|maps| maps[depth].get(&local));

    let (value, display) = match element {
        Some(element) if element.is_populated() => (
            measurements.measure_primary(&element.accumulators, element.n_points, element.weight),
            measurements.measure_display(&element.accumulators, element.n_points, element.weight),
        ),
        _ => (T::nan(), T::nan()),
    };

    output.set_node_data(
        node,
        value,
        display,
        element.map_or(0, |element| element.n_leaves),
        element.map_or(0, |element| element.n_points),
        element.is_none(),
    );

    let data_allows = element.map_or(false, |element| element.n_leaves > 1 && element.can_subdivide);
    let value_allows = match measurements.primary() {
        Some(_) => value == value && range.accepts(value),
        None => true,
    };
    if depth >= lattice.max_depth() || !data_allows || !value_allows {
        return;
    }

    let branch_factor = lattice.branch_factor();
    let first = output.subdivide(node);
    for c in 0..branch_factor {
        for b in 0..branch_factor {
            for a in 0..branch_factor {
                let child_coords = [
                    local_coords[0] * branch_factor + a,
                    local_coords[1] * branch_factor + b,
                    local_coords[2] * branch_factor + c,
                ];
                let child = first + a + branch_factor * (b + branch_factor * c);
                emit_node(
                    maps,
                    lattice,
                    measurements,
                    range,
                    output,
                    depth + 1,
                    child_coords,
                    child,
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::geometry::{BoundingBox, Vec3};
    use crate::types::resampling::Measurement;

    fn create_test_setup(max_depth: usize) -> (MultiResGrid<f64>, MeasurementSet, HyperTreeGrid<f64>) {
        let bounds = BoundingBox::new(Vec3::origin(), Vec3::new(1.0, 1.0, 1.0));
        let lattice = Lattice::new(bounds, [2, 2, 2], 2, max_depth);
        let measurements = MeasurementSet::new(Some(Measurement::Mean), None);
        let output = HyperTreeGrid::new(bounds, [2, 2, 2], 2, max_depth);
        (MultiResGrid::new(lattice), measurements, output)
    }

    #[test]
    fn test_single_sample_stays_a_leaf() {
        let (mut grid, measurements, mut output) = create_test_setup(1);
        let prototypes = measurements.prototypes();
        grid.insert_point(&Vec3::new(0.1, 0.1, 0.1), 2.0, &prototypes);
        grid.propagate(1, &measurements);

        materialize(&mut grid, &measurements, &RangePredicate::disabled(), &mut output);

        // One data leaf at the root, subdivision needs more than one populated region.
        assert_eq!(output.n_nodes(), 1);
        assert!(!output.is_masked(0));
        assert!((output.measure(0) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_two_regions_subdivide() {
        let (mut grid, measurements, mut output) = create_test_setup(1);
        let prototypes = measurements.prototypes();
        grid.insert_point(&Vec3::new(0.1, 0.1, 0.1), 1.0, &prototypes);
        grid.insert_point(&Vec3::new(0.9, 0.9, 0.9), 3.0, &prototypes);
        grid.propagate(1, &measurements);

        materialize(&mut grid, &measurements, &RangePredicate::disabled(), &mut output);

        // The root subdivides into eight children, two carry data.
        assert_eq!(output.n_nodes(), 9);
        let masked = (0..output.n_nodes()).filter(|&node| output.is_masked(node)).count();
        assert_eq!(masked, 6);
        assert!((output.measure(0) - 2.0).abs() < 1e-12, "Root mean of 1 and 3");
    }

    #[test]
    fn test_range_predicate_gates_subdivision() {
        let (mut grid, measurements, mut output) = create_test_setup(1);
        let prototypes = measurements.prototypes();
        grid.insert_point(&Vec3::new(0.1, 0.1, 0.1), 1.0, &prototypes);
        grid.insert_point(&Vec3::new(0.9, 0.9, 0.9), 3.0, &prototypes);
        grid.propagate(1, &measurements);

        // The root mean of 2.0 falls outside the accepted range.
        let range = RangePredicate::new(5.0, 10.0, true);
        materialize(&mut grid, &measurements, &range, &mut output);

        assert_eq!(output.n_nodes(), 1);
    }

    #[test]
    fn test_sparse_grid_is_released() {
        let (mut grid, measurements, mut output) = create_test_setup(1);
        let prototypes = measurements.prototypes();
        grid.insert_point(&Vec3::new(0.1, 0.1, 0.1), 1.0, &prototypes);
        grid.propagate(1, &measurements);

        materialize(&mut grid, &measurements, &RangePredicate::disabled(), &mut output);

        assert_eq!(grid.n_elements(), 0);
    }
}
