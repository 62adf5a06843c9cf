use std::fmt::Debug;
use std::time::Instant;

use log::{info, warn};

use crate::utils::math_helper::format_integer;

use super::extrapolate::extrapolate;
use super::geometry_analyzer::analyze_cells;
use super::hyper_tree_grid::HyperTreeGrid;
use super::lattice::Lattice;
use super::materialize::materialize;
use super::measurement::MeasurementSet;
use super::multi_res_grid::MultiResGrid;
use super::{FieldAssociation, GridFloat, Measurement, ResampleError, ScalarDataset};

/// The range gate for subdivision.
///
/// A node may only subdivide when its measured value satisfies the predicate. An infinite
/// range disables the gate entirely.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RangePredicate<T> {
    min: T,
    max: T,
    in_range: bool,
}

impl<T: GridFloat> RangePredicate<T> {
    pub fn new(min: T, max: T, in_range: bool) -> Self {
        Self { min, max, in_range }
    }

    pub fn disabled() -> Self {
        Self {
            min: T::neg_infinity(),
            max: T::infinity(),
            in_range: true,
        }
    }

    pub fn accepts(&self, value: T) -> bool {
        if self.min == T::neg_infinity() && self.max == T::infinity() {
            return true;
        }
        let within = self.min < value && value < self.max;
        if self.in_range {
            within
        } else {
            !within
        }
    }
}

/// Resamples scalar datasets onto adaptive hyper tree grids.
///
/// The resampler tiles the dataset bounds with a coarse lattice of trees and refines each
/// tree where the aggregated data supports it, up to a maximum depth. Leaves carry the
/// configured measurement(s) of the samples below them.
///
/// # Example
///
/// ```rust
/// # use treegrid::types::geometry::Vec3;
/// # use treegrid::types::resampling::{HyperTreeResampler, Measurement, UnstructuredData};
/// #
/// # let points = vec![Vec3::new(0.25, 0.25, 0.25), Vec3::new(0.75, 0.75, 0.75)];
/// # let data = UnstructuredData::from_points(points, vec![1.0, 2.0]).unwrap();
///
/// // Create and configure the resampler
/// let resampler = HyperTreeResampler::builder()
///     .with_dimensions([2, 2, 2])
///     .with_branch_factor(2)
///     .with_max_depth(3)
///     .with_measurement(Measurement::Mean)
///     .build()
///     .expect("Failed to build resampler");
///
/// // Resample the dataset
/// let grid = resampler.resample(&data)
///     .expect("Resampling failed");
///
/// assert!(grid.n_nodes() > 0);
/// ```
pub struct HyperTreeResampler<T>
where
    T: GridFloat,
{
    branch_factor: usize,
    max_depth: usize,
    dimensions: [usize; 3],
    measurement: Option<Measurement>,
    display_measurement: Option<Measurement>,
    range: RangePredicate<T>,
    min_points: u64,
    no_empty_cells: bool,
    extrapolate: bool,
}

impl<T> HyperTreeResampler<T>
where
    T: GridFloat,
{
    pub fn builder() -> HyperTreeResamplerBuilder<T> {
        HyperTreeResamplerBuilder::new()
    }

    /// Resample a dataset onto an adaptive hyper tree grid.
    ///
    /// # Arguments
    ///
    /// * `dataset` - The dataset to resample.
    ///
    /// # Returns
    ///
    /// The emitted grid. An empty dataset yields an initialized, fully masked grid.
    pub fn resample<D: ScalarDataset<T>>(
        &self,
        dataset: &D,
    ) -> Result<HyperTreeGrid<T>, ResampleError> {
        let before = Instant::now();
        let bounds = dataset.bounds();
        let lattice = Lattice::new(bounds, self.dimensions, self.branch_factor, self.max_depth);
        let measurements = MeasurementSet::new(self.measurement, self.display_measurement);
        let prototypes = measurements.prototypes();
        let mut output =
            HyperTreeGrid::new(bounds, self.dimensions, self.branch_factor, self.max_depth);
        let mut grid = MultiResGrid::new(lattice);

        let n_samples = match dataset.association() {
            FieldAssociation::Points => {
                for index in 0..dataset.n_points() {
                    let point = dataset.point(index);
                    grid.insert_point(&point, dataset.point_value(index), &prototypes);
                }
                dataset.n_points()
            }
            FieldAssociation::Cells => {
                for index in 0..dataset.n_cells() {
                    grid.insert_cell(dataset.cell(index), dataset.cell_value(index), &prototypes);
                }
                dataset.n_cells()
            }
        };
        if n_samples == 0 {
            warn!("The dataset carries no samples, the grid will be fully masked.");
        }

        grid.propagate(self.min_points, &measurements);
        info!(
            "Aggregated {} samples into {} grid elements in {:.2?}",
            format_integer(n_samples),
            format_integer(grid.n_elements()),
            before.elapsed()
        );

        let mark_empty =
            self.extrapolate && dataset.association() == FieldAssociation::Points;
        if self.no_empty_cells || mark_empty {
            let before_analysis = Instant::now();
            analyze_cells(
                &mut grid,
                dataset,
                mark_empty,
                self.no_empty_cells,
                &prototypes,
            );
            info!(
                "Analyzed {} input cells against the grid in {:.2?}",
                format_integer(dataset.n_cells()),
                before_analysis.elapsed()
            );
        }

        materialize(&mut grid, &measurements, &self.range, &mut output);

        if mark_empty && measurements.primary().is_some() {
            extrapolate(&mut output);
        }

        Ok(output)
    }
}

/// A builder for configuring and creating resamplers.
///
/// This builder provides a fluent interface for setting up a [`HyperTreeResampler`] with
/// all necessary parameters.
pub struct HyperTreeResamplerBuilder<T>
where
    T: GridFloat,
{
    branch_factor: usize,
    max_depth: usize,
    dimensions: [usize; 3],
    measurement: Option<Measurement>,
    display_measurement: Option<Measurement>,
    min_value: T,
    max_value: T,
    in_range: bool,
    min_points: usize,
    no_empty_cells: bool,
    extrapolate: bool,
}

impl<T> Default for HyperTreeResamplerBuilder<T>
where
    T: GridFloat,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> HyperTreeResamplerBuilder<T>
where
    T: GridFloat,
{
    /// Creates a new builder with default values.
    pub fn new() -> Self {
        Self {
            branch_factor: 2,
            max_depth: 1,
            dimensions: [2, 2, 2],
            measurement: Some(Measurement::Mean),
            display_measurement: None,
            min_value: T::neg_infinity(),
            max_value: T::infinity(),
            in_range: true,
            min_points: 1,
            no_empty_cells: false,
            extrapolate: false,
        }
    }

    /// Sets the branch factor, the subdivisions per axis and refinement level.
    pub fn with_branch_factor(mut self, branch_factor: usize) -> Self {
        self.branch_factor = branch_factor;
        self
    }

    /// Sets the deepest refinement level of the trees.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Sets the number of lattice vertices per axis.
    pub fn with_dimensions(mut self, dimensions: [usize; 3]) -> Self {
        self.dimensions = dimensions;
        self
    }

    /// Sets the primary measurement written to every node.
    pub fn with_measurement(mut self, measurement: Measurement) -> Self {
        self.measurement = Some(measurement);
        self
    }

    /// Clears the primary measurement. Subdivision is then driven by counts alone.
    pub fn without_measurement(mut self) -> Self {
        self.measurement = None;
        self
    }

    /// Sets a second measurement written to every node alongside the primary one.
    pub fn with_display_measurement(mut self, measurement: Measurement) -> Self {
        self.display_measurement = Some(measurement);
        self
    }

    /// Sets the value range gating subdivision.
    ///
    /// With `in_range` a node subdivides only while its value falls inside `(min, max)`,
    /// otherwise only while it falls outside. An infinite range disables the gate.
    pub fn with_range(mut self, min: T, max: T, in_range: bool) -> Self {
        self.min_value = min;
        self.max_value = max;
        self.in_range = in_range;
        self
    }

    /// Sets the minimum number of samples a subtree needs to be subdivided.
    pub fn with_min_points(mut self, min_points: usize) -> Self {
        self.min_points = min_points;
        self
    }

    /// Forbids subdivisions that would hide input geometry behind masked leaves.
    pub fn with_no_empty_cells(mut self, no_empty_cells: bool) -> Self {
        self.no_empty_cells = no_empty_cells;
        self
    }

    /// Fills masked gaps by averaging valid neighbors. Point-associated datasets only.
    pub fn with_extrapolation(mut self, extrapolate: bool) -> Self {
        self.extrapolate = extrapolate;
        self
    }

    /// Builds the resampler with the configured parameters.
    ///
    /// # Returns
    ///
    /// A [`Result`] containing the configured resampler, or an error when a parameter is
    /// out of its valid range.
    pub fn build(self) -> Result<HyperTreeResampler<T>, ResampleError> {
        if self.branch_factor < 2 {
            return Err(ResampleError::InvalidBranchFactor(self.branch_factor));
        }
        if self.dimensions.iter().any(|&dimension| dimension < 2) {
            return Err(ResampleError::InvalidDimensions(self.dimensions));
        }
        if self.min_points < 1 {
            return Err(ResampleError::InvalidMinPoints(self.min_points));
        }
        if self.min_value > self.max_value {
            return Err(ResampleError::InvalidRange {
                min: self.min_value.to_f64().unwrap_or(f64::NAN),
                max: self.max_value.to_f64().unwrap_or(f64::NAN),
            });
        }

        Ok(HyperTreeResampler {
            branch_factor: self.branch_factor,
            max_depth: self.max_depth,
            dimensions: self.dimensions,
            measurement: self.measurement,
            display_measurement: self.display_measurement,
            range: RangePredicate::new(self.min_value, self.max_value, self.in_range),
            min_points: self.min_points as u64,
            no_empty_cells: self.no_empty_cells,
            extrapolate: self.extrapolate,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::geometry::{BoundingBox, Cell, Polyhedron, Vec3};
    use crate::types::resampling::UnstructuredData;

    fn corner_points() -> Vec<Vec3<f64>> {
        BoundingBox::new(Vec3::origin(), Vec3::new(1.0, 1.0, 1.0))
            .corners()
            .to_vec()
    }

    /// Deterministic pseudo-random values in [0, 1).
    fn pseudo_random(count: usize) -> Vec<f64> {
        let mut state: u64 = 0x9E3779B97F4A7C15;
        (0..count)
            .map(|_| {
                state = state
                    .wrapping_mul(6364136223846793005)
                    .wrapping_add(1442695040888963407);
                (state >> 11) as f64 / (1u64 << 53) as f64
            })
            .collect()
    }

    #[test]
    fn test_builder_validation() {
        assert!(HyperTreeResampler::<f64>::builder().build().is_ok());
        assert!(HyperTreeResampler::<f64>::builder()
            .with_branch_factor(1)
            .build()
            .is_err());
        assert!(HyperTreeResampler::<f64>::builder()
            .with_dimensions([1, 2, 2])
            .build()
            .is_err());
        assert!(HyperTreeResampler::<f64>::builder()
            .with_min_points(0)
            .build()
            .is_err());
        assert!(HyperTreeResampler::<f64>::builder()
            .with_range(1.0, 0.0, true)
            .build()
            .is_err());
    }

    #[test]
    fn test_corner_points_aggregate_to_single_leaf() {
        let data = UnstructuredData::from_points(corner_points(), vec![1.0; 8]).unwrap();
        let resampler = HyperTreeResampler::builder()
            .with_dimensions([2, 2, 2])
            .with_branch_factor(2)
            .with_max_depth(0)
            .with_measurement(Measurement::Mean)
            .build()
            .unwrap();

        let grid = resampler.resample(&data).unwrap();

        assert_eq!(grid.n_nodes(), 1);
        assert!(!grid.is_masked(0));
        assert!((grid.measure(0) - 1.0).abs() < 1e-12);
        assert_eq!(grid.n_points(0), 8);
        assert_eq!(grid.n_leaves(0), 1);
    }

    #[test]
    fn test_empty_dataset_emits_masked_grid() {
        let data = UnstructuredData::<f64>::from_points(vec![], vec![]).unwrap();
        let resampler = HyperTreeResampler::builder()
            .with_dimensions([3, 3, 3])
            .build()
            .unwrap();

        let grid = resampler.resample(&data).unwrap();

        // One masked root per lattice cell, nothing else.
        assert_eq!(grid.n_trees(), 8);
        assert_eq!(grid.n_nodes(), 8);
        for node in 0..grid.n_nodes() {
            assert!(grid.is_masked(node));
            assert!(grid.measure(node).is_nan());
        }
    }

    #[test]
    fn test_point_count_conservation() {
        let values = pseudo_random(3000);
        let points: Vec<Vec3<f64>> = pseudo_random(9000)
            .chunks_exact(3)
            .map(|chunk| Vec3::new(chunk[0], chunk[1], chunk[2]))
            .collect();
        let data = UnstructuredData::from_points(points, values).unwrap();
        let resampler = HyperTreeResampler::builder()
            .with_dimensions([3, 4, 2])
            .with_branch_factor(2)
            .with_max_depth(3)
            .with_min_points(2)
            .build()
            .unwrap();

        let grid = resampler.resample(&data).unwrap();

        let total: u64 = grid.leaves().map(|leaf| grid.n_points(leaf)).sum();
        assert_eq!(total, 3000, "Every sample must land in exactly one leaf");
    }

    #[test]
    fn test_range_gating_limits_refinement() {
        // Scalar x + 0.2 over uniform points, subdivision only where the mean is high.
        // The root mean sits near 0.7, the low-x octants fall below the range.
        let coords = pseudo_random(3000);
        let points: Vec<Vec3<f64>> = coords
            .chunks_exact(3)
            .map(|chunk| Vec3::new(chunk[0], chunk[1], chunk[2]))
            .collect();
        let values: Vec<f64> = points.iter().map(|point| point.x + 0.2).collect();
        let data = UnstructuredData::from_points(points, values).unwrap();
        let resampler = HyperTreeResampler::builder()
            .with_dimensions([2, 2, 2])
            .with_branch_factor(2)
            .with_max_depth(3)
            .with_measurement(Measurement::Mean)
            .with_range(0.5, 1.0, true)
            .build()
            .unwrap();

        let grid = resampler.resample(&data).unwrap();

        let root = grid.root(0).unwrap();
        assert!(!grid.is_leaf(root), "The root mean is inside the range");

        // No subdivided node may carry a value outside the accepted range.
        let mut gated = 0;
        for node in 0..grid.n_nodes() {
            let value = grid.measure(node);
            if !grid.is_leaf(node) {
                assert!(
                    0.5 < value && value < 1.0,
                    "A node with mean {} outside the range must not subdivide",
                    value
                );
            } else if value == value && !(0.5 < value && value < 1.0) && grid.n_points(node) > 1 {
                gated += 1;
            }
        }
        assert!(gated > 0, "Expected some leaves held back by the range gate");
    }

    #[test]
    fn test_voxel_cell_octant() {
        // One voxel cell covering the lower octant of a [0,2]^3 domain.
        let cell = Cell::Voxel(BoundingBox::new(Vec3::origin(), Vec3::new(1.0, 1.0, 1.0)));
        let data = UnstructuredData::from_cells(vec![cell], vec![7.0])
            .unwrap()
            .with_bounds(BoundingBox::new(Vec3::origin(), Vec3::new(2.0, 2.0, 2.0)));
        let resampler = HyperTreeResampler::<f64>::builder()
            .with_dimensions([3, 3, 3])
            .with_branch_factor(2)
            .with_max_depth(1)
            .with_measurement(Measurement::Mean)
            .build()
            .unwrap();

        let grid = resampler.resample(&data).unwrap();

        // The cell fills the eight finest boxes of the first tree with value 7.
        let mut unmasked = 0;
        for leaf in grid.leaves().collect::<Vec<usize>>() {
            if !grid.is_masked(leaf) {
                unmasked += 1;
                assert!((grid.measure(leaf) - 7.0).abs() < 1e-9);
            }
        }
        assert_eq!(unmasked, 8);

        // Weight conservation: the leaves of the populated tree cover the cell volume.
        let root = grid.root(0).unwrap();
        assert_eq!(grid.n_points(root), 8);
        assert_eq!(grid.n_leaves(root), 8);
    }

    #[test]
    fn test_no_empty_cells_prevents_holes() {
        // A thin tetrahedron spanning two octants of the domain.
        let tetrahedron = Polyhedron::tetrahedron(
            Vec3::new(0.05, 0.4, 0.45),
            Vec3::new(0.9, 0.45, 0.4),
            Vec3::new(0.45, 0.55, 0.45),
            Vec3::new(0.45, 0.45, 0.6),
        );
        let cell = Cell::Polyhedron(tetrahedron.clone());
        let data = UnstructuredData::from_cells(vec![cell], vec![1.0])
            .unwrap()
            .with_bounds(BoundingBox::new(Vec3::origin(), Vec3::new(1.0, 1.0, 1.0)));
        let resampler = HyperTreeResampler::builder()
            .with_dimensions([2, 2, 2])
            .with_branch_factor(2)
            .with_max_depth(3)
            .with_no_empty_cells(true)
            .build()
            .unwrap();

        let grid = resampler.resample(&data).unwrap();

        // No masked leaf may have its centre inside the input geometry.
        let lattice = Lattice::<f64>::new(
            *grid.bounds(),
            grid.dimensions(),
            grid.branch_factor(),
            grid.max_depth(),
        );
        assert_masked_leaves_outside(&grid, &lattice, &tetrahedron, 0, [0, 0, 0], grid.root(0).unwrap());
    }

    fn assert_masked_leaves_outside(
        grid: &HyperTreeGrid<f64>,
        lattice: &Lattice<f64>,
        cell: &Polyhedron<f64>,
        depth: usize,
        local: [usize; 3],
        node: usize,
    ) {
        if grid.is_leaf(node) {
            if grid.is_masked(node) {
                let centre = lattice.node_bounds([0, 0, 0], depth, local).centroid();
                assert!(
                    !cell.contains(&centre),
                    "Masked leaf at depth {} with its centre inside the geometry",
                    depth
                );
            }
            return;
        }
        let first = grid.first_child(node).unwrap();
        let branch_factor = grid.branch_factor();
        for c in 0..branch_factor {
            for b in 0..branch_factor {
                for a in 0..branch_factor {
                    assert_masked_leaves_outside(
                        grid,
                        lattice,
                        cell,
                        depth + 1,
                        [
                            local[0] * branch_factor + a,
                            local[1] * branch_factor + b,
                            local[2] * branch_factor + c,
                        ],
                        first + a + branch_factor * (b + branch_factor * c),
                    );
                }
            }
        }
    }

    #[test]
    fn test_extrapolation_fills_gap() {
        // One point per finest box of a 4^3 refinement, except the interior box at
        // (1, 1, 1). Its six neighbors carry the values 1 to 6.
        let mut points = Vec::new();
        let mut values = Vec::new();
        let neighbor_values = [
            ([0usize, 1usize, 1usize], 1.0),
            ([2, 1, 1], 2.0),
            ([1, 0, 1], 3.0),
            ([1, 2, 1], 4.0),
            ([1, 1, 0], 5.0),
            ([1, 1, 2], 6.0),
        ];
        for i in 0..4 {
            for j in 0..4 {
                for k in 0..4 {
                    if [i, j, k] == [1, 1, 1] {
                        continue;
                    }
                    let value = neighbor_values
                        .iter()
                        .find(|(coords, _)| *coords == [i, j, k])
                        .map(|&(_, value)| value)
                        .unwrap_or(3.5);
                    points.push(Vec3::new(
                        0.125 + 0.25 * i as f64,
                        0.125 + 0.25 * j as f64,
                        0.125 + 0.25 * k as f64,
                    ));
                    values.push(value);
                }
            }
        }
        let data = UnstructuredData::from_points(points, values)
            .unwrap()
            .with_bounds(BoundingBox::new(Vec3::origin(), Vec3::new(1.0, 1.0, 1.0)));
        let resampler = HyperTreeResampler::builder()
            .with_dimensions([2, 2, 2])
            .with_branch_factor(2)
            .with_max_depth(2)
            .with_measurement(Measurement::Mean)
            .with_extrapolation(true)
            .build()
            .unwrap();

        let grid = resampler.resample(&data).unwrap();

        let gap = grid.node_at(0, 2, [1, 1, 1]).unwrap();
        assert!(grid.is_masked(gap), "The gap leaf keeps its mask bit");
        assert!(
            (grid.measure(gap) - 3.5).abs() < 1e-12,
            "Expected the mean of the six neighbors but found {}",
            grid.measure(gap)
        );
    }

    #[test]
    fn test_dual_measurements_match_isolated_runs() {
        // Mean and variance share the sum accumulator. With the same two-point floor the
        // three configurations refine identically, so their values can be compared per
        // node.
        let coords = pseudo_random(1500);
        let points: Vec<Vec3<f64>> = coords
            .chunks_exact(3)
            .map(|chunk| Vec3::new(chunk[0], chunk[1], chunk[2]))
            .collect();
        let values = pseudo_random(points.len());
        let data = UnstructuredData::from_points(points, values).unwrap();

        let build = |primary: Measurement, display: Option<Measurement>| {
            let mut builder = HyperTreeResampler::builder()
                .with_dimensions([2, 2, 2])
                .with_max_depth(2)
                .with_min_points(2)
                .with_measurement(primary);
            if let Some(display) = display {
                builder = builder.with_display_measurement(display);
            }
            builder.build().unwrap().resample(&data).unwrap()
        };

        let combined = build(Measurement::Mean, Some(Measurement::Variance));
        let mean_only = build(Measurement::Mean, None);
        let variance_only = build(Measurement::Variance, None);

        assert_eq!(combined.n_nodes(), mean_only.n_nodes());
        assert_eq!(combined.n_nodes(), variance_only.n_nodes());
        for node in 0..combined.n_nodes() {
            let value = combined.measure(node);
            let reference = mean_only.measure(node);
            assert!(
                value == reference || (value.is_nan() && reference.is_nan()),
                "Primary measurement diverged at node {}",
                node
            );
            let display = combined.display_measure(node);
            let reference = variance_only.measure(node);
            assert!(
                display == reference || (display.is_nan() && reference.is_nan()),
                "Display measurement diverged at node {}",
                node
            );
        }
    }

    #[test]
    fn test_cell_per_tree_means() {
        // One voxel cell per lattice cell, each carrying a distinct value.
        let mut cells = Vec::new();
        let mut values = Vec::new();
        for i in 0..2 {
            for j in 0..2 {
                for k in 0..2 {
                    let min = Vec3::new(i as f64, j as f64, k as f64);
                    cells.push(Cell::Voxel(BoundingBox::new(
                        min,
                        min + Vec3::new(1.0, 1.0, 1.0),
                    )));
                    values.push(1.0 + (4 * i + 2 * j + k) as f64);
                }
            }
        }
        let data = UnstructuredData::from_cells(cells, values)
            .unwrap()
            .with_bounds(BoundingBox::new(Vec3::origin(), Vec3::new(2.0, 2.0, 2.0)));
        let resampler = HyperTreeResampler::builder()
            .with_dimensions([3, 3, 3])
            .with_max_depth(2)
            .build()
            .unwrap();

        let grid = resampler.resample(&data).unwrap();

        // Every tree aggregates exactly its own cell.
        for i in 0..2usize {
            for j in 0..2usize {
                for k in 0..2usize {
                    let tree = k + 2 * j + 4 * i;
                    let expected = 1.0 + (4 * i + 2 * j + k) as f64;
                    let root = grid.root(tree).unwrap();
                    assert!(!grid.is_masked(root));
                    assert!(
                        (grid.measure(root) - expected).abs() < 1e-9,
                        "Tree ({}, {}, {}) should carry the value {} but found {}",
                        i,
                        j,
                        k,
                        expected,
                        grid.measure(root)
                    );
                }
            }
        }
    }
}
