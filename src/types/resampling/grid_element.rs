use std::fmt::Debug;

use super::{Accumulator, GridFloat};

/// Aggregated state at one `(tree, depth, local)` position of the sparse multi-resolution grid.
///
/// Elements are seeded by the input samples, merged bottom-up into the coarser depths, and
/// consumed when the adaptive trees are emitted.
#[derive(Debug, Clone)]
pub(crate) struct GridElement<T> {
    /// Number of finest-level positions under this element that received samples.
    pub n_leaves: u64,
    /// Number of input samples contributing to this element.
    pub n_points: u64,
    /// Accumulated weight, one per point for point samples or the intersected volume for cells.
    pub weight: T,
    /// Number of direct children present in the sparse map.
    pub n_unmasked_children: usize,
    /// Whether the entire subtree below this element is free of masked leaves.
    pub children_fully_populated: bool,
    /// Whether every child of this element supports further subdivision.
    pub can_subdivide: bool,
    /// One accumulator per distinct statistic required by the configured measurements.
    pub accumulators: Vec<Accumulator<T>>,
}

impl<T: GridFloat> GridElement<T> {
    /// Create an element seeded from a first weighted sample.
    ///
    /// # Arguments
    ///
    /// * `value` - The sample value.
    /// * `weight` - The weight of the sample.
    /// * `prototypes` - Accumulator prototypes to clone into the element.
    pub fn from_sample(value: T, weight: T, prototypes: &[Accumulator<T>]) -> Self {
        let mut accumulators = prototypes.to_vec();
        for accumulator in accumulators.iter_mut() {
            accumulator.add(value, weight);
        }
        Self {
            n_leaves: 1,
            n_points: 1,
            weight,
            n_unmasked_children: 0,
            children_fully_populated: true,
            can_subdivide: true,
            accumulators,
        }
    }

    /// Create an empty marker element, carrying no samples.
    ///
    /// Used to keep a position alive for later gap filling.
    ///
    /// # Arguments
    ///
    /// * `prototypes` - Accumulator prototypes to clone into the element.
    pub fn empty(prototypes: &[Accumulator<T>]) -> Self {
        Self {
            n_leaves: 0,
            n_points: 0,
            weight: T::zero(),
            n_unmasked_children: 0,
            children_fully_populated: true,
            can_subdivide: true,
            accumulators: prototypes.to_vec(),
        }
    }

    /// Create a parent element from its first propagated child.
    ///
    /// # Arguments
    ///
    /// * `child` - The child element to lift.
    /// * `child_legal` - Whether the child satisfies the subdivision policies.
    /// * `child_complete` - Whether the child's subtree is free of masked leaves.
    pub fn from_child(child: &GridElement<T>, child_legal: bool, child_complete: bool) -> Self {
        Self {
            n_leaves: child.n_leaves,
            n_points: child.n_points,
            weight: child.weight,
            n_unmasked_children: 1,
            children_fully_populated: child_complete,
            can_subdivide: child_legal,
            accumulators: child.accumulators.clone(),
        }
    }

    /// Fold another weighted sample into the element.
    ///
    /// # Arguments
    ///
    /// * `value` - The sample value.
    /// * `weight` - The weight of the sample.
    pub fn add_sample(&mut self, value: T, weight: T) {
        for accumulator in self.accumulators.iter_mut() {
            accumulator.add(value, weight);
        }
        self.n_points += 1;
        self.weight = self.weight + weight;
    }

    /// Merge a further propagated child into this parent element.
    ///
    /// # Arguments
    ///
    /// * `child` - The child element to merge.
    /// * `child_legal` - Whether the child satisfies the subdivision policies.
    /// * `child_complete` - Whether the child's subtree is free of masked leaves.
    pub fn absorb_child(&mut self, child: &GridElement<T>, child_legal: bool, child_complete: bool) {
        self.n_leaves += child.n_leaves;
        self.n_points += child.n_points;
        self.weight = self.weight + child.weight;
        self.n_unmasked_children += 1;
        self.children_fully_populated &= child_complete;
        self.can_subdivide &= child_legal;
        for (accumulator, other) in self.accumulators.iter_mut().zip(child.accumulators.iter()) {
            accumulator.merge(other);
        }
    }

    /// Whether the element holds any sample data.
    pub fn is_populated(&self) -> bool {
        self.n_points > 0
    }
}
