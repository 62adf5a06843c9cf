use std::fmt::Debug;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::GridFloat;

/// The kind of statistic an accumulator captures.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccumulatorKind {
    /// Weighted sum of the sample values.
    Sum,
    /// Weighted sum of the squared sample values.
    SquaredSum,
    /// Smallest sample value.
    Min,
    /// Largest sample value.
    Max,
}

/// Value-semantic accumulator incrementally capturing one statistic of weighted samples.
///
/// Accumulators are cloned from prototypes into each grid element, updated per sample,
/// and merged pairwise when elements propagate into their parents.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone)]
pub struct Accumulator<T> {
    kind: AccumulatorKind,
    value: T,
}

impl<T: GridFloat> Accumulator<T> {
    /// Create a new accumulator of a kind, at its identity value.
    ///
    /// # Arguments
    ///
    /// * `kind` - The statistic to capture.
    pub fn new(kind: AccumulatorKind) -> Self {
        let value = match kind {
            AccumulatorKind::Sum | AccumulatorKind::SquaredSum => T::zero(),
            AccumulatorKind::Min => T::infinity(),
            AccumulatorKind::Max => T::neg_infinity(),
        };
        Self { kind, value }
    }

    /// Returns the kind of the accumulator.
    pub fn kind(&self) -> AccumulatorKind {
        self.kind
    }

    /// Returns the accumulated value.
    pub fn value(&self) -> T {
        self.value
    }

    /// Fold one weighted sample value into the accumulator.
    ///
    /// # Arguments
    ///
    /// * `value` - The sample value.
    /// * `weight` - The weight of the sample.
    pub fn add(&mut self, value: T, weight: T) {
        self.value = match self.kind {
            AccumulatorKind::Sum => self.value + value * weight,
            AccumulatorKind::SquaredSum => self.value + value * value * weight,
            AccumulatorKind::Min => self.value.min(value),
            AccumulatorKind::Max => self.value.max(value),
        };
    }

    /// Merge the state of another accumulator of the same kind into this one.
    ///
    /// # Arguments
    ///
    /// * `other` - The accumulator to merge.
    pub fn merge(&mut self, other: &Accumulator<T>) {
        debug_assert!(
            self.has_same_parameters(other),
            "Accumulators of different kinds cannot be merged"
        );
        self.value = match self.kind {
            AccumulatorKind::Sum | AccumulatorKind::SquaredSum => self.value + other.value,
            AccumulatorKind::Min => self.value.min(other.value),
            AccumulatorKind::Max => self.value.max(other.value),
        };
    }

    /// Check whether another accumulator captures the same statistic with the same parameters.
    ///
    /// # Arguments
    ///
    /// * `other` - The accumulator to compare with.
    pub fn has_same_parameters(&self, other: &Accumulator<T>) -> bool {
        self.kind == other.kind
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weighted_sum() {
        let mut accumulator: Accumulator<f64> = Accumulator::new(AccumulatorKind::Sum);

        accumulator.add(2.0, 1.0);
        accumulator.add(3.0, 0.5);

        assert!((accumulator.value() - 3.5).abs() < 1e-12);
    }

    #[test]
    fn test_squared_sum() {
        let mut accumulator: Accumulator<f64> = Accumulator::new(AccumulatorKind::SquaredSum);

        accumulator.add(2.0, 1.0);
        accumulator.add(3.0, 2.0);

        assert!((accumulator.value() - 22.0).abs() < 1e-12);
    }

    #[test]
    fn test_min_max_ignore_weights() {
        let mut min: Accumulator<f64> = Accumulator::new(AccumulatorKind::Min);
        let mut max: Accumulator<f64> = Accumulator::new(AccumulatorKind::Max);

        for &value in [3.0, -1.0, 2.0].iter() {
            min.add(value, 0.25);
            max.add(value, 0.25);
        }

        assert!((min.value() + 1.0).abs() < 1e-12);
        assert!((max.value() - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_merge_matches_sequential_adds() {
        let mut first: Accumulator<f64> = Accumulator::new(AccumulatorKind::Sum);
        let mut second = first.clone();
        let mut reference = first.clone();

        first.add(1.0, 1.0);
        second.add(2.0, 0.5);
        reference.add(1.0, 1.0);
        reference.add(2.0, 0.5);

        first.merge(&second);

        assert!((first.value() - reference.value()).abs() < 1e-12);
    }

    #[test]
    fn test_same_parameters() {
        let sum: Accumulator<f64> = Accumulator::new(AccumulatorKind::Sum);
        let other_sum = Accumulator::new(AccumulatorKind::Sum);
        let min = Accumulator::new(AccumulatorKind::Min);

        assert!(sum.has_same_parameters(&other_sum));
        assert!(!sum.has_same_parameters(&min));
    }
}
