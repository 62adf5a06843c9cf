use std::fmt::Debug;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::{Accumulator, AccumulatorKind, GridFloat};

/// A derived scalar computed from accumulated statistics and the sample summary.
///
/// Each measurement declares which accumulators it needs, whether it can be evaluated for
/// a given `(n_points, weight)` summary, and how to compute its value.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Measurement {
    /// Weighted arithmetic mean of the sample values.
    Mean,
    /// Weighted population variance of the sample values.
    Variance,
    /// Weighted population standard deviation of the sample values.
    StandardDeviation,
    /// Smallest sample value.
    Min,
    /// Largest sample value.
    Max,
}

impl Measurement {
    /// The accumulator kinds this measurement is computed from.
    pub fn accumulators_needed(&self) -> &'static [AccumulatorKind] {
        match self {
            Measurement::Mean => &[AccumulatorKind::Sum],
            Measurement::Variance | Measurement::StandardDeviation => {
                &[AccumulatorKind::Sum, AccumulatorKind::SquaredSum]
            }
            Measurement::Min => &[AccumulatorKind::Min],
            Measurement::Max => &[AccumulatorKind::Max],
        }
    }

    /// Check whether the measurement can be evaluated for a sample summary.
    ///
    /// # Arguments
    ///
    /// * `n_points` - Number of samples contributing.
    /// * `weight` - Total accumulated weight.
    pub fn can_measure<T: GridFloat>(&self, n_points: u64, weight: T) -> bool {
        match self {
            Measurement::Mean => weight > T::zero(),
            Measurement::Variance | Measurement::StandardDeviation => {
                n_points >= 2 && weight > T::zero()
            }
            Measurement::Min | Measurement::Max => n_points >= 1,
        }
    }

    /// Evaluate the measurement.
    ///
    /// # Arguments
    ///
    /// * `accumulators` - The accumulators listed by [`Measurement::accumulators_needed`], in order.
    /// * `weight` - Total accumulated weight.
    pub fn measure<T: GridFloat>(&self, accumulators: &[&Accumulator<T>], weight: T) -> T {
        match self {
            Measurement::Mean => accumulators[0].value() / weight,
            Measurement::Variance => variance(accumulators, weight),
            Measurement::StandardDeviation => variance(accumulators, weight).sqrt(),
            Measurement::Min | Measurement::Max => accumulators[0].value(),
        }
    }
}

fn variance<T: GridFloat>(accumulators: &[&Accumulator<T>], weight: T) -> T {
    let mean = accumulators[0].value() / weight;
    (accumulators[1].value() / weight - mean * mean).max(T::zero())
}

/// The resolved accumulator layout for a primary and an optional display measurement.
///
/// The required accumulator kinds of both measurements are deduplicated into one union
/// list, so a statistic shared between the two is updated once per sample. Each
/// measurement keeps a slot map from its own accumulator order into the union.
#[derive(Debug, Clone)]
pub(crate) struct MeasurementSet {
    primary: Option<Measurement>,
    display: Option<Measurement>,
    kinds: Vec<AccumulatorKind>,
    primary_slots: Vec<usize>,
    display_slots: Vec<usize>,
}

impl MeasurementSet {
    /// Resolve the accumulator layout for the configured measurements.
    pub fn new(primary: Option<Measurement>, display: Option<Measurement>) -> Self {
        let mut kinds: Vec<AccumulatorKind> = Vec::new();
        let mut slots_for = |measurement: Option<Measurement>| -> Vec<usize> {
            let mut slots = Vec::new();
            if let Some(measurement) = measurement {
                for &kind in measurement.accumulators_needed() {
                    let slot = match kinds.iter().position(|&existing| existing == kind) {
                        Some(slot) => slot,
                        None => {
                            kinds.push(kind);
                            kinds.len() - 1
                        }
                    };
                    slots.push(slot);
                }
            }
            slots
        };

        let primary_slots = slots_for(primary);
        let display_slots = slots_for(display.or(primary));

        Self {
            primary,
            display,
            kinds,
            primary_slots,
            display_slots,
        }
    }

    /// The configured primary measurement, if any.
    pub fn primary(&self) -> Option<Measurement> {
        self.primary
    }

    /// The deduplicated accumulator kinds required by the configured measurements.
    pub fn kinds(&self) -> &[AccumulatorKind] {
        &self.kinds
    }

    /// Fresh accumulator instances for a new grid element.
    pub fn prototypes<T: GridFloat>(&self) -> Vec<Accumulator<T>> {
        self.kinds.iter().map(|&kind| Accumulator::new(kind)).collect()
    }

    /// Check whether every configured measurement can be evaluated for a sample summary.
    ///
    /// Vacuously true when no measurement is configured.
    pub fn can_measure<T: GridFloat>(&self, n_points: u64, weight: T) -> bool {
        self.primary
            .map_or(true, |measurement| measurement.can_measure(n_points, weight))
            && self
                .display
                .map_or(true, |measurement| measurement.can_measure(n_points, weight))
    }

    /// Evaluate the primary measurement, or NaN when not configured or not measurable.
    pub fn measure_primary<T: GridFloat>(
        &self,
        accumulators: &[Accumulator<T>],
        n_points: u64,
        weight: T,
    ) -> T {
        Self::evaluate(self.primary, &self.primary_slots, accumulators, n_points, weight)
    }

    /// Evaluate the display measurement, falling back to the primary one when not configured.
    pub fn measure_display<T: GridFloat>(
        &self,
        accumulators: &[Accumulator<T>],
        n_points: u64,
        weight: T,
    ) -> T {
        Self::evaluate(
            self.display.or(self.primary),
            &self.display_slots,
            accumulators,
            n_points,
            weight,
        )
    }

    fn evaluate<T: GridFloat>(
        measurement: Option<Measurement>,
        slots: &[usize],
        accumulators: &[Accumulator<T>],
        n_points: u64,
        weight: T,
    ) -> T {
        match measurement {
            Some(measurement) if measurement.can_measure(n_points, weight) => {
                let resolved: Vec<&Accumulator<T>> =
                    slots.iter().map(|&slot| &accumulators[slot]).collect();
                measurement.measure(&resolved, weight)
            }
            _ => T::nan(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean() {
        let set = MeasurementSet::new(Some(Measurement::Mean), None);
        let mut accumulators: Vec<Accumulator<f64>> = set.prototypes();
        accumulators[0].add(2.0, 1.0);
        accumulators[0].add(4.0, 1.0);

        let value = set.measure_primary(&accumulators, 2, 2.0);
        assert!((value - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_variance_of_constant_samples() {
        let set = MeasurementSet::new(Some(Measurement::Variance), None);
        let mut accumulators: Vec<Accumulator<f64>> = set.prototypes();
        for _ in 0..4 {
            for accumulator in accumulators.iter_mut() {
                accumulator.add(3.0, 1.0);
            }
        }

        let value = set.measure_primary(&accumulators, 4, 4.0);
        assert!(value.abs() < 1e-12);
    }

    #[test]
    fn test_shared_accumulators_are_deduplicated() {
        let set = MeasurementSet::new(Some(Measurement::Mean), Some(Measurement::Variance));

        // Mean needs the sum, variance needs the sum and the squared sum.
        assert_eq!(set.kinds().len(), 2);
        assert_eq!(set.kinds()[0], AccumulatorKind::Sum);
        assert_eq!(set.kinds()[1], AccumulatorKind::SquaredSum);
    }

    #[test]
    fn test_display_falls_back_to_primary() {
        let set = MeasurementSet::new(Some(Measurement::Mean), None);
        let mut accumulators: Vec<Accumulator<f64>> = set.prototypes();
        accumulators[0].add(5.0, 1.0);

        let primary = set.measure_primary(&accumulators, 1, 1.0);
        let display = set.measure_display(&accumulators, 1, 1.0);
        assert!((primary - display).abs() < 1e-12);
    }

    #[test]
    fn test_unmeasurable_summary_is_nan() {
        let set = MeasurementSet::new(Some(Measurement::Variance), None);
        let accumulators: Vec<Accumulator<f64>> = set.prototypes();

        // A single sample has no variance.
        let value = set.measure_primary(&accumulators, 1, 1.0);
        assert!(value.is_nan());
    }

    #[test]
    fn test_no_measurement_is_nan() {
        let set = MeasurementSet::new(None, None);
        let accumulators: Vec<Accumulator<f64>> = set.prototypes();

        assert!(set.kinds().is_empty());
        assert!(set.measure_primary(&accumulators, 1, 1.0).is_nan());
        assert!(set.can_measure(0, 0.0));
    }

    #[test]
    fn test_min_max_measurements() {
        let set = MeasurementSet::new(Some(Measurement::Min), Some(Measurement::Max));
        let mut accumulators: Vec<Accumulator<f64>> = set.prototypes();
        for accumulator in accumulators.iter_mut() {
            accumulator.add(2.0, 1.0);
            accumulator.add(-1.0, 1.0);
        }

        assert!((set.measure_primary(&accumulators, 2, 2.0) + 1.0).abs() < 1e-12);
        assert!((set.measure_display(&accumulators, 2, 2.0) - 2.0).abs() < 1e-12);
    }
}
