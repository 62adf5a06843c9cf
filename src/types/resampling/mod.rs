//! # Resampling Module
//!
//! The `resampling` module provides the tools for aggregating a scalar attribute of an input
//! dataset onto an adaptive hyper tree grid.
//!
//! ## Architecture Overview
//!
//! The resampling pipeline runs in four stages:
//!
//! 1. **Aggregation**: Every input sample is binned into a sparse multi-resolution grid.
//!    Point samples land at the finest depth with unit weight. Cell samples land at the
//!    shallowest depth that splits their bounds, weighted by the volume of intersection
//!    between the cell and each grid box. The sparse grid is then propagated bottom-up,
//!    merging counts, weights and accumulators into the coarser depths.
//! 2. **Geometry analysis** (optional): Input cells are walked against the sparse grid to
//!    find empty regions their geometry passes through. Depending on configuration this
//!    either forbids subdivision above such regions, or marks them for later filling.
//! 3. **Materialization**: Each tree is emitted top-down. Leaves carry the measured
//!    value(s), the subtree counts and a mask bit for regions without data. Nodes
//!    subdivide while the configured policies and the aggregated data both agree.
//! 4. **Extrapolation** (optional): Gaps inside the sampled region are filled by
//!    iteratively averaging valid Von Neumann neighbors, most constrained leaves first.
//!
//! ## Core Types
//!
//! - [`HyperTreeResampler`]: configuration and entry point for the pipeline.
//! - [`ScalarDataset`]: contract for the inputs, with [`UnstructuredData`] as the
//!   in-memory implementation.
//! - [`Accumulator`] and [`Measurement`]: pluggable statistics computed per leaf.
//! - [`HyperTreeGrid`]: the emitted adaptive grid.
//!
//! ## Error Handling
//!
//! The system uses [`ResampleError`] for configuration and input validation. Conditions
//! that can be recovered locally, such as empty inputs or degenerate cell overlaps, are
//! logged and resolved by masking instead of failing the run.

/// Accumulators capturing incremental statistics of the input samples.
mod accumulator;
/// The input dataset contract and an in-memory implementation.
mod dataset;
/// Gap filling over the emitted grid.
mod extrapolate;
/// Analysis of cell geometry against the sparse grid.
mod geometry_analyzer;
/// The aggregated state per sparse grid position.
mod grid_element;
/// The emitted adaptive grid.
mod hyper_tree_grid;
/// Geometry of the coarse lattice and the per-depth resolutions.
mod lattice;
/// Top-down emission of the adaptive trees.
mod materialize;
/// Measurements derived from accumulated statistics.
mod measurement;
/// The sparse multi-resolution grid and its bottom-up propagation.
mod multi_res_grid;
/// Error types related to resampling.
mod resample_error;
/// Configuration and orchestration of the resampling pipeline.
mod resampler;

pub use accumulator::*;
pub use dataset::*;
pub use hyper_tree_grid::*;
pub use measurement::*;
pub use resample_error::*;
pub use resampler::*;

/// Default trait for a float value in a resampled grid.
#[cfg(feature = "serde")]
pub trait GridFloat:
    num_traits::Float + std::fmt::Debug + Concurrency + serde::Serialize
{
}

/// Default trait for a float value in a resampled grid.
#[cfg(not(feature = "serde"))]
pub trait GridFloat: num_traits::Float + std::fmt::Debug + Concurrency {}

// Blanket implementation for all types that satisfy the bounds
#[cfg(feature = "serde")]
#[doc(hidden)]
impl<T> GridFloat for T where T: num_traits::Float + std::fmt::Debug + Concurrency + serde::Serialize {}

// Blanket implementation for all types that satisfy the bounds
#[cfg(not(feature = "serde"))]
#[doc(hidden)]
impl<T> GridFloat for T where T: num_traits::Float + std::fmt::Debug + Concurrency {}

#[doc(hidden)]
pub trait Concurrency: Send + Sync {}
#[doc(hidden)]
impl<T: Send + Sync> Concurrency for T {}
