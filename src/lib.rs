//! # Treegrid
//!
//! `Treegrid` is a lightweight engine for resampling arbitrary 3D datasets onto adaptive hyper tree grids, written in Rust.
//! It aggregates a scalar attribute carried by points or cells into a sparse multi-resolution grid, and emits an
//! adaptive tree whose refinement follows the statistical content of the data.
//!
//! ## Overview
//!
//! `Treegrid` tiles the bounding box of the input with a coarse lattice of trees. Each tree subdivides into `B³`
//! children per node for a branch factor `B`, down to a configurable maximum depth. At its core, it offers:
//!
//! ### Key Features
//!
//! - **Multi-resolution aggregation**: Point and cell samples are binned into sparse per-depth grids and
//!   propagated bottom-up with counts, weights and pluggable accumulators.
//! - **Volumetric intersection**: Cell inputs are weighted by the exact volume of intersection between each
//!   cell and the boxes it overlaps, computed analytically for voxels and general polyhedra.
//! - **Adaptive refinement**: Subdivision is gated by point counts, measurement feasibility and an optional
//!   range predicate on the measured value.
//! - **Gap handling**: Leaves that input geometry passes through can be kept unmasked, and masked gaps can be
//!   filled by iterative averaging from valid neighbors.
//!
//! ### Optional Feature Flags
//!
//! - `serde`: Serialize the emitted grids and the geometric value types using `serde`.
//!
//! The main modules of the crate are [`types::geometry`] and [`types::resampling`]. At the heart of `Treegrid`
//! is the [`HyperTreeResampler`](types::resampling::HyperTreeResampler) struct, which drives the aggregation
//! and emits a [`HyperTreeGrid`](types::resampling::HyperTreeGrid).
//!
//! ## Example: Resampling a Point Cloud
//!
//! ```rust
//! # use treegrid::types::geometry::Vec3;
//! # use treegrid::types::resampling::{HyperTreeResampler, Measurement, UnstructuredData};
//!
//! // Eight samples at the corners of the unit cube, all carrying the value 1.
//! let points: Vec<Vec3<f64>> = vec![
//!     Vec3::new(0.0, 0.0, 0.0),
//!     Vec3::new(1.0, 0.0, 0.0),
//!     Vec3::new(0.0, 1.0, 0.0),
//!     Vec3::new(1.0, 1.0, 0.0),
//!     Vec3::new(0.0, 0.0, 1.0),
//!     Vec3::new(1.0, 0.0, 1.0),
//!     Vec3::new(0.0, 1.0, 1.0),
//!     Vec3::new(1.0, 1.0, 1.0),
//! ];
//! let data = UnstructuredData::from_points(points, vec![1.0; 8]).unwrap();
//!
//! // Configure the resampler
//! let resampler = HyperTreeResampler::builder()
//!     .with_dimensions([2, 2, 2])
//!     .with_branch_factor(2)
//!     .with_max_depth(2)
//!     .with_measurement(Measurement::Mean)
//!     .build()
//!     .expect("Should be able to build the resampler.");
//!
//! // Resample onto an adaptive grid.
//! let grid = resampler.resample(&data).expect("Resampling should work.");
//!
//! assert_eq!(grid.n_trees(), 1);
//! ```
//!
//! For more examples and detailed API documentation, see:
//! - The [`types::resampling`] module for configuration and outputs
//! - The [`types::geometry`] module for geometric primitives
//!

/// The current version of the `Treegrid` library.
pub const TREEGRID_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Types for describing inputs and building adaptive grids.
pub mod types {
    /// General geometry types for spatial operations and representations.
    pub mod geometry;
    /// Aggregation, refinement and emission of adaptive hyper tree grids.
    pub mod resampling;
}

/// Utility modules for logging and math operations.
pub mod utils {
    /// Logging utilities for debugging and tracing.
    pub mod logging;
    /// Mathematical helper functions.
    pub mod math_helper;
}
