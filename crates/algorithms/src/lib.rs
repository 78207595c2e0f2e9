//! # windmesh Algorithms
//!
//! Spatial interpolation and model selection for gridded wind fields.
//!
//! ## Modules
//!
//! - **interpolation**: k-d tree, empirical variograms, model selection by
//!   cross-validation, IDW, ordinary/universal kriging, regression kriging
//! - **grid**: densification of a native lattice into a finer mesh
//! - **sampling**: seeded hold-out split, subsampling and fold assignment
//! - **suite**: the end-to-end interpolation run for one partition
//! - **wind**: u/v ↔ speed/direction conversion
//! - **export**: flat per-node records for downstream writers

pub mod export;
pub mod grid;
pub mod interpolation;
mod maybe_rayon;
pub mod sampling;
pub mod suite;
pub mod wind;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::grid::{densify, native_ticks, Densified};
    pub use crate::interpolation::{
        empirical_variogram, predict, regression_krige, select_model, AccuracyMetrics,
        EmpiricalVariogram, ModelFamily, ModelSelection, Prediction, RegressionKrigingParams,
        SamplePoint, SelectionParams, VariogramFit, VariogramModel,
    };
    pub use crate::suite::{run_suite, ModelStrategy, SuiteConfig, SuiteOutput};
    pub use windmesh_core::prelude::*;
}
