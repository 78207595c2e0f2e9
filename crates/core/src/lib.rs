//! # windmesh Core
//!
//! Core types for the windmesh wind interpolation engine.
//!
//! This crate provides:
//! - `PointSet`: columnar planar point collection with append-only attributes
//! - `Mesh`: index-addressed node arena produced by grid densification
//! - `Error`: the shared error taxonomy

pub mod error;
pub mod points;

pub use error::{Error, Result};
pub use points::{InterpolationSource, Mesh, PointSet};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::points::{InterpolationSource, Mesh, PointSet};
}
