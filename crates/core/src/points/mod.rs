//! Point sets and meshes

mod mesh;
mod point_set;

pub use mesh::{InterpolationSource, Mesh};
pub use point_set::PointSet;
