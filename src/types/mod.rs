pub mod bounds;
pub mod mesh;

pub use bounds::{BoundingBox, BoundingSphere};
pub use mesh::{Mesh, PrimitiveTopology};
