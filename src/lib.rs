pub mod config;
pub mod error;
pub mod lod;
pub mod procedural;
pub mod simplify;
pub mod simulation;
pub mod telemetry;
pub mod types;

pub use error::{AutoLodError, Result};
pub use lod::{AutoLodManager, LodGroup, LodMesh, MeshHandle, SelectionPolicy};
pub use simplify::simplify;
pub use types::{Mesh, PrimitiveTopology};
