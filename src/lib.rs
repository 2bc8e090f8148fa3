pub mod bounds;
pub mod camera;
pub mod config;
pub mod generation;
mod heightmap;
pub mod meshing;
pub mod path;
pub mod texture;

pub use bounds::BoundingRegion;
pub use config::SceneConfig;
pub use heightmap::{HeightField, HeightFieldError};
pub use meshing::{TerrainMeshData, TriangulationSettings};
pub use path::{circle_control_points, BezierPath, PathError};
pub use texture::{AnimatedBumpMap, TerrainTextures};
