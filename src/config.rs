use std::{
    fs, io,
    path::{Path, PathBuf},
};

use bevy::{
    log::info,
    prelude::{Resource, Vec3},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{BoundingRegion, TriangulationSettings};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read scene config {}: {source}", .path.display())]
    Io { path: PathBuf, source: io::Error },
    #[error("invalid scene config {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnimatedBumpMapConfig {
    /// Frames are `{prefix}1.png` through `{prefix}{number_of_frames}.png`.
    pub prefix: String,
    pub number_of_frames: usize,
    pub frame_wait: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub start: Vec3,
    pub look_at: Vec3,
    pub path_samples: usize,
    pub orbit_radius: f32,
    pub orbit_height: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            start: Vec3::new(1280., 600., -10.),
            look_at: Vec3::new(1280., 0., -1280.),
            path_samples: 300,
            orbit_radius: 400.,
            orbit_height: 50.,
        }
    }
}

/// Everything the scene reads at startup.
#[derive(Resource, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Filesystem path of the binary heightmap.
    pub heightmap: PathBuf,
    /// Asset paths, relative to the asset folder.
    pub color_texture: Option<String>,
    pub bump_map: Option<String>,
    pub animated_bump_map: Option<AnimatedBumpMapConfig>,
    pub bump_mapping: bool,
    pub triangulation: TriangulationSettings,
    pub bounds: BoundingRegion,
    pub camera: CameraConfig,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            heightmap: PathBuf::from("assets/terrain/heightmap.bin"),
            color_texture: None,
            bump_map: None,
            animated_bump_map: None,
            bump_mapping: false,
            triangulation: TriangulationSettings::default(),
            bounds: BoundingRegion::default(),
            camera: CameraConfig::default(),
        }
    }
}

impl SceneConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// A missing file means defaults; an unreadable or malformed one is still an error.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            info!("No scene config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        Self::load(path)
    }
}
