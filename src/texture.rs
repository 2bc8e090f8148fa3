use bevy::{log::info, prelude::*};

/// Ring of bump-map frames. Each frame is held for `frame_wait` ticks before
/// the next one, wrapping after the last.
#[derive(Clone, Debug)]
pub struct AnimatedBumpMap {
    frames: Vec<Handle<Image>>,
    frame_wait: u32,
    steps_left: u32,
    current: usize,
}

impl AnimatedBumpMap {
    pub fn new(frames: Vec<Handle<Image>>, frame_wait: u32) -> Self {
        let frame_wait = frame_wait.max(1);
        Self {
            frames,
            frame_wait,
            steps_left: frame_wait,
            current: 0,
        }
    }

    /// Loads `{prefix}1.png` through `{prefix}{number_of_frames}.png`.
    pub fn load(asset_server: &AssetServer, prefix: &str, number_of_frames: usize, frame_wait: u32) -> Self {
        let frames = (1..=number_of_frames)
            .map(|i| {
                let path = format!("{prefix}{i}.png");
                asset_server.load(path.as_str())
            })
            .collect();

        info!("Loading {number_of_frames} animated bump map frames from {prefix}");

        Self::new(frames, frame_wait)
    }

    pub fn number_of_frames(&self) -> usize {
        self.frames.len()
    }

    pub fn frame_index(&self) -> usize {
        self.current
    }

    pub fn current_frame(&self) -> Option<&Handle<Image>> {
        self.frames.get(self.current)
    }

    /// One animation tick. Returns `true` when the visible frame changed.
    pub fn step(&mut self) -> bool {
        if self.frames.is_empty() {
            return false;
        }

        self.steps_left -= 1;
        if self.steps_left > 0 {
            return false;
        }

        self.steps_left = self.frame_wait;
        self.current = (self.current + 1) % self.frames.len();
        true
    }
}

/// Textures bound when drawing the terrain: the color map on the first unit
/// and, while bump mapping is on, a bump map on the second.
#[derive(Resource, Clone, Debug, Default)]
pub struct TerrainTextures {
    pub color: Option<Handle<Image>>,
    pub bump_map: Option<Handle<Image>>,
    pub animated_bump_map: Option<AnimatedBumpMap>,
    pub bump_mapping: bool,
}

impl TerrainTextures {
    pub fn has_bump_map(&self) -> bool {
        self.bump_map.is_some()
            || self
                .animated_bump_map
                .as_ref()
                .map_or(false, |animated| animated.number_of_frames() > 0)
    }

    pub fn toggle_bump_mapping(&mut self) {
        self.bump_mapping = !self.bump_mapping;
    }

    /// The animated frame wins over the static bump map.
    pub fn active_bump_map(&self) -> Option<&Handle<Image>> {
        if !self.bump_mapping {
            return None;
        }

        self.animated_bump_map
            .as_ref()
            .and_then(AnimatedBumpMap::current_frame)
            .or(self.bump_map.as_ref())
    }

    pub fn step(&mut self) -> bool {
        self.animated_bump_map
            .as_mut()
            .map_or(false, AnimatedBumpMap::step)
    }

    pub fn apply(&self, material: &mut StandardMaterial) {
        material.base_color_texture = self.color.clone();
        material.normal_map_texture = self.active_bump_map().cloned();
    }
}
