use super::heightmap::{HeightField, HeightFieldError};

use ndarray::prelude::*;
use noise::{NoiseFn, Perlin};

pub struct NoiseSettings {
    pub scale: f32,
    pub octaves: usize,
}

impl Default for NoiseSettings {
    fn default() -> Self {
        Self {
            scale: 5e-3,
            octaves: 8,
        }
    }
}

/// Perlin terrain with heights in `0..1`, laid out `(cols, rows)`.
pub fn perlin_terrain(
    (cols, rows): (usize, usize),
    seed: u32,
    noise_settings: NoiseSettings,
) -> Result<HeightField, HeightFieldError> {
    let octaves = noise_settings.octaves;
    let scale_start = noise_settings.scale;

    let perlin = Perlin::new(seed);

    let mut data = Array::zeros((cols, rows));

    for col in 0..cols {
        for row in 0..rows {
            let mut scale = 1.;

            for i in 0..octaves {
                data[[col, row]] += scale
                    * perlin.get([
                        (i as f32 * 1000. + scale_start / scale * row as f32) as f64,
                        (scale_start / scale * col as f32) as f64,
                    ]) as f32;
                scale /= 2.;
            }
        }
    }

    // Calculate the maximum magnitude of the terrain
    let (max_magnitude, _) = (0..octaves).fold((0.0, 1.0), |(max_magnitude, scale), _| {
        (max_magnitude + scale, scale / 2.0)
    });

    // Covert the values from -max_magnitude..max_magnitude to 0..1
    let data: Array2<f32> = (data / max_magnitude + 1.) / 2.;

    HeightField::from_heights(cols, rows, data.iter().copied().collect())
}

impl HeightField {
    pub fn multiply(&mut self, mult: f32) {
        self.heights_mut().map_inplace(|v| *v *= mult);
    }

    pub fn offset(&mut self, amount: f32) {
        self.heights_mut().map_inplace(|v| *v += amount);
    }

    pub fn clamp(&mut self, min: f32, max: f32) {
        self.heights_mut().map_inplace(|v| *v = v.clamp(min, max));
    }
}
