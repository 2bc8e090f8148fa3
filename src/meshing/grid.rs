use bevy::{log::debug, prelude::Vec3};
use serde::{Deserialize, Serialize};

use super::TerrainMeshData;
use crate::HeightField;

/// Scene-specific thresholds for the grid triangulation.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TriangulationSettings {
    /// Vertices below this height are under water: they neither contribute
    /// normals nor survive culling.
    pub sea_level: f32,
    /// Triangles with any vertex further forward (larger world z) are culled.
    pub max_visible_z: f32,
    /// Added to every u coordinate to keep samples off the texture seam.
    pub uv_seam_bias: f32,
    /// Leave the final triangle out of normal accumulation.
    pub skip_last_normal: bool,
}

impl Default for TriangulationSettings {
    fn default() -> Self {
        Self {
            sea_level: 0.,
            max_visible_z: -200.,
            uv_seam_bias: 0.003,
            skip_last_normal: true,
        }
    }
}

impl TriangulationSettings {
    pub fn is_above_water(&self, corners: [Vec3; 3]) -> bool {
        corners.iter().all(|v| v.y >= self.sea_level)
    }

    pub fn is_visible(&self, corners: [Vec3; 3]) -> bool {
        !corners
            .iter()
            .any(|v| v.y < self.sea_level || v.z > self.max_visible_z)
    }
}

/// Output of [`triangulate`]. `vertices`, `normals` and `uvs` have one entry per
/// grid sample; `triangles` holds every generated triangle and `visible` the
/// ones that survived culling, in the same order and with the same indices.
#[derive(Clone, Debug, Default)]
pub struct Triangulation {
    pub vertices: Vec<Vec3>,
    pub triangles: Vec<[u32; 3]>,
    pub normals: Vec<Vec3>,
    pub uvs: Vec<[f32; 2]>,
    pub visible: Vec<[u32; 3]>,
}

impl Triangulation {
    pub fn index_count(&self) -> usize {
        3 * self.visible.len()
    }
}

pub fn heightmap_to_grid_mesh(terrain: &HeightField, settings: &TriangulationSettings) -> TerrainMeshData {
    TerrainMeshData::build(triangulate(terrain, settings))
}

pub fn triangulate(terrain: &HeightField, settings: &TriangulationSettings) -> Triangulation {
    let vertices: Vec<Vec3> = (0..terrain.number_of_points())
        .map(|i| terrain.vertex_at(i))
        .collect();

    let triangles = split_cells(terrain, &vertices);
    let normals = accumulate_normals(&vertices, &triangles, settings);
    let uvs = tex_coords(terrain, settings.uv_seam_bias);

    let visible: Vec<[u32; 3]> = triangles
        .iter()
        .copied()
        .filter(|tri| settings.is_visible(corners(&vertices, tri)))
        .collect();

    debug!(
        "Triangulated {}x{} grid: {} triangles, {} visible",
        terrain.cols(),
        terrain.rows(),
        triangles.len(),
        visible.len()
    );

    Triangulation {
        vertices,
        triangles,
        normals,
        uvs,
        visible,
    }
}

pub fn face_normal(corners: [Vec3; 3]) -> Vec3 {
    let [v0, v1, v2] = corners;
    (v1 - v0).cross(v2 - v0).normalize_or_zero()
}

fn corners(vertices: &[Vec3], tri: &[u32; 3]) -> [Vec3; 3] {
    tri.map(|i| vertices[i as usize])
}

// Two triangles per cell, split along whichever diagonal is shorter in 3D.
fn split_cells(terrain: &HeightField, vertices: &[Vec3]) -> Vec<[u32; 3]> {
    let (cols, rows) = terrain.dim();
    if rows < 2 || cols < 2 {
        return Vec::new();
    }

    let mut triangles = Vec::with_capacity(2 * (rows - 1) * (cols - 1));

    for r in 0..rows - 1 {
        for c in 0..cols - 1 {
            let i0 = terrain.rc2index(r, c);
            let i1 = terrain.rc2index(r + 1, c);
            let i2 = terrain.rc2index(r, c + 1);
            let i3 = terrain.rc2index(r + 1, c + 1);

            let diag0 = vertices[i2].distance(vertices[i1]);
            let diag1 = vertices[i3].distance(vertices[i0]);

            // HeightField caps the point count at u32::MAX.
            let [i0, i1, i2, i3] = [i0, i1, i2, i3].map(|i| i as u32);
            if diag0 < diag1 {
                triangles.extend([[i0, i2, i1], [i1, i2, i3]]);
            } else {
                triangles.extend([[i0, i2, i3], [i3, i1, i0]]);
            }
        }
    }

    triangles
}

// Face normals are subtracted, which flips the downward-wound faces up.
fn accumulate_normals(
    vertices: &[Vec3],
    triangles: &[[u32; 3]],
    settings: &TriangulationSettings,
) -> Vec<Vec3> {
    let mut normals = vec![Vec3::ZERO; vertices.len()];

    let count = if settings.skip_last_normal {
        triangles.len().saturating_sub(1)
    } else {
        triangles.len()
    };

    for tri in &triangles[..count] {
        let corners = corners(vertices, tri);
        if !settings.is_above_water(corners) {
            continue;
        }

        let normal = face_normal(corners);
        for i in tri {
            normals[*i as usize] -= normal;
        }
    }

    normals
}

fn tex_coords(terrain: &HeightField, seam_bias: f32) -> Vec<[f32; 2]> {
    let (cols, rows) = terrain.dim();
    let fraction = |n: usize, len: usize| if len > 1 { n as f32 / (len - 1) as f32 } else { 0. };

    (0..terrain.number_of_points())
        .map(|i| {
            let (row, col) = (i % rows, i / rows);
            [fraction(col, cols) + seam_bias, fraction(row, rows)]
        })
        .collect()
}
