mod grid;

pub use grid::{face_normal, heightmap_to_grid_mesh, triangulate, Triangulation, TriangulationSettings};

use bevy::{
    log::warn,
    prelude::*,
    render::{mesh::Indices, render_resource::PrimitiveTopology},
};
use bytemuck::{Pod, Zeroable};

/// Interleaved vertex record: position, uv, normal.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct TerrainVertex {
    pub position: [f32; 3],
    pub tex_coord: [f32; 2],
    pub normal: [f32; 3],
}

/// A triangulated terrain ready for upload. The vertex attributes always cover
/// the whole grid; only the index buffer reflects culling.
#[derive(Clone, Debug, Default)]
pub struct TerrainMeshData {
    vertices: Vec<Vec3>,
    uvs: Vec<[f32; 2]>,
    normals: Vec<Vec3>,
    triangles: Vec<u32>,
}

impl TerrainMeshData {
    pub fn build(triangulation: Triangulation) -> Self {
        let Triangulation {
            vertices,
            normals,
            uvs,
            visible,
            ..
        } = triangulation;

        Self {
            vertices,
            uvs,
            normals,
            triangles: visible.into_iter().flatten().collect(),
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn index_count(&self) -> usize {
        self.triangles.len()
    }

    pub fn indices(&self) -> &[u32] {
        &self.triangles
    }

    pub fn vertices(&self) -> Vec<TerrainVertex> {
        self.vertices
            .iter()
            .zip(&self.uvs)
            .zip(&self.normals)
            .map(|((position, tex_coord), normal)| TerrainVertex {
                position: position.to_array(),
                tex_coord: *tex_coord,
                normal: normal.to_array(),
            })
            .collect()
    }

    /// Vertex buffer contents in the interleaved layout.
    pub fn vertex_bytes(&self) -> Vec<u8> {
        bytemuck::cast_slice(&self.vertices()).to_vec()
    }

    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.triangles)
    }

    /// `with_tangents` is needed when the material samples a bump map.
    pub fn into_render_mesh(self, with_tangents: bool) -> Mesh {
        let mut mesh = Mesh::new(PrimitiveTopology::TriangleList);

        mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, self.vertices);
        mesh.insert_attribute(Mesh::ATTRIBUTE_UV_0, self.uvs);
        mesh.insert_attribute(Mesh::ATTRIBUTE_NORMAL, self.normals);

        mesh.set_indices(Some(Indices::U32(self.triangles)));

        if with_tangents {
            if let Err(err) = mesh.generate_tangents() {
                warn!("Terrain tangents unavailable, bump mapping will look flat: {err}");
            }
        }

        mesh
    }
}
