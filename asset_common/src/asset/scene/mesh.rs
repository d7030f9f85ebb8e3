use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use ultraviolet::{Vec2, Vec3, Vec4};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum MeshPrimitive {
    Points,
    Lines,
    Triangles,
}

/// A decoded mesh, as handed out by an importer.
///
/// Attribute vectors other than `positions` are either empty or have one
/// entry per position.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct MeshData {
    pub primitive: MeshPrimitive,
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub uvs: Vec<Vec2>,
    pub colors: Vec<Vec4>,
    /// Per-vertex semantic object ids, only present on instance meshes.
    pub object_ids: Vec<u32>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn new(primitive: MeshPrimitive, positions: Vec<Vec3>, indices: Vec<u32>) -> Self {
        Self {
            primitive,
            positions,
            normals: Vec::new(),
            uvs: Vec::new(),
            colors: Vec::new(),
            object_ids: Vec::new(),
            indices,
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn collision_mesh_data(&self) -> CollisionMeshData {
        CollisionMeshData {
            primitive: self.primitive,
            positions: self.positions.clone(),
            indices: self.indices.clone(),
        }
    }

    /// Drops normals, they are only needed for lit rendering.
    pub fn without_normals(mut self) -> Self {
        self.normals.clear();
        self
    }

    /// Converts a triangle mesh into a line mesh containing every edge once.
    pub fn into_wireframe(self) -> Self {
        if self.primitive != MeshPrimitive::Triangles {
            return self;
        }
        let mut seen = HashSet::new();
        let mut lines = Vec::new();
        for triangle in self.indices.chunks_exact(3) {
            for (a, b) in [
                (triangle[0], triangle[1]),
                (triangle[1], triangle[2]),
                (triangle[2], triangle[0]),
            ] {
                if seen.insert((a.min(b), a.max(b))) {
                    lines.push(a);
                    lines.push(b);
                }
            }
        }
        Self {
            primitive: MeshPrimitive::Lines,
            normals: Vec::new(),
            indices: lines,
            ..self
        }
    }

    /// Axis aligned cube spanning `[-1, 1]` on every axis, with per-face normals.
    pub fn cube_solid() -> MeshData {
        struct CubeFace {
            position_indices: [usize; 4],
            normal: Vec3,
        }

        let positions: [Vec3; 8] = [
            // front
            Vec3::new(-1.0, -1.0, 1.0),
            Vec3::new(1.0, -1.0, 1.0),
            Vec3::new(1.0, 1.0, 1.0),
            Vec3::new(-1.0, 1.0, 1.0),
            // back
            Vec3::new(-1.0, -1.0, -1.0),
            Vec3::new(1.0, -1.0, -1.0),
            Vec3::new(1.0, 1.0, -1.0),
            Vec3::new(-1.0, 1.0, -1.0),
        ];

        let faces: [CubeFace; 6] = [
            // front
            CubeFace {
                position_indices: [0, 1, 2, 3],
                normal: Vec3::new(0.0, 0.0, 1.0),
            },
            // back
            CubeFace {
                position_indices: [5, 4, 7, 6],
                normal: Vec3::new(0.0, 0.0, -1.0),
            },
            // right
            CubeFace {
                position_indices: [1, 5, 6, 2],
                normal: Vec3::new(1.0, 0.0, 0.0),
            },
            // left
            CubeFace {
                position_indices: [4, 0, 3, 7],
                normal: Vec3::new(-1.0, 0.0, 0.0),
            },
            // up
            CubeFace {
                position_indices: [3, 2, 6, 7],
                normal: Vec3::new(0.0, 1.0, 0.0),
            },
            // down
            CubeFace {
                position_indices: [1, 0, 4, 5],
                normal: Vec3::new(0.0, -1.0, 0.0),
            },
        ];

        let uvs_face: [Vec2; 4] = [
            Vec2::new(0.0, 1.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(0.0, 0.0),
        ];

        let mut mesh = MeshData::new(MeshPrimitive::Triangles, Vec::new(), Vec::new());
        for face in faces.iter() {
            for (i, pos_index) in face.position_indices.iter().enumerate() {
                mesh.positions.push(positions[*pos_index]);
                mesh.normals.push(face.normal);
                mesh.uvs.push(uvs_face[i]);
            }
        }

        let face_indices_schema = [
            0, 1, 2, // bottom right
            2, 3, 0, // top left
        ];

        mesh.indices = (0..faces.len())
            .flat_map(|face_index| {
                let offset = 4 * face_index as u32;
                face_indices_schema.map(|i| offset + i)
            })
            .collect();
        mesh
    }
}

/// The geometry handed to the physics collaborator: positions and indices only.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct CollisionMeshData {
    pub primitive: MeshPrimitive,
    pub positions: Vec<Vec3>,
    pub indices: Vec<u32>,
}

impl Default for MeshPrimitive {
    fn default() -> Self {
        MeshPrimitive::Triangles
    }
}

impl CollisionMeshData {
    pub fn new(positions: Vec<Vec3>, indices: Vec<u32>) -> Self {
        Self {
            primitive: MeshPrimitive::Triangles,
            positions,
            indices,
        }
    }

    pub fn triangle_count(&self) -> usize {
        match self.primitive {
            MeshPrimitive::Triangles => self.indices.len() / 3,
            _ => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cube_has_twelve_triangles() {
        let cube = MeshData::cube_solid();
        assert_eq!(cube.vertex_count(), 24);
        assert_eq!(cube.collision_mesh_data().triangle_count(), 12);
        assert!(cube.indices.iter().all(|&i| (i as usize) < cube.vertex_count()));
    }

    #[test]
    fn wireframe_keeps_each_edge_once() {
        let quad = MeshData::new(
            MeshPrimitive::Triangles,
            vec![Vec3::zero(), Vec3::unit_x(), Vec3::one(), Vec3::unit_y()],
            vec![0, 1, 2, 2, 3, 0],
        );
        let wireframe = quad.into_wireframe();
        assert_eq!(wireframe.primitive, MeshPrimitive::Lines);
        // four outer edges plus the shared diagonal
        assert_eq!(wireframe.indices.len(), 10);
    }
}
