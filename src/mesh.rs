use std::{collections::BTreeMap, path::PathBuf};

use asset_common::{
    bounds::Aabb,
    scene::{CollisionMeshData, MeshData, MeshPrimitive},
};
use ultraviolet::{Mat4, Vec3};

use crate::gpu::{GpuBackend, GpuMeshHandle};

/// A mesh read through a generic importer, or generated as a primitive.
#[derive(Clone, Debug)]
pub struct GenericMeshData {
    pub render: MeshData,
    pub collision: CollisionMeshData,
    pub bb: Option<Aabb>,
    pub mesh_transform: Mat4,
    pub gpu: Option<GpuMeshHandle>,
}

impl GenericMeshData {
    /// Normals are only kept when the mesh will be lit.
    pub fn new(mesh: MeshData, requires_lighting: bool) -> Self {
        let render = if requires_lighting {
            mesh
        } else {
            mesh.without_normals()
        };
        let collision = render.collision_mesh_data();
        Self {
            bb: Aabb::from_points(collision.positions.iter().copied()),
            render,
            collision,
            mesh_transform: Mat4::identity(),
            gpu: None,
        }
    }
}

/// A semantic mesh where every vertex carries the id of the object it belongs to.
#[derive(Clone, Debug)]
pub struct InstanceMeshData {
    pub render: MeshData,
    pub collision: CollisionMeshData,
    /// `None` when the mesh was not split per object.
    pub object_id: Option<u32>,
    pub bb: Option<Aabb>,
    pub mesh_transform: Mat4,
    pub gpu: Option<GpuMeshHandle>,
}

impl InstanceMeshData {
    pub fn new(render: MeshData, object_id: Option<u32>) -> Self {
        let collision = render.collision_mesh_data();
        Self {
            bb: Aabb::from_points(collision.positions.iter().copied()),
            render,
            collision,
            object_id,
            mesh_transform: Mat4::identity(),
            gpu: None,
        }
    }

    /// Splits a semantic mesh into one mesh per object id, sorted by id.
    ///
    /// A triangle belongs to the object of its first vertex. Vertices are
    /// copied into every object that references them.
    pub fn split_by_object_id(mesh: &MeshData) -> Vec<InstanceMeshData> {
        if mesh.object_ids.len() != mesh.vertex_count() {
            log::error!(
                "Instance mesh has {} object ids for {} vertices, not splitting",
                mesh.object_ids.len(),
                mesh.vertex_count()
            );
            return Vec::new();
        }

        let mut triangles_by_object: BTreeMap<u32, Vec<[u32; 3]>> = BTreeMap::new();
        for triangle in mesh.indices.chunks_exact(3) {
            let object_id = mesh.object_ids[triangle[0] as usize];
            triangles_by_object
                .entry(object_id)
                .or_default()
                .push([triangle[0], triangle[1], triangle[2]]);
        }

        triangles_by_object
            .into_iter()
            .map(|(object_id, triangles)| {
                let mut remap = BTreeMap::new();
                let mut part = MeshData::new(mesh.primitive, Vec::new(), Vec::new());
                for index in triangles.into_iter().flatten() {
                    let new_index = *remap.entry(index).or_insert_with(|| {
                        copy_vertex(mesh, index as usize, &mut part);
                        part.positions.len() as u32 - 1
                    });
                    part.indices.push(new_index);
                }
                InstanceMeshData::new(part, Some(object_id))
            })
            .collect()
    }
}

fn copy_vertex(source: &MeshData, index: usize, target: &mut MeshData) {
    target.positions.push(source.positions[index]);
    if let Some(normal) = source.normals.get(index) {
        target.normals.push(*normal);
    }
    if let Some(uv) = source.uvs.get(index) {
        target.uvs.push(*uv);
    }
    if let Some(color) = source.colors.get(index) {
        target.colors.push(*color);
    }
    if let Some(object_id) = source.object_ids.get(index) {
        target.object_ids.push(*object_id);
    }
}

/// A large mesh split into tiles, each textured from an atlas in `atlas_dir`.
#[derive(Clone, Debug)]
pub struct TiledTextureMeshData {
    pub submeshes: Vec<MeshData>,
    pub atlas_dir: PathBuf,
    /// All tiles joined into one collision mesh.
    pub collision: CollisionMeshData,
    pub bb: Option<Aabb>,
    pub mesh_transform: Mat4,
    pub gpu: Vec<GpuMeshHandle>,
}

impl TiledTextureMeshData {
    pub fn new(submeshes: Vec<MeshData>, atlas_dir: PathBuf) -> Self {
        let mut collision = CollisionMeshData::new(Vec::new(), Vec::new());
        for submesh in &submeshes {
            let offset = collision.positions.len() as u32;
            collision.positions.extend_from_slice(&submesh.positions);
            collision
                .indices
                .extend(submesh.indices.iter().map(|index| index + offset));
        }
        Self {
            bb: Aabb::from_points(collision.positions.iter().copied()),
            submeshes,
            atlas_dir,
            collision,
            mesh_transform: Mat4::identity(),
            gpu: Vec::new(),
        }
    }

    pub fn submesh_count(&self) -> usize {
        self.submeshes.len()
    }
}

/// Everything that can live in the global mesh pool.
#[derive(Clone, Debug)]
pub enum BaseMesh {
    Generic(GenericMeshData),
    Instance(InstanceMeshData),
    TiledTexture(TiledTextureMeshData),
    Primitive(GenericMeshData),
}

impl BaseMesh {
    pub fn collision_mesh_data(&self) -> &CollisionMeshData {
        match self {
            BaseMesh::Generic(mesh) | BaseMesh::Primitive(mesh) => &mesh.collision,
            BaseMesh::Instance(mesh) => &mesh.collision,
            BaseMesh::TiledTexture(mesh) => &mesh.collision,
        }
    }

    pub fn collision_mesh_data_mut(&mut self) -> &mut CollisionMeshData {
        match self {
            BaseMesh::Generic(mesh) | BaseMesh::Primitive(mesh) => &mut mesh.collision,
            BaseMesh::Instance(mesh) => &mut mesh.collision,
            BaseMesh::TiledTexture(mesh) => &mut mesh.collision,
        }
    }

    pub fn bb(&self) -> Option<Aabb> {
        match self {
            BaseMesh::Generic(mesh) | BaseMesh::Primitive(mesh) => mesh.bb,
            BaseMesh::Instance(mesh) => mesh.bb,
            BaseMesh::TiledTexture(mesh) => mesh.bb,
        }
    }

    pub fn set_bb(&mut self, bb: Option<Aabb>) {
        match self {
            BaseMesh::Generic(mesh) | BaseMesh::Primitive(mesh) => mesh.bb = bb,
            BaseMesh::Instance(mesh) => mesh.bb = bb,
            BaseMesh::TiledTexture(mesh) => mesh.bb = bb,
        }
    }

    pub fn mesh_transform(&self) -> Mat4 {
        match self {
            BaseMesh::Generic(mesh) | BaseMesh::Primitive(mesh) => mesh.mesh_transform,
            BaseMesh::Instance(mesh) => mesh.mesh_transform,
            BaseMesh::TiledTexture(mesh) => mesh.mesh_transform,
        }
    }

    fn mesh_transform_mut(&mut self) -> &mut Mat4 {
        match self {
            BaseMesh::Generic(mesh) | BaseMesh::Primitive(mesh) => &mut mesh.mesh_transform,
            BaseMesh::Instance(mesh) => &mut mesh.mesh_transform,
            BaseMesh::TiledTexture(mesh) => &mut mesh.mesh_transform,
        }
    }

    /// Positions used for world space bounds of a drawable. Tiled meshes are
    /// looked at per submesh.
    pub fn drawable_positions(&self, submesh: Option<usize>) -> &[Vec3] {
        match (self, submesh) {
            (BaseMesh::TiledTexture(mesh), Some(submesh)) => mesh
                .submeshes
                .get(submesh)
                .map(|s| s.positions.as_slice())
                .unwrap_or(&[]),
            (BaseMesh::Generic(mesh) | BaseMesh::Primitive(mesh), _) => &mesh.render.positions,
            (BaseMesh::Instance(mesh), _) => &mesh.render.positions,
            (BaseMesh::TiledTexture(mesh), None) => &mesh.collision.positions,
        }
    }

    pub fn is_triangle_mesh(&self) -> bool {
        self.collision_mesh_data().primitive == MeshPrimitive::Triangles
    }

    /// Moves the collision geometry and its bounds by `translation`, and
    /// remembers the shift in the mesh transform.
    pub fn translate(&mut self, translation: Vec3) {
        let transform = Mat4::from_translation(translation);
        for position in self.collision_mesh_data_mut().positions.iter_mut() {
            *position = transform.transform_point3(*position);
        }
        let mesh_transform = self.mesh_transform_mut();
        *mesh_transform = transform * *mesh_transform;
        let bb = self.bb().map(|bb| bb.translated(translation));
        self.set_bb(bb);
    }

    pub fn upload_buffers_to_gpu(&mut self, gpu: &mut dyn GpuBackend) -> anyhow::Result<()> {
        match self {
            BaseMesh::Generic(mesh) | BaseMesh::Primitive(mesh) => {
                if mesh.gpu.is_none() {
                    mesh.gpu = Some(gpu.upload_mesh(&mesh.render)?);
                }
            }
            BaseMesh::Instance(mesh) => {
                if mesh.gpu.is_none() {
                    mesh.gpu = Some(gpu.upload_mesh(&mesh.render)?);
                }
            }
            BaseMesh::TiledTexture(mesh) => {
                if mesh.gpu.is_empty() {
                    mesh.gpu = mesh
                        .submeshes
                        .iter()
                        .map(|submesh| gpu.upload_mesh(submesh))
                        .collect::<anyhow::Result<_>>()?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_objects() -> MeshData {
        let mut mesh = MeshData::new(
            MeshPrimitive::Triangles,
            vec![
                Vec3::zero(),
                Vec3::unit_x(),
                Vec3::unit_y(),
                Vec3::new(5.0, 0.0, 0.0),
                Vec3::new(6.0, 0.0, 0.0),
                Vec3::new(5.0, 1.0, 0.0),
            ],
            vec![3, 4, 5, 0, 1, 2, 0, 2, 1],
        );
        mesh.object_ids = vec![7, 7, 7, 2, 2, 2];
        mesh
    }

    #[test]
    fn split_sorts_by_object_id_and_remaps_indices() {
        let parts = InstanceMeshData::split_by_object_id(&two_objects());
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].object_id, Some(2));
        assert_eq!(parts[0].render.positions[0], Vec3::new(5.0, 0.0, 0.0));
        assert_eq!(parts[0].render.indices, vec![0, 1, 2]);
        assert_eq!(parts[1].object_id, Some(7));
        assert_eq!(parts[1].render.vertex_count(), 3);
        assert_eq!(parts[1].render.indices, vec![0, 1, 2, 0, 2, 1]);
    }

    #[test]
    fn split_without_object_ids_yields_nothing() {
        let mut mesh = two_objects();
        mesh.object_ids.clear();
        assert!(InstanceMeshData::split_by_object_id(&mesh).is_empty());
    }

    #[test]
    fn translate_moves_collision_and_bounds() {
        let mut mesh = BaseMesh::Generic(GenericMeshData::new(MeshData::cube_solid(), false));
        let t = Vec3::new(0.0, 2.0, 0.0);
        mesh.translate(t);
        let bb = mesh.bb().unwrap();
        assert_eq!(bb.min, Vec3::new(-1.0, 1.0, -1.0));
        assert_eq!(bb.max, Vec3::new(1.0, 3.0, 1.0));
        assert_eq!(mesh.mesh_transform().transform_point3(Vec3::zero()), t);
        assert!(mesh
            .collision_mesh_data()
            .positions
            .iter()
            .all(|p| p.y >= 1.0 && p.y <= 3.0));
    }

    #[test]
    fn tiles_are_joined_for_collision() {
        let tiles = vec![MeshData::cube_solid(), MeshData::cube_solid()];
        let tiled = TiledTextureMeshData::new(tiles, PathBuf::from("textures"));
        assert_eq!(tiled.collision.positions.len(), 48);
        assert_eq!(tiled.collision.indices[36], 24);
        assert_eq!(tiled.submesh_count(), 2);
    }
}
