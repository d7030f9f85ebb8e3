use asset_common::bounds::Aabb;
use ultraviolet::{Mat4, Vec3};

use super::ResourceManager;
use crate::{
    bounding_box::{AbsoluteAabbPass, StaticDrawableInfo},
    error::AssetError,
    mesh::BaseMesh,
    meta_data::{MeshMetaData, MeshTransformNode},
    scene_graph::{Drawable, NodeId, SceneTarget},
    shader_manager::{is_light_setup_compatible, DEFAULT_MATERIAL_KEY},
};

/// All collision geometry of an asset in one buffer, in world space of the
/// asset root.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct JoinedMesh {
    pub vbo: Vec<Vec3>,
    pub ibo: Vec<u32>,
}

impl ResourceManager {
    /// Creates a scene node for `node` below `target.parent` and recurses into
    /// its children below that new node.
    pub(super) fn add_component(
        &self,
        meta_data: &MeshMetaData,
        mut target: SceneTarget<'_>,
        light_setup: &str,
        node: &MeshTransformNode,
        aabb_pass: &mut Option<AbsoluteAabbPass>,
    ) {
        let scene_node = target.graph.create_child(target.parent);
        target
            .graph
            .set_transformation(scene_node, node.transform_from_local_to_parent);

        if let Some(mesh_id_local) = node.mesh_id_local {
            match meta_data.mesh_index.global(mesh_id_local) {
                Some(mesh_id) => self.add_mesh_to_drawables(
                    meta_data,
                    &mut target,
                    scene_node,
                    mesh_id,
                    node.material_id_local,
                    light_setup,
                    aabb_pass,
                ),
                None => log::error!(
                    "Local mesh {} is outside the asset's {} meshes",
                    mesh_id_local,
                    meta_data.mesh_index.count
                ),
            }
        }

        for child in &node.children {
            self.add_component(
                meta_data,
                target.reborrow().with_parent(scene_node),
                light_setup,
                child,
                aabb_pass,
            );
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn add_mesh_to_drawables(
        &self,
        meta_data: &MeshMetaData,
        target: &mut SceneTarget<'_>,
        scene_node: NodeId,
        mesh_id: usize,
        material_id_local: Option<usize>,
        light_setup: &str,
        aabb_pass: &mut Option<AbsoluteAabbPass>,
    ) {
        let material = match material_id_local {
            Some(local) => match meta_data.material_index.global(local) {
                Some(material_id) => material_id.to_string(),
                None => {
                    log::error!(
                        "Local material {} is outside the asset's {} materials, using the default",
                        local,
                        meta_data.material_index.count
                    );
                    DEFAULT_MATERIAL_KEY.to_string()
                }
            },
            None => DEFAULT_MATERIAL_KEY.to_string(),
        };

        target.graph.add_drawable(
            scene_node,
            Drawable {
                mesh_id,
                submesh: None,
                light_setup: light_setup.to_string(),
                material,
                object_id: None,
            },
        );
        target.graph.node_mut(scene_node).mesh_bb =
            self.meshes.get(mesh_id).and_then(Self::compute_mesh_bb);
        target.drawables.nodes.push(scene_node);

        if let Some(pass) = aabb_pass.as_mut() {
            pass.record(StaticDrawableInfo {
                node: scene_node,
                mesh_id,
                submesh: None,
            });
        }
    }

    /// Instantiates an object template below `target.parent`. Primitive
    /// render assets are generated on first use.
    ///
    /// Returns the node carrying the template's scale.
    pub fn add_object_to_drawables(
        &mut self,
        object_handle: &str,
        mut target: SceneTarget<'_>,
        light_setup: &str,
    ) -> Result<NodeId, AssetError> {
        let attributes = self
            .object_templates
            .get(object_handle)
            .ok_or_else(|| AssetError::not_found("physics object template", object_handle))?;
        let render_handle = attributes.render_asset_handle.clone();
        let scale = attributes.scale;

        if !self.resource_dict.contains_key(&render_handle) {
            if !self.primitive_templates.contains(&render_handle) {
                log::error!(
                    "Render asset {} of {} is neither loaded nor a primitive",
                    render_handle,
                    object_handle
                );
                return Err(AssetError::not_found("render asset", render_handle));
            }
            self.build_primitive_asset_data(&render_handle)?;
        }

        let loaded = self
            .resource_dict
            .get(&render_handle)
            .ok_or_else(|| AssetError::not_found("render asset", &render_handle))?;
        if !is_light_setup_compatible(light_setup, loaded.asset_info.requires_lighting) {
            log::warn!(
                "Instantiating {} with an incompatible light setup, it will not be lit correctly",
                object_handle
            );
        }

        let scaling_node = target.graph.create_child(target.parent);
        target.graph.set_scaling(scaling_node, scale);
        let meta_data = &loaded.mesh_meta_data;
        self.add_component(
            meta_data,
            target.reborrow().with_parent(scaling_node),
            light_setup,
            &meta_data.root,
            &mut None,
        );
        Ok(scaling_node)
    }

    /// Flattens the collision geometry of a loaded asset into one mesh, with
    /// every part transformed by its hierarchy.
    pub fn create_joined_collision_mesh(&self, handle: &str) -> Result<JoinedMesh, AssetError> {
        let meta_data = self.mesh_meta_data(handle)?;
        let mut joined = JoinedMesh::default();
        self.join_hierarchy(&mut joined, meta_data, &meta_data.root, Mat4::identity());
        Ok(joined)
    }

    fn join_hierarchy(
        &self,
        joined: &mut JoinedMesh,
        meta_data: &MeshMetaData,
        node: &MeshTransformNode,
        parent_to_world: Mat4,
    ) {
        let transform = parent_to_world * node.transform_from_local_to_parent;
        if let Some(mesh) = node
            .mesh_id_local
            .and_then(|local| meta_data.mesh_index.global(local))
            .and_then(|mesh_id| self.meshes.get(mesh_id))
        {
            let collision = mesh.collision_mesh_data();
            let base = joined.vbo.len() as u32;
            joined.vbo.extend(
                collision
                    .positions
                    .iter()
                    .map(|&position| transform.transform_point3(position)),
            );
            joined
                .ibo
                .extend(collision.indices.iter().map(|&index| index + base));
        }
        for child in &node.children {
            self.join_hierarchy(joined, meta_data, child, transform);
        }
    }

    /// Shifts the collision geometry of a mesh. Render data stays untouched,
    /// the shift is kept in the mesh transform.
    pub fn translate_mesh(&mut self, mesh_id: usize, translation: Vec3) -> Result<(), AssetError> {
        let mesh = self
            .meshes
            .get_mut(mesh_id)
            .ok_or_else(|| AssetError::not_found("mesh", mesh_id))?;
        mesh.translate(translation);
        Ok(())
    }

    pub fn compute_mesh_bb(mesh: &BaseMesh) -> Option<Aabb> {
        Aabb::from_points(mesh.collision_mesh_data().positions.iter().copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::ResourceManagerConfig,
        scene_graph::{DrawableGroup, SceneGraph},
        shader_manager::NO_LIGHT_KEY,
    };

    #[test]
    fn joined_primitive_matches_collision_mesh() {
        let mut manager = ResourceManager::new(ResourceManagerConfig::default());
        manager.build_primitive_asset_data("cubeSolid").unwrap();
        let joined = manager.create_joined_collision_mesh("cubeSolid").unwrap();

        let mesh_id = manager.mesh_meta_data("cubeSolid").unwrap().mesh_index.start;
        let collision = manager.meshes()[mesh_id].collision_mesh_data();
        assert_eq!(joined.vbo.len(), collision.positions.len());
        assert_eq!(joined.ibo, collision.indices);
    }

    #[test]
    fn translated_mesh_moves_its_bounds() {
        let mut manager = ResourceManager::new(ResourceManagerConfig::default());
        manager.build_primitive_asset_data("cubeSolid").unwrap();
        let mesh_id = manager.mesh_meta_data("cubeSolid").unwrap().mesh_index.start;
        let before = manager.meshes()[mesh_id].bb().unwrap();

        let shift = Vec3::new(1.0, 2.0, 3.0);
        manager.translate_mesh(mesh_id, shift).unwrap();
        let after = manager.meshes()[mesh_id].bb().unwrap();
        assert_eq!(after.min, before.min + shift);
        assert_eq!(after.max, before.max + shift);
        assert!(manager.translate_mesh(1000, shift).is_err());
    }

    #[test]
    fn primitive_object_is_scaled_and_drawn() {
        let mut manager = ResourceManager::new(ResourceManagerConfig::default());
        let template_id = manager
            .build_and_register_prim_phys_obj_template("icosphereSolid")
            .unwrap();
        let handle = manager.get_object_template_handle(template_id).unwrap();

        let mut graph = SceneGraph::new();
        let mut drawables = DrawableGroup::new();
        let scaling_node = manager
            .add_object_to_drawables(
                &handle,
                SceneTarget::new(&mut graph, &mut drawables),
                NO_LIGHT_KEY,
            )
            .unwrap();

        assert_eq!(drawables.len(), 1);
        let scale = graph.node(scaling_node).transformation.cols[0].x;
        assert!((scale - 0.1).abs() < 1e-6);
        let drawn = graph.node(drawables.nodes[0]);
        assert!(drawn.mesh_bb.is_some());
        assert_eq!(drawn.drawables[0].light_setup, NO_LIGHT_KEY);
        assert!(manager.is_loaded("icosphereSolid"));
    }

    #[test]
    fn unknown_object_template_is_not_found() {
        let mut manager = ResourceManager::new(ResourceManagerConfig::default());
        let mut graph = SceneGraph::new();
        let mut drawables = DrawableGroup::new();
        let result = manager.add_object_to_drawables(
            "missing",
            SceneTarget::new(&mut graph, &mut drawables),
            NO_LIGHT_KEY,
        );
        assert!(matches!(result, Err(AssetError::NotFound { .. })));
        assert_eq!(graph.len(), 1);
    }
}
