use std::path::Path;

use asset_common::{scene::CollisionMeshData, AssetInfo, AssetType};

use super::{ResourceManager, EMPTY_SCENE};
use crate::{
    attributes::{PhysicsManagerAttributes, PhysicsSceneAttributes},
    error::AssetError,
    mesh::BaseMesh,
    physics::PhysicsManager,
    physics_config::parse_physics_manager_attributes,
    scene_graph::SceneTarget,
};

impl ResourceManager {
    pub fn load_physics_config(&self, path: &Path) -> Result<PhysicsManagerAttributes, AssetError> {
        let attributes = parse_physics_manager_attributes(path)?;
        log::info!(
            "Physics config {:?}: simulator {:?}, {} object templates",
            path,
            attributes.simulator,
            attributes.object_library_paths.len()
        );
        Ok(attributes)
    }

    /// Reads a physics configuration, keeps it as a template and builds the
    /// manager it describes.
    pub fn build_physics_manager(
        &mut self,
        path: &Path,
    ) -> Result<Box<dyn PhysicsManager>, AssetError> {
        let mut attributes = self.load_physics_config(path)?;
        let manager = self.init_physics_manager(&mut attributes);
        self.physics_manager_templates
            .upsert(path.to_string_lossy(), attributes);
        Ok(manager)
    }

    /// Builds the physics manager, the object templates of every primitive
    /// and the object library of `attributes`.
    pub fn init_physics_manager(
        &mut self,
        attributes: &mut PhysicsManagerAttributes,
    ) -> Box<dyn PhysicsManager> {
        let manager = self.physics_registry.build(attributes);

        let primitive_handles: Vec<String> =
            self.primitive_templates.handles().map(str::to_string).collect();
        for handle in primitive_handles {
            if let Err(err) = self.build_and_register_prim_phys_obj_template(&handle) {
                log::error!("Cannot create object template for {}: {}", handle, err);
            }
        }

        let loaded = self.load_object_templates(&attributes.object_library_paths);
        log::info!(
            "Loaded {} of {} object templates",
            loaded.len(),
            attributes.object_library_paths.len()
        );
        manager
    }

    /// Loads a scene and hands its collision geometry to a new physics
    /// manager built from `attributes`.
    pub fn load_physics_scene(
        &mut self,
        info: &AssetInfo,
        attributes: &mut PhysicsManagerAttributes,
        mut target: Option<SceneTarget<'_>>,
        light_setup: &str,
    ) -> Result<Box<dyn PhysicsManager>, AssetError> {
        let split_semantic_mesh = self.config.split_semantic_mesh;
        let mesh_result = self.load_scene(
            info,
            target.as_mut().map(SceneTarget::reborrow),
            light_setup,
            split_semantic_mesh,
        );

        let mut physics_manager = self.init_physics_manager(attributes);
        let root = target.as_ref().map(|target| target.parent);
        if !physics_manager.init_physics(root) {
            log::error!("Physics manager {} failed to initialise", physics_manager.simulator());
        }
        mesh_result?;

        let handle = info.handle();
        let mut scene_attributes = self
            .scene_templates
            .get(&handle)
            .cloned()
            .unwrap_or_else(|| PhysicsSceneAttributes::new(handle.clone()));
        scene_attributes.friction_coefficient = physics_manager.attributes().friction_coefficient;
        scene_attributes.restitution_coefficient =
            physics_manager.attributes().restitution_coefficient;
        scene_attributes.render_asset_handle = handle.clone();
        scene_attributes.collision_asset_handle = handle.clone();
        self.scene_templates
            .upsert(handle.clone(), scene_attributes.clone());

        if handle == EMPTY_SCENE {
            return Ok(physics_manager);
        }

        let group = self.scene_collision_group(info)?;
        self.collision_mesh_groups.insert(handle.clone(), group);
        let meshes: Vec<&CollisionMeshData> = self
            .collision_mesh_group(&handle)
            .unwrap_or_default();
        if !physics_manager.add_scene(&scene_attributes, &meshes) {
            log::error!("Physics manager rejected scene {}", handle);
            return Err(AssetError::UnsupportedConfiguration {
                handle,
                reason: "the physics manager rejected the scene".into(),
            });
        }
        Ok(physics_manager)
    }

    /// Mesh ids whose collision data makes up the static scene.
    fn scene_collision_group(&self, info: &AssetInfo) -> Result<Vec<usize>, AssetError> {
        let handle = info.handle();
        let meta_data = self.mesh_meta_data(&handle)?;
        let mut group = Vec::with_capacity(meta_data.mesh_index.count);
        for mesh_id in meta_data.mesh_index.iter() {
            let mesh = &self.meshes[mesh_id];
            let supported = match info.asset_type {
                AssetType::InstanceMesh => matches!(mesh, BaseMesh::Instance(_)),
                AssetType::Mp3dMesh | AssetType::Unknown => matches!(mesh, BaseMesh::Generic(_)),
                _ => true,
            };
            if !supported {
                log::error!(
                    "Mesh {} of {} can't be used as {} collision geometry",
                    mesh_id,
                    handle,
                    info.asset_type
                );
                return Err(AssetError::UnsupportedConfiguration {
                    handle,
                    reason: format!("unexpected mesh kind for {}", info.asset_type),
                });
            }
            group.push(mesh_id);
        }
        Ok(group)
    }
}
