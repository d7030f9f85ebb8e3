//! The resource manager owns every loaded asset of a simulation session.
//!
//! Meshes, materials and textures go into append-only pools. The resource
//! dictionary maps a file path (or a primitive handle) to the pool ranges of
//! that asset and its transform hierarchy, so every file is imported at most
//! once. Loaded assets can then be instantiated into a [`SceneGraph`] any
//! number of times, or flattened into collision geometry for physics.
//!
//! [`SceneGraph`]: crate::scene_graph::SceneGraph

mod instantiate;
mod loading;
mod physics_scene;
mod templates;

pub use instantiate::JoinedMesh;

use std::collections::HashMap;

use asset_common::{scene::CollisionMeshData, AssetInfo, AssetType};

use crate::{
    attributes::{
        PhysicsManagerAttributes, PhysicsObjectAttributes, PhysicsSceneAttributes, PrimObjType,
        PrimitiveAttributes,
    },
    bounding_box::AbsoluteAabbPass,
    config::ResourceManagerConfig,
    error::AssetError,
    gpu::{GpuBackend, GpuTextureHandle, HeadlessGpu},
    importer::{ImporterManager, PrimitiveImporter},
    mesh::BaseMesh,
    meta_data::{LoadedAssetData, MeshMetaData},
    physics::PhysicsRegistry,
    scene_graph::SceneTarget,
    shader_manager::ShaderManager,
    template_library::TemplateLibrary,
};

/// The path which loads a scene without any mesh.
pub const EMPTY_SCENE: &str = "NONE";

pub struct ResourceManager {
    config: ResourceManagerConfig,
    importer_manager: ImporterManager,
    primitive_importer: PrimitiveImporter,
    gpu: Box<dyn GpuBackend>,
    shader_manager: ShaderManager,

    meshes: Vec<BaseMesh>,
    /// `None` marks a texture that failed to load.
    textures: Vec<Option<GpuTextureHandle>>,
    next_material_id: usize,

    resource_dict: HashMap<String, LoadedAssetData>,
    /// Global mesh ids of the collision geometry of an asset, by handle.
    collision_mesh_groups: HashMap<String, Vec<usize>>,

    primitive_templates: TemplateLibrary<PrimitiveAttributes>,
    object_templates: TemplateLibrary<PhysicsObjectAttributes>,
    scene_templates: TemplateLibrary<PhysicsSceneAttributes>,
    physics_manager_templates: TemplateLibrary<PhysicsManagerAttributes>,
    physics_registry: PhysicsRegistry,
}

impl ResourceManager {
    /// A manager with the built-in importers and no GPU.
    pub fn new(config: ResourceManagerConfig) -> Self {
        Self::with_backends(config, ImporterManager::with_defaults(), Box::new(HeadlessGpu::new()))
    }

    pub fn with_backends(
        config: ResourceManagerConfig,
        importer_manager: ImporterManager,
        gpu: Box<dyn GpuBackend>,
    ) -> Self {
        let mut manager = Self {
            config,
            importer_manager,
            primitive_importer: PrimitiveImporter::new(),
            gpu,
            shader_manager: ShaderManager::new(),
            meshes: Vec::new(),
            textures: Vec::new(),
            next_material_id: 0,
            resource_dict: HashMap::new(),
            collision_mesh_groups: HashMap::new(),
            primitive_templates: TemplateLibrary::new("primitive asset"),
            object_templates: TemplateLibrary::new("physics object"),
            scene_templates: TemplateLibrary::new("physics scene"),
            physics_manager_templates: TemplateLibrary::new("physics manager"),
            physics_registry: PhysicsRegistry::new(),
        };
        for prim_obj_type in PrimObjType::ALL {
            manager.add_primitive_template(PrimitiveAttributes::new(prim_obj_type));
        }
        manager
    }

    pub fn config(&self) -> &ResourceManagerConfig {
        &self.config
    }

    pub fn shader_manager(&self) -> &ShaderManager {
        &self.shader_manager
    }

    pub fn shader_manager_mut(&mut self) -> &mut ShaderManager {
        &mut self.shader_manager
    }

    pub fn importer_manager_mut(&mut self) -> &mut ImporterManager {
        &mut self.importer_manager
    }

    pub fn physics_registry_mut(&mut self) -> &mut PhysicsRegistry {
        &mut self.physics_registry
    }

    pub fn meshes(&self) -> &[BaseMesh] {
        &self.meshes
    }

    pub fn mesh(&self, mesh_id: usize) -> Option<&BaseMesh> {
        self.meshes.get(mesh_id)
    }

    pub fn textures(&self) -> &[Option<GpuTextureHandle>] {
        &self.textures
    }

    /// Number of material ids handed out so far.
    pub fn material_count(&self) -> usize {
        self.next_material_id
    }

    pub fn is_loaded(&self, handle: &str) -> bool {
        self.resource_dict.contains_key(handle)
    }

    pub fn loaded_asset(&self, handle: &str) -> Option<&LoadedAssetData> {
        self.resource_dict.get(handle)
    }

    pub fn mesh_meta_data(&self, handle: &str) -> Result<&MeshMetaData, AssetError> {
        self.resource_dict
            .get(handle)
            .map(|asset| &asset.mesh_meta_data)
            .ok_or_else(|| AssetError::not_found("asset", handle))
    }

    /// The collision meshes registered for an asset handle, in mesh order.
    pub fn collision_mesh_group(&self, handle: &str) -> Option<Vec<&CollisionMeshData>> {
        let group = self.collision_mesh_groups.get(handle)?;
        Some(
            group
                .iter()
                .filter_map(|&mesh_id| self.meshes.get(mesh_id))
                .map(BaseMesh::collision_mesh_data)
                .collect(),
        )
    }

    pub fn primitive_templates(&self) -> &TemplateLibrary<PrimitiveAttributes> {
        &self.primitive_templates
    }

    pub fn object_templates(&self) -> &TemplateLibrary<PhysicsObjectAttributes> {
        &self.object_templates
    }

    pub fn scene_templates(&self) -> &TemplateLibrary<PhysicsSceneAttributes> {
        &self.scene_templates
    }

    pub fn physics_manager_templates(&self) -> &TemplateLibrary<PhysicsManagerAttributes> {
        &self.physics_manager_templates
    }

    /// Loads a scene file, and instantiates it below `target` if given.
    ///
    /// The path [`EMPTY_SCENE`] loads nothing and succeeds.
    pub fn load_scene(
        &mut self,
        info: &AssetInfo,
        mut target: Option<SceneTarget<'_>>,
        light_setup: &str,
        split_semantic_mesh: bool,
    ) -> Result<(), AssetError> {
        let handle = info.handle();
        if handle == EMPTY_SCENE {
            log::info!("Loading empty scene");
            return Ok(());
        }
        if !info.path().exists() {
            log::error!("Cannot load from file {:?}", info.path());
            return Err(AssetError::not_found("scene file", info.path().display()));
        }

        let needs_absolute_aabbs = match info.asset_type {
            AssetType::TiledTextureMesh | AssetType::Mp3dMesh | AssetType::Unknown => true,
            AssetType::InstanceMesh => split_semantic_mesh,
            _ => false,
        };
        let mut aabb_pass =
            (needs_absolute_aabbs && target.is_some()).then(AbsoluteAabbPass::new);

        match info.asset_type {
            AssetType::InstanceMesh => self.load_instance_mesh(
                info,
                target.as_mut().map(SceneTarget::reborrow),
                split_semantic_mesh,
                &mut aabb_pass,
            )?,
            AssetType::TiledTextureMesh => self.load_tiled_mesh(
                info,
                target.as_mut().map(SceneTarget::reborrow),
                &mut aabb_pass,
            )?,
            AssetType::HouseScene => {
                self.load_house_file(info, target.as_mut().map(SceneTarget::reborrow))?
            }
            _ => self.load_general_mesh_with_pass(
                info,
                target.as_mut().map(SceneTarget::reborrow),
                light_setup,
                &mut aabb_pass,
            )?,
        }

        let mut scene_attributes = self
            .scene_templates
            .get(&handle)
            .cloned()
            .unwrap_or_else(|| PhysicsSceneAttributes::new(handle.clone()));
        scene_attributes.render_asset_handle = handle.clone();
        self.scene_templates.upsert(handle, scene_attributes);

        if let (Some(pass), Some(target)) = (aabb_pass, target) {
            pass.run(target.graph, &self.meshes);
        }
        Ok(())
    }
}
