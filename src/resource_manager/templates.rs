use std::path::{Path, PathBuf};

use asset_common::{AssetInfo, AssetType};
use ultraviolet::Vec3;

use super::ResourceManager;
use crate::{
    attributes::{PhysicsObjectAttributes, PrimitiveAttributes, TemplateOrigin},
    error::AssetError,
    physics_config::parse_object_attributes,
    shader_manager::NO_LIGHT_KEY,
};

impl ResourceManager {
    /// Registers a primitive shape under its handle, returns its id.
    pub fn add_primitive_template(&mut self, attributes: PrimitiveAttributes) -> usize {
        let handle = attributes.handle.clone();
        self.primitive_templates.upsert(handle, attributes)
    }

    /// Creates the object template of a primitive shape, keyed by the
    /// primitive's handle. Existing templates are left as they are.
    pub fn build_and_register_prim_phys_obj_template(
        &mut self,
        primitive_handle: &str,
    ) -> Result<usize, AssetError> {
        if !self.primitive_templates.contains(primitive_handle) {
            log::warn!(
                "No primitive with handle {} exists, so no object template was made",
                primitive_handle
            );
            return Err(AssetError::not_found("primitive asset template", primitive_handle));
        }
        if let Some(id) = self.object_templates.id_of(primitive_handle) {
            return Ok(id);
        }

        let mut attributes =
            PhysicsObjectAttributes::new(primitive_handle, TemplateOrigin::Synthesized);
        attributes.use_mesh_collision = false;
        attributes.render_asset_handle = primitive_handle.to_string();
        attributes.collision_asset_handle = primitive_handle.to_string();
        attributes.margin = 0.0;
        attributes.scale = Vec3::broadcast(0.1);
        Ok(self.object_templates.upsert(primitive_handle, attributes))
    }

    /// Loads the meshes an object template refers to and registers the
    /// template under `handle`.
    ///
    /// The render and collision meshes stand in for each other when one of
    /// them fails. The collision mesh is loaded with lighting only when it
    /// has to be rendered too.
    pub fn load_object_template(
        &mut self,
        mut attributes: PhysicsObjectAttributes,
        handle: &str,
    ) -> Result<usize, AssetError> {
        if let Some(id) = self.object_templates.id_of(handle) {
            return Ok(id);
        }

        let requires_lighting = attributes.requires_lighting;
        let render_ok = !attributes.render_asset_handle.is_empty()
            && self.load_object_mesh(&attributes.render_asset_handle, requires_lighting);
        let collision_ok = !attributes.collision_asset_handle.is_empty()
            && self.load_object_mesh(
                &attributes.collision_asset_handle,
                !render_ok && requires_lighting,
            );

        if !render_ok && !collision_ok {
            log::error!(
                "Failed to load a physical object {}: no render or collision mesh",
                handle
            );
            return Err(AssetError::load_failure(
                handle,
                "neither the render nor the collision mesh could be loaded",
            ));
        }
        if !render_ok {
            attributes.render_asset_handle = attributes.collision_asset_handle.clone();
        }
        if !collision_ok {
            attributes.collision_asset_handle = attributes.render_asset_handle.clone();
        }

        let collision_handle = attributes.collision_asset_handle.clone();
        let group: Vec<usize> = self.mesh_meta_data(&collision_handle)?.mesh_index.iter().collect();
        self.collision_mesh_groups.insert(collision_handle, group);

        let id = self.object_templates.upsert(handle, attributes);
        log::info!("Loaded object template {} with id {}", handle, id);
        Ok(id)
    }

    fn load_object_mesh(&mut self, handle: &str, requires_lighting: bool) -> bool {
        if self.primitive_templates.contains(handle) {
            return match self.build_primitive_asset_data(handle) {
                Ok(()) => true,
                Err(err) => {
                    log::error!("Cannot build primitive {}: {}", handle, err);
                    false
                }
            };
        }
        let info = AssetInfo::new(AssetType::Unknown, handle).with_lighting(requires_lighting);
        match self.load_general_mesh(&info, None, NO_LIGHT_KEY) {
            Ok(()) => true,
            Err(err) => {
                log::error!("Cannot load object mesh {}: {}", handle, err);
                false
            }
        }
    }

    /// Parses an object template file and loads its meshes. A file that was
    /// loaded before returns its existing id.
    pub fn parse_and_load_phys_obj_template(&mut self, path: &Path) -> Result<usize, AssetError> {
        let handle = path.to_string_lossy();
        if let Some(id) = self.object_templates.id_of(&handle) {
            return Ok(id);
        }
        let attributes = parse_object_attributes(path)?;
        self.load_object_template(attributes, &handle)
    }

    /// Loads every template file, skipping the ones that fail.
    pub fn load_object_templates(&mut self, paths: &[PathBuf]) -> Vec<usize> {
        let mut ids = Vec::with_capacity(paths.len());
        for path in paths {
            match self.parse_and_load_phys_obj_template(path) {
                Ok(id) => ids.push(id),
                Err(err) => log::error!("Skipping object template {:?}: {}", path, err),
            }
        }
        ids
    }

    pub fn get_object_template_handle(&self, id: usize) -> Result<String, AssetError> {
        self.object_templates.handle_by_id(id).map(str::to_string)
    }

    pub fn random_file_template_handle(&self) -> Result<String, AssetError> {
        self.object_templates
            .random_handle_where(|template| !template.is_synthesized())
            .map(str::to_string)
    }

    pub fn random_synth_template_handle(&self) -> Result<String, AssetError> {
        self.object_templates
            .random_handle_where(PhysicsObjectAttributes::is_synthesized)
            .map(str::to_string)
    }

    pub fn file_template_handles(&self, query: &str) -> Vec<String> {
        self.object_templates
            .handles_matching_where(query, |template| !template.is_synthesized())
    }

    pub fn synth_template_handles(&self, query: &str) -> Vec<String> {
        self.object_templates
            .handles_matching_where(query, PhysicsObjectAttributes::is_synthesized)
    }
}
