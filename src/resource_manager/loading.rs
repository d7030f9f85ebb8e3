use std::path::Path;

use asset_common::{
    scene::{
        CompressedFormat, ImageData, ImageFormat, MaterialType, MeshData, MeshPrimitive,
        PhongMaterialData, PixelFormat, TextureType,
    },
    AssetInfo, AssetType,
};

use super::ResourceManager;
use crate::{
    bounding_box::{AbsoluteAabbPass, StaticDrawableInfo},
    error::AssetError,
    gpu::{GpuTextureHandle, TextureDescriptor},
    house::HouseLayout,
    importer::{Importer, ImporterKind, ObjectInstance},
    mesh::{BaseMesh, GenericMeshData, InstanceMeshData, TiledTextureMeshData},
    meta_data::{IndexRange, LoadedAssetData, MeshMetaData, MeshTransformNode},
    scene_graph::{Drawable, SceneTarget},
    shader_manager::{
        build_flat_material, build_phong_material, is_light_setup_compatible,
        DEFAULT_MATERIAL_KEY, NO_LIGHT_KEY, PER_VERTEX_OBJECT_ID_MATERIAL_KEY,
    },
};

impl ResourceManager {
    /// Loads a mesh file through the generic importer, and instantiates it
    /// below `target` if given.
    ///
    /// A file is imported once. Asking again with a different [`AssetInfo`]
    /// logs a warning and keeps using the cached data.
    pub fn load_general_mesh(
        &mut self,
        info: &AssetInfo,
        target: Option<SceneTarget<'_>>,
        light_setup: &str,
    ) -> Result<(), AssetError> {
        self.load_general_mesh_with_pass(info, target, light_setup, &mut None)
    }

    pub(super) fn load_general_mesh_with_pass(
        &mut self,
        info: &AssetInfo,
        target: Option<SceneTarget<'_>>,
        light_setup: &str,
        aabb_pass: &mut Option<AbsoluteAabbPass>,
    ) -> Result<(), AssetError> {
        let handle = info.handle();
        if self.resource_dict.contains_key(&handle) {
            self.warn_on_config_mismatch(info);
        } else {
            self.import_general_mesh(info)?;
        }

        let Some(mut target) = target else {
            return Ok(());
        };
        let loaded = self
            .resource_dict
            .get(&handle)
            .ok_or_else(|| AssetError::not_found("asset", &handle))?;
        if !is_light_setup_compatible(light_setup, loaded.asset_info.requires_lighting) {
            log::warn!(
                "Loading {} with an incompatible light setup, it will not be lit correctly. \
                 Enable requires_lighting if it needs lighting.",
                handle
            );
        }
        let new_node = target.graph.create_child(target.parent);
        let meta_data = &loaded.mesh_meta_data;
        self.add_component(
            meta_data,
            target.reborrow().with_parent(new_node),
            light_setup,
            &meta_data.root,
            aabb_pass,
        );
        Ok(())
    }

    fn warn_on_config_mismatch(&self, info: &AssetInfo) {
        if let Some(loaded) = self.resource_dict.get(&info.handle()) {
            if loaded.asset_info != *info {
                log::warn!(
                    "Reloading {:?} with a different configuration is not supported, \
                     the asset may not be rendered correctly",
                    info.path()
                );
            }
        }
    }

    /// Cached meshes were built for the cached asset type. Instancing them as
    /// another mesh kind is refused.
    fn check_cached_asset_type(&self, info: &AssetInfo) -> Result<(), AssetError> {
        self.warn_on_config_mismatch(info);
        let handle = info.handle();
        let cached_type = self
            .resource_dict
            .get(&handle)
            .map(|loaded| loaded.asset_info.asset_type)
            .ok_or_else(|| AssetError::not_found("asset", &handle))?;
        if cached_type != info.asset_type {
            log::error!(
                "{} was loaded as {}, cannot instance it as {}",
                handle,
                cached_type,
                info.asset_type
            );
            return Err(AssetError::UnsupportedConfiguration {
                handle,
                reason: format!("cached as {}, requested as {}", cached_type, info.asset_type),
            });
        }
        Ok(())
    }

    fn import_general_mesh(&mut self, info: &AssetInfo) -> Result<(), AssetError> {
        let path = info.path();
        let mut importer = self.importer_manager.instantiate(ImporterKind::AnyScene)?;
        if let Err(err) = importer.open_file(path) {
            log::error!("Cannot open file {:?}: {:#}", path, err);
            return Err(AssetError::import_failure(path, err));
        }

        // Textures first, materials reference them. Meshes reference materials.
        let mut loaded = LoadedAssetData::new(info.clone());
        self.load_textures(importer.as_ref(), &mut loaded);
        self.load_materials(importer.as_ref(), &mut loaded);
        self.load_meshes(importer.as_ref(), &mut loaded);

        let mut root = MeshTransformNode::default();
        // A tree never visits an object twice
        let mut budget = importer.object3d_count();
        if let Some(scene_id) = importer.default_scene() {
            let Some(scene) = importer.scene(scene_id) else {
                log::error!("Cannot load the default scene of {:?}", path);
                return Err(AssetError::load_failure(path, "cannot load the default scene"));
            };
            for child in scene.children {
                load_mesh_hierarchy(importer.as_ref(), &mut root, child, &mut budget);
            }
        } else if !loaded.mesh_meta_data.mesh_index.is_empty() {
            // No scene, e.g. a bare PLY file. Use the first mesh.
            if importer.object3d_count() > 0 {
                load_mesh_hierarchy(importer.as_ref(), &mut root, 0, &mut budget);
            } else {
                let mut node = MeshTransformNode::with_mesh(0);
                node.component_id = Some(0);
                root.children.push(node);
            }
        } else {
            log::error!("No default scene and no meshes in {:?}", path);
            return Err(AssetError::load_failure(path, "no default scene and no meshes"));
        }

        root.transform_from_local_to_parent =
            info.frame.rotation_frame_to_world_matrix() * root.transform_from_local_to_parent;
        loaded.mesh_meta_data.root = root;
        log::info!(
            "Loaded {:?}: {} meshes, {} materials, {} textures",
            path,
            loaded.mesh_meta_data.mesh_index.count,
            loaded.mesh_meta_data.material_index.count,
            loaded.mesh_meta_data.texture_index.count
        );
        self.resource_dict.insert(info.handle(), loaded);
        Ok(())
    }

    fn load_textures(&mut self, importer: &dyn Importer, loaded: &mut LoadedAssetData) {
        let start = self.textures.len();
        let count = importer.texture_count();
        loaded.mesh_meta_data.texture_index = IndexRange::new(start, count);
        for id in 0..count {
            let texture = self.load_texture(importer, id);
            self.textures.push(texture);
        }
    }

    /// `None` if the texture or any of its levels fails.
    fn load_texture(&mut self, importer: &dyn Importer, id: usize) -> Option<GpuTextureHandle> {
        let texture = match importer.texture(id) {
            Some(texture) if texture.texture_type == TextureType::Texture2D => texture,
            _ => {
                log::error!("Cannot load texture {}, skipping", id);
                return None;
            }
        };

        let level_count = importer.image2d_level_count(texture.image);
        let mut handle = None;
        let mut generate_mipmap = false;
        for level in 0..level_count {
            let Some(image) = importer.image2d(texture.image, level) else {
                log::error!("Cannot load level {} of texture {}, skipping", level, id);
                return None;
            };
            if level == 0 {
                let levels = if level_count == 1 && !image.is_compressed() {
                    generate_mipmap = true;
                    mip_level_count(image.max_dimension())
                } else {
                    level_count as u32
                };
                let descriptor = TextureDescriptor {
                    levels,
                    format: self.storage_format(&image),
                    size: image.dimensions,
                    sampler: texture.sampler_info,
                };
                match self.gpu.create_texture(&descriptor) {
                    Ok(created) => handle = Some(created),
                    Err(err) => {
                        log::error!("Cannot create texture {}: {:#}", id, err);
                        return None;
                    }
                }
            }
            let created = handle?;
            if let Err(err) = self.gpu.upload_texture_level(created, level as u32, &image) {
                log::error!("Cannot upload level {} of texture {}: {:#}", level, id, err);
                return None;
            }
        }

        let Some(handle) = handle else {
            log::error!("Texture {} has no image levels, skipping", id);
            return None;
        };
        if generate_mipmap {
            if let Err(err) = self.gpu.generate_mipmap(handle) {
                log::error!("Cannot generate mipmaps for texture {}: {:#}", id, err);
                return None;
            }
        }
        Some(handle)
    }

    fn storage_format(&self, image: &ImageData) -> PixelFormat {
        match image.format {
            PixelFormat::Uncompressed(ImageFormat::R8G8B8A8_UNORM)
                if self.config.compress_textures =>
            {
                PixelFormat::Compressed(CompressedFormat::RgbaS3tcDxt1)
            }
            PixelFormat::Uncompressed(ImageFormat::R8G8B8_UNORM)
                if self.config.compress_textures =>
            {
                PixelFormat::Compressed(CompressedFormat::RgbS3tcDxt1)
            }
            format => format,
        }
    }

    /// Every material consumes a material id, even one that fails to load.
    fn load_materials(&mut self, importer: &dyn Importer, loaded: &mut LoadedAssetData) {
        let count = importer.material_count();
        loaded.mesh_meta_data.material_index = IndexRange::new(self.next_material_id, count);
        let texture_start = loaded.mesh_meta_data.texture_index.start;

        for id in 0..count {
            let material_id = self.next_material_id;
            self.next_material_id += 1;

            let material = match importer.material(id) {
                Some(material) if material.material_type == MaterialType::Phong => material,
                _ => {
                    log::error!("Cannot load material {}, skipping", id);
                    continue;
                }
            };
            let data = if loaded.asset_info.requires_lighting {
                build_phong_material(&material, texture_start)
            } else {
                build_flat_material(&material, texture_start)
            };
            self.shader_manager
                .set_material(material_id.to_string(), data);
        }
    }

    fn load_meshes(&mut self, importer: &dyn Importer, loaded: &mut LoadedAssetData) {
        let start = self.meshes.len();
        let count = importer.mesh_count();
        loaded.mesh_meta_data.mesh_index = IndexRange::new(start, count);

        for id in 0..count {
            let data = importer.mesh(id).unwrap_or_else(|| {
                log::error!("Cannot load mesh {} of {:?}, using an empty mesh", id, loaded.asset_info.path());
                MeshData::new(MeshPrimitive::Triangles, Vec::new(), Vec::new())
            });
            let mesh = BaseMesh::Generic(GenericMeshData::new(
                data,
                loaded.asset_info.requires_lighting,
            ));
            self.push_mesh(mesh);
        }
    }

    /// Computes the bounds, uploads and appends a mesh to the pool.
    fn push_mesh(&mut self, mut mesh: BaseMesh) -> usize {
        mesh.set_bb(Self::compute_mesh_bb(&mesh));
        if let Err(err) = mesh.upload_buffers_to_gpu(self.gpu.as_mut()) {
            log::error!("Cannot upload mesh {}: {:#}", self.meshes.len(), err);
        }
        self.meshes.push(mesh);
        self.meshes.len() - 1
    }

    pub(super) fn load_instance_mesh(
        &mut self,
        info: &AssetInfo,
        target: Option<SceneTarget<'_>>,
        split_semantic_mesh: bool,
        aabb_pass: &mut Option<AbsoluteAabbPass>,
    ) -> Result<(), AssetError> {
        let handle = info.handle();
        if info.asset_type != AssetType::InstanceMesh {
            log::error!("{} is not an instance mesh", handle);
            return Err(AssetError::UnsupportedConfiguration {
                handle,
                reason: format!("expected an instance mesh, got {}", info.asset_type),
            });
        }

        if self.resource_dict.contains_key(&handle) {
            self.check_cached_asset_type(info)?;
        } else {
            let path = info.path();
            let mut importer = self.importer_manager.instantiate(ImporterKind::Stanford)?;
            importer
                .open_file(path)
                .map_err(|err| AssetError::import_failure(path, err))?;
            let mesh = importer
                .mesh(0)
                .ok_or_else(|| AssetError::load_failure(path, "no mesh in file"))?;
            let instance_meshes = if split_semantic_mesh {
                InstanceMeshData::split_by_object_id(&mesh)
            } else {
                vec![InstanceMeshData::new(mesh, None)]
            };
            if instance_meshes.is_empty() {
                log::error!("Error loading instance mesh data from {:?}", path);
                return Err(AssetError::load_failure(path, "no instance meshes"));
            }

            let mut meta_data =
                MeshMetaData::with_meshes(IndexRange::new(self.meshes.len(), instance_meshes.len()));
            for (local_id, instance_mesh) in instance_meshes.into_iter().enumerate() {
                self.push_mesh(BaseMesh::Instance(instance_mesh));
                meta_data.root.children.push(MeshTransformNode::with_mesh(local_id));
            }
            let mut loaded = LoadedAssetData::new(info.clone());
            loaded.mesh_meta_data = meta_data;
            self.resource_dict.insert(handle.clone(), loaded);
        }

        let Some(mut target) = target else {
            return Ok(());
        };
        let mesh_range = self.mesh_meta_data(&handle)?.mesh_index;
        for mesh_id in mesh_range.iter() {
            let object_id = match &self.meshes[mesh_id] {
                BaseMesh::Instance(mesh) => mesh.object_id.map(|id| id as usize),
                _ => panic!("Mesh {} of {} is not an instance mesh", mesh_id, handle),
            };
            let node = target.graph.create_child(target.parent);
            target.graph.add_drawable(
                node,
                Drawable {
                    mesh_id,
                    submesh: None,
                    light_setup: NO_LIGHT_KEY.to_string(),
                    material: PER_VERTEX_OBJECT_ID_MATERIAL_KEY.to_string(),
                    object_id,
                },
            );
            target.drawables.nodes.push(node);
            if let Some(pass) = aabb_pass.as_mut() {
                pass.record(StaticDrawableInfo {
                    node,
                    mesh_id,
                    submesh: None,
                });
            }
        }
        Ok(())
    }

    pub(super) fn load_tiled_mesh(
        &mut self,
        info: &AssetInfo,
        target: Option<SceneTarget<'_>>,
        aabb_pass: &mut Option<AbsoluteAabbPass>,
    ) -> Result<(), AssetError> {
        let handle = info.handle();
        if self.resource_dict.contains_key(&handle) {
            self.check_cached_asset_type(info)?;
        } else {
            let path = info.path();
            let mut importer = self.importer_manager.instantiate(ImporterKind::TiledMesh)?;
            importer
                .open_file(path)
                .map_err(|err| AssetError::import_failure(path, err))?;
            let submeshes: Vec<MeshData> = (0..importer.mesh_count())
                .filter_map(|id| {
                    let submesh = importer.mesh(id);
                    if submesh.is_none() {
                        log::error!("Cannot load tile {} of {:?}, skipping", id, path);
                    }
                    submesh
                })
                .collect();
            if submeshes.is_empty() {
                return Err(AssetError::load_failure(path, "no tiles"));
            }
            let atlas_dir = path.parent().unwrap_or_else(|| Path::new("")).join("textures");
            let mesh_id = self.push_mesh(BaseMesh::TiledTexture(TiledTextureMeshData::new(
                submeshes, atlas_dir,
            )));

            let mut meta_data = MeshMetaData::with_meshes(IndexRange::single(mesh_id));
            meta_data.root.mesh_id_local = Some(0);
            meta_data.root.component_id = Some(0);
            meta_data.root.transform_from_local_to_parent = info.frame.rotation_frame_to_world_matrix()
                * meta_data.root.transform_from_local_to_parent;
            let mut loaded = LoadedAssetData::new(info.clone());
            loaded.mesh_meta_data = meta_data;
            self.resource_dict.insert(handle.clone(), loaded);
        }

        let Some(mut target) = target else {
            return Ok(());
        };
        let rotation = info.frame.rotation_frame_to_world();
        let mesh_range = self.mesh_meta_data(&handle)?.mesh_index;
        for mesh_id in mesh_range.iter() {
            let BaseMesh::TiledTexture(tiled) = &self.meshes[mesh_id] else {
                panic!("Mesh {} of {} is not a tiled texture mesh", mesh_id, handle);
            };
            for submesh in 0..tiled.submesh_count() {
                let node = target.graph.create_child(target.parent);
                target.graph.set_rotation(node, rotation);
                target.graph.add_drawable(
                    node,
                    Drawable {
                        mesh_id,
                        submesh: Some(submesh),
                        light_setup: NO_LIGHT_KEY.to_string(),
                        material: DEFAULT_MATERIAL_KEY.to_string(),
                        object_id: None,
                    },
                );
                target.drawables.nodes.push(node);
                if let Some(pass) = aabb_pass.as_mut() {
                    pass.record(StaticDrawableInfo {
                        node,
                        mesh_id,
                        submesh: Some(submesh),
                    });
                }
            }
        }
        Ok(())
    }

    /// Creates one node per valid house node, numbered densely in file order.
    /// Models that fail to load leave an empty node behind.
    pub(super) fn load_house_file(
        &mut self,
        info: &AssetInfo,
        target: Option<SceneTarget<'_>>,
    ) -> Result<(), AssetError> {
        let Some(mut target) = target else {
            return Err(AssetError::UnsupportedConfiguration {
                handle: info.handle(),
                reason: "house files can only be loaded into a scene".into(),
            });
        };
        let layout = HouseLayout::load(info.path())?;
        let plans = layout.plan(info.path())?;
        for (semantic_id, plan) in plans.into_iter().enumerate() {
            let node = target.graph.create_child(target.parent);
            target.graph.node_mut(node).semantic_id = Some(semantic_id);
            if let Some(asset) = &plan.asset {
                let object_target = target.reborrow().with_parent(node);
                if let Err(err) = self.load_general_mesh(asset, Some(object_target), NO_LIGHT_KEY) {
                    log::error!("Failed to load house node {}: {}", plan.id, err);
                }
            }
            if let Some(transform) = plan.transform {
                target.graph.set_transformation(node, transform);
            }
        }
        Ok(())
    }

    /// Generates the mesh of a primitive template and registers it under the
    /// template's handle. Nothing happens if it was built before.
    pub fn build_primitive_asset_data(&mut self, handle: &str) -> Result<(), AssetError> {
        if self.resource_dict.contains_key(handle) {
            log::info!("Primitive asset {} exists already", handle);
            return Ok(());
        }
        let attributes = self
            .primitive_templates
            .get(handle)
            .ok_or_else(|| AssetError::not_found("primitive asset template", handle))?;
        let info = AssetInfo::new(AssetType::Primitive, handle).with_lighting(true);
        let data = self.primitive_importer.mesh(attributes);
        let class_name = attributes.class_name();

        let mesh_id = self.push_mesh(BaseMesh::Primitive(GenericMeshData::new(
            data,
            info.requires_lighting,
        )));
        let material_id = self.next_material_id;
        self.next_material_id += 1;
        self.shader_manager
            .set_material(material_id.to_string(), PhongMaterialData::default());

        let mut meta_data = MeshMetaData::with_meshes(IndexRange::single(mesh_id));
        meta_data.material_index = IndexRange::single(material_id);
        meta_data.root.mesh_id_local = Some(0);
        meta_data.root.component_id = Some(0);
        meta_data.root.transform_from_local_to_parent = info.frame.rotation_frame_to_world_matrix()
            * meta_data.root.transform_from_local_to_parent;

        let mut loaded = LoadedAssetData::new(info);
        loaded.mesh_meta_data = meta_data;
        self.resource_dict.insert(handle.to_string(), loaded);
        log::info!("Primitive asset added: {} ({})", handle, class_name);
        Ok(())
    }
}

/// Appends the object `component_id` and its children below `parent`.
/// Objects that can't be imported are skipped with their subtree.
fn load_mesh_hierarchy(
    importer: &dyn Importer,
    parent: &mut MeshTransformNode,
    component_id: usize,
    budget: &mut usize,
) {
    if *budget == 0 {
        log::error!(
            "Object hierarchy has more nodes than objects, not importing object {}",
            component_id
        );
        return;
    }
    *budget -= 1;

    let Some(object) = importer.object3d(component_id) else {
        log::error!("Cannot import object {}, skipping", importer.object3d_name(component_id));
        return;
    };
    let mut node = MeshTransformNode {
        transform_from_local_to_parent: object.transformation,
        component_id: Some(component_id),
        ..Default::default()
    };
    if let ObjectInstance::Mesh { mesh, material } = object.instance {
        node.mesh_id_local = Some(mesh);
        node.material_id_local = material;
    }
    for child in object.children {
        load_mesh_hierarchy(importer, &mut node, child, budget);
    }
    parent.children.push(node);
}

/// Levels of a full mip chain for the largest image dimension.
fn mip_level_count(max_dimension: u32) -> u32 {
    32 - max_dimension.max(1).leading_zeros()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_mip_chain() {
        assert_eq!(mip_level_count(1), 1);
        assert_eq!(mip_level_count(256), 9);
        assert_eq!(mip_level_count(300), 9);
        assert_eq!(mip_level_count(0), 1);
    }
}
