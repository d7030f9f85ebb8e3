use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use anyhow::Context;
use asset_common::scene::{
    ImageData, ImageFormat, ImportedMaterial, MaterialType, MeshData, MeshPrimitive, PixelFormat,
    SamplerInfo, TextureData, TextureType,
};
use ultraviolet::{Mat4, Vec2, Vec3, Vec4};

use super::{Importer, ObjectData, ObjectInstance, SceneData};

/// Wavefront OBJ files with their MTL materials. Every model becomes a mesh
/// and a top level object of a single scene.
#[derive(Default)]
pub struct ObjImporter {
    meshes: Vec<MeshData>,
    mesh_materials: Vec<Option<usize>>,
    materials: Vec<ImportedMaterial>,
    /// Texture files, relative paths are resolved against the OBJ directory.
    texture_paths: Vec<PathBuf>,
    names: Vec<String>,
    opened: bool,
}

impl ObjImporter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Importer for ObjImporter {
    fn open_file(&mut self, path: &Path) -> anyhow::Result<()> {
        *self = Self::default();
        let (models, materials) = tobj::load_obj(path, &tobj::GPU_LOAD_OPTIONS)
            .with_context(|| format!("Failed to read OBJ {:?}", path))?;
        let materials = materials.unwrap_or_else(|err| {
            log::warn!("Failed to load materials of {:?}: {}", path, err);
            Vec::new()
        });
        let directory = path.parent().unwrap_or_else(|| Path::new(""));

        let mut texture_ids: HashMap<String, usize> = HashMap::new();
        let mut texture_id = |name: &Option<String>| -> Option<usize> {
            let name = name.as_ref()?;
            let next_id = texture_ids.len();
            let id = *texture_ids.entry(name.clone()).or_insert(next_id);
            if id == next_id {
                self.texture_paths.push(directory.join(name));
            }
            Some(id)
        };

        for material in &materials {
            let imported = ImportedMaterial {
                material_type: MaterialType::Phong,
                ambient_color: rgb(material.ambient.unwrap_or([0.0, 0.0, 0.0])),
                diffuse_color: rgb(material.diffuse.unwrap_or([1.0, 1.0, 1.0])),
                specular_color: rgb(material.specular.unwrap_or([1.0, 1.0, 1.0])),
                shininess: material.shininess.unwrap_or(80.0),
                ambient_texture: texture_id(&material.ambient_texture),
                diffuse_texture: texture_id(&material.diffuse_texture),
                specular_texture: texture_id(&material.specular_texture),
                normal_texture: texture_id(&material.normal_texture),
                ..Default::default()
            };
            self.materials.push(imported);
        }

        for model in models {
            let mesh = &model.mesh;
            let positions: Vec<Vec3> = mesh
                .positions
                .chunks_exact(3)
                .map(|p| Vec3::new(p[0], p[1], p[2]))
                .collect();
            let mut data = MeshData::new(MeshPrimitive::Triangles, positions, mesh.indices.clone());
            data.normals = mesh
                .normals
                .chunks_exact(3)
                .map(|n| Vec3::new(n[0], n[1], n[2]))
                .collect();
            data.uvs = mesh
                .texcoords
                .chunks_exact(2)
                .map(|uv| Vec2::new(uv[0], 1.0 - uv[1]))
                .collect();
            data.colors = mesh
                .vertex_color
                .chunks_exact(3)
                .map(|c| Vec4::new(c[0], c[1], c[2], 1.0))
                .collect();
            self.meshes.push(data);
            self.mesh_materials
                .push(mesh.material_id.filter(|&id| id < self.materials.len()));
            self.names.push(model.name);
        }
        self.opened = true;
        Ok(())
    }

    fn mesh_count(&self) -> usize {
        self.meshes.len()
    }

    fn mesh(&self, id: usize) -> Option<MeshData> {
        self.meshes.get(id).cloned()
    }

    fn material_count(&self) -> usize {
        self.materials.len()
    }

    fn material(&self, id: usize) -> Option<ImportedMaterial> {
        self.materials.get(id).cloned()
    }

    fn texture_count(&self) -> usize {
        self.texture_paths.len()
    }

    fn texture(&self, id: usize) -> Option<TextureData> {
        (id < self.texture_paths.len()).then(|| TextureData {
            texture_type: TextureType::Texture2D,
            image: id,
            sampler_info: SamplerInfo::default(),
        })
    }

    fn image2d_level_count(&self, image: usize) -> usize {
        if image < self.texture_paths.len() {
            1
        } else {
            0
        }
    }

    fn image2d(&self, image: usize, level: usize) -> Option<ImageData> {
        if level != 0 {
            return None;
        }
        let path = self.texture_paths.get(image)?;
        match image::open(path) {
            Ok(decoded) => {
                let rgba = decoded.to_rgba8();
                Some(ImageData {
                    dimensions: rgba.dimensions(),
                    format: PixelFormat::Uncompressed(ImageFormat::R8G8B8A8_UNORM),
                    bytes: rgba.into_raw(),
                })
            }
            Err(err) => {
                log::error!("Failed to load texture image {:?}: {}", path, err);
                None
            }
        }
    }

    fn object3d_count(&self) -> usize {
        self.meshes.len()
    }

    fn object3d(&self, id: usize) -> Option<ObjectData> {
        let material = *self.mesh_materials.get(id)?;
        Some(ObjectData {
            transformation: Mat4::identity(),
            instance: ObjectInstance::Mesh { mesh: id, material },
            children: Vec::new(),
        })
    }

    fn object3d_name(&self, id: usize) -> String {
        self.names
            .get(id)
            .cloned()
            .unwrap_or_else(|| format!("object {}", id))
    }

    fn default_scene(&self) -> Option<usize> {
        (self.opened && !self.meshes.is_empty()).then_some(0)
    }

    fn scene(&self, id: usize) -> Option<SceneData> {
        (id == 0 && self.opened).then(|| SceneData {
            children: (0..self.meshes.len()).collect(),
        })
    }
}

fn rgb(color: [f32; 3]) -> Vec4 {
    Vec4::new(color[0], color[1], color[2], 1.0)
}
