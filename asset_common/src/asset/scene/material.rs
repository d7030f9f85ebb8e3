use serde::{Deserialize, Serialize};
use ultraviolet::{Mat3, Vec4};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum MaterialType {
    Phong,
    Pbr,
}

/// A material as described by an importer. Texture indices are local to the file.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ImportedMaterial {
    pub material_type: MaterialType,
    pub ambient_color: Vec4,
    pub diffuse_color: Vec4,
    pub specular_color: Vec4,
    pub shininess: f32,
    pub texture_matrix: Mat3,
    pub ambient_texture: Option<usize>,
    pub diffuse_texture: Option<usize>,
    pub specular_texture: Option<usize>,
    pub normal_texture: Option<usize>,
}

impl Default for ImportedMaterial {
    fn default() -> Self {
        Self {
            material_type: MaterialType::Phong,
            ambient_color: Vec4::new(0.0, 0.0, 0.0, 1.0),
            diffuse_color: Vec4::one(),
            specular_color: Vec4::one(),
            shininess: 80.0,
            texture_matrix: Mat3::identity(),
            ambient_texture: None,
            diffuse_texture: None,
            specular_texture: None,
            normal_texture: None,
        }
    }
}

/// A material ready for the shader manager. Texture indices point into the
/// global texture pool.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PhongMaterialData {
    pub ambient_color: Vec4,
    pub diffuse_color: Vec4,
    pub specular_color: Vec4,
    pub shininess: f32,
    pub texture_matrix: Mat3,
    pub ambient_texture: Option<usize>,
    pub diffuse_texture: Option<usize>,
    pub specular_texture: Option<usize>,
    pub normal_texture: Option<usize>,
    pub per_vertex_object_id: bool,
    pub vertex_colored: bool,
}

impl Default for PhongMaterialData {
    fn default() -> Self {
        Self {
            ambient_color: Vec4::new(0.1, 0.1, 0.1, 1.0),
            diffuse_color: Vec4::new(0.7, 0.7, 0.7, 1.0),
            specular_color: Vec4::new(0.2, 0.2, 0.2, 1.0),
            shininess: 80.0,
            texture_matrix: Mat3::identity(),
            ambient_texture: None,
            diffuse_texture: None,
            specular_texture: None,
            normal_texture: None,
            per_vertex_object_id: false,
            vertex_colored: false,
        }
    }
}

impl PhongMaterialData {
    /// Colored by per-vertex object ids, used for semantic meshes.
    pub fn per_vertex_object_id() -> Self {
        Self {
            ambient_color: Vec4::one(),
            per_vertex_object_id: true,
            vertex_colored: true,
            ..Default::default()
        }
    }
}
