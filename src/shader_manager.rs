use std::collections::HashMap;

use asset_common::scene::{ImportedMaterial, PhongMaterialData};
use ultraviolet::{Vec3, Vec4};

pub const NO_LIGHT_KEY: &str = "no_lights";
pub const DEFAULT_LIGHTING_KEY: &str = "default_lighting";
pub const DEFAULT_MATERIAL_KEY: &str = "default_material";
pub const PER_VERTEX_OBJECT_ID_MATERIAL_KEY: &str = "per_vertex_object_id";

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LightInfo {
    /// `w == 0` marks a directional light.
    pub position: Vec4,
    pub color: Vec3,
}

pub type LightSetup = Vec<LightInfo>;

/// Keyed storage for materials and light setups. Materials loaded from assets
/// are keyed by their stringified global material id.
pub struct ShaderManager {
    materials: HashMap<String, PhongMaterialData>,
    light_setups: HashMap<String, LightSetup>,
}

impl ShaderManager {
    pub fn new() -> Self {
        let mut manager = Self {
            materials: HashMap::new(),
            light_setups: HashMap::new(),
        };
        manager.set_material(DEFAULT_MATERIAL_KEY, PhongMaterialData::default());
        manager.set_material(
            PER_VERTEX_OBJECT_ID_MATERIAL_KEY,
            PhongMaterialData::per_vertex_object_id(),
        );
        manager.set_light_setup(NO_LIGHT_KEY, Vec::new());
        manager.set_light_setup(
            DEFAULT_LIGHTING_KEY,
            vec![LightInfo {
                position: Vec4::new(0.0, 1.0, 0.0, 0.0),
                color: Vec3::one(),
            }],
        );
        manager
    }

    pub fn set_material(&mut self, key: impl Into<String>, material: PhongMaterialData) {
        self.materials.insert(key.into(), material);
    }

    pub fn material(&self, key: &str) -> Option<&PhongMaterialData> {
        self.materials.get(key)
    }

    pub fn contains_material(&self, key: &str) -> bool {
        self.materials.contains_key(key)
    }

    pub fn material_count(&self) -> usize {
        self.materials.len()
    }

    pub fn set_light_setup(&mut self, key: impl Into<String>, setup: LightSetup) {
        self.light_setups.insert(key.into(), setup);
    }

    pub fn light_setup(&self, key: &str) -> Option<&LightSetup> {
        self.light_setups.get(key)
    }
}

impl Default for ShaderManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Whether an asset can be drawn with `light_setup`. Unlit assets only look
/// right without lights.
pub fn is_light_setup_compatible(light_setup: &str, requires_lighting: bool) -> bool {
    light_setup == NO_LIGHT_KEY || requires_lighting
}

fn global_texture(texture_start: usize, local: Option<usize>) -> Option<usize> {
    local.map(|texture| texture_start + texture)
}

/// Phong shading with every color, texture and the texture matrix.
pub fn build_phong_material(material: &ImportedMaterial, texture_start: usize) -> PhongMaterialData {
    PhongMaterialData {
        ambient_color: material.ambient_color,
        diffuse_color: material.diffuse_color,
        specular_color: material.specular_color,
        shininess: material.shininess,
        texture_matrix: material.texture_matrix,
        ambient_texture: global_texture(texture_start, material.ambient_texture),
        diffuse_texture: global_texture(texture_start, material.diffuse_texture),
        specular_texture: global_texture(texture_start, material.specular_texture),
        normal_texture: global_texture(texture_start, material.normal_texture),
        per_vertex_object_id: false,
        vertex_colored: false,
    }
}

/// Flat shading: only the ambient term is used, so diffuse and specular are zero.
pub fn build_flat_material(material: &ImportedMaterial, texture_start: usize) -> PhongMaterialData {
    let mut flat = PhongMaterialData {
        ambient_color: Vec4::one(),
        diffuse_color: Vec4::zero(),
        specular_color: Vec4::zero(),
        shininess: material.shininess,
        texture_matrix: material.texture_matrix,
        ..Default::default()
    };
    match material.ambient_texture.or(material.diffuse_texture) {
        Some(texture) => flat.ambient_texture = Some(texture_start + texture),
        None => flat.ambient_color = material.ambient_color,
    }
    flat
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_keys_are_registered() {
        let manager = ShaderManager::new();
        assert!(manager.contains_material(DEFAULT_MATERIAL_KEY));
        assert!(manager
            .material(PER_VERTEX_OBJECT_ID_MATERIAL_KEY)
            .is_some_and(|m| m.per_vertex_object_id));
        assert_eq!(manager.light_setup(NO_LIGHT_KEY), Some(&Vec::new()));
        assert_eq!(manager.light_setup(DEFAULT_LIGHTING_KEY).map(Vec::len), Some(1));
    }

    #[test]
    fn flat_material_prefers_textures_over_colors() {
        let mut imported = ImportedMaterial {
            diffuse_texture: Some(2),
            ambient_color: Vec4::new(0.3, 0.2, 0.1, 1.0),
            ..Default::default()
        };
        let flat = build_flat_material(&imported, 10);
        assert_eq!(flat.ambient_texture, Some(12));
        assert_eq!(flat.ambient_color, Vec4::one());
        assert_eq!(flat.diffuse_color, Vec4::zero());

        imported.diffuse_texture = None;
        let flat = build_flat_material(&imported, 10);
        assert_eq!(flat.ambient_texture, None);
        assert_eq!(flat.ambient_color, Vec4::new(0.3, 0.2, 0.1, 1.0));
    }

    #[test]
    fn phong_material_offsets_every_texture() {
        let imported = ImportedMaterial {
            ambient_texture: Some(0),
            normal_texture: Some(1),
            ..Default::default()
        };
        let phong = build_phong_material(&imported, 4);
        assert_eq!(phong.ambient_texture, Some(4));
        assert_eq!(phong.normal_texture, Some(5));
        assert_eq!(phong.diffuse_texture, None);
    }

    #[test]
    fn unlit_assets_need_the_no_light_setup() {
        assert!(is_light_setup_compatible(NO_LIGHT_KEY, false));
        assert!(is_light_setup_compatible(DEFAULT_LIGHTING_KEY, true));
        assert!(!is_light_setup_compatible(DEFAULT_LIGHTING_KEY, false));
    }
}
