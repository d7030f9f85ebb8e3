use std::path::PathBuf;

use ultraviolet::Vec3;

/// Where an object template came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TemplateOrigin {
    /// Parsed from a `.phys_properties.json` file.
    File,
    /// Built in code, e.g. for a primitive shape.
    Synthesized,
}

/// Physical and rendering properties of an object that can be instanced.
#[derive(Clone, Debug, PartialEq)]
pub struct PhysicsObjectAttributes {
    pub origin_handle: String,
    pub origin: TemplateOrigin,
    pub mass: f64,
    /// Center of mass, only meaningful if `com_provided`.
    pub com: Vec3,
    pub com_provided: bool,
    pub scale: Vec3,
    /// Diagonal of the inertia tensor. Zero means computed from the shape.
    pub inertia: Vec3,
    pub friction_coefficient: f64,
    pub restitution_coefficient: f64,
    pub linear_damping: f64,
    pub angular_damping: f64,
    pub margin: f64,
    pub join_collision_meshes: bool,
    pub requires_lighting: bool,
    pub bounding_box_collisions: bool,
    pub use_mesh_collision: bool,
    pub render_asset_handle: String,
    pub collision_asset_handle: String,
}

impl PhysicsObjectAttributes {
    pub fn new(origin_handle: impl Into<String>, origin: TemplateOrigin) -> Self {
        Self {
            origin_handle: origin_handle.into(),
            origin,
            mass: 1.0,
            com: Vec3::zero(),
            com_provided: false,
            scale: Vec3::one(),
            inertia: Vec3::zero(),
            friction_coefficient: 0.5,
            restitution_coefficient: 0.1,
            linear_damping: 0.2,
            angular_damping: 0.2,
            margin: 0.01,
            join_collision_meshes: true,
            requires_lighting: true,
            bounding_box_collisions: false,
            use_mesh_collision: true,
            render_asset_handle: String::new(),
            collision_asset_handle: String::new(),
        }
    }

    pub fn is_synthesized(&self) -> bool {
        self.origin == TemplateOrigin::Synthesized
    }
}

/// Properties of the static scene collision geometry.
#[derive(Clone, Debug, PartialEq)]
pub struct PhysicsSceneAttributes {
    pub origin_handle: String,
    pub friction_coefficient: f64,
    pub restitution_coefficient: f64,
    pub render_asset_handle: String,
    pub collision_asset_handle: String,
}

impl PhysicsSceneAttributes {
    pub fn new(origin_handle: impl Into<String>) -> Self {
        Self {
            origin_handle: origin_handle.into(),
            friction_coefficient: 0.4,
            restitution_coefficient: 0.05,
            render_asset_handle: String::new(),
            collision_asset_handle: String::new(),
        }
    }
}

/// World settings read from a physics configuration file.
#[derive(Clone, Debug, PartialEq)]
pub struct PhysicsManagerAttributes {
    pub origin_handle: String,
    pub simulator: String,
    pub timestep: f64,
    pub max_substeps: u32,
    pub friction_coefficient: f64,
    pub restitution_coefficient: f64,
    pub gravity: Vec3,
    /// Object template files and directories, already resolved against
    /// the configuration file's directory.
    pub object_library_paths: Vec<PathBuf>,
}

impl PhysicsManagerAttributes {
    pub fn new(origin_handle: impl Into<String>) -> Self {
        Self {
            origin_handle: origin_handle.into(),
            simulator: "none".to_string(),
            timestep: 0.01,
            max_substeps: 10,
            friction_coefficient: 0.4,
            restitution_coefficient: 0.1,
            gravity: Vec3::new(0.0, -9.8, 0.0),
            object_library_paths: Vec::new(),
        }
    }
}
