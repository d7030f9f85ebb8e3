pub mod attributes;
pub mod bounding_box;
pub mod config;
pub mod error;
pub mod gpu;
pub mod house;
pub mod importer;
pub mod mesh;
pub mod meta_data;
pub mod physics;
pub mod physics_config;
pub mod resource_manager;
pub mod scene_graph;
pub mod shader_manager;
pub mod template_library;

pub use resource_manager::ResourceManager;
