use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use asset_common::{AssetInfo, AssetType};
use env_logger::Env;
use scene_assets::{
    config::ResourceManagerConfig,
    scene_graph::{DrawableGroup, SceneGraph, SceneTarget},
    shader_manager::DEFAULT_LIGHTING_KEY,
    ResourceManager,
};

const CONFIG_FILE: &str = "scene_assets.json";

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("warn")).init();

    let mut args = std::env::args().skip(1);
    let Some(scene_file) = args.next().map(PathBuf::from) else {
        bail!("Usage: scene_assets <scene-file> [physics-config]");
    };
    let physics_config = args.next().map(PathBuf::from);

    let config = ResourceManagerConfig::load(CONFIG_FILE)?;
    let split_semantic_mesh = config.split_semantic_mesh;
    let mut resource_manager = ResourceManager::new(config);

    let info = AssetInfo::new(asset_type_of(&scene_file), &scene_file);
    let mut graph = SceneGraph::new();
    let mut drawables = DrawableGroup::new();
    let target = SceneTarget::new(&mut graph, &mut drawables);

    match physics_config {
        Some(physics_config) => {
            let mut attributes = resource_manager
                .load_physics_config(&physics_config)
                .with_context(|| format!("Failed to read {:?}", physics_config))?;
            let physics = resource_manager
                .load_physics_scene(&info, &mut attributes, Some(target), DEFAULT_LIGHTING_KEY)
                .with_context(|| format!("Failed to load {:?}", scene_file))?;
            log::info!("Physics simulator: {}", physics.simulator());
        }
        None => resource_manager
            .load_scene(&info, Some(target), DEFAULT_LIGHTING_KEY, split_semantic_mesh)
            .with_context(|| format!("Failed to load {:?}", scene_file))?,
    }

    log::info!(
        "Loaded {:?}: {} scene nodes, {} drawables",
        scene_file,
        graph.len(),
        drawables.len()
    );
    log::info!(
        "Pools: {} meshes, {} materials, {} textures, {} object templates",
        resource_manager.meshes().len(),
        resource_manager.material_count(),
        resource_manager.textures().len(),
        resource_manager.object_templates().len()
    );
    Ok(())
}

fn asset_type_of(path: &Path) -> AssetType {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    if file_name == "house.json" || file_name.ends_with(".house") {
        AssetType::HouseScene
    } else if file_name.ends_with("_semantic.ply") {
        AssetType::InstanceMesh
    } else if file_name.ends_with(".glb") {
        AssetType::Mp3dMesh
    } else {
        AssetType::Unknown
    }
}
