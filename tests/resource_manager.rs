mod common;

use asset_common::{bounds::Aabb, AssetInfo, AssetType};
use common::{assert_mat4_close, manager_with_scene, touch, triangle, unit_quad, FakeScene};
use scene_assets::{
    config::ResourceManagerConfig,
    error::AssetError,
    importer::{ObjectInstance, SceneData},
    mesh::BaseMesh,
    scene_graph::{DrawableGroup, SceneGraph, SceneTarget},
    shader_manager::{DEFAULT_MATERIAL_KEY, NO_LIGHT_KEY, PER_VERTEX_OBJECT_ID_MATERIAL_KEY},
    ResourceManager,
};
use ultraviolet::{Mat4, Rotor3, Vec3};

#[test]
fn identical_loads_import_once() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("table.glb");
    touch(&path);
    let (mut manager, opens) = manager_with_scene(FakeScene::chain(triangle(), &[Mat4::identity()]));

    let info = AssetInfo::new(AssetType::Unknown, &path);
    manager.load_general_mesh(&info, None, NO_LIGHT_KEY).unwrap();
    let first = manager.mesh_meta_data(&info.handle()).unwrap().clone();
    manager.load_general_mesh(&info, None, NO_LIGHT_KEY).unwrap();

    assert_eq!(opens.get(), 1);
    assert_eq!(manager.mesh_meta_data(&info.handle()).unwrap(), &first);
    assert_eq!(manager.meshes().len(), 1);
}

#[test]
fn mismatched_reload_keeps_cached_entry() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("lamp.glb");
    touch(&path);
    let (mut manager, opens) = manager_with_scene(FakeScene::chain(triangle(), &[Mat4::identity()]));

    let unlit = AssetInfo::new(AssetType::Unknown, &path);
    manager.load_general_mesh(&unlit, None, NO_LIGHT_KEY).unwrap();
    let lit = unlit.clone().with_lighting(true);
    manager.load_general_mesh(&lit, None, NO_LIGHT_KEY).unwrap();

    assert_eq!(opens.get(), 1);
    let cached = manager.loaded_asset(&lit.handle()).unwrap();
    assert!(!cached.asset_info.requires_lighting);
}

#[test]
fn failed_import_is_not_cached() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("gone.glb");
    let (mut manager, opens) = manager_with_scene(FakeScene::chain(triangle(), &[Mat4::identity()]));

    let info = AssetInfo::new(AssetType::Unknown, &path);
    assert!(manager.load_general_mesh(&info, None, NO_LIGHT_KEY).is_err());
    assert!(!manager.is_loaded(&info.handle()));

    touch(&path);
    manager.load_general_mesh(&info, None, NO_LIGHT_KEY).unwrap();
    assert_eq!(opens.get(), 2);
}

#[test]
fn leaf_transform_is_product_of_ancestors() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("arm.glb");
    touch(&path);
    let transforms = [
        Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0)),
        Rotor3::from_rotation_xz(0.7).into_matrix().into_homogeneous(),
        Mat4::from_nonuniform_scale(Vec3::new(2.0, 0.5, 1.0)),
        Mat4::from_translation(Vec3::new(0.0, -1.0, 0.5)),
    ];
    let (mut manager, _) = manager_with_scene(FakeScene::chain(triangle(), &transforms));

    let mut graph = SceneGraph::new();
    let mut drawables = DrawableGroup::new();
    let info = AssetInfo::new(AssetType::Unknown, &path);
    manager
        .load_general_mesh(
            &info,
            Some(SceneTarget::new(&mut graph, &mut drawables)),
            NO_LIGHT_KEY,
        )
        .unwrap();

    assert_eq!(drawables.len(), 1);
    let leaf = drawables.nodes[0];
    let expected = transforms[0] * transforms[1] * transforms[2] * transforms[3];
    assert_mat4_close(graph.absolute_transformation(leaf), expected);

    let drawable = &graph.node(leaf).drawables[0];
    assert_eq!(drawable.material, DEFAULT_MATERIAL_KEY);
    assert_eq!(drawable.mesh_id, 0);
}

#[test]
fn joined_collision_mesh_rebases_indices() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pair.glb");
    touch(&path);
    let offset = Vec3::new(10.0, 0.0, 0.0);
    let (mut manager, _) = manager_with_scene(FakeScene::flat(
        vec![triangle(), unit_quad()],
        &[Mat4::identity(), Mat4::from_translation(offset)],
    ));

    let info = AssetInfo::new(AssetType::Unknown, &path);
    manager.load_general_mesh(&info, None, NO_LIGHT_KEY).unwrap();
    let joined = manager.create_joined_collision_mesh(&info.handle()).unwrap();

    assert_eq!(joined.vbo.len(), 3 + 4);
    assert_eq!(joined.ibo.len(), 3 + 6);
    assert_eq!(&joined.ibo[3..], &[3, 4, 5, 5, 6, 3]);
    assert!(joined.ibo.iter().all(|&index| (index as usize) < joined.vbo.len()));
    assert_eq!(joined.vbo[3], unit_quad().positions[0] + offset);
}

#[test]
fn absolute_bounds_follow_translation() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("room.glb");
    touch(&path);
    let t = Vec3::new(3.0, -2.0, 5.0);
    let (mut manager, _) =
        manager_with_scene(FakeScene::chain(unit_quad(), &[Mat4::from_translation(t)]));

    let mut graph = SceneGraph::new();
    let mut drawables = DrawableGroup::new();
    let info = AssetInfo::new(AssetType::Unknown, &path);
    manager
        .load_scene(
            &info,
            Some(SceneTarget::new(&mut graph, &mut drawables)),
            NO_LIGHT_KEY,
            false,
        )
        .unwrap();

    let node = graph.node(drawables.nodes[0]);
    let local = node.mesh_bb.unwrap();
    assert_eq!(
        node.absolute_aabb,
        Some(Aabb::new(local.min + t, local.max + t))
    );
    // the scene gets a physics scene template
    let scene = manager.scene_templates().get(&info.handle()).unwrap();
    assert_eq!(scene.render_asset_handle, info.handle());
}

#[test]
fn house_objects_get_dense_semantic_ids() {
    let dir = tempfile::tempdir().unwrap();
    let house = dir.path().join("house").join("h1").join("house.json");
    touch(&dir.path().join("object").join("chair").join("chair.glb"));
    touch(&house);
    std::fs::write(
        &house,
        r#"{
            "levels": [{
                "nodes": [
                    { "id": "0_0", "type": "Box" },
                    { "id": "0_1", "type": "Object", "valid": 0, "modelId": "chair" },
                    { "id": "0_2", "type": "Object", "modelId": "chair",
                      "transform": [1,0,0,0, 0,1,0,0, 0,0,1,0, 4,0,2,1] },
                    { "id": "0_3", "type": "Object", "modelId": "missing" }
                ]
            }]
        }"#,
    )
    .unwrap();
    let (mut manager, opens) = manager_with_scene(FakeScene::chain(triangle(), &[Mat4::identity()]));

    let mut graph = SceneGraph::new();
    let mut drawables = DrawableGroup::new();
    let info = AssetInfo::new(AssetType::HouseScene, &house);
    manager
        .load_scene(
            &info,
            Some(SceneTarget::new(&mut graph, &mut drawables)),
            NO_LIGHT_KEY,
            false,
        )
        .unwrap();

    let objects: Vec<_> = graph.children(graph.root()).collect();
    assert_eq!(objects.len(), 3);
    let semantic_ids: Vec<_> = objects
        .iter()
        .map(|&node| graph.node(node).semantic_id)
        .collect();
    assert_eq!(semantic_ids, vec![Some(0), Some(1), Some(2)]);
    assert_eq!(
        graph.node(objects[1]).transformation.extract_translation(),
        Vec3::new(4.0, 0.0, 2.0)
    );
    assert_eq!(drawables.len(), 1);
    // the missing model was attempted and skipped
    assert_eq!(opens.get(), 2);
}

const SEMANTIC_QUAD: &str = "ply
format ascii 1.0
element vertex 4
property float x
property float y
property float z
property int object_id
element face 2
property list uchar int vertex_indices
end_header
0 0 0 3
1 0 0 3
1 1 0 5
0 1 0 5
3 0 1 2
3 2 3 0
";

#[test]
fn semantic_mesh_is_split_per_object() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("apartment_semantic.ply");
    std::fs::write(&path, SEMANTIC_QUAD).unwrap();
    let mut manager = ResourceManager::new(ResourceManagerConfig::default());

    let mut graph = SceneGraph::new();
    let mut drawables = DrawableGroup::new();
    let info = AssetInfo::new(AssetType::InstanceMesh, &path);
    manager
        .load_scene(
            &info,
            Some(SceneTarget::new(&mut graph, &mut drawables)),
            NO_LIGHT_KEY,
            true,
        )
        .unwrap();

    assert_eq!(manager.meshes().len(), 2);
    assert!(manager
        .meshes()
        .iter()
        .all(|mesh| matches!(mesh, BaseMesh::Instance(_))));
    let object_ids: Vec<_> = drawables
        .nodes
        .iter()
        .map(|&node| graph.node(node).drawables[0].object_id)
        .collect();
    assert_eq!(object_ids, vec![Some(3), Some(5)]);
    for &node in &drawables.nodes {
        let node = graph.node(node);
        assert_eq!(node.drawables[0].material, PER_VERTEX_OBJECT_ID_MATERIAL_KEY);
        assert!(node.absolute_aabb.is_some());
    }
}

#[test]
fn scene_without_target_only_caches() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("apartment_semantic.ply");
    std::fs::write(&path, SEMANTIC_QUAD).unwrap();
    let mut manager = ResourceManager::new(ResourceManagerConfig::default());

    let info = AssetInfo::new(AssetType::InstanceMesh, &path);
    manager.load_scene(&info, None, NO_LIGHT_KEY, false).unwrap();
    assert_eq!(manager.mesh_meta_data(&info.handle()).unwrap().mesh_index.count, 1);
}

#[test]
fn textures_and_materials_land_in_global_pools() {
    use asset_common::scene::{
        ImageData, ImageFormat, ImportedMaterial, PixelFormat, SamplerInfo, TextureData,
        TextureType,
    };

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("crate.glb");
    touch(&path);
    let texture = |texture_type| TextureData {
        texture_type,
        image: 0,
        sampler_info: SamplerInfo::default(),
    };
    let mut scene = FakeScene::chain(triangle(), &[Mat4::identity()]);
    scene.textures = vec![texture(TextureType::Texture2D), texture(TextureType::CubeMap)];
    scene.images = vec![vec![ImageData {
        dimensions: (8, 4),
        format: PixelFormat::Uncompressed(ImageFormat::R8G8B8A8_UNORM),
        bytes: vec![200; 8 * 4 * 4],
    }]];
    scene.materials = vec![ImportedMaterial {
        diffuse_texture: Some(0),
        ..Default::default()
    }];
    if let Some(object) = scene.objects.first_mut() {
        object.instance = ObjectInstance::Mesh {
            mesh: 0,
            material: Some(0),
        };
    }
    let (mut manager, _) = manager_with_scene(scene);
    // something else takes the first pool slots
    manager.build_primitive_asset_data("cubeSolid").unwrap();

    let mut graph = SceneGraph::new();
    let mut drawables = DrawableGroup::new();
    let info = AssetInfo::new(AssetType::Unknown, &path).with_lighting(true);
    manager
        .load_general_mesh(
            &info,
            Some(SceneTarget::new(&mut graph, &mut drawables)),
            NO_LIGHT_KEY,
        )
        .unwrap();

    let meta_data = manager.mesh_meta_data(&info.handle()).unwrap();
    assert_eq!(meta_data.texture_index.count, 2);
    assert_eq!(meta_data.material_index.start, 1);
    assert!(manager.textures()[0].is_some());
    // cube maps are not supported
    assert!(manager.textures()[1].is_none());

    let material = manager.shader_manager().material("1").unwrap();
    assert_eq!(material.diffuse_texture, Some(0));
    assert_eq!(graph.node(drawables.nodes[0]).drawables[0].material, "1");
}

#[test]
fn self_referencing_object_is_imported_once() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("loop.glb");
    touch(&path);
    let mut scene = FakeScene::chain(triangle(), &[Mat4::identity()]);
    scene.objects[0].children = vec![0];
    let (mut manager, _) = manager_with_scene(scene);

    let mut graph = SceneGraph::new();
    let mut drawables = DrawableGroup::new();
    let info = AssetInfo::new(AssetType::Unknown, &path);
    manager
        .load_general_mesh(
            &info,
            Some(SceneTarget::new(&mut graph, &mut drawables)),
            NO_LIGHT_KEY,
        )
        .unwrap();

    let root = &manager.mesh_meta_data(&info.handle()).unwrap().root;
    assert_eq!(root.node_count(), 2);
    assert_eq!(root.children[0].component_id, Some(0));
    assert!(root.children[0].children.is_empty());
    assert_eq!(drawables.len(), 1);
}

#[test]
fn missing_object_leaves_partial_hierarchy() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("partial.glb");
    touch(&path);
    let mut scene = FakeScene::flat(
        vec![triangle(), unit_quad()],
        &[Mat4::identity(), Mat4::identity()],
    );
    scene.default_scene = Some(SceneData {
        children: vec![0, 9],
    });
    let (mut manager, _) = manager_with_scene(scene);

    let info = AssetInfo::new(AssetType::Unknown, &path);
    manager.load_general_mesh(&info, None, NO_LIGHT_KEY).unwrap();

    let meta_data = manager.mesh_meta_data(&info.handle()).unwrap();
    assert_eq!(meta_data.mesh_index.count, 2);
    assert_eq!(meta_data.root.children.len(), 1);
    assert_eq!(meta_data.root.children[0].component_id, Some(0));
    assert_eq!(meta_data.root.children[0].mesh_id_local, Some(0));
}

#[test]
fn meshes_without_scene_get_a_node_for_the_first_mesh() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bare.ply");
    touch(&path);
    let (mut manager, _) = manager_with_scene(FakeScene {
        meshes: vec![unit_quad(), triangle()],
        ..Default::default()
    });

    let mut graph = SceneGraph::new();
    let mut drawables = DrawableGroup::new();
    let info = AssetInfo::new(AssetType::Unknown, &path);
    manager
        .load_general_mesh(
            &info,
            Some(SceneTarget::new(&mut graph, &mut drawables)),
            NO_LIGHT_KEY,
        )
        .unwrap();

    let root = &manager.mesh_meta_data(&info.handle()).unwrap().root;
    assert_eq!(root.children.len(), 1);
    assert_eq!(root.children[0].mesh_id_local, Some(0));
    assert_eq!(root.children[0].component_id, Some(0));
    assert_eq!(drawables.len(), 1);
    assert_eq!(graph.node(drawables.nodes[0]).drawables[0].mesh_id, 0);
}

#[test]
fn file_without_scene_or_meshes_fails() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("empty.glb");
    touch(&path);
    let (mut manager, _) = manager_with_scene(FakeScene::default());

    let info = AssetInfo::new(AssetType::Unknown, &path);
    let result = manager.load_general_mesh(&info, None, NO_LIGHT_KEY);

    assert!(matches!(result, Err(AssetError::LoadFailure { .. })));
    assert!(!manager.is_loaded(&info.handle()));
}

#[test]
fn unreadable_default_scene_fails() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.glb");
    touch(&path);
    let mut scene = FakeScene::chain(triangle(), &[Mat4::identity()]);
    scene.dangling_default_scene = true;
    let (mut manager, _) = manager_with_scene(scene);

    let info = AssetInfo::new(AssetType::Unknown, &path);
    let result = manager.load_general_mesh(&info, None, NO_LIGHT_KEY);

    assert!(matches!(result, Err(AssetError::LoadFailure { .. })));
    assert!(!manager.is_loaded(&info.handle()));
}

#[test]
fn material_outside_asset_range_uses_default() {
    use asset_common::scene::ImportedMaterial;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("stray.glb");
    touch(&path);
    let mut scene = FakeScene::chain(triangle(), &[Mat4::identity()]);
    scene.materials = vec![ImportedMaterial::default()];
    scene.objects[0].instance = ObjectInstance::Mesh {
        mesh: 0,
        material: Some(2),
    };
    let (mut manager, _) = manager_with_scene(scene);

    let mut graph = SceneGraph::new();
    let mut drawables = DrawableGroup::new();
    let info = AssetInfo::new(AssetType::Unknown, &path);
    manager
        .load_general_mesh(
            &info,
            Some(SceneTarget::new(&mut graph, &mut drawables)),
            NO_LIGHT_KEY,
        )
        .unwrap();

    assert_eq!(
        manager.mesh_meta_data(&info.handle()).unwrap().material_index.count,
        1
    );
    let drawable = &graph.node(drawables.nodes[0]).drawables[0];
    assert_eq!(drawable.material, DEFAULT_MATERIAL_KEY);
}

#[test]
fn cached_generic_mesh_is_not_instanced_as_another_kind() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("apartment_semantic.ply");
    touch(&path);
    let (mut manager, _) = manager_with_scene(FakeScene::chain(triangle(), &[Mat4::identity()]));
    let generic = AssetInfo::new(AssetType::Unknown, &path);
    manager.load_general_mesh(&generic, None, NO_LIGHT_KEY).unwrap();

    let mut graph = SceneGraph::new();
    let mut drawables = DrawableGroup::new();
    for asset_type in [AssetType::InstanceMesh, AssetType::TiledTextureMesh] {
        let info = AssetInfo::new(asset_type, &path);
        let result = manager.load_scene(
            &info,
            Some(SceneTarget::new(&mut graph, &mut drawables)),
            NO_LIGHT_KEY,
            true,
        );
        assert!(matches!(
            result,
            Err(AssetError::UnsupportedConfiguration { .. })
        ));
    }
    assert!(drawables.is_empty());
    assert_eq!(manager.meshes().len(), 1);
}
