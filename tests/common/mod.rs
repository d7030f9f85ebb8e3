#![allow(dead_code)]

use std::{cell::Cell, path::Path, rc::Rc};

use anyhow::bail;
use asset_common::scene::{ImageData, ImportedMaterial, MeshData, MeshPrimitive, TextureData};
use scene_assets::{
    config::ResourceManagerConfig,
    importer::{Importer, ImporterKind, ObjectData, ObjectInstance, SceneData},
    ResourceManager,
};
use ultraviolet::{Mat4, Vec3};

/// The content every [`FakeImporter`] session reports, whatever file it opens.
#[derive(Clone, Default)]
pub struct FakeScene {
    pub meshes: Vec<MeshData>,
    pub materials: Vec<ImportedMaterial>,
    pub textures: Vec<TextureData>,
    /// Mip levels of every image.
    pub images: Vec<Vec<ImageData>>,
    pub objects: Vec<ObjectData>,
    pub default_scene: Option<SceneData>,
    /// Report a default scene id that `scene()` does not know.
    pub dangling_default_scene: bool,
}

impl FakeScene {
    /// A chain of objects, each the child of the previous one. Only the last
    /// object carries mesh 0.
    pub fn chain(mesh: MeshData, transformations: &[Mat4]) -> Self {
        let last = transformations.len() - 1;
        let objects = transformations
            .iter()
            .enumerate()
            .map(|(i, &transformation)| ObjectData {
                transformation,
                instance: if i == last {
                    ObjectInstance::Mesh {
                        mesh: 0,
                        material: None,
                    }
                } else {
                    ObjectInstance::Empty
                },
                children: if i == last { vec![] } else { vec![i + 1] },
            })
            .collect();
        Self {
            meshes: vec![mesh],
            objects,
            default_scene: Some(SceneData { children: vec![0] }),
            ..Default::default()
        }
    }

    /// Every mesh in its own top level object.
    pub fn flat(meshes: Vec<MeshData>, transformations: &[Mat4]) -> Self {
        let objects = transformations
            .iter()
            .enumerate()
            .map(|(i, &transformation)| ObjectData {
                transformation,
                instance: ObjectInstance::Mesh {
                    mesh: i,
                    material: None,
                },
                children: Vec::new(),
            })
            .collect();
        Self {
            default_scene: Some(SceneData {
                children: (0..meshes.len()).collect(),
            }),
            meshes,
            objects,
            ..Default::default()
        }
    }
}

/// Opens any existing file and counts how often it was asked to.
pub struct FakeImporter {
    scene: Rc<FakeScene>,
    opens: Rc<Cell<usize>>,
}

impl Importer for FakeImporter {
    fn open_file(&mut self, path: &Path) -> anyhow::Result<()> {
        self.opens.set(self.opens.get() + 1);
        if !path.exists() {
            bail!("{:?} does not exist", path);
        }
        Ok(())
    }

    fn mesh_count(&self) -> usize {
        self.scene.meshes.len()
    }

    fn mesh(&self, id: usize) -> Option<MeshData> {
        self.scene.meshes.get(id).cloned()
    }

    fn material_count(&self) -> usize {
        self.scene.materials.len()
    }

    fn material(&self, id: usize) -> Option<ImportedMaterial> {
        self.scene.materials.get(id).cloned()
    }

    fn texture_count(&self) -> usize {
        self.scene.textures.len()
    }

    fn texture(&self, id: usize) -> Option<TextureData> {
        self.scene.textures.get(id).copied()
    }

    fn image2d_level_count(&self, image: usize) -> usize {
        self.scene.images.get(image).map_or(0, Vec::len)
    }

    fn image2d(&self, image: usize, level: usize) -> Option<ImageData> {
        self.scene.images.get(image)?.get(level).cloned()
    }

    fn object3d_count(&self) -> usize {
        self.scene.objects.len()
    }

    fn object3d(&self, id: usize) -> Option<ObjectData> {
        self.scene.objects.get(id).cloned()
    }

    fn default_scene(&self) -> Option<usize> {
        if self.scene.dangling_default_scene {
            return Some(1);
        }
        self.scene.default_scene.as_ref().map(|_| 0)
    }

    fn scene(&self, id: usize) -> Option<SceneData> {
        (id == 0).then(|| self.scene.default_scene.clone()).flatten()
    }
}

/// A resource manager whose generic importer serves `scene`, and the
/// counter of opened files.
pub fn manager_with_scene(scene: FakeScene) -> (ResourceManager, Rc<Cell<usize>>) {
    let mut manager = ResourceManager::new(ResourceManagerConfig::default());
    let scene = Rc::new(scene);
    let opens = Rc::new(Cell::new(0));
    let counter = opens.clone();
    manager
        .importer_manager_mut()
        .register(ImporterKind::AnyScene, move || {
            Box::new(FakeImporter {
                scene: scene.clone(),
                opens: counter.clone(),
            })
        });
    (manager, opens)
}

pub fn triangle() -> MeshData {
    MeshData::new(
        MeshPrimitive::Triangles,
        vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        ],
        vec![0, 1, 2],
    )
}

pub fn unit_quad() -> MeshData {
    MeshData::new(
        MeshPrimitive::Triangles,
        vec![
            Vec3::new(-0.5, -0.5, 0.0),
            Vec3::new(0.5, -0.5, 0.0),
            Vec3::new(0.5, 0.5, 0.0),
            Vec3::new(-0.5, 0.5, 0.0),
        ],
        vec![0, 1, 2, 2, 3, 0],
    )
}

/// Creates an empty file, the fake importer only checks that it exists.
pub fn touch(path: &Path) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, b"").unwrap();
}

pub fn assert_mat4_close(a: Mat4, b: Mat4) {
    for (column_a, column_b) in a.cols.iter().zip(b.cols.iter()) {
        assert!(
            (*column_a - *column_b).mag() < 1e-5,
            "{:?} != {:?}",
            a,
            b
        );
    }
}
