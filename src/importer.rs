mod any_scene;
mod gltf_importer;
mod obj_importer;
mod ply_importer;
mod primitive_importer;

pub use any_scene::*;
pub use gltf_importer::*;
pub use obj_importer::*;
pub use ply_importer::*;
pub use primitive_importer::*;

use std::{collections::HashMap, fmt, path::Path};

use asset_common::scene::{ImageData, ImportedMaterial, MeshData, TextureData};
use ultraviolet::Mat4;

use crate::error::AssetError;

/// What a node of an imported scene graph instantiates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ObjectInstance {
    Empty,
    Mesh {
        mesh: usize,
        material: Option<usize>,
    },
    Camera,
    Light,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ObjectData {
    pub transformation: Mat4,
    pub instance: ObjectInstance,
    pub children: Vec<usize>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SceneData {
    /// Top level objects of the scene.
    pub children: Vec<usize>,
}

/// An open import session for one file.
///
/// Every record getter returns `None` when that record can't be decoded,
/// which only fails that record.
pub trait Importer {
    fn open_file(&mut self, path: &Path) -> anyhow::Result<()>;

    fn mesh_count(&self) -> usize;
    fn mesh(&self, id: usize) -> Option<MeshData>;

    fn material_count(&self) -> usize;
    fn material(&self, id: usize) -> Option<ImportedMaterial>;

    fn texture_count(&self) -> usize;
    fn texture(&self, id: usize) -> Option<TextureData>;

    fn image2d_level_count(&self, image: usize) -> usize;
    fn image2d(&self, image: usize, level: usize) -> Option<ImageData>;

    fn object3d_count(&self) -> usize;
    fn object3d(&self, id: usize) -> Option<ObjectData>;
    fn object3d_name(&self, id: usize) -> String {
        format!("object {}", id)
    }

    fn default_scene(&self) -> Option<usize>;
    fn scene(&self, id: usize) -> Option<SceneData>;
}

/// The importers the resource manager asks for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ImporterKind {
    /// Picks a format by file extension.
    AnyScene,
    /// Semantic `.ply` meshes with per-vertex object ids.
    Stanford,
    /// Meshes whose every mesh is one tile of a tiled texture mesh.
    TiledMesh,
}

impl fmt::Display for ImporterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ImporterKind::AnyScene => "AnySceneImporter",
            ImporterKind::Stanford => "StanfordImporter",
            ImporterKind::TiledMesh => "TiledMeshImporter",
        };
        write!(f, "{}", name)
    }
}

pub type ImporterFactory = Box<dyn Fn() -> Box<dyn Importer>>;

/// Creates fresh importer sessions by kind.
pub struct ImporterManager {
    factories: HashMap<ImporterKind, ImporterFactory>,
}

impl ImporterManager {
    pub fn empty() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// glTF, OBJ and PLY support.
    pub fn with_defaults() -> Self {
        let mut manager = Self::empty();
        manager.register(ImporterKind::AnyScene, || Box::new(AnySceneImporter::new()));
        manager.register(ImporterKind::Stanford, || Box::new(PlyImporter::new()));
        manager.register(ImporterKind::TiledMesh, || Box::new(AnySceneImporter::new()));
        manager
    }

    /// Replaces the factory for `kind`.
    pub fn register(
        &mut self,
        kind: ImporterKind,
        factory: impl Fn() -> Box<dyn Importer> + 'static,
    ) {
        self.factories.insert(kind, Box::new(factory));
    }

    pub fn instantiate(&self, kind: ImporterKind) -> Result<Box<dyn Importer>, AssetError> {
        self.factories
            .get(&kind)
            .map(|factory| factory())
            .ok_or_else(|| AssetError::not_found("importer", kind))
    }
}

impl Default for ImporterManager {
    fn default() -> Self {
        Self::with_defaults()
    }
}
