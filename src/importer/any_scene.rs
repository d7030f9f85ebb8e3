use std::path::Path;

use anyhow::bail;
use asset_common::scene::{ImageData, ImportedMaterial, MeshData, TextureData};

use super::{GltfImporter, Importer, ObjImporter, ObjectData, PlyImporter, SceneData};

/// Picks the concrete importer from the file extension on every `open_file`.
#[derive(Default)]
pub struct AnySceneImporter {
    inner: Option<Box<dyn Importer>>,
}

impl AnySceneImporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn importer_for(path: &Path) -> anyhow::Result<Box<dyn Importer>> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        let importer: Box<dyn Importer> = match extension.as_deref() {
            Some("gltf") | Some("glb") => Box::new(GltfImporter::new()),
            Some("obj") => Box::new(ObjImporter::new()),
            Some("ply") => Box::new(PlyImporter::new()),
            _ => bail!("No importer for {:?}", path),
        };
        Ok(importer)
    }
}

impl Importer for AnySceneImporter {
    fn open_file(&mut self, path: &Path) -> anyhow::Result<()> {
        self.inner = None;
        let mut importer = Self::importer_for(path)?;
        importer.open_file(path)?;
        self.inner = Some(importer);
        Ok(())
    }

    fn mesh_count(&self) -> usize {
        self.inner.as_ref().map_or(0, |i| i.mesh_count())
    }

    fn mesh(&self, id: usize) -> Option<MeshData> {
        self.inner.as_ref()?.mesh(id)
    }

    fn material_count(&self) -> usize {
        self.inner.as_ref().map_or(0, |i| i.material_count())
    }

    fn material(&self, id: usize) -> Option<ImportedMaterial> {
        self.inner.as_ref()?.material(id)
    }

    fn texture_count(&self) -> usize {
        self.inner.as_ref().map_or(0, |i| i.texture_count())
    }

    fn texture(&self, id: usize) -> Option<TextureData> {
        self.inner.as_ref()?.texture(id)
    }

    fn image2d_level_count(&self, image: usize) -> usize {
        self.inner
            .as_ref()
            .map_or(0, |i| i.image2d_level_count(image))
    }

    fn image2d(&self, image: usize, level: usize) -> Option<ImageData> {
        self.inner.as_ref()?.image2d(image, level)
    }

    fn object3d_count(&self) -> usize {
        self.inner.as_ref().map_or(0, |i| i.object3d_count())
    }

    fn object3d(&self, id: usize) -> Option<ObjectData> {
        self.inner.as_ref()?.object3d(id)
    }

    fn object3d_name(&self, id: usize) -> String {
        match &self.inner {
            Some(inner) => inner.object3d_name(id),
            None => format!("object {}", id),
        }
    }

    fn default_scene(&self) -> Option<usize> {
        self.inner.as_ref()?.default_scene()
    }

    fn scene(&self, id: usize) -> Option<SceneData> {
        self.inner.as_ref()?.scene(id)
    }
}
