use anyhow::{bail, Context};
use asset_common::scene::{ImageData, MeshData, PixelFormat, SamplerInfo};

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct GpuMeshHandle(u32);

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct GpuTextureHandle(u32);

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextureDescriptor {
    pub levels: u32,
    pub format: PixelFormat,
    pub size: (u32, u32),
    pub sampler: SamplerInfo,
}

/// Takes decoded meshes and textures and turns them into renderable handles.
/// Failures are per resource, the caller decides what to skip.
pub trait GpuBackend {
    fn upload_mesh(&mut self, mesh: &MeshData) -> anyhow::Result<GpuMeshHandle>;

    /// Allocates storage for all mip levels of a 2D texture.
    fn create_texture(&mut self, descriptor: &TextureDescriptor)
        -> anyhow::Result<GpuTextureHandle>;

    fn upload_texture_level(
        &mut self,
        texture: GpuTextureHandle,
        level: u32,
        image: &ImageData,
    ) -> anyhow::Result<()>;

    fn generate_mipmap(&mut self, texture: GpuTextureHandle) -> anyhow::Result<()>;
}

struct HeadlessTexture {
    descriptor: TextureDescriptor,
    uploaded_levels: Vec<bool>,
}

/// Keeps track of what would have been uploaded, without a GPU. Used by the
/// command line tool and by tests.
#[derive(Default)]
pub struct HeadlessGpu {
    mesh_count: u32,
    uploaded_vertices: usize,
    textures: Vec<HeadlessTexture>,
}

impl HeadlessGpu {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mesh_count(&self) -> u32 {
        self.mesh_count
    }

    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    pub fn uploaded_vertices(&self) -> usize {
        self.uploaded_vertices
    }

    pub fn texture_levels(&self, texture: GpuTextureHandle) -> Option<u32> {
        self.textures
            .get(texture.0 as usize)
            .map(|t| t.descriptor.levels)
    }

    fn texture_mut(&mut self, texture: GpuTextureHandle) -> anyhow::Result<&mut HeadlessTexture> {
        self.textures
            .get_mut(texture.0 as usize)
            .with_context(|| format!("Unknown texture {:?}", texture))
    }
}

impl GpuBackend for HeadlessGpu {
    fn upload_mesh(&mut self, mesh: &MeshData) -> anyhow::Result<GpuMeshHandle> {
        if let Some(index) = mesh
            .indices
            .iter()
            .find(|&&index| index as usize >= mesh.vertex_count())
        {
            bail!(
                "Index {} is out of bounds for {} vertices",
                index,
                mesh.vertex_count()
            );
        }
        let handle = GpuMeshHandle(self.mesh_count);
        self.mesh_count += 1;
        self.uploaded_vertices += mesh.vertex_count();
        Ok(handle)
    }

    fn create_texture(
        &mut self,
        descriptor: &TextureDescriptor,
    ) -> anyhow::Result<GpuTextureHandle> {
        if descriptor.levels == 0 {
            bail!("A texture needs at least one level");
        }
        let handle = GpuTextureHandle(self.textures.len() as u32);
        self.textures.push(HeadlessTexture {
            descriptor: *descriptor,
            uploaded_levels: vec![false; descriptor.levels as usize],
        });
        Ok(handle)
    }

    fn upload_texture_level(
        &mut self,
        texture: GpuTextureHandle,
        level: u32,
        image: &ImageData,
    ) -> anyhow::Result<()> {
        let texture = self.texture_mut(texture)?;
        let levels = texture.descriptor.levels;
        let uploaded = texture
            .uploaded_levels
            .get_mut(level as usize)
            .with_context(|| format!("Level {} is outside of {} levels", level, levels))?;
        if image.bytes.is_empty() {
            bail!("Level {} has no pixel data", level);
        }
        *uploaded = true;
        Ok(())
    }

    fn generate_mipmap(&mut self, texture: GpuTextureHandle) -> anyhow::Result<()> {
        let texture = self.texture_mut(texture)?;
        if !texture.uploaded_levels.first().copied().unwrap_or(false) {
            bail!("Base level was never uploaded");
        }
        texture.uploaded_levels.iter_mut().for_each(|level| *level = true);
        Ok(())
    }
}
