use std::path::Path;

use anyhow::Context;
use asset_common::{
    scene::{
        AddressMode, Filter, ImageData, ImageFormat, ImportedMaterial, MaterialType, MeshData,
        MeshPrimitive, MipmapMode, PixelFormat, SamplerInfo, TextureData, TextureType,
    },
    transform::Transform,
};
use ultraviolet::{Mat4, Vec2, Vec3, Vec4};

use super::{Importer, ObjectData, ObjectInstance, SceneData};

/// glTF and glb files. Every glTF primitive becomes its own mesh, nodes with
/// more than one primitive get an extra child object per additional primitive.
#[derive(Default)]
pub struct GltfImporter {
    loaded: Option<LoadedGltf>,
}

struct LoadedGltf {
    document: gltf::Document,
    meshes: Vec<Option<MeshData>>,
    materials: Vec<ImportedMaterial>,
    textures: Vec<TextureData>,
    images: Vec<Option<ImageData>>,
    objects: Vec<ObjectData>,
    object_names: Vec<String>,
}

impl GltfImporter {
    pub fn new() -> Self {
        Self::default()
    }

    fn loaded(&self) -> Option<&LoadedGltf> {
        self.loaded.as_ref()
    }
}

impl Importer for GltfImporter {
    fn open_file(&mut self, path: &Path) -> anyhow::Result<()> {
        self.loaded = None;
        let (document, buffers, images) =
            gltf::import(path).with_context(|| format!("Failed to read glTF {:?}", path))?;

        // Flatten the primitives of every glTF mesh into one mesh list
        let mut meshes = Vec::new();
        let mut primitives_of_mesh = Vec::new();
        for mesh in document.meshes() {
            let mut primitives = Vec::new();
            for primitive in mesh.primitives() {
                primitives.push((meshes.len(), primitive.material().index()));
                meshes.push(load_primitive(&buffers, &primitive));
            }
            primitives_of_mesh.push(primitives);
        }

        let node_count = document.nodes().count();
        let mut objects = Vec::with_capacity(node_count);
        let mut object_names = Vec::with_capacity(node_count);
        let mut extra_objects = Vec::new();
        for node in document.nodes() {
            let transformation = {
                let (position, orientation, scale) = node.transform().decomposed();
                Transform::from_arrays(position, orientation, scale).to_matrix()
            };
            let mut children: Vec<usize> = node.children().map(|child| child.index()).collect();
            let primitives = node
                .mesh()
                .and_then(|mesh| primitives_of_mesh.get(mesh.index()))
                .map(|p| p.as_slice())
                .unwrap_or(&[]);
            let instance = match primitives.first() {
                Some(&(mesh, material)) => ObjectInstance::Mesh { mesh, material },
                None if node.camera().is_some() => ObjectInstance::Camera,
                None if node.light().is_some() => ObjectInstance::Light,
                None => ObjectInstance::Empty,
            };
            for &(mesh, material) in primitives.iter().skip(1) {
                children.push(node_count + extra_objects.len());
                extra_objects.push(ObjectData {
                    transformation: Mat4::identity(),
                    instance: ObjectInstance::Mesh { mesh, material },
                    children: Vec::new(),
                });
            }
            objects.push(ObjectData {
                transformation,
                instance,
                children,
            });
            object_names.push(
                node.name()
                    .map(|name| name.to_string())
                    .unwrap_or_else(|| format!("node {}", node.index())),
            );
        }
        for i in 0..extra_objects.len() {
            object_names.push(format!("primitive object {}", node_count + i));
        }
        objects.extend(extra_objects);

        let materials = document.materials().map(|m| load_material(&m)).collect();
        let textures = document.textures().map(|t| load_texture(&t)).collect();
        let images = images.into_iter().map(load_image).collect();

        self.loaded = Some(LoadedGltf {
            document,
            meshes,
            materials,
            textures,
            images,
            objects,
            object_names,
        });
        Ok(())
    }

    fn mesh_count(&self) -> usize {
        self.loaded().map(|l| l.meshes.len()).unwrap_or(0)
    }

    fn mesh(&self, id: usize) -> Option<MeshData> {
        self.loaded()?.meshes.get(id)?.clone()
    }

    fn material_count(&self) -> usize {
        self.loaded().map(|l| l.materials.len()).unwrap_or(0)
    }

    fn material(&self, id: usize) -> Option<ImportedMaterial> {
        self.loaded()?.materials.get(id).cloned()
    }

    fn texture_count(&self) -> usize {
        self.loaded().map(|l| l.textures.len()).unwrap_or(0)
    }

    fn texture(&self, id: usize) -> Option<TextureData> {
        self.loaded()?.textures.get(id).copied()
    }

    fn image2d_level_count(&self, image: usize) -> usize {
        // glTF images never carry mip levels
        match self.loaded().and_then(|l| l.images.get(image)) {
            Some(_) => 1,
            None => 0,
        }
    }

    fn image2d(&self, image: usize, level: usize) -> Option<ImageData> {
        if level != 0 {
            return None;
        }
        let image = self.loaded()?.images.get(image)?.as_ref()?;
        Some(ImageData {
            dimensions: image.dimensions,
            format: image.format,
            bytes: image.bytes.clone(),
        })
    }

    fn object3d_count(&self) -> usize {
        self.loaded().map(|l| l.objects.len()).unwrap_or(0)
    }

    fn object3d(&self, id: usize) -> Option<ObjectData> {
        self.loaded()?.objects.get(id).cloned()
    }

    fn object3d_name(&self, id: usize) -> String {
        self.loaded()
            .and_then(|l| l.object_names.get(id).cloned())
            .unwrap_or_else(|| format!("object {}", id))
    }

    fn default_scene(&self) -> Option<usize> {
        self.loaded()?.document.default_scene().map(|s| s.index())
    }

    fn scene(&self, id: usize) -> Option<SceneData> {
        let scene = self.loaded()?.document.scenes().nth(id)?;
        Some(SceneData {
            children: scene.nodes().map(|node| node.index()).collect(),
        })
    }
}

fn load_primitive(buffers: &[gltf::buffer::Data], primitive: &gltf::Primitive<'_>) -> Option<MeshData> {
    let primitive_type = match primitive.mode() {
        gltf::mesh::Mode::Points => MeshPrimitive::Points,
        gltf::mesh::Mode::Lines => MeshPrimitive::Lines,
        gltf::mesh::Mode::Triangles => MeshPrimitive::Triangles,
        mode => {
            log::error!("Unsupported primitive mode {:?}, skipping", mode);
            return None;
        }
    };
    let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(|v| &v.0[..]));
    let Some(positions) = reader.read_positions() else {
        log::error!("Primitive {} has no positions, skipping", primitive.index());
        return None;
    };
    let positions: Vec<Vec3> = positions.map(Vec3::from).collect();

    let indices = reader
        .read_indices()
        .map(|indices| indices.into_u32().collect())
        .unwrap_or_else(|| (0..(positions.len() as u32)).collect());

    let mut mesh = MeshData::new(primitive_type, positions, indices);
    if let Some(normals) = reader.read_normals() {
        mesh.normals = normals.map(Vec3::from).collect();
    }
    if let Some(uvs) = reader.read_tex_coords(0) {
        mesh.uvs = uvs.into_f32().map(Vec2::from).collect();
    }
    if let Some(colors) = reader.read_colors(0) {
        mesh.colors = colors.into_rgba_f32().map(Vec4::from).collect();
    }
    Some(mesh)
}

fn load_material(material: &gltf::Material<'_>) -> ImportedMaterial {
    let material_pbr = material.pbr_metallic_roughness();
    let base_color = Vec4::from(material_pbr.base_color_factor());
    // A rough surface has a wide, dim highlight
    let shininess = ((1.0 - material_pbr.roughness_factor()) * 128.0).max(1.0);

    ImportedMaterial {
        material_type: MaterialType::Phong,
        ambient_color: base_color,
        diffuse_color: base_color,
        shininess,
        diffuse_texture: material_pbr
            .base_color_texture()
            .map(|info| info.texture().index()),
        normal_texture: material
            .normal_texture()
            .map(|normal_texture| normal_texture.texture().index()),
        ..Default::default()
    }
}

fn load_texture(texture: &gltf::Texture<'_>) -> TextureData {
    let sampler = texture.sampler();
    let FilterAndMipmapMode {
        min_filter,
        mipmap_mode,
    } = sampler
        .min_filter()
        .unwrap_or(gltf::texture::MinFilter::Linear)
        .into();
    let mag_filter = from_gltf_filter(
        sampler
            .mag_filter()
            .unwrap_or(gltf::texture::MagFilter::Linear),
    );

    TextureData {
        texture_type: TextureType::Texture2D,
        image: texture.source().index(),
        sampler_info: SamplerInfo {
            min_filter,
            mag_filter,
            mipmap_mode,
            address_mode: [
                from_gltf_address_mode(sampler.wrap_s()),
                from_gltf_address_mode(sampler.wrap_t()),
            ],
        },
    }
}

fn load_image(image: gltf::image::Data) -> Option<ImageData> {
    let format = match image.format {
        gltf::image::Format::R8 => ImageFormat::R8_UNORM,
        gltf::image::Format::R8G8 => ImageFormat::R8G8_UNORM,
        gltf::image::Format::R8G8B8 => ImageFormat::R8G8B8_UNORM,
        gltf::image::Format::R8G8B8A8 => ImageFormat::R8G8B8A8_UNORM,
        gltf::image::Format::R16 => ImageFormat::R16_UNORM,
        gltf::image::Format::R16G16 => ImageFormat::R16G16_UNORM,
        gltf::image::Format::R16G16B16A16 => ImageFormat::R16G16B16A16_UNORM,
        gltf::image::Format::R32G32B32A32FLOAT => ImageFormat::R32G32B32A32_SFLOAT,
        format => {
            // rarely supported formats
            log::error!("Unsupported image format {:?}", format);
            return None;
        }
    };
    Some(ImageData {
        dimensions: (image.width, image.height),
        format: PixelFormat::Uncompressed(format),
        bytes: image.pixels,
    })
}

fn from_gltf_address_mode(wrapping_mode: gltf::texture::WrappingMode) -> AddressMode {
    match wrapping_mode {
        gltf::texture::WrappingMode::ClampToEdge => AddressMode::ClampToEdge,
        gltf::texture::WrappingMode::MirroredRepeat => AddressMode::MirroredRepeat,
        gltf::texture::WrappingMode::Repeat => AddressMode::Repeat,
    }
}

fn from_gltf_filter(linear: gltf::texture::MagFilter) -> Filter {
    match linear {
        gltf::texture::MagFilter::Nearest => Filter::Nearest,
        gltf::texture::MagFilter::Linear => Filter::Linear,
    }
}

struct FilterAndMipmapMode {
    min_filter: Filter,
    mipmap_mode: MipmapMode,
}

impl From<gltf::texture::MinFilter> for FilterAndMipmapMode {
    fn from(min_filter: gltf::texture::MinFilter) -> Self {
        let (min_filter, mipmap_mode) = match min_filter {
            gltf::texture::MinFilter::Nearest => (Filter::Nearest, MipmapMode::Nearest),
            gltf::texture::MinFilter::Linear => (Filter::Linear, MipmapMode::Nearest),
            gltf::texture::MinFilter::NearestMipmapNearest => {
                (Filter::Nearest, MipmapMode::Nearest)
            }
            gltf::texture::MinFilter::LinearMipmapNearest => (Filter::Linear, MipmapMode::Nearest),
            gltf::texture::MinFilter::NearestMipmapLinear => (Filter::Nearest, MipmapMode::Linear),
            gltf::texture::MinFilter::LinearMipmapLinear => (Filter::Linear, MipmapMode::Linear),
        };
        FilterAndMipmapMode {
            min_filter,
            mipmap_mode,
        }
    }
}
