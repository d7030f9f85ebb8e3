use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum TextureType {
    Texture1D,
    Texture2D,
    Texture3D,
    CubeMap,
}

/// A texture as described by an importer, referencing one of its images.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct TextureData {
    pub texture_type: TextureType,
    pub image: usize,
    pub sampler_info: SamplerInfo,
}

#[derive(Clone, Deserialize, Serialize)]
pub struct ImageData {
    pub dimensions: (u32, u32),
    pub format: PixelFormat,
    pub bytes: Vec<u8>,
}

impl ImageData {
    pub fn is_compressed(&self) -> bool {
        matches!(self.format, PixelFormat::Compressed(_))
    }

    pub fn max_dimension(&self) -> u32 {
        self.dimensions.0.max(self.dimensions.1)
    }
}

impl fmt::Debug for ImageData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageData")
            .field("dimensions", &self.dimensions)
            .field("format", &self.format)
            //.field("bytes", &self.bytes) // explicitly omitted
            .finish()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum PixelFormat {
    Uncompressed(ImageFormat),
    Compressed(CompressedFormat),
}

#[allow(non_camel_case_types)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
/// A list of the more common image formats that we actually support.
pub enum ImageFormat {
    /// 8 bit texture, 1 channel, normalized color space
    R8_UNORM,
    R8G8_UNORM,
    R8G8B8_UNORM,
    R8G8B8A8_UNORM,
    R16_UNORM,
    R16G16_UNORM,
    R16G16B16A16_UNORM,
    R32G32B32A32_SFLOAT,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum CompressedFormat {
    RgbS3tcDxt1,
    RgbaS3tcDxt1,
    RgbaS3tcDxt5,
    RgbaBptc,
    RgbaEtc2,
    RgbaAstc4x4,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct SamplerInfo {
    pub min_filter: Filter,
    pub mag_filter: Filter,
    pub mipmap_mode: MipmapMode,
    pub address_mode: [AddressMode; 2],
}

impl Default for SamplerInfo {
    fn default() -> Self {
        Self {
            min_filter: Filter::Linear,
            mag_filter: Filter::Linear,
            mipmap_mode: MipmapMode::Linear,
            address_mode: [AddressMode::Repeat; 2],
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum Filter {
    Nearest,
    Linear,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum AddressMode {
    Repeat,
    MirroredRepeat,
    ClampToEdge,
    ClampToBorder,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum MipmapMode {
    Nearest,
    Linear,
}
