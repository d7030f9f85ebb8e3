pub mod scene;

use std::{
    fmt::{self, Display, Formatter},
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use ultraviolet::{Mat3, Mat4, Vec3};

/// The kind of file an asset was loaded from, decides which loader is used.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, Eq, Hash, PartialEq)]
pub enum AssetType {
    #[default]
    Unknown,
    /// A generic scene mesh, e.g. Matterport3D `.glb` files.
    Mp3dMesh,
    /// A semantic mesh with per-vertex object ids, split into one mesh per object.
    InstanceMesh,
    /// A mesh split into tiles, each tile textured from its own atlas.
    TiledTextureMesh,
    /// A house layout file referencing room and object models.
    HouseScene,
    /// A model referenced by a house layout file.
    HouseObject,
    /// A procedurally generated shape.
    Primitive,
}

impl Display for AssetType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let name = match self {
            AssetType::Unknown => "unknown",
            AssetType::Mp3dMesh => "mp3d mesh",
            AssetType::InstanceMesh => "instance mesh",
            AssetType::TiledTextureMesh => "tiled texture mesh",
            AssetType::HouseScene => "house scene",
            AssetType::HouseObject => "house object",
            AssetType::Primitive => "primitive",
        };
        write!(f, "{}", name)
    }
}

/// Source coordinate frame of an asset, expressed in world coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CoordinateFrame {
    pub up: Vec3,
    pub front: Vec3,
    pub origin: Vec3,
}

impl CoordinateFrame {
    pub fn new(up: Vec3, front: Vec3) -> Self {
        Self {
            up,
            front,
            origin: Vec3::zero(),
        }
    }

    pub fn world_up() -> Vec3 {
        Vec3::unit_y()
    }

    pub fn world_front() -> Vec3 {
        -Vec3::unit_z()
    }

    /// Rotation which maps this frame's up and front onto the world's up and front.
    pub fn rotation_frame_to_world(&self) -> Mat3 {
        let up = self.up.normalized();
        let front = self.front.normalized();
        let source = Mat3::new(front.cross(up), up, -front);
        let world = Mat3::new(
            Self::world_front().cross(Self::world_up()),
            Self::world_up(),
            -Self::world_front(),
        );
        // Both bases are orthonormal, so the inverse is the transpose
        world * source.transposed()
    }

    pub fn rotation_frame_to_world_matrix(&self) -> Mat4 {
        self.rotation_frame_to_world().into_homogeneous()
    }
}

impl Default for CoordinateFrame {
    fn default() -> Self {
        Self::new(Self::world_up(), Self::world_front())
    }
}

/// Everything needed to identify how an asset file should be loaded.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AssetInfo {
    pub asset_type: AssetType,
    pub filepath: PathBuf,
    pub frame: CoordinateFrame,
    pub requires_lighting: bool,
}

impl AssetInfo {
    pub fn new(asset_type: AssetType, filepath: impl Into<PathBuf>) -> Self {
        Self {
            asset_type,
            filepath: filepath.into(),
            frame: CoordinateFrame::default(),
            requires_lighting: false,
        }
    }

    pub fn with_lighting(mut self, requires_lighting: bool) -> Self {
        self.requires_lighting = requires_lighting;
        self
    }

    pub fn with_frame(mut self, frame: CoordinateFrame) -> Self {
        self.frame = frame;
        self
    }

    pub fn path(&self) -> &Path {
        &self.filepath
    }

    /// The resource dictionary key for this asset.
    pub fn handle(&self) -> String {
        self.filepath.to_string_lossy().into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: Vec3, b: Vec3) {
        assert!((a - b).mag() < 1e-5, "{:?} != {:?}", a, b);
    }

    #[test]
    fn default_frame_is_identity() {
        let rotation = CoordinateFrame::default().rotation_frame_to_world();
        assert_close(rotation * Vec3::unit_x(), Vec3::unit_x());
        assert_close(rotation * Vec3::unit_y(), Vec3::unit_y());
        assert_close(rotation * Vec3::unit_z(), Vec3::unit_z());
    }

    #[test]
    fn z_up_frame_maps_onto_world() {
        // Z-up, Y-forward data, as produced by many scanners
        let frame = CoordinateFrame::new(Vec3::unit_z(), Vec3::unit_y());
        let rotation = frame.rotation_frame_to_world();
        assert_close(rotation * Vec3::unit_z(), CoordinateFrame::world_up());
        assert_close(rotation * Vec3::unit_y(), CoordinateFrame::world_front());
    }

    #[test]
    fn asset_info_equality_includes_lighting() {
        let info = AssetInfo::new(AssetType::Unknown, "a.glb");
        assert_eq!(info, AssetInfo::new(AssetType::Unknown, "a.glb"));
        assert_ne!(info, info.clone().with_lighting(true));
    }
}
