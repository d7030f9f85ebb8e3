use asset_common::AssetInfo;
use ultraviolet::Mat4;

/// A contiguous range of global pool indices. An empty range owns no entries.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct IndexRange {
    pub start: usize,
    pub count: usize,
}

impl IndexRange {
    pub fn new(start: usize, count: usize) -> Self {
        Self { start, count }
    }

    pub fn single(index: usize) -> Self {
        Self::new(index, 1)
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Inclusive last index, `None` for an empty range.
    pub fn last(&self) -> Option<usize> {
        (self.count > 0).then(|| self.start + self.count - 1)
    }

    pub fn contains(&self, index: usize) -> bool {
        index >= self.start && index < self.start + self.count
    }

    /// Maps an index local to the asset into the global pool.
    pub fn global(&self, local: usize) -> Option<usize> {
        (local < self.count).then(|| self.start + local)
    }

    pub fn iter(&self) -> std::ops::Range<usize> {
        self.start..self.start + self.count
    }
}

/// A node of a loaded asset's transform hierarchy.
#[derive(Clone, Debug, PartialEq)]
pub struct MeshTransformNode {
    pub transform_from_local_to_parent: Mat4,
    /// Mesh index relative to the asset's mesh range.
    pub mesh_id_local: Option<usize>,
    /// Material index relative to the asset's material range.
    pub material_id_local: Option<usize>,
    /// The importer's object id this node was built from.
    pub component_id: Option<usize>,
    pub children: Vec<MeshTransformNode>,
}

impl Default for MeshTransformNode {
    fn default() -> Self {
        Self {
            transform_from_local_to_parent: Mat4::identity(),
            mesh_id_local: None,
            material_id_local: None,
            component_id: None,
            children: Vec::new(),
        }
    }
}

impl MeshTransformNode {
    pub fn with_mesh(mesh_id_local: usize) -> Self {
        Self {
            mesh_id_local: Some(mesh_id_local),
            ..Default::default()
        }
    }

    /// Number of nodes in this subtree, including itself.
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(|c| c.node_count()).sum::<usize>()
    }

    /// Depth first walk, calling `visit` with every node and its accumulated local-to-world transform.
    pub fn walk(&self, parent_to_world: Mat4, visit: &mut impl FnMut(&MeshTransformNode, Mat4)) {
        let local_to_world = parent_to_world * self.transform_from_local_to_parent;
        visit(self, local_to_world);
        for child in &self.children {
            child.walk(local_to_world, visit);
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshMetaData {
    pub mesh_index: IndexRange,
    pub material_index: IndexRange,
    pub texture_index: IndexRange,
    pub root: MeshTransformNode,
}

impl MeshMetaData {
    pub fn with_meshes(mesh_index: IndexRange) -> Self {
        Self {
            mesh_index,
            ..Default::default()
        }
    }
}

/// A cached entry of the resource dictionary.
#[derive(Clone, Debug, PartialEq)]
pub struct LoadedAssetData {
    pub asset_info: AssetInfo,
    pub mesh_meta_data: MeshMetaData,
}

impl LoadedAssetData {
    pub fn new(asset_info: AssetInfo) -> Self {
        Self {
            asset_info,
            mesh_meta_data: MeshMetaData::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ultraviolet::Vec3;

    #[test]
    fn empty_range_has_no_last_index() {
        let range = IndexRange::new(4, 0);
        assert!(range.is_empty());
        assert_eq!(range.last(), None);
        assert_eq!(range.global(0), None);
        assert_eq!(range.iter().count(), 0);
    }

    #[test]
    fn local_indices_map_into_range() {
        let range = IndexRange::new(10, 3);
        assert_eq!(range.last(), Some(12));
        assert_eq!(range.global(2), Some(12));
        assert_eq!(range.global(3), None);
        assert!(range.contains(11));
        assert!(!range.contains(13));
    }

    #[test]
    fn walk_composes_transforms() {
        let mut root = MeshTransformNode {
            transform_from_local_to_parent: Mat4::from_translation(Vec3::unit_x()),
            ..Default::default()
        };
        let mut child = MeshTransformNode::with_mesh(0);
        child.transform_from_local_to_parent = Mat4::from_translation(Vec3::unit_y());
        root.children.push(child);

        let mut seen = Vec::new();
        root.walk(Mat4::identity(), &mut |node, transform| {
            seen.push((node.mesh_id_local, transform.transform_point3(Vec3::zero())));
        });
        assert_eq!(root.node_count(), 2);
        assert_eq!(seen[1], (Some(0), Vec3::new(1.0, 1.0, 0.0)));
    }
}
