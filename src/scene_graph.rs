use std::sync::atomic::{AtomicU32, Ordering};

use asset_common::bounds::Aabb;
use ultraviolet::{Mat3, Mat4, Vec3};

static NEXT_SCENE_ID: AtomicU32 = AtomicU32::new(0);

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct SceneId(u32);

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct NodeId {
    scene: SceneId,
    index: usize,
}

impl NodeId {
    pub fn scene(&self) -> SceneId {
        self.scene
    }
}

/// A renderable attached to a node, referencing shader manager keys.
#[derive(Clone, Debug, PartialEq)]
pub struct Drawable {
    /// Index into the global mesh pool.
    pub mesh_id: usize,
    /// Submesh of a tiled mesh, `None` for everything else.
    pub submesh: Option<usize>,
    pub light_setup: String,
    pub material: String,
    pub object_id: Option<usize>,
}

#[derive(Clone, Debug)]
pub struct SceneNode {
    parent: Option<usize>,
    children: Vec<usize>,
    pub transformation: Mat4,
    /// Dense semantic index, set for house scene objects.
    pub semantic_id: Option<usize>,
    pub drawables: Vec<Drawable>,
    pub mesh_bb: Option<Aabb>,
    pub absolute_aabb: Option<Aabb>,
}

impl SceneNode {
    fn new(parent: Option<usize>) -> Self {
        Self {
            parent,
            children: Vec::new(),
            transformation: Mat4::identity(),
            semantic_id: None,
            drawables: Vec::new(),
            mesh_bb: None,
            absolute_aabb: None,
        }
    }
}

/// An arena of nodes with a single root. Every graph gets a process-unique id,
/// so nodes of different graphs can't be mixed up.
pub struct SceneGraph {
    id: SceneId,
    nodes: Vec<SceneNode>,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self {
            id: SceneId(NEXT_SCENE_ID.fetch_add(1, Ordering::SeqCst)),
            nodes: vec![SceneNode::new(None)],
        }
    }

    pub fn id(&self) -> SceneId {
        self.id
    }

    pub fn root(&self) -> NodeId {
        NodeId {
            scene: self.id,
            index: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        // The root always exists
        false
    }

    fn index_of(&self, node: NodeId) -> usize {
        assert_eq!(
            node.scene, self.id,
            "Node {:?} does not belong to scene {:?}",
            node, self.id
        );
        node.index
    }

    pub fn create_child(&mut self, parent: NodeId) -> NodeId {
        let parent = self.index_of(parent);
        let index = self.nodes.len();
        self.nodes.push(SceneNode::new(Some(parent)));
        self.nodes[parent].children.push(index);
        NodeId {
            scene: self.id,
            index,
        }
    }

    pub fn node(&self, node: NodeId) -> &SceneNode {
        &self.nodes[self.index_of(node)]
    }

    pub fn node_mut(&mut self, node: NodeId) -> &mut SceneNode {
        let index = self.index_of(node);
        &mut self.nodes[index]
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.node(node).parent.map(|index| NodeId {
            scene: self.id,
            index,
        })
    }

    pub fn children(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        let scene = self.id;
        self.node(node)
            .children
            .iter()
            .map(move |&index| NodeId { scene, index })
    }

    pub fn set_transformation(&mut self, node: NodeId, transformation: Mat4) {
        self.node_mut(node).transformation = transformation;
    }

    pub fn set_scaling(&mut self, node: NodeId, scaling: Vec3) {
        self.node_mut(node).transformation = Mat4::from_nonuniform_scale(scaling);
    }

    /// Replaces the rotation, keeps the translation.
    pub fn set_rotation(&mut self, node: NodeId, rotation: Mat3) {
        let node = self.node_mut(node);
        let translation = node.transformation.extract_translation();
        node.transformation = Mat4::from_translation(translation) * rotation.into_homogeneous();
    }

    pub fn add_drawable(&mut self, node: NodeId, drawable: Drawable) {
        self.node_mut(node).drawables.push(drawable);
    }

    /// Transformation of `node` relative to the scene root.
    pub fn absolute_transformation(&self, node: NodeId) -> Mat4 {
        let mut index = self.index_of(node);
        let mut transformation = self.nodes[index].transformation;
        while let Some(parent) = self.nodes[index].parent {
            transformation = self.nodes[parent].transformation * transformation;
            index = parent;
        }
        transformation
    }

    /// Absolute transformations for a batch of nodes. All of them must be part of this scene.
    pub fn transformation_matrices(&self, nodes: &[NodeId]) -> Vec<Mat4> {
        nodes
            .iter()
            .map(|&node| self.absolute_transformation(node))
            .collect()
    }
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}

/// Nodes carrying drawables, in the order they were added.
#[derive(Clone, Debug, Default)]
pub struct DrawableGroup {
    pub nodes: Vec<NodeId>,
}

impl DrawableGroup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Where a load should instantiate renderable nodes.
pub struct SceneTarget<'a> {
    pub graph: &'a mut SceneGraph,
    pub parent: NodeId,
    pub drawables: &'a mut DrawableGroup,
}

impl<'a> SceneTarget<'a> {
    pub fn new(graph: &'a mut SceneGraph, drawables: &'a mut DrawableGroup) -> Self {
        let parent = graph.root();
        Self {
            graph,
            parent,
            drawables,
        }
    }

    pub fn with_parent(mut self, parent: NodeId) -> Self {
        self.parent = parent;
        self
    }

    /// Short lived copy of this target, for passing it on without giving it away.
    pub fn reborrow(&mut self) -> SceneTarget<'_> {
        SceneTarget {
            graph: &mut *self.graph,
            parent: self.parent,
            drawables: &mut *self.drawables,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absolute_transformation_multiplies_ancestors() {
        let mut graph = SceneGraph::new();
        let a = graph.create_child(graph.root());
        let b = graph.create_child(a);
        graph.set_transformation(a, Mat4::from_translation(Vec3::new(1.0, 0.0, 0.0)));
        graph.set_scaling(b, Vec3::new(2.0, 2.0, 2.0));

        let absolute = graph.absolute_transformation(b);
        let point = absolute.transform_point3(Vec3::one());
        assert_eq!(point, Vec3::new(3.0, 2.0, 2.0));
        assert_eq!(graph.parent(b), Some(a));
        assert_eq!(graph.children(a).collect::<Vec<_>>(), vec![b]);
    }

    #[test]
    fn set_rotation_keeps_translation() {
        let mut graph = SceneGraph::new();
        let node = graph.create_child(graph.root());
        graph.set_transformation(node, Mat4::from_translation(Vec3::new(0.0, 5.0, 0.0)));
        graph.set_rotation(node, Mat3::from_rotation_y(std::f32::consts::FRAC_PI_2));
        let moved = graph.node(node).transformation.transform_point3(Vec3::zero());
        assert!((moved - Vec3::new(0.0, 5.0, 0.0)).mag() < 1e-5);
    }

    #[test]
    #[should_panic]
    fn nodes_from_other_scenes_are_rejected() {
        let mut first = SceneGraph::new();
        let second = SceneGraph::new();
        let foreign = second.root();
        first.create_child(foreign);
    }
}
