use asset_common::bounds::Aabb;

use crate::{
    mesh::BaseMesh,
    scene_graph::{NodeId, SceneGraph},
};

/// A drawable created during a load whose world space bounds are needed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StaticDrawableInfo {
    pub node: NodeId,
    pub mesh_id: usize,
    pub submesh: Option<usize>,
}

/// Collects static drawables while a scene is instantiated, then computes
/// their absolute bounding boxes once. Lives for a single load.
#[derive(Debug, Default)]
pub struct AbsoluteAabbPass {
    drawables: Vec<StaticDrawableInfo>,
}

impl AbsoluteAabbPass {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, info: StaticDrawableInfo) {
        self.drawables.push(info);
    }

    pub fn len(&self) -> usize {
        self.drawables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.drawables.is_empty()
    }

    /// Stores the world space bounds on every recorded node.
    ///
    /// # Panics
    /// If a recorded node belongs to a different scene graph.
    pub fn run(self, graph: &mut SceneGraph, meshes: &[BaseMesh]) {
        if self.drawables.is_empty() {
            return;
        }
        let scene = graph.id();
        assert!(
            self.drawables.iter().all(|d| d.node.scene() == scene),
            "Static drawables must all belong to scene {:?}",
            scene
        );

        let nodes: Vec<NodeId> = self.drawables.iter().map(|d| d.node).collect();
        let transformations = graph.transformation_matrices(&nodes);
        assert_eq!(transformations.len(), self.drawables.len());

        for (drawable, transformation) in self.drawables.iter().zip(transformations) {
            let Some(mesh) = meshes.get(drawable.mesh_id) else {
                log::error!("Static drawable references unknown mesh {}", drawable.mesh_id);
                continue;
            };
            let positions = mesh.drawable_positions(drawable.submesh);
            graph.node_mut(drawable.node).absolute_aabb =
                Aabb::from_transformed_points(&transformation, positions);
        }
        log::debug!("Computed {} absolute bounding boxes", self.drawables.len());
    }
}
