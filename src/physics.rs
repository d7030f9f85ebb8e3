use std::collections::HashMap;

use asset_common::scene::{CollisionMeshData, MeshPrimitive};

use crate::{
    attributes::{PhysicsManagerAttributes, PhysicsSceneAttributes},
    scene_graph::NodeId,
};

pub const NONE_SIMULATOR: &str = "none";

/// The physics world the loader hands collision geometry to.
pub trait PhysicsManager {
    fn simulator(&self) -> &str;

    fn attributes(&self) -> &PhysicsManagerAttributes;

    /// Prepares the world, objects are later attached below `root`.
    fn init_physics(&mut self, root: Option<NodeId>) -> bool;

    /// Adds the static scene collision geometry. Returns `false` if the scene
    /// was rejected.
    fn add_scene(
        &mut self,
        scene: &PhysicsSceneAttributes,
        mesh_group: &[&CollisionMeshData],
    ) -> bool;
}

/// A static scene as seen by the physics world.
#[derive(Debug, Clone)]
pub struct RigidScene {
    pub attributes: PhysicsSceneAttributes,
    pub triangle_count: usize,
}

/// Kinematic-only world: keeps the scene geometry but never simulates it.
pub struct KinematicPhysicsManager {
    attributes: PhysicsManagerAttributes,
    root: Option<NodeId>,
    initialized: bool,
    scene: Option<RigidScene>,
}

impl KinematicPhysicsManager {
    pub fn new(attributes: PhysicsManagerAttributes) -> Self {
        Self {
            attributes,
            root: None,
            initialized: false,
            scene: None,
        }
    }

    pub fn scene(&self) -> Option<&RigidScene> {
        self.scene.as_ref()
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }
}

impl PhysicsManager for KinematicPhysicsManager {
    fn simulator(&self) -> &str {
        &self.attributes.simulator
    }

    fn attributes(&self) -> &PhysicsManagerAttributes {
        &self.attributes
    }

    fn init_physics(&mut self, root: Option<NodeId>) -> bool {
        self.root = root;
        self.initialized = true;
        true
    }

    fn add_scene(
        &mut self,
        scene: &PhysicsSceneAttributes,
        mesh_group: &[&CollisionMeshData],
    ) -> bool {
        if !self.initialized {
            log::error!("Physics is not initialized, cannot add {}", scene.origin_handle);
            return false;
        }
        if self.scene.is_some() {
            log::error!("Cannot initialize a static scene more than once");
            return false;
        }
        if let Some(mesh) = mesh_group
            .iter()
            .find(|mesh| mesh.primitive != MeshPrimitive::Triangles)
        {
            log::error!(
                "Unsupported collision primitive {:?} in {}",
                mesh.primitive,
                scene.origin_handle
            );
            return false;
        }
        self.scene = Some(RigidScene {
            attributes: scene.clone(),
            triangle_count: mesh_group.iter().map(|m| m.triangle_count()).sum(),
        });
        true
    }
}

pub type PhysicsFactory = Box<dyn Fn(PhysicsManagerAttributes) -> Box<dyn PhysicsManager>>;

/// Physics backends by simulator name.
pub struct PhysicsRegistry {
    factories: HashMap<String, PhysicsFactory>,
}

impl PhysicsRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            factories: HashMap::new(),
        };
        registry.register(NONE_SIMULATOR, |attributes| {
            Box::new(KinematicPhysicsManager::new(attributes))
        });
        registry
    }

    pub fn register(
        &mut self,
        simulator: impl Into<String>,
        factory: impl Fn(PhysicsManagerAttributes) -> Box<dyn PhysicsManager> + 'static,
    ) {
        self.factories.insert(simulator.into(), Box::new(factory));
    }

    pub fn is_registered(&self, simulator: &str) -> bool {
        self.factories.contains_key(simulator)
    }

    /// Instantiates the configured simulator. An unknown simulator falls back
    /// to the kinematic world and `attributes.simulator` is reset to match.
    pub fn build(&self, attributes: &mut PhysicsManagerAttributes) -> Box<dyn PhysicsManager> {
        if let Some(factory) = self.factories.get(&attributes.simulator) {
            return factory(attributes.clone());
        }
        log::warn!(
            "Physics simulator {:?} is not available, objects are restricted to kinematic updates",
            attributes.simulator
        );
        attributes.simulator = NONE_SIMULATOR.to_string();
        match self.factories.get(NONE_SIMULATOR) {
            Some(factory) => factory(attributes.clone()),
            None => Box::new(KinematicPhysicsManager::new(attributes.clone())),
        }
    }
}

impl Default for PhysicsRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use ultraviolet::Vec3;

    use super::*;

    fn triangle() -> CollisionMeshData {
        CollisionMeshData::new(
            vec![Vec3::zero(), Vec3::unit_x(), Vec3::unit_y()],
            vec![0, 1, 2],
        )
    }

    #[test]
    fn unknown_simulator_falls_back_to_none() {
        let mut attributes = PhysicsManagerAttributes::new("config.json");
        attributes.simulator = "bullet".to_string();
        let manager = PhysicsRegistry::new().build(&mut attributes);
        assert_eq!(attributes.simulator, NONE_SIMULATOR);
        assert_eq!(manager.simulator(), NONE_SIMULATOR);
    }

    #[test]
    fn scene_can_only_be_added_once() {
        let mut manager = KinematicPhysicsManager::new(PhysicsManagerAttributes::new("c"));
        let scene = PhysicsSceneAttributes::new("scene.glb");
        let mesh = triangle();
        assert!(!manager.add_scene(&scene, &[&mesh]));
        assert!(manager.init_physics(None));
        assert!(manager.add_scene(&scene, &[&mesh]));
        assert_eq!(manager.scene().map(|s| s.triangle_count), Some(1));
        assert!(!manager.add_scene(&scene, &[&mesh]));
    }

    #[test]
    fn line_meshes_are_rejected() {
        let mut manager = KinematicPhysicsManager::new(PhysicsManagerAttributes::new("c"));
        manager.init_physics(None);
        let mut lines = triangle();
        lines.primitive = MeshPrimitive::Lines;
        assert!(!manager.add_scene(&PhysicsSceneAttributes::new("s"), &[&lines]));
    }
}
