use std::fmt;

/// The procedurally generated shapes, each as a solid and a wireframe variant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PrimObjType {
    CapsuleSolid,
    CapsuleWireframe,
    ConeSolid,
    ConeWireframe,
    CubeSolid,
    CubeWireframe,
    CylinderSolid,
    CylinderWireframe,
    IcosphereSolid,
    IcosphereWireframe,
    UvSphereSolid,
    UvSphereWireframe,
}

impl PrimObjType {
    pub const ALL: [PrimObjType; 12] = [
        PrimObjType::CapsuleSolid,
        PrimObjType::CapsuleWireframe,
        PrimObjType::ConeSolid,
        PrimObjType::ConeWireframe,
        PrimObjType::CubeSolid,
        PrimObjType::CubeWireframe,
        PrimObjType::CylinderSolid,
        PrimObjType::CylinderWireframe,
        PrimObjType::IcosphereSolid,
        PrimObjType::IcosphereWireframe,
        PrimObjType::UvSphereSolid,
        PrimObjType::UvSphereWireframe,
    ];

    pub fn class_name(&self) -> &'static str {
        match self {
            PrimObjType::CapsuleSolid => "capsule3DSolid",
            PrimObjType::CapsuleWireframe => "capsule3DWireframe",
            PrimObjType::ConeSolid => "coneSolid",
            PrimObjType::ConeWireframe => "coneWireframe",
            PrimObjType::CubeSolid => "cubeSolid",
            PrimObjType::CubeWireframe => "cubeWireframe",
            PrimObjType::CylinderSolid => "cylinderSolid",
            PrimObjType::CylinderWireframe => "cylinderWireframe",
            PrimObjType::IcosphereSolid => "icosphereSolid",
            PrimObjType::IcosphereWireframe => "icosphereWireframe",
            PrimObjType::UvSphereSolid => "uvSphereSolid",
            PrimObjType::UvSphereWireframe => "uvSphereWireframe",
        }
    }

    pub fn from_class_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|ty| ty.class_name() == name)
    }

    pub fn is_wireframe(&self) -> bool {
        matches!(
            self,
            PrimObjType::CapsuleWireframe
                | PrimObjType::ConeWireframe
                | PrimObjType::CubeWireframe
                | PrimObjType::CylinderWireframe
                | PrimObjType::IcosphereWireframe
                | PrimObjType::UvSphereWireframe
        )
    }
}

impl fmt::Display for PrimObjType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.class_name())
    }
}

/// Shape parameters of a primitive asset. Only the parameters relevant for
/// the shape are used, cubes have none.
#[derive(Clone, Debug, PartialEq)]
pub struct PrimitiveAttributes {
    pub handle: String,
    pub prim_obj_type: PrimObjType,
    /// Rings of a capsule's hemispheres.
    pub hemisphere_rings: u32,
    /// Rings along the body of capsules, cones, cylinders and spheres.
    pub rings: u32,
    pub segments: u32,
    pub half_length: f32,
    pub cap_ends: bool,
    pub subdivisions: u32,
}

impl PrimitiveAttributes {
    /// Default parameters, keyed by the class name.
    pub fn new(prim_obj_type: PrimObjType) -> Self {
        let (rings, segments, half_length) = match prim_obj_type {
            PrimObjType::CapsuleSolid | PrimObjType::CapsuleWireframe => (1, 12, 0.75),
            PrimObjType::ConeSolid | PrimObjType::ConeWireframe => (1, 12, 1.25),
            PrimObjType::CylinderSolid | PrimObjType::CylinderWireframe => (1, 12, 1.0),
            PrimObjType::UvSphereSolid | PrimObjType::UvSphereWireframe => (8, 16, 0.0),
            _ => (0, 0, 0.0),
        };
        Self {
            handle: prim_obj_type.class_name().to_string(),
            prim_obj_type,
            hemisphere_rings: 4,
            rings,
            segments,
            half_length,
            cap_ends: true,
            subdivisions: 1,
        }
    }

    pub fn with_handle(mut self, handle: impl Into<String>) -> Self {
        self.handle = handle.into();
        self
    }

    pub fn class_name(&self) -> &'static str {
        self.prim_obj_type.class_name()
    }
}
