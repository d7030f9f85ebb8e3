use std::{collections::HashMap, f32::consts::PI};

use asset_common::scene::{MeshData, MeshPrimitive};
use ultraviolet::{Vec2, Vec3};

use crate::attributes::{PrimObjType, PrimitiveAttributes};

/// Generates the meshes of the built-in primitive shapes.
///
/// All shapes have unit radius and are centered at the origin, with `y` as
/// the axis of revolution.
#[derive(Default)]
pub struct PrimitiveImporter;

impl PrimitiveImporter {
    pub fn new() -> Self {
        Self
    }

    pub fn mesh(&self, attributes: &PrimitiveAttributes) -> MeshData {
        let segments = attributes.segments.max(3);
        let rings = attributes.rings.max(1);
        let half_length = attributes.half_length;
        let solid = match attributes.prim_obj_type {
            PrimObjType::CubeSolid | PrimObjType::CubeWireframe => MeshData::cube_solid(),
            PrimObjType::UvSphereSolid | PrimObjType::UvSphereWireframe => {
                let rings = attributes.rings.max(2);
                let profile: Vec<(f32, f32)> = (0..=rings)
                    .map(|i| {
                        let theta = PI * i as f32 / rings as f32;
                        (-theta.cos(), theta.sin())
                    })
                    .collect();
                lathe(&profile, segments)
            }
            PrimObjType::CylinderSolid | PrimObjType::CylinderWireframe => {
                let mut profile = Vec::new();
                if attributes.cap_ends {
                    profile.push((-half_length, 0.0));
                }
                for i in 0..=rings {
                    let t = i as f32 / rings as f32;
                    profile.push((-half_length + 2.0 * half_length * t, 1.0));
                }
                if attributes.cap_ends {
                    profile.push((half_length, 0.0));
                }
                lathe(&profile, segments)
            }
            PrimObjType::ConeSolid | PrimObjType::ConeWireframe => {
                let mut profile = Vec::new();
                if attributes.cap_ends {
                    profile.push((-half_length, 0.0));
                }
                for i in 0..=rings {
                    let t = i as f32 / rings as f32;
                    profile.push((-half_length + 2.0 * half_length * t, 1.0 - t));
                }
                lathe(&profile, segments)
            }
            PrimObjType::CapsuleSolid | PrimObjType::CapsuleWireframe => {
                let hemisphere_rings = attributes.hemisphere_rings.max(1);
                let mut profile = Vec::new();
                for i in 0..=hemisphere_rings {
                    let angle = 0.5 * PI * i as f32 / hemisphere_rings as f32;
                    profile.push((-half_length - angle.cos(), angle.sin()));
                }
                for i in 1..rings {
                    let t = i as f32 / rings as f32;
                    profile.push((-half_length + 2.0 * half_length * t, 1.0));
                }
                for i in 0..=hemisphere_rings {
                    let angle = 0.5 * PI * i as f32 / hemisphere_rings as f32;
                    profile.push((half_length + angle.sin(), angle.cos()));
                }
                lathe(&profile, segments)
            }
            PrimObjType::IcosphereSolid | PrimObjType::IcosphereWireframe => {
                icosphere(attributes.subdivisions)
            }
        };

        if attributes.prim_obj_type.is_wireframe() {
            solid.into_wireframe()
        } else {
            solid
        }
    }
}

/// Revolves a `(y, radius)` profile, ordered bottom to top, around the y axis.
fn lathe(profile: &[(f32, f32)], segments: u32) -> MeshData {
    let columns = segments + 1;
    let mut mesh = MeshData::new(MeshPrimitive::Triangles, Vec::new(), Vec::new());
    for (row, &(y, radius)) in profile.iter().enumerate() {
        for column in 0..columns {
            let phi = 2.0 * PI * column as f32 / segments as f32;
            mesh.positions
                .push(Vec3::new(radius * phi.sin(), y, radius * phi.cos()));
            mesh.uvs.push(Vec2::new(
                column as f32 / segments as f32,
                row as f32 / (profile.len() - 1).max(1) as f32,
            ));
        }
    }
    for row in 0..profile.len().saturating_sub(1) as u32 {
        for column in 0..segments {
            let bottom = row * columns + column;
            let top = bottom + columns;
            mesh.indices
                .extend_from_slice(&[bottom, bottom + 1, top + 1, bottom, top + 1, top]);
        }
    }
    mesh.normals = smooth_normals(&mesh.positions, &mesh.indices);
    mesh
}

fn icosphere(subdivisions: u32) -> MeshData {
    let t = (1.0 + 5.0_f32.sqrt()) / 2.0;
    let mut positions: Vec<Vec3> = [
        (-1.0, t, 0.0),
        (1.0, t, 0.0),
        (-1.0, -t, 0.0),
        (1.0, -t, 0.0),
        (0.0, -1.0, t),
        (0.0, 1.0, t),
        (0.0, -1.0, -t),
        (0.0, 1.0, -t),
        (t, 0.0, -1.0),
        (t, 0.0, 1.0),
        (-t, 0.0, -1.0),
        (-t, 0.0, 1.0),
    ]
    .iter()
    .map(|&(x, y, z)| Vec3::new(x, y, z).normalized())
    .collect();
    let mut indices: Vec<u32> = vec![
        0, 11, 5, 0, 5, 1, 0, 1, 7, 0, 7, 10, 0, 10, 11, //
        1, 5, 9, 5, 11, 4, 11, 10, 2, 10, 7, 6, 7, 1, 8, //
        3, 9, 4, 3, 4, 2, 3, 2, 6, 3, 6, 8, 3, 8, 9, //
        4, 9, 5, 2, 4, 11, 6, 2, 10, 8, 6, 7, 9, 8, 1,
    ];

    for _ in 0..subdivisions {
        let mut midpoints: HashMap<(u32, u32), u32> = HashMap::new();
        let mut midpoint = |a: u32, b: u32, positions: &mut Vec<Vec3>| -> u32 {
            *midpoints.entry((a.min(b), a.max(b))).or_insert_with(|| {
                let middle = (positions[a as usize] + positions[b as usize]).normalized();
                positions.push(middle);
                positions.len() as u32 - 1
            })
        };
        let mut subdivided = Vec::with_capacity(indices.len() * 4);
        for triangle in indices.chunks_exact(3) {
            let (a, b, c) = (triangle[0], triangle[1], triangle[2]);
            let ab = midpoint(a, b, &mut positions);
            let bc = midpoint(b, c, &mut positions);
            let ca = midpoint(c, a, &mut positions);
            subdivided.extend_from_slice(&[a, ab, ca, b, bc, ab, c, ca, bc, ab, bc, ca]);
        }
        indices = subdivided;
    }

    let mut mesh = MeshData::new(MeshPrimitive::Triangles, positions, indices);
    // points on the unit sphere are their own normals
    mesh.normals = mesh.positions.clone();
    mesh
}

fn smooth_normals(positions: &[Vec3], indices: &[u32]) -> Vec<Vec3> {
    let mut normals = vec![Vec3::zero(); positions.len()];
    for triangle in indices.chunks_exact(3) {
        let [a, b, c] = [triangle[0], triangle[1], triangle[2]].map(|i| i as usize);
        let face = (positions[b] - positions[a]).cross(positions[c] - positions[a]);
        normals[a] += face;
        normals[b] += face;
        normals[c] += face;
    }
    normals
        .into_iter()
        .zip(positions)
        .map(|(normal, position)| {
            if normal.mag_sq() > f32::EPSILON {
                normal.normalized()
            } else if position.mag_sq() > f32::EPSILON {
                position.normalized()
            } else {
                Vec3::unit_y()
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn in_bounds(mesh: &MeshData) -> bool {
        mesh.indices
            .iter()
            .all(|&i| (i as usize) < mesh.vertex_count())
    }

    #[test]
    fn every_class_generates_a_valid_mesh() {
        let importer = PrimitiveImporter::new();
        for ty in PrimObjType::ALL {
            let mesh = importer.mesh(&PrimitiveAttributes::new(ty));
            assert!(mesh.vertex_count() > 0, "{}", ty);
            assert!(!mesh.indices.is_empty(), "{}", ty);
            assert!(in_bounds(&mesh), "{}", ty);
            let expected = if ty.is_wireframe() {
                MeshPrimitive::Lines
            } else {
                MeshPrimitive::Triangles
            };
            assert_eq!(mesh.primitive, expected, "{}", ty);
        }
    }

    #[test]
    fn icosphere_subdivision_quadruples_faces() {
        assert_eq!(icosphere(0).indices.len() / 3, 20);
        assert_eq!(icosphere(1).indices.len() / 3, 80);
        assert_eq!(icosphere(1).vertex_count(), 42);
    }

    #[test]
    fn sphere_points_lie_on_the_unit_sphere() {
        let mesh = PrimitiveImporter::new()
            .mesh(&PrimitiveAttributes::new(PrimObjType::UvSphereSolid));
        assert!(mesh
            .positions
            .iter()
            .all(|p| (p.mag() - 1.0).abs() < 1e-4));
    }

    #[test]
    fn capsule_extends_past_its_half_length() {
        let attributes = PrimitiveAttributes::new(PrimObjType::CapsuleSolid);
        let mesh = PrimitiveImporter::new().mesh(&attributes);
        let top = mesh.positions.iter().map(|p| p.y).fold(f32::MIN, f32::max);
        assert!((top - (attributes.half_length + 1.0)).abs() < 1e-4);
    }
}
