use serde::{Deserialize, Serialize};
use ultraviolet::{Mat4, Vec3};

/// Axis aligned bounding box, `min` and `max` are inclusive.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize, Serialize)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Component-wise min/max of the points. `None` for an empty input.
    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Option<Self> {
        let mut points = points.into_iter();
        let first = points.next()?;
        Some(points.fold(Self::new(first, first), |aabb, point| {
            Self::new(
                aabb.min.min_by_component(point),
                aabb.max.max_by_component(point),
            )
        }))
    }

    /// Bounds of all points after transforming them with `matrix`.
    pub fn from_transformed_points<'a>(
        matrix: &Mat4,
        points: impl IntoIterator<Item = &'a Vec3>,
    ) -> Option<Self> {
        Self::from_points(points.into_iter().map(|p| matrix.transform_point3(*p)))
    }

    pub fn union(&self, other: &Aabb) -> Aabb {
        Self::new(
            self.min.min_by_component(other.min),
            self.max.max_by_component(other.max),
        )
    }

    pub fn translated(&self, translation: Vec3) -> Aabb {
        Self::new(self.min + translation, self.max + translation)
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }
}
