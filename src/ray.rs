use glam::{Mat4, Vec3A};

/// Ray object. Might be a proper ray (distance = infinity) or a line segment (distance is finite)
#[derive(Debug, Clone, Copy)]
pub struct Ray {
    pub origin: Vec3A,
    pub direction: Vec3A,
    pub distance: f32,
}

impl Default for Ray {
    fn default() -> Self {
        Self {
            origin: Vec3A::ZERO,
            direction: Vec3A::X,
            distance: 1.0,
        }
    }
}

impl Ray {
    #[inline]
    pub fn new(origin: Vec3A, direction: Vec3A, distance: f32) -> Self {
        Self {
            origin,
            direction,
            distance,
        }
    }

    /// Create a ray with infinite length (a proper ray)
    #[inline]
    pub fn infinite_ray(origin: Vec3A, direction: Vec3A) -> Self {
        Self::new(origin, direction, f32::INFINITY)
    }

    /// Same ray expressed in another space.
    ///
    /// The direction is not renormalized, so distances along the ray keep their meaning.
    #[inline]
    pub fn transformed(&self, transform: &Mat4) -> Self {
        Self::new(
            transform.transform_point3a(self.origin),
            transform.transform_vector3a(self.direction),
            self.distance,
        )
    }
}
