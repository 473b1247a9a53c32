extern crate glam;
use glam::Vec3A;

use rand::{
    distributions::{Distribution, Standard},
    Rng,
};

/// One triangle of a flat triangle soup: three positions and the matching vertex normals
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    pub p0: Vec3A,
    pub p1: Vec3A,
    pub p2: Vec3A,
    pub n0: Vec3A,
    pub n1: Vec3A,
    pub n2: Vec3A,
}

impl Triangle {
    /// Zeroed Triangle
    pub const ZERO: Self = Triangle {
        p0: Vec3A::ZERO,
        p1: Vec3A::ZERO,
        p2: Vec3A::ZERO,
        n0: Vec3A::ZERO,
        n1: Vec3A::ZERO,
        n2: Vec3A::ZERO,
    };

    #[inline]
    pub fn new(p0: Vec3A, p1: Vec3A, p2: Vec3A, n0: Vec3A, n1: Vec3A, n2: Vec3A) -> Triangle {
        Triangle {
            p0,
            p1,
            p2,
            n0,
            n1,
            n2,
        }
    }

    /// Triangle with every vertex normal set to the face normal
    pub fn from_positions(p0: Vec3A, p1: Vec3A, p2: Vec3A) -> Triangle {
        let normal = (p1 - p0).cross(p2 - p0).normalize_or_zero();
        Triangle::new(p0, p1, p2, normal, normal, normal)
    }

    #[inline]
    pub fn centroid(&self) -> Vec3A {
        (self.p0 + self.p1 + self.p2) / 3.0
    }

    #[inline]
    pub fn min(&self) -> Vec3A {
        self.p0.min(self.p1).min(self.p2)
    }

    #[inline]
    pub fn max(&self) -> Vec3A {
        self.p0.max(self.p1).max(self.p2)
    }
}

impl Default for Triangle {
    fn default() -> Self {
        Self::ZERO
    }
}

impl Distribution<Triangle> for Standard {
    #[inline]
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Triangle {
        Triangle::from_positions(rng.gen(), rng.gen(), rng.gen())
    }
}
