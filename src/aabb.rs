extern crate glam;
use glam::{Mat4, Vec3A};

use crate::Triangle;

/// Axis aligned bounding box.
///
/// A default box is empty (`min = +inf`, `max = -inf`). Growing it by anything turns it into
/// a populated box where `min <= max` holds on every axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min: Vec3A,
    pub max: Vec3A,
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::EMPTY
    }
}

/// Things that know how to enlarge a bounding box so it contains them
pub trait GrowBounds {
    fn grow_bounds(&self, bounds: &mut BoundingBox);
}

impl GrowBounds for Vec3A {
    #[inline]
    fn grow_bounds(&self, bounds: &mut BoundingBox) {
        bounds.min = bounds.min.min(*self);
        bounds.max = bounds.max.max(*self);
    }
}

impl GrowBounds for BoundingBox {
    #[inline]
    fn grow_bounds(&self, bounds: &mut BoundingBox) {
        if self.is_empty() {
            return;
        }
        bounds.min = bounds.min.min(self.min);
        bounds.max = bounds.max.max(self.max);
    }
}

impl GrowBounds for Triangle {
    #[inline]
    fn grow_bounds(&self, bounds: &mut BoundingBox) {
        self.p0.grow_bounds(bounds);
        self.p1.grow_bounds(bounds);
        self.p2.grow_bounds(bounds);
    }
}

impl BoundingBox {
    pub const EMPTY: Self = Self {
        min: Vec3A::INFINITY,
        max: Vec3A::NEG_INFINITY,
    };

    #[inline]
    pub fn new(min: Vec3A, max: Vec3A) -> Self {
        Self { min, max }
    }

    /// Smallest box containing every item, empty if there are none
    pub fn from_items<'a, T, I>(items: I) -> Self
    where
        T: GrowBounds + 'a,
        I: IntoIterator<Item = &'a T>,
    {
        let mut bounds = Self::EMPTY;
        for item in items {
            bounds.grow(item);
        }
        bounds
    }

    /// Grow the box to contain a point, another box or a triangle
    #[inline]
    pub fn grow<T: GrowBounds + ?Sized>(&mut self, item: &T) {
        item.grow_bounds(self);
    }

    /// Grow the box by a pair of corners, as used for precomputed triangle extents
    #[inline]
    pub fn grow_min_max(&mut self, min: Vec3A, max: Vec3A) {
        self.min = self.min.min(min);
        self.max = self.max.max(max);
    }

    /// True while nothing has been added to the box
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.min.cmpgt(self.max).any()
    }

    /// If the box is populated and well formed (min <= max)
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.min.cmple(self.max).all()
    }

    /// Size along each axis. Zero for an empty box.
    #[inline]
    pub fn extent(&self) -> Vec3A {
        if self.is_empty() {
            Vec3A::ZERO
        } else {
            self.max - self.min
        }
    }

    /// Midpoint of the box. Zero for an empty box so split planes stay finite.
    #[inline]
    pub fn center(&self) -> Vec3A {
        if self.is_empty() {
            Vec3A::ZERO
        } else {
            (self.min + self.max) * 0.5
        }
    }

    /// Whether `other` lies completely inside this box. An empty box is inside anything.
    pub fn contains(&self, other: &BoundingBox) -> bool {
        if other.is_empty() {
            return true;
        }
        if self.is_empty() {
            return false;
        }
        self.min.cmple(other.min).all() && self.max.cmpge(other.max).all()
    }

    /// Axis aligned box enclosing this box after an affine transform.
    ///
    /// All eight corners are pushed through the matrix, so the result is the tightest
    /// axis aligned box around the transformed one.
    pub fn transformed(&self, transform: &Mat4) -> BoundingBox {
        if self.is_empty() {
            return Self::EMPTY;
        }

        let mut bounds = Self::EMPTY;
        for i in 0..8 {
            let corner = Vec3A::new(
                if i & 1 != 0 { self.max.x } else { self.min.x },
                if i & 2 != 0 { self.max.y } else { self.min.y },
                if i & 4 != 0 { self.max.z } else { self.min.z },
            );
            bounds.grow(&transform.transform_point3a(corner));
        }
        bounds
    }
}

#[cfg(test)]
mod tests {
    use glam::{Mat4, Vec3, Vec3A};

    use approx::*;

    use crate::*;

    #[test]
    fn default_is_empty() {
        let bounds = BoundingBox::default();
        assert!(bounds.is_empty());
        assert!(!bounds.is_valid());
        assert_eq!(bounds.extent(), Vec3A::ZERO);
        assert_eq!(bounds.center(), Vec3A::ZERO);
    }

    #[test]
    fn single_point_is_not_empty() {
        let mut bounds = BoundingBox::default();
        bounds.grow(&Vec3A::new(1.0, 2.0, 3.0));
        assert!(!bounds.is_empty());
        assert!(bounds.is_valid());
        assert_eq!(bounds.min, bounds.max);
        assert_eq!(bounds.extent(), Vec3A::ZERO);
    }

    #[test]
    fn grow_by_triangle() {
        let tri = Triangle::from_positions(
            Vec3A::new(0.0, 0.0, 0.0),
            Vec3A::new(1.0, 0.0, 0.0),
            Vec3A::new(0.0, 1.0, -2.0),
        );
        let mut bounds = BoundingBox::default();
        bounds.grow(&tri);
        assert_eq!(bounds.min, Vec3A::new(0.0, 0.0, -2.0));
        assert_eq!(bounds.max, Vec3A::new(1.0, 1.0, 0.0));
    }

    #[test]
    fn empty_box_does_not_pollute() {
        let mut bounds = BoundingBox::new(Vec3A::ZERO, Vec3A::ONE);
        bounds.grow(&BoundingBox::EMPTY);
        assert_eq!(bounds, BoundingBox::new(Vec3A::ZERO, Vec3A::ONE));
    }

    #[test]
    fn containment() {
        let outer = BoundingBox::new(Vec3A::splat(-1.0), Vec3A::splat(1.0));
        let inner = BoundingBox::new(Vec3A::splat(-0.5), Vec3A::splat(0.5));
        assert!(outer.contains(&inner));
        assert!(!inner.contains(&outer));
        assert!(outer.contains(&outer));
        assert!(outer.contains(&BoundingBox::EMPTY));
        assert!(!BoundingBox::EMPTY.contains(&inner));
    }

    #[test]
    fn transformed_by_rotation_encloses_corners() {
        let bounds = BoundingBox::new(Vec3A::new(-1.0, -2.0, -3.0), Vec3A::new(1.0, 2.0, 3.0));
        let transform = Mat4::from_rotation_z(std::f32::consts::FRAC_PI_2)
            * Mat4::from_translation(Vec3::new(10.0, 0.0, 0.0));

        let world = bounds.transformed(&transform);

        // translated to (10, 0, 0) then rotated a quarter turn, x and y extents swap
        assert_relative_eq!(world.center(), Vec3A::new(0.0, 10.0, 0.0), epsilon = 1e-5);
        assert_relative_eq!(world.extent(), Vec3A::new(4.0, 2.0, 6.0), epsilon = 1e-5);
    }

    #[test]
    fn transformed_empty_stays_empty() {
        let world = BoundingBox::EMPTY.transformed(&Mat4::from_scale(Vec3::splat(2.0)));
        assert!(world.is_empty());
    }
}
