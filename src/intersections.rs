use glam::Vec3A;

use crate::{BoundingBox, GpuBvhNode, GpuTriangle, Ray, Triangle};

/// Objects capable of being intersected by a ray in place
pub trait InPlaceRayIntersect {
    fn inplace_ray_intersect(&self, ray: &mut Ray);
}

/// Objects a ray can be tested against without computing the hit distance
pub trait FastRayIntersect {
    fn fast_ray_intersect(&self, ray: &Ray) -> bool;
}

/// Epsilon used for ray intersections
pub const RAY_INTERSECT_EPSILON: f32 = 0.0001;

/// Intersect a triangle with a ray, then store the intersection result in the ray
pub fn inplace_ray_triangle_intersect(p0: Vec3A, p1: Vec3A, p2: Vec3A, ray: &mut Ray) {
    let edge1 = p1 - p0;
    let edge2 = p2 - p0;
    let h = ray.direction.cross(edge2);
    let a = edge1.dot(h);
    if a > -RAY_INTERSECT_EPSILON && a < RAY_INTERSECT_EPSILON {
        // ray parallel to triangle
        return;
    }
    let f = 1.0 / a;
    let s = ray.origin - p0;
    let u = f * s.dot(h);
    if !(0.0..=1.0).contains(&u) {
        return;
    }
    let q = s.cross(edge1);
    let v = f * ray.direction.dot(q);
    if v < 0.0 || u + v > 1.0 {
        return;
    }
    let t = f * edge2.dot(q);
    if t > RAY_INTERSECT_EPSILON {
        ray.distance = ray.distance.min(t);
    }
}

/// Slab test against the box, limited to `[0, ray.distance]`.
///
/// Near and far planes are picked by the sign of the direction, so an inverted (empty) box is
/// never entered.
pub fn ray_box_intersect(min: Vec3A, max: Vec3A, ray: &Ray) -> bool {
    let inv_direction = ray.direction.recip();
    let t_min = (min - ray.origin) * inv_direction;
    let t_max = (max - ray.origin) * inv_direction;

    let negative = inv_direction.cmplt(Vec3A::ZERO);
    let t_near = Vec3A::select(negative, t_max, t_min);
    let t_far = Vec3A::select(negative, t_min, t_max);

    let enter = t_near.max_element().max(0.0);
    let exit = t_far.min_element().min(ray.distance);
    enter <= exit
}

impl InPlaceRayIntersect for Triangle {
    #[inline]
    fn inplace_ray_intersect(&self, ray: &mut Ray) {
        inplace_ray_triangle_intersect(self.p0, self.p1, self.p2, ray);
    }
}

impl InPlaceRayIntersect for GpuTriangle {
    #[inline]
    fn inplace_ray_intersect(&self, ray: &mut Ray) {
        inplace_ray_triangle_intersect(
            Vec3A::from_array(self.p0),
            Vec3A::from_array(self.p1),
            Vec3A::from_array(self.p2),
            ray,
        );
    }
}

impl FastRayIntersect for BoundingBox {
    #[inline]
    fn fast_ray_intersect(&self, ray: &Ray) -> bool {
        ray_box_intersect(self.min, self.max, ray)
    }
}

impl FastRayIntersect for GpuBvhNode {
    #[inline]
    fn fast_ray_intersect(&self, ray: &Ray) -> bool {
        ray_box_intersect(
            Vec3A::from_array(self.box_min),
            Vec3A::from_array(self.box_max),
            ray,
        )
    }
}
