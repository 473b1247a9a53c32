//! Closest hit queries through merged [`SceneBuffers`].
//!
//! Walks the buffers exactly as a GPU consumer would: per instance, the ray is moved into mesh
//! space with `world_to_local` and every node or triangle index read from the buffers is biased
//! by the instance's offsets.

use smallvec::SmallVec;

use crate::{FastRayIntersect, GpuInstance, InPlaceRayIntersect, Ray, SceneBuffers};

impl SceneBuffers {
    /// Shorten `ray.distance` to the closest hit over every instance
    pub fn inplace_ray_intersect(&self, ray: &mut Ray) {
        for instance in &self.instances {
            self.inplace_instance_intersect(instance, ray);
        }
    }

    /// Closest hit distance along `ray`, `None` on a miss
    pub fn closest_hit(&self, ray: &Ray) -> Option<f32> {
        let mut ray = *ray;
        let initial = ray.distance;
        self.inplace_ray_intersect(&mut ray);
        (ray.distance < initial).then_some(ray.distance)
    }

    fn inplace_instance_intersect(&self, instance: &GpuInstance, ray: &mut Ray) {
        let mut local_ray = ray.transformed(&instance.world_to_local());
        let node_offset = instance.node_offset as usize;
        let triangle_offset = instance.triangle_offset as usize;

        let mut stack: SmallVec<[u32; 64]> = SmallVec::new();
        stack.push(0);

        while let Some(local_index) = stack.pop() {
            let Some(node) = self.nodes.get(node_offset + local_index as usize) else {
                continue;
            };
            if !node.fast_ray_intersect(&local_ray) {
                continue;
            }

            if node.is_leaf() {
                let first = triangle_offset + node.triangle_offset as usize;
                let last = first + node.triangle_count as usize;
                if let Some(triangles) = self.triangles.get(first..last) {
                    for triangle in triangles {
                        triangle.inplace_ray_intersect(&mut local_ray);
                    }
                }
            } else {
                stack.push(node.child2);
                stack.push(node.child1);
            }
        }

        ray.distance = ray.distance.min(local_ray.distance);
    }
}
