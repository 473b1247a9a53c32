extern crate glam;

use std::ops::{Index, IndexMut};

use strum::{Display, EnumIter};

/// 3D Axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, Display)]
#[repr(u8)]
pub enum Axis {
    X = 0,
    Y = 1,
    Z = 2,
}

impl Axis {
    /// Axis with the largest extent.
    ///
    /// Comparisons are strict, so X only wins when it is larger than both others and a tie
    /// between Y and Z goes to Z.
    #[inline]
    pub fn longest(extent: glam::Vec3A) -> Axis {
        if extent.x > extent.y.max(extent.z) {
            Axis::X
        } else if extent.y > extent.z {
            Axis::Y
        } else {
            Axis::Z
        }
    }
}

impl Index<Axis> for glam::Vec3A {
    type Output = f32;

    fn index(&self, axis: Axis) -> &Self::Output {
        match axis {
            Axis::X => &self.x,
            Axis::Y => &self.y,
            Axis::Z => &self.z,
        }
    }
}

impl IndexMut<Axis> for glam::Vec3A {
    fn index_mut(&mut self, axis: Axis) -> &mut Self::Output {
        match axis {
            Axis::X => &mut self.x,
            Axis::Y => &mut self.y,
            Axis::Z => &mut self.z,
        }
    }
}
