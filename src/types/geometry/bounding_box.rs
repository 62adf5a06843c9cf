use std::fmt::Debug;

use num_traits::Float;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::Vec3;

/// An axis-aligned bounding box.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy)]
pub struct BoundingBox<T> {
    // Minimum coordinate of the box
    pub min: Vec3<T>,
    // Maximum coordinate of the box
    pub max: Vec3<T>,
}

impl<T> BoundingBox<T> {
    /// Create a new BoundingBox from a min and max coordinate.
    ///
    /// # Arguments
    ///
    /// * `min` - The minimum coordinate of the Box.
    /// * `max` - The maximum coordinate of the Box.
    pub fn new(min: Vec3<T>, max: Vec3<T>) -> Self {
        Self { min, max }
    }
}

impl<T: Float> BoundingBox<T> {
    /// Create a new BoundingBox with zero size at the origin.
    pub fn zero() -> Self {
        Self {
            min: Vec3::origin(),
            max: Vec3::origin(),
        }
    }

    /// Create a union box containing this box and another.
    ///
    /// # Arguments
    ///
    /// * `other` - Other box to include.
    pub fn union(&self, other: &BoundingBox<T>) -> BoundingBox<T> {
        Self {
            min: self.min.min(&other.min),
            max: self.max.max(&other.max),
        }
    }

    /// Return the size of the box in x, y and z
    ///
    /// # Returns
    ///
    /// * `(x_size, y_size, z_size)` - A tuple with the size in x, y and z.
    pub fn dimensions(&self) -> (T, T, T) {
        (
            self.max.x - self.min.x,
            self.max.y - self.min.y,
            self.max.z - self.min.z,
        )
    }

    /// Return the volume enclosed by the box.
    pub fn volume(&self) -> T {
        let (dx, dy, dz) = self.dimensions();
        dx * dy * dz
    }

    /// Checks if the box contains a point
    ///
    /// # Arguments
    ///
    /// * `point` - Point for contains check.
    pub fn contains(&self, point: &Vec3<T>) -> bool {
        point.x >= self.min.x
            && point.y >= self.min.y
            && point.z >= self.min.z
            && point.x <= self.max.x
            && point.y <= self.max.y
            && point.z <= self.max.z
    }

    /// Checks if the box strictly contains a point, excluding the boundary.
    ///
    /// # Arguments
    ///
    /// * `point` - Point for contains check.
    pub fn contains_strict(&self, point: &Vec3<T>) -> bool {
        point.x > self.min.x
            && point.y > self.min.y
            && point.z > self.min.z
            && point.x < self.max.x
            && point.y < self.max.y
            && point.z < self.max.z
    }

    /// Returns the 8 corners of the box as 3d points.
    ///
    /// ```text
    ///      4 -------- 7       Z
    ///     /|         /|       |
    ///    / |        / |       + -- Y
    ///   5 -------- 6  |      /
    ///   |  |       |  |     X
    ///   |  0 ------|-- 3
    ///   | /        | /
    ///   |/         |/
    ///   1 -------- 2
    /// ```
    ///
    pub fn corners(&self) -> [Vec3<T>; 8] {
        let delta = self.max - self.min;
        [
            self.min,
            self.min + Vec3::new(delta.x, T::zero(), T::zero()),
            self.min + Vec3::new(delta.x, delta.y, T::zero()),
            self.min + Vec3::new(T::zero(), delta.y, T::zero()),
            self.min + Vec3::new(T::zero(), T::zero(), delta.z),
            self.min + Vec3::new(delta.x, T::zero(), delta.z),
            self.max,
            self.min + Vec3::new(T::zero(), delta.y, delta.z),
        ]
    }

    /// Returns the centre of the box.
    pub fn centroid(&self) -> Vec3<T> {
        (self.max + self.min) * T::from(0.5).expect("Failed to convert number to T")
    }

    /// Checks if the box intersects another box.
    ///
    /// # Arguments
    ///
    /// * `other` - Other box to check for.
    pub fn intersects(&self, other: &BoundingBox<T>) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
            && self.min.z <= other.max.z
            && self.max.z >= other.min.z
    }

    /// Compute the overlap between this box and another box.
    ///
    /// # Arguments
    ///
    /// * `other` - Other box to clamp against.
    ///
    /// # Returns
    ///
    /// * The overlapping box, or [`None`] if the boxes are disjoint.
    pub fn intersection(&self, other: &BoundingBox<T>) -> Option<BoundingBox<T>> {
        if !self.intersects(other) {
            return None;
        }
        Some(Self {
            min: self.min.max(&other.min),
            max: self.max.min(&other.max),
        })
    }

    /// Offset the box equally in all directions.
    ///
    /// # Arguments
    ///
    /// * `distance` - Offset distance.
    pub fn offset(&self, distance: T) -> BoundingBox<T> {
        let offset_vec = Vec3::new(distance, distance, distance);
        Self {
            min: self.min - offset_vec,
            max: self.max + offset_vec,
        }
    }
}

#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn test_compute_corners() {
        let bounds = BoundingBox::new(Vec3::origin(), Vec3::new(1.0, 1.0, 1.0));

        let corners = bounds.corners();

        assert!(corners[0].distance_to_vec3(&Vec3::new(0.0, 0.0, 0.0)) < 0.001);
        assert!(corners[1].distance_to_vec3(&Vec3::new(1.0, 0.0, 0.0)) < 0.001);
        assert!(corners[2].distance_to_vec3(&Vec3::new(1.0, 1.0, 0.0)) < 0.001);
        assert!(corners[3].distance_to_vec3(&Vec3::new(0.0, 1.0, 0.0)) < 0.001);
        assert!(corners[4].distance_to_vec3(&Vec3::new(0.0, 0.0, 1.0)) < 0.001);
        assert!(corners[5].distance_to_vec3(&Vec3::new(1.0, 0.0, 1.0)) < 0.001);
        assert!(corners[6].distance_to_vec3(&Vec3::new(1.0, 1.0, 1.0)) < 0.001);
        assert!(corners[7].distance_to_vec3(&Vec3::new(0.0, 1.0, 1.0)) < 0.001);
    }

    #[test]
    fn test_volume() {
        let bounds = BoundingBox::new(Vec3::origin(), Vec3::new(2.0, 3.0, 4.0));

        assert!((bounds.volume() - 24.0).abs() < 1e-12);
    }

    #[test]
    fn test_intersection_overlapping() {
        let first = BoundingBox::new(Vec3::origin(), Vec3::new(1.0, 1.0, 1.0));
        let second = BoundingBox::new(Vec3::new(0.5, 0.5, 0.5), Vec3::new(2.0, 2.0, 2.0));

        let overlap = first.intersection(&second).unwrap();

        assert!((overlap.volume() - 0.125).abs() < 1e-12);
        assert!(overlap.min.distance_to_vec3(&Vec3::new(0.5, 0.5, 0.5)) < 1e-12);
        assert!(overlap.max.distance_to_vec3(&Vec3::new(1.0, 1.0, 1.0)) < 1e-12);
    }

    #[test]
    fn test_intersection_disjoint() {
        let first = BoundingBox::new(Vec3::origin(), Vec3::new(1.0, 1.0, 1.0));
        let second = BoundingBox::new(Vec3::new(2.0, 2.0, 2.0), Vec3::new(3.0, 3.0, 3.0));

        assert!(first.intersection(&second).is_none());
    }

    #[test]
    fn test_contains_strict_excludes_boundary() {
        let bounds = BoundingBox::new(Vec3::origin(), Vec3::new(1.0, 1.0, 1.0));

        assert!(bounds.contains(&Vec3::new(1.0, 0.5, 0.5)));
        assert!(!bounds.contains_strict(&Vec3::new(1.0, 0.5, 0.5)));
        assert!(bounds.contains_strict(&Vec3::new(0.5, 0.5, 0.5)));
    }
}
