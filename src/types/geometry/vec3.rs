use std::fmt::{self, Debug, Display};
use std::ops;

use num_traits::Float;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Vector or Point with 3 coordinates.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy)]
pub struct Vec3<T> {
    pub x: T,
    pub y: T,
    pub z: T,
}

impl<T> Vec3<T> {
    /// Create a new Vec3 from coordinates.
    /// # Arguments
    ///
    /// * `x` - X coordinate.
    /// * `y` - Y coordinate.
    /// * `z` - Z coordinate.
    pub fn new(x: T, y: T, z: T) -> Self {
        Self { x, y, z }
    }
}

impl<T: Float> Vec3<T> {
    /// Construct a new point at {0,0,0}
    pub fn origin() -> Vec3<T> {
        Self {
            x: T::zero(),
            y: T::zero(),
            z: T::zero(),
        }
    }

    /// Create a unit X-axis.
    pub fn x_axis() -> Vec3<T> {
        Self {
            x: T::one(),
            y: T::zero(),
            z: T::zero(),
        }
    }

    /// Create a unit Y-axis.
    pub fn y_axis() -> Vec3<T> {
        Self {
            x: T::zero(),
            y: T::one(),
            z: T::zero(),
        }
    }

    /// Create a unit Z-axis.
    pub fn z_axis() -> Vec3<T> {
        Self {
            x: T::zero(),
            y: T::zero(),
            z: T::one(),
        }
    }

    /// Create a unit axis from its index, with x at 0, y at 1 and z at 2.
    ///
    /// # Arguments
    /// * `axis` - Index of the axis.
    pub fn unit_axis(axis: usize) -> Vec3<T> {
        match axis {
            0 => Self::x_axis(),
            1 => Self::y_axis(),
            _ => Self::z_axis(),
        }
    }

    /// Return the coordinate at an axis index, with x at 0, y at 1 and z at 2.
    ///
    /// # Arguments
    /// * `axis` - Index of the axis.
    #[inline(always)]
    pub fn component(&self, axis: usize) -> T {
        match axis {
            0 => self.x,
            1 => self.y,
            _ => self.z,
        }
    }

    /// Compute the minium x, y and z coordinates compared to another point.
    ///
    /// # Arguments
    /// * `other` - Other point to compare coordinates to.
    pub fn min(&self, other: &Vec3<T>) -> Vec3<T> {
        Vec3::new(
            self.x.min(other.x),
            self.y.min(other.y),
            self.z.min(other.z),
        )
    }

    /// Compute the maximum x, y and z coordinates compared to another point.
    ///
    /// # Arguments
    /// * `other` - Other point to compare coordinates to.
    #[inline(always)]
    pub fn max(&self, other: &Vec3<T>) -> Vec3<T> {
        Vec3::new(
            self.x.max(other.x),
            self.y.max(other.y),
            self.z.max(other.z),
        )
    }

    /// Compute the euclidian distance to another Vec3.
    ///
    /// # Arguments
    /// * `pt` - Other point to compute distance to.
    #[inline(always)]
    pub fn distance_to_vec3(&self, pt: &Vec3<T>) -> T {
        self.distance_to_vec3_squared(pt).sqrt()
    }

    /// Compute the euclidian squared distance to another Vec3.
    ///
    /// # Arguments
    /// * `pt` - Other point to compute distance to.
    #[inline(always)]
    pub fn distance_to_vec3_squared(&self, pt: &Vec3<T>) -> T {
        (self.x - pt.x).powi(2) + (self.y - pt.y).powi(2) + (self.z - pt.z).powi(2)
    }

    /// Computes the dot product between two Vec3 values.
    ///
    /// (x_1 * x_2) + (y_1 * y_2) + (z_1 * z_2)
    ///
    /// # Arguments
    /// * `rhs` - Vec to compute dot product with.
    #[inline(always)]
    pub fn dot(&self, rhs: &Vec3<T>) -> T {
        (self.x * rhs.x) + (self.y * rhs.y) + (self.z * rhs.z)
    }

    /// Computes the cross product between two Vec3 values.
    /// # Arguments
    ///
    /// * `rhs` - Vec to compute cross product with.
    #[inline(always)]
    pub fn cross(&self, rhs: &Vec3<T>) -> Vec3<T> {
        Self {
            x: self.y * rhs.z - self.z * rhs.y,
            y: self.z * rhs.x - self.x * rhs.z,
            z: self.x * rhs.y - self.y * rhs.x,
        }
    }

    /// Compute the total length of a vector (distance to origin).
    #[inline(always)]
    pub fn magnitude(&self) -> T {
        self.dot(self).sqrt()
    }

    /// Scale the magnitude of a vector with a scalar value.
    /// # Arguments
    ///
    /// * `scalar` - Scale factor.
    #[inline(always)]
    pub fn scale(self, scalar: T) -> Vec3<T> {
        Vec3 {
            x: self.x * scalar,
            y: self.y * scalar,
            z: self.z * scalar,
        }
    }

    /// Normalize the vector, giving it a unit length.
    #[inline(always)]
    pub fn normalize(&self) -> Vec3<T> {
        *self * (T::one() / self.magnitude())
    }

    /// Returns the default spatial tolerance value.
    pub fn default_tolerance() -> T {
        T::from(1E-5).expect("Failed to convert value of tolerance to target type T")
    }
}

impl<T: Float> ops::Add<Vec3<T>> for Vec3<T> {
    type Output = Vec3<T>;
    fn add(self, _rhs: Vec3<T>) -> Vec3<T> {
        Self {
            x: self.x + _rhs.x,
            y: self.y + _rhs.y,
            z: self.z + _rhs.z,
        }
    }
}

impl<T: Float> ops::Sub<Vec3<T>> for Vec3<T> {
    type Output = Vec3<T>;
    fn sub(self, _rhs: Vec3<T>) -> Vec3<T> {
        Self {
            x: self.x - _rhs.x,
            y: self.y - _rhs.y,
            z: self.z - _rhs.z,
        }
    }
}

impl<T: Float> ops::Neg for Vec3<T> {
    type Output = Vec3<T>;
    fn neg(self) -> Vec3<T> {
        Self {
            x: -self.x,
            y: -self.y,
            z: -self.z,
        }
    }
}

impl<T: Float> ops::Mul<T> for Vec3<T> {
    type Output = Vec3<T>;
    fn mul(self, rhs: T) -> Self::Output {
        Self {
            x: self.x * rhs,
            y: self.y * rhs,
            z: self.z * rhs,
        }
    }
}

impl<T: Float> ops::Mul<Vec3<T>> for Vec3<T> {
    type Output = T;
    fn mul(self, rhs: Vec3<T>) -> Self::Output {
        self.dot(&rhs)
    }
}

impl<T: Display> fmt::Display for Vec3<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{{{}, {}, {}}}", self.x, self.y, self.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cross_product_axes() {
        let x: Vec3<f64> = Vec3::x_axis();
        let y = Vec3::y_axis();

        let cross = x.cross(&y);

        assert!(cross.distance_to_vec3(&Vec3::z_axis()) < 1e-12);
    }

    #[test]
    fn test_dot_product_orthogonal() {
        let x: Vec3<f64> = Vec3::x_axis();
        let y = Vec3::y_axis();

        assert!(x.dot(&y).abs() < 1e-12);
        assert!((x.dot(&x) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_component_matches_unit_axis() {
        let v = Vec3::new(1.0, 2.0, 3.0);

        for axis in 0..3 {
            let expected = v.dot(&Vec3::unit_axis(axis));
            assert!(
                (v.component(axis) - expected).abs() < 1e-12,
                "Incorrect component for axis {}",
                axis
            );
        }
    }

    #[test]
    fn test_normalize() {
        let v = Vec3::new(3.0, 4.0, 0.0);

        let unit = v.normalize();

        assert!((unit.magnitude() - 1.0).abs() < 1e-12);
        assert!((unit.x - 0.6).abs() < 1e-12);
        assert!((unit.y - 0.8).abs() < 1e-12);
    }
}
