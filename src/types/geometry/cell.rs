use std::fmt::Debug;

use num_traits::Float;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::box_intersection::{face_normal, point_in_polygon};
use super::{BoundingBox, Vec3};

/// A 3D cell of an input dataset.
///
/// Cells carry the geometry that sample values are associated with. Axis-aligned voxels
/// are kept as a separate variant as their box overlap can be computed with a simple clamp.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone)]
pub enum Cell<T> {
    /// An axis-aligned hexahedral cell.
    Voxel(BoundingBox<T>),
    /// A general cell with planar faces.
    Polyhedron(Polyhedron<T>),
}

impl<T: Float> Cell<T> {
    /// Returns the axis-aligned bounds of the cell.
    pub fn bounds(&self) -> BoundingBox<T> {
        match self {
            Cell::Voxel(bounds) => *bounds,
            Cell::Polyhedron(polyhedron) => polyhedron.bounds(),
        }
    }

    /// Returns the number of points defining the cell.
    pub fn n_points(&self) -> usize {
        match self {
            Cell::Voxel(_) => 8,
            Cell::Polyhedron(polyhedron) => polyhedron.n_points(),
        }
    }

    /// Evaluate whether a position lies inside the cell.
    ///
    /// # Arguments
    ///
    /// * `point` - Position to evaluate.
    pub fn contains(&self, point: &Vec3<T>) -> bool {
        match self {
            Cell::Voxel(bounds) => bounds.contains(point),
            Cell::Polyhedron(polyhedron) => polyhedron.contains(point),
        }
    }
}

/// A cell with planar polygonal faces.
///
/// Faces are stored as index rings into the point list, wound counter-clockwise when seen
/// from outside the cell. Cells whose faces wind the other way should set the inside-out flag.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone)]
pub struct Polyhedron<T> {
    points: Vec<Vec3<T>>,
    faces: Vec<Vec<usize>>,
    inside_out: bool,
}

impl<T: Float> Polyhedron<T> {
    /// Create a new polyhedron from points and face index rings.
    ///
    /// # Arguments
    ///
    /// * `points` - The corner points of the cell.
    /// * `faces` - One index ring per face, wound counter-clockwise seen from outside.
    pub fn new(points: Vec<Vec3<T>>, faces: Vec<Vec<usize>>) -> Self {
        Self {
            points,
            faces,
            inside_out: false,
        }
    }

    /// Create a box-shaped polyhedron covering the given bounds, with outward faces.
    ///
    /// # Arguments
    ///
    /// * `bounds` - The bounds to cover.
    pub fn cuboid(bounds: &BoundingBox<T>) -> Self {
        let corners = bounds.corners();
        Self::new(
            corners.to_vec(),
            vec![
                vec![0, 3, 2, 1],
                vec![4, 5, 6, 7],
                vec![0, 4, 7, 3],
                vec![1, 2, 6, 5],
                vec![0, 1, 5, 4],
                vec![3, 7, 6, 2],
            ],
        )
    }

    /// Create a tetrahedron from four points, with outward faces.
    ///
    /// The points may be passed in any order.
    pub fn tetrahedron(p0: Vec3<T>, p1: Vec3<T>, p2: Vec3<T>, p3: Vec3<T>) -> Self {
        let signed = (p1 - p0).cross(&(p2 - p0)).dot(&(p3 - p0));
        let (a, b) = if signed > T::zero() { (p1, p2) } else { (p2, p1) };
        Self::new(
            vec![p0, a, b, p3],
            vec![vec![0, 2, 1], vec![0, 1, 3], vec![1, 2, 3], vec![2, 0, 3]],
        )
    }

    /// Mark the polyhedron as inside-out, i.e. with faces wound towards the interior.
    pub fn set_inside_out(&mut self, inside_out: bool) {
        self.inside_out = inside_out;
    }

    /// Returns true if the faces wind towards the interior of the cell.
    pub fn is_inside_out(&self) -> bool {
        self.inside_out
    }

    /// Returns the number of corner points.
    pub fn n_points(&self) -> usize {
        self.points.len()
    }

    /// Returns the corner points of the cell.
    pub fn points(&self) -> &[Vec3<T>] {
        &self.points
    }

    /// Returns the number of faces.
    pub fn n_faces(&self) -> usize {
        self.faces.len()
    }

    /// Returns the index ring of a face.
    ///
    /// # Arguments
    ///
    /// * `face` - Index of the face.
    pub fn face(&self, face: usize) -> &[usize] {
        &self.faces[face]
    }

    /// Collect the corner points of a face into a buffer.
    ///
    /// # Arguments
    ///
    /// * `face` - Index of the face.
    /// * `buffer` - Buffer to collect the points into. Cleared before use.
    pub fn face_points(&self, face: usize, buffer: &mut Vec<Vec3<T>>) {
        buffer.clear();
        buffer.extend(self.faces[face].iter().map(|&index| self.points[index]));
    }

    /// Returns the axis-aligned bounds of the cell.
    pub fn bounds(&self) -> BoundingBox<T> {
        let mut min = self.points[0];
        let mut max = self.points[0];
        for point in self.points.iter().skip(1) {
            min = min.min(point);
            max = max.max(point);
        }
        BoundingBox::new(min, max)
    }

    /// Evaluate whether a position lies inside the cell, using a ray parity test.
    ///
    /// # Arguments
    ///
    /// * `point` - Position to evaluate.
    pub fn contains(&self, point: &Vec3<T>) -> bool {
        let tolerance = Vec3::default_tolerance();
        let mut ring = Vec::new();
        let mut crossings = 0;
        for face in 0..self.n_faces() {
            self.face_points(face, &mut ring);
            if ring.len() < 3 {
                continue;
            }
            let normal = match face_normal(&ring) {
                Some(normal) => normal,
                None => continue,
            };
            if normal.x.abs() < tolerance {
                // Plane parallel to the ray, adjacent faces resolve the crossing.
                continue;
            }
            let t = (normal.dot(&ring[0]) - normal.dot(point)) / normal.x;
            if t <= T::zero() {
                continue;
            }
            let hit = *point + Vec3::x_axis() * t;
            if point_in_polygon(&hit, &ring, &normal) {
                crossings += 1;
            }
        }

        crossings % 2 == 1
    }
}
