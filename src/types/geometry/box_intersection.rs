//! Volume of intersection between an axis-aligned box and a 3D cell.
//!
//! Voxel cells reduce to a clamp-and-multiply. General polyhedra are handled with a
//! Gauss-Green decomposition of the intersection boundary: the sextupled volume is the sum,
//! over every face of the intersection body, of `(p·t)(p·(n×t))(p·n)` evaluated at the
//! perimeter corners with alternating signs along the traversal. The sum splits into the
//! contributions of box corners interior to the cell, cell face perimeters clipped against
//! the box, face traces across box planes, and cell faces piercing box edges, so the
//! clipped boundary polygons never have to be built explicitly.

use log::warn;
use num_traits::Float;

use super::{BoundingBox, Polyhedron, Vec3};

/// Default inflation factor applied to box bounds along directions where a polyhedron
/// vertex lies on a box face. Relative to the box edge length per axis.
pub const DEFAULT_SNAP_TOLERANCE: f64 = 1e-2;

/// Tolerance used to de-duplicate coincident crossing coordinates along a box edge.
const DEDUP_TOLERANCE: f64 = 1e-6;

/// Compute the volume of overlap between a box and an axis-aligned voxel.
///
/// # Arguments
///
/// * `bounds` - The box to intersect against.
/// * `voxel` - The voxel bounds.
///
/// # Returns
///
/// A `(non_zero, volume)` pair. The overlap counts as zero when any clamped edge is
/// below the representable floor for a volume product.
pub fn voxel_box_volume<T: Float>(bounds: &BoundingBox<T>, voxel: &BoundingBox<T>) -> (bool, T) {
    let floor = T::min_positive_value().cbrt();
    let dx = (bounds.max.x.min(voxel.max.x) - bounds.min.x.max(voxel.min.x)).max(T::zero());
    let dy = (bounds.max.y.min(voxel.max.y) - bounds.min.y.max(voxel.min.y)).max(T::zero());
    let dz = (bounds.max.z.min(voxel.max.z) - bounds.min.z.max(voxel.min.z)).max(T::zero());

    if dx <= floor || dy <= floor || dz <= floor {
        (false, T::zero())
    } else {
        (true, dx * dy * dz)
    }
}

/// Compute the volume of overlap between a box and a general polyhedron,
/// using the default snap tolerance.
///
/// # Arguments
///
/// * `bounds` - The box to intersect against.
/// * `polyhedron` - The cell to intersect with.
///
/// # Returns
///
/// A `(non_zero, volume)` pair. A failed sanity check reports a zero overlap.
pub fn polyhedron_box_volume<T: Float>(
    bounds: &BoundingBox<T>,
    polyhedron: &Polyhedron<T>,
) -> (bool, T) {
    polyhedron_box_volume_with_snap(
        bounds,
        polyhedron,
        T::from(DEFAULT_SNAP_TOLERANCE).expect("Failed to convert tolerance to T"),
    )
}

/// Compute the volume of overlap between a box and a general polyhedron.
///
/// The box bounds are first inflated along any direction where a polyhedron vertex lies
/// on a box face, so no vertex is counted as both inside and on the boundary.
///
/// # Arguments
///
/// * `bounds` - The box to intersect against.
/// * `polyhedron` - The cell to intersect with.
/// * `snap` - Relative inflation tolerance for vertices on the box boundary.
///
/// # Returns
///
/// A `(non_zero, volume)` pair. A failed sanity check reports a zero overlap.
pub fn polyhedron_box_volume_with_snap<T: Float>(
    bounds: &BoundingBox<T>,
    polyhedron: &Polyhedron<T>,
    snap: T,
) -> (bool, T) {
    let six = T::from(6.0).expect("Failed to convert number to T");

    let bx = snap_bounds(bounds, polyhedron, snap);
    let box_volume = bx.volume();
    if !polyhedron.bounds().intersects(&bx) {
        return (false, T::zero());
    }

    // Box corners interior to the cell, with the alternating corner parity.
    let mut corner_term = T::zero();
    for (index, corner) in bx.corners().iter().enumerate() {
        if polyhedron.contains(corner) {
            let sign = if CORNER_PARITY[index] { six } else { -six };
            corner_term = corner_term + sign * corner.x * corner.y * corner.z;
        }
    }

    let mut face_term = T::zero();
    let mut ring: Vec<Vec3<T>> = Vec::new();
    for face in 0..polyhedron.n_faces() {
        polyhedron.face_points(face, &mut ring);
        if ring.len() < 3 {
            continue;
        }
        let normal = match face_normal(&ring) {
            Some(normal) => normal,
            None => continue,
        };

        face_term = face_term + face_perimeter_term(&ring, &normal, &bx);
        face_term = face_term + face_trace_term(&ring, &normal, &bx);
    }

    if polyhedron.is_inside_out() {
        face_term = -face_term;
    }

    // Box edge intervals and interior corners only depend on containment, which the
    // winding of the faces does not affect.
    let volume = (face_term + box_edge_term(polyhedron, &bx) + corner_term) / six;
    let slack = T::from(1e-9).expect("Failed to convert number to T");
    if volume.abs() > box_volume * (T::one() + slack) + slack {
        warn!(
            "Computed overlap volume {} exceeds the box volume {}, treating as empty.",
            volume.to_f64().unwrap_or(f64::NAN),
            box_volume.to_f64().unwrap_or(f64::NAN)
        );
        return (false, T::zero());
    }

    let volume = volume.min(box_volume);
    if volume <= T::zero() {
        (false, T::zero())
    } else {
        (true, volume)
    }
}

/// Sign pattern over the corners of [`BoundingBox::corners`], true where the sum of the
/// corner indices is odd.
const CORNER_PARITY: [bool; 8] = [false, true, false, true, true, false, true, false];

/// Inflate the box along any direction where a polyhedron vertex lies on a box face,
/// repeated until no vertex is on the boundary.
fn snap_bounds<T: Float>(
    bounds: &BoundingBox<T>,
    polyhedron: &Polyhedron<T>,
    snap: T,
) -> BoundingBox<T> {
    let mut bx = *bounds;
    let (dx, dy, dz) = bounds.dimensions();
    let tolerances = [snap * dx, snap * dy, snap * dz];

    for _ in 0..8 {
        let mut changed = false;
        for (axis, &tolerance) in tolerances.iter().enumerate() {
            let min = bx.min.component(axis);
            let max = bx.max.component(axis);
            let mut push_min = false;
            let mut push_max = false;
            for point in polyhedron.points() {
                let value = point.component(axis);
                push_min |= (value - min).abs() < tolerance;
                push_max |= (value - max).abs() < tolerance;
            }
            if push_min {
                set_component(&mut bx.min, axis, min - tolerance);
                changed = true;
            }
            if push_max {
                set_component(&mut bx.max, axis, max + tolerance);
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }

    bx
}

#[inline]
fn set_component<T: Float>(point: &mut Vec3<T>, axis: usize, value: T) {
    match axis {
        0 => point.x = value,
        1 => point.y = value,
        _ => point.z = value,
    }
}

/// Corner contribution of a boundary vertex in an orthonormal face frame.
#[inline]
fn frame_term<T: Float>(point: &Vec3<T>, tangent: &Vec3<T>, binormal: &Vec3<T>, normal: &Vec3<T>) -> T {
    point.dot(tangent) * point.dot(binormal) * point.dot(normal)
}

/// Contributions of a face's perimeter edges, clipped against the box.
fn face_perimeter_term<T: Float>(ring: &[Vec3<T>], normal: &Vec3<T>, bx: &BoundingBox<T>) -> T {
    let tolerance = Vec3::default_tolerance();
    let mut term = T::zero();

    for edge in 0..ring.len() {
        let p1 = ring[edge];
        let p2 = ring[(edge + 1) % ring.len()];
        let direction = p2 - p1;
        let length = direction.magnitude();
        if length < tolerance {
            // Duplicate perimeter vertices carry no edge.
            continue;
        }
        let tangent = direction * (T::one() / length);
        let binormal = normal.cross(&tangent);

        if let Some((s0, s1)) = clip_segment_to_box(&p1, &tangent, length, bx) {
            let q0 = p1 + tangent * s0;
            let q1 = p1 + tangent * s1;
            term = term + frame_term(&q0, &tangent, &binormal, normal)
                - frame_term(&q1, &tangent, &binormal, normal);
        }
    }

    term
}

/// Contributions of the segments where a face plane crosses the box planes.
///
/// Each trace segment bounds both the clipped face and a box face piece, and contributes
/// once in the frame of each.
fn face_trace_term<T: Float>(ring: &[Vec3<T>], normal: &Vec3<T>, bx: &BoundingBox<T>) -> T {
    let tolerance = Vec3::default_tolerance();
    let mut term = T::zero();
    let plane_offset = normal.dot(&ring[0]);

    for axis in 0..3 {
        let axis_unit: Vec3<T> = Vec3::unit_axis(axis);
        let line_direction = normal.cross(&axis_unit);
        if line_direction.magnitude() < tolerance {
            // Face parallel to the box plane, perimeter terms cover it.
            continue;
        }
        let direction = line_direction.normalize();

        for side in 0..2 {
            let plane_value = if side == 0 {
                bx.min.component(axis)
            } else {
                bx.max.component(axis)
            };
            let box_normal = if side == 0 { -axis_unit } else { axis_unit };

            let base = match line_base_point(normal, plane_offset, axis, plane_value) {
                Some(base) => base,
                None => continue,
            };

            // Clamp to the box face rectangle along the line.
            let rect = match clip_line_to_rectangle(&base, &direction, axis, bx) {
                Some(rect) => rect,
                None => continue,
            };

            // Portions of the line inside the face polygon.
            let mut crossings = line_polygon_crossings(&base, &direction, ring, normal);
            if crossings.len() < 2 {
                continue;
            }
            crossings.sort_by(|a, b| a.partial_cmp(b).expect("Crossing parameters are finite"));

            for pair in crossings.chunks_exact(2) {
                let lo = pair[0].max(rect.0);
                let hi = pair[1].min(rect.1);
                if hi - lo < tolerance {
                    continue;
                }
                let first = base + direction * lo;
                let second = base + direction * hi;

                // Face side of the trace.
                let in_plane = -box_normal - *normal * (-box_normal).dot(normal);
                if in_plane.magnitude() > tolerance {
                    let toward_box = in_plane.normalize();
                    let tangent = toward_box.cross(normal);
                    let (start, end) = if direction.dot(&tangent) > T::zero() {
                        (first, second)
                    } else {
                        (second, first)
                    };
                    term = term + frame_term(&start, &tangent, &toward_box, normal)
                        - frame_term(&end, &tangent, &toward_box, normal);
                }

                // Box face side of the trace.
                let in_face = -*normal - box_normal * (-*normal).dot(&box_normal);
                if in_face.magnitude() > tolerance {
                    let toward_cell = in_face.normalize();
                    let tangent = toward_cell.cross(&box_normal);
                    let (start, end) = if direction.dot(&tangent) > T::zero() {
                        (first, second)
                    } else {
                        (second, first)
                    };
                    term = term + frame_term(&start, &tangent, &toward_cell, &box_normal)
                        - frame_term(&end, &tangent, &toward_cell, &box_normal);
                }
            }
        }
    }

    term
}

/// Contributions of the box edge portions interior to the cell.
///
/// Crossing coordinates found from separate faces are de-duplicated per edge with a
/// fixed tolerance, so a cell edge shared by two faces pierces a box edge only once.
fn box_edge_term<T: Float>(polyhedron: &Polyhedron<T>, bx: &BoundingBox<T>) -> T {
    let tolerance = Vec3::default_tolerance();
    let dedup = T::from(DEDUP_TOLERANCE).expect("Failed to convert tolerance to T");
    let mut term = T::zero();
    let mut ring: Vec<Vec3<T>> = Vec::new();
    let mut crossings: Vec<T> = Vec::new();

    for axis in 0..3 {
        let axis_unit: Vec3<T> = Vec3::unit_axis(axis);
        let length = bx.max.component(axis) - bx.min.component(axis);
        let other = [(axis + 1) % 3, (axis + 2) % 3];

        for corner in 0..4 {
            let mut origin = bx.min;
            if corner & 1 == 1 {
                set_component(&mut origin, other[0], bx.max.component(other[0]));
            }
            if corner & 2 == 2 {
                set_component(&mut origin, other[1], bx.max.component(other[1]));
            }

            // Collect de-duplicated piercing coordinates along the edge.
            crossings.clear();
            for face in 0..polyhedron.n_faces() {
                polyhedron.face_points(face, &mut ring);
                if ring.len() < 3 {
                    continue;
                }
                let normal = match face_normal(&ring) {
                    Some(normal) => normal,
                    None => continue,
                };
                if normal.component(axis).abs() < tolerance {
                    continue;
                }
                let s = (normal.dot(&ring[0]) - normal.dot(&origin)) / normal.component(axis);
                if s <= dedup || s >= length - dedup {
                    continue;
                }
                let hit = origin + axis_unit * s;
                if !point_in_polygon(&hit, &ring, &normal) {
                    continue;
                }
                if crossings.iter().all(|&existing| (existing - s).abs() > dedup) {
                    crossings.push(s);
                }
            }

            crossings
                .sort_by(|a, b| a.partial_cmp(b).expect("Crossing parameters are finite"));

            // Walk the intervals of the edge interior to the cell.
            let mut inside = polyhedron.contains(&origin);
            let mut previous = T::zero();
            for stop in crossings.iter().copied().chain(std::iter::once(length)) {
                if inside && stop - previous > tolerance {
                    term = term + edge_interval_term(
                        &origin,
                        axis,
                        previous,
                        stop,
                        previous <= dedup,
                        stop >= length - dedup,
                        &other,
                        bx,
                    );
                }
                inside = !inside;
                previous = stop;
            }
        }
    }

    term
}

/// Contribution of one interior interval of a box edge, over the two box faces sharing it.
///
/// Interval ends landing on box corners are excluded, their aggregate is the corner term.
#[allow(clippy::too_many_arguments)]
fn edge_interval_term<T: Float>(
    origin: &Vec3<T>,
    axis: usize,
    lo: T,
    hi: T,
    lo_is_corner: bool,
    hi_is_corner: bool,
    other: &[usize; 2],
    bx: &BoundingBox<T>,
) -> T {
    let axis_unit: Vec3<T> = Vec3::unit_axis(axis);
    let centroid = bx.centroid();
    let mut term = T::zero();

    for &face_axis in other {
        // Outward normal of the box face this edge borders.
        let on_max = (origin.component(face_axis) - bx.max.component(face_axis)).abs()
            < (origin.component(face_axis) - bx.min.component(face_axis)).abs();
        let box_normal = if on_max {
            Vec3::unit_axis(face_axis)
        } else {
            -Vec3::unit_axis(face_axis)
        };

        // In-face direction from the face centre towards this edge.
        let in_face_axis = 3 - axis - face_axis;
        let outward = if origin.component(in_face_axis) > centroid.component(in_face_axis) {
            Vec3::unit_axis(in_face_axis)
        } else {
            -Vec3::unit_axis(in_face_axis)
        };

        let tangent = box_normal.cross(&outward);
        let binormal = box_normal.cross(&tangent);

        let (start, start_is_corner, end, end_is_corner) = if axis_unit.dot(&tangent) > T::zero() {
            (*origin + axis_unit * lo, lo_is_corner, *origin + axis_unit * hi, hi_is_corner)
        } else {
            (*origin + axis_unit * hi, hi_is_corner, *origin + axis_unit * lo, lo_is_corner)
        };

        if !start_is_corner {
            term = term + frame_term(&start, &tangent, &binormal, &box_normal);
        }
        if !end_is_corner {
            term = term - frame_term(&end, &tangent, &binormal, &box_normal);
        }
    }

    term
}

/// Clip a segment, given as origin, unit direction and length, against a box.
///
/// Returns the retained parameter interval, or [`None`] if nothing remains.
fn clip_segment_to_box<T: Float>(
    origin: &Vec3<T>,
    direction: &Vec3<T>,
    length: T,
    bx: &BoundingBox<T>,
) -> Option<(T, T)> {
    let tolerance = Vec3::default_tolerance();
    let mut lo = T::zero();
    let mut hi = length;

    for axis in 0..3 {
        let o = origin.component(axis);
        let d = direction.component(axis);
        let min = bx.min.component(axis);
        let max = bx.max.component(axis);
        if d.abs() < tolerance {
            if o < min || o > max {
                return None;
            }
        } else {
            let t1 = (min - o) / d;
            let t2 = (max - o) / d;
            lo = lo.max(t1.min(t2));
            hi = hi.min(t1.max(t2));
        }
    }

    if hi - lo > tolerance {
        Some((lo, hi))
    } else {
        None
    }
}

/// Find a point on the intersection line of a face plane and an axis-aligned plane.
fn line_base_point<T: Float>(
    normal: &Vec3<T>,
    plane_offset: T,
    axis: usize,
    plane_value: T,
) -> Option<Vec3<T>> {
    let tolerance = Vec3::default_tolerance();
    let a1 = (axis + 1) % 3;
    let a2 = (axis + 2) % 3;
    let rhs = plane_offset - normal.component(axis) * plane_value;

    let mut base = Vec3::origin();
    set_component(&mut base, axis, plane_value);
    if normal.component(a1).abs() >= normal.component(a2).abs() {
        if normal.component(a1).abs() < tolerance {
            return None;
        }
        set_component(&mut base, a1, rhs / normal.component(a1));
    } else {
        set_component(&mut base, a2, rhs / normal.component(a2));
    }

    Some(base)
}

/// Clamp a line to the rectangle of a box face, along the two axes other than `axis`.
fn clip_line_to_rectangle<T: Float>(
    base: &Vec3<T>,
    direction: &Vec3<T>,
    axis: usize,
    bx: &BoundingBox<T>,
) -> Option<(T, T)> {
    let tolerance = Vec3::default_tolerance();
    let mut lo = T::neg_infinity();
    let mut hi = T::infinity();

    for offset in 1..3 {
        let a = (axis + offset) % 3;
        let o = base.component(a);
        let d = direction.component(a);
        let min = bx.min.component(a);
        let max = bx.max.component(a);
        if d.abs() < tolerance {
            if o < min || o > max {
                return None;
            }
        } else {
            let t1 = (min - o) / d;
            let t2 = (max - o) / d;
            lo = lo.max(t1.min(t2));
            hi = hi.min(t1.max(t2));
        }
    }

    if hi > lo {
        Some((lo, hi))
    } else {
        None
    }
}

/// Parameters at which a line crosses the edges of a polygon, in the polygon's plane.
///
/// Edge parameters are taken half-open so a line through a shared polygon vertex is
/// counted once.
fn line_polygon_crossings<T: Float>(
    base: &Vec3<T>,
    direction: &Vec3<T>,
    ring: &[Vec3<T>],
    normal: &Vec3<T>,
) -> Vec<T> {
    let tolerance = Vec3::default_tolerance();
    let (u, v) = projection_axes(normal);
    let base2 = (base.component(u), base.component(v));
    let dir2 = (direction.component(u), direction.component(v));

    let mut crossings = Vec::new();
    for edge in 0..ring.len() {
        let a = ring[edge];
        let b = ring[(edge + 1) % ring.len()];
        let edge2 = (b.component(u) - a.component(u), b.component(v) - a.component(v));
        let det = dir2.0 * edge2.1 - dir2.1 * edge2.0;
        if det.abs() < tolerance {
            continue;
        }
        let delta = (a.component(u) - base2.0, a.component(v) - base2.1);
        let s = (delta.0 * edge2.1 - delta.1 * edge2.0) / det;
        let e = (delta.0 * dir2.1 - delta.1 * dir2.0) / det;
        if e >= T::zero() && e < T::one() {
            crossings.push(s);
        }
    }

    crossings
}

/// Compute the normal of a planar polygon with Newell's method.
///
/// Returns [`None`] for degenerate rings.
pub(crate) fn face_normal<T: Float>(ring: &[Vec3<T>]) -> Option<Vec3<T>> {
    let mut normal: Vec3<T> = Vec3::origin();
    for index in 0..ring.len() {
        let a = ring[index];
        let b = ring[(index + 1) % ring.len()];
        normal.x = normal.x + (a.y - b.y) * (a.z + b.z);
        normal.y = normal.y + (a.z - b.z) * (a.x + b.x);
        normal.z = normal.z + (a.x - b.x) * (a.y + b.y);
    }

    let magnitude = normal.magnitude();
    if magnitude < Vec3::default_tolerance() {
        None
    } else {
        Some(normal * (T::one() / magnitude))
    }
}

/// Even-odd test for a point inside a polygon, in the polygon's plane.
///
/// The polygon is projected along its dominant normal axis, deferring to the other two
/// axes when the plane is degenerate in one of them.
pub(crate) fn point_in_polygon<T: Float>(point: &Vec3<T>, ring: &[Vec3<T>], normal: &Vec3<T>) -> bool {
    let (u, v) = projection_axes(normal);
    let (px, py) = (point.component(u), point.component(v));

    let mut inside = false;
    for edge in 0..ring.len() {
        let a = ring[edge];
        let b = ring[(edge + 1) % ring.len()];
        let (ax, ay) = (a.component(u), a.component(v));
        let (bx, by) = (b.component(u), b.component(v));
        if (ay > py) != (by > py) && px < ax + (py - ay) * (bx - ax) / (by - ay) {
            inside = !inside;
        }
    }

    inside
}

/// The two projection axes spanning the least degenerate view of a plane.
fn projection_axes<T: Float>(normal: &Vec3<T>) -> (usize, usize) {
    let x = normal.x.abs();
    let y = normal.y.abs();
    let z = normal.z.abs();
    if x >= y && x >= z {
        (1, 2)
    } else if y >= z {
        (0, 2)
    } else {
        (0, 1)
    }
}
