/// Pack a local (i, j, k) coordinate inside a tree into a linear index.
///
/// The resolution `r` is the number of subdivisions per axis at the current depth,
/// and the packing is `k + j * r + i * r * r`.
#[inline]
pub(crate) fn local_index1d(i: usize, j: usize, k: usize, r: usize) -> usize {
    debug_assert!(i < r && j < r && k < r, "Coordinates out of bounds");
    k + (j * r) + (i * r * r)
}

/// Unpack a linear local index back into (i, j, k) coordinates for a resolution `r`.
#[inline]
pub(crate) fn local_index3d(index: usize, r: usize) -> (usize, usize, usize) {
    debug_assert!(index < r * r * r, "Index out of bounds");
    let i = index / (r * r);
    let temp = index - (i * r * r);
    let j = temp / r;
    let k = temp % r;

    (i, j, k)
}

/// Pack a coarse lattice coordinate into a tree index.
///
/// The packing is `k + j * num_z + i * num_y * num_z`.
#[inline]
pub(crate) fn tree_index1d(i: usize, j: usize, k: usize, num_y: usize, num_z: usize) -> usize {
    k + (j * num_z) + (i * num_y * num_z)
}

/// Unpack a tree index back into its coarse lattice coordinate.
#[inline]
pub(crate) fn tree_index3d(index: usize, num_y: usize, num_z: usize) -> (usize, usize, usize) {
    let i = index / (num_y * num_z);
    let temp = index - (i * num_y * num_z);
    let j = temp / num_z;
    let k = temp % num_z;

    (i, j, k)
}

#[inline]
pub(crate) fn format_integer(n: usize) -> String {
    let mut s = n.to_string();
    let len = s.len();
    for i in (1..len).rev() {
        if (len - i) % 3 == 0 {
            s.insert(i, ',');
        }
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_index_round_trip() {
        let r = 5;
        for i in 0..r {
            for j in 0..r {
                for k in 0..r {
                    let index = local_index1d(i, j, k, r);
                    assert_eq!((i, j, k), local_index3d(index, r));
                }
            }
        }
    }

    #[test]
    fn test_tree_index_round_trip() {
        let (num_y, num_z) = (3, 4);
        for i in 0..2 {
            for j in 0..num_y {
                for k in 0..num_z {
                    let index = tree_index1d(i, j, k, num_y, num_z);
                    assert_eq!((i, j, k), tree_index3d(index, num_y, num_z));
                }
            }
        }
    }

    #[test]
    fn test_format_integer() {
        assert_eq!(format_integer(1), "1");
        assert_eq!(format_integer(1234), "1,234");
        assert_eq!(format_integer(1234567), "1,234,567");
    }
}
