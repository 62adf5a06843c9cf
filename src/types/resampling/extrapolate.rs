use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::fmt::Debug;
use std::time::Instant;

use log::info;

use crate::utils::math_helper::{format_integer, tree_index1d};

use super::hyper_tree_grid::HyperTreeGrid;
use super::GridFloat;

/// A gap leaf waiting for its pending neighbors, ordered by the number of neighbors with
/// defined values.
#[derive(Debug)]
struct GapElement<T> {
    node: usize,
    key: i64,
    sum: T,
    display_sum: T,
    pending: Vec<usize>,
}

impl<T> PartialEq for GapElement<T> {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl<T> Eq for GapElement<T> {}

impl<T> PartialOrd for GapElement<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for GapElement<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key.cmp(&other.key)
    }
}

/// Fill the value-less leaves of the grid by averaging their Von Neumann neighbors.
///
/// Leaves whose axial neighbors all carry values are written directly. The remaining gaps
/// drain through a priority queue, best-connected first. Every element popped at the same
/// priority is averaged against the same snapshot of the grid before any of them is
/// written back, so the fill is stable layer by layer regardless of pop order.
pub(crate) fn extrapolate<T: GridFloat>(grid: &mut HyperTreeGrid<T>) {
    let before = Instant::now();
    let cells = grid.cell_dimensions();
    let mut queue: BinaryHeap<GapElement<T>> = BinaryHeap::new();

    for i in 0..cells[0] {
        for j in 0..cells[1] {
            for k in 0..cells[2] {
                let tree = tree_index1d(i, j, k, cells[1], cells[2]);
                if let Some(root) = grid.root(tree) {
                    populate(grid, &mut queue, root);
                }
            }
        }
    }

    let queued = queue.len();
    let mut buffer: Vec<GapElement<T>> = Vec::new();
    while let Some(mut element) = queue.pop() {
        let key = element.key;
        let mut remaining = 0;
        for index in 0..element.pending.len() {
            let value = grid.measure(element.pending[index]);
            if value == value {
                element.sum = element.sum + value;
                element.display_sum =
                    element.display_sum + grid.display_measure(element.pending[index]);
            } else {
                remaining += 1;
            }
        }
        element.key = key + (element.pending.len() - remaining) as i64;
        buffer.push(element);

        // Write out a priority layer only once the next key class begins.
        if queue.peek().map_or(true, |next| next.key != key) {
            for element in buffer.drain(..) {
                if element.key > 0 {
                    let count = T::from(element.key).expect("Failed to convert number to T");
                    grid.set_measures(
                        element.node,
                        element.sum / count,
                        element.display_sum / count,
                    );
                }
            }
        }
    }

    info!(
        "Extrapolated {} queued gap leaves in {:.2?}",
        format_integer(queued),
        before.elapsed()
    );
}

/// Recursive population pass over one tree.
///
/// Leaves without a value collect their axial neighbors. Gaps surrounded by defined
/// values only are written immediately, the rest are queued with the count of their
/// defined neighbors as priority.
fn populate<T: GridFloat>(
    grid: &mut HyperTreeGrid<T>,
    queue: &mut BinaryHeap<GapElement<T>>,
    node: usize,
) {
    let value = grid.measure(node);
    if value != value {
        let mut sum = T::zero();
        let mut display_sum = T::zero();
        let mut valid = 0i64;
        let mut pending = Vec::new();

        for neighbor in grid.von_neumann_neighbors(node).into_iter().flatten() {
            let neighbor_value = grid.measure(neighbor);
            if neighbor_value == neighbor_value {
                valid += 1;
                sum = sum + neighbor_value;
                display_sum = display_sum + grid.display_measure(neighbor);
            } else {
                pending.push(neighbor);
            }
        }

        if pending.is_empty() {
            if valid > 0 {
                let count = T::from(valid).expect("Failed to convert number to T");
                grid.set_measures(node, sum / count, display_sum / count);
            }
        } else {
            queue.push(GapElement {
                node,
                key: valid,
                sum,
                display_sum,
                pending,
            });
        }
        return;
    }

    if let Some(first) = grid.first_child(node) {
        for child in first..first + grid.n_children() {
            populate(grid, queue, child);
        }
    }
}
