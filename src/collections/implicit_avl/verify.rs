//! Structural invariant checks.

use bytemuck::{Pod, Zeroable};
use std::cmp::max;

use super::layout::{left, parent, right, ROOT};
use super::node::{height_at, Header, Node, TreeKey};
use crate::error::{AvlError, Result, Violation};

/// Checks occupancy, heights, balance, key order and size of a tree.
///
/// Slots are inspected in index order, so the reported slot is the
/// shallowest offending one.
pub(crate) fn check<K: TreeKey, V: Default + Copy + Clone + Pod + Zeroable>(
    header: &Header,
    nodes: &[Node<K, V>],
) -> Result<()> {
    let capacity = header.capacity();
    let mut counted = 0;

    for index in 0..capacity {
        let node = &nodes[index];

        if node.is_empty() {
            continue;
        }

        counted += 1;

        if let Some(parent) = parent(index) {
            if nodes[parent].is_empty() {
                return Err(violation(index, Violation::Orphaned));
            }
        }

        let left_height = height_at(nodes, capacity, left(index));
        let right_height = height_at(nodes, capacity, right(index));

        let expected = max(left_height, right_height) + 1;
        if node.height() != expected {
            return Err(violation(
                index,
                Violation::HeightMismatch {
                    stored: node.height(),
                    expected,
                },
            ));
        }

        let balance = left_height - right_height;
        if !(-1..=1).contains(&balance) {
            return Err(violation(index, Violation::Unbalanced(balance)));
        }
    }

    if counted != header.size() {
        return Err(violation(
            ROOT,
            Violation::SizeMismatch {
                stored: header.size(),
                counted,
            },
        ));
    }

    check_order(nodes, capacity)
}

/// Every key must lie strictly between the bounds inherited from its
/// ancestors.
fn check_order<K: TreeKey, V: Default + Copy + Clone + Pod + Zeroable>(
    nodes: &[Node<K, V>],
    capacity: usize,
) -> Result<()> {
    let mut pending: Vec<(usize, Option<K>, Option<K>)> = vec![(ROOT, None, None)];

    while let Some((index, lower, upper)) = pending.pop() {
        if index >= capacity || nodes[index].is_empty() {
            continue;
        }

        let key = nodes[index].key;

        if lower.is_some_and(|lower| key <= lower) || upper.is_some_and(|upper| key >= upper) {
            return Err(violation(index, Violation::KeyOrder));
        }

        pending.push((left(index), lower, Some(key)));
        pending.push((right(index), Some(key), upper));
    }

    Ok(())
}

fn violation(index: usize, violation: Violation) -> AvlError {
    AvlError::InvariantViolation { index, violation }
}
