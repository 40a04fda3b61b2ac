//! Rotation primitives.
//!
//! A rotation never rewires links, there are none. It relabels which entry
//! occupies which slot: the entry lifted into the pivot slot, the pivot entry
//! pushed down to the light side, and the subtrees hanging around them moved
//! to the slots that mirror their new position. When those subtrees are
//! empty, which is the case for a rotation triggered right above a fresh
//! leaf, only three or four slots are rewritten.

use bytemuck::{Pod, Zeroable};

use super::layout::{descendant, left, right, ROOT};
use super::node::{Node, TreeKey};
use super::tree::ImplicitAVLTreeMut;
use crate::error::{AvlError, Result};

/// Entries of a subtree, keyed by their position relative to the subtree root.
type Subtree<K, V> = Vec<(usize, Node<K, V>)>;

/// Rotation applied at the lowest unbalanced ancestor of a new leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rotation {
    /// Single left rotation, for a right-right insertion.
    Left,
    /// Single right rotation, for a left-left insertion.
    Right,
    /// Left rotation of the left child followed by a right rotation.
    LeftRight,
    /// Right rotation of the right child followed by a left rotation.
    RightLeft,
}

impl Rotation {
    /// Selects the rotation for a pivot with the given balance factor.
    ///
    /// `child` is the key of the pivot's child on the insertion path, which
    /// tells on which side of it `inserted` went. Returns `None` when the
    /// pivot is balanced.
    pub fn select<K: Ord>(balance: i32, inserted: &K, child: &K) -> Option<Self> {
        if balance > 1 {
            if inserted < child {
                Some(Rotation::Right)
            } else {
                Some(Rotation::LeftRight)
            }
        } else if balance < -1 {
            if inserted > child {
                Some(Rotation::Left)
            } else {
                Some(Rotation::RightLeft)
            }
        } else {
            None
        }
    }
}

/// Direction of the final rotation step.
#[derive(Clone, Copy)]
enum Direction {
    Left,
    Right,
}

impl Direction {
    /// Child on the heavy side, the one lifted by the rotation.
    #[inline(always)]
    fn near(self, index: usize) -> usize {
        match self {
            Direction::Right => left(index),
            Direction::Left => right(index),
        }
    }

    /// Child on the light side, the one pushed down by the rotation.
    #[inline(always)]
    fn far(self, index: usize) -> usize {
        match self {
            Direction::Right => right(index),
            Direction::Left => left(index),
        }
    }
}

impl<'a, K: TreeKey, V: Default + Copy + Clone + Pod + Zeroable> ImplicitAVLTreeMut<'a, K, V> {
    /// Applies `rotation` at `pivot`.
    ///
    /// Either the rotation completes or the tree is left untouched.
    pub(super) fn apply(&mut self, rotation: Rotation, pivot: usize) -> Result<()> {
        match rotation {
            Rotation::Left => self.rotate(pivot, Direction::Left, false),
            Rotation::Right => self.rotate(pivot, Direction::Right, false),
            Rotation::LeftRight => self.rotate(pivot, Direction::Right, true),
            Rotation::RightLeft => self.rotate(pivot, Direction::Left, true),
        }
    }

    /// Perform an AVL rotation.
    ///
    /// For a single right rotation the left child is lifted into the pivot
    /// slot and the pivot entry moves down into the right slot. A double
    /// rotation lifts the inner grandchild instead, which is what the two
    /// successive single rotations amount to, without the intermediate
    /// layout. Left rotations are the mirror image.
    ///
    /// # Arguments
    ///
    /// * `pivot` - index of the unbalanced node.
    /// * `direction` - direction of the (final) rotation.
    /// * `double` - whether the inner grandchild is lifted.
    fn rotate(&mut self, pivot: usize, direction: Direction, double: bool) -> Result<()> {
        let heavy = direction.near(pivot);
        let light = direction.far(pivot);
        let lifted = if double { direction.far(heavy) } else { heavy };

        let capacity = self.capacity();
        if light >= capacity {
            return Err(AvlError::CapacityExceeded {
                index: light,
                capacity,
            });
        }

        // (source, target)
        let moves = [
            (direction.near(lifted), lifted),
            (direction.far(lifted), direction.near(light)),
            (light, direction.far(light)),
        ];

        let pivot_node = self.nodes[pivot];
        let lifted_node = self.nodes[lifted];
        debug_assert!(!lifted_node.is_empty(), "rotation around an empty slot");

        self.relocate(&moves, lifted)?;

        self.nodes[light] = pivot_node;
        self.nodes[pivot] = lifted_node;

        // moved subtrees keep their heights, only the relabeled slots change
        if double {
            self.update_height(heavy);
        }
        self.update_height(light);
        self.update_height(pivot);

        Ok(())
    }

    /// Moves every subtree from its source slot to its target slot and
    /// empties `vacated`.
    ///
    /// Nothing is written unless all the targets fit within capacity.
    fn relocate(&mut self, moves: &[(usize, usize)], vacated: usize) -> Result<()> {
        let subtrees = moves
            .iter()
            .map(|&(source, target)| (source, target, self.collect_subtree(source)))
            .collect::<Vec<_>>();

        for (_, target, subtree) in &subtrees {
            self.ensure_fits(*target, subtree)?;
        }

        for (source, _, subtree) in &subtrees {
            self.clear_subtree(*source, subtree);
        }
        self.nodes[vacated].clear();

        for (_, target, subtree) in &subtrees {
            self.place_subtree(*target, subtree);
        }

        Ok(())
    }

    /// Collects the occupied slots of the subtree rooted at `root`.
    fn collect_subtree(&self, root: usize) -> Subtree<K, V> {
        let capacity = self.capacity();
        let mut entries = Vec::new();
        let mut pending = vec![(root, ROOT)];

        while let Some((index, local)) = pending.pop() {
            if index >= capacity || self.nodes[index].is_empty() {
                continue;
            }

            entries.push((local, self.nodes[index]));
            pending.push((left(index), left(local)));
            pending.push((right(index), right(local)));
        }

        entries
    }

    /// Marks every slot of `subtree`, rooted at `root`, as empty.
    fn clear_subtree(&mut self, root: usize, subtree: &Subtree<K, V>) {
        for (local, _) in subtree {
            if let Some(index) = descendant(root, *local) {
                self.nodes[index].clear();
            }
        }
    }

    /// Writes `subtree` with its root at `root`.
    ///
    /// `ensure_fits` must have accepted the same arguments.
    fn place_subtree(&mut self, root: usize, subtree: &Subtree<K, V>) {
        for (local, node) in subtree {
            if let Some(index) = descendant(root, *local) {
                self.nodes[index] = *node;
            }
        }
    }

    /// Checks that every entry of `subtree` lands within capacity when rooted
    /// at `root`.
    fn ensure_fits(&self, root: usize, subtree: &Subtree<K, V>) -> Result<()> {
        let capacity = self.capacity();

        for (local, _) in subtree {
            match descendant(root, *local) {
                Some(index) if index < capacity => {}
                index => {
                    return Err(AvlError::CapacityExceeded {
                        index: index.unwrap_or(usize::MAX),
                        capacity,
                    })
                }
            }
        }

        Ok(())
    }
}
