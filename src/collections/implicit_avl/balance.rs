use bytemuck::{Pod, Zeroable};
use std::cmp::max;

use super::layout::{left, right};
use super::node::{height_at, TreeKey};
use super::rotation::Rotation;
use super::tree::ImplicitAVLTreeMut;
use crate::error::Result;

impl<'a, K: TreeKey, V: Default + Copy + Clone + Pod + Zeroable> ImplicitAVLTreeMut<'a, K, V> {
    /// Rebalances the tree after a new leaf was placed at the end of `path`.
    ///
    /// The search for an unbalanced node starts at the grandparent of the
    /// leaf and moves up the visited path. The first unbalanced node found
    /// is the only one that needs a rotation: once rotated, its subtree is
    /// back to the height it had before the insertion.
    ///
    /// # Arguments
    ///
    /// * `path` - visited slots, from the root to the new leaf.
    /// * `key` - the key that was inserted.
    pub(super) fn rebalance(&mut self, path: &[usize], key: &K) -> Result<()> {
        if path.len() <= 2 {
            return Ok(());
        }

        for position in (0..path.len() - 2).rev() {
            let pivot = path[position];
            let balance = self.balance_factor(pivot);
            let child = self.nodes[path[position + 1]].key;

            let Some(rotation) = Rotation::select(balance, key, &child) else {
                continue;
            };

            #[cfg(feature = "tracing")]
            tracing::trace!(?rotation, pivot, balance, "rebalance: rotating");

            self.apply(rotation, pivot)?;
            self.header.count_rotation();
            self.refresh_heights(&path[..position]);

            return Ok(());
        }

        Ok(())
    }

    /// Recomputes the heights of the slots in `path`, from the last one up.
    ///
    /// Stops at the first slot whose height is already right: nothing above
    /// it can change either.
    pub(super) fn refresh_heights(&mut self, path: &[usize]) {
        for &index in path.iter().rev() {
            let height = self.computed_height(index);

            if self.nodes[index].height() == height {
                break;
            }

            self.nodes[index].set_height(height);
        }
    }

    /// Updates the height of a slot from the heights of its children.
    pub(super) fn update_height(&mut self, index: usize) {
        let height = self.computed_height(index);
        self.nodes[index].set_height(height);
    }

    /// Calculate the balance factor of a slot.
    ///
    /// The balance factor is determined by the difference between the height
    /// of its left and right children subtrees, an empty child counting as -1.
    pub(super) fn balance_factor(&self, index: usize) -> i32 {
        let capacity = self.capacity();

        height_at(&*self.nodes, capacity, left(index))
            - height_at(&*self.nodes, capacity, right(index))
    }

    fn computed_height(&self, index: usize) -> i32 {
        let capacity = self.capacity();

        max(
            height_at(&*self.nodes, capacity, left(index)),
            height_at(&*self.nodes, capacity, right(index)),
        ) + 1
    }
}

#[cfg(test)]
mod tests {
    use crate::collections::implicit_avl::layout::{left, right, ROOT};
    use crate::collections::implicit_avl::node::{Header, Node};
    use crate::collections::implicit_avl::tree::ImplicitAVLTreeMut;
    use crate::config::VerifyMode;
    use crate::error::AvlError;

    fn empty(capacity: usize) -> (Header, Vec<Node<u32, u32>>) {
        let mut header = Header::default();
        header.initialize(capacity as u32, VerifyMode::Always);

        (header, vec![Node::default(); capacity])
    }

    fn shape(tree: &ImplicitAVLTreeMut<'_, u32, u32>) -> Vec<(Option<u32>, Option<u32>)> {
        (0..tree.capacity())
            .map(|index| (tree.key_at(index), tree.slot(index).height()))
            .collect()
    }

    /// Inserts `keys` in order and returns the keys of the root and its children.
    fn triangle(keys: [u32; 3]) -> (Option<u32>, Option<u32>, Option<u32>) {
        let (mut header, mut nodes) = empty(10);
        let mut tree = ImplicitAVLTreeMut::from_parts(&mut header, &mut nodes);

        for key in keys {
            tree.insert(key, key * 100).unwrap();
        }

        assert_eq!(tree.rotations(), 1);
        assert_eq!(tree.height(), Some(1));
        for key in keys {
            assert_eq!(tree.get(&key), Some(&(key * 100)));
        }

        (
            tree.key_at(ROOT),
            tree.key_at(left(ROOT)),
            tree.key_at(right(ROOT)),
        )
    }

    #[test]
    fn test_right_rotation() {
        assert_eq!(triangle([3, 2, 1]), (Some(2), Some(1), Some(3)));
    }

    #[test]
    fn test_left_rotation() {
        assert_eq!(triangle([1, 2, 3]), (Some(2), Some(1), Some(3)));
    }

    #[test]
    fn test_left_right_rotation() {
        assert_eq!(triangle([3, 1, 2]), (Some(2), Some(1), Some(3)));
    }

    #[test]
    fn test_right_left_rotation() {
        assert_eq!(triangle([1, 3, 2]), (Some(2), Some(1), Some(3)));
    }

    #[test]
    fn test_no_rotation_when_balanced() {
        let (mut header, mut nodes) = empty(10);
        let mut tree = ImplicitAVLTreeMut::from_parts(&mut header, &mut nodes);

        for key in [2, 1, 3] {
            tree.insert(key, key).unwrap();
        }

        assert_eq!(tree.rotations(), 0);
        assert_eq!(tree.key_at(ROOT), Some(2));
    }

    #[test]
    fn test_rotation_above_grandparent() {
        let (mut header, mut nodes) = empty(31);
        let mut tree = ImplicitAVLTreeMut::from_parts(&mut header, &mut nodes);

        for key in [2, 1, 4, 3, 5] {
            tree.insert(key, key).unwrap();
        }
        assert_eq!(tree.rotations(), 0);

        // the grandparent of 6 stays balanced, the root does not
        tree.insert(6, 6).unwrap();

        assert_eq!(tree.rotations(), 1);
        assert_eq!(tree.key_at(0), Some(4));
        assert_eq!(tree.key_at(1), Some(2));
        assert_eq!(tree.key_at(2), Some(5));
        assert_eq!(tree.key_at(3), Some(1));
        assert_eq!(tree.key_at(4), Some(3));
        assert_eq!(tree.key_at(6), Some(6));
        assert_eq!(tree.height(), Some(2));
        tree.verify().unwrap();
    }

    #[test]
    fn test_ascending_keys_stay_balanced() {
        // a new leaf may sit one level below the final shape until rotated
        let (mut header, mut nodes) = empty(31);
        let mut tree = ImplicitAVLTreeMut::from_parts(&mut header, &mut nodes);

        for key in 1..=15 {
            tree.insert(key, key).unwrap();
            tree.verify().unwrap();
        }

        // fifteen ascending keys end up as a perfect tree
        assert_eq!(tree.len(), 15);
        assert_eq!(tree.height(), Some(3));
        assert_eq!(tree.key_at(ROOT), Some(8));
        assert!((15..31).all(|index| tree.key_at(index).is_none()));
    }

    #[test]
    fn test_descent_beyond_capacity_leaves_tree_untouched() {
        let (mut header, mut nodes) = empty(6);
        let mut tree = ImplicitAVLTreeMut::from_parts(&mut header, &mut nodes);

        //        4
        //      /   \
        //     2     5
        //    / \
        //   1   3
        for key in [4, 2, 5, 1, 3] {
            tree.insert(key, key).unwrap();
        }
        let before = shape(&tree);

        // 0 belongs below 1, at slot 7
        assert_eq!(
            tree.insert(0, 0),
            Err(AvlError::CapacityExceeded {
                index: 7,
                capacity: 6
            })
        );
        assert_eq!(shape(&tree), before);
        assert_eq!(tree.len(), 5);
        assert!(!tree.contains(&0));
        tree.verify().unwrap();
    }

    #[test]
    fn test_double_rotation_below_root() {
        let (mut header, mut nodes) = empty(10);
        let mut tree = ImplicitAVLTreeMut::from_parts(&mut header, &mut nodes);

        //        10
        //      /    \
        //     2      20
        //      \    /
        //       5  15
        for key in [10, 2, 20, 5, 15] {
            tree.insert(key, key).unwrap();
        }

        // 4 goes to slot 9, left of 5, and unbalances 2
        tree.insert(4, 4).unwrap();

        assert_eq!(tree.rotations(), 1);
        assert_eq!(tree.key_at(0), Some(10));
        assert_eq!(tree.key_at(1), Some(4));
        assert_eq!(tree.key_at(3), Some(2));
        assert_eq!(tree.key_at(4), Some(5));
        assert_eq!(tree.key_at(9), None);
        assert_eq!(tree.height(), Some(2));
        tree.verify().unwrap();
    }
}
