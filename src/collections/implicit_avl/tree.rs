use bytemuck::{Pod, Zeroable};
use std::cmp::Ordering;

use super::layout::{left, right, ROOT};
use super::node::{Header, Node, Slot, TreeKey};
use super::verify;
use crate::config::VerifyMode;
use crate::error::{AvlError, Result};

/// AVL tree laid out as an implicit array: the children of slot `i` live at
/// `2i + 1` and `2i + 2`, so no links are stored. The height of two sibling
/// subtrees differ by one at most.
///
/// This type can be used to reference a read-only tree.
pub struct ImplicitAVLTree<'a, K: TreeKey, V: Default + Copy + Clone + Pod + Zeroable> {
    /// Tree status.
    header: &'a Header,

    /// Array of slots to store the tree.
    nodes: &'a [Node<K, V>],
}

impl<'a, K: TreeKey, V: Default + Copy + Clone + Pod + Zeroable> ImplicitAVLTree<'a, K, V> {
    /// Returns the required data length (in bytes) to store a tree with the specified capacity.
    pub const fn data_len(capacity: usize) -> usize {
        std::mem::size_of::<Header>() + (capacity * std::mem::size_of::<Node<K, V>>())
    }

    /// Loads a tree from a byte array.
    pub fn from_bytes(bytes: &'a [u8]) -> Result<Self> {
        Node::<K, V>::ensure_packed()?;

        if bytes.len() < std::mem::size_of::<Header>() {
            return Err(AvlError::BufferTooSmall {
                expected: std::mem::size_of::<Header>(),
                actual: bytes.len(),
            });
        }

        let (header, nodes) = bytes.split_at(std::mem::size_of::<Header>());
        let usable = nodes.len() - nodes.len() % std::mem::size_of::<Node<K, V>>();

        let header = bytemuck::try_from_bytes::<Header>(header)?;
        let nodes = bytemuck::try_cast_slice(&nodes[..usable])?;

        let tree = Self::from_parts(header, nodes);
        ensure_slots(tree.capacity(), nodes.len())?;

        Ok(tree)
    }

    pub(crate) fn from_parts(header: &'a Header, nodes: &'a [Node<K, V>]) -> Self {
        Self { header, nodes }
    }

    /// Returns the capacity of the tree.
    pub fn capacity(&self) -> usize {
        self.header.capacity()
    }

    /// Returns the number of keys in the tree.
    pub fn len(&self) -> usize {
        self.header.size()
    }

    /// Indicates whether the tree is full or not.
    pub fn is_full(&self) -> bool {
        self.header.size() >= self.header.capacity()
    }

    /// Indicates whether the tree is empty or not.
    pub fn is_empty(&self) -> bool {
        self.header.size() == 0
    }

    /// Height of the root subtree, `None` when the tree is empty.
    pub fn height(&self) -> Option<u32> {
        self.slot(ROOT).height()
    }

    /// Number of rotations applied since the tree was initialized.
    pub fn rotations(&self) -> u32 {
        self.header.rotations()
    }

    /// Return the value under the specified key, if one is found.
    ///
    /// # Arguments
    ///
    /// * `key` - key to look up the value.
    pub fn get(&self, key: &K) -> Option<&'a V> {
        let nodes = self.nodes;
        find(nodes, self.capacity(), key).map(|index| &nodes[index].value)
    }

    /// Checks whether a key is present in the tree or not.
    pub fn contains(&self, key: &K) -> bool {
        find(self.nodes, self.capacity(), key).is_some()
    }

    /// Returns the contents of the slot at `index`.
    pub fn slot(&self, index: usize) -> Slot<'a, K, V> {
        let nodes = self.nodes;
        if index < self.capacity() {
            nodes[index].slot()
        } else {
            Slot::Empty
        }
    }

    /// Returns the key stored at `index`, if the slot is occupied.
    pub fn key_at(&self, index: usize) -> Option<K> {
        self.slot(index).key()
    }

    /// Find the lowest key.
    pub fn lowest(&self) -> Option<K> {
        edge(self.nodes, self.capacity(), left)
    }

    /// Find the highest key.
    pub fn highest(&self) -> Option<K> {
        edge(self.nodes, self.capacity(), right)
    }

    /// Checks every structural invariant of the tree.
    pub fn verify(&self) -> Result<()> {
        verify::check(self.header, self.nodes)
    }
}

/// AVL tree laid out as an implicit array: the children of slot `i` live at
/// `2i + 1` and `2i + 2`, so no links are stored. The height of two sibling
/// subtrees differ by one at most.
///
/// This type can be used to reference a writable tree.
pub struct ImplicitAVLTreeMut<'a, K: TreeKey, V: Default + Copy + Clone + Pod + Zeroable> {
    /// Tree status.
    pub(super) header: &'a mut Header,

    /// Array of slots to store the tree.
    pub(super) nodes: &'a mut [Node<K, V>],
}

impl<'a, K: TreeKey, V: Default + Copy + Clone + Pod + Zeroable> ImplicitAVLTreeMut<'a, K, V> {
    /// Returns the required data length (in bytes) to store a tree with the specified capacity.
    pub const fn data_len(capacity: usize) -> usize {
        ImplicitAVLTree::<K, V>::data_len(capacity)
    }

    /// Loads a tree from a byte array.
    ///
    /// The capacity stored in the header must fit in the buffer. A zeroed
    /// buffer has capacity 0 until the tree is initialized.
    pub fn from_bytes_mut(bytes: &'a mut [u8]) -> Result<Self> {
        Node::<K, V>::ensure_packed()?;

        if bytes.len() < std::mem::size_of::<Header>() {
            return Err(AvlError::BufferTooSmall {
                expected: std::mem::size_of::<Header>(),
                actual: bytes.len(),
            });
        }

        let (header, nodes) = bytes.split_at_mut(std::mem::size_of::<Header>());
        let usable = nodes.len() - nodes.len() % std::mem::size_of::<Node<K, V>>();

        let header = bytemuck::try_from_bytes_mut::<Header>(header)?;
        let nodes: &mut [Node<K, V>] = bytemuck::try_cast_slice_mut(&mut nodes[..usable])?;
        ensure_slots(header.capacity(), nodes.len())?;

        Ok(Self::from_parts(header, nodes))
    }

    pub(crate) fn from_parts(header: &'a mut Header, nodes: &'a mut [Node<K, V>]) -> Self {
        Self { header, nodes }
    }

    /// Initializes the tree with the specified capacity.
    ///
    /// This function should be called once when the tree is created. Every
    /// slot is marked as empty.
    pub fn initialize(&mut self, capacity: u32) -> Result<()> {
        self.initialize_with(capacity, VerifyMode::default())
    }

    /// Initializes the tree with the specified capacity and verify mode.
    pub fn initialize_with(&mut self, capacity: u32, verify: VerifyMode) -> Result<()> {
        ensure_slots(capacity as usize, self.nodes.len())?;

        self.header.initialize(capacity, verify);
        self.nodes[..capacity as usize]
            .iter_mut()
            .for_each(Node::clear);

        Ok(())
    }

    /// Returns a read-only view of the tree.
    pub fn as_view(&self) -> ImplicitAVLTree<'_, K, V> {
        ImplicitAVLTree::from_parts(&*self.header, &*self.nodes)
    }

    /// Returns the capacity of the tree.
    pub fn capacity(&self) -> usize {
        self.header.capacity()
    }

    /// Returns the number of keys in the tree.
    pub fn len(&self) -> usize {
        self.header.size()
    }

    /// Indicates whether the tree is full or not.
    pub fn is_full(&self) -> bool {
        self.header.size() >= self.header.capacity()
    }

    /// Indicates whether the tree is empty or not.
    pub fn is_empty(&self) -> bool {
        self.header.size() == 0
    }

    /// Return the value under the specified key, if one is found.
    ///
    /// # Arguments
    ///
    /// * `key` - key to look up the value.
    pub fn get(&self, key: &K) -> Option<&V> {
        find(&*self.nodes, self.capacity(), key).map(|index| &self.nodes[index].value)
    }

    /// Return a mutable reference to the value under the specified key, if one is found.
    ///
    /// # Arguments
    ///
    /// * `key` - key to look up the value.
    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        find(&*self.nodes, self.capacity(), key).map(|index| &mut self.nodes[index].value)
    }

    /// Checks whether a key is present in the tree or not.
    pub fn contains(&self, key: &K) -> bool {
        find(&*self.nodes, self.capacity(), key).is_some()
    }

    /// Insert a value on the tree at the specified key.
    ///
    /// When the key is already present only its value is replaced and the
    /// previous value is returned; the shape of the tree is untouched.
    /// Otherwise the key is stored in the first empty slot of its descent
    /// and the tree is rebalanced.
    ///
    /// Fails with [`AvlError::CapacityExceeded`] when the descent, or the
    /// rotation that would rebalance it, needs a slot beyond the capacity.
    /// The tree is left unchanged in that case.
    ///
    /// # Arguments
    ///
    /// * `key` - the key of the node.
    /// * `value` - the value of the node.
    pub fn insert(&mut self, key: K, value: V) -> Result<Option<V>> {
        let capacity = self.capacity();
        let mut path: Vec<usize> = Vec::with_capacity(self.height_hint());
        let mut index = ROOT;

        loop {
            if index >= capacity {
                #[cfg(feature = "tracing")]
                tracing::debug!(?key, index, capacity, "insert: capacity exceeded");

                return Err(AvlError::CapacityExceeded { index, capacity });
            }

            path.push(index);
            let node = &mut self.nodes[index];

            if node.is_empty() {
                node.occupy(key, value);
                self.header.grow();
                break;
            }

            index = match key.cmp(&node.key) {
                Ordering::Less => left(index),
                Ordering::Greater => right(index),
                Ordering::Equal => return Ok(Some(std::mem::replace(&mut node.value, value))),
            };
        }

        self.refresh_heights(&path[..path.len() - 1]);

        if let Err(error) = self.rebalance(&path, &key) {
            self.discard_leaf(&path);
            return Err(error);
        }

        if self.header.verify().is_enabled() {
            if let Err(error) = self.verify() {
                #[cfg(feature = "tracing")]
                tracing::error!(?key, %error, "insert: tree invariants broken");

                return Err(error);
            }
        }

        Ok(None)
    }

    /// Returns the contents of the slot at `index`.
    pub fn slot(&self, index: usize) -> Slot<'_, K, V> {
        if index < self.capacity() {
            self.nodes[index].slot()
        } else {
            Slot::Empty
        }
    }

    /// Returns the key stored at `index`, if the slot is occupied.
    pub fn key_at(&self, index: usize) -> Option<K> {
        self.slot(index).key()
    }

    /// Height of the root subtree, `None` when the tree is empty.
    pub fn height(&self) -> Option<u32> {
        self.slot(ROOT).height()
    }

    /// Number of rotations applied since the tree was initialized.
    pub fn rotations(&self) -> u32 {
        self.header.rotations()
    }

    /// Find the lowest key.
    pub fn lowest(&self) -> Option<K> {
        edge(&*self.nodes, self.capacity(), left)
    }

    /// Find the highest key.
    pub fn highest(&self) -> Option<K> {
        edge(&*self.nodes, self.capacity(), right)
    }

    /// Checks every structural invariant of the tree.
    pub fn verify(&self) -> Result<()> {
        verify::check(&*self.header, &*self.nodes)
    }

    /// Length of the longest possible descent, used to size the visited path.
    fn height_hint(&self) -> usize {
        self.height().map_or(1, |height| height as usize + 2)
    }

    /// Removes the leaf placed at the end of `path` and restores the heights
    /// above it.
    ///
    /// A rotation over a consistent tree never needs a slot deeper than the
    /// new leaf, so this only runs when the stored heights understate a
    /// subtree that the rotation has to move.
    fn discard_leaf(&mut self, path: &[usize]) {
        if let Some((&leaf, ancestors)) = path.split_last() {
            self.nodes[leaf].clear();
            self.header.shrink();
            self.refresh_heights(ancestors);

            #[cfg(feature = "tracing")]
            tracing::debug!(leaf, "insert: rolled back");
        }
    }
}

/// Returns the slot holding `key`, descending from the root.
pub(crate) fn find<K: TreeKey, V: Default + Copy + Clone + Pod + Zeroable>(
    nodes: &[Node<K, V>],
    capacity: usize,
    key: &K,
) -> Option<usize> {
    let mut index = ROOT;

    while index < capacity {
        let node = &nodes[index];

        if node.is_empty() {
            return None;
        }

        index = match key.cmp(&node.key) {
            Ordering::Less => left(index),
            Ordering::Greater => right(index),
            Ordering::Equal => return Some(index),
        };
    }

    None
}

/// Follows `step` from the root and returns the key of the last occupied slot.
fn edge<K: TreeKey, V: Default + Copy + Clone + Pod + Zeroable>(
    nodes: &[Node<K, V>],
    capacity: usize,
    step: fn(usize) -> usize,
) -> Option<K> {
    let mut index = ROOT;
    let mut key = None;

    while index < capacity && !nodes[index].is_empty() {
        key = Some(nodes[index].key);
        index = step(index);
    }

    key
}

fn ensure_slots(capacity: usize, available: usize) -> Result<()> {
    if available < capacity {
        return Err(AvlError::BufferTooSmall {
            expected: capacity,
            actual: available,
        });
    }

    Ok(())
}
