use bytemuck::{Pod, Zeroable};

use super::node::{Header, Node, Slot, TreeKey};
use super::tree::{ImplicitAVLTree, ImplicitAVLTreeMut};
use crate::config::{TreeConfig, VerifyMode};
use crate::error::Result;

/// Owned implicit AVL tree.
///
/// All the slots are allocated when the map is created and the map never
/// grows: inserting a key whose slot would fall beyond the capacity fails
/// with [`AvlError::CapacityExceeded`](crate::error::AvlError::CapacityExceeded).
pub struct ImplicitAVLMap<K: TreeKey, V: Default + Copy + Clone + Pod + Zeroable> {
    /// Tree status.
    header: Header,

    /// Array of slots to store the tree.
    nodes: Vec<Node<K, V>>,
}

impl<K: TreeKey, V: Default + Copy + Clone + Pod + Zeroable> ImplicitAVLMap<K, V> {
    /// Creates a map with `capacity` empty slots.
    pub fn new(capacity: u32) -> Self {
        Self::with_verify(capacity, VerifyMode::default())
    }

    /// Creates a map from a validated configuration.
    pub fn from_config(config: &TreeConfig) -> Result<Self> {
        config.validate()?;

        Ok(Self::with_verify(config.capacity, config.verify))
    }

    fn with_verify(capacity: u32, verify: VerifyMode) -> Self {
        #[allow(clippy::let_unit_value)]
        let () = Node::<K, V>::PACKED;

        let mut header = Header::default();
        header.initialize(capacity, verify);

        Self {
            header,
            nodes: vec![Node::default(); capacity as usize],
        }
    }

    /// Returns a read-only view of the tree.
    pub fn as_view(&self) -> ImplicitAVLTree<'_, K, V> {
        ImplicitAVLTree::from_parts(&self.header, &self.nodes)
    }

    /// Returns a writable view of the tree.
    pub fn as_view_mut(&mut self) -> ImplicitAVLTreeMut<'_, K, V> {
        ImplicitAVLTreeMut::from_parts(&mut self.header, &mut self.nodes)
    }

    /// Returns the capacity of the map.
    pub fn capacity(&self) -> usize {
        self.header.capacity()
    }

    /// Returns the number of keys in the map.
    pub fn len(&self) -> usize {
        self.header.size()
    }

    /// Indicates whether the map is full or not.
    pub fn is_full(&self) -> bool {
        self.as_view().is_full()
    }

    /// Indicates whether the map is empty or not.
    pub fn is_empty(&self) -> bool {
        self.header.size() == 0
    }

    /// Height of the root subtree, `None` when the map is empty.
    pub fn height(&self) -> Option<u32> {
        self.as_view().height()
    }

    /// Number of rotations applied since the map was created.
    pub fn rotations(&self) -> u32 {
        self.header.rotations()
    }

    /// Inserts or updates `key`, returning the previous value if there was one.
    pub fn insert(&mut self, key: K, value: V) -> Result<Option<V>> {
        self.as_view_mut().insert(key, value)
    }

    /// Return the value under the specified key, if one is found.
    pub fn get(&self, key: &K) -> Option<&V> {
        self.as_view().get(key)
    }

    /// Return a mutable reference to the value under the specified key, if one is found.
    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        let capacity = self.capacity();

        super::tree::find(&self.nodes, capacity, key).map(|index| &mut self.nodes[index].value)
    }

    /// Checks whether a key is present in the map or not.
    pub fn contains(&self, key: &K) -> bool {
        self.as_view().contains(key)
    }

    /// Returns the contents of the slot at `index`.
    pub fn slot(&self, index: usize) -> Slot<'_, K, V> {
        self.as_view().slot(index)
    }

    /// Returns the key stored at `index`, if the slot is occupied.
    pub fn key_at(&self, index: usize) -> Option<K> {
        self.as_view().key_at(index)
    }

    /// Find the lowest key.
    pub fn lowest(&self) -> Option<K> {
        self.as_view().lowest()
    }

    /// Find the highest key.
    pub fn highest(&self) -> Option<K> {
        self.as_view().highest()
    }

    /// Checks every structural invariant of the map.
    pub fn verify(&self) -> Result<()> {
        self.as_view().verify()
    }
}
