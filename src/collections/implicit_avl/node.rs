use bytemuck::{Pod, PodCastError, Zeroable};
use std::fmt::Debug;
use std::mem::size_of;

use crate::config::VerifyMode;
use crate::error::{AvlError, Result};

/// Height stored in a slot that holds no key.
pub const EMPTY_HEIGHT: i32 = -1;

/// Unsigned integer types that can be used as tree keys.
pub trait TreeKey: Ord + Copy + Default + Debug + Pod {}

macro_rules! impl_tree_key {
    ($($t:ty),*) => {
        $(
            impl TreeKey for $t {}
        )*
    };
}

impl_tree_key! { u32, u64 }

// Enum representing the fields of the header.
#[derive(Copy, Clone)]
enum Field {
    Size,
    Capacity,
    Verify,
    Rotations,
}

/// The header keeps track of the status of the tree.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, Pod, Zeroable)]
pub struct Header {
    /// Header fields:
    ///   [0] - size
    ///   [1] - capacity
    ///   [2] - verify mode
    ///   [3] - number of rotations applied
    fields: [u32; 4],
}

impl Header {
    pub fn initialize(&mut self, capacity: u32, verify: VerifyMode) {
        self.fields = [0, capacity, verify as u32, 0];
    }

    #[inline(always)]
    fn get_field(&self, field: Field) -> u32 {
        self.fields[field as usize]
    }

    #[inline(always)]
    fn set_field(&mut self, field: Field, value: u32) {
        self.fields[field as usize] = value;
    }

    #[inline(always)]
    pub(crate) fn size(&self) -> usize {
        self.get_field(Field::Size) as usize
    }

    #[inline(always)]
    pub(crate) fn capacity(&self) -> usize {
        self.get_field(Field::Capacity) as usize
    }

    #[inline(always)]
    pub(crate) fn verify(&self) -> VerifyMode {
        VerifyMode::from_raw(self.get_field(Field::Verify))
    }

    #[inline(always)]
    pub(crate) fn rotations(&self) -> u32 {
        self.get_field(Field::Rotations)
    }

    pub(crate) fn grow(&mut self) {
        self.set_field(Field::Size, self.get_field(Field::Size) + 1);
    }

    pub(crate) fn shrink(&mut self) {
        self.set_field(Field::Size, self.get_field(Field::Size) - 1);
    }

    pub(crate) fn count_rotation(&mut self) {
        self.set_field(
            Field::Rotations,
            self.get_field(Field::Rotations).wrapping_add(1),
        );
    }
}

/// One slot of the tree array.
///
/// `K` and `V` must not introduce padding for the node to be safely cast
/// from raw bytes.
#[repr(C)]
#[derive(Clone, Copy, Debug)]
pub struct Node<K: TreeKey, V: Default + Copy + Clone + Pod + Zeroable> {
    /// Registers for a node. This is fixed to include:
    ///   [0] - height (`EMPTY_HEIGHT` when the slot is empty)
    ///   [1..4] - not in use (padding)
    registers: [i32; 4],
    /// Key stored in the slot.
    pub(crate) key: K,
    /// The value associated with the key.
    pub(crate) value: V,
}

impl<K: TreeKey, V: Default + Copy + Clone + Pod + Zeroable> Default for Node<K, V> {
    fn default() -> Self {
        Self {
            registers: [EMPTY_HEIGHT, 0, 0, 0],
            key: K::default(),
            value: V::default(),
        }
    }
}

impl<K: TreeKey, V: Default + Copy + Clone + Pod + Zeroable> Node<K, V> {
    /// Turns the slot into a leaf holding `key` and `value`.
    pub(crate) fn occupy(&mut self, key: K, value: V) {
        self.registers = [0, 0, 0, 0];
        self.key = key;
        self.value = value;
    }

    /// Marks the slot as empty.
    pub(crate) fn clear(&mut self) {
        *self = Self::default();
    }

    #[inline(always)]
    pub(crate) fn is_empty(&self) -> bool {
        self.registers[0] == EMPTY_HEIGHT
    }

    #[inline(always)]
    pub(crate) fn height(&self) -> i32 {
        self.registers[0]
    }

    #[inline(always)]
    pub(crate) fn set_height(&mut self, height: i32) {
        self.registers[0] = height;
    }

    /// Size of the node fields laid end to end.
    const FIELDS_LEN: usize = size_of::<[i32; 4]>() + size_of::<K>() + size_of::<V>();

    /// Evaluates to an error at compile time when `K` and `V` leave padding
    /// in the node.
    pub(crate) const PACKED: () = assert!(
        size_of::<Self>() == Self::FIELDS_LEN,
        "key and value types leave padding in the node"
    );

    /// Rejects key and value types that leave padding in the node, which
    /// would expose uninitialized bytes through the byte views.
    pub(crate) fn ensure_packed() -> Result<()> {
        if size_of::<Self>() != Self::FIELDS_LEN {
            return Err(AvlError::InvalidLayout(PodCastError::SizeMismatch));
        }

        Ok(())
    }

    /// Returns the tagged view of the slot.
    pub fn slot(&self) -> Slot<'_, K, V> {
        if self.is_empty() {
            Slot::Empty
        } else {
            Slot::Occupied {
                height: self.height() as u32,
                key: self.key,
                value: &self.value,
            }
        }
    }
}

// Safety: every byte constructor calls `ensure_packed` and the owned map
// evaluates `PACKED`, so no node with padding is ever built from or viewed
// as bytes.
unsafe impl<K: TreeKey, V: Default + Copy + Clone + Pod + Zeroable> Zeroable for Node<K, V> {}

unsafe impl<K: TreeKey, V: Default + Copy + Clone + Pod + Zeroable> Pod for Node<K, V> {}

/// Contents of a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot<'a, K, V> {
    /// No key is stored in the slot.
    Empty,
    /// The slot roots a subtree of the given height (0 for a leaf).
    Occupied { height: u32, key: K, value: &'a V },
}

impl<'a, K: Copy, V> Slot<'a, K, V> {
    pub fn key(&self) -> Option<K> {
        match self {
            Slot::Empty => None,
            Slot::Occupied { key, .. } => Some(*key),
        }
    }

    pub fn height(&self) -> Option<u32> {
        match self {
            Slot::Empty => None,
            Slot::Occupied { height, .. } => Some(*height),
        }
    }
}

/// Height of the slot at `index`, treating slots beyond `capacity` as empty.
#[inline]
pub(crate) fn height_at<K: TreeKey, V: Default + Copy + Clone + Pod + Zeroable>(
    nodes: &[Node<K, V>],
    capacity: usize,
    index: usize,
) -> i32 {
    if index < capacity {
        nodes[index].height()
    } else {
        EMPTY_HEIGHT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_lifecycle() {
        let mut node = Node::<u64, u64>::default();
        assert!(node.is_empty());
        assert_eq!(node.slot(), Slot::Empty);

        node.occupy(7, 70);
        assert!(!node.is_empty());
        assert_eq!(
            node.slot(),
            Slot::Occupied {
                height: 0,
                key: 7,
                value: &70
            }
        );

        node.set_height(2);
        assert_eq!(node.slot().height(), Some(2));
        assert_eq!(node.slot().key(), Some(7));

        node.clear();
        assert!(node.is_empty());
        assert_eq!(node.slot().key(), None);
    }

    #[test]
    fn test_header_fields() {
        let mut header = Header::default();
        header.initialize(15, VerifyMode::Always);

        assert_eq!(header.size(), 0);
        assert_eq!(header.capacity(), 15);
        assert_eq!(header.verify(), VerifyMode::Always);

        header.grow();
        header.grow();
        header.shrink();
        header.count_rotation();

        assert_eq!(header.size(), 1);
        assert_eq!(header.rotations(), 1);
    }

    #[test]
    fn test_packed_layout() {
        assert!(Node::<u32, u32>::ensure_packed().is_ok());
        assert!(Node::<u64, u64>::ensure_packed().is_ok());
        assert!(Node::<u32, [u8; 8]>::ensure_packed().is_ok());

        // 16 + 4 + 8 bytes of fields, padded to 32
        assert_eq!(
            Node::<u32, u64>::ensure_packed(),
            Err(AvlError::InvalidLayout(PodCastError::SizeMismatch))
        );
    }

    #[test]
    fn test_height_beyond_capacity() {
        let mut nodes = [Node::<u32, u32>::default(); 4];
        nodes[3].occupy(1, 1);

        assert_eq!(height_at(&nodes, 4, 3), 0);
        assert_eq!(height_at(&nodes, 3, 3), EMPTY_HEIGHT);
        assert_eq!(height_at(&nodes, 4, 10), EMPTY_HEIGHT);
    }
}
