//! Capacity-bounded AVL tree stored as an implicit array.
//!
//! The tree lives in a fixed number of slots. Slot `i` has its children at
//! `2i + 1` and `2i + 2`, so a key's position alone encodes the shape of the
//! tree. Rebalancing moves entries between slots instead of rewiring links.

mod balance;
pub mod layout;
pub mod map;
pub mod node;
pub mod rotation;
pub mod tree;
mod verify;

pub use map::ImplicitAVLMap;
pub use node::{Header, Node, Slot, TreeKey, EMPTY_HEIGHT};
pub use rotation::Rotation;
pub use tree::{ImplicitAVLTree, ImplicitAVLTreeMut};
