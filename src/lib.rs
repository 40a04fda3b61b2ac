//! AVL tree laid out as an implicit array.
//!
//! Keys live in a fixed-capacity slot array where the children of slot `i`
//! sit at `2i + 1` and `2i + 2`. The tree can be owned ([`ImplicitAVLMap`])
//! or viewed in place over a byte buffer ([`ImplicitAVLTree`] and
//! [`ImplicitAVLTreeMut`]).

pub mod collections;
pub mod config;
pub mod error;

pub use collections::{ImplicitAVLMap, ImplicitAVLTree, ImplicitAVLTreeMut};
pub use config::{TreeConfig, VerifyMode};
pub use error::{AvlError, Result, Violation};
