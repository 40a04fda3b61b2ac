pub mod implicit_avl;

pub use implicit_avl::ImplicitAVLMap;
pub use implicit_avl::ImplicitAVLTree;
pub use implicit_avl::ImplicitAVLTreeMut;
