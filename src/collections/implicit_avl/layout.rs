//! Heap-style addressing of tree positions.
//!
//! The root lives at slot 0 and the children of slot `i` live at `2i + 1`
//! and `2i + 2`. There are no child or parent links: the shape of the tree
//! is entirely a function of the slot index.

/// Index of the root slot.
pub const ROOT: usize = 0;

/// Returns the index of the left child of `index`.
#[inline(always)]
pub const fn left(index: usize) -> usize {
    index * 2 + 1
}

/// Returns the index of the right child of `index`.
#[inline(always)]
pub const fn right(index: usize) -> usize {
    index * 2 + 2
}

/// Returns the index of the parent of `index`, or `None` for the root.
#[inline(always)]
pub const fn parent(index: usize) -> Option<usize> {
    if index == ROOT {
        None
    } else {
        Some((index - 1) / 2)
    }
}

/// Depth of a slot, the root being at depth 0.
#[inline(always)]
pub const fn depth(index: usize) -> u32 {
    (index + 1).ilog2()
}

/// Maps a position numbered relative to a subtree root (`local`, heap
/// indexed from 0) to its absolute slot when that subtree is rooted at
/// `base`.
///
/// Returns `None` when the absolute index does not fit in a `usize`.
pub fn descendant(base: usize, local: usize) -> Option<usize> {
    let level = depth(local);
    // the first slot of a level is `2^level - 1`
    let offset = local + 1 - (1usize << level);
    let first = (base + 1).checked_mul(1usize.checked_shl(level)?)? - 1;

    first.checked_add(offset)
}
