//! Suffix-tree construction.
//!
//! Construction threads one suffix at a time through the tree using the
//! backend's own edge operations: descend by symbol, split the edge where the
//! new suffix diverges, insert a leaf for the remainder. A suffix that is a
//! prefix of an already-threaded suffix ends mid-edge and adds nothing (the
//! tree is implicit; see the module docs).

use super::{MultiWaySuffixTree, SimpleSuffixTree, SuffixTree, SuffixTreeMut};
use crate::error::Result;
use crate::sequence::ReferenceIndex;

/// Build the suffix tree for a reference in the multi-way backend.
pub fn build_multiway_tree(reference: ReferenceIndex) -> Result<MultiWaySuffixTree> {
    MultiWaySuffixTree::build(reference)
}

/// Build the suffix tree for a reference in the simple backend.
pub fn build_simple_tree(reference: ReferenceIndex) -> Result<SimpleSuffixTree> {
    SimpleSuffixTree::build(reference)
}

/// Thread every suffix of the tree's reference into an empty tree.
pub fn build_into<T: SuffixTreeMut>(tree: &mut T) -> Result<()> {
    let n = tree.reference().len();
    for suffix_start in 0..n {
        let symbol = tree
            .reference()
            .symbol_at(suffix_start)
            .expect("position in range");
        if symbol.is_sentinel() {
            continue;
        }
        insert_suffix(tree, suffix_start)?;
    }
    Ok(())
}

/// Thread the suffix starting at `suffix_start` into the tree.
///
/// No-op when the suffix is already spelled by an existing path.
pub fn insert_suffix<T: SuffixTreeMut>(tree: &mut T, suffix_start: usize) -> Result<()> {
    let n = tree.reference().len();
    debug_assert!(suffix_start < n);

    let mut pos = suffix_start;
    let mut node = tree.root();
    loop {
        let symbol = tree.reference().symbol_at(pos).expect("position in range");
        let Some(handle) = tree.find(node, symbol)? else {
            tree.insert(node, pos, n - 1, Some(suffix_start))?;
            return Ok(());
        };

        let edge = tree.edge(handle)?;
        let len = edge.len();
        let mut matched = 1;
        while matched < len && pos + matched < n {
            if tree.reference().symbol_at(edge.start + matched)
                != tree.reference().symbol_at(pos + matched)
            {
                break;
            }
            matched += 1;
        }

        if matched < len {
            if pos + matched >= n {
                // suffix exhausted mid-edge: implicit, nothing to add
                return Ok(());
            }
            // diverges mid-edge: split, then hang the remainder off the
            // upper half (re-read through the lower's parent link; the
            // persistent backend may supersede the upper handle)
            let lower = tree.split(handle, matched)?;
            let upper = tree.edge(lower)?.parent.expect("split lower has a parent");
            tree.insert(upper, pos + matched, n - 1, Some(suffix_start))?;
            return Ok(());
        }

        pos += len;
        if pos >= n {
            // suffix exhausted exactly at this node
            return Ok(());
        }
        node = handle;
    }
}

/// Union `other` into `target`.
///
/// Both trees must index the same reference; every suffix spelled by a leaf
/// of `other` is re-threaded into `target`, splitting shared prefixes as
/// needed. Suffixes already present are reconciled by the no-op path of
/// [`insert_suffix`].
pub fn merge_into<T: SuffixTreeMut, U: SuffixTree>(target: &mut T, other: &U) -> Result<()> {
    for suffix_start in other.leaf_suffixes()? {
        insert_suffix(target, suffix_start)?;
    }
    Ok(())
}
