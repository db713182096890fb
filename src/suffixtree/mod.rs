//! Suffix-tree index over a reference.
//!
//! All suffixes of a [`ReferenceIndex`](crate::sequence::ReferenceIndex) are
//! arranged as a tree of edges labeled with `(start, end)` spans into the
//! reference (both inclusive, 0-based). Every internal node has at least two
//! children whose first symbols differ; every leaf-to-root path spells a
//! distinct suffix. A tree over a single sequence is implicit: no trailing
//! sentinel is appended, so a suffix that is also a prefix of a longer suffix
//! ends mid-edge instead of at a leaf. Sentinels appear only between
//! concatenated sequences.
//!
//! Three interchangeable backends implement the same logical contract:
//! [`SimpleSuffixTree`] (flat edge dictionary, single-shot workflows),
//! [`MultiWaySuffixTree`] (arena-backed, full mutation surface) and
//! [`PersistentSuffixTree`] (two-tier: arena plus an overflow
//! [`EdgeStorage`] once the edge count passes a threshold).

pub mod builder;
pub mod multiway;
pub mod persistent;
pub mod simple;
pub mod storage;

pub use builder::{build_multiway_tree, build_simple_tree, insert_suffix, merge_into};
pub use multiway::MultiWaySuffixTree;
pub use persistent::PersistentSuffixTree;
pub use simple::SimpleSuffixTree;
pub use storage::{EdgeRecord, EdgeStorage, FileEdgeStorage, MemoryEdgeStorage};

use crate::error::Result;
use crate::sequence::{ReferenceIndex, Symbol};

/// Handle to an edge in one of the two tiers.
///
/// `Memory` handles index an in-memory arena or dictionary; `Stored` handles
/// are byte positions in an overflow [`EdgeStorage`] and exist only in the
/// persistent backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdgeHandle {
    Memory(u64),
    Stored(u64),
}

/// One tree arc: a `(start, end)` span into the owning reference.
///
/// Child edges are owned by their parent edge; the parent back-reference is a
/// non-owning handle used only for upward traversal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    /// First reference position of the label (inclusive).
    pub start: usize,
    /// Last reference position of the label (inclusive).
    pub end: usize,
    /// Child edges, owned by this edge.
    pub children: Vec<EdgeHandle>,
    /// Non-owning back-reference for traversal.
    pub parent: Option<EdgeHandle>,
    /// For a leaf, the starting position of the suffix this leaf spells.
    pub suffix_start: Option<usize>,
}

impl Edge {
    /// The synthetic root edge with an empty label.
    pub fn root() -> Self {
        Edge {
            start: 1,
            end: 0,
            children: Vec::new(),
            parent: None,
            suffix_start: None,
        }
    }

    pub fn new(start: usize, end: usize, parent: EdgeHandle, suffix_start: Option<usize>) -> Self {
        Edge {
            start,
            end,
            children: Vec::new(),
            parent: Some(parent),
            suffix_start,
        }
    }

    /// Label length in symbols (zero for the root).
    pub fn len(&self) -> usize {
        self.end + 1 - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty() && self.suffix_start.is_some()
    }
}

/// Read-only contract shared by the three backends.
///
/// A built tree is read-only for match finding; concurrent queries against
/// the same tree are safe.
pub trait SuffixTree {
    fn reference(&self) -> &ReferenceIndex;

    fn root(&self) -> EdgeHandle;

    /// Materialize the edge behind a handle. For the persistent backend this
    /// may read from the overflow storage.
    fn edge(&self, handle: EdgeHandle) -> Result<Edge>;

    fn children(&self, handle: EdgeHandle) -> Result<Vec<EdgeHandle>>;

    /// Child of `parent` whose label starts with `symbol`, if any. Absence is
    /// an expected outcome, not an error.
    fn find(&self, parent: EdgeHandle, symbol: Symbol) -> Result<Option<EdgeHandle>> {
        for child in self.children(parent)? {
            let edge = self.edge(child)?;
            if self.reference().symbol_at(edge.start) == Some(symbol) {
                return Ok(Some(child));
            }
        }
        Ok(None)
    }

    /// Live edge count across all tiers, root included.
    fn count(&self) -> usize;

    /// Suffix start positions of every leaf, in depth-first order.
    fn leaf_suffixes(&self) -> Result<Vec<usize>> {
        let mut suffixes = Vec::new();
        let mut stack = vec![self.root()];
        while let Some(handle) = stack.pop() {
            let edge = self.edge(handle)?;
            if let (true, Some(suffix)) = (edge.children.is_empty(), edge.suffix_start) {
                suffixes.push(suffix);
            }
            stack.extend(edge.children.iter().rev().copied());
        }
        Ok(suffixes)
    }
}

/// Mutation contract of the multi-way and persistent backends.
///
/// Not safe for concurrent use against the same tree; callers serialize.
/// `split` with an offset outside `1..edge.len()` is a precondition violation
/// and panics.
pub trait SuffixTreeMut: SuffixTree {
    /// Create a new child edge under `parent` spanning `start..=end`.
    fn insert(
        &mut self,
        parent: EdgeHandle,
        start: usize,
        end: usize,
        suffix_start: Option<usize>,
    ) -> Result<EdgeHandle>;

    /// Unlink `child` (and its subtree) from `parent`. Returns `false` when
    /// `child` is not a child of `parent`.
    fn remove(&mut self, parent: EdgeHandle, child: EdgeHandle) -> Result<bool>;

    /// Replace `old_child` with `new_child` under `parent`. Returns `false`
    /// when `old_child` is not a child of `parent`.
    fn update(
        &mut self,
        parent: EdgeHandle,
        old_child: EdgeHandle,
        new_child: EdgeHandle,
    ) -> Result<bool>;

    /// Divide an edge after `split_offset` label symbols. The original handle
    /// keeps the first `split_offset` symbols; the returned new edge carries
    /// the remainder and the original children.
    fn split(&mut self, edge: EdgeHandle, split_offset: usize) -> Result<EdgeHandle>;

    fn add_child(&mut self, parent: EdgeHandle, child: EdgeHandle) -> Result<()>;

    fn replace_children(&mut self, parent: EdgeHandle, children: Vec<EdgeHandle>) -> Result<()>;

    fn clear_children(&mut self, parent: EdgeHandle) -> Result<()>;

    /// Update a leaf edge's end index in place (open-ended suffix during
    /// construction).
    fn set_end(&mut self, edge: EdgeHandle, end: usize) -> Result<()>;
}
