//! Arena-backed multi-way suffix tree with the full mutation surface.

use super::{Edge, EdgeHandle, SuffixTree, SuffixTreeMut};
use crate::error::Result;
use crate::sequence::ReferenceIndex;

/// In-memory multi-way suffix tree.
///
/// Edges live in a flat arena indexed by [`EdgeHandle::Memory`]; removal
/// unlinks a subtree and leaves its slots unreferenced, so `count()` tracks
/// live edges rather than arena length.
#[derive(Debug)]
pub struct MultiWaySuffixTree {
    reference: ReferenceIndex,
    arena: Vec<Edge>,
    live: usize,
}

impl MultiWaySuffixTree {
    /// An empty tree (root only) over a reference.
    pub fn new(reference: ReferenceIndex) -> Self {
        Self {
            reference,
            arena: vec![Edge::root()],
            live: 1,
        }
    }

    /// Build the complete suffix tree for a reference.
    pub fn build(reference: ReferenceIndex) -> Result<Self> {
        let mut tree = Self::new(reference);
        super::builder::build_into(&mut tree)?;
        Ok(tree)
    }

    /// Union another tree built over the same reference into this one.
    ///
    /// Every suffix the other tree spells is re-threaded under this tree's
    /// root, splitting shared prefixes as needed. Used to combine per-chunk
    /// trees for segmented references.
    pub fn merge(&mut self, other: &MultiWaySuffixTree) -> Result<()> {
        super::builder::merge_into(self, other)
    }

    /// Decompose into the raw arena (persistent backend staging).
    pub(crate) fn into_arena(self) -> Vec<Edge> {
        self.arena
    }

    fn index(handle: EdgeHandle) -> usize {
        match handle {
            EdgeHandle::Memory(i) => i as usize,
            EdgeHandle::Stored(_) => {
                panic!("multi-way suffix tree holds no stored edges")
            }
        }
    }

    fn edge_ref(&self, handle: EdgeHandle) -> &Edge {
        &self.arena[Self::index(handle)]
    }

    fn edge_mut(&mut self, handle: EdgeHandle) -> &mut Edge {
        &mut self.arena[Self::index(handle)]
    }

    fn subtree_size(&self, handle: EdgeHandle) -> usize {
        let mut size = 0;
        let mut stack = vec![handle];
        while let Some(h) = stack.pop() {
            size += 1;
            stack.extend(self.edge_ref(h).children.iter().copied());
        }
        size
    }
}

impl SuffixTree for MultiWaySuffixTree {
    fn reference(&self) -> &ReferenceIndex {
        &self.reference
    }

    fn root(&self) -> EdgeHandle {
        EdgeHandle::Memory(0)
    }

    fn edge(&self, handle: EdgeHandle) -> Result<Edge> {
        Ok(self.edge_ref(handle).clone())
    }

    fn children(&self, handle: EdgeHandle) -> Result<Vec<EdgeHandle>> {
        Ok(self.edge_ref(handle).children.clone())
    }

    fn count(&self) -> usize {
        self.live
    }
}

impl SuffixTreeMut for MultiWaySuffixTree {
    fn insert(
        &mut self,
        parent: EdgeHandle,
        start: usize,
        end: usize,
        suffix_start: Option<usize>,
    ) -> Result<EdgeHandle> {
        let handle = EdgeHandle::Memory(self.arena.len() as u64);
        self.arena.push(Edge::new(start, end, parent, suffix_start));
        self.edge_mut(parent).children.push(handle);
        self.live += 1;
        Ok(handle)
    }

    fn remove(&mut self, parent: EdgeHandle, child: EdgeHandle) -> Result<bool> {
        let children = &mut self.edge_mut(parent).children;
        match children.iter().position(|&c| c == child) {
            Some(pos) => {
                children.remove(pos);
                self.live -= self.subtree_size(child);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn update(
        &mut self,
        parent: EdgeHandle,
        old_child: EdgeHandle,
        new_child: EdgeHandle,
    ) -> Result<bool> {
        let children = &mut self.edge_mut(parent).children;
        match children.iter().position(|&c| c == old_child) {
            Some(pos) => {
                children[pos] = new_child;
                self.edge_mut(new_child).parent = Some(parent);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn split(&mut self, edge: EdgeHandle, split_offset: usize) -> Result<EdgeHandle> {
        let (start, end, len) = {
            let e = self.edge_ref(edge);
            (e.start, e.end, e.len())
        };
        if split_offset == 0 || split_offset >= len {
            panic!(
                "split offset {} outside edge span {}..={} (length {})",
                split_offset, start, end, len
            );
        }

        let lower_handle = EdgeHandle::Memory(self.arena.len() as u64);
        let (lower_children, lower_suffix) = {
            let upper = self.edge_mut(edge);
            let children = std::mem::take(&mut upper.children);
            let suffix = upper.suffix_start.take();
            upper.end = start + split_offset - 1;
            upper.children.push(lower_handle);
            (children, suffix)
        };
        for &child in &lower_children {
            self.edge_mut(child).parent = Some(lower_handle);
        }
        self.arena.push(Edge {
            start: start + split_offset,
            end,
            children: lower_children,
            parent: Some(edge),
            suffix_start: lower_suffix,
        });
        self.live += 1;
        Ok(lower_handle)
    }

    fn add_child(&mut self, parent: EdgeHandle, child: EdgeHandle) -> Result<()> {
        self.edge_mut(parent).children.push(child);
        self.edge_mut(child).parent = Some(parent);
        Ok(())
    }

    fn replace_children(&mut self, parent: EdgeHandle, children: Vec<EdgeHandle>) -> Result<()> {
        for &child in &children {
            self.edge_mut(child).parent = Some(parent);
        }
        self.edge_mut(parent).children = children;
        Ok(())
    }

    fn clear_children(&mut self, parent: EdgeHandle) -> Result<()> {
        self.edge_mut(parent).children.clear();
        Ok(())
    }

    fn set_end(&mut self, edge: EdgeHandle, end: usize) -> Result<()> {
        self.edge_mut(edge).end = end;
        Ok(())
    }
}
