//! Two-tier suffix tree: a bounded in-memory arena plus overflow storage.
//!
//! The tree is staged fully in memory, then every edge past the persistence
//! threshold is spilled to an [`EdgeStorage`] backend. Spilling walks the
//! arena breadth-first, so the retained tier is the root and the shallowest
//! edges; a spilled edge only ever references other spilled edges as
//! children. Storage is append-only: mutating a stored edge writes a
//! superseding record and rebinds the parent's child handle.

use std::collections::VecDeque;
use std::sync::Mutex;

use rustc_hash::FxHashMap;

use super::storage::{EdgeRecord, EdgeStorage};
use super::{Edge, EdgeHandle, MultiWaySuffixTree, SuffixTree, SuffixTreeMut};
use crate::error::Result;
use crate::sequence::ReferenceIndex;

/// Suffix tree that keeps at most `threshold` edges in memory and spills the
/// rest to an [`EdgeStorage`] backend.
///
/// The root always stays in memory; `threshold` is clamped to at least 1.
/// Stored records carry no parent field, so the tree keeps a side map from
/// live storage positions to parent handles.
#[derive(Debug)]
pub struct PersistentSuffixTree<S: EdgeStorage> {
    reference: ReferenceIndex,
    arena: Vec<Edge>,
    arena_live: usize,
    threshold: usize,
    storage: Mutex<S>,
    stored_parents: FxHashMap<u64, EdgeHandle>,
    stored_live: usize,
}

impl<S: EdgeStorage> PersistentSuffixTree<S> {
    /// Build the full suffix tree for a reference, spilling every edge past
    /// `threshold` into `storage`.
    pub fn build(reference: ReferenceIndex, threshold: usize, storage: S) -> Result<Self> {
        let staging = MultiWaySuffixTree::build(reference.clone())?;
        Self::spill(reference, staging, threshold, storage)
    }

    /// An empty tree (root only). Inserts overflow into `storage` once the
    /// arena reaches `threshold`.
    pub fn new(reference: ReferenceIndex, threshold: usize, storage: S) -> Self {
        Self {
            reference,
            arena: vec![Edge::root()],
            arena_live: 1,
            threshold: threshold.max(1),
            storage: Mutex::new(storage),
            stored_parents: FxHashMap::default(),
            stored_live: 0,
        }
    }

    fn spill(
        reference: ReferenceIndex,
        staging: MultiWaySuffixTree,
        threshold: usize,
        storage: S,
    ) -> Result<Self> {
        let threshold = threshold.max(1);
        let staging = staging.into_arena();

        // breadth-first order from the root; the kept tier is a prefix of it
        let mut order = Vec::with_capacity(staging.len());
        let mut queue = VecDeque::from([0usize]);
        while let Some(index) = queue.pop_front() {
            order.push(index);
            queue.extend(staging[index].children.iter().map(|&c| staging_index(c)));
        }

        let keep_len = order.len().min(threshold);
        let (keep, overflow) = order.split_at(keep_len);
        let mut translated: FxHashMap<usize, EdgeHandle> = keep
            .iter()
            .enumerate()
            .map(|(new, &old)| (old, EdgeHandle::Memory(new as u64)))
            .collect();

        // deepest-first so every child handle is assigned before its parent's
        // record is written
        let mut storage = storage;
        for &old in overflow.iter().rev() {
            let edge = &staging[old];
            let record = EdgeRecord {
                start: edge.start,
                end: edge.end,
                suffix_start: edge.suffix_start,
                children: edge
                    .children
                    .iter()
                    .map(|&c| translated[&staging_index(c)])
                    .collect(),
            };
            let position = storage.write(&record)?;
            translated.insert(old, EdgeHandle::Stored(position));
        }

        let mut arena = Vec::with_capacity(keep_len);
        for &old in keep {
            let edge = &staging[old];
            arena.push(Edge {
                start: edge.start,
                end: edge.end,
                children: edge
                    .children
                    .iter()
                    .map(|&c| translated[&staging_index(c)])
                    .collect(),
                parent: edge.parent.map(|p| translated[&staging_index(p)]),
                suffix_start: edge.suffix_start,
            });
        }

        let mut stored_parents = FxHashMap::default();
        for &old in overflow {
            let EdgeHandle::Stored(position) = translated[&old] else {
                unreachable!("overflow edges translate to stored handles");
            };
            let parent = staging[old].parent.expect("spilled edge is not the root");
            stored_parents.insert(position, translated[&staging_index(parent)]);
        }

        Ok(Self {
            reference,
            arena,
            arena_live: keep_len,
            threshold,
            storage: Mutex::new(storage),
            stored_live: overflow.len(),
            stored_parents,
        })
    }

    /// Live edges held in the in-memory tier.
    pub fn in_memory_count(&self) -> usize {
        self.arena_live
    }

    /// Live edges held in the storage tier.
    pub fn stored_count(&self) -> usize {
        self.stored_live
    }

    /// Storage positions of all live stored edges, unordered.
    pub fn stored_positions(&self) -> Vec<u64> {
        self.stored_parents.keys().copied().collect()
    }

    /// The overflow storage backend.
    pub fn storage(&self) -> &Mutex<S> {
        &self.storage
    }

    fn arena_full(&self) -> bool {
        self.arena.len() >= self.threshold
    }

    fn read_stored(&self, position: u64) -> Result<EdgeRecord> {
        let mut storage = self.storage.lock().expect("storage lock poisoned");
        Ok(storage.read(position)?)
    }

    fn write_stored(&self, record: &EdgeRecord) -> Result<u64> {
        let mut storage = self.storage.lock().expect("storage lock poisoned");
        Ok(storage.write(record)?)
    }

    fn set_parent(&mut self, child: EdgeHandle, parent: EdgeHandle) {
        match child {
            EdgeHandle::Memory(i) => self.arena[i as usize].parent = Some(parent),
            EdgeHandle::Stored(position) => {
                self.stored_parents.insert(position, parent);
            }
        }
    }

    /// Append a superseding record for the edge at `old_position` and rebind
    /// every reference to it. Returns the new handle.
    fn supersede(&mut self, old_position: u64, record: EdgeRecord) -> Result<EdgeHandle> {
        let new_position = self.write_stored(&record)?;
        let handle = EdgeHandle::Stored(new_position);

        let parent = self
            .stored_parents
            .remove(&old_position)
            .expect("live stored edge has a parent binding");
        self.stored_parents.insert(new_position, parent);
        for &child in &record.children {
            self.set_parent(child, handle);
        }

        let rebound =
            self.replace_in_parent(parent, EdgeHandle::Stored(old_position), handle)?;
        debug_assert!(rebound, "superseded edge present under its parent");
        Ok(handle)
    }

    fn replace_in_parent(
        &mut self,
        parent: EdgeHandle,
        old_child: EdgeHandle,
        new_child: EdgeHandle,
    ) -> Result<bool> {
        match parent {
            EdgeHandle::Memory(i) => {
                let children = &mut self.arena[i as usize].children;
                match children.iter().position(|&c| c == old_child) {
                    Some(slot) => {
                        children[slot] = new_child;
                        Ok(true)
                    }
                    None => Ok(false),
                }
            }
            EdgeHandle::Stored(position) => {
                let mut record = self.read_stored(position)?;
                match record.children.iter().position(|&c| c == old_child) {
                    Some(slot) => {
                        record.children[slot] = new_child;
                        self.supersede(position, record)?;
                        Ok(true)
                    }
                    None => Ok(false),
                }
            }
        }
    }

    fn attach_child(&mut self, parent: EdgeHandle, child: EdgeHandle) -> Result<()> {
        match parent {
            EdgeHandle::Memory(i) => {
                self.arena[i as usize].children.push(child);
                Ok(())
            }
            EdgeHandle::Stored(position) => {
                let mut record = self.read_stored(position)?;
                record.children.push(child);
                self.supersede(position, record)?;
                Ok(())
            }
        }
    }

    fn release_subtree(&mut self, handle: EdgeHandle) -> Result<()> {
        let mut stack = vec![handle];
        while let Some(h) = stack.pop() {
            match h {
                EdgeHandle::Memory(_) => self.arena_live -= 1,
                EdgeHandle::Stored(position) => {
                    self.stored_live -= 1;
                    self.stored_parents.remove(&position);
                }
            }
            stack.extend(self.edge(h)?.children);
        }
        Ok(())
    }
}

impl<S: EdgeStorage> SuffixTree for PersistentSuffixTree<S> {
    fn reference(&self) -> &ReferenceIndex {
        &self.reference
    }

    fn root(&self) -> EdgeHandle {
        EdgeHandle::Memory(0)
    }

    fn edge(&self, handle: EdgeHandle) -> Result<Edge> {
        match handle {
            EdgeHandle::Memory(i) => Ok(self.arena[i as usize].clone()),
            EdgeHandle::Stored(position) => {
                let record = self.read_stored(position)?;
                Ok(Edge {
                    start: record.start,
                    end: record.end,
                    children: record.children,
                    parent: self.stored_parents.get(&position).copied(),
                    suffix_start: record.suffix_start,
                })
            }
        }
    }

    fn children(&self, handle: EdgeHandle) -> Result<Vec<EdgeHandle>> {
        Ok(self.edge(handle)?.children)
    }

    fn count(&self) -> usize {
        self.arena_live + self.stored_live
    }
}

impl<S: EdgeStorage> SuffixTreeMut for PersistentSuffixTree<S> {
    fn insert(
        &mut self,
        parent: EdgeHandle,
        start: usize,
        end: usize,
        suffix_start: Option<usize>,
    ) -> Result<EdgeHandle> {
        let handle = if self.arena_full() {
            let position = self.write_stored(&EdgeRecord {
                start,
                end,
                suffix_start,
                children: Vec::new(),
            })?;
            self.stored_live += 1;
            self.stored_parents.insert(position, parent);
            EdgeHandle::Stored(position)
        } else {
            let handle = EdgeHandle::Memory(self.arena.len() as u64);
            self.arena.push(Edge::new(start, end, parent, suffix_start));
            self.arena_live += 1;
            handle
        };
        self.attach_child(parent, handle)?;
        Ok(handle)
    }

    fn remove(&mut self, parent: EdgeHandle, child: EdgeHandle) -> Result<bool> {
        let detached = match parent {
            EdgeHandle::Memory(i) => {
                let children = &mut self.arena[i as usize].children;
                match children.iter().position(|&c| c == child) {
                    Some(slot) => {
                        children.remove(slot);
                        true
                    }
                    None => false,
                }
            }
            EdgeHandle::Stored(position) => {
                let mut record = self.read_stored(position)?;
                match record.children.iter().position(|&c| c == child) {
                    Some(slot) => {
                        record.children.remove(slot);
                        self.supersede(position, record)?;
                        true
                    }
                    None => false,
                }
            }
        };
        if detached {
            self.release_subtree(child)?;
        }
        Ok(detached)
    }

    fn update(
        &mut self,
        parent: EdgeHandle,
        old_child: EdgeHandle,
        new_child: EdgeHandle,
    ) -> Result<bool> {
        let rebound = self.replace_in_parent(parent, old_child, new_child)?;
        if rebound {
            // a stored parent was superseded above and already re-parented
            // its children; a memory parent keeps its handle
            if let EdgeHandle::Memory(_) = parent {
                self.set_parent(new_child, parent);
            }
        }
        Ok(rebound)
    }

    fn split(&mut self, edge: EdgeHandle, split_offset: usize) -> Result<EdgeHandle> {
        let upper = self.edge(edge)?;
        let (start, end, len) = (upper.start, upper.end, upper.len());
        if split_offset == 0 || split_offset >= len {
            panic!(
                "split offset {} outside edge span {}..={} (length {})",
                split_offset, start, end, len
            );
        }

        match edge {
            EdgeHandle::Memory(i) => {
                let lower_children = upper.children;
                let lower_suffix = upper.suffix_start;

                let lower = if self.arena_full() {
                    let position = self.write_stored(&EdgeRecord {
                        start: start + split_offset,
                        end,
                        suffix_start: lower_suffix,
                        children: lower_children.clone(),
                    })?;
                    self.stored_live += 1;
                    self.stored_parents.insert(position, edge);
                    EdgeHandle::Stored(position)
                } else {
                    let handle = EdgeHandle::Memory(self.arena.len() as u64);
                    self.arena.push(Edge {
                        start: start + split_offset,
                        end,
                        children: lower_children.clone(),
                        parent: Some(edge),
                        suffix_start: lower_suffix,
                    });
                    self.arena_live += 1;
                    handle
                };

                for &child in &lower_children {
                    self.set_parent(child, lower);
                }
                let e = &mut self.arena[i as usize];
                e.end = start + split_offset - 1;
                e.suffix_start = None;
                e.children = vec![lower];
                Ok(lower)
            }
            EdgeHandle::Stored(position) => {
                let lower_position = self.write_stored(&EdgeRecord {
                    start: start + split_offset,
                    end,
                    suffix_start: upper.suffix_start,
                    children: upper.children.clone(),
                })?;
                self.stored_live += 1;
                let lower = EdgeHandle::Stored(lower_position);
                for &child in &upper.children {
                    self.set_parent(child, lower);
                }
                // superseding the upper half re-parents the lower record and
                // rebinds the grandparent
                self.supersede(
                    position,
                    EdgeRecord {
                        start,
                        end: start + split_offset - 1,
                        suffix_start: None,
                        children: vec![lower],
                    },
                )?;
                Ok(lower)
            }
        }
    }

    fn add_child(&mut self, parent: EdgeHandle, child: EdgeHandle) -> Result<()> {
        self.attach_child(parent, child)?;
        if let EdgeHandle::Memory(_) = parent {
            self.set_parent(child, parent);
        }
        Ok(())
    }

    fn replace_children(&mut self, parent: EdgeHandle, children: Vec<EdgeHandle>) -> Result<()> {
        match parent {
            EdgeHandle::Memory(i) => {
                for &child in &children {
                    self.set_parent(child, parent);
                }
                self.arena[i as usize].children = children;
                Ok(())
            }
            EdgeHandle::Stored(position) => {
                let mut record = self.read_stored(position)?;
                record.children = children;
                self.supersede(position, record)?;
                Ok(())
            }
        }
    }

    fn clear_children(&mut self, parent: EdgeHandle) -> Result<()> {
        self.replace_children(parent, Vec::new())
    }

    fn set_end(&mut self, edge: EdgeHandle, end: usize) -> Result<()> {
        match edge {
            EdgeHandle::Memory(i) => {
                self.arena[i as usize].end = end;
                Ok(())
            }
            EdgeHandle::Stored(position) => {
                let mut record = self.read_stored(position)?;
                record.end = end;
                self.supersede(position, record)?;
                Ok(())
            }
        }
    }
}

fn staging_index(handle: EdgeHandle) -> usize {
    match handle {
        EdgeHandle::Memory(i) => i as usize,
        EdgeHandle::Stored(_) => unreachable!("staging tree holds no stored edges"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequence::Symbol;
    use crate::suffixtree::storage::{FileEdgeStorage, MemoryEdgeStorage};
    use crate::suffixtree::{build_multiway_tree, insert_suffix};

    fn spells<T: SuffixTree>(tree: &T, text: &[u8]) -> bool {
        let mut node = tree.root();
        let mut i = 0;
        while i < text.len() {
            let Ok(Some(handle)) = tree.find(node, Symbol::base(text[i])) else {
                return false;
            };
            let edge = tree.edge(handle).unwrap();
            for offset in 0..edge.len() {
                if i == text.len() {
                    return true;
                }
                if tree.reference().symbol_at(edge.start + offset) != Some(Symbol::base(text[i])) {
                    return false;
                }
                i += 1;
            }
            node = handle;
        }
        true
    }

    #[test]
    fn test_overflow_lands_in_storage() {
        let reference = ReferenceIndex::single(b"GATTACA");
        let total = build_multiway_tree(reference.clone()).unwrap().count();
        let threshold = 5;
        assert!(total > threshold);

        let tree =
            PersistentSuffixTree::build(reference, threshold, MemoryEdgeStorage::new()).unwrap();
        assert_eq!(tree.count(), total);
        assert_eq!(tree.in_memory_count(), threshold);
        assert_eq!(tree.stored_count(), total - threshold);

        // every overflow edge is retrievable only through the storage backend
        let positions = tree.stored_positions();
        assert_eq!(positions.len(), total - threshold);
        for position in positions {
            let record = tree
                .storage()
                .lock()
                .unwrap()
                .read(position)
                .unwrap();
            assert!(record.end + 1 - record.start >= 1);
        }
    }

    #[test]
    fn test_descent_crosses_tiers() {
        let seq = b"ACGTACGTTGCAAC";
        let tree = PersistentSuffixTree::build(
            ReferenceIndex::single(seq),
            4,
            MemoryEdgeStorage::new(),
        )
        .unwrap();
        for i in 0..seq.len() {
            assert!(spells(&tree, &seq[i..]), "suffix at {} not findable", i);
        }
    }

    #[test]
    fn test_matches_in_memory_backend() {
        let seq = b"GATTACAGATC";
        let reference = ReferenceIndex::single(seq);
        let multiway = build_multiway_tree(reference.clone()).unwrap();
        let tree =
            PersistentSuffixTree::build(reference, 6, MemoryEdgeStorage::new()).unwrap();
        assert_eq!(tree.count(), multiway.count());
        let mut stored = tree.leaf_suffixes().unwrap();
        let mut arena = multiway.leaf_suffixes().unwrap();
        stored.sort_unstable();
        arena.sort_unstable();
        assert_eq!(stored, arena);
    }

    #[test]
    fn test_file_backed_tree() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileEdgeStorage::create(dir.path().join("edges.bin")).unwrap();
        let seq = b"ACGTTGCAACGT";
        let tree = PersistentSuffixTree::build(ReferenceIndex::single(seq), 3, storage).unwrap();
        assert_eq!(tree.in_memory_count(), 3);
        for i in 0..seq.len() {
            assert!(spells(&tree, &seq[i..]));
        }
    }

    #[test]
    fn test_incremental_insert_past_threshold() {
        let seq = b"ACGTTGCAAC";
        let reference = ReferenceIndex::single(seq);
        let mut tree = PersistentSuffixTree::new(reference.clone(), 4, MemoryEdgeStorage::new());
        for i in 0..seq.len() {
            insert_suffix(&mut tree, i).unwrap();
        }
        let expected = build_multiway_tree(reference).unwrap().count();
        assert_eq!(tree.count(), expected);
        assert_eq!(tree.in_memory_count(), 4);
        for i in 0..seq.len() {
            assert!(spells(&tree, &seq[i..]), "suffix at {} not findable", i);
        }
    }

    #[test]
    fn test_remove_stored_subtree() {
        let seq = b"GATTACA";
        let tree_count = build_multiway_tree(ReferenceIndex::single(seq)).unwrap().count();
        let mut tree = PersistentSuffixTree::build(
            ReferenceIndex::single(seq),
            2,
            MemoryEdgeStorage::new(),
        )
        .unwrap();

        // detach the first child of the root along with its subtree
        let root = tree.root();
        let child = tree.children(root).unwrap()[0];
        assert!(tree.remove(root, child).unwrap());
        assert!(tree.count() < tree_count);
        assert!(!tree.remove(root, child).unwrap());
    }

    #[test]
    fn test_threshold_clamped_to_keep_root() {
        let tree = PersistentSuffixTree::build(
            ReferenceIndex::single(b"ACGT"),
            0,
            MemoryEdgeStorage::new(),
        )
        .unwrap();
        assert_eq!(tree.in_memory_count(), 1);
        assert!(spells(&tree, b"ACGT"));
    }
}
