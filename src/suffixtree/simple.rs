//! Flat-dictionary suffix tree for single-shot index-and-match workflows.

use rustc_hash::FxHashMap;

use super::{Edge, EdgeHandle, MultiWaySuffixTree, SuffixTree};
use crate::error::Result;
use crate::sequence::ReferenceIndex;

/// Ordinals disambiguate edges whose labels start at the same reference
/// position (an upper split half and an unrelated leaf can share one).
const ORDINAL_BITS: u64 = 20;

/// Suffix tree backed by a flat edge dictionary.
///
/// Edges are keyed by an integer derived from their label's start position
/// plus a per-start ordinal. The backend carries no mutation API: it is
/// produced fully built and is queried read-only.
#[derive(Debug)]
pub struct SimpleSuffixTree {
    reference: ReferenceIndex,
    edges: FxHashMap<u64, Edge>,
    root_key: u64,
}

impl SimpleSuffixTree {
    /// Build the suffix tree for a reference.
    pub fn build(reference: ReferenceIndex) -> Result<Self> {
        let source = MultiWaySuffixTree::build(reference.clone())?;
        Ok(Self::flatten(reference, &source))
    }

    fn key_for(start: usize, ordinals: &mut FxHashMap<usize, u64>) -> u64 {
        let ordinal = ordinals.entry(start).or_insert(0);
        let key = ((start as u64) << ORDINAL_BITS) | *ordinal;
        debug_assert!(*ordinal < 1 << ORDINAL_BITS);
        *ordinal += 1;
        key
    }

    fn flatten(reference: ReferenceIndex, source: &MultiWaySuffixTree) -> Self {
        let mut ordinals: FxHashMap<usize, u64> = FxHashMap::default();
        let mut key_of: FxHashMap<EdgeHandle, u64> = FxHashMap::default();

        // breadth-first so parents receive keys before their children
        let mut order = Vec::new();
        let mut queue = std::collections::VecDeque::from([source.root()]);
        while let Some(handle) = queue.pop_front() {
            let edge = source.edge(handle).expect("in-memory edge");
            key_of.insert(handle, Self::key_for(edge.start, &mut ordinals));
            queue.extend(edge.children.iter().copied());
            order.push((handle, edge));
        }

        let root_key = key_of[&source.root()];
        let mut edges = FxHashMap::default();
        for (handle, edge) in order {
            let translated = Edge {
                start: edge.start,
                end: edge.end,
                children: edge
                    .children
                    .iter()
                    .map(|c| EdgeHandle::Memory(key_of[c]))
                    .collect(),
                parent: edge.parent.map(|p| EdgeHandle::Memory(key_of[&p])),
                suffix_start: edge.suffix_start,
            };
            edges.insert(key_of[&handle], translated);
        }

        Self {
            reference,
            edges,
            root_key,
        }
    }

    fn lookup(&self, handle: EdgeHandle) -> &Edge {
        match handle {
            EdgeHandle::Memory(key) => self
                .edges
                .get(&key)
                .unwrap_or_else(|| panic!("unknown edge key {key}")),
            EdgeHandle::Stored(_) => panic!("simple suffix tree holds no stored edges"),
        }
    }
}

impl SuffixTree for SimpleSuffixTree {
    fn reference(&self) -> &ReferenceIndex {
        &self.reference
    }

    fn root(&self) -> EdgeHandle {
        EdgeHandle::Memory(self.root_key)
    }

    fn edge(&self, handle: EdgeHandle) -> Result<Edge> {
        Ok(self.lookup(handle).clone())
    }

    fn children(&self, handle: EdgeHandle) -> Result<Vec<EdgeHandle>> {
        Ok(self.lookup(handle).children.clone())
    }

    fn count(&self) -> usize {
        self.edges.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequence::Symbol;
    use crate::suffixtree::build_multiway_tree;

    #[test]
    fn test_matches_multiway_edge_count() {
        let reference = ReferenceIndex::single(b"GATTACA");
        let simple = SimpleSuffixTree::build(reference.clone()).unwrap();
        let multiway = build_multiway_tree(reference).unwrap();
        assert_eq!(simple.count(), multiway.count());
    }

    #[test]
    fn test_descent_from_root() {
        let tree = SimpleSuffixTree::build(ReferenceIndex::single(b"ACGTACGT")).unwrap();
        let child = tree.find(tree.root(), Symbol::base(b'A')).unwrap();
        assert!(child.is_some());
        let edge = tree.edge(child.unwrap()).unwrap();
        assert_eq!(tree.reference().byte_at(edge.start), Some(b'A'));
        assert_eq!(tree.find(tree.root(), Symbol::base(b'N')).unwrap(), None);
    }

    #[test]
    fn test_leaf_suffixes_cover_distinct_suffixes() {
        let tree = SimpleSuffixTree::build(ReferenceIndex::single(b"GATTACA")).unwrap();
        let mut suffixes = tree.leaf_suffixes().unwrap();
        suffixes.sort_unstable();
        suffixes.dedup();
        // "GATTACA": suffix "A" (pos 6) is a prefix of "ACA" (pos 4) and
        // stays implicit; all others end at leaves
        assert!(suffixes.len() >= 5);
        for &s in &suffixes {
            assert!(s < 7);
        }
    }
}
