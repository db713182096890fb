//! Anchored pairwise alignment of long nucleotide sequences.
//!
//! A reference is indexed into a suffix tree, queries are scanned for
//! maximal unique matches, the matches are reduced to co-linear anchors (or
//! clusters of anchors), and the stretches between anchors are closed with a
//! dynamic-programming aligner.

pub mod align;
pub mod anchor;
pub mod api;
pub mod commands;
pub mod error;
pub mod mum;
pub mod sequence;
pub mod suffixtree;

pub use align::{
    NeedlemanWunschAligner, PairwiseAligner, PairwiseOverlapAligner, PairwiseSequenceAlignment,
    SmithWatermanAligner,
};
pub use anchor::{get_longest_sequence, Cluster, ClusterBuilder};
pub use api::{Mummer, Nucmer};
pub use error::{Result, RummerError};
pub use mum::{find_matches, MaxUniqueMatch};
pub use suffixtree::{
    build_multiway_tree, build_simple_tree, MultiWaySuffixTree, PersistentSuffixTree,
    SimpleSuffixTree, SuffixTree, SuffixTreeMut,
};
