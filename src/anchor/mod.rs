//! Anchor selection over raw matches.
//!
//! Raw matches from the extractor overlap and cross; this module reduces them
//! to trusted anchors, either as one co-linear chain (longest increasing
//! subsequence) or as clusters of mutually consistent, well-separated matches
//! for multi-region alignment.

pub mod cluster;
pub mod lis;

pub use cluster::{Cluster, ClusterBuilder, MatchExtension};
pub use lis::get_longest_sequence;
