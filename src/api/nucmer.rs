//! Cluster-based multi-region alignment.

use rayon::prelude::*;

use crate::align::consensus::IupacResolver;
use crate::align::matrix::NucleotideMatrix;
use crate::align::result::PairwiseSequenceAlignment;
use crate::align::{DEFAULT_BLOCK_SIZE, DEFAULT_GAP_EXTENSION_COST, DEFAULT_GAP_OPEN_COST};
use crate::anchor::{Cluster, ClusterBuilder};
use crate::api::mummer::DEFAULT_LENGTH_OF_MUM;
use crate::api::{trim_overlaps, validate_nucleotides, Stitcher};
use crate::error::Result;
use crate::mum::{find_matches, MaxUniqueMatch};
use crate::sequence::ReferenceIndex;
use crate::suffixtree::{build_multiway_tree, MultiWaySuffixTree};

/// NUCmer-style aligner: unique matches are grouped into clusters under the
/// separation policy, and every cluster region is aligned independently.
/// Queries matching the reference in several places yield one alignment per
/// place.
#[derive(Debug, Clone)]
pub struct Nucmer {
    pub length_of_mum: usize,
    pub minimum_score: usize,
    pub maximum_separation: usize,
    pub fixed_separation: usize,
    pub separation_factor: f64,
    pub similarity_matrix: NucleotideMatrix,
    pub consensus_resolver: IupacResolver,
    pub gap_open_cost: i32,
    pub gap_extension_cost: i32,
    pub parallel: bool,
    pub block_size: usize,
}

impl Default for Nucmer {
    fn default() -> Self {
        let policy = ClusterBuilder::default();
        Self {
            length_of_mum: DEFAULT_LENGTH_OF_MUM,
            minimum_score: policy.minimum_score,
            maximum_separation: policy.maximum_separation,
            fixed_separation: policy.fixed_separation,
            separation_factor: policy.separation_factor,
            similarity_matrix: NucleotideMatrix::default(),
            consensus_resolver: IupacResolver,
            gap_open_cost: DEFAULT_GAP_OPEN_COST,
            gap_extension_cost: DEFAULT_GAP_EXTENSION_COST,
            parallel: false,
            block_size: DEFAULT_BLOCK_SIZE,
        }
    }
}

impl Nucmer {
    pub fn new() -> Self {
        Self::default()
    }

    fn cluster_builder(&self) -> ClusterBuilder {
        ClusterBuilder {
            minimum_score: self.minimum_score,
            maximum_separation: self.maximum_separation,
            fixed_separation: self.fixed_separation,
            separation_factor: self.separation_factor,
        }
    }

    /// Clusters of matches for one query. Zero clusters is a valid outcome.
    pub fn find_clusters(&self, reference: &[u8], query: &[u8]) -> Result<Vec<Cluster>> {
        validate_nucleotides("reference", reference)?;
        validate_nucleotides("query", query)?;
        let tree = build_multiway_tree(ReferenceIndex::single(reference))?;
        let matches = find_matches(&tree, query, self.length_of_mum)?;
        Ok(self.cluster_builder().build_clusters(&matches))
    }

    /// One anchored alignment per cluster region.
    pub fn align(&self, reference: &[u8], query: &[u8]) -> Result<Vec<PairwiseSequenceAlignment>> {
        validate_nucleotides("reference", reference)?;
        let tree = build_multiway_tree(ReferenceIndex::single(reference))?;
        self.align_against(&tree, reference, query)
    }

    /// Cluster alignments for many queries against one tree, in input order.
    pub fn align_batch(
        &self,
        reference: &[u8],
        queries: &[Vec<u8>],
    ) -> Result<Vec<Vec<PairwiseSequenceAlignment>>> {
        validate_nucleotides("reference", reference)?;
        let tree = build_multiway_tree(ReferenceIndex::single(reference))?;
        queries
            .par_iter()
            .map(|query| self.align_against(&tree, reference, query))
            .collect()
    }

    fn align_against(
        &self,
        tree: &MultiWaySuffixTree,
        reference: &[u8],
        query: &[u8],
    ) -> Result<Vec<PairwiseSequenceAlignment>> {
        validate_nucleotides("query", query)?;
        let matches = find_matches(tree, query, self.length_of_mum)?;
        let clusters = self.cluster_builder().build_clusters(&matches);

        let stitcher = Stitcher {
            similarity_matrix: &self.similarity_matrix,
            consensus_resolver: &self.consensus_resolver,
            gap_open_cost: self.gap_open_cost,
            gap_extension_cost: self.gap_extension_cost,
            parallel: self.parallel,
            block_size: self.block_size,
        };

        let mut alignments = Vec::with_capacity(clusters.len());
        for cluster in &clusters {
            let anchors: Vec<MaxUniqueMatch> =
                cluster.matches.iter().map(|m| m.mum).collect();
            let anchors = trim_overlaps(&anchors);
            let Some((head, tail)) = anchors.first().zip(anchors.last()) else {
                continue;
            };
            let pair = stitcher.align_region(
                reference,
                query,
                &anchors,
                (head.first_sequence_start, tail.first_sequence_end()),
                (head.second_sequence_start, tail.second_sequence_end()),
            )?;
            let mut alignment = PairwiseSequenceAlignment::new();
            alignment.push(pair);
            alignments.push(alignment);
        }
        Ok(alignments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequence::GAP;

    fn nucmer(length_of_mum: usize, minimum_score: usize) -> Nucmer {
        Nucmer {
            length_of_mum,
            minimum_score,
            similarity_matrix: NucleotideMatrix::new(1, -8),
            ..Nucmer::default()
        }
    }

    fn ungapped(aligned: &[u8]) -> Vec<u8> {
        aligned.iter().copied().filter(|&b| b != GAP).collect()
    }

    #[test]
    fn test_single_region_yields_one_alignment() {
        let reference = b"ACGGTCAGTCAATGCCATTG";
        let alignments = nucmer(10, 15).align(reference, reference).unwrap();
        assert_eq!(alignments.len(), 1);
        let pair = &alignments[0].pairwise_aligned_sequences[0];
        assert_eq!(pair.first_sequence, reference);
        assert_eq!(pair.start_offsets, [0, 0]);
        assert_eq!(pair.end_offsets, [reference.len(), reference.len()]);
    }

    #[test]
    fn test_distant_regions_yield_separate_clusters() {
        // two shared blocks far apart in the query
        let block_a = b"ACGGTCAGTCAATGCCA".to_vec();
        let block_b = b"TTGACGGATCACGTCCA".to_vec();
        let spacer = b"G".repeat(40);
        let reference: Vec<u8> = [block_a.clone(), block_b.clone()].concat();
        let query: Vec<u8> = [block_a.clone(), spacer, block_b.clone()].concat();

        let aligner = Nucmer {
            maximum_separation: 10,
            fixed_separation: 5,
            ..nucmer(10, 15)
        };
        let alignments = aligner.align(&reference, &query).unwrap();
        assert_eq!(alignments.len(), 2);
        let first = &alignments[0].pairwise_aligned_sequences[0];
        let second = &alignments[1].pairwise_aligned_sequences[0];
        assert_eq!(ungapped(&first.first_sequence), block_a);
        assert_eq!(ungapped(&second.first_sequence), block_b);
        assert_eq!(second.start_offsets, [block_a.len(), block_a.len() + 40]);
    }

    #[test]
    fn test_minimum_score_filters_out_weak_clusters() {
        let reference = b"ACGGTCAGTCAATGCCATTG";
        let alignments = nucmer(10, 500).align(reference, reference).unwrap();
        assert!(alignments.is_empty());
    }

    #[test]
    fn test_batch_preserves_query_order() {
        let reference = b"ACGGTCAGTCAATGCCATTG".to_vec();
        let queries = vec![reference.clone(), b"TTTTTTTTTTTT".to_vec()];
        let batch = nucmer(10, 15).align_batch(&reference, &queries).unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0].len(), 1);
        assert!(batch[1].is_empty());
    }
}
