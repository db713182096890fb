//! End-to-end anchored alignment.

use rayon::prelude::*;

use crate::align::consensus::IupacResolver;
use crate::align::matrix::NucleotideMatrix;
use crate::align::result::PairwiseSequenceAlignment;
use crate::align::{DEFAULT_BLOCK_SIZE, DEFAULT_GAP_EXTENSION_COST, DEFAULT_GAP_OPEN_COST};
use crate::anchor::get_longest_sequence;
use crate::api::{trim_overlaps, validate_nucleotides, Stitcher};
use crate::error::Result;
use crate::mum::{find_matches, MaxUniqueMatch};
use crate::sequence::ReferenceIndex;
use crate::suffixtree::{build_multiway_tree, MultiWaySuffixTree};

/// Default minimum anchor length.
pub const DEFAULT_LENGTH_OF_MUM: usize = 20;

/// MUMmer-style aligner: one global alignment per query, anchored on the
/// longest co-linear chain of unique matches and gap-filled with the affine
/// DP engine.
#[derive(Debug, Clone)]
pub struct Mummer {
    pub length_of_mum: usize,
    pub similarity_matrix: NucleotideMatrix,
    pub consensus_resolver: IupacResolver,
    pub gap_open_cost: i32,
    pub gap_extension_cost: i32,
    /// Use the blocked wavefront-parallel fill for gap regions.
    pub parallel: bool,
    pub block_size: usize,
}

impl Default for Mummer {
    fn default() -> Self {
        Self {
            length_of_mum: DEFAULT_LENGTH_OF_MUM,
            similarity_matrix: NucleotideMatrix::default(),
            consensus_resolver: IupacResolver,
            gap_open_cost: DEFAULT_GAP_OPEN_COST,
            gap_extension_cost: DEFAULT_GAP_EXTENSION_COST,
            parallel: false,
            block_size: DEFAULT_BLOCK_SIZE,
        }
    }
}

impl Mummer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the reference index once for a batch of queries.
    pub fn build_tree(&self, reference: &[u8]) -> Result<MultiWaySuffixTree> {
        validate_nucleotides("reference", reference)?;
        build_multiway_tree(ReferenceIndex::single(reference))
    }

    /// All raw unique matches of `query`, at least `length_of_mum` long.
    pub fn find_matches(&self, reference: &[u8], query: &[u8]) -> Result<Vec<MaxUniqueMatch>> {
        let tree = self.build_tree(reference)?;
        validate_nucleotides("query", query)?;
        find_matches(&tree, query, self.length_of_mum)
    }

    /// The longest co-linear chain of unique matches.
    pub fn find_mums(&self, reference: &[u8], query: &[u8]) -> Result<Vec<MaxUniqueMatch>> {
        Ok(get_longest_sequence(&self.find_matches(reference, query)?))
    }

    /// Anchored global alignment of one query.
    pub fn align(&self, reference: &[u8], query: &[u8]) -> Result<PairwiseSequenceAlignment> {
        let tree = self.build_tree(reference)?;
        self.align_against(&tree, reference, query)
    }

    /// Anchored global alignments of many queries against one tree.
    pub fn align_batch(
        &self,
        reference: &[u8],
        queries: &[Vec<u8>],
    ) -> Result<Vec<PairwiseSequenceAlignment>> {
        let tree = self.build_tree(reference)?;
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
    ) -> Result<PairwiseSequenceAlignment> {
        validate_nucleotides("query", query)?;
        let matches = find_matches(tree, query, self.length_of_mum)?;
        let anchors = trim_overlaps(&get_longest_sequence(&matches));

        let stitcher = Stitcher {
            similarity_matrix: &self.similarity_matrix,
            consensus_resolver: &self.consensus_resolver,
            gap_open_cost: self.gap_open_cost,
            gap_extension_cost: self.gap_extension_cost,
            parallel: self.parallel,
            block_size: self.block_size,
        };
        let pair = stitcher.align_region(
            reference,
            query,
            &anchors,
            (0, reference.len()),
            (0, query.len()),
        )?;

        let mut alignment = PairwiseSequenceAlignment::new();
        alignment.push(pair);
        Ok(alignment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::align::result::score_aligned_columns;
    use crate::sequence::GAP;

    fn mummer(length_of_mum: usize) -> Mummer {
        Mummer {
            length_of_mum,
            similarity_matrix: NucleotideMatrix::new(1, -8),
            ..Mummer::default()
        }
    }

    fn ungapped(aligned: &[u8]) -> Vec<u8> {
        aligned.iter().copied().filter(|&b| b != GAP).collect()
    }

    #[test]
    fn test_identical_sequences_align_exactly() {
        let reference = b"ACGTACGTTGCATGCAATCG";
        let alignment = mummer(8).align(reference, reference).unwrap();
        let pair = &alignment.pairwise_aligned_sequences[0];
        assert_eq!(pair.first_sequence, reference);
        assert_eq!(pair.second_sequence, reference);
        assert_eq!(alignment.score(), reference.len() as i64);
        assert_eq!(pair.insertions, [0, 0]);
    }

    #[test]
    fn test_anchored_alignment_recovers_insertion() {
        // the query carries an extra block between two anchor regions
        let left = b"ACGGTCAGTCAATGCCA".to_vec();
        let right = b"TTGACGGATCACGGATT".to_vec();
        let reference: Vec<u8> = [left.clone(), right.clone()].concat();
        let query: Vec<u8> = [left.clone(), b"CCCCC".to_vec(), right.clone()].concat();

        let aligner = mummer(10);
        let alignment = aligner.align(&reference, &query).unwrap();
        let pair = &alignment.pairwise_aligned_sequences[0];
        // both inputs are reproduced in full
        assert_eq!(ungapped(&pair.first_sequence), reference);
        assert_eq!(ungapped(&pair.second_sequence), query);
        // the inserted block shows up as gaps in the reference row
        assert_eq!(pair.insertions[0], 5);
        assert_eq!(pair.insertions[1], 0);
        assert_eq!(
            score_aligned_columns(
                &pair.first_sequence,
                &pair.second_sequence,
                &aligner.similarity_matrix,
                aligner.gap_open_cost,
                aligner.gap_extension_cost,
            ),
            pair.score
        );
    }

    #[test]
    fn test_no_anchors_falls_back_to_plain_dp() {
        let alignment = mummer(8).align(b"ACGTAC", b"TACGTA").unwrap();
        let pair = &alignment.pairwise_aligned_sequences[0];
        assert_eq!(ungapped(&pair.first_sequence), b"ACGTAC");
        assert_eq!(ungapped(&pair.second_sequence), b"TACGTA");
    }

    #[test]
    fn test_find_mums_are_colinear() {
        let reference = b"ACGGTCAGTCAATGCCATTGACGGATCACGGATT";
        let query = b"ACGGTCAGTCAATGCCAGGGTTGACGGATCACGGATT";
        let mums = mummer(10).find_mums(reference, query).unwrap();
        assert!(!mums.is_empty());
        for pair in mums.windows(2) {
            assert!(pair[0].first_sequence_start < pair[1].first_sequence_start);
            assert!(pair[0].second_sequence_start < pair[1].second_sequence_start);
        }
    }

    #[test]
    fn test_batch_matches_single_calls() {
        let reference = b"ACGGTCAGTCAATGCCATTGACGGATCACGGATT".to_vec();
        let queries = vec![
            reference.clone(),
            b"ACGGTCAGTCAATGCCA".to_vec(),
            b"TTTTTTTT".to_vec(),
        ];
        let aligner = mummer(8);
        let batch = aligner.align_batch(&reference, &queries).unwrap();
        assert_eq!(batch.len(), queries.len());
        for (alignment, query) in batch.iter().zip(&queries) {
            assert_eq!(*alignment, aligner.align(&reference, query).unwrap());
        }
    }

    #[test]
    fn test_invalid_reference_is_rejected() {
        let err = mummer(8).align(b"ACZT", b"ACGT").unwrap_err();
        assert!(err.to_string().contains("reference"));
    }
}
