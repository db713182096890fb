//! Alignment result types.

use crate::align::matrix::SimilarityMatrix;
use crate::sequence::GAP;

/// One aligned pair with its consensus and bookkeeping offsets.
///
/// `first_offset`/`second_offset` count the alignment columns before the
/// first non-gap symbol of the respective sequence; `start_offsets` and
/// `end_offsets` are `[first, second]` positions in the original, ungapped
/// coordinates (ends exclusive); `insertions` counts the gap symbols
/// introduced into `[first, second]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairwiseAlignedSequence {
    pub first_sequence: Vec<u8>,
    pub second_sequence: Vec<u8>,
    pub consensus: Vec<u8>,
    pub score: i64,
    pub first_offset: usize,
    pub second_offset: usize,
    pub start_offsets: [usize; 2],
    pub end_offsets: [usize; 2],
    pub insertions: [usize; 2],
}

impl PairwiseAlignedSequence {
    /// Number of alignment columns.
    pub fn len(&self) -> usize {
        self.first_sequence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.first_sequence.is_empty()
    }
}

/// A set of aligned pairs produced by one alignment invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PairwiseSequenceAlignment {
    pub pairwise_aligned_sequences: Vec<PairwiseAlignedSequence>,
}

impl PairwiseSequenceAlignment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, aligned: PairwiseAlignedSequence) {
        self.pairwise_aligned_sequences.push(aligned);
    }

    /// Aggregate score over all aligned pairs.
    pub fn score(&self) -> i64 {
        self.pairwise_aligned_sequences.iter().map(|p| p.score).sum()
    }

    pub fn len(&self) -> usize {
        self.pairwise_aligned_sequences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairwise_aligned_sequences.is_empty()
    }
}

/// Independently rescore an aligned pair column by column under affine gap
/// costs: a gap run of length L costs `gap_open + (L - 1) * gap_extend`.
pub fn score_aligned_columns<M: SimilarityMatrix>(
    first: &[u8],
    second: &[u8],
    matrix: &M,
    gap_open: i32,
    gap_extend: i32,
) -> i64 {
    debug_assert_eq!(first.len(), second.len());
    let mut score = 0i64;
    let mut in_first_gap = false;
    let mut in_second_gap = false;
    for (&a, &b) in first.iter().zip(second) {
        match (a == GAP, b == GAP) {
            (false, false) => {
                score += matrix.score(a, b) as i64;
                in_first_gap = false;
                in_second_gap = false;
            }
            (true, false) => {
                score += if in_first_gap { gap_extend } else { gap_open } as i64;
                in_first_gap = true;
                in_second_gap = false;
            }
            (false, true) => {
                score += if in_second_gap { gap_extend } else { gap_open } as i64;
                in_second_gap = true;
                in_first_gap = false;
            }
            (true, true) => debug_assert!(false, "gap aligned to gap"),
        }
    }
    score
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::align::matrix::NucleotideMatrix;

    #[test]
    fn test_column_rescoring_with_gap_runs() {
        let matrix = NucleotideMatrix::new(1, -8);
        let first = b"ACG-T".to_vec();
        let second = b"ACGTT".to_vec();
        // 3 matches + open + 1 match
        assert_eq!(
            score_aligned_columns(&first, &second, &matrix, -8, -1),
            3 + (-8) + 1
        );
        // a longer run pays open once then extends
        let first = b"A---T".to_vec();
        let second = b"ACGTT".to_vec();
        assert_eq!(
            score_aligned_columns(&first, &second, &matrix, -8, -1),
            1 + (-8) + (-1) + (-1) + 1
        );
    }

    #[test]
    fn test_alignment_score_aggregates_pairs() {
        let mut alignment = PairwiseSequenceAlignment::new();
        for score in [10i64, -3, 5] {
            alignment.push(PairwiseAlignedSequence {
                first_sequence: Vec::new(),
                second_sequence: Vec::new(),
                consensus: Vec::new(),
                score,
                first_offset: 0,
                second_offset: 0,
                start_offsets: [0, 0],
                end_offsets: [0, 0],
                insertions: [0, 0],
            });
        }
        assert_eq!(alignment.score(), 12);
        assert_eq!(alignment.len(), 3);
    }
}
