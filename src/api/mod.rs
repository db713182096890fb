//! Anchored-alignment orchestrators.
//!
//! [`Mummer`] produces one end-to-end alignment per query, anchored on the
//! longest co-linear chain of unique matches. [`Nucmer`] clusters the
//! matches instead and reports one alignment per cluster region.

pub mod mummer;
pub mod nucmer;

pub use mummer::Mummer;
pub use nucmer::Nucmer;

use crate::align::consensus::ConsensusResolver;
use crate::align::engine::{AlignmentEngine, AlignmentMode};
use crate::align::matrix::SimilarityMatrix;
use crate::align::result::PairwiseAlignedSequence;
use crate::error::{Result, RummerError};
use crate::mum::MaxUniqueMatch;
use crate::sequence::{first_invalid_nucleotide, GAP};

pub(crate) fn validate_nucleotides(label: &str, sequence: &[u8]) -> Result<()> {
    match first_invalid_nucleotide(sequence) {
        Some(position) => Err(RummerError::AlphabetMismatch(format!(
            "{} sequence holds non-nucleotide byte {:?} at position {}",
            label, sequence[position] as char, position
        ))),
        None => Ok(()),
    }
}

/// Shift anchor starts forward so consecutive anchors never overlap in
/// either coordinate; anchors consumed entirely by the shift are dropped.
pub(crate) fn trim_overlaps(anchors: &[MaxUniqueMatch]) -> Vec<MaxUniqueMatch> {
    let mut out: Vec<MaxUniqueMatch> = Vec::with_capacity(anchors.len());
    let mut reference_end = 0usize;
    let mut query_end = 0usize;
    for &anchor in anchors {
        let mut a = anchor;
        let shift = reference_end
            .saturating_sub(a.first_sequence_start)
            .max(query_end.saturating_sub(a.second_sequence_start));
        if shift >= a.length {
            continue;
        }
        a.first_sequence_start += shift;
        a.second_sequence_start += shift;
        a.length -= shift;
        reference_end = a.first_sequence_end();
        query_end = a.second_sequence_end();
        out.push(a);
    }
    out
}

/// Alternates exact anchor segments with DP-aligned gap segments into one
/// continuous aligned pair over a reference/query region.
pub(crate) struct Stitcher<'a, M: SimilarityMatrix, R: ConsensusResolver> {
    pub similarity_matrix: &'a M,
    pub consensus_resolver: &'a R,
    pub gap_open_cost: i32,
    pub gap_extension_cost: i32,
    pub parallel: bool,
    pub block_size: usize,
}

impl<'a, M: SimilarityMatrix, R: ConsensusResolver> Stitcher<'a, M, R> {
    /// Align `reference[reference_span]` against `query[query_span]`, pinned
    /// on `anchors` (absolute coordinates, co-linear, non-overlapping).
    pub fn align_region(
        &self,
        reference: &[u8],
        query: &[u8],
        anchors: &[MaxUniqueMatch],
        reference_span: (usize, usize),
        query_span: (usize, usize),
    ) -> Result<PairwiseAlignedSequence> {
        let mut first = Vec::new();
        let mut second = Vec::new();
        let mut score = 0i64;
        let mut reference_pos = reference_span.0;
        let mut query_pos = query_span.0;

        for anchor in anchors {
            self.fill_gap(
                &reference[reference_pos..anchor.first_sequence_start],
                &query[query_pos..anchor.second_sequence_start],
                &mut first,
                &mut second,
                &mut score,
            )?;
            let reference_segment =
                &reference[anchor.first_sequence_start..anchor.first_sequence_end()];
            let query_segment =
                &query[anchor.second_sequence_start..anchor.second_sequence_end()];
            first.extend_from_slice(reference_segment);
            second.extend_from_slice(query_segment);
            for (&r, &q) in reference_segment.iter().zip(query_segment) {
                score += self.similarity_matrix.score(r, q) as i64;
            }
            reference_pos = anchor.first_sequence_end();
            query_pos = anchor.second_sequence_end();
        }
        self.fill_gap(
            &reference[reference_pos..reference_span.1],
            &query[query_pos..query_span.1],
            &mut first,
            &mut second,
            &mut score,
        )?;

        let consensus = first
            .iter()
            .zip(&second)
            .map(|(&a, &b)| self.consensus_resolver.resolve(a, b))
            .collect();
        let insertions = [
            first.iter().filter(|&&b| b == GAP).count(),
            second.iter().filter(|&&b| b == GAP).count(),
        ];
        let first_offset = first.iter().take_while(|&&b| b == GAP).count();
        let second_offset = second.iter().take_while(|&&b| b == GAP).count();
        Ok(PairwiseAlignedSequence {
            first_sequence: first,
            second_sequence: second,
            consensus,
            score,
            first_offset,
            second_offset,
            start_offsets: [reference_span.0, query_span.0],
            end_offsets: [reference_span.1, query_span.1],
            insertions,
        })
    }

    /// Align the stretch between two anchors. One-sided stretches become a
    /// single gap run; two-sided stretches go through the DP engine.
    fn fill_gap(
        &self,
        reference_segment: &[u8],
        query_segment: &[u8],
        first: &mut Vec<u8>,
        second: &mut Vec<u8>,
        score: &mut i64,
    ) -> Result<()> {
        match (reference_segment.is_empty(), query_segment.is_empty()) {
            (true, true) => {}
            (false, true) => {
                first.extend_from_slice(reference_segment);
                second.extend(std::iter::repeat(GAP).take(reference_segment.len()));
                *score += gap_run_cost(
                    reference_segment.len(),
                    self.gap_open_cost,
                    self.gap_extension_cost,
                );
            }
            (true, false) => {
                first.extend(std::iter::repeat(GAP).take(query_segment.len()));
                second.extend_from_slice(query_segment);
                *score += gap_run_cost(
                    query_segment.len(),
                    self.gap_open_cost,
                    self.gap_extension_cost,
                );
            }
            (false, false) => {
                let engine = AlignmentEngine::new(
                    self.similarity_matrix,
                    self.gap_open_cost,
                    self.gap_extension_cost,
                    AlignmentMode::Global,
                );
                let outcome = if self.parallel {
                    engine.align_blocked(reference_segment, query_segment, self.block_size)?
                } else {
                    engine.align(reference_segment, query_segment)?
                };
                first.extend_from_slice(&outcome.first_aligned);
                second.extend_from_slice(&outcome.second_aligned);
                *score += outcome.score as i64;
            }
        }
        Ok(())
    }
}

fn gap_run_cost(length: usize, gap_open: i32, gap_extend: i32) -> i64 {
    gap_open as i64 + (length as i64 - 1) * gap_extend as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn m(first: usize, second: usize, length: usize) -> MaxUniqueMatch {
        MaxUniqueMatch {
            first_sequence_start: first,
            first_sequence_mum_order: 0,
            second_sequence_start: second,
            second_sequence_mum_order: 0,
            length,
        }
    }

    #[test]
    fn test_trim_overlaps_shifts_and_drops() {
        let anchors = [m(0, 0, 10), m(5, 8, 10), m(12, 14, 2)];
        let trimmed = trim_overlaps(&anchors);
        // second anchor loses its overlapping prefix, third is consumed
        assert_eq!(trimmed.len(), 2);
        assert_eq!(trimmed[0], m(0, 0, 10));
        assert_eq!(trimmed[1].first_sequence_start, 10);
        assert_eq!(trimmed[1].second_sequence_start, 13);
        assert_eq!(trimmed[1].length, 5);
    }

    #[test]
    fn test_validate_nucleotides_names_offender() {
        assert!(validate_nucleotides("query", b"ACGT").is_ok());
        let err = validate_nucleotides("query", b"AC1T").unwrap_err();
        assert!(err.to_string().contains("'1'"));
        assert!(err.to_string().contains("position 2"));
    }
}
