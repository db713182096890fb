//! The three named aligners over the shared fill engine.

use rayon::prelude::*;

use crate::align::consensus::{ConsensusResolver, IupacResolver};
use crate::align::engine::{AlignmentEngine, AlignmentMode, AlignmentOutcome};
use crate::align::matrix::{NucleotideMatrix, SimilarityMatrix};
use crate::align::result::{PairwiseAlignedSequence, PairwiseSequenceAlignment};
use crate::error::{Result, RummerError};
use crate::sequence::GAP;

/// Default affine penalties, at-most-zero convention.
pub const DEFAULT_GAP_OPEN_COST: i32 = -8;
pub const DEFAULT_GAP_EXTENSION_COST: i32 = -1;

/// A configured pairwise alignment algorithm.
///
/// `align` uses the affine gap model; `align_simple` the linear one, charging
/// the open cost per gap symbol. Both validate the inputs against the
/// similarity matrix before filling.
pub trait PairwiseAligner {
    fn align(&self, first: &[u8], second: &[u8]) -> Result<PairwiseSequenceAlignment>;

    fn align_simple(&self, first: &[u8], second: &[u8]) -> Result<PairwiseSequenceAlignment>;

    /// Align a list of pairs, one alignment per pair, in input order.
    fn align_list(&self, pairs: &[(Vec<u8>, Vec<u8>)]) -> Result<Vec<PairwiseSequenceAlignment>>
    where
        Self: Sync,
    {
        pairs
            .par_iter()
            .map(|(first, second)| self.align(first, second))
            .collect()
    }
}

macro_rules! aligner {
    ($(#[$doc:meta])* $name:ident, $mode:expr) => {
        $(#[$doc])*
        #[derive(Debug, Clone)]
        pub struct $name<M: SimilarityMatrix = NucleotideMatrix, R: ConsensusResolver = IupacResolver> {
            pub similarity_matrix: M,
            pub consensus_resolver: R,
            pub gap_open_cost: i32,
            pub gap_extension_cost: i32,
            /// Use the blocked wavefront-parallel fill.
            pub parallel: bool,
            pub block_size: usize,
        }

        impl Default for $name {
            fn default() -> Self {
                Self::with_matrix(NucleotideMatrix::default(), IupacResolver)
            }
        }

        impl $name {
            pub fn new() -> Self {
                Self::default()
            }
        }

        impl<M: SimilarityMatrix, R: ConsensusResolver> $name<M, R> {
            pub fn with_matrix(similarity_matrix: M, consensus_resolver: R) -> Self {
                Self {
                    similarity_matrix,
                    consensus_resolver,
                    gap_open_cost: DEFAULT_GAP_OPEN_COST,
                    gap_extension_cost: DEFAULT_GAP_EXTENSION_COST,
                    parallel: false,
                    block_size: crate::align::blocked::DEFAULT_BLOCK_SIZE,
                }
            }
        }

        impl<M: SimilarityMatrix, R: ConsensusResolver> PairwiseAligner for $name<M, R> {
            fn align(&self, first: &[u8], second: &[u8]) -> Result<PairwiseSequenceAlignment> {
                validate(&self.similarity_matrix, first)?;
                validate(&self.similarity_matrix, second)?;
                let engine = AlignmentEngine::new(
                    &self.similarity_matrix,
                    self.gap_open_cost,
                    self.gap_extension_cost,
                    $mode,
                );
                let outcome = if self.parallel {
                    engine.align_blocked(first, second, self.block_size)?
                } else {
                    engine.align(first, second)?
                };
                Ok(package(outcome, &self.consensus_resolver))
            }

            fn align_simple(&self, first: &[u8], second: &[u8]) -> Result<PairwiseSequenceAlignment> {
                validate(&self.similarity_matrix, first)?;
                validate(&self.similarity_matrix, second)?;
                let engine = AlignmentEngine::new(
                    &self.similarity_matrix,
                    self.gap_open_cost,
                    self.gap_extension_cost,
                    $mode,
                );
                Ok(package(engine.align_simple(first, second)?, &self.consensus_resolver))
            }
        }
    };
}

aligner!(
    /// Global (end-to-end) aligner.
    NeedlemanWunschAligner,
    AlignmentMode::Global
);
aligner!(
    /// Local aligner; reports the best-scoring segment.
    SmithWatermanAligner,
    AlignmentMode::Local
);
aligner!(
    /// Free-end-gap aligner for overlapping sequence ends.
    PairwiseOverlapAligner,
    AlignmentMode::Overlap
);

fn validate<M: SimilarityMatrix>(matrix: &M, sequence: &[u8]) -> Result<()> {
    match matrix.validate(sequence) {
        Some(position) => Err(RummerError::UnscorableSymbol {
            symbol: sequence[position] as char,
            position,
        }),
        None => Ok(()),
    }
}

fn package<R: ConsensusResolver>(
    outcome: AlignmentOutcome,
    resolver: &R,
) -> PairwiseSequenceAlignment {
    let consensus: Vec<u8> = outcome
        .first_aligned
        .iter()
        .zip(&outcome.second_aligned)
        .map(|(&a, &b)| resolver.resolve(a, b))
        .collect();
    let first_offset = outcome
        .first_aligned
        .iter()
        .take_while(|&&b| b == GAP)
        .count();
    let second_offset = outcome
        .second_aligned
        .iter()
        .take_while(|&&b| b == GAP)
        .count();

    let mut alignment = PairwiseSequenceAlignment::new();
    alignment.push(PairwiseAlignedSequence {
        consensus,
        score: outcome.score as i64,
        first_offset,
        second_offset,
        start_offsets: [outcome.first_start, outcome.second_start],
        end_offsets: [outcome.first_end, outcome.second_end],
        insertions: outcome.insertions,
        first_sequence: outcome.first_aligned,
        second_sequence: outcome.second_aligned,
    });
    alignment
}
