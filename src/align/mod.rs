//! Pairwise dynamic-programming alignment.
//!
//! One fill engine serves three boundary policies (global, local, overlap)
//! in two gap models (linear and affine), with an opt-in blocked parallel
//! fill for large matrices. Aligners validate their inputs, run the fill and
//! traceback, and package aligned pairs with a consensus.

pub mod aligners;
pub mod blocked;
pub mod consensus;
pub mod engine;
pub mod matrix;
pub mod result;
pub mod traceback;

pub use aligners::{
    NeedlemanWunschAligner, PairwiseAligner, PairwiseOverlapAligner, SmithWatermanAligner,
    DEFAULT_GAP_EXTENSION_COST, DEFAULT_GAP_OPEN_COST,
};
pub use blocked::DEFAULT_BLOCK_SIZE;
pub use consensus::{ConsensusResolver, IupacResolver};
pub use engine::{AlignmentEngine, AlignmentMode, AlignmentOutcome};
pub use matrix::{NucleotideMatrix, SimilarityMatrix};
pub use result::{score_aligned_columns, PairwiseAlignedSequence, PairwiseSequenceAlignment};
