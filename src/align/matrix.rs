//! Similarity scoring between sequence symbols.

use crate::sequence::is_nucleotide;

/// Pairwise symbol scoring used by the alignment engine.
///
/// Implementations must be cheap to call per matrix cell and usable from
/// worker threads during the blocked fill.
pub trait SimilarityMatrix: Sync {
    fn score(&self, a: u8, b: u8) -> i32;

    /// Whether a symbol has a defined row/column in this matrix.
    fn is_scorable(&self, symbol: u8) -> bool;

    /// Position of the first unscorable symbol, or `None` when the whole
    /// sequence can be scored.
    fn validate(&self, sequence: &[u8]) -> Option<usize> {
        sequence.iter().position(|&b| !self.is_scorable(b))
    }
}

/// Flat match/mismatch matrix over the nucleotide alphabet.
///
/// Symbols compare case-insensitively; the default scores follow the
/// EDNAFULL convention of +5 / -4.
#[derive(Debug, Clone, Copy)]
pub struct NucleotideMatrix {
    pub match_score: i32,
    pub mismatch_score: i32,
}

impl NucleotideMatrix {
    pub fn new(match_score: i32, mismatch_score: i32) -> Self {
        Self {
            match_score,
            mismatch_score,
        }
    }
}

impl Default for NucleotideMatrix {
    fn default() -> Self {
        Self::new(5, -4)
    }
}

impl SimilarityMatrix for NucleotideMatrix {
    fn score(&self, a: u8, b: u8) -> i32 {
        if a.eq_ignore_ascii_case(&b) {
            self.match_score
        } else {
            self.mismatch_score
        }
    }

    fn is_scorable(&self, symbol: u8) -> bool {
        is_nucleotide(symbol)
    }
}
