use thiserror::Error;

/// Errors surfaced by the core pipeline.
///
/// Absent children, empty match sets and empty cluster sets are not errors;
/// they are represented as `Option`/`false`/empty collections at the call
/// sites that produce them.
#[derive(Debug, Error)]
pub enum RummerError {
    /// The two sequences (or a sequence and the similarity matrix) do not
    /// agree on an alphabet.
    #[error("alphabet mismatch: {0}")]
    AlphabetMismatch(String),

    /// A symbol cannot be scored under the configured similarity matrix.
    #[error("symbol {symbol:?} at position {position} is not scorable under the similarity matrix")]
    UnscorableSymbol { symbol: char, position: usize },

    /// The full DP matrices for the requested alignment would exceed the
    /// configured memory limit. The dimensions are named so the caller can
    /// split the input or enable the blocked fill mode.
    #[error(
        "alignment matrix of {rows} x {cols} cells needs {required} bytes \
         (limit {limit}); split the input or enable the blocked fill mode"
    )]
    MatrixCapacity {
        rows: usize,
        cols: usize,
        required: u64,
        limit: u64,
    },

    /// An I/O failure from the persistent edge storage backend, propagated
    /// unchanged.
    #[error("suffix edge storage: {0}")]
    Storage(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, RummerError>;
