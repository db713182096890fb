//! Dynamic-programming fill engines.
//!
//! Both gap models share the same layout: the first sequence runs down the
//! rows, the second across the columns, and every cell records its traceback
//! byte. The affine model keeps three coupled scores per cell (match layer
//! plus one gap layer per direction); the linear model keeps one. Scores are
//! held as a rolling pair of rows, the traceback matrix is kept whole.

use log::warn;

use crate::align::matrix::SimilarityMatrix;
use crate::align::traceback::{self, E_EXTEND, F_EXTEND, H_DIAG, H_LEFT, H_STOP, H_UP};
use crate::error::{Result, RummerError};
use crate::sequence::GAP;

/// Sentinel low score; far enough from `i32::MIN` that gap arithmetic cannot
/// wrap.
pub(crate) const NEG_INF: i32 = i32::MIN / 2;

/// Upper bound on DP allocation per alignment call.
const MAX_MATRIX_BYTES: u64 = 2 << 30;

/// Boundary and extraction policy of the fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlignmentMode {
    /// End-to-end alignment (Needleman-Wunsch).
    Global,
    /// Best-scoring local segment, floored at zero (Smith-Waterman).
    Local,
    /// Free end gaps; the best cell on the last row or column wins.
    Overlap,
}

/// One filled-and-traced alignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlignmentOutcome {
    pub first_aligned: Vec<u8>,
    pub second_aligned: Vec<u8>,
    pub score: i32,
    /// Start positions in the original sequences (inclusive).
    pub first_start: usize,
    pub second_start: usize,
    /// End positions in the original sequences (exclusive).
    pub first_end: usize,
    pub second_end: usize,
    /// Gap symbols inserted into `[first, second]`.
    pub insertions: [usize; 2],
}

/// Three-layer scores and trace byte of one affine cell.
#[derive(Debug, Clone, Copy)]
pub(crate) struct CellUpdate {
    pub h: i32,
    pub e: i32,
    pub f: i32,
    pub trace: u8,
}

/// The affine recurrence for one cell. Tie-breaks are fixed here, once, for
/// every fill strategy: opening beats extending, diagonal beats the vertical
/// gap beats the horizontal gap.
#[inline]
pub(crate) fn affine_cell(
    substitution: i32,
    h_diag: i32,
    h_up: i32,
    e_up: i32,
    h_left: i32,
    f_left: i32,
    gap_open: i32,
    gap_extend: i32,
    floor_at_zero: bool,
) -> CellUpdate {
    let open_up = h_up.saturating_add(gap_open);
    let extend_up = e_up.saturating_add(gap_extend);
    let (e, e_flag) = if open_up >= extend_up {
        (open_up, 0)
    } else {
        (extend_up, E_EXTEND)
    };

    let open_left = h_left.saturating_add(gap_open);
    let extend_left = f_left.saturating_add(gap_extend);
    let (f, f_flag) = if open_left >= extend_left {
        (open_left, 0)
    } else {
        (extend_left, F_EXTEND)
    };

    let mut h = h_diag.saturating_add(substitution);
    let mut source = H_DIAG;
    if e > h {
        h = e;
        source = H_UP;
    }
    if f > h {
        h = f;
        source = H_LEFT;
    }
    if floor_at_zero && h <= 0 {
        h = 0;
        source = H_STOP;
    }

    CellUpdate {
        h,
        e,
        f,
        trace: source | e_flag | f_flag,
    }
}

/// Configured fill engine over one similarity matrix.
#[derive(Debug)]
pub struct AlignmentEngine<'a, M: SimilarityMatrix> {
    similarity: &'a M,
    gap_open: i32,
    gap_extend: i32,
    mode: AlignmentMode,
}

impl<'a, M: SimilarityMatrix> AlignmentEngine<'a, M> {
    /// Gap penalties follow the "at most zero" convention; positive values
    /// are honored but flagged as a likely misconfiguration.
    pub fn new(similarity: &'a M, gap_open: i32, gap_extend: i32, mode: AlignmentMode) -> Self {
        if gap_open > 0 || gap_extend > 0 {
            warn!(
                "positive gap penalty (open {}, extend {}) rewards gaps; proceeding as configured",
                gap_open, gap_extend
            );
        }
        Self {
            similarity,
            gap_open,
            gap_extend,
            mode,
        }
    }

    pub fn mode(&self) -> AlignmentMode {
        self.mode
    }

    pub(crate) fn similarity(&self) -> &M {
        self.similarity
    }

    pub(crate) fn penalties(&self) -> (i32, i32) {
        (self.gap_open, self.gap_extend)
    }

    /// Reject fills whose matrices would not fit in the allocation budget.
    pub(crate) fn ensure_capacity(
        &self,
        rows: usize,
        cols: usize,
        bytes_per_cell: u64,
    ) -> Result<()> {
        let required = (rows as u64 + 1)
            .checked_mul(cols as u64 + 1)
            .and_then(|cells| cells.checked_mul(bytes_per_cell))
            .unwrap_or(u64::MAX);
        if required > MAX_MATRIX_BYTES {
            return Err(RummerError::MatrixCapacity {
                rows,
                cols,
                required,
                limit: MAX_MATRIX_BYTES,
            });
        }
        Ok(())
    }

    /// Affine-gap alignment, sequential row-major fill.
    pub fn align(&self, first: &[u8], second: &[u8]) -> Result<AlignmentOutcome> {
        let (rows, cols) = (first.len(), second.len());
        // one trace byte plus two rolling rows of two i32 layers
        self.ensure_capacity(rows, cols, 1)?;

        let width = cols + 1;
        let mut trace = vec![H_STOP; (rows + 1) * width];
        let mut prev_h = vec![0i32; width];
        let mut prev_e = vec![NEG_INF; width];
        let mut cur_h = vec![0i32; width];
        let mut cur_e = vec![NEG_INF; width];

        self.init_top_row(&mut prev_h, &mut trace);
        let mut best = ExtractionState::new(self.mode);
        best.observe_row(0, rows, &prev_h);

        for i in 1..=rows {
            let (h0, trace0) = self.column_zero(i);
            cur_h[0] = h0;
            cur_e[0] = NEG_INF;
            trace[i * width] = trace0;
            let mut f_left = NEG_INF;

            for j in 1..=cols {
                let update = affine_cell(
                    self.similarity.score(first[i - 1], second[j - 1]),
                    prev_h[j - 1],
                    prev_h[j],
                    prev_e[j],
                    cur_h[j - 1],
                    f_left,
                    self.gap_open,
                    self.gap_extend,
                    self.mode == AlignmentMode::Local,
                );
                cur_h[j] = update.h;
                cur_e[j] = update.e;
                f_left = update.f;
                trace[i * width + j] = update.trace;
                best.observe_cell(i, j, update.h, cols);
            }

            best.observe_row(i, rows, &cur_h);
            std::mem::swap(&mut prev_h, &mut cur_h);
            std::mem::swap(&mut prev_e, &mut cur_e);
        }

        let (score, end) = best.finish(rows, cols, prev_h[cols]);
        Ok(assemble(&trace, width, first, second, score, end))
    }

    /// Linear-gap alignment: every gap symbol costs the open penalty. One
    /// score row is retained; the trace matrix is full.
    pub fn align_simple(&self, first: &[u8], second: &[u8]) -> Result<AlignmentOutcome> {
        let (rows, cols) = (first.len(), second.len());
        self.ensure_capacity(rows, cols, 1)?;
        let gap = self.gap_open;

        let width = cols + 1;
        let mut trace = vec![H_STOP; (rows + 1) * width];
        let mut prev = vec![0i32; width];
        let mut cur = vec![0i32; width];

        if self.mode == AlignmentMode::Global {
            for j in 1..=cols {
                prev[j] = gap.saturating_mul(j as i32);
                trace[j] = H_LEFT;
            }
        }
        let mut best = ExtractionState::new(self.mode);
        best.observe_row(0, rows, &prev);

        for i in 1..=rows {
            let (h0, trace0) = if self.mode == AlignmentMode::Global {
                (gap.saturating_mul(i as i32), H_UP)
            } else {
                (0, H_STOP)
            };
            cur[0] = h0;
            trace[i * width] = trace0;

            for j in 1..=cols {
                let diag = prev[j - 1]
                    .saturating_add(self.similarity.score(first[i - 1], second[j - 1]));
                let up = prev[j].saturating_add(gap);
                let left = cur[j - 1].saturating_add(gap);

                let mut h = diag;
                let mut source = H_DIAG;
                if up > h {
                    h = up;
                    source = H_UP;
                }
                if left > h {
                    h = left;
                    source = H_LEFT;
                }
                if self.mode == AlignmentMode::Local && h <= 0 {
                    h = 0;
                    source = H_STOP;
                }
                cur[j] = h;
                trace[i * width + j] = source;
                best.observe_cell(i, j, h, cols);
            }

            best.observe_row(i, rows, &cur);
            std::mem::swap(&mut prev, &mut cur);
        }

        let (score, end) = best.finish(rows, cols, prev[cols]);
        Ok(assemble(&trace, width, first, second, score, end))
    }

    pub(crate) fn init_top_row(&self, row: &mut [i32], trace: &mut [u8]) {
        if self.mode != AlignmentMode::Global {
            return;
        }
        for j in 1..row.len() {
            row[j] = self
                .gap_open
                .saturating_add(self.gap_extend.saturating_mul(j as i32 - 1));
            trace[j] = if j > 1 { H_LEFT | F_EXTEND } else { H_LEFT };
        }
    }

    pub(crate) fn column_zero(&self, i: usize) -> (i32, u8) {
        if self.mode == AlignmentMode::Global {
            let h = self
                .gap_open
                .saturating_add(self.gap_extend.saturating_mul(i as i32 - 1));
            (h, if i > 1 { H_UP | E_EXTEND } else { H_UP })
        } else {
            (0, H_STOP)
        }
    }
}

/// Tracks where the optimal score lives during the fill, per mode.
#[derive(Debug)]
pub(crate) struct ExtractionState {
    mode: AlignmentMode,
    best: i32,
    end: (usize, usize),
}

impl ExtractionState {
    pub(crate) fn new(mode: AlignmentMode) -> Self {
        Self {
            mode,
            best: match mode {
                AlignmentMode::Local => 0,
                _ => NEG_INF,
            },
            end: (0, 0),
        }
    }

    /// Inspect one interior cell (local mode tracks the global maximum).
    #[inline]
    pub(crate) fn observe_cell(&mut self, i: usize, j: usize, h: i32, _cols: usize) {
        if self.mode == AlignmentMode::Local && h > self.best {
            self.best = h;
            self.end = (i, j);
        }
    }

    /// Inspect a completed row (overlap mode watches the last column of
    /// every row and the whole last row).
    pub(crate) fn observe_row(&mut self, i: usize, rows: usize, row: &[i32]) {
        if self.mode != AlignmentMode::Overlap {
            return;
        }
        let cols = row.len() - 1;
        if h_beats(row[cols], self.best) {
            self.best = row[cols];
            self.end = (i, cols);
        }
        if i == rows {
            for (j, &h) in row.iter().enumerate() {
                if h_beats(h, self.best) {
                    self.best = h;
                    self.end = (i, j);
                }
            }
        }
    }

    pub(crate) fn finish(self, rows: usize, cols: usize, corner: i32) -> (i32, (usize, usize)) {
        match self.mode {
            AlignmentMode::Global => (corner, (rows, cols)),
            _ => (self.best, self.end),
        }
    }
}

#[inline]
fn h_beats(candidate: i32, best: i32) -> bool {
    candidate > best
}

/// Run the traceback and package the outcome.
pub(crate) fn assemble(
    trace: &[u8],
    width: usize,
    first: &[u8],
    second: &[u8],
    score: i32,
    end: (usize, usize),
) -> AlignmentOutcome {
    let walk = traceback::walk(trace, width, first, second, end);
    let insertions = [
        walk.first_aligned.iter().filter(|&&b| b == GAP).count(),
        walk.second_aligned.iter().filter(|&&b| b == GAP).count(),
    ];
    AlignmentOutcome {
        first_aligned: walk.first_aligned,
        second_aligned: walk.second_aligned,
        score,
        first_start: walk.start.0,
        second_start: walk.start.1,
        first_end: end.0,
        second_end: end.1,
        insertions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::align::matrix::NucleotideMatrix;
    use crate::align::result::score_aligned_columns;

    fn engine(matrix: &NucleotideMatrix, mode: AlignmentMode) -> AlignmentEngine<'_, NucleotideMatrix> {
        AlignmentEngine::new(matrix, -8, -1, mode)
    }

    #[test]
    fn test_global_identical_sequences() {
        let matrix = NucleotideMatrix::new(1, -8);
        let out = engine(&matrix, AlignmentMode::Global)
            .align(b"ACGTACGT", b"ACGTACGT")
            .unwrap();
        assert_eq!(out.score, 8);
        assert_eq!(out.first_aligned, b"ACGTACGT");
        assert_eq!(out.second_aligned, b"ACGTACGT");
        assert_eq!(out.insertions, [0, 0]);
    }

    #[test]
    fn test_global_single_deletion() {
        let matrix = NucleotideMatrix::new(1, -8);
        let out = engine(&matrix, AlignmentMode::Global)
            .align(b"ACGTTACG", b"ACGTACG")
            .unwrap();
        // 7 matches plus one opened gap
        assert_eq!(out.score, 7 - 8);
        assert_eq!(out.insertions, [0, 1]);
        assert_eq!(
            score_aligned_columns(&out.first_aligned, &out.second_aligned, &matrix, -8, -1),
            out.score as i64
        );
    }

    #[test]
    fn test_affine_prefers_one_long_gap() {
        // with open -8 / extend -1, one 3-long gap (-10) beats three spread
        // gaps (-24)
        let matrix = NucleotideMatrix::new(1, -8);
        let out = engine(&matrix, AlignmentMode::Global)
            .align(b"AAACCCGGGTTT", b"AAAGGGTTT")
            .unwrap();
        assert_eq!(out.score, 9 - 8 - 1 - 1);
        assert_eq!(out.insertions, [0, 3]);
        let gapped = String::from_utf8(out.second_aligned.clone()).unwrap();
        assert!(gapped.contains("---") && !gapped.contains("----"));
    }

    #[test]
    fn test_local_extracts_shared_core() {
        let matrix = NucleotideMatrix::new(2, -3);
        let out = AlignmentEngine::new(&matrix, -5, -2, AlignmentMode::Local)
            .align(b"TTTTACGTACGTTTT", b"GGGGACGTACGGGG")
            .unwrap();
        assert_eq!(out.first_aligned, b"ACGTACG");
        assert_eq!(out.second_aligned, b"ACGTACG");
        assert_eq!(out.score, 14);
        assert_eq!((out.first_start, out.first_end), (4, 11));
        assert_eq!((out.second_start, out.second_end), (4, 11));
    }

    #[test]
    fn test_local_with_nothing_positive_is_empty() {
        let matrix = NucleotideMatrix::new(1, -8);
        let out = engine(&matrix, AlignmentMode::Local)
            .align(b"AAAA", b"CCCC")
            .unwrap();
        assert!(out.first_aligned.is_empty());
        assert_eq!(out.score, 0);
    }

    #[test]
    fn test_overlap_free_end_gaps() {
        // suffix of the first overlaps the prefix of the second
        let matrix = NucleotideMatrix::new(1, -8);
        let out = engine(&matrix, AlignmentMode::Overlap)
            .align(b"TTTTACGT", b"ACGTCCCC")
            .unwrap();
        assert_eq!(out.first_aligned, b"ACGT");
        assert_eq!(out.second_aligned, b"ACGT");
        assert_eq!(out.score, 4);
        assert_eq!((out.first_start, out.first_end), (4, 8));
        assert_eq!((out.second_start, out.second_end), (0, 4));
    }

    #[test]
    fn test_linear_fill_charges_per_symbol() {
        let matrix = NucleotideMatrix::new(1, -2);
        let out = AlignmentEngine::new(&matrix, -3, 0, AlignmentMode::Global)
            .align_simple(b"AAACCCGGG", b"AAAGGG")
            .unwrap();
        // 6 matches, 3 gap symbols at -3 each
        assert_eq!(out.score, 6 - 9);
        assert_eq!(out.insertions, [0, 3]);
    }

    #[test]
    fn test_capacity_error_names_dimensions() {
        let matrix = NucleotideMatrix::default();
        let engine = engine(&matrix, AlignmentMode::Global);
        let err = engine.ensure_capacity(1 << 20, 1 << 20, 13).unwrap_err();
        match err {
            RummerError::MatrixCapacity {
                rows,
                cols,
                required,
                limit,
            } => {
                assert_eq!(rows, 1 << 20);
                assert_eq!(cols, 1 << 20);
                assert!(required > limit);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_score_matches_column_recomputation() {
        let matrix = NucleotideMatrix::new(1, -8);
        let out = engine(&matrix, AlignmentMode::Global)
            .align(b"ACGACTTACG", b"TACGATCCGGAAA")
            .unwrap();
        assert_eq!(
            score_aligned_columns(&out.first_aligned, &out.second_aligned, &matrix, -8, -1),
            out.score as i64
        );
        // the walk is deterministic
        let again = engine(&matrix, AlignmentMode::Global)
            .align(b"ACGACTTACG", b"TACGATCCGGAAA")
            .unwrap();
        assert_eq!(out, again);
    }
}
