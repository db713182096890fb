//! Blocked, wavefront-parallel affine fill.
//!
//! The matrix is cut into fixed-size blocks. A block depends only on its
//! upper and left neighbors, so all blocks on one anti-diagonal are
//! independent and fill in parallel; a barrier between anti-diagonals keeps
//! the dependency order. Cells are computed by the same recurrence as the
//! sequential fill, so the trace (and therefore the alignment) is identical
//! regardless of scheduling; only the full score matrices are retained to
//! serve as block boundaries.

use rayon::prelude::*;

use crate::align::engine::{
    affine_cell, assemble, AlignmentEngine, AlignmentMode, AlignmentOutcome, NEG_INF,
};
use crate::align::matrix::SimilarityMatrix;
use crate::align::traceback::H_STOP;
use crate::error::Result;

/// Default block edge length in cells.
pub const DEFAULT_BLOCK_SIZE: usize = 256;

/// Cell rows filled by one block, staged before stitching.
struct BlockResult {
    row_range: (usize, usize),
    col_range: (usize, usize),
    h: Vec<i32>,
    e: Vec<i32>,
    f: Vec<i32>,
    trace: Vec<u8>,
}

impl<'a, M: SimilarityMatrix> AlignmentEngine<'a, M> {
    /// Affine-gap alignment with the blocked parallel fill. Produces the
    /// same outcome as [`AlignmentEngine::align`].
    pub fn align_blocked(
        &self,
        first: &[u8],
        second: &[u8],
        block_size: usize,
    ) -> Result<AlignmentOutcome> {
        let (rows, cols) = (first.len(), second.len());
        // three full i32 layers plus the trace byte
        self.ensure_capacity(rows, cols, 13)?;
        let block_size = block_size.max(1);

        let width = cols + 1;
        let cells = (rows + 1) * width;
        let mut h = vec![0i32; cells];
        let mut e = vec![NEG_INF; cells];
        let mut f = vec![NEG_INF; cells];
        let mut trace = vec![H_STOP; cells];

        self.init_top_row(&mut h[..width], &mut trace[..width]);
        for i in 1..=rows {
            let (h0, trace0) = self.column_zero(i);
            h[i * width] = h0;
            trace[i * width] = trace0;
        }

        let block_rows = rows.div_ceil(block_size);
        let block_cols = cols.div_ceil(block_size);
        if block_rows > 0 && block_cols > 0 {
            for wave in 0..block_rows + block_cols - 1 {
                let lo = wave.saturating_sub(block_cols - 1);
                let hi = wave.min(block_rows - 1);
                let staged: Vec<BlockResult> = (lo..=hi)
                    .into_par_iter()
                    .map(|block_row| {
                        let block_col = wave - block_row;
                        self.fill_block(
                            first,
                            second,
                            &h,
                            &e,
                            &f,
                            block_row * block_size + 1,
                            ((block_row + 1) * block_size).min(rows),
                            block_col * block_size + 1,
                            ((block_col + 1) * block_size).min(cols),
                        )
                    })
                    .collect();
                for block in staged {
                    stitch(&mut h, &mut e, &mut f, &mut trace, width, block);
                }
            }
        }

        let (score, end) = extract(self.mode(), &h, width, rows, cols);
        Ok(assemble(&trace, width, first, second, score, end))
    }

    /// Fill one block from the already-complete boundary rows and columns of
    /// the global matrices.
    #[allow(clippy::too_many_arguments)]
    fn fill_block(
        &self,
        first: &[u8],
        second: &[u8],
        global_h: &[i32],
        global_e: &[i32],
        global_f: &[i32],
        row_start: usize,
        row_end: usize,
        col_start: usize,
        col_end: usize,
    ) -> BlockResult {
        let width = second.len() + 1;
        let local_cols = col_end - col_start + 1;
        let local_rows = row_end - row_start + 1;
        let mut h = vec![0i32; local_rows * local_cols];
        let mut e = vec![0i32; local_rows * local_cols];
        let mut f = vec![0i32; local_rows * local_cols];
        let mut trace = vec![H_STOP; local_rows * local_cols];
        let (gap_open, gap_extend) = self.penalties();
        let floor = self.mode() == AlignmentMode::Local;

        for i in row_start..=row_end {
            let li = i - row_start;
            for j in col_start..=col_end {
                let lj = j - col_start;
                // neighbors inside the block come from the local buffers,
                // the rest from the completed global boundary
                let h_diag = if li > 0 && lj > 0 {
                    h[(li - 1) * local_cols + lj - 1]
                } else {
                    global_h[(i - 1) * width + j - 1]
                };
                let (h_up, e_up) = if li > 0 {
                    let k = (li - 1) * local_cols + lj;
                    (h[k], e[k])
                } else {
                    let k = (i - 1) * width + j;
                    (global_h[k], global_e[k])
                };
                let (h_left, f_left) = if lj > 0 {
                    let k = li * local_cols + lj - 1;
                    (h[k], f[k])
                } else {
                    let k = i * width + j - 1;
                    (global_h[k], global_f[k])
                };

                let update = affine_cell(
                    self.similarity().score(first[i - 1], second[j - 1]),
                    h_diag,
                    h_up,
                    e_up,
                    h_left,
                    f_left,
                    gap_open,
                    gap_extend,
                    floor,
                );
                let k = li * local_cols + lj;
                h[k] = update.h;
                e[k] = update.e;
                f[k] = update.f;
                trace[k] = update.trace;
            }
        }

        BlockResult {
            row_range: (row_start, row_end),
            col_range: (col_start, col_end),
            h,
            e,
            f,
            trace,
        }
    }
}

fn stitch(
    h: &mut [i32],
    e: &mut [i32],
    f: &mut [i32],
    trace: &mut [u8],
    width: usize,
    block: BlockResult,
) {
    let (row_start, row_end) = block.row_range;
    let (col_start, col_end) = block.col_range;
    let local_cols = col_end - col_start + 1;
    for i in row_start..=row_end {
        let li = i - row_start;
        let local = li * local_cols..(li + 1) * local_cols;
        let global = i * width + col_start..i * width + col_end + 1;
        h[global.clone()].copy_from_slice(&block.h[local.clone()]);
        e[global.clone()].copy_from_slice(&block.e[local.clone()]);
        f[global.clone()].copy_from_slice(&block.f[local.clone()]);
        trace[global].copy_from_slice(&block.trace[local]);
    }
}

/// Pick the optimal cell from the completed score matrix, mirroring the
/// sequential fill's observation order so equal scores break the same way.
fn extract(mode: AlignmentMode, h: &[i32], width: usize, rows: usize, cols: usize) -> (i32, (usize, usize)) {
    match mode {
        AlignmentMode::Global => (h[rows * width + cols], (rows, cols)),
        AlignmentMode::Local => {
            let mut best = 0i32;
            let mut end = (0, 0);
            for i in 1..=rows {
                for j in 1..=cols {
                    if h[i * width + j] > best {
                        best = h[i * width + j];
                        end = (i, j);
                    }
                }
            }
            (best, end)
        }
        AlignmentMode::Overlap => {
            let mut best = NEG_INF;
            let mut end = (0, 0);
            for i in 0..=rows {
                if h[i * width + cols] > best {
                    best = h[i * width + cols];
                    end = (i, cols);
                }
            }
            for j in 0..=cols {
                if h[rows * width + j] > best {
                    best = h[rows * width + j];
                    end = (rows, j);
                }
            }
            (best, end)
        }
    }
}
