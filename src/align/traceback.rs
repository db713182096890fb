//! Traceback over filled direction matrices.
//!
//! Each cell carries one byte: two bits for the source of the best score
//! (stop, diagonal, gap up, gap left) and one flag per gap matrix recording
//! whether the gap was extended rather than opened. The walk starts at the
//! optimal cell and follows sources until a stop, emitting both aligned
//! sequences with the reserved gap byte.

use crate::sequence::GAP;

/// No source; traceback ends here.
pub const H_STOP: u8 = 0;
/// Best score came from the diagonal neighbor (match or mismatch).
pub const H_DIAG: u8 = 1;
/// Best score came from the vertical gap matrix (gap in the second sequence).
pub const H_UP: u8 = 2;
/// Best score came from the horizontal gap matrix (gap in the first sequence).
pub const H_LEFT: u8 = 3;

const H_MASK: u8 = 0b11;
/// The vertical gap at this cell extends the one above it.
pub const E_EXTEND: u8 = 1 << 2;
/// The horizontal gap at this cell extends the one to its left.
pub const F_EXTEND: u8 = 1 << 3;

/// Aligned pair reconstructed by a traceback walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Traceback {
    pub first_aligned: Vec<u8>,
    pub second_aligned: Vec<u8>,
    /// Cell at which the walk stopped, in matrix coordinates.
    pub start: (usize, usize),
}

/// Walk the direction matrix from `end` back to a stop.
///
/// `trace` is row-major over `(first.len() + 1) x (second.len() + 1)` cells.
pub fn walk(trace: &[u8], cols: usize, first: &[u8], second: &[u8], end: (usize, usize)) -> Traceback {
    let at = |i: usize, j: usize| trace[i * cols + j];
    let (mut i, mut j) = end;
    let mut first_aligned = Vec::new();
    let mut second_aligned = Vec::new();

    loop {
        match at(i, j) & H_MASK {
            H_STOP => break,
            H_DIAG => {
                first_aligned.push(first[i - 1]);
                second_aligned.push(second[j - 1]);
                i -= 1;
                j -= 1;
            }
            H_UP => loop {
                first_aligned.push(first[i - 1]);
                second_aligned.push(GAP);
                let extended = at(i, j) & E_EXTEND != 0;
                i -= 1;
                if !extended {
                    break;
                }
            },
            _ => loop {
                first_aligned.push(GAP);
                second_aligned.push(second[j - 1]);
                let extended = at(i, j) & F_EXTEND != 0;
                j -= 1;
                if !extended {
                    break;
                }
            },
        }
    }

    first_aligned.reverse();
    second_aligned.reverse();
    Traceback {
        first_aligned,
        second_aligned,
        start: (i, j),
    }
}
