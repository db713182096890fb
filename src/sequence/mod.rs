//! Sequence views and the nucleotide alphabet.
//!
//! The aligner treats a sequence as an ordered, indexable collection of
//! symbols over a fixed alphabet. This module provides that narrow interface:
//! alphabet validation, a symbol type wide enough to carry per-sequence
//! sentinel values, and [`ReferenceIndex`], the virtual concatenation of one
//! or more reference sequences used by the suffix tree.

/// The reserved gap byte used in aligned output.
pub const GAP: u8 = b'-';

/// One symbol of an indexed reference.
///
/// Values `0..=255` are sequence bytes; values `>= 256` are sentinel symbols
/// that terminate individual sequences inside a concatenated reference, one
/// distinct value per sequence so cross-sequence suffixes never collide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Symbol(pub u16);

impl Symbol {
    pub fn base(b: u8) -> Self {
        Symbol(b.to_ascii_uppercase() as u16)
    }

    pub fn sentinel(seq_index: usize) -> Self {
        Symbol(256 + seq_index as u16)
    }

    pub fn is_sentinel(&self) -> bool {
        self.0 >= 256
    }

    /// The sequence byte, or `None` for a sentinel.
    pub fn as_byte(&self) -> Option<u8> {
        if self.is_sentinel() {
            None
        } else {
            Some(self.0 as u8)
        }
    }
}

/// Whether a byte is a valid nucleotide symbol (IUPAC codes included).
pub fn is_nucleotide(b: u8) -> bool {
    matches!(
        b.to_ascii_uppercase(),
        b'A' | b'C'
            | b'G'
            | b'T'
            | b'U'
            | b'R'
            | b'Y'
            | b'S'
            | b'W'
            | b'K'
            | b'M'
            | b'B'
            | b'D'
            | b'H'
            | b'V'
            | b'N'
    )
}

/// Validate a sequence against the nucleotide alphabet.
///
/// Returns the position of the first invalid byte, or `None` if the whole
/// sequence is valid.
pub fn first_invalid_nucleotide(seq: &[u8]) -> Option<usize> {
    seq.iter().position(|&b| !is_nucleotide(b))
}

/// A virtual concatenation of reference sequences.
///
/// Sequences are stored uppercased. When more than one sequence is indexed,
/// a distinct sentinel symbol is placed after every sequence except the last,
/// so a suffix starting inside one sequence can never equal a suffix starting
/// inside another. Positions are global (into the concatenation); sentinel
/// positions carry no byte.
#[derive(Debug, Clone)]
pub struct ReferenceIndex {
    sequences: Vec<Vec<u8>>,
    /// Global start position of each sequence in the concatenation.
    starts: Vec<usize>,
    total: usize,
}

impl ReferenceIndex {
    pub fn new<S: AsRef<[u8]>>(sequences: &[S]) -> Self {
        let sequences: Vec<Vec<u8>> = sequences
            .iter()
            .map(|s| s.as_ref().to_ascii_uppercase())
            .collect();
        let mut starts = Vec::with_capacity(sequences.len());
        let mut pos = 0usize;
        for (i, s) in sequences.iter().enumerate() {
            starts.push(pos);
            pos += s.len();
            if i + 1 < sequences.len() {
                pos += 1; // sentinel slot
            }
        }
        Self {
            sequences,
            starts,
            total: pos,
        }
    }

    pub fn single<S: AsRef<[u8]>>(sequence: S) -> Self {
        Self::new(&[sequence])
    }

    /// Total length of the concatenation, sentinel slots included.
    pub fn len(&self) -> usize {
        self.total
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    pub fn sequence_count(&self) -> usize {
        self.sequences.len()
    }

    pub fn sequence(&self, index: usize) -> &[u8] {
        &self.sequences[index]
    }

    /// Symbol at a global position. `None` past the end.
    pub fn symbol_at(&self, pos: usize) -> Option<Symbol> {
        let (seq_index, local) = self.segment_of(pos)?;
        let seq = &self.sequences[seq_index];
        if local < seq.len() {
            Some(Symbol(seq[local] as u16))
        } else {
            Some(Symbol::sentinel(seq_index))
        }
    }

    /// Sequence byte at a global position. `None` for sentinels or past end.
    pub fn byte_at(&self, pos: usize) -> Option<u8> {
        self.symbol_at(pos).and_then(|s| s.as_byte())
    }

    /// Map a global position to `(sequence index, local offset)`.
    ///
    /// Sentinel positions map to `None`.
    pub fn locate(&self, pos: usize) -> Option<(usize, usize)> {
        let (seq_index, local) = self.segment_of(pos)?;
        if local < self.sequences[seq_index].len() {
            Some((seq_index, local))
        } else {
            None
        }
    }

    fn segment_of(&self, pos: usize) -> Option<(usize, usize)> {
        if pos >= self.total {
            return None;
        }
        // starts is sorted; find the last segment starting at or before pos
        let seq_index = match self.starts.binary_search(&pos) {
            Ok(i) => i,
            Err(i) => i - 1,
        };
        Some((seq_index, pos - self.starts[seq_index]))
    }
}
