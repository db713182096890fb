//! Per-column consensus resolution.

use crate::sequence::GAP;

/// Resolves one aligned column (either symbol may be the gap byte) to a
/// single representative symbol.
pub trait ConsensusResolver: Sync {
    fn resolve(&self, a: u8, b: u8) -> u8;
}

/// Default resolver: matching symbols pass through, a gap defers to the
/// other symbol, and a mismatch becomes the IUPAC ambiguity code covering
/// both bases.
#[derive(Debug, Clone, Copy, Default)]
pub struct IupacResolver;

/// Nucleotide set encoded as an A/C/G/T bitmask.
fn mask(symbol: u8) -> u8 {
    match symbol.to_ascii_uppercase() {
        b'A' => 0b0001,
        b'C' => 0b0010,
        b'G' => 0b0100,
        b'T' | b'U' => 0b1000,
        b'M' => 0b0011,
        b'R' => 0b0101,
        b'W' => 0b1001,
        b'S' => 0b0110,
        b'Y' => 0b1010,
        b'K' => 0b1100,
        b'V' => 0b0111,
        b'H' => 0b1011,
        b'D' => 0b1101,
        b'B' => 0b1110,
        _ => 0b1111,
    }
}

fn code(mask: u8) -> u8 {
    match mask {
        0b0001 => b'A',
        0b0010 => b'C',
        0b0100 => b'G',
        0b1000 => b'T',
        0b0011 => b'M',
        0b0101 => b'R',
        0b1001 => b'W',
        0b0110 => b'S',
        0b1010 => b'Y',
        0b1100 => b'K',
        0b0111 => b'V',
        0b1011 => b'H',
        0b1101 => b'D',
        0b1110 => b'B',
        _ => b'N',
    }
}

impl ConsensusResolver for IupacResolver {
    fn resolve(&self, a: u8, b: u8) -> u8 {
        match (a, b) {
            (GAP, GAP) => GAP,
            (GAP, other) | (other, GAP) => other,
            (a, b) if a.eq_ignore_ascii_case(&b) => a.to_ascii_uppercase(),
            (a, b) => code(mask(a) | mask(b)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matching_symbols_pass_through() {
        assert_eq!(IupacResolver.resolve(b'A', b'a'), b'A');
    }

    #[test]
    fn test_mismatch_becomes_ambiguity_code() {
        assert_eq!(IupacResolver.resolve(b'A', b'G'), b'R');
        assert_eq!(IupacResolver.resolve(b'C', b'T'), b'Y');
        assert_eq!(IupacResolver.resolve(b'A', b'B'), b'N');
    }

    #[test]
    fn test_gap_defers_to_symbol() {
        assert_eq!(IupacResolver.resolve(GAP, b'C'), b'C');
        assert_eq!(IupacResolver.resolve(b'G', GAP), b'G');
        assert_eq!(IupacResolver.resolve(GAP, GAP), GAP);
    }
}
