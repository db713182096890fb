//! Maximal unique match extraction.
//!
//! The query is scanned left to right. At each position the tree is descended
//! as far as the query allows; a match is emitted when the descent is long
//! enough, lands on or inside a leaf edge (the matched span occurs once in
//! the reference as a suffix prefix) and cannot be extended to the left.
//! Overlapping raw matches are expected and left for the anchor selector.

use crate::error::Result;
use crate::sequence::Symbol;
use crate::suffixtree::SuffixTree;

/// A maximal exact match between the reference and a query, unique in the
/// reference.
///
/// Positions are 0-based; `first_sequence_start` is global into the
/// reference concatenation. The two `*_mum_order` fields are 1-based ranks of
/// this match among all matches of the same query, ordered by reference and
/// by query position respectively.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaxUniqueMatch {
    pub first_sequence_start: usize,
    pub first_sequence_mum_order: usize,
    pub second_sequence_start: usize,
    pub second_sequence_mum_order: usize,
    pub length: usize,
}

impl MaxUniqueMatch {
    /// Reference position one past the last matched symbol.
    pub fn first_sequence_end(&self) -> usize {
        self.first_sequence_start + self.length
    }

    /// Query position one past the last matched symbol.
    pub fn second_sequence_end(&self) -> usize {
        self.second_sequence_start + self.length
    }
}

/// Find all maximal unique matches of `query` against a built tree, at least
/// `min_length` long. Zero matches is a valid outcome.
pub fn find_matches<T: SuffixTree>(
    tree: &T,
    query: &[u8],
    min_length: usize,
) -> Result<Vec<MaxUniqueMatch>> {
    let min_length = min_length.max(1);
    let mut matches = Vec::new();

    for query_start in 0..query.len() {
        if let Some((reference_start, length)) = descend(tree, query, query_start)? {
            if length < min_length {
                continue;
            }
            // left-maximality: a match preceded by the same symbol on both
            // sides is contained in the match found one position earlier
            if query_start > 0
                && reference_start > 0
                && tree.reference().byte_at(reference_start - 1)
                    == Some(query[query_start - 1].to_ascii_uppercase())
            {
                continue;
            }
            matches.push(MaxUniqueMatch {
                first_sequence_start: reference_start,
                first_sequence_mum_order: 0,
                second_sequence_start: query_start,
                second_sequence_mum_order: matches.len() + 1,
                length,
            });
        }
    }

    assign_reference_order(&mut matches);
    Ok(matches)
}

/// Descend from the root along `query[query_start..]` as far as symbols
/// match. Returns the reference start and length of the matched span when the
/// descent ends on or inside a leaf edge; `None` when the span occurs more
/// than once in the reference or matches nothing.
fn descend<T: SuffixTree>(
    tree: &T,
    query: &[u8],
    query_start: usize,
) -> Result<Option<(usize, usize)>> {
    let reference = tree.reference();
    let mut node = tree.root();
    let mut matched = 0usize;

    loop {
        let Some(&byte) = query.get(query_start + matched) else {
            return Ok(None);
        };
        let Some(handle) = tree.find(node, Symbol::base(byte))? else {
            return Ok(None);
        };

        let edge = tree.edge(handle)?;
        let mut in_edge = 1;
        while in_edge < edge.len() {
            let Some(&next) = query.get(query_start + matched + in_edge) else {
                break;
            };
            if reference.symbol_at(edge.start + in_edge) != Some(Symbol::base(next)) {
                break;
            }
            in_edge += 1;
        }
        matched += in_edge;

        if in_edge < edge.len() {
            // descent stops inside this edge; unique iff the edge is a leaf
            return Ok(if edge.is_leaf() {
                Some((edge.start + in_edge - matched, matched))
            } else {
                None
            });
        }
        if edge.is_leaf() {
            // consumed the whole leaf label
            return Ok(Some((edge.start + in_edge - matched, matched)));
        }
        node = handle;
    }
}

/// Rank matches 1-based by reference start.
fn assign_reference_order(matches: &mut [MaxUniqueMatch]) {
    let mut by_reference: Vec<usize> = (0..matches.len()).collect();
    by_reference.sort_by_key(|&i| matches[i].first_sequence_start);
    for (rank, index) in by_reference.into_iter().enumerate() {
        matches[index].first_sequence_mum_order = rank + 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequence::ReferenceIndex;
    use crate::suffixtree::{build_multiway_tree, build_simple_tree};

    fn matches_for(reference: &[u8], query: &[u8], min_length: usize) -> Vec<MaxUniqueMatch> {
        let tree = build_multiway_tree(ReferenceIndex::single(reference)).unwrap();
        find_matches(&tree, query, min_length).unwrap()
    }

    #[test]
    fn test_repeated_span_yields_single_mum() {
        // "ACGT" occurs twice in the reference; the query descent still ends
        // inside the lone "ACGTACGT" leaf, so one match is reported at the
        // first occurrence
        let found = matches_for(b"ACGTACGT", b"ACGT", 4);
        assert_eq!(found.len(), 1);
        let m = found[0];
        assert_eq!(
            (m.first_sequence_start, m.second_sequence_start, m.length),
            (0, 0, 4)
        );
    }

    #[test]
    fn test_min_length_filters_short_matches() {
        assert!(matches_for(b"ACGTACGT", b"ACGT", 5).is_empty());
    }

    #[test]
    fn test_match_substrings_agree() {
        let reference = b"TTGACCTGACCAGTAAATTT";
        let query = b"GACCAGTAAACCC";
        for m in matches_for(reference, query, 4) {
            assert!(m.length >= 4);
            assert_eq!(
                &reference[m.first_sequence_start..m.first_sequence_end()],
                &query[m.second_sequence_start..m.second_sequence_end()],
            );
        }
    }

    #[test]
    fn test_left_maximality_drops_contained_matches() {
        let reference = b"GGGACGTTT";
        let query = b"GACGTT";
        let found = matches_for(reference, query, 4);
        // the spans starting at query positions 1.. are contained in the
        // match starting at 0 and share their left neighbor symbol
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].second_sequence_start, 0);
    }

    #[test]
    fn test_mum_orders_are_one_based_ranks() {
        let reference = b"AAAATTTTCCCCGGGG";
        let query = b"CCCCGGGGAAAATTTT";
        let found = matches_for(reference, query, 6);
        assert_eq!(found.len(), 2);
        // query order follows scan order
        assert_eq!(found[0].second_sequence_mum_order, 1);
        assert_eq!(found[1].second_sequence_mum_order, 2);
        // reference order ranks by reference start, which here is inverted
        assert_eq!(found[0].first_sequence_mum_order, 2);
        assert_eq!(found[1].first_sequence_mum_order, 1);
    }

    #[test]
    fn test_zero_matches_is_not_an_error() {
        assert!(matches_for(b"AAAAAAAA", b"CCCCCCCC", 3).is_empty());
    }

    #[test]
    fn test_case_insensitive_query() {
        let found = matches_for(b"ACGTACGT", b"acgt", 4);
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn test_backends_agree() {
        let reference = ReferenceIndex::single(b"TTGACCTGACCAGTAAATTT");
        let query = b"GACCAGTAAA";
        let multiway = build_multiway_tree(reference.clone()).unwrap();
        let simple = build_simple_tree(reference).unwrap();
        assert_eq!(
            find_matches(&multiway, query, 4).unwrap(),
            find_matches(&simple, query, 4).unwrap()
        );
    }
}
