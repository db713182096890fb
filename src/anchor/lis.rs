//! Longest increasing subsequence over match coordinates.

use crate::mum::MaxUniqueMatch;

/// Select the longest subsequence of matches strictly increasing in both
/// reference and query start, by patience sorting in O(k log k).
///
/// Query start is the scan order; reference start is the monotonicity key.
/// Matches sharing a query start are visited in descending reference order,
/// so at most one of them can join any chain. Input order and content are
/// preserved; the result copies the selected matches.
pub fn get_longest_sequence(matches: &[MaxUniqueMatch]) -> Vec<MaxUniqueMatch> {
    if matches.is_empty() {
        return Vec::new();
    }

    let mut order: Vec<usize> = (0..matches.len()).collect();
    order.sort_by(|&a, &b| {
        matches[a]
            .second_sequence_start
            .cmp(&matches[b].second_sequence_start)
            .then(matches[b].first_sequence_start.cmp(&matches[a].first_sequence_start))
    });

    // tails[l] is the match ending the best chain of length l+1 seen so far;
    // replacement keeps the smallest reference start per length
    let mut tails: Vec<usize> = Vec::new();
    let mut predecessor = vec![usize::MAX; matches.len()];
    for &i in &order {
        let key = matches[i].first_sequence_start;
        let slot = tails.partition_point(|&t| matches[t].first_sequence_start < key);
        if slot > 0 {
            predecessor[i] = tails[slot - 1];
        }
        if slot == tails.len() {
            tails.push(i);
        } else {
            tails[slot] = i;
        }
    }

    let mut chain = Vec::with_capacity(tails.len());
    let mut current = *tails.last().expect("non-empty input yields a chain");
    loop {
        chain.push(matches[current]);
        if predecessor[current] == usize::MAX {
            break;
        }
        current = predecessor[current];
    }
    chain.reverse();
    chain
}

#[cfg(test)]
mod tests {
    use super::*;

    fn m(first: usize, second: usize, length: usize) -> MaxUniqueMatch {
        MaxUniqueMatch {
            first_sequence_start: first,
            first_sequence_mum_order: 0,
            second_sequence_start: second,
            second_sequence_mum_order: 0,
            length,
        }
    }

    fn is_strictly_increasing(chain: &[MaxUniqueMatch]) -> bool {
        chain.windows(2).all(|w| {
            w[0].first_sequence_start < w[1].first_sequence_start
                && w[0].second_sequence_start < w[1].second_sequence_start
        })
    }

    /// O(k²) reference implementation for cross-checking lengths.
    fn brute_force_length(matches: &[MaxUniqueMatch]) -> usize {
        let mut order: Vec<usize> = (0..matches.len()).collect();
        order.sort_by_key(|&i| {
            (
                matches[i].second_sequence_start,
                matches[i].first_sequence_start,
            )
        });
        let mut best = vec![0usize; matches.len()];
        let mut longest = 0;
        for (pos, &i) in order.iter().enumerate() {
            best[pos] = 1;
            for prev in 0..pos {
                let j = order[prev];
                if matches[j].first_sequence_start < matches[i].first_sequence_start
                    && matches[j].second_sequence_start < matches[i].second_sequence_start
                {
                    best[pos] = best[pos].max(best[prev] + 1);
                }
            }
            longest = longest.max(best[pos]);
        }
        longest
    }

    #[test]
    fn test_empty_input() {
        assert!(get_longest_sequence(&[]).is_empty());
    }

    #[test]
    fn test_single_match() {
        let chain = get_longest_sequence(&[m(3, 7, 10)]);
        assert_eq!(chain.len(), 1);
        assert_eq!(chain[0], m(3, 7, 10));
    }

    #[test]
    fn test_crossing_matches_resolved() {
        // two crossing matches: only one can be kept
        let input = [m(0, 50, 10), m(50, 0, 10), m(60, 60, 10)];
        let chain = get_longest_sequence(&input);
        assert_eq!(chain.len(), 2);
        assert!(is_strictly_increasing(&chain));
    }

    #[test]
    fn test_already_colinear_input_is_kept_whole() {
        let input = [m(0, 0, 5), m(10, 8, 5), m(20, 16, 5), m(30, 24, 5)];
        let chain = get_longest_sequence(&input);
        assert_eq!(chain, input.to_vec());
    }

    #[test]
    fn test_matches_brute_force_on_pseudorandom_input() {
        let mut seed = 42u64;
        let mut next = |modulus: usize| {
            seed = seed
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            (seed >> 33) as usize % modulus
        };
        for _ in 0..50 {
            let k = 1 + next(20);
            let input: Vec<MaxUniqueMatch> =
                (0..k).map(|_| m(next(100), next(100), 1 + next(30))).collect();
            let chain = get_longest_sequence(&input);
            assert!(is_strictly_increasing(&chain), "chain not monotonic");
            assert_eq!(
                chain.len(),
                brute_force_length(&input),
                "chain not maximal for {:?}",
                input
            );
        }
    }

    #[test]
    fn test_equal_query_starts_admit_one() {
        let input = [m(5, 10, 4), m(9, 10, 4), m(20, 30, 4)];
        let chain = get_longest_sequence(&input);
        assert_eq!(chain.len(), 2);
        assert!(is_strictly_increasing(&chain));
    }
}
