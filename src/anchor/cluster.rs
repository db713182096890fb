//! Grouping matches into alignment clusters.

use crate::mum::MaxUniqueMatch;

/// A match admitted to a cluster, with the gap it leaves to its predecessor
/// in both coordinates. The first match of a cluster has zero extensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchExtension {
    pub mum: MaxUniqueMatch,
    pub reference_extension: usize,
    pub query_extension: usize,
}

/// An ordered run of mutually consistent, well-separated matches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cluster {
    pub matches: Vec<MatchExtension>,
}

impl Cluster {
    /// Cumulative score: the sum of member match lengths.
    pub fn score(&self) -> usize {
        self.matches.iter().map(|m| m.mum.length).sum()
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }
}

/// Separation and score policy for cluster construction.
///
/// A candidate joins the open cluster when its gap to the cluster's last
/// match, in both reference and query coordinates, stays within the effective
/// separation `min(maximum_separation, fixed_separation + separation_factor ×
/// average match length)`, the two matches do not invert orientation, and any
/// overlap is at most half the shorter match. Clusters scoring below
/// `minimum_score` are dropped.
#[derive(Debug, Clone)]
pub struct ClusterBuilder {
    pub minimum_score: usize,
    pub maximum_separation: usize,
    pub fixed_separation: usize,
    pub separation_factor: f64,
}

impl Default for ClusterBuilder {
    fn default() -> Self {
        Self {
            minimum_score: 65,
            maximum_separation: 1000,
            fixed_separation: 5,
            separation_factor: 0.05,
        }
    }
}

impl ClusterBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Partition matches into clusters. Zero clusters is a valid outcome when
    /// nothing reaches `minimum_score`.
    pub fn build_clusters(&self, matches: &[MaxUniqueMatch]) -> Vec<Cluster> {
        let mut sorted = matches.to_vec();
        sorted.sort_by_key(|m| (m.second_sequence_start, m.first_sequence_start));

        let mut clusters: Vec<Cluster> = Vec::new();
        let mut open: Vec<MatchExtension> = Vec::new();
        for m in sorted {
            match open.last() {
                Some(last) if self.joins(&last.mum, &m) => {
                    let reference_gap =
                        m.first_sequence_start as i64 - last.mum.first_sequence_end() as i64;
                    let query_gap =
                        m.second_sequence_start as i64 - last.mum.second_sequence_end() as i64;
                    open.push(MatchExtension {
                        mum: m,
                        reference_extension: reference_gap.max(0) as usize,
                        query_extension: query_gap.max(0) as usize,
                    });
                }
                _ => {
                    if !open.is_empty() {
                        clusters.push(Cluster {
                            matches: std::mem::take(&mut open),
                        });
                    }
                    open.push(MatchExtension {
                        mum: m,
                        reference_extension: 0,
                        query_extension: 0,
                    });
                }
            }
        }
        if !open.is_empty() {
            clusters.push(Cluster { matches: open });
        }

        clusters
            .into_iter()
            .filter(|c| c.score() >= self.minimum_score)
            .collect()
    }

    fn joins(&self, last: &MaxUniqueMatch, candidate: &MaxUniqueMatch) -> bool {
        // orientation: both coordinates must advance
        if candidate.first_sequence_start <= last.first_sequence_start
            || candidate.second_sequence_start <= last.second_sequence_start
        {
            return false;
        }

        let reference_gap =
            candidate.first_sequence_start as i64 - last.first_sequence_end() as i64;
        let query_gap =
            candidate.second_sequence_start as i64 - last.second_sequence_end() as i64;

        // overlap up to half the shorter match is tolerated
        let overlap_limit = (last.length.min(candidate.length) / 2) as i64;
        if reference_gap < -overlap_limit || query_gap < -overlap_limit {
            return false;
        }

        let average_length = (last.length + candidate.length) as f64 / 2.0;
        let effective = (self.fixed_separation as f64
            + self.separation_factor * average_length)
            .min(self.maximum_separation as f64);
        reference_gap as f64 <= effective && query_gap as f64 <= effective
    }
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

    #[test]
    fn test_default_policy() {
        let builder = ClusterBuilder::default();
        assert_eq!(builder.minimum_score, 65);
        assert_eq!(builder.maximum_separation, 1000);
        assert_eq!(builder.fixed_separation, 5);
        assert!((builder.separation_factor - 0.05).abs() < 1e-9);
    }

    #[test]
    fn test_single_long_match_forms_cluster() {
        let clusters = ClusterBuilder::default().build_clusters(&[m(10, 5, 80)]);
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].score(), 80);
        assert_eq!(clusters[0].matches[0].reference_extension, 0);
    }

    #[test]
    fn test_minimum_score_can_discard_everything() {
        // a single 20-long match never reaches the default score of 65
        let clusters = ClusterBuilder::default().build_clusters(&[m(0, 0, 20)]);
        assert!(clusters.is_empty());
    }

    #[test]
    fn test_nearby_matches_share_a_cluster() {
        // gap of 6 on both axes; effective separation for 70-long matches is
        // 5 + 0.05 * 70 = 8.5
        let clusters =
            ClusterBuilder::default().build_clusters(&[m(0, 0, 70), m(76, 76, 70)]);
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].len(), 2);
        assert_eq!(clusters[0].score(), 140);
        assert_eq!(clusters[0].matches[1].reference_extension, 6);
        assert_eq!(clusters[0].matches[1].query_extension, 6);
    }

    #[test]
    fn test_wide_gap_splits_clusters() {
        let clusters =
            ClusterBuilder::default().build_clusters(&[m(0, 0, 70), m(200, 200, 70)]);
        assert_eq!(clusters.len(), 2);
        assert_eq!(clusters[0].len(), 1);
        assert_eq!(clusters[1].len(), 1);
    }

    #[test]
    fn test_inversion_breaks_a_cluster() {
        // second match goes backwards in the query
        let clusters =
            ClusterBuilder::default().build_clusters(&[m(0, 100, 70), m(75, 0, 70)]);
        assert_eq!(clusters.len(), 2);
    }

    #[test]
    fn test_small_overlap_is_tolerated() {
        // candidates overlap by 10 in the reference, under half of 70
        let builder = ClusterBuilder {
            maximum_separation: 1000,
            fixed_separation: 100,
            ..ClusterBuilder::default()
        };
        let clusters = builder.build_clusters(&[m(0, 0, 70), m(60, 75, 70)]);
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].len(), 2);
        assert_eq!(clusters[0].matches[1].reference_extension, 0);
        assert_eq!(clusters[0].matches[1].query_extension, 5);
    }

    #[test]
    fn test_empty_input() {
        assert!(ClusterBuilder::default().build_clusters(&[]).is_empty());
    }
}
