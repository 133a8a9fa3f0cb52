//! Greedy one-to-one bipartite matching between two sources' segments.

use std::collections::HashSet;

/// One candidate pairing between index `a_idx` in the left source and
/// `b_idx` in the right source.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Candidate {
    pub a_idx: usize,
    pub b_idx: usize,
    pub score: f64,
    pub distance: f64,
}

/// Claims candidates greedily in descending-score order, skipping any pair
/// whose distance exceeds `threshold` or whose `a_idx`/`b_idx` is already
/// taken. Ties in score are broken towards the lower `b_idx` so the result
/// is independent of input order and of the sort's own stability.
pub fn match_segments(mut candidates: Vec<Candidate>, threshold: f64) -> Vec<Candidate> {
    candidates.sort_by(|x, y| {
        y.score
            .partial_cmp(&x.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| x.b_idx.cmp(&y.b_idx))
    });
    let mut matched_a = HashSet::new();
    let mut matched_b = HashSet::new();
    let mut result = Vec::new();
    for c in candidates {
        if c.distance > threshold {
            continue;
        }
        if matched_a.contains(&c.a_idx) || matched_b.contains(&c.b_idx) {
            continue;
        }
        matched_a.insert(c.a_idx);
        matched_b.insert(c.b_idx);
        result.push(c);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_greedy_claims_best_score_first() {
        let candidates = vec![
            Candidate { a_idx: 0, b_idx: 0, score: 0.5, distance: 0.1 },
            Candidate { a_idx: 0, b_idx: 1, score: 0.9, distance: 0.1 },
            Candidate { a_idx: 1, b_idx: 1, score: 0.8, distance: 0.1 },
        ];
        let matched = match_segments(candidates, 1.0);
        assert_eq!(matched.len(), 1);
        assert_eq!((matched[0].a_idx, matched[0].b_idx), (0, 1));
    }

    #[test]
    fn test_distance_threshold_excludes_far_pairs() {
        let candidates = vec![Candidate { a_idx: 0, b_idx: 0, score: 1.0, distance: 5.0 }];
        let matched = match_segments(candidates, 1.0);
        assert!(matched.is_empty());
    }

    #[test]
    fn test_tie_break_prefers_lower_b_idx() {
        let candidates = vec![
            Candidate { a_idx: 0, b_idx: 2, score: 1.0, distance: 0.0 },
            Candidate { a_idx: 0, b_idx: 1, score: 1.0, distance: 0.0 },
        ];
        let matched = match_segments(candidates, 1.0);
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].b_idx, 1);
    }
}
