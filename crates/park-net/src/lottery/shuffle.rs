use rand::seq::SliceRandom;
use rand::Rng;

use super::domain::Candidate;

/// Orders candidates by priority score descending, then randomizes every
/// equal-score tier in place.
///
/// The tier shuffle is the fairness-preserving tie-break: tied candidates
/// get equal odds independent of submission order or any stable-sort
/// artifact. Production callers pass `thread_rng`; tests pin a seeded
/// generator to assert exact orderings.
pub fn order_candidates(mut candidates: Vec<Candidate>, rng: &mut impl Rng) -> Vec<Candidate> {
    candidates.sort_by(|a, b| b.priority_score.cmp(&a.priority_score));

    let mut start = 0;
    while start < candidates.len() {
        let score = candidates[start].priority_score;
        let mut end = start + 1;
        while end < candidates.len() && candidates[end].priority_score == score {
            end += 1;
        }
        candidates[start..end].shuffle(rng);
        start = end;
    }

    candidates
}
