//! Maximal marginal relevance selection over candidate vectors.

pub fn cosine_similarity(left: &[f32], right: &[f32]) -> f32 {
    if left.len() != right.len() || left.is_empty() {
        return 0.0;
    }

    let dot = left.iter().zip(right).map(|(a, b)| a * b).sum::<f32>();
    let left_norm = left.iter().map(|value| value * value).sum::<f32>().sqrt();
    let right_norm = right.iter().map(|value| value * value).sum::<f32>().sqrt();

    if left_norm == 0.0 || right_norm == 0.0 {
        0.0
    } else {
        dot / (left_norm * right_norm)
    }
}

/// Returns indices into `candidates`, in selection order. `lambda` = 1 ranks by
/// relevance only, `lambda` = 0 by diversity only.
pub fn select(query: &[f32], candidates: &[Vec<f32>], k: usize, lambda: f32) -> Vec<usize> {
    if candidates.is_empty() || k == 0 {
        return Vec::new();
    }

    let relevance: Vec<f32> = candidates
        .iter()
        .map(|candidate| cosine_similarity(query, candidate))
        .collect();

    let mut selected: Vec<usize> = Vec::with_capacity(k.min(candidates.len()));

    while selected.len() < k.min(candidates.len()) {
        let mut best: Option<(usize, f32)> = None;

        for (index, candidate) in candidates.iter().enumerate() {
            if selected.contains(&index) {
                continue;
            }

            let redundancy = selected
                .iter()
                .map(|&chosen| cosine_similarity(candidate, &candidates[chosen]))
                .fold(f32::MIN, f32::max);
            let redundancy = if selected.is_empty() { 0.0 } else { redundancy };

            let score = lambda * relevance[index] - (1.0 - lambda) * redundancy;
            if best.map_or(true, |(_, best_score)| score > best_score) {
                best = Some((index, score));
            }
        }

        match best {
            Some((index, _)) => selected.push(index),
            None => break,
        }
    }

    selected
}

#[cfg(test)]
mod tests {
    use super::{cosine_similarity, select};

    #[test]
    fn cosine_of_parallel_vectors_is_one() {
        let similarity = cosine_similarity(&[1.0, 2.0], &[2.0, 4.0]);
        assert!((similarity - 1.0).abs() < 1e-6);
    }

    #[test]
    fn cosine_handles_zero_and_mismatched_vectors() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0);
    }

    #[test]
    fn most_relevant_candidate_comes_first() {
        let query = [1.0, 0.0];
        let candidates = vec![vec![0.0, 1.0], vec![1.0, 0.0], vec![0.7, 0.7]];
        let picked = select(&query, &candidates, 1, 0.5);
        assert_eq!(picked, vec![1]);
    }

    #[test]
    fn diverse_candidate_beats_near_duplicate() {
        let query = [1.0, 0.0, 0.0];
        let candidates = vec![
            vec![1.0, 0.1, 0.0],
            vec![1.0, 0.12, 0.0],
            vec![0.7, -0.7, 0.0],
        ];

        let picked = select(&query, &candidates, 2, 0.5);
        assert_eq!(picked, vec![0, 2]);

        let relevance_only = select(&query, &candidates, 2, 1.0);
        assert_eq!(relevance_only, vec![0, 1]);
    }

    #[test]
    fn selection_never_exceeds_candidate_count() {
        let candidates = vec![vec![1.0, 0.0], vec![0.0, 1.0]];
        let picked = select(&[1.0, 1.0], &candidates, 8, 0.5);
        assert_eq!(picked.len(), 2);
    }
}
