//! Score normalisation, top-k selection and confidence

use std::cmp::Ordering;

/// Map distances to retrieval scores in [0, 1]: closest → 1.0, farthest → 0.0
///
/// When every distance is equal, every score is 1.0.
pub fn normalize_distances(distances: &[f32]) -> Vec<f32> {
    let Some((min, max)) = min_max(distances) else {
        return Vec::new();
    };
    if max == min {
        return vec![1.0; distances.len()];
    }
    distances.iter().map(|d| (max - d) / (max - min)).collect()
}

/// Map raw relevance scores into [0, 1]: highest → 1.0, lowest → 0.0
///
/// When every score is equal, every score is 1.0.
pub fn normalize_relevance(scores: &[f32]) -> Vec<f32> {
    let Some((min, max)) = min_max(scores) else {
        return Vec::new();
    };
    if max == min {
        return vec![1.0; scores.len()];
    }
    scores.iter().map(|s| (s - min) / (max - min)).collect()
}

/// Indices of the `k` highest scores, best first
///
/// Ties keep their original order; NaN ranks below every number.
pub fn top_k_indices(scores: &[f32], k: usize) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..scores.len()).collect();
    indices.sort_by(|&a, &b| descending(scores[a], scores[b]));
    indices.truncate(k.min(scores.len()));
    indices
}

/// Mean of `(retrieval[idx] + relevance) / 2` over the selected chunks
///
/// `selected` pairs a candidate index with its normalised relevance.
/// Returns 0.0 when nothing was selected.
pub fn combined_confidence(retrieval_scores: &[f32], selected: &[(usize, f32)]) -> f32 {
    let combined: Vec<f32> = selected
        .iter()
        .filter_map(|&(idx, relevance)| {
            retrieval_scores
                .get(idx)
                .map(|retrieval| (retrieval + relevance) / 2.0)
        })
        .collect();

    if combined.is_empty() {
        return 0.0;
    }
    combined.iter().sum::<f32>() / combined.len() as f32
}

fn min_max(values: &[f32]) -> Option<(f32, f32)> {
    let mut finite = values.iter().copied().filter(|v| !v.is_nan());
    let first = finite.next()?;
    Some(finite.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v))))
}

fn descending(a: f32, b: f32) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
    }
}
