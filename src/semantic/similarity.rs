//! Exact all-pairs cosine similarity and top-n neighbor extraction.
//!
//! The index holds the full N×N matrix: O(N²·D) time and O(N²) memory.
//! Brute force; fine for corpora in the low thousands.

use crate::error::{PipelineError, PipelineResult};
use crate::types::Neighbor;

/// Value written over the diagonal of a masked row. Strictly below any real similarity.
pub const SELF_SENTINEL: f32 = f32::NEG_INFINITY;

/// Default number of neighbors kept per post.
pub const DEFAULT_NEIGHBORS: usize = 5;

/// Check that every vector has the same length and return it.
pub fn ensure_uniform_dimensions(embeddings: &[Vec<f32>]) -> PipelineResult<usize> {
    let Some(first) = embeddings.first() else {
        return Err(PipelineError::EmptyCorpus);
    };
    let expected = first.len();
    for (index, embedding) in embeddings.iter().enumerate() {
        if embedding.len() != expected {
            return Err(PipelineError::DimensionMismatch {
                expected,
                found: embedding.len(),
                index,
            });
        }
    }
    Ok(expected)
}

/// Scale `vector` to unit Euclidean norm. The zero vector is left as is.
pub fn l2_normalize(vector: &mut [f32]) {
    let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for value in vector.iter_mut() {
            *value /= norm;
        }
    }
}

/// Validate dimensions and L2-normalize every embedding.
pub fn normalize_all(embeddings: &[Vec<f32>]) -> PipelineResult<Vec<Vec<f32>>> {
    ensure_uniform_dimensions(embeddings)?;
    Ok(embeddings
        .iter()
        .map(|embedding| {
            let mut normalized = embedding.clone();
            l2_normalize(&mut normalized);
            normalized
        })
        .collect())
}

/// Calculate cosine similarity between two vectors.
///
/// Defined as 0 when either vector is zero.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let magnitude_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let magnitude_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if magnitude_a == 0.0 || magnitude_b == 0.0 {
        return 0.0;
    }

    (dot_product / (magnitude_a * magnitude_b)).clamp(-1.0, 1.0)
}

/// Symmetric similarity matrix over a normalized embedding set.
#[derive(Debug, Clone)]
pub struct SimilarityIndex {
    len: usize,
    /// Row-major N×N
    matrix: Vec<f32>,
}

impl SimilarityIndex {
    /// Build the matrix from embeddings of any (uniform) dimension.
    ///
    /// Entries are cosine similarities, so unnormalized input gives the same
    /// matrix as its normalized form and zero vectors score 0 against everything.
    pub fn build(normalized: &[Vec<f32>]) -> PipelineResult<Self> {
        let dimensions = ensure_uniform_dimensions(normalized)?;
        let len = normalized.len();
        let mut matrix = vec![0.0f32; len * len];

        for (i, a) in normalized.iter().enumerate() {
            for (j, b) in normalized.iter().enumerate().skip(i) {
                let similarity = cosine_similarity(a, b);
                matrix[i * len + j] = similarity;
                matrix[j * len + i] = similarity;
            }
        }

        tracing::debug!(
            target: "similarity",
            "built {len}x{len} similarity matrix over {dimensions} dimensions"
        );

        Ok(Self { len, matrix })
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn similarity(&self, i: usize, j: usize) -> f32 {
        self.matrix[i * self.len + j]
    }

    pub fn row(&self, i: usize) -> &[f32] {
        &self.matrix[i * self.len..(i + 1) * self.len]
    }

    /// Row `i` with its own entry replaced by [`SELF_SENTINEL`].
    pub fn masked_row(&self, i: usize) -> Vec<f32> {
        let mut row = self.row(i).to_vec();
        row[i] = SELF_SENTINEL;
        row
    }

    /// Top `n` `(index, similarity)` pairs for post `i`.
    ///
    /// Sorted by similarity descending, ties by ascending index. Returns
    /// exactly `min(n, N - 1)` entries and never includes `i`.
    pub fn top_neighbors(&self, i: usize, n: usize) -> Vec<(usize, f32)> {
        let row = self.masked_row(i);
        let mut order: Vec<usize> = (0..self.len).collect();
        order.sort_by(|&a, &b| row[b].total_cmp(&row[a]).then(a.cmp(&b)));

        // The sentinel sorts last, so dropping the tail removes self
        let take = n.min(self.len.saturating_sub(1));
        order
            .into_iter()
            .take(take)
            .map(|j| (j, row[j]))
            .collect()
    }

    /// Neighbor lists for every post, resolved to ids.
    ///
    /// `ids` must be in the same order as the embeddings the index was built from.
    pub fn neighbor_lists(&self, ids: &[&str], n: usize) -> Vec<Vec<Neighbor>> {
        debug_assert_eq!(ids.len(), self.len);
        (0..self.len)
            .map(|i| {
                self.top_neighbors(i, n)
                    .into_iter()
                    .map(|(j, similarity)| Neighbor {
                        id: ids[j].to_string(),
                        similarity,
                    })
                    .collect()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit(values: &[f32]) -> Vec<f32> {
        let mut v = values.to_vec();
        l2_normalize(&mut v);
        v
    }

    #[test]
    fn test_cosine_similarity() {
        // Identical vectors
        let v1 = vec![1.0, 0.0, 0.0];
        let v2 = vec![1.0, 0.0, 0.0];
        assert!((cosine_similarity(&v1, &v2) - 1.0).abs() < 0.001);

        // Orthogonal vectors
        let v3 = vec![0.0, 1.0, 0.0];
        assert!((cosine_similarity(&v1, &v3) - 0.0).abs() < 0.001);

        // Opposite vectors
        let v4 = vec![-1.0, 0.0, 0.0];
        assert!((cosine_similarity(&v1, &v4) - (-1.0)).abs() < 0.001);

        // Zero vector
        let zero = vec![0.0, 0.0, 0.0];
        assert_eq!(cosine_similarity(&zero, &zero), 0.0);
        assert_eq!(cosine_similarity(&v1, &zero), 0.0);
    }

    #[test]
    fn test_normalize_unit_norm_and_zero_stays_zero() {
        let normalized = normalize_all(&[vec![3.0, 4.0], vec![0.0, 0.0]]).unwrap();
        let norm: f32 = normalized[0].iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-6);
        assert_eq!(normalized[1], vec![0.0, 0.0]);
        assert!(normalized[1].iter().all(|v| !v.is_nan()));
    }

    #[test]
    fn test_dimension_mismatch() {
        let err = normalize_all(&[vec![1.0, 0.0], vec![1.0, 0.0, 0.0]]).unwrap_err();
        match err {
            PipelineError::DimensionMismatch {
                expected,
                found,
                index,
            } => {
                assert_eq!((expected, found, index), (2, 3, 1));
            }
            other => panic!("expected DimensionMismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_matrix_symmetric_and_bounded() {
        let data = vec![
            unit(&[1.0, 2.0, 0.0]),
            unit(&[0.0, 1.0, 1.0]),
            unit(&[-1.0, 0.5, 0.0]),
            vec![0.0, 0.0, 0.0],
        ];
        let index = SimilarityIndex::build(&data).unwrap();
        for i in 0..data.len() {
            for j in 0..data.len() {
                let s = index.similarity(i, j);
                assert_eq!(s, index.similarity(j, i));
                assert!((-1.0..=1.0).contains(&s));
            }
        }
        assert_eq!(index.similarity(3, 3), 0.0);
    }

    #[test]
    fn test_build_is_scale_invariant() {
        let index = SimilarityIndex::build(&[vec![3.0, 0.0], vec![1.0, 0.0], vec![0.0, 0.0]]).unwrap();
        assert!((index.similarity(0, 1) - 1.0).abs() < 1e-6);
        assert_eq!(index.similarity(0, 2), 0.0);
        assert_eq!(index.similarity(2, 2), 0.0);
    }

    #[test]
    fn test_masked_row_hides_self() {
        let data = vec![unit(&[1.0, 0.0]), unit(&[1.0, 0.1])];
        let index = SimilarityIndex::build(&data).unwrap();
        let row = index.masked_row(0);
        assert_eq!(row[0], SELF_SENTINEL);
        assert!(row[1] > SELF_SENTINEL);
    }

    #[test]
    fn test_top_neighbors_order_and_ties() {
        // 1 and 2 tie with 0; 3 is orthogonal
        let data = vec![
            unit(&[1.0, 0.0]),
            unit(&[1.0, 0.0]),
            unit(&[1.0, 0.0]),
            unit(&[0.0, 1.0]),
        ];
        let index = SimilarityIndex::build(&data).unwrap();
        let top = index.top_neighbors(0, 5);
        let ids: Vec<usize> = top.iter().map(|(j, _)| *j).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert!((top[0].1 - 1.0).abs() < 1e-6);

        let top = index.top_neighbors(2, 1);
        assert_eq!(top[0].0, 0);
    }

    #[test]
    fn test_top_neighbors_excludes_self_when_all_similarities_negative() {
        let data = vec![unit(&[1.0, 0.0]), unit(&[-1.0, 0.0])];
        let index = SimilarityIndex::build(&data).unwrap();
        let top = index.top_neighbors(0, 5);
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].0, 1);
        assert!((top[0].1 + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_single_post_has_no_neighbors() {
        let index = SimilarityIndex::build(&[unit(&[1.0, 1.0])]).unwrap();
        assert!(index.top_neighbors(0, 5).is_empty());
    }

    #[test]
    fn test_neighbor_lists_resolve_ids() {
        let data = vec![unit(&[1.0, 0.0]), unit(&[0.9, 0.1]), unit(&[0.0, 1.0])];
        let index = SimilarityIndex::build(&data).unwrap();
        let lists = index.neighbor_lists(&["a", "b", "c"], 1);
        assert_eq!(lists[0][0].id, "b");
        assert_eq!(lists[1][0].id, "a");
        assert_eq!(lists[2][0].id, "b");
    }
}
