//! Lloyd's k-means with seeded k-means++ initialisation.

use rand::SeedableRng;
use rand::distr::{Distribution, StandardUniform};
use rand::rngs::StdRng;

use super::traits::Clustering;
use crate::error::{PipelineError, PipelineResult};
use crate::semantic::ensure_uniform_dimensions;

pub const DEFAULT_CLUSTERS: usize = 5;
pub const DEFAULT_SEED: u64 = 42;
pub const DEFAULT_MAX_ITER: usize = 300;

/// K-means configuration. Identical data and seed always yield identical labels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Kmeans {
    k: usize,
    max_iter: usize,
    seed: u64,
}

/// Result of a k-means fit.
#[derive(Debug, Clone, PartialEq)]
pub struct KmeansFit {
    /// One label in `[0, k)` per input point
    pub labels: Vec<usize>,
    pub centroids: Vec<Vec<f32>>,
    /// Lloyd iterations performed (assignment passes)
    pub iterations: usize,
    /// False when the iteration cap was hit while assignments were still changing
    pub converged: bool,
    /// Sum of squared distances from each point to its final centroid
    pub inertia: f32,
}

impl KmeansFit {
    /// Member count per cluster, including empty clusters.
    pub fn cluster_sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0; self.centroids.len()];
        for &label in &self.labels {
            sizes[label] += 1;
        }
        sizes
    }
}

impl Kmeans {
    pub fn new(k: usize) -> Self {
        Self {
            k,
            max_iter: DEFAULT_MAX_ITER,
            seed: DEFAULT_SEED,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Reject parameters that cannot produce a clustering of `n_items` points.
    ///
    /// Runs before any computation. `k > n_items` is an error, never clamped.
    pub fn check_params(&self, n_items: usize) -> PipelineResult<()> {
        if self.k == 0 {
            return Err(PipelineError::Configuration {
                reason: "cluster count must be at least 1".to_string(),
            });
        }
        if self.max_iter == 0 {
            return Err(PipelineError::Configuration {
                reason: "max_iterations must be at least 1".to_string(),
            });
        }
        if n_items == 0 {
            return Err(PipelineError::EmptyCorpus);
        }
        if self.k > n_items {
            return Err(PipelineError::InvalidClusterCount {
                requested: self.k,
                n_items,
            });
        }
        Ok(())
    }

    pub fn fit(&self, data: &[Vec<f32>]) -> PipelineResult<KmeansFit> {
        self.check_params(data.len())?;
        let dims = ensure_uniform_dimensions(data)?;

        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut centroids = kmeans_plus_plus(data, self.k, &mut rng);
        let mut labels = vec![usize::MAX; data.len()];
        let mut iterations = 0;
        let mut converged = false;

        while iterations < self.max_iter {
            iterations += 1;

            let mut changed = 0usize;
            for (label, point) in labels.iter_mut().zip(data) {
                let nearest = nearest_centroid(point, &centroids);
                if *label != nearest {
                    *label = nearest;
                    changed += 1;
                }
            }

            tracing::trace!(target: "cluster", "iteration {iterations}: {changed} reassigned");

            if changed == 0 {
                converged = true;
                break;
            }

            update_centroids(data, &labels, &mut centroids, dims);
        }

        let inertia = labels
            .iter()
            .zip(data)
            .map(|(&label, point)| squared_euclidean(point, &centroids[label]))
            .sum();

        tracing::debug!(
            target: "cluster",
            "k-means k={} seed={} finished after {iterations}/{} iterations (converged: {converged}, inertia: {inertia:.4})",
            self.k,
            self.seed,
            self.max_iter
        );

        Ok(KmeansFit {
            labels,
            centroids,
            iterations,
            converged,
            inertia,
        })
    }
}

impl Clustering for Kmeans {
    fn fit_predict(&self, data: &[Vec<f32>]) -> PipelineResult<Vec<usize>> {
        Ok(self.fit(data)?.labels)
    }

    fn n_clusters(&self) -> usize {
        self.k
    }
}

#[inline]
pub(crate) fn squared_euclidean(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len());
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}

/// Index of the closest centroid; ties go to the lowest index.
fn nearest_centroid(point: &[f32], centroids: &[Vec<f32>]) -> usize {
    let mut best = 0;
    let mut best_dist = f32::INFINITY;
    for (c, centroid) in centroids.iter().enumerate() {
        let dist = squared_euclidean(point, centroid);
        if dist < best_dist {
            best_dist = dist;
            best = c;
        }
    }
    best
}

/// Move each centroid to the mean of its members. Empty clusters stay put.
fn update_centroids(data: &[Vec<f32>], labels: &[usize], centroids: &mut [Vec<f32>], dims: usize) {
    let k = centroids.len();
    let mut sums = vec![vec![0.0f32; dims]; k];
    let mut counts = vec![0usize; k];

    for (point, &label) in data.iter().zip(labels) {
        counts[label] += 1;
        for (sum, value) in sums[label].iter_mut().zip(point) {
            *sum += value;
        }
    }

    for (c, (sum, count)) in sums.into_iter().zip(counts).enumerate() {
        if count == 0 {
            tracing::debug!(target: "cluster", "cluster {c} has no members, centroid left unmoved");
            continue;
        }
        let count = count as f32;
        centroids[c] = sum.into_iter().map(|v| v / count).collect();
    }
}

/// k-means++ seeding: each next centroid is a data point drawn with
/// probability proportional to its squared distance from the nearest chosen one.
fn kmeans_plus_plus(data: &[Vec<f32>], k: usize, rng: &mut StdRng) -> Vec<Vec<f32>> {
    let n = data.len();
    let mut chosen: Vec<usize> = Vec::with_capacity(k);

    let unit: f64 = StandardUniform.sample(rng);
    chosen.push(((unit * n as f64) as usize).min(n - 1));

    let mut dist: Vec<f32> = data
        .iter()
        .map(|point| squared_euclidean(point, &data[chosen[0]]))
        .collect();

    while chosen.len() < k {
        let total: f64 = dist.iter().map(|&d| f64::from(d)).sum();

        let next = if total > 0.0 {
            let unit: f64 = StandardUniform.sample(rng);
            let target = unit * total;
            let mut cumulative = 0.0f64;
            let mut pick = None;
            for (i, &d) in dist.iter().enumerate() {
                if d <= 0.0 {
                    continue;
                }
                cumulative += f64::from(d);
                pick = Some(i);
                if cumulative > target {
                    break;
                }
            }
            pick
        } else {
            None
        };

        // Every remaining point coincides with a centroid: take the first unused one
        let next = next.unwrap_or_else(|| (0..n).find(|i| !chosen.contains(i)).unwrap_or(0));
        chosen.push(next);

        for (d, point) in dist.iter_mut().zip(data) {
            *d = d.min(squared_euclidean(point, &data[next]));
        }
    }

    chosen.into_iter().map(|i| data[i].clone()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blobs() -> Vec<Vec<f32>> {
        vec![
            vec![0.0, 0.0],
            vec![0.1, 0.2],
            vec![0.2, 0.1],
            vec![5.0, 5.0],
            vec![5.1, 4.9],
            vec![4.9, 5.1],
            vec![10.0, 0.0],
            vec![10.1, 0.1],
            vec![9.9, -0.1],
        ]
    }

    #[test]
    fn test_separates_blobs() {
        let data = blobs();
        let fit = Kmeans::new(3).with_seed(42).fit(&data).unwrap();
        assert!(fit.converged);
        assert_eq!(fit.labels[0], fit.labels[1]);
        assert_eq!(fit.labels[0], fit.labels[2]);
        assert_eq!(fit.labels[3], fit.labels[4]);
        assert_eq!(fit.labels[6], fit.labels[8]);
        assert_ne!(fit.labels[0], fit.labels[3]);
        assert_ne!(fit.labels[3], fit.labels[6]);
        assert_ne!(fit.labels[0], fit.labels[6]);
        assert_eq!(fit.cluster_sizes().iter().sum::<usize>(), data.len());
    }

    #[test]
    fn test_same_seed_same_labels() {
        let data = blobs();
        let a = Kmeans::new(4).with_seed(7).fit(&data).unwrap();
        let b = Kmeans::new(4).with_seed(7).fit(&data).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_labels_in_range() {
        let data = blobs();
        let labels = Kmeans::new(5).fit_predict(&data).unwrap();
        assert_eq!(labels.len(), data.len());
        assert!(labels.iter().all(|&l| l < 5));
    }

    #[test]
    fn test_k_greater_than_n_is_error() {
        let data = vec![vec![1.0, 0.0], vec![0.0, 1.0]];
        match Kmeans::new(3).fit(&data) {
            Err(PipelineError::InvalidClusterCount { requested, n_items }) => {
                assert_eq!((requested, n_items), (3, 2));
            }
            other => panic!("expected InvalidClusterCount, got {other:?}"),
        }
    }

    #[test]
    fn test_zero_k_is_configuration_error() {
        let data = vec![vec![1.0]];
        assert!(matches!(
            Kmeans::new(0).fit(&data),
            Err(PipelineError::Configuration { .. })
        ));
    }

    #[test]
    fn test_empty_data() {
        assert!(matches!(
            Kmeans::new(1).fit(&[]),
            Err(PipelineError::EmptyCorpus)
        ));
    }

    #[test]
    fn test_identical_points_leave_empty_clusters() {
        let data = vec![vec![1.0, 1.0]; 4];
        let fit = Kmeans::new(3).fit(&data).unwrap();
        assert!(fit.converged);
        let sizes = fit.cluster_sizes();
        assert_eq!(sizes.len(), 3);
        assert_eq!(sizes.iter().sum::<usize>(), 4);
        assert_eq!(sizes, vec![4, 0, 0]);
    }

    #[test]
    fn test_iteration_cap_is_not_an_error() {
        let data = blobs();
        let fit = Kmeans::new(3).with_max_iter(1).fit(&data).unwrap();
        assert_eq!(fit.iterations, 1);
        assert!(!fit.converged);
        assert_eq!(fit.labels.len(), data.len());
    }

    #[test]
    fn test_k_equals_n_gives_singletons() {
        let data = vec![vec![0.0], vec![1.0], vec![2.0]];
        let mut labels = Kmeans::new(3).fit_predict(&data).unwrap();
        labels.sort_unstable();
        assert_eq!(labels, vec![0, 1, 2]);
    }

    #[test]
    fn test_nearest_centroid_tie_goes_to_lowest_index() {
        let centroids = vec![vec![1.0], vec![-1.0]];
        assert_eq!(nearest_centroid(&[0.0], &centroids), 0);
    }
}
