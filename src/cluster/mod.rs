//! Clustering of post embeddings.
//!
//! ## K-means
//!
//! Assign each point to the nearest centroid, then move each centroid to the
//! mean of its points. Repeat until no assignment changes or the iteration
//! cap is reached.
//!
//! **Objective**: Minimize within-cluster sum of squares:
//!
//! ```text
//! J = Σ_k Σ_{x ∈ C_k} ||x - μ_k||²
//! ```
//!
//! Initial centroids come from k-means++ seeding driven by a fixed seed, so a
//! run is reproducible. A centroid that loses all its members stays where it
//! is; the cluster is reported with size 0.
//!
//! ## Usage
//!
//! ```rust
//! use threadmap::cluster::{Clustering, Kmeans};
//!
//! let data = vec![
//!     vec![0.0, 0.0],
//!     vec![0.1, 0.1],
//!     vec![10.0, 10.0],
//!     vec![10.1, 10.1],
//! ];
//!
//! let labels = Kmeans::new(2).with_seed(42).fit_predict(&data).unwrap();
//! assert_eq!(labels[0], labels[1]);
//! assert_ne!(labels[0], labels[2]);
//! ```

mod analysis;
mod kmeans;
mod traits;

pub use analysis::{
    ClusterStats, PlatformCounts, SAMPLE_CHARS, SAMPLE_POSTS, analyze_clusters, truncate_sample,
};
pub use kmeans::{DEFAULT_CLUSTERS, DEFAULT_MAX_ITER, DEFAULT_SEED, Kmeans, KmeansFit};
pub use traits::Clustering;
