use crate::error::PipelineResult;

/// Common interface for hard clustering algorithms (one label per point).
pub trait Clustering {
    /// Fit the model and return one cluster label per input point.
    fn fit_predict(&self, data: &[Vec<f32>]) -> PipelineResult<Vec<usize>>;

    /// The configured number of clusters.
    fn n_clusters(&self) -> usize;
}
