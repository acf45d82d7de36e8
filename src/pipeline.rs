//! End-to-end pipeline: load, embed, find neighbors, cluster, analyze, persist.
//!
//! [`process`] works purely in memory on a [`Corpus`] and an explicit
//! [`PipelineConfig`]. [`run`] adds the file I/O around it: the output file is
//! written only after every stage has succeeded, and the optional statistics
//! and histogram artifacts are written after that.

use std::path::{Path, PathBuf};

use crate::cluster::{ClusterStats, Clustering, Kmeans, PlatformCounts, analyze_clusters};
use crate::config::{EmbeddingSource, PathsConfig, PipelineConfig};
use crate::error::{PipelineError, PipelineResult};
use crate::semantic::{EmbeddingBuilder, SimilarityIndex, normalize_all};
use crate::storage::{Persister, load_corpus, save_json_atomic};
use crate::types::{Corpus, FLATTEN_ORDER, Post};
use crate::visualize;
use crate::{debug_event, log_event};

/// Summary of a completed in-memory run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub posts: usize,
    pub per_platform: PlatformCounts,
    pub dimensions: usize,
    pub clusters: Vec<ClusterStats>,
    pub iterations: usize,
    pub converged: bool,
    pub inertia: f32,
}

impl RunReport {
    pub fn cluster_sizes(&self) -> Vec<usize> {
        self.clusters.iter().map(|c| c.size).collect()
    }
}

/// The augmented corpus together with its report.
#[derive(Debug)]
pub struct PipelineOutput {
    pub corpus: Corpus,
    pub report: RunReport,
}

/// An optional artifact that could not be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactFailure {
    pub path: PathBuf,
    pub reason: String,
}

/// Result of [`run`]: the report plus what happened to optional artifacts.
#[derive(Debug)]
pub struct RunOutcome {
    pub report: RunReport,
    pub output: PathBuf,
    pub stats: Option<PathBuf>,
    pub plot: Option<PathBuf>,
    pub failures: Vec<ArtifactFailure>,
}

/// Run every stage on an in-memory corpus.
///
/// All validation (configuration, empty corpus, duplicate ids, cluster count)
/// happens before any embedding work. On error the input corpus is dropped
/// unmodified from the caller's point of view; nothing is written anywhere.
pub fn process(mut corpus: Corpus, config: &PipelineConfig) -> PipelineResult<PipelineOutput> {
    config.validate()?;
    if corpus.is_empty() {
        return Err(PipelineError::EmptyCorpus);
    }
    corpus.ensure_unique_ids()?;

    let kmeans = Kmeans::new(config.clusters)
        .with_seed(config.seed)
        .with_max_iter(config.max_iterations);
    kmeans.check_params(corpus.len())?;

    let per_platform = PlatformCounts {
        twitter: corpus.twitter.len(),
        reddit: corpus.reddit.len(),
    };

    // BuildEmbeddings
    let embeddings = build_embeddings(&corpus, config)?;
    debug_event!(
        "embedding",
        "built",
        "{} vectors from {:?} source",
        embeddings.len(),
        config.embedding_source
    );

    // ComputeNeighbors
    let normalized = normalize_all(&embeddings)?;
    let dimensions = normalized.first().map_or(0, Vec::len);
    let index = SimilarityIndex::build(&normalized)?;
    let neighbors = {
        let ids: Vec<&str> = corpus.iter_flattened().map(Post::id).collect();
        index.neighbor_lists(&ids, config.neighbors)
    };
    log_event!(
        "pipeline",
        "neighbors",
        "{} posts, {} per post",
        index.len(),
        config.neighbors.min(index.len().saturating_sub(1))
    );

    // Cluster
    let fit = kmeans.fit(&normalized)?;
    if !fit.converged {
        tracing::warn!(
            target: "cluster",
            "k-means stopped at the iteration cap ({}) before converging",
            config.max_iterations
        );
    }
    log_event!(
        "pipeline",
        "clustered",
        "k={} iterations={} inertia={:.4}",
        config.clusters,
        fit.iterations,
        fit.inertia
    );

    // Analyze
    let clusters = analyze_clusters(corpus.iter_flattened(), &fit.labels, kmeans.n_clusters());

    // Persist (in memory)
    Persister::write_back(&mut corpus, &fit.labels, neighbors)?;

    let report = RunReport {
        posts: corpus.len(),
        per_platform,
        dimensions,
        clusters,
        iterations: fit.iterations,
        converged: fit.converged,
        inertia: fit.inertia,
    };
    Ok(PipelineOutput { corpus, report })
}

/// Raw (unnormalized) embeddings in flattening order.
pub fn build_embeddings(corpus: &Corpus, config: &PipelineConfig) -> PipelineResult<Vec<Vec<f32>>> {
    match config.embedding_source {
        EmbeddingSource::Hashed => {
            let builder =
                EmbeddingBuilder::new(config.dimensions).ok_or_else(|| PipelineError::Configuration {
                    reason: "dimensions must be at least 1".to_string(),
                })?;
            Ok(corpus
                .iter_flattened()
                .map(|post| builder.embed_post(post))
                .collect())
        }
        EmbeddingSource::Precomputed => precomputed_embeddings(corpus),
    }
}

/// Embeddings supplied on the posts themselves. Every post must carry a
/// non-empty, finite vector; length agreement is checked when normalizing.
fn precomputed_embeddings(corpus: &Corpus) -> PipelineResult<Vec<Vec<f32>>> {
    let mut embeddings = Vec::with_capacity(corpus.len());
    for platform in FLATTEN_ORDER {
        for (index, post) in corpus.posts(platform).iter().enumerate() {
            let Some(vector) = post.base().embedding.as_ref() else {
                return Err(PipelineError::schema_at(
                    platform,
                    index,
                    "missing field `embedding` (required for precomputed embeddings)",
                ));
            };
            if vector.is_empty() {
                return Err(PipelineError::schema_at(platform, index, "embedding is empty"));
            }
            if vector.iter().any(|v| !v.is_finite()) {
                return Err(PipelineError::schema_at(
                    platform,
                    index,
                    "embedding contains a non-finite value",
                ));
            }
            embeddings.push(vector.clone());
        }
    }
    Ok(embeddings)
}

/// Load `paths.input`, process it, and write the output plus optional artifacts.
///
/// The output corpus is the only required artifact. Failures writing the
/// statistics file or the histogram are logged and collected in
/// [`RunOutcome::failures`]; they never undo the committed output.
pub fn run(paths: &PathsConfig, config: &PipelineConfig) -> PipelineResult<RunOutcome> {
    let corpus = load_corpus(&paths.input)?;
    log_event!(
        "pipeline",
        "loaded",
        "{} posts from {}",
        corpus.len(),
        paths.input.display()
    );

    let PipelineOutput { corpus, report } = process(corpus, config)?;

    let persister = Persister::new(paths.output.clone());
    persister.save(&corpus)?;

    let mut failures = Vec::new();
    let stats = paths.stats.as_deref().and_then(|path| {
        record_artifact(path, save_json_atomic(path, &report.clusters), &mut failures)
    });
    let plot = paths.plot.as_deref().and_then(|path| {
        let result = visualize::save_histogram(path, &report.cluster_sizes());
        record_artifact(path, result, &mut failures)
    });

    log_event!("pipeline", "done", "{}", persister.output().display());
    Ok(RunOutcome {
        report,
        output: paths.output.clone(),
        stats,
        plot,
        failures,
    })
}

fn record_artifact<E: std::fmt::Display>(
    path: &Path,
    result: Result<(), E>,
    failures: &mut Vec<ArtifactFailure>,
) -> Option<PathBuf> {
    match result {
        Ok(()) => Some(path.to_path_buf()),
        Err(e) => {
            tracing::warn!(target: "pipeline", "could not write {}: {e}", path.display());
            failures.push(ArtifactFailure {
                path: path.to_path_buf(),
                reason: e.to_string(),
            });
            None
        }
    }
}
