pub mod cli;
pub mod cluster;
pub mod config;
pub mod dedupe;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod semantic;
pub mod storage;
pub mod types;
pub mod visualize;

pub use cluster::{ClusterStats, Clustering, Kmeans, KmeansFit, analyze_clusters};
pub use config::{EmbeddingSource, PipelineConfig, Settings};
pub use error::{PipelineError, PipelineResult};
pub use pipeline::{PipelineOutput, RunOutcome, RunReport, process, run};
pub use semantic::{EmbeddingBuilder, SimilarityIndex};
pub use storage::{Persister, StorageError, load_corpus, parse_corpus};
pub use types::{Corpus, Neighbor, Platform, Post, PostBase};
