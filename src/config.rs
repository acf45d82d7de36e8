//! Configuration module for the clustering pipeline.
//!
//! This module provides a layered configuration system that supports:
//! - Default values
//! - TOML configuration file
//! - Environment variable overrides
//! - CLI argument overrides
//!
//! # Environment Variables
//!
//! Environment variables must be prefixed with `TM_` and use double underscores
//! to separate nested levels:
//! - `TM_PIPELINE__CLUSTERS=8` sets `pipeline.clusters`
//! - `TM_PIPELINE__EMBEDDING_SOURCE=precomputed` sets `pipeline.embedding_source`
//! - `TM_PATHS__OUTPUT=out.json` sets `paths.output`

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::cluster::{DEFAULT_CLUSTERS, DEFAULT_MAX_ITER, DEFAULT_SEED};
use crate::error::{PipelineError, PipelineResult};
use crate::semantic::{DEFAULT_DIMENSIONS, DEFAULT_NEIGHBORS};

const CONFIG_DIR: &str = ".threadmap";
const CONFIG_FILE: &str = "settings.toml";

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Settings {
    /// Version of the configuration schema
    #[serde(default = "default_version")]
    pub version: u32,

    /// Algorithm parameters
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Input and output locations
    #[serde(default)]
    pub paths: PathsConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Where embeddings come from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingSource {
    /// Hashed bag-of-words built from content and topics
    #[default]
    Hashed,
    /// `embedding` arrays already present on every post
    Precomputed,
}

/// Explicit parameters for one pipeline run.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct PipelineConfig {
    /// Embedding dimension for hashed embeddings
    #[serde(default = "default_dimensions")]
    pub dimensions: usize,

    /// Number of k-means clusters
    #[serde(default = "default_clusters")]
    pub clusters: usize,

    /// Neighbors kept per post
    #[serde(default = "default_neighbors")]
    pub neighbors: usize,

    /// Seed for centroid initialisation
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// K-means iteration cap
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,

    #[serde(default)]
    pub embedding_source: EmbeddingSource,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct PathsConfig {
    /// Corpus to read
    #[serde(default = "default_input")]
    pub input: PathBuf,

    /// Augmented corpus to write
    #[serde(default = "default_output")]
    pub output: PathBuf,

    /// Cluster-size histogram (PNG); skipped when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plot: Option<PathBuf>,

    /// Cluster statistics (JSON); skipped when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats: Option<PathBuf>,
}

/// Logging configuration.
///
/// ```toml
/// [logging]
/// default = "warn"
///
/// [logging.modules]
/// cluster = "debug"
/// ```
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct LoggingConfig {
    /// Default level for all targets
    #[serde(default = "default_log_level")]
    pub default: String,

    /// Per-target level overrides
    #[serde(default)]
    pub modules: HashMap<String, String>,
}

// Default value functions
fn default_version() -> u32 {
    1
}
fn default_dimensions() -> usize {
    DEFAULT_DIMENSIONS
}
fn default_clusters() -> usize {
    DEFAULT_CLUSTERS
}
fn default_neighbors() -> usize {
    DEFAULT_NEIGHBORS
}
fn default_seed() -> u64 {
    DEFAULT_SEED
}
fn default_max_iterations() -> usize {
    DEFAULT_MAX_ITER
}
fn default_input() -> PathBuf {
    PathBuf::from("data/mock_social_data.json")
}
fn default_output() -> PathBuf {
    PathBuf::from("data/mock_social_data_with_clusters.json")
}
fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: default_version(),
            pipeline: PipelineConfig::default(),
            paths: PathsConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            dimensions: default_dimensions(),
            clusters: default_clusters(),
            neighbors: default_neighbors(),
            seed: default_seed(),
            max_iterations: default_max_iterations(),
            embedding_source: EmbeddingSource::default(),
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            input: default_input(),
            output: default_output(),
            plot: None,
            stats: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            default: default_log_level(),
            modules: HashMap::new(),
        }
    }
}

impl PipelineConfig {
    /// Reject parameter values no run can use. Corpus-dependent checks
    /// (such as `clusters` against the post count) happen in the pipeline.
    pub fn validate(&self) -> PipelineResult<()> {
        let reason = if self.dimensions == 0 {
            "dimensions must be at least 1"
        } else if self.clusters == 0 {
            "clusters must be at least 1"
        } else if self.max_iterations == 0 {
            "max_iterations must be at least 1"
        } else {
            return Ok(());
        };
        Err(PipelineError::Configuration {
            reason: reason.to_string(),
        })
    }
}

impl Settings {
    /// Load configuration from all sources
    pub fn load() -> Result<Self, Box<figment::Error>> {
        let config_path = Self::find_workspace_config()
            .unwrap_or_else(|| PathBuf::from(CONFIG_DIR).join(CONFIG_FILE));
        Self::load_from(config_path)
    }

    /// Load configuration from a specific file
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, Box<figment::Error>> {
        Figment::new()
            // Start with defaults
            .merge(Serialized::defaults(Settings::default()))
            // Layer in config file if it exists
            .merge(Toml::file(path.as_ref()))
            // Double underscore separates nested levels, single underscore stays
            .merge(Env::prefixed("TM_").map(|key| {
                key.as_str().to_lowercase().replace("__", ".").into()
            }))
            .extract()
            .map_err(Box::new)
    }

    /// Find `.threadmap/settings.toml` in the current directory or any ancestor
    pub fn find_workspace_config() -> Option<PathBuf> {
        let current = std::env::current_dir().ok()?;

        for ancestor in current.ancestors() {
            let config_dir = ancestor.join(CONFIG_DIR);
            if config_dir.is_dir() {
                return Some(config_dir.join(CONFIG_FILE));
            }
        }

        None
    }

    /// Save current configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), Box<dyn std::error::Error>> {
        let parent = path.as_ref().parent().ok_or("Invalid path")?;
        std::fs::create_dir_all(parent)?;

        let toml_string = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_string)?;

        Ok(())
    }

    /// Create a default settings file in `.threadmap/` under `root`
    pub fn init_config_file(
        root: &Path,
        force: bool,
    ) -> Result<PathBuf, Box<dyn std::error::Error>> {
        let config_path = root.join(CONFIG_DIR).join(CONFIG_FILE);

        if !force && config_path.exists() {
            return Err("Configuration file already exists. Use --force to overwrite".into());
        }

        Settings::default().save(&config_path)?;
        Ok(config_path)
    }
}
