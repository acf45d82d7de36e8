//! Corpus loading and write-back of pipeline results.
//!
//! Output files are written to a temp file in the destination directory and
//! renamed into place, so a reader sees either the old file or the complete
//! new one.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tempfile::NamedTempFile;

use super::error::{StorageError, StorageResult};
use crate::error::{PipelineError, PipelineResult};
use crate::types::{Corpus, FLATTEN_ORDER, Neighbor, Platform, Post};

/// Top-level document before per-post validation
#[derive(Deserialize)]
struct RawCorpus {
    #[serde(default)]
    twitter: Option<Value>,

    #[serde(default)]
    reddit: Option<Value>,

    #[serde(flatten)]
    extra: IndexMap<String, Value>,
}

impl RawCorpus {
    fn take(&mut self, platform: Platform) -> Option<Value> {
        match platform {
            Platform::Twitter => self.twitter.take(),
            Platform::Reddit => self.reddit.take(),
        }
    }
}

/// Read and validate a corpus file.
pub fn load_corpus(path: &Path) -> PipelineResult<Corpus> {
    let json = fs::read_to_string(path).map_err(|e| StorageError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;
    let corpus = parse_corpus(&json, path)?;
    tracing::debug!(
        target: "storage",
        "loaded {} twitter and {} reddit posts from {}",
        corpus.twitter.len(),
        corpus.reddit.len(),
        path.display()
    );
    Ok(corpus)
}

/// Parse and validate a corpus document. `origin` is only used in error messages.
pub fn parse_corpus(json: &str, origin: &Path) -> PipelineResult<Corpus> {
    let mut raw: RawCorpus = serde_json::from_str(json).map_err(|e| StorageError::Json {
        path: origin.to_path_buf(),
        source: e,
    })?;

    let mut corpus = Corpus::default();
    for platform in FLATTEN_ORDER {
        let list = match raw.take(platform) {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => items,
            Some(other) => {
                return Err(PipelineError::Schema {
                    location: platform.to_string(),
                    reason: format!("expected an array of posts, found {}", json_kind(&other)),
                });
            }
        };

        let posts = corpus.posts_mut(platform);
        posts.reserve(list.len());
        for (index, value) in list.into_iter().enumerate() {
            posts.push(parse_post(platform, index, value)?);
        }
    }
    corpus.extra = raw.extra;

    Ok(corpus)
}

fn parse_post(platform: Platform, index: usize, value: Value) -> PipelineResult<Post> {
    let Value::Object(fields) = &value else {
        return Err(PipelineError::schema_at(
            platform,
            index,
            format!("expected an object, found {}", json_kind(&value)),
        ));
    };

    match fields.get("platform") {
        None => {
            return Err(PipelineError::schema_at(
                platform,
                index,
                "missing field `platform`",
            ));
        }
        Some(Value::String(declared)) if declared != platform.as_str() => {
            return Err(PipelineError::schema_at(
                platform,
                index,
                format!("platform '{declared}' does not match list '{platform}'"),
            ));
        }
        _ => {}
    }

    serde_json::from_value(value)
        .map_err(|e| PipelineError::schema_at(platform, index, e.to_string()))
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Write `bytes` to `path` through a temp file in the same directory.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> StorageResult<()> {
    let write_err = |source| StorageError::FileWrite {
        path: path.to_path_buf(),
        source,
    };

    let parent = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&parent).map_err(write_err)?;

    let mut temp = NamedTempFile::new_in(&parent).map_err(write_err)?;
    temp.write_all(bytes).map_err(write_err)?;
    temp.as_file().sync_all().map_err(write_err)?;
    temp.persist(path).map_err(|e| write_err(e.error))?;

    Ok(())
}

/// Serialize `value` as pretty JSON (two-space indent) and write it atomically.
pub fn save_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> StorageResult<()> {
    let mut json =
        serde_json::to_string_pretty(value).map_err(|e| StorageError::Serialization(e.to_string()))?;
    json.push('\n');
    write_atomic(path, json.as_bytes())
}

/// Writes cluster labels and neighbor lists back onto their posts.
#[derive(Debug)]
pub struct Persister {
    output: PathBuf,
}

impl Persister {
    pub fn new(output: PathBuf) -> Self {
        Self { output }
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    /// Attach `cluster` and `nearest_neighbors` to every post.
    ///
    /// `labels[i]` and `neighbors[i]` belong to the i-th post of
    /// [`Corpus::iter_flattened`]; the same order is used here.
    pub fn write_back(
        corpus: &mut Corpus,
        labels: &[usize],
        neighbors: Vec<Vec<Neighbor>>,
    ) -> PipelineResult<()> {
        let posts = corpus.len();
        if labels.len() != posts {
            return Err(PipelineError::ResultMismatch {
                posts,
                results: labels.len(),
                kind: "cluster labels",
            });
        }
        if neighbors.len() != posts {
            return Err(PipelineError::ResultMismatch {
                posts,
                results: neighbors.len(),
                kind: "neighbor lists",
            });
        }

        for ((post, &label), list) in corpus.iter_flattened_mut().zip(labels).zip(neighbors) {
            let base = post.base_mut();
            base.cluster = Some(label);
            base.nearest_neighbors = Some(list);
        }
        Ok(())
    }

    /// Save the augmented corpus.
    pub fn save(&self, corpus: &Corpus) -> StorageResult<()> {
        save_json_atomic(&self.output, corpus)?;
        tracing::info!(
            target: "storage",
            "wrote {} posts to {}",
            corpus.len(),
            self.output.display()
        );
        Ok(())
    }
}
