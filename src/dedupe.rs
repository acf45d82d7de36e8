//! Removal of repeated posts ahead of a pipeline run.
//!
//! A post is dropped when its id or its exact content has already been seen
//! earlier in flattening order. The first occurrence always survives.

use std::collections::HashSet;

use crate::types::{Corpus, FLATTEN_ORDER, Platform};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DedupeReport {
    pub kept: usize,
    pub duplicate_ids: usize,
    pub duplicate_content: usize,
    /// Removed posts as `(platform, id)`, in flattening order
    pub removed: Vec<(Platform, String)>,
}

impl DedupeReport {
    pub fn removed_count(&self) -> usize {
        self.removed.len()
    }
}

/// Drop repeated ids and repeated content in place.
pub fn deduplicate(corpus: &mut Corpus) -> DedupeReport {
    let mut report = DedupeReport::default();
    let mut seen_ids: HashSet<String> = HashSet::new();
    let mut seen_content: HashSet<String> = HashSet::new();

    for platform in FLATTEN_ORDER {
        corpus.posts_mut(platform).retain(|post| {
            if seen_ids.contains(post.id()) {
                report.duplicate_ids += 1;
            } else if seen_content.contains(post.content()) {
                report.duplicate_content += 1;
            } else {
                seen_ids.insert(post.id().to_string());
                seen_content.insert(post.content().to_string());
                return true;
            }
            report.removed.push((platform, post.id().to_string()));
            false
        });
    }

    report.kept = corpus.len();
    tracing::info!(
        target: "pipeline",
        "dedupe kept {} posts, removed {} ({} by id, {} by content)",
        report.kept,
        report.removed_count(),
        report.duplicate_ids,
        report.duplicate_content
    );
    report
}
