//! Per-cluster descriptive statistics.

use serde::{Deserialize, Serialize};

use crate::types::{Platform, Post};

/// Sample posts kept per cluster.
pub const SAMPLE_POSTS: usize = 3;

/// Characters of content kept per sample.
pub const SAMPLE_CHARS: usize = 100;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformCounts {
    pub twitter: usize,
    pub reddit: usize,
}

impl PlatformCounts {
    pub fn get(&self, platform: Platform) -> usize {
        match platform {
            Platform::Twitter => self.twitter,
            Platform::Reddit => self.reddit,
        }
    }

    fn record(&mut self, platform: Platform) {
        match platform {
            Platform::Twitter => self.twitter += 1,
            Platform::Reddit => self.reddit += 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterStats {
    pub cluster: usize,
    pub size: usize,
    pub platforms: PlatformCounts,
    /// First posts of the cluster in flattening order, truncated
    pub sample_posts: Vec<String>,
}

/// First [`SAMPLE_CHARS`] characters of `content` followed by `...`.
pub fn truncate_sample(content: &str) -> String {
    let mut sample: String = content.chars().take(SAMPLE_CHARS).collect();
    sample.push_str("...");
    sample
}

/// Aggregate posts by label.
///
/// `posts` and `labels` are paired by position. Every cluster in `[0, k)` is
/// reported, empty ones with size 0; labels at or above `k` extend the range.
pub fn analyze_clusters<'a>(
    posts: impl IntoIterator<Item = &'a Post>,
    labels: &[usize],
    k: usize,
) -> Vec<ClusterStats> {
    let n_clusters = labels.iter().map(|l| l + 1).max().unwrap_or(0).max(k);
    let mut stats: Vec<ClusterStats> = (0..n_clusters)
        .map(|cluster| ClusterStats {
            cluster,
            size: 0,
            platforms: PlatformCounts::default(),
            sample_posts: Vec::new(),
        })
        .collect();

    for (post, &label) in posts.into_iter().zip(labels) {
        let entry = &mut stats[label];
        entry.size += 1;
        entry.platforms.record(post.platform());
        if entry.sample_posts.len() < SAMPLE_POSTS {
            entry.sample_posts.push(truncate_sample(post.content()));
        }
    }

    stats
}
