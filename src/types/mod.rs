//! Post and corpus data model.
//!
//! A [`Post`] is a tagged union keyed on `platform`: both variants share a
//! [`PostBase`] (id, content, topics, ...) and carry their own engagement
//! fields. Fields the model does not know about are kept in `extra` and
//! written back unchanged.

use std::collections::HashSet;
use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::{PipelineError, PipelineResult};

/// Canonical flattening order shared by embedding, similarity, clustering
/// and write-back. Every per-post array in a run is indexed by this order.
pub const FLATTEN_ORDER: [Platform; 2] = [Platform::Twitter, Platform::Reddit];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Twitter,
    Reddit,
}

impl Platform {
    /// Key of this platform's list in the corpus document.
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Twitter => "twitter",
            Platform::Reddit => "reddit",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of a post's ranked neighbor list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Neighbor {
    pub id: String,
    pub similarity: f32,
}

/// Deserialize a passthrough field so that an explicit `null` survives as
/// `Some(Value::Null)`; an absent field stays `None` through `default`.
fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

/// Fields shared by every post variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostBase {
    pub id: String,

    pub content: String,

    /// Passed through as given; producers disagree on the format
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topics: Option<Vec<u32>>,

    /// Vector supplied by an external embedding service, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nearest_neighbors: Option<Vec<Neighbor>>,
}

impl PostBase {
    pub fn new(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            timestamp: None,
            topics: None,
            embedding: None,
            cluster: None,
            nearest_neighbors: None,
        }
    }

    pub fn with_topics(mut self, topics: Vec<u32>) -> Self {
        self.topics = Some(topics);
        self
    }
}

/// Engagement fields are kept as raw JSON: the pipeline never reads them,
/// and a mistyped value must not reject the post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TwitterPost {
    #[serde(flatten)]
    pub base: PostBase,

    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub user: Option<Value>,

    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub likes: Option<Value>,

    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub retweets: Option<Value>,

    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RedditPost {
    #[serde(flatten)]
    pub base: PostBase,

    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub subreddit: Option<Value>,

    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub user: Option<Value>,

    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub title: Option<Value>,

    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub upvotes: Option<Value>,

    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub comments: Option<Value>,

    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "platform", rename_all = "lowercase")]
pub enum Post {
    Twitter(TwitterPost),
    Reddit(RedditPost),
}

impl Post {
    pub fn twitter(base: PostBase) -> Self {
        Post::Twitter(TwitterPost {
            base,
            user: None,
            likes: None,
            retweets: None,
            extra: IndexMap::new(),
        })
    }

    pub fn reddit(base: PostBase) -> Self {
        Post::Reddit(RedditPost {
            base,
            subreddit: None,
            user: None,
            title: None,
            upvotes: None,
            comments: None,
            extra: IndexMap::new(),
        })
    }

    pub fn platform(&self) -> Platform {
        match self {
            Post::Twitter(_) => Platform::Twitter,
            Post::Reddit(_) => Platform::Reddit,
        }
    }

    pub fn base(&self) -> &PostBase {
        match self {
            Post::Twitter(post) => &post.base,
            Post::Reddit(post) => &post.base,
        }
    }

    pub fn base_mut(&mut self) -> &mut PostBase {
        match self {
            Post::Twitter(post) => &mut post.base,
            Post::Reddit(post) => &mut post.base,
        }
    }

    pub fn id(&self) -> &str {
        &self.base().id
    }

    pub fn content(&self) -> &str {
        &self.base().content
    }

    /// Topic ids, empty when the post has none.
    pub fn topics(&self) -> &[u32] {
        self.base().topics.as_deref().unwrap_or(&[])
    }
}

/// A full input document: posts grouped by platform.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Corpus {
    #[serde(default)]
    pub twitter: Vec<Post>,

    #[serde(default)]
    pub reddit: Vec<Post>,

    /// Unknown top-level keys, preserved in document order
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

impl Corpus {
    pub fn posts(&self, platform: Platform) -> &[Post] {
        match platform {
            Platform::Twitter => &self.twitter,
            Platform::Reddit => &self.reddit,
        }
    }

    pub fn posts_mut(&mut self, platform: Platform) -> &mut Vec<Post> {
        match platform {
            Platform::Twitter => &mut self.twitter,
            Platform::Reddit => &mut self.reddit,
        }
    }

    /// Posts in flattening order.
    pub fn iter_flattened(&self) -> impl Iterator<Item = &Post> {
        FLATTEN_ORDER
            .iter()
            .flat_map(move |platform| self.posts(*platform).iter())
    }

    /// Mutable posts in flattening order.
    ///
    /// Must visit posts in exactly the same order as [`Corpus::iter_flattened`];
    /// labels and neighbor lists are written back by position.
    pub fn iter_flattened_mut(&mut self) -> impl Iterator<Item = &mut Post> {
        let Corpus {
            twitter, reddit, ..
        } = self;
        twitter.iter_mut().chain(reddit.iter_mut())
    }

    pub fn len(&self) -> usize {
        self.twitter.len() + self.reddit.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Reject the corpus if any id appears more than once, across both lists.
    pub fn ensure_unique_ids(&self) -> PipelineResult<()> {
        let mut seen = HashSet::with_capacity(self.len());
        for post in self.iter_flattened() {
            if !seen.insert(post.id()) {
                return Err(PipelineError::DuplicateId {
                    id: post.id().to_string(),
                });
            }
        }
        Ok(())
    }
}
