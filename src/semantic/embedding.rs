//! Hashed bag-of-words embeddings.
//!
//! Each post becomes a count vector of fixed dimension: topic ids and content
//! tokens are folded into buckets by modulo. Distinct words may share a
//! bucket; the vector approximates the post's vocabulary, it does not
//! preserve word identity.

use crate::types::Post;

/// Dimension of vectors produced by [`EmbeddingBuilder::default`].
pub const DEFAULT_DIMENSIONS: usize = 200;

/// Version of the token-to-bucket hash. Bump when [`word_hash`] changes.
pub const WORD_HASH_VERSION: u32 = 1;

/// Hash a token for bucket selection (version 1: 64-bit FNV-1a over UTF-8 bytes).
pub fn word_hash(token: &str) -> u64 {
    const FNV_OFFSET_BASIS: u64 = 0xcbf29ce484222325;
    const FNV_PRIME: u64 = 0x100000001b3;

    let mut hash = FNV_OFFSET_BASIS;
    for byte in token.as_bytes() {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

/// Unicode lower-casing followed by Unicode whitespace splitting.
pub fn tokenize(content: &str) -> Vec<String> {
    content
        .to_lowercase()
        .split_whitespace()
        .map(str::to_owned)
        .collect()
}

/// Builds raw (unnormalized) embeddings for posts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmbeddingBuilder {
    dimensions: usize,
}

impl Default for EmbeddingBuilder {
    fn default() -> Self {
        Self {
            dimensions: DEFAULT_DIMENSIONS,
        }
    }
}

impl EmbeddingBuilder {
    /// Create a builder producing vectors of `dimensions` entries.
    ///
    /// Returns `None` for a zero dimension, which has no buckets to fold into.
    pub fn new(dimensions: usize) -> Option<Self> {
        (dimensions > 0).then_some(Self { dimensions })
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Embed raw content and topics. Never fails; empty input gives the zero vector.
    pub fn embed(&self, content: &str, topics: &[u32]) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimensions];
        let dims = self.dimensions as u64;

        for &topic in topics {
            vector[(u64::from(topic) % dims) as usize] += 1.0;
        }

        for token in tokenize(content) {
            vector[(word_hash(&token) % dims) as usize] += 1.0;
        }

        vector
    }

    pub fn embed_post(&self, post: &Post) -> Vec<f32> {
        self.embed(post.content(), post.topics())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PostBase;

    #[test]
    fn test_word_hash_is_fnv1a() {
        // Published FNV-1a 64-bit test vectors
        assert_eq!(word_hash(""), 0xcbf29ce484222325);
        assert_eq!(word_hash("a"), 0xaf63dc4c8601ec8c);
        assert_eq!(word_hash("foobar"), 0x85944171f73967e8);
    }

    #[test]
    fn test_tokenize_lowercases_and_splits_unicode_whitespace() {
        let tokens = tokenize("Rebellion  NOW\tÉCOUTE\u{2003}ferrix\n");
        assert_eq!(tokens, vec!["rebellion", "now", "écoute", "ferrix"]);
    }

    #[test]
    fn test_embedding_has_configured_dimension() {
        let builder = EmbeddingBuilder::new(64).unwrap();
        let vector = builder.embed("the empire is a disease", &[1, 2]);
        assert_eq!(vector.len(), 64);
        assert_eq!(vector.iter().sum::<f32>(), 7.0);
    }

    #[test]
    fn test_topics_fold_modulo_dimension() {
        let builder = EmbeddingBuilder::new(10).unwrap();
        let vector = builder.embed("", &[3, 13, 23]);
        assert_eq!(vector[3], 3.0);
        assert_eq!(vector.iter().sum::<f32>(), 3.0);
    }

    #[test]
    fn test_repeated_words_accumulate() {
        let builder = EmbeddingBuilder::default();
        let vector = builder.embed("Hope hope HOPE", &[]);
        let bucket = (word_hash("hope") % DEFAULT_DIMENSIONS as u64) as usize;
        assert_eq!(vector[bucket], 3.0);
    }

    #[test]
    fn test_empty_post_is_zero_vector() {
        let builder = EmbeddingBuilder::default();
        let post = Post::twitter(PostBase::new("t1", "   "));
        let vector = builder.embed_post(&post);
        assert_eq!(vector.len(), DEFAULT_DIMENSIONS);
        assert!(vector.iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_identical_posts_embed_identically() {
        let builder = EmbeddingBuilder::default();
        let a = Post::twitter(PostBase::new("t1", "rebellion now").with_topics(vec![1]));
        let b = Post::reddit(PostBase::new("r1", "Rebellion Now").with_topics(vec![1]));
        assert_eq!(builder.embed_post(&a), builder.embed_post(&b));
    }

    #[test]
    fn test_zero_dimension_rejected() {
        assert!(EmbeddingBuilder::new(0).is_none());
    }
}
