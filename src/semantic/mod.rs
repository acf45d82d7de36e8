//! Embedding construction and similarity search over post embeddings.
//!
//! [`EmbeddingBuilder`] turns a post into a raw count vector;
//! [`SimilarityIndex`] ranks posts against each other once every vector has
//! been L2-normalized. The index accepts any uniform dimension, so vectors
//! supplied by an external embedding service work the same way.

mod embedding;
mod similarity;

pub use embedding::{
    DEFAULT_DIMENSIONS, EmbeddingBuilder, WORD_HASH_VERSION, tokenize, word_hash,
};
pub use similarity::{
    DEFAULT_NEIGHBORS, SELF_SENTINEL, SimilarityIndex, cosine_similarity,
    ensure_uniform_dimensions, l2_normalize, normalize_all,
};

