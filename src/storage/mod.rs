pub mod error;
pub mod persistence;

pub use error::{StorageError, StorageResult};
pub use persistence::{Persister, load_corpus, parse_corpus, save_json_atomic, write_atomic};
