// Service exports
pub mod cache;
pub mod corpus;

pub use cache::{content_hash, CacheError, CacheKey, EmbeddingCacheFile, EmbeddingCacheStore};
pub use corpus::{parse_corpus, CorpusError, CorpusStore};
