use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur with embedding cache operations
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Stale cache: expected key {expected}, found {found}")]
    Stale { expected: String, found: String },

    #[error("Corrupt cache entry {key}: expected {expected} dimensions, got {actual}")]
    Corrupt {
        key: String,
        expected: usize,
        actual: usize,
    },
}

/// Serialized embedding cache
///
/// `key` is a content address over the corpus version and the embedding model, so a
/// file written for another model or corpus is never reused.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmbeddingCacheFile {
    pub key: String,
    pub model_id: String,
    pub dimension: usize,
    pub corpus_version: String,
    pub entries: BTreeMap<String, Vec<f32>>,
}

impl EmbeddingCacheFile {
    pub fn new(key: String, model_id: &str, dimension: usize, corpus_version: &str) -> Self {
        Self {
            key,
            model_id: model_id.to_string(),
            dimension,
            corpus_version: corpus_version.to_string(),
            entries: BTreeMap::new(),
        }
    }

    fn check(&self, expected_key: &str) -> Result<(), CacheError> {
        if self.key != expected_key {
            return Err(CacheError::Stale {
                expected: expected_key.to_string(),
                found: self.key.clone(),
            });
        }
        if let Some((key, vector)) = self.entries.iter().find(|(_, v)| v.len() != self.dimension) {
            return Err(CacheError::Corrupt {
                key: key.clone(),
                expected: self.dimension,
                actual: vector.len(),
            });
        }
        Ok(())
    }
}

/// On-disk store for the embedding cache
#[derive(Debug, Clone)]
pub struct EmbeddingCacheStore {
    path: PathBuf,
}

impl EmbeddingCacheStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the cache if one exists for `expected_key`
    ///
    /// Returns `Ok(None)` when no file exists; stale or corrupt files are errors so the
    /// caller can log and rebuild.
    pub fn load(&self, expected_key: &str) -> Result<Option<EmbeddingCacheFile>, CacheError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let file: EmbeddingCacheFile = serde_json::from_slice(&bytes)?;
        file.check(expected_key)?;
        tracing::debug!("Loaded {} cached embeddings from {}", file.entries.len(), self.path.display());
        Ok(Some(file))
    }

    /// Write the cache atomically (temp file + rename)
    pub fn save(&self, file: &EmbeddingCacheFile) -> Result<(), CacheError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, serde_json::to_vec(file)?)?;
        fs::rename(&tmp, &self.path)?;

        tracing::debug!("Saved {} embeddings to {}", file.entries.len(), self.path.display());
        Ok(())
    }

    /// Delete the cache file; missing files are not an error
    pub fn invalidate(&self) -> Result<(), CacheError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Cache key builder
pub struct CacheKey;

impl CacheKey {
    /// Content address for an embedding cache
    pub fn embeddings(corpus_version: &str, model_id: &str, dimension: usize) -> String {
        let mut hasher = Sha256::new();
        hasher.update(corpus_version.as_bytes());
        hasher.update([0u8]);
        hasher.update(model_id.as_bytes());
        hasher.update([0u8]);
        hasher.update(dimension.to_le_bytes());
        hex::encode(hasher.finalize())
    }

    /// Key for a cached query embedding
    pub fn query(model_id: &str, query: &str) -> String {
        format!("query:{}:{}", model_id, query.trim().to_lowercase())
    }
}

/// SHA-256 of arbitrary bytes, hex encoded
pub fn content_hash(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_key_builder() {
        let a = CacheKey::embeddings("v1", "model", 384);
        assert_eq!(a.len(), 64);
        assert_eq!(a, CacheKey::embeddings("v1", "model", 384));
        assert_ne!(a, CacheKey::embeddings("v2", "model", 384));
        assert_ne!(a, CacheKey::embeddings("v1", "other", 384));
        assert_ne!(a, CacheKey::embeddings("v1", "model", 128));
        assert_eq!(CacheKey::query("m", "  Work Visa "), "query:m:work visa");
    }

    #[test]
    fn test_content_hash_is_lowercase_sha256_hex() {
        assert_eq!(
            content_hash(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_cache_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = EmbeddingCacheStore::new(dir.path().join("nested/cache.json"));
        let key = CacheKey::embeddings("v1", "m", 2);

        assert!(store.load(&key).unwrap().is_none());

        let mut file = EmbeddingCacheFile::new(key.clone(), "m", 2, "v1");
        file.entries.insert("Canada_Express Entry".to_string(), vec![0.6, 0.8]);
        store.save(&file).unwrap();

        let loaded = store.load(&key).unwrap().unwrap();
        assert_eq!(loaded.entries.len(), 1);

        store.invalidate().unwrap();
        assert!(store.load(&key).unwrap().is_none());
    }

    #[test]
    fn test_stale_and_corrupt_files_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = EmbeddingCacheStore::new(dir.path().join("cache.json"));

        let mut file = EmbeddingCacheFile::new("old".to_string(), "m", 2, "v1");
        store.save(&file).unwrap();
        assert!(matches!(store.load("new"), Err(CacheError::Stale { .. })));

        file.entries.insert("x".to_string(), vec![1.0]);
        store.save(&file).unwrap();
        assert!(matches!(store.load("old"), Err(CacheError::Corrupt { .. })));

        std::fs::write(store.path(), b"not json").unwrap();
        assert!(matches!(store.load("old"), Err(CacheError::SerializationError(_))));
    }
}
