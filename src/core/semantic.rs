use moka::sync::Cache;
use parking_lot::{Mutex, RwLock};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::core::embedder::{cosine_similarity, EmbedError, Embedder};
use crate::core::ranking::{sort_and_truncate, Candidate, ScoredCandidate};
use crate::models::{Corpus, Program, ProgramKey};
use crate::services::cache::{CacheKey, EmbeddingCacheFile, EmbeddingCacheStore};

/// Summary of an index build
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexReport {
    pub indexed: usize,
    pub encoded: usize,
    pub cache_key: String,
}

#[derive(Debug, Default)]
struct IndexState {
    key: Option<String>,
    vectors: HashMap<ProgramKey, Vec<f32>>,
}

/// Embedding index over the program corpus, backed by an on-disk cache
///
/// Built lazily on first use. Readers share the in-memory vectors; builds and cache
/// writes are serialized through `writer`.
pub struct SemanticIndex {
    embedder: Arc<dyn Embedder>,
    store: EmbeddingCacheStore,
    state: RwLock<IndexState>,
    writer: Mutex<()>,
    query_cache: Cache<String, Arc<Vec<f32>>>,
    top_k: usize,
}

impl SemanticIndex {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        store: EmbeddingCacheStore,
        query_cache_size: u64,
        top_k: usize,
    ) -> Self {
        Self {
            embedder,
            store,
            state: RwLock::new(IndexState::default()),
            writer: Mutex::new(()),
            query_cache: Cache::new(query_cache_size),
            top_k,
        }
    }

    pub fn model_id(&self) -> &str {
        self.embedder.model_id()
    }

    /// Number of vectors currently held in memory
    pub fn len(&self) -> usize {
        self.state.read().vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Make sure every program in `corpus` has a vector, loading or building as needed
    pub fn ensure(&self, corpus: &Corpus) -> IndexReport {
        let expected = self.cache_key(corpus);
        {
            let state = self.state.read();
            if state.key.as_deref() == Some(expected.as_str()) && covers(&state.vectors, corpus) {
                return IndexReport {
                    indexed: state.vectors.len(),
                    encoded: 0,
                    cache_key: expected,
                };
            }
        }
        self.build(corpus, false)
    }

    /// Rebuild the index; `force` discards every cached vector first
    ///
    /// Forcing is required after swapping the embedding model for one that reports
    /// the same identity.
    pub fn rebuild(&self, corpus: &Corpus, force: bool) -> IndexReport {
        self.build(corpus, force)
    }

    /// Drop the in-memory index and the cache file
    pub fn invalidate(&self) {
        let _guard = self.writer.lock();
        *self.state.write() = IndexState::default();
        self.query_cache.invalidate_all();
        if let Err(e) = self.store.invalidate() {
            tracing::warn!("Failed to remove embedding cache {}: {}", self.store.path().display(), e);
        }
    }

    fn build(&self, corpus: &Corpus, force: bool) -> IndexReport {
        let _guard = self.writer.lock();
        let expected = self.cache_key(corpus);

        let mut vectors = if force {
            tracing::info!("Forced reindex of {} programs", corpus.len());
            self.query_cache.invalidate_all();
            HashMap::new()
        } else {
            let state = self.state.read();
            if state.key.as_deref() == Some(expected.as_str()) {
                if covers(&state.vectors, corpus) {
                    return IndexReport {
                        indexed: state.vectors.len(),
                        encoded: 0,
                        cache_key: expected,
                    };
                }
                state.vectors.clone()
            } else {
                drop(state);
                self.load_cached(&expected)
            }
        };

        let wanted: HashSet<ProgramKey> = corpus.programs.iter().map(Program::key).collect();
        let before = vectors.len();
        vectors.retain(|key, _| wanted.contains(key));
        let pruned = before - vectors.len();

        let mut encoded = 0;
        for program in &corpus.programs {
            let key = program.key();
            if vectors.contains_key(&key) {
                continue;
            }
            match self.embedder.embed(&canonical_text(program)) {
                Ok(vector) => {
                    vectors.insert(key, vector);
                    encoded += 1;
                }
                Err(e) => tracing::warn!("Skipping embedding for {}: {}", key, e),
            }
        }

        if encoded > 0 || pruned > 0 || force {
            let mut file = EmbeddingCacheFile::new(
                expected.clone(),
                self.embedder.model_id(),
                self.embedder.dimension(),
                &corpus.version,
            );
            file.entries = vectors.iter().map(|(k, v)| (k.0.clone(), v.clone())).collect();
            if let Err(e) = self.store.save(&file) {
                tracing::error!("Failed to persist embedding cache: {}", e);
            }
            tracing::info!(
                "Indexed {} programs ({} encoded, {} pruned) with {}",
                vectors.len(),
                encoded,
                pruned,
                self.embedder.model_id()
            );
        }

        let indexed = vectors.len();
        *self.state.write() = IndexState {
            key: Some(expected.clone()),
            vectors,
        };

        IndexReport {
            indexed,
            encoded,
            cache_key: expected,
        }
    }

    fn load_cached(&self, expected: &str) -> HashMap<ProgramKey, Vec<f32>> {
        match self.store.load(expected) {
            Ok(Some(file)) => {
                tracing::info!("Loaded {} program embeddings from cache", file.entries.len());
                file.entries.into_iter().map(|(k, v)| (ProgramKey(k), v)).collect()
            }
            Ok(None) => HashMap::new(),
            Err(e) => {
                tracing::warn!("Embedding cache unusable ({}), reindexing", e);
                HashMap::new()
            }
        }
    }

    fn cache_key(&self, corpus: &Corpus) -> String {
        CacheKey::embeddings(&corpus.version, self.embedder.model_id(), self.embedder.dimension())
    }

    fn query_vector(&self, query: &str) -> Result<Arc<Vec<f32>>, EmbedError> {
        let key = CacheKey::query(self.embedder.model_id(), query);
        if let Some(vector) = self.query_cache.get(&key) {
            return Ok(vector);
        }
        let vector = Arc::new(self.embedder.embed(query)?);
        self.query_cache.insert(key, vector.clone());
        Ok(vector)
    }

    /// Cosine similarity of `query` against each candidate's cached vector
    ///
    /// Candidates without a vector are skipped. Call [`SemanticIndex::ensure`] first.
    pub fn search<'a>(
        &self,
        query: &str,
        candidates: &[Candidate<'a>],
    ) -> Result<Vec<ScoredCandidate<'a>>, EmbedError> {
        let query_vector = self.query_vector(query)?;
        if query_vector.len() != self.embedder.dimension() {
            return Err(EmbedError::DimensionMismatch {
                expected: self.embedder.dimension(),
                actual: query_vector.len(),
            });
        }

        let state = self.state.read();
        let mut scored: Vec<ScoredCandidate<'a>> = candidates
            .iter()
            .filter_map(|candidate| {
                let vector = state.vectors.get(&candidate.program.key())?;
                let similarity = cosine_similarity(&query_vector, vector);
                Some(ScoredCandidate::new(*candidate, f64::from(similarity)))
            })
            .collect();
        drop(state);

        sort_and_truncate(&mut scored, self.top_k);
        tracing::debug!("Semantic search scored {} candidates", scored.len());
        Ok(scored)
    }
}

impl std::fmt::Debug for SemanticIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SemanticIndex")
            .field("model_id", &self.embedder.model_id())
            .field("vectors", &self.len())
            .field("top_k", &self.top_k)
            .finish()
    }
}

fn covers(vectors: &HashMap<ProgramKey, Vec<f32>>, corpus: &Corpus) -> bool {
    corpus.programs.iter().all(|p| vectors.contains_key(&p.key()))
}

/// Text embedded for a program: name, category, jurisdiction and a requirement snippet
pub fn canonical_text(program: &Program) -> String {
    let mut parts: Vec<String> = vec![
        program.name.clone(),
        program.category.to_string(),
        program.jurisdiction.clone(),
    ];

    let reqs = &program.requirements;
    if let Some(education) = reqs.education.as_deref().filter(|e| !e.is_empty()) {
        parts.push(education.to_string());
    }
    if let Some(years) = reqs.experience_years.filter(|y| *y > 0.0) {
        parts.push(format!("{} years experience", years));
    }
    if let Some(language) = reqs.language.as_deref().filter(|l| !l.is_empty()) {
        parts.push(language.to_string());
    }

    parts
        .into_iter()
        .filter(|p| !p.trim().is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
