use std::sync::Arc;

use crate::config::{ModeSetting, Settings};
use crate::core::{
    context::{format_context, NO_DATA_MESSAGE},
    embedder::HashEmbedder,
    filters::{filter_corpus, MetadataFilterExtractor},
    hybrid::HybridScoreCombiner,
    keyword::KeywordScorer,
    ranking::{Candidate, ScoredCandidate},
    rerank::{rerank, LexicalReranker, Reranker},
    semantic::{IndexReport, SemanticIndex},
};
use crate::models::{Corpus, QueryFilters, RetrievalResult};
use crate::services::cache::EmbeddingCacheStore;

/// Which scoring stages run, fixed when the retriever is built
#[derive(Clone)]
pub enum RetrievalMode {
    KeywordOnly,
    Hybrid {
        index: Arc<SemanticIndex>,
    },
    HybridReranked {
        index: Arc<SemanticIndex>,
        reranker: Arc<dyn Reranker>,
    },
}

impl RetrievalMode {
    pub fn name(&self) -> &'static str {
        match self {
            RetrievalMode::KeywordOnly => "keyword",
            RetrievalMode::Hybrid { .. } => "hybrid",
            RetrievalMode::HybridReranked { .. } => "hybrid_reranked",
        }
    }

    pub fn index(&self) -> Option<&Arc<SemanticIndex>> {
        match self {
            RetrievalMode::KeywordOnly => None,
            RetrievalMode::Hybrid { index } | RetrievalMode::HybridReranked { index, .. } => Some(index),
        }
    }
}

impl std::fmt::Debug for RetrievalMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RetrievalMode::KeywordOnly => f.write_str("KeywordOnly"),
            RetrievalMode::Hybrid { index } => f.debug_struct("Hybrid").field("index", index).finish(),
            RetrievalMode::HybridReranked { index, reranker } => f
                .debug_struct("HybridReranked")
                .field("index", index)
                .field("reranker", &reranker.model_id())
                .finish(),
        }
    }
}

/// Result of one retrieval call
#[derive(Debug, Clone)]
pub struct RetrievalOutcome {
    pub results: Vec<RetrievalResult>,
    pub context: String,
    pub filters: QueryFilters,
    pub fell_back: bool,
    /// Stages that actually ran; "keyword" when semantic scoring degraded
    pub mode: &'static str,
    pub no_data: bool,
}

/// Question-to-programs retrieval pipeline
///
/// # Pipeline Stages
/// 1. Metadata filter extraction and corpus filtering
/// 2. Keyword scoring
/// 3. Semantic scoring and hybrid blend (hybrid modes)
/// 4. Pairwise reranking (reranked mode)
/// 5. Context formatting
#[derive(Debug)]
pub struct Retriever {
    extractor: MetadataFilterExtractor,
    keyword: KeywordScorer,
    combiner: HybridScoreCombiner,
    mode: RetrievalMode,
    final_top_k: usize,
}

impl Retriever {
    pub fn new(
        extractor: MetadataFilterExtractor,
        keyword: KeywordScorer,
        combiner: HybridScoreCombiner,
        mode: RetrievalMode,
        final_top_k: usize,
    ) -> Self {
        Self {
            extractor,
            keyword,
            combiner,
            mode,
            final_top_k,
        }
    }

    pub fn keyword_only() -> Self {
        Self::new(
            MetadataFilterExtractor::default(),
            KeywordScorer::default(),
            HybridScoreCombiner::default(),
            RetrievalMode::KeywordOnly,
            5,
        )
    }

    /// Build the pipeline with the built-in embedder and reranker
    pub fn from_settings(settings: &Settings) -> Self {
        let retrieval = &settings.retrieval;

        let index = || {
            Arc::new(SemanticIndex::new(
                Arc::new(HashEmbedder::new(retrieval.embedding_dimension)),
                EmbeddingCacheStore::new(&settings.cache.embedding_path),
                settings.cache.query_cache_size,
                retrieval.semantic_top_k,
            ))
        };

        let mode = match retrieval.mode {
            ModeSetting::Keyword => RetrievalMode::KeywordOnly,
            ModeSetting::Hybrid => RetrievalMode::Hybrid { index: index() },
            ModeSetting::HybridReranked => RetrievalMode::HybridReranked {
                index: index(),
                reranker: Arc::new(LexicalReranker::new()),
            },
        };
        tracing::info!("Retrieval mode: {}", mode.name());

        Self::new(
            MetadataFilterExtractor::new(&settings.lexicon),
            KeywordScorer::new(retrieval.keyword_top_k),
            HybridScoreCombiner::new(retrieval.semantic_weight, retrieval.keyword_weight, retrieval.hybrid_top_k),
            mode,
            retrieval.final_top_k,
        )
    }

    pub fn mode(&self) -> &RetrievalMode {
        &self.mode
    }

    pub fn indexed_vectors(&self) -> usize {
        self.mode.index().map_or(0, |index| index.len())
    }

    /// Rebuild the semantic index; `None` in keyword-only mode
    pub fn reindex(&self, corpus: &Corpus, force: bool) -> Option<IndexReport> {
        self.mode.index().map(|index| index.rebuild(corpus, force))
    }

    /// Drop cached embeddings so the next query rebuilds them
    pub fn invalidate(&self) {
        if let Some(index) = self.mode.index() {
            index.invalidate();
        }
    }

    /// Rank the corpus for `query` and render the top results as context
    ///
    /// Never fails: semantic or reranker problems degrade to the keyword ranking.
    pub fn retrieve(&self, query: &str, corpus: &Corpus, limit: Option<usize>) -> RetrievalOutcome {
        let filters = self.extractor.extract(query);

        if corpus.is_empty() {
            return RetrievalOutcome {
                results: Vec::new(),
                context: NO_DATA_MESSAGE.to_string(),
                filters,
                fell_back: false,
                mode: self.mode.name(),
                no_data: true,
            };
        }

        let limit = limit.unwrap_or(self.final_top_k).max(1);
        let filtered = filter_corpus(&corpus.programs, &filters);
        let mut keyword = self.keyword.search(query, &filtered.programs);
        tracing::debug!(
            "Query filters {:?}: {} candidates, {} keyword hits",
            filters,
            filtered.programs.len(),
            keyword.len()
        );

        let (ranked, mode) = match &self.mode {
            RetrievalMode::KeywordOnly => {
                keyword.truncate(limit);
                (keyword, self.mode.name())
            }
            RetrievalMode::Hybrid { index } => match self.semantic(index, query, corpus, &filtered.programs) {
                Some(semantic) => {
                    let mut hybrid = self.combiner.combine(&semantic, &keyword);
                    hybrid.truncate(limit);
                    (hybrid, self.mode.name())
                }
                None => {
                    keyword.truncate(limit);
                    (keyword, RetrievalMode::KeywordOnly.name())
                }
            },
            RetrievalMode::HybridReranked { index, reranker } => {
                match self.semantic(index, query, corpus, &filtered.programs) {
                    Some(semantic) => {
                        let hybrid = self.combiner.combine(&semantic, &keyword);
                        (rerank(Some(reranker.as_ref()), query, hybrid, limit), self.mode.name())
                    }
                    None => {
                        keyword.truncate(limit);
                        (keyword, RetrievalMode::KeywordOnly.name())
                    }
                }
            }
        };

        let programs: Vec<_> = ranked.iter().map(|r| r.program).collect();
        let context = format_context(&programs);

        let results = ranked
            .iter()
            .enumerate()
            .map(|(i, r)| RetrievalResult {
                program: r.program.clone(),
                score: r.score,
                rank: i + 1,
            })
            .collect();

        RetrievalOutcome {
            results,
            context,
            filters,
            fell_back: filtered.fell_back,
            mode,
            no_data: false,
        }
    }

    fn semantic<'a>(
        &self,
        index: &SemanticIndex,
        query: &str,
        corpus: &Corpus,
        candidates: &[Candidate<'a>],
    ) -> Option<Vec<ScoredCandidate<'a>>> {
        index.ensure(corpus);
        match index.search(query, candidates) {
            Ok(scored) => Some(scored),
            Err(e) => {
                tracing::warn!("Semantic scoring unavailable, using keyword ranking: {}", e);
                None
            }
        }
    }
}

impl Default for Retriever {
    fn default() -> Self {
        Self::keyword_only()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::embedder::{EmbedError, Embedder};
    use crate::models::{Category, Program};

    struct OfflineEmbedder;

    impl Embedder for OfflineEmbedder {
        fn model_id(&self) -> &str {
            "offline"
        }

        fn dimension(&self) -> usize {
            8
        }

        fn embed(&self, _text: &str) -> Result<Vec<f32>, EmbedError> {
            Err(EmbedError::Unavailable("no model".to_string()))
        }
    }

    fn corpus() -> Corpus {
        let program = |name: &str, jurisdiction: &str, category: Category| Program {
            name: name.to_string(),
            jurisdiction: jurisdiction.to_string(),
            category,
            ..Default::default()
        };
        Corpus::new(
            "v1",
            vec![
                program("Express Entry", "Canada", Category::Work),
                program("Student Permit", "Canada", Category::Study),
                program("Skilled Independent", "Australia", Category::Work),
                program("Graduate Visa", "UK", Category::Study),
            ],
        )
    }

    fn hybrid(dir: &tempfile::TempDir, embedder: Arc<dyn Embedder>, reranked: bool) -> Retriever {
        let index = Arc::new(SemanticIndex::new(
            embedder,
            EmbeddingCacheStore::new(dir.path().join("embeddings.json")),
            64,
            20,
        ));
        let mode = if reranked {
            RetrievalMode::HybridReranked {
                index,
                reranker: Arc::new(LexicalReranker::new()),
            }
        } else {
            RetrievalMode::Hybrid { index }
        };
        Retriever::new(
            MetadataFilterExtractor::default(),
            KeywordScorer::default(),
            HybridScoreCombiner::default(),
            mode,
            5,
        )
    }

    #[test]
    fn test_keyword_only_with_filters() {
        let outcome = Retriever::keyword_only().retrieve("work permits in canada", &corpus(), None);

        assert_eq!(outcome.filters.jurisdiction.as_deref(), Some("canada"));
        assert_eq!(outcome.filters.category, Some(Category::Work));
        assert_eq!(outcome.mode, "keyword");
        assert_eq!(outcome.results.len(), 1);
        assert_eq!(outcome.results[0].program.name, "Express Entry");
        assert_eq!(outcome.results[0].rank, 1);
        assert!(outcome.context.contains("Program 1: Express Entry"));
    }

    #[test]
    fn test_hybrid_ranks_are_one_based_and_limited() {
        let dir = tempfile::tempdir().unwrap();
        let retriever = hybrid(&dir, Arc::new(HashEmbedder::new(64)), false);
        let outcome = retriever.retrieve("study visa", &corpus(), Some(2));

        assert_eq!(outcome.mode, "hybrid");
        assert_eq!(outcome.results.len(), 2);
        let ranks: Vec<usize> = outcome.results.iter().map(|r| r.rank).collect();
        assert_eq!(ranks, vec![1, 2]);
        assert_eq!(retriever.indexed_vectors(), 4);
    }

    #[test]
    fn test_semantic_failure_degrades_to_keyword() {
        let dir = tempfile::tempdir().unwrap();
        let retriever = hybrid(&dir, Arc::new(OfflineEmbedder), true);
        let outcome = retriever.retrieve("graduate visa uk", &corpus(), None);

        assert_eq!(outcome.mode, "keyword");
        assert_eq!(outcome.results[0].program.name, "Graduate Visa");
    }

    #[test]
    fn test_repeated_retrieval_is_deterministic() {
        let dir = tempfile::tempdir().unwrap();
        let retriever = hybrid(&dir, Arc::new(HashEmbedder::new(64)), true);
        let corpus = corpus();

        let first = retriever.retrieve("skilled work visa", &corpus, None);
        let second = retriever.retrieve("skilled work visa", &corpus, None);

        let names = |o: &RetrievalOutcome| -> Vec<String> { o.results.iter().map(|r| r.program.name.clone()).collect() };
        assert_eq!(names(&first), names(&second));
        assert_eq!(first.context, second.context);
    }

    #[test]
    fn test_empty_corpus_reports_no_data() {
        let outcome = Retriever::keyword_only().retrieve("anything", &Corpus::default(), None);
        assert!(outcome.no_data);
        assert!(outcome.results.is_empty());
        assert_eq!(outcome.context, NO_DATA_MESSAGE);
    }

    #[test]
    fn test_keyword_only_has_no_index() {
        let retriever = Retriever::keyword_only();
        assert!(retriever.reindex(&corpus(), true).is_none());
        assert_eq!(retriever.indexed_vectors(), 0);
    }
}
