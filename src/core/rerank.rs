use std::collections::HashSet;
use thiserror::Error;

use crate::core::ranking::{tokenize, ScoredCandidate};

/// Errors raised by a pairwise relevance model
#[derive(Debug, Error)]
pub enum RerankError {
    #[error("Reranker unavailable: {0}")]
    Unavailable(String),

    #[error("Reranker returned {actual} scores for {expected} documents")]
    ScoreCountMismatch { expected: usize, actual: usize },
}

/// Pairwise (query, document) relevance model
pub trait Reranker: Send + Sync {
    fn model_id(&self) -> &str;

    /// One score per document, higher is more relevant
    fn score_pairs(&self, query: &str, documents: &[String]) -> Result<Vec<f32>, RerankError>;
}

/// Lexical pairwise scorer used when no learned cross-encoder is configured
///
/// Query-term coverage plus a small precision term, with a bonus for each query
/// bigram that appears in order in the document.
#[derive(Debug, Clone, Default)]
pub struct LexicalReranker;

impl LexicalReranker {
    pub fn new() -> Self {
        Self
    }

    fn score_pair(query_tokens: &[String], query_set: &HashSet<&str>, document: &str) -> f32 {
        let doc_tokens = tokenize(document);
        if query_set.is_empty() || doc_tokens.is_empty() {
            return 0.0;
        }
        let doc_set: HashSet<&str> = doc_tokens.iter().map(String::as_str).collect();

        let matched = query_set.intersection(&doc_set).count() as f32;
        let coverage = matched / query_set.len() as f32;
        let precision = matched / doc_set.len() as f32;

        let bigrams = query_tokens
            .windows(2)
            .filter(|pair| {
                doc_tokens
                    .windows(2)
                    .any(|d| d[0] == pair[0] && d[1] == pair[1])
            })
            .count() as f32;

        coverage + 0.25 * precision + 0.5 * bigrams
    }
}

impl Reranker for LexicalReranker {
    fn model_id(&self) -> &str {
        "lexical-pairwise-v1"
    }

    fn score_pairs(&self, query: &str, documents: &[String]) -> Result<Vec<f32>, RerankError> {
        let query_tokens = tokenize(query);
        let query_set: HashSet<&str> = query_tokens.iter().map(String::as_str).collect();
        Ok(documents
            .iter()
            .map(|doc| Self::score_pair(&query_tokens, &query_set, doc))
            .collect())
    }
}

/// Re-order `candidates` with `reranker` and keep `limit`
///
/// Candidates keep their incoming score; the pairwise score only decides order.
/// Without a reranker, or when it fails, the incoming order is kept and truncated.
pub fn rerank<'a>(
    reranker: Option<&dyn Reranker>,
    query: &str,
    mut candidates: Vec<ScoredCandidate<'a>>,
    limit: usize,
) -> Vec<ScoredCandidate<'a>> {
    let Some(reranker) = reranker.filter(|_| !candidates.is_empty()) else {
        candidates.truncate(limit);
        return candidates;
    };

    let documents: Vec<String> = candidates.iter().map(|c| c.program.summary()).collect();
    let scores = reranker
        .score_pairs(query, &documents)
        .and_then(|scores| {
            if scores.len() == documents.len() {
                Ok(scores)
            } else {
                Err(RerankError::ScoreCountMismatch {
                    expected: documents.len(),
                    actual: scores.len(),
                })
            }
        });

    match scores {
        Ok(scores) => {
            let mut reranked: Vec<(ScoredCandidate<'a>, f32)> = candidates.into_iter().zip(scores).collect();
            reranked.sort_by(|(a, a_score), (b, b_score)| {
                b_score
                    .total_cmp(a_score)
                    .then_with(|| a.position.cmp(&b.position))
                    .then_with(|| a.program.name.cmp(&b.program.name))
            });
            reranked.into_iter().take(limit).map(|(c, _)| c).collect()
        }
        Err(e) => {
            tracing::warn!("Reranking with {} failed, keeping hybrid order: {}", reranker.model_id(), e);
            candidates.truncate(limit);
            candidates
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ranking::candidates;
    use crate::models::{Category, Program};

    struct FailingReranker;

    impl Reranker for FailingReranker {
        fn model_id(&self) -> &str {
            "failing"
        }

        fn score_pairs(&self, _query: &str, _documents: &[String]) -> Result<Vec<f32>, RerankError> {
            Err(RerankError::Unavailable("offline".to_string()))
        }
    }

    fn programs() -> Vec<Program> {
        vec![
            Program {
                name: "Express Entry".to_string(),
                jurisdiction: "Canada".to_string(),
                category: Category::Work,
                ..Default::default()
            },
            Program {
                name: "Student Visa".to_string(),
                jurisdiction: "Australia".to_string(),
                category: Category::Study,
                ..Default::default()
            },
            Program {
                name: "Working Holiday".to_string(),
                jurisdiction: "Australia".to_string(),
                category: Category::Tourist,
                ..Default::default()
            },
        ]
    }

    fn hybrid_order(programs: &[Program]) -> Vec<ScoredCandidate<'_>> {
        candidates(programs)
            .into_iter()
            .enumerate()
            .map(|(i, c)| ScoredCandidate::new(c, 1.0 - i as f64 * 0.1))
            .collect()
    }

    #[test]
    fn test_reranker_reorders() {
        let programs = programs();
        let reranker = LexicalReranker::new();
        let results = rerank(Some(&reranker as &dyn Reranker), "student visa in australia", hybrid_order(&programs), 2);

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].program.name, "Student Visa");
    }

    #[test]
    fn test_rerank_keeps_incoming_scores() {
        let programs = programs();
        let reranker = LexicalReranker::new();
        let results = rerank(Some(&reranker as &dyn Reranker), "student visa in australia", hybrid_order(&programs), 3);

        assert_eq!(results[0].program.name, "Student Visa");
        assert!((results[0].score - 0.9).abs() < 1e-9);
        assert!(results.iter().all(|r| (0.0..=1.0).contains(&r.score)));
    }

    #[test]
    fn test_missing_reranker_truncates() {
        let programs = programs();
        let results = rerank(None, "anything", hybrid_order(&programs), 2);
        let names: Vec<&str> = results.iter().map(|r| r.program.name.as_str()).collect();
        assert_eq!(names, vec!["Express Entry", "Student Visa"]);
    }

    #[test]
    fn test_failing_reranker_degrades() {
        let programs = programs();
        let results = rerank(Some(&FailingReranker as &dyn Reranker), "student", hybrid_order(&programs), 5);
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].program.name, "Express Entry");
    }

    #[test]
    fn test_bigram_bonus() {
        let reranker = LexicalReranker::new();
        let scores = reranker
            .score_pairs(
                "working holiday",
                &["Working Holiday tourist Australia".to_string(), "Holiday Working".to_string()],
            )
            .unwrap();
        // Same coverage, but only the first keeps the phrase in order
        assert!(scores[0] > scores[1]);
    }
}
