use std::collections::HashSet;

use crate::core::ranking::{sort_and_truncate, tokenize, Candidate, ScoredCandidate};
use crate::models::{Category, Program};

const JURISDICTION_BONUS: f64 = 3.0;
const CATEGORY_BONUS: f64 = 2.0;
const NAME_TOKEN_WEIGHT: f64 = 0.5;
const REQUIREMENT_TOKEN_WEIGHT: f64 = 0.3;
const MIN_REQUIREMENT_TOKEN_LEN: usize = 4;

/// Lexical relevance from substring and token overlap
#[derive(Debug, Clone, Copy)]
pub struct KeywordScorer {
    top_k: usize,
}

impl KeywordScorer {
    pub fn new(top_k: usize) -> Self {
        Self { top_k }
    }

    /// Score every candidate, drop zero scores, return the best `top_k`
    pub fn search<'a>(&self, query: &str, candidates: &[Candidate<'a>]) -> Vec<ScoredCandidate<'a>> {
        let query_lower = query.to_lowercase();
        let query_tokens: HashSet<String> = tokenize(&query_lower).into_iter().collect();

        let mut scored: Vec<ScoredCandidate<'a>> = candidates
            .iter()
            .filter_map(|candidate| {
                let score = score_program(&query_lower, &query_tokens, candidate.program);
                (score > 0.0).then(|| ScoredCandidate::new(*candidate, score))
            })
            .collect();

        sort_and_truncate(&mut scored, self.top_k);
        tracing::debug!("Keyword search scored {} of {} candidates", scored.len(), candidates.len());
        scored
    }
}

impl Default for KeywordScorer {
    fn default() -> Self {
        Self::new(20)
    }
}

/// Raw keyword score for one program
pub fn score_program(query_lower: &str, query_tokens: &HashSet<String>, program: &Program) -> f64 {
    let mut score = 0.0;

    let jurisdiction = program.jurisdiction.trim().to_lowercase();
    if !jurisdiction.is_empty() && query_lower.contains(&jurisdiction) {
        score += JURISDICTION_BONUS;
    }

    if program.category != Category::Other && query_lower.contains(program.category.as_str()) {
        score += CATEGORY_BONUS;
    }

    let name_tokens: HashSet<String> = tokenize(&program.name).into_iter().collect();
    score += query_tokens.intersection(&name_tokens).count() as f64 * NAME_TOKEN_WEIGHT;

    if !program.requirements.is_empty() {
        let requirements_text = requirements_text(program);
        score += query_tokens
            .iter()
            .filter(|t| t.chars().count() >= MIN_REQUIREMENT_TOKEN_LEN && requirements_text.contains(t.as_str()))
            .count() as f64
            * REQUIREMENT_TOKEN_WEIGHT;
    }

    score
}

/// Stringified requirement set, lowercased
fn requirements_text(program: &Program) -> String {
    serde_json::to_string(&program.requirements)
        .unwrap_or_default()
        .to_lowercase()
}
