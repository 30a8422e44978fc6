use std::collections::HashMap;

use crate::core::ranking::{sort_and_truncate, ScoredCandidate};
use crate::models::ProgramKey;

/// Blends keyword and semantic scores into one relevance score
///
/// Each list is normalized by its own maximum before blending, so the weights act on
/// comparable [0, 1] scales.
#[derive(Debug, Clone, Copy)]
pub struct HybridScoreCombiner {
    semantic_weight: f64,
    keyword_weight: f64,
    top_k: usize,
}

impl HybridScoreCombiner {
    pub fn new(semantic_weight: f64, keyword_weight: f64, top_k: usize) -> Self {
        Self {
            semantic_weight,
            keyword_weight,
            top_k,
        }
    }

    pub fn combine<'a>(
        &self,
        semantic: &[ScoredCandidate<'a>],
        keyword: &[ScoredCandidate<'a>],
    ) -> Vec<ScoredCandidate<'a>> {
        let mut merged: Vec<ScoredCandidate<'a>> = Vec::with_capacity(semantic.len() + keyword.len());
        let mut slots: HashMap<ProgramKey, usize> = HashMap::new();

        for (list, weight) in [(semantic, self.semantic_weight), (keyword, self.keyword_weight)] {
            for normalized in normalize(list) {
                let contribution = normalized.score * weight;
                let key = normalized.program.key();
                match slots.get(&key) {
                    Some(&slot) => merged[slot].score += contribution,
                    None => {
                        slots.insert(key, merged.len());
                        merged.push(ScoredCandidate { score: contribution, ..normalized });
                    }
                }
            }
        }

        sort_and_truncate(&mut merged, self.top_k);
        merged
    }
}

impl Default for HybridScoreCombiner {
    fn default() -> Self {
        Self::new(0.6, 0.4, 20)
    }
}

/// Divide every score by the list maximum, clamped to [0, 1]
///
/// A non-positive maximum yields all zeros instead of dividing by it.
pub fn normalize<'a>(scored: &[ScoredCandidate<'a>]) -> Vec<ScoredCandidate<'a>> {
    let max = scored.iter().map(|s| s.score).fold(f64::NEG_INFINITY, f64::max);

    scored
        .iter()
        .map(|s| {
            let score = if max > 0.0 { (s.score / max).clamp(0.0, 1.0) } else { 0.0 };
            ScoredCandidate { score, ..*s }
        })
        .collect()
}
