use std::cmp::Ordering;

use crate::models::Program;

/// A corpus program paired with its position in the snapshot
#[derive(Debug, Clone, Copy)]
pub struct Candidate<'a> {
    pub position: usize,
    pub program: &'a Program,
}

/// A candidate carrying a relevance score from one pipeline stage
#[derive(Debug, Clone, Copy)]
pub struct ScoredCandidate<'a> {
    pub position: usize,
    pub program: &'a Program,
    pub score: f64,
}

impl<'a> ScoredCandidate<'a> {
    pub fn new(candidate: Candidate<'a>, score: f64) -> Self {
        Self {
            position: candidate.position,
            program: candidate.program,
            score,
        }
    }

    pub fn candidate(&self) -> Candidate<'a> {
        Candidate {
            position: self.position,
            program: self.program,
        }
    }
}

/// Enumerate a slice of programs as candidates in corpus order
pub fn candidates(programs: &[Program]) -> Vec<Candidate<'_>> {
    programs
        .iter()
        .enumerate()
        .map(|(position, program)| Candidate { position, program })
        .collect()
}

/// Descending score, then corpus position, then name
#[inline]
pub fn rank_order(a: &ScoredCandidate<'_>, b: &ScoredCandidate<'_>) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| a.position.cmp(&b.position))
        .then_with(|| a.program.name.cmp(&b.program.name))
}

/// Sort by [`rank_order`] and keep the first `top_k`
pub fn sort_and_truncate(scored: &mut Vec<ScoredCandidate<'_>>, top_k: usize) {
    scored.sort_by(rank_order);
    scored.truncate(top_k);
}

/// Lowercased alphanumeric tokens of `text`, in order of appearance
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn program(name: &str) -> Program {
        Program {
            name: name.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_tokenize_splits_punctuation() {
        assert_eq!(
            tokenize("Skilled Worker (subclass 189)!"),
            vec!["skilled", "worker", "subclass", "189"]
        );
    }

    #[test]
    fn test_equal_scores_keep_corpus_order() {
        let programs = vec![program("b"), program("a"), program("c")];
        let mut scored: Vec<ScoredCandidate<'_>> = candidates(&programs)
            .into_iter()
            .map(|c| ScoredCandidate::new(c, 1.0))
            .collect();
        scored[2].score = 2.0;

        sort_and_truncate(&mut scored, 10);

        let names: Vec<&str> = scored.iter().map(|s| s.program.name.as_str()).collect();
        assert_eq!(names, vec!["c", "b", "a"]);
    }

    #[test]
    fn test_nan_scores_sort_without_panicking() {
        let programs = vec![program("a"), program("b"), program("c"), program("d")];
        let scores = [f64::NAN, 0.5, f64::NAN, 0.9];
        let mut scored: Vec<ScoredCandidate<'_>> = candidates(&programs)
            .into_iter()
            .zip(scores)
            .map(|(c, s)| ScoredCandidate::new(c, s))
            .collect();

        sort_and_truncate(&mut scored, 10);

        let names: Vec<&str> = scored.iter().map(|s| s.program.name.as_str()).collect();
        // Positive NaN orders above every finite score under total_cmp
        assert_eq!(names, vec!["a", "c", "d", "b"]);
    }
}
