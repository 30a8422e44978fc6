use crate::config::ScoringSettings;
use crate::core::{
    costs::estimate_total,
    filters::filter_for_profile,
    gaps::GapAnalyzer,
    scoring::{EducationTable, EligibilityScorer},
};
use crate::models::{Category, Corpus, MatchResult, Program, ScoringWeights, Thresholds, Tier, UserProfile};

/// Result of the matching process
#[derive(Debug)]
pub struct MatchOutcome {
    pub matches: Vec<MatchResult>,
    pub total_programs: usize,
    /// True when the profile's preferences matched nothing and the whole corpus was scored
    pub fell_back: bool,
}

impl MatchOutcome {
    /// Best `n` matches, already in rank order
    pub fn top_matches(&self, n: usize) -> &[MatchResult] {
        &self.matches[..n.min(self.matches.len())]
    }

    pub fn eligible_matches(&self) -> Vec<&MatchResult> {
        self.matches.iter().filter(|m| m.eligible).collect()
    }

    pub fn filter_by_category(&self, category: Category) -> Vec<&MatchResult> {
        self.matches.iter().filter(|m| m.category == category).collect()
    }

    pub fn eligible_count(&self) -> usize {
        self.matches.iter().filter(|m| m.eligible).count()
    }
}

/// Main matching orchestrator
///
/// # Pipeline Stages
/// 1. Preference pre-filter (jurisdictions, categories) with full-corpus fallback
/// 2. Weighted eligibility score
/// 3. Hard-cutoff gap analysis
/// 4. Tier classification and ranking
#[derive(Debug, Clone)]
pub struct Matcher {
    scorer: EligibilityScorer,
    gaps: GapAnalyzer,
    education: EducationTable,
    thresholds: Thresholds,
}

impl Matcher {
    pub fn new(weights: ScoringWeights, thresholds: Thresholds, education: EducationTable) -> Self {
        Self {
            scorer: EligibilityScorer::new(weights, education.clone()),
            gaps: GapAnalyzer::new(education.clone()),
            education,
            thresholds,
        }
    }

    pub fn from_settings(settings: &ScoringSettings) -> Self {
        Self::new(
            ScoringWeights::from(&settings.weights),
            Thresholds::from(&settings.thresholds),
            EducationTable::new(&settings.education_levels),
        )
    }

    pub fn with_default_weights() -> Self {
        Self::from_settings(&ScoringSettings::default())
    }

    pub fn thresholds(&self) -> Thresholds {
        self.thresholds
    }

    /// Whether the configured education table recognises a level
    pub fn knows_education(&self, level: &str) -> bool {
        self.education.contains(level)
    }

    /// Tier from the reported score; eligible needs a high or medium tier and no gaps
    pub fn classify(&self, score: f64, gaps: &[String]) -> (Tier, bool) {
        let tier = if score >= self.thresholds.high {
            Tier::High
        } else if score >= self.thresholds.medium {
            Tier::Medium
        } else {
            Tier::Low
        };
        let eligible = tier != Tier::Low && gaps.is_empty();
        (tier, eligible)
    }

    /// Score one program against a profile
    pub fn evaluate(&self, profile: &UserProfile, program: &Program) -> MatchResult {
        // Tier is decided on the one-decimal score that is reported
        let score = round_score(self.scorer.calculate_total_score(profile, &program.requirements));
        let gaps = self.gaps.identify_gaps(profile, &program.requirements);
        let (tier, eligible) = self.classify(score, &gaps);

        MatchResult {
            name: program.name.clone(),
            jurisdiction: program.jurisdiction.clone(),
            category: program.category,
            score,
            tier,
            eligible,
            gaps,
            language_gap: self.gaps.language_gap(profile, &program.requirements),
            fees: program.fees.clone(),
            processing_time: program.processing_time.clone(),
            language: program.requirements.language.clone(),
            sources: program.sources.clone(),
            estimated_cost: estimate_total(&program.fees),
        }
    }

    /// Score every program the profile's preferences admit, best first
    ///
    /// Ties keep corpus order.
    pub fn rank(&self, profile: &UserProfile, corpus: &Corpus) -> MatchOutcome {
        let filtered = filter_for_profile(&corpus.programs, profile);
        tracing::debug!(
            "Matching profile against {} of {} programs",
            filtered.programs.len(),
            corpus.len()
        );

        let mut scored: Vec<MatchResult> = filtered
            .programs
            .iter()
            .map(|candidate| self.evaluate(profile, candidate.program))
            .collect();

        // sort_by is stable, so equal scores stay in corpus order
        scored.sort_by(|a, b| b.score.total_cmp(&a.score));

        MatchOutcome {
            matches: scored,
            total_programs: corpus.len(),
            fell_back: filtered.fell_back,
        }
    }
}

#[inline]
fn round_score(score: f64) -> f64 {
    (score * 10.0).round() / 10.0
}

impl Default for Matcher {
    fn default() -> Self {
        Self::with_default_weights()
    }
}
