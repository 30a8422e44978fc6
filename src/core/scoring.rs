use std::collections::HashMap;

use crate::config::EducationLevelConfig;
use crate::models::{AgeRange, Requirements, ScoringWeights, UserProfile};

/// Ordinal ranking of education levels
///
/// Lookups are case-insensitive; unknown levels rank 0.
#[derive(Debug, Clone)]
pub struct EducationTable {
    ordinals: HashMap<String, u32>,
}

impl EducationTable {
    pub fn new(levels: &[EducationLevelConfig]) -> Self {
        let mut ordinals = HashMap::new();
        for level in levels {
            ordinals.insert(normalize_level(&level.name), level.ordinal);
            for alias in &level.aliases {
                ordinals.insert(normalize_level(alias), level.ordinal);
            }
        }
        Self { ordinals }
    }

    pub fn ordinal(&self, level: Option<&str>) -> u32 {
        level
            .and_then(|l| self.ordinals.get(&normalize_level(l)))
            .copied()
            .unwrap_or(0)
    }

    /// Whether a level name or alias is in the table
    pub fn contains(&self, level: &str) -> bool {
        self.ordinals.contains_key(&normalize_level(level))
    }
}

impl Default for EducationTable {
    fn default() -> Self {
        Self::new(&crate::config::ScoringSettings::default().education_levels)
    }
}

fn normalize_level(level: &str) -> String {
    level.trim().to_lowercase()
}

/// Weighted 0-100 eligibility score between a profile and a requirement set
///
/// Score formula:
/// score = (
///     age_score * w_age +              # binary: inside the range or not
///     education_score * w_education +  # partial credit user/required ordinal
///     experience_score * w_experience  # partial credit user/required years
/// ) / (w_age + w_education + w_experience) * 100
#[derive(Debug, Clone)]
pub struct EligibilityScorer {
    weights: ScoringWeights,
    education: EducationTable,
}

impl EligibilityScorer {
    pub fn new(weights: ScoringWeights, education: EducationTable) -> Self {
        Self { weights, education }
    }

    pub fn calculate_total_score(&self, profile: &UserProfile, requirements: &Requirements) -> f64 {
        let age_score = score_age(profile.age, requirements.age.as_ref());
        let education_score = self.score_education(profile.education.as_deref(), requirements.education.as_deref());
        let experience_score = score_experience(profile.experience_years, requirements.experience_years);

        let total_weight = self.weights.total();
        if total_weight <= 0.0 {
            return 0.0;
        }

        let total_score = (age_score * self.weights.age
            + education_score * self.weights.education
            + experience_score * self.weights.experience)
            / total_weight
            * 100.0;

        total_score.clamp(0.0, 100.0)
    }

    /// Education score (0-1)
    /// Full credit at or above the required level, otherwise the ordinal ratio
    pub fn score_education(&self, user_level: Option<&str>, required_level: Option<&str>) -> f64 {
        let Some(required_level) = required_level.filter(|r| !r.trim().is_empty()) else {
            return 1.0;
        };

        let user = self.education.ordinal(user_level);
        let required = self.education.ordinal(Some(required_level));

        if user >= required {
            1.0
        } else {
            (f64::from(user) / f64::from(required)).max(0.0)
        }
    }
}

impl Default for EligibilityScorer {
    fn default() -> Self {
        Self::new(ScoringWeights::default(), EducationTable::default())
    }
}

/// Age score, always 0.0 or 1.0
#[inline]
pub fn score_age(age: u32, requirement: Option<&AgeRange>) -> f64 {
    let Some(range) = requirement else {
        return 1.0;
    };

    if range.lower().is_some_and(|min| age < min) || range.upper().is_some_and(|max| age > max) {
        return 0.0;
    }
    1.0
}

/// Experience score (0-1)
/// Full credit when no years are required or the user meets them
#[inline]
pub fn score_experience(user_years: f64, required_years: Option<f64>) -> f64 {
    let required = match required_years {
        Some(r) if r > 0.0 => r,
        _ => return 1.0,
    };

    if user_years >= required {
        1.0
    } else {
        (user_years / required).max(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(age: u32, education: &str, experience_years: f64) -> UserProfile {
        UserProfile {
            age,
            education: Some(education.to_string()),
            experience_years,
            ..Default::default()
        }
    }

    fn requirements() -> Requirements {
        Requirements {
            age: Some(AgeRange { min: Some(18), max: Some(45) }),
            education: Some("bachelor".to_string()),
            experience_years: Some(3.0),
            language: None,
        }
    }

    #[test]
    fn test_age_score() {
        let range = AgeRange { min: Some(18), max: Some(45) };
        assert_eq!(score_age(30, Some(&range)), 1.0);
        assert_eq!(score_age(50, Some(&range)), 0.0);
        assert_eq!(score_age(15, Some(&range)), 0.0);
        assert_eq!(score_age(18, Some(&range)), 1.0);
        assert_eq!(score_age(45, Some(&range)), 1.0);
        assert_eq!(score_age(30, None), 1.0);
        assert_eq!(score_age(30, Some(&AgeRange::default())), 1.0);
    }

    #[test]
    fn test_education_score() {
        let scorer = EligibilityScorer::default();
        assert_eq!(scorer.score_education(Some("masters"), Some("bachelors")), 1.0);
        assert_eq!(scorer.score_education(Some("bachelor"), Some("Master")), 0.75);
        assert_eq!(scorer.score_education(Some("bachelor"), None), 1.0);
        assert_eq!(scorer.score_education(None, Some("diploma")), 0.0);
        // Unknown requirement ranks 0, so anyone meets it
        assert_eq!(scorer.score_education(None, Some("apprenticeship")), 1.0);
    }

    #[test]
    fn test_education_table_contains() {
        let table = EducationTable::default();
        assert!(table.contains("Bachelor"));
        assert!(table.contains(" phd "));
        assert!(!table.contains("wizard"));
    }

    #[test]
    fn test_experience_score() {
        assert_eq!(score_experience(5.0, Some(3.0)), 1.0);
        assert_eq!(score_experience(2.0, Some(3.0)), 2.0 / 3.0);
        assert_eq!(score_experience(5.0, Some(0.0)), 1.0);
        assert_eq!(score_experience(0.0, None), 1.0);
    }

    #[test]
    fn test_perfect_match_scores_100() {
        let scorer = EligibilityScorer::default();
        let score = scorer.calculate_total_score(&profile(30, "bachelor", 5.0), &requirements());
        assert_eq!(score, 100.0);
    }

    #[test]
    fn test_partial_match() {
        let scorer = EligibilityScorer::default();
        // age 1.0 * 1.0 + education 0.5 * 2.0 + experience 1.0 * 1.5 = 3.5 / 4.5
        let score = scorer.calculate_total_score(&profile(30, "diploma", 5.0), &Requirements {
            education: Some("master".to_string()),
            ..requirements()
        });
        assert!((score - 3.5 / 4.5 * 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_requirements_score_full() {
        let scorer = EligibilityScorer::default();
        let score = scorer.calculate_total_score(&profile(70, "secondary", 0.0), &Requirements::default());
        assert_eq!(score, 100.0);
    }
}
