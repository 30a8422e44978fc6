use crate::core::{costs::extract_numbers, ranking::tokenize, scoring::EducationTable};
use crate::models::{Requirements, UserProfile};

/// Lists the hard requirements a profile fails
///
/// Works from cutoffs only and never looks at the weighted score, so a program can
/// score well and still report gaps.
#[derive(Debug, Clone, Default)]
pub struct GapAnalyzer {
    education: EducationTable,
}

impl GapAnalyzer {
    pub fn new(education: EducationTable) -> Self {
        Self { education }
    }

    /// Empty exactly when every age, education and experience cutoff holds
    pub fn identify_gaps(&self, profile: &UserProfile, requirements: &Requirements) -> Vec<String> {
        let mut gaps = Vec::new();

        if let Some(age) = &requirements.age {
            if let Some(min) = age.lower().filter(|min| profile.age < *min) {
                gaps.push(format!("Age too low (need {}+)", min));
            }
            if let Some(max) = age.upper().filter(|max| profile.age > *max) {
                gaps.push(format!("Age too high (max {})", max));
            }
        }

        if let Some(required) = requirements.education.as_deref().filter(|r| !r.trim().is_empty()) {
            let user_level = self.education.ordinal(profile.education.as_deref());
            if user_level < self.education.ordinal(Some(required)) {
                gaps.push(format!(
                    "Need {} degree (have {})",
                    required,
                    profile.education.as_deref().unwrap_or("none")
                ));
            }
        }

        if let Some(years) = requirements.experience_years.filter(|y| *y > 0.0) {
            if profile.experience_years < years {
                gaps.push(format!(
                    "Need {} years experience (have {})",
                    years, profile.experience_years
                ));
            }
        }

        gaps
    }

    /// Shortfall against the language requirement, reported apart from the cutoff gaps
    ///
    /// Only checked when the profile holds a score for a test named in the requirement
    /// (e.g. `"IELTS": 6.0` against `"IELTS 6.5"`); the first number after the name is the band.
    pub fn language_gap(&self, profile: &UserProfile, requirements: &Requirements) -> Option<String> {
        let required = requirements.language.as_deref()?;
        let lower = required.to_lowercase();
        let tokens = tokenize(&lower);

        profile.language_scores.iter().find_map(|(test, score)| {
            let test_lower = test.trim().to_lowercase();
            if test_lower.is_empty() || !tokens.contains(&test_lower) {
                return None;
            }
            let start = lower.find(&test_lower)? + test_lower.len();
            let band = extract_numbers(&lower[start..]).into_iter().next()?;
            (*score < band).then(|| format!("Need {} (have {} {})", required, test, score))
        })
    }
}
