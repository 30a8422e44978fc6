use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;
use validator::Validate;

/// Program category
///
/// Parsing is case-insensitive; unrecognised labels become `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Work,
    Study,
    Family,
    Business,
    Tourist,
    #[default]
    Other,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Work,
        Category::Study,
        Category::Family,
        Category::Business,
        Category::Tourist,
        Category::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Work => "work",
            Category::Study => "study",
            Category::Family => "family",
            Category::Business => "business",
            Category::Tourist => "tourist",
            Category::Other => "other",
        }
    }
}

impl FromStr for Category {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_lowercase().as_str() {
            "work" => Category::Work,
            "study" => Category::Study,
            "family" => Category::Family,
            "business" | "investment" => Category::Business,
            "tourist" => Category::Tourist,
            _ => Category::Other,
        })
    }
}

impl<'de> Deserialize<'de> for Category {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let label = String::deserialize(deserializer)?;
        match label.parse::<Category>() {
            Ok(category) => Ok(category),
            Err(never) => match never {},
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inclusive age bounds; either side may be absent
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AgeRange {
    #[serde(default)]
    pub min: Option<u32>,
    #[serde(default)]
    pub max: Option<u32>,
}

impl AgeRange {
    /// Lower bound, with zero treated as absent
    pub fn lower(&self) -> Option<u32> {
        self.min.filter(|m| *m > 0)
    }

    /// Upper bound, with zero treated as absent
    pub fn upper(&self) -> Option<u32> {
        self.max.filter(|m| *m > 0)
    }

    pub fn is_unbounded(&self) -> bool {
        self.lower().is_none() && self.upper().is_none()
    }
}

/// Requirement set attached to a program
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Requirements {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<AgeRange>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub education: Option<String>,
    #[serde(rename = "experienceYears", alias = "experience_years", default, skip_serializing_if = "Option::is_none")]
    pub experience_years: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

impl Requirements {
    pub fn is_empty(&self) -> bool {
        self.age.map_or(true, |a| a.is_unbounded())
            && self.education.as_deref().map_or(true, str::is_empty)
            && self.experience_years.map_or(true, |y| y <= 0.0)
            && self.language.as_deref().map_or(true, str::is_empty)
    }
}

/// Immigration program record produced by the extraction pipeline
///
/// Every field defaults so partially extracted records still load.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Program {
    #[serde(alias = "visa_type", default)]
    pub name: String,
    #[serde(alias = "country", default)]
    pub jurisdiction: String,
    #[serde(default)]
    pub category: Category,
    #[serde(default)]
    pub requirements: Requirements,
    #[serde(default)]
    pub fees: BTreeMap<String, String>,
    #[serde(rename = "processingTime", alias = "processing_time", default, skip_serializing_if = "Option::is_none")]
    pub processing_time: Option<String>,
    #[serde(alias = "source_urls", default)]
    pub sources: Vec<String>,
    /// Program-specific required documents, when the extraction captured them
    #[serde(rename = "documentsRequired", alias = "documents_required", default, skip_serializing_if = "Vec::is_empty")]
    pub documents_required: Vec<String>,
    /// Ordered stage descriptions keyed like `1_submission`
    #[serde(rename = "timelineStages", alias = "timeline_stages", default, skip_serializing_if = "BTreeMap::is_empty")]
    pub timeline_stages: BTreeMap<String, String>,
}

impl Program {
    /// Identity used by the embedding cache and the hybrid merge
    pub fn key(&self) -> ProgramKey {
        ProgramKey(format!("{}_{}", self.jurisdiction, self.name))
    }

    /// Short text handed to the pairwise reranker
    pub fn summary(&self) -> String {
        format!("{} {} {}", self.name, self.category, self.jurisdiction)
    }
}

/// Stable program identity: jurisdiction + name
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProgramKey(pub String);

impl fmt::Display for ProgramKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Immutable corpus snapshot handed to each request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Corpus {
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub programs: Vec<Program>,
}

impl Corpus {
    pub fn new(version: impl Into<String>, programs: Vec<Program>) -> Self {
        Self {
            version: version.into(),
            programs,
        }
    }

    pub fn len(&self) -> usize {
        self.programs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.programs.is_empty()
    }
}

/// Profile of the person being matched
///
/// `languageScores` maps a test name (e.g. "IELTS") to the user's band and
/// feeds the language gap check.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UserProfile {
    #[validate(range(max = 120))]
    pub age: u32,
    #[serde(default)]
    pub education: Option<String>,
    #[validate(range(min = 0.0))]
    #[serde(rename = "experienceYears", alias = "experience_years", default)]
    pub experience_years: f64,
    #[serde(rename = "languageScores", alias = "language_scores", default)]
    pub language_scores: BTreeMap<String, f64>,
    #[serde(rename = "targetJurisdictions", alias = "target_countries", default)]
    pub target_jurisdictions: Vec<String>,
    #[serde(rename = "targetCategories", default)]
    pub target_categories: Vec<Category>,
}

/// Coarse eligibility bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    High,
    Medium,
    Low,
}

/// Numeric cost range derived from a fee schedule
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostRange {
    pub min: f64,
    pub max: f64,
}

/// Scored and tiered match result
///
/// `score` is rounded to one decimal and `tier` is classified on that rounded value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchResult {
    pub name: String,
    pub jurisdiction: String,
    pub category: Category,
    pub score: f64,
    pub tier: Tier,
    pub eligible: bool,
    pub gaps: Vec<String>,
    /// Language score below the program's stated band; does not affect `eligible`
    #[serde(rename = "languageGap", default, skip_serializing_if = "Option::is_none")]
    pub language_gap: Option<String>,
    pub fees: BTreeMap<String, String>,
    #[serde(rename = "processingTime")]
    pub processing_time: Option<String>,
    pub language: Option<String>,
    pub sources: Vec<String>,
    #[serde(rename = "estimatedCost")]
    pub estimated_cost: Option<CostRange>,
}

/// Retrieved program with its combined relevance score
///
/// `score` is the keyword or hybrid score; reranking only changes `rank`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalResult {
    pub program: Program,
    pub score: f64,
    pub rank: usize,
}

/// Filters extracted from a free-text query
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryFilters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jurisdiction: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
}

impl QueryFilters {
    pub fn is_empty(&self) -> bool {
        self.jurisdiction.is_none() && self.category.is_none()
    }
}

/// Per-attribute scoring weights
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringWeights {
    pub age: f64,
    pub education: f64,
    pub experience: f64,
}

impl ScoringWeights {
    pub fn total(&self) -> f64 {
        self.age + self.education + self.experience
    }
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            age: 1.0,
            education: 2.0,
            experience: 1.5,
        }
    }
}

/// Tier cutoffs on the 0-100 score scale
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    pub high: f64,
    pub medium: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            high: 80.0,
            medium: 60.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_serde() {
        let parsed: Vec<Category> = serde_json::from_str(r#"["work", "investment", "asylum"]"#).unwrap();
        assert_eq!(parsed, vec![Category::Work, Category::Business, Category::Other]);
        assert_eq!(serde_json::to_string(&Category::Study).unwrap(), r#""study""#);
    }

    #[test]
    fn test_category_parsing_ignores_case() {
        let parsed: Vec<Category> = serde_json::from_str(r#"["Work", "STUDY", " Family ", "Investment"]"#).unwrap();
        assert_eq!(parsed, vec![Category::Work, Category::Study, Category::Family, Category::Business]);

        let profile: UserProfile = serde_json::from_str(r#"{"age": 30, "targetCategories": ["Work"]}"#).unwrap();
        assert_eq!(profile.target_categories, vec![Category::Work]);
    }

    #[test]
    fn test_profile_validation() {
        let profile: UserProfile =
            serde_json::from_str(r#"{"age": 4000000000, "education": "wizard", "experienceYears": -7}"#).unwrap();
        let errors = profile.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("age"));
        assert!(fields.contains_key("experience_years"));

        let profile = UserProfile { age: 30, experience_years: 2.5, ..Default::default() };
        assert!(profile.validate().is_ok());
    }

    #[test]
    fn test_program_accepts_extraction_field_names() {
        let program: Program = serde_json::from_str(
            r#"{"visa_type": "Graduate Visa", "country": "UK", "source_urls": ["https://www.gov.uk/graduate-visa"]}"#,
        )
        .unwrap();
        assert_eq!(program.key(), ProgramKey("UK_Graduate Visa".to_string()));
        assert_eq!(program.category, Category::Other);
        assert!(program.requirements.is_empty());
    }

    #[test]
    fn test_tier_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Tier::Medium).unwrap(), r#""medium""#);
    }

    #[test]
    fn test_age_range_zero_is_unbounded() {
        let range = AgeRange { min: Some(0), max: None };
        assert!(range.is_unbounded());
        assert_eq!(AgeRange { min: Some(18), max: Some(0) }.upper(), None);
    }
}
