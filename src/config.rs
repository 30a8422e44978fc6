use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::models::{Category, ScoringWeights, Thresholds};

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub corpus: CorpusSettings,
    #[serde(default)]
    pub cache: CacheSettings,
    #[serde(default)]
    pub retrieval: RetrievalSettings,
    #[serde(default)]
    pub scoring: ScoringSettings,
    #[serde(default)]
    pub lexicon: LexiconSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub workers: Option<usize>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            workers: None,
        }
    }
}

fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8080 }

#[derive(Debug, Clone, Deserialize)]
pub struct CorpusSettings {
    #[serde(default = "default_corpus_path")]
    pub path: PathBuf,
}

impl Default for CorpusSettings {
    fn default() -> Self {
        Self { path: default_corpus_path() }
    }
}

fn default_corpus_path() -> PathBuf { PathBuf::from("data/programs.json") }

#[derive(Debug, Clone, Deserialize)]
pub struct CacheSettings {
    #[serde(default = "default_embedding_path")]
    pub embedding_path: PathBuf,
    #[serde(default = "default_query_cache_size")]
    pub query_cache_size: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            embedding_path: default_embedding_path(),
            query_cache_size: default_query_cache_size(),
        }
    }
}

fn default_embedding_path() -> PathBuf { PathBuf::from("data/.program_embeddings.json") }
fn default_query_cache_size() -> u64 { 1024 }

/// Which optional retrieval capabilities to enable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModeSetting {
    Keyword,
    Hybrid,
    #[default]
    HybridReranked,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RetrievalSettings {
    #[serde(default)]
    pub mode: ModeSetting,
    #[serde(default = "default_embedding_dimension")]
    pub embedding_dimension: usize,
    #[serde(default = "default_stage_top_k")]
    pub keyword_top_k: usize,
    #[serde(default = "default_stage_top_k")]
    pub semantic_top_k: usize,
    #[serde(default = "default_stage_top_k")]
    pub hybrid_top_k: usize,
    #[serde(default = "default_final_top_k")]
    pub final_top_k: usize,
    #[serde(default = "default_semantic_weight")]
    pub semantic_weight: f64,
    #[serde(default = "default_keyword_weight")]
    pub keyword_weight: f64,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            mode: ModeSetting::default(),
            embedding_dimension: default_embedding_dimension(),
            keyword_top_k: default_stage_top_k(),
            semantic_top_k: default_stage_top_k(),
            hybrid_top_k: default_stage_top_k(),
            final_top_k: default_final_top_k(),
            semantic_weight: default_semantic_weight(),
            keyword_weight: default_keyword_weight(),
        }
    }
}

fn default_embedding_dimension() -> usize { 384 }
fn default_stage_top_k() -> usize { 20 }
fn default_final_top_k() -> usize { 5 }
fn default_semantic_weight() -> f64 { 0.6 }
fn default_keyword_weight() -> f64 { 0.4 }

#[derive(Debug, Clone, Deserialize)]
pub struct ScoringSettings {
    #[serde(default)]
    pub weights: WeightsConfig,
    #[serde(default)]
    pub thresholds: ThresholdsConfig,
    #[serde(default = "default_education_levels")]
    pub education_levels: Vec<EducationLevelConfig>,
}

impl Default for ScoringSettings {
    fn default() -> Self {
        Self {
            weights: WeightsConfig::default(),
            thresholds: ThresholdsConfig::default(),
            education_levels: default_education_levels(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WeightsConfig {
    #[serde(default = "default_age_weight")]
    pub age: f64,
    #[serde(default = "default_education_weight")]
    pub education: f64,
    #[serde(default = "default_experience_weight")]
    pub experience: f64,
}

impl Default for WeightsConfig {
    fn default() -> Self {
        Self {
            age: default_age_weight(),
            education: default_education_weight(),
            experience: default_experience_weight(),
        }
    }
}

fn default_age_weight() -> f64 { 1.0 }
fn default_education_weight() -> f64 { 2.0 }
fn default_experience_weight() -> f64 { 1.5 }

impl From<&WeightsConfig> for ScoringWeights {
    fn from(value: &WeightsConfig) -> Self {
        Self {
            age: value.age,
            education: value.education,
            experience: value.experience,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ThresholdsConfig {
    #[serde(default = "default_high_threshold")]
    pub high: f64,
    #[serde(default = "default_medium_threshold")]
    pub medium: f64,
}

impl Default for ThresholdsConfig {
    fn default() -> Self {
        Self {
            high: default_high_threshold(),
            medium: default_medium_threshold(),
        }
    }
}

fn default_high_threshold() -> f64 { 80.0 }
fn default_medium_threshold() -> f64 { 60.0 }

impl From<&ThresholdsConfig> for Thresholds {
    fn from(value: &ThresholdsConfig) -> Self {
        Self {
            high: value.high,
            medium: value.medium,
        }
    }
}

/// One row of the education ordinal table
#[derive(Debug, Clone, Deserialize)]
pub struct EducationLevelConfig {
    pub name: String,
    pub ordinal: u32,
    #[serde(default)]
    pub aliases: Vec<String>,
}

fn education_level(name: &str, ordinal: u32, aliases: &[&str]) -> EducationLevelConfig {
    EducationLevelConfig {
        name: name.to_string(),
        ordinal,
        aliases: aliases.iter().map(|a| a.to_string()).collect(),
    }
}

fn default_education_levels() -> Vec<EducationLevelConfig> {
    vec![
        education_level("secondary", 1, &["high school", "high_school"]),
        education_level("diploma", 2, &["associate", "certificate"]),
        education_level("bachelor", 3, &["bachelors", "bachelor's", "undergraduate"]),
        education_level("master", 4, &["masters", "master's", "postgraduate"]),
        education_level("phd", 5, &["doctorate", "doctoral"]),
    ]
}

/// Ordered lexicons used to extract filters from queries
///
/// Entry order is significant: the first matching entry wins.
#[derive(Debug, Clone, Deserialize)]
pub struct LexiconSettings {
    #[serde(default = "default_jurisdictions")]
    pub jurisdictions: Vec<JurisdictionEntry>,
    #[serde(default = "default_categories")]
    pub categories: Vec<CategoryEntry>,
}

impl Default for LexiconSettings {
    fn default() -> Self {
        Self {
            jurisdictions: default_jurisdictions(),
            categories: default_categories(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct JurisdictionEntry {
    pub keyword: String,
    pub code: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CategoryEntry {
    pub category: Category,
    pub keywords: Vec<String>,
}

fn default_jurisdictions() -> Vec<JurisdictionEntry> {
    [
        ("australia", "australia"),
        ("canada", "canada"),
        ("uk", "uk"),
        ("united kingdom", "uk"),
        ("germany", "germany"),
        ("uae", "uae"),
        ("united arab emirates", "uae"),
    ]
    .into_iter()
    .map(|(keyword, code)| JurisdictionEntry {
        keyword: keyword.to_string(),
        code: code.to_string(),
    })
    .collect()
}

fn default_categories() -> Vec<CategoryEntry> {
    [
        (Category::Work, &["work", "job", "employment", "skilled", "worker"][..]),
        (Category::Study, &["study", "student", "education", "university"][..]),
        (Category::Family, &["family", "spouse", "partner", "dependent"][..]),
        (Category::Business, &["business", "investor", "entrepreneur"][..]),
        (Category::Tourist, &["tourist", "visitor", "travel", "holiday"][..]),
    ]
    .into_iter()
    .map(|(category, keywords)| CategoryEntry {
        category,
        keywords: keywords.iter().map(|k| k.to_string()).collect(),
    })
    .collect()
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "json".to_string() }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Local overrides (config/local.toml)
    /// 4. Environment variables (prefixed with PATHWAY_)
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g., PATHWAY__SERVER__PORT -> server.port
            .add_source(
                Environment::with_prefix("PATHWAY")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let settings: Settings = settings.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(
                Environment::with_prefix("PATHWAY")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let settings: Settings = settings.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reject configurations the engine cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        let w = &self.scoring.weights;
        if w.age < 0.0 || w.education < 0.0 || w.experience < 0.0 {
            return Err(invalid("scoring weights must be non-negative"));
        }
        if w.age + w.education + w.experience <= 0.0 {
            return Err(invalid("scoring weights must sum to a positive value"));
        }

        let t = &self.scoring.thresholds;
        if !(0.0..=100.0).contains(&t.high) || !(0.0..=100.0).contains(&t.medium) {
            return Err(invalid("thresholds must lie within 0..=100"));
        }
        if t.medium > t.high {
            return Err(invalid("medium threshold must not exceed high threshold"));
        }

        if self.scoring.education_levels.iter().any(|l| l.ordinal == 0 || l.name.trim().is_empty()) {
            return Err(invalid("education levels need a name and a positive ordinal"));
        }

        let r = &self.retrieval;
        if r.keyword_top_k == 0 || r.semantic_top_k == 0 || r.hybrid_top_k == 0 || r.final_top_k == 0 {
            return Err(invalid("top-k sizes must be positive"));
        }
        if r.final_top_k > r.hybrid_top_k {
            return Err(invalid("final_top_k must not exceed hybrid_top_k"));
        }
        if r.semantic_weight < 0.0 || r.keyword_weight < 0.0 {
            return Err(invalid("blend weights must be non-negative"));
        }
        if r.mode != ModeSetting::Keyword && r.embedding_dimension == 0 {
            return Err(invalid("embedding_dimension must be positive"));
        }

        if self.lexicon.jurisdictions.iter().any(|j| j.keyword.trim().is_empty() || j.code.trim().is_empty()) {
            return Err(invalid("jurisdiction lexicon entries need a keyword and a code"));
        }
        if self.lexicon.categories.iter().any(|c| c.keywords.iter().any(|k| k.trim().is_empty())) {
            return Err(invalid("category lexicon keywords must be non-empty"));
        }

        Ok(())
    }
}

fn invalid(message: &str) -> ConfigError {
    ConfigError::Message(format!("invalid configuration: {}", message))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_weights() {
        let weights = WeightsConfig::default();
        assert_eq!(weights.age, 1.0);
        assert_eq!(weights.education, 2.0);
        assert_eq!(weights.experience, 1.5);
    }

    #[test]
    fn test_default_logging() {
        let level = default_log_level();
        let format = default_log_format();
        assert_eq!(level, "info");
        assert_eq!(format, "json");
    }

    #[test]
    fn test_default_settings_are_valid() {
        assert!(Settings::default().validate().is_ok());
    }

    #[test]
    fn test_lexicon_order_preserved() {
        let lexicon = LexiconSettings::default();
        assert_eq!(lexicon.jurisdictions[0].keyword, "australia");
        assert_eq!(lexicon.categories[0].category, Category::Work);
    }

    #[test]
    fn test_inverted_thresholds_rejected() {
        let mut settings = Settings::default();
        settings.scoring.thresholds.medium = 90.0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_zero_weights_rejected() {
        let mut settings = Settings::default();
        settings.scoring.weights = WeightsConfig { age: 0.0, education: 0.0, experience: 0.0 };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_final_top_k_bounded_by_hybrid() {
        let mut settings = Settings::default();
        settings.retrieval.final_top_k = 50;
        assert!(settings.validate().is_err());
    }
}
