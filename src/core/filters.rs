use crate::config::LexiconSettings;
use crate::core::ranking::{candidates, Candidate};
use crate::models::{Category, Program, QueryFilters, UserProfile};

/// Extracts coarse jurisdiction/category filters from a free-text query
///
/// Both lexicons are scanned in order and the first entry whose keyword appears in
/// the lowercased query wins, so a query naming two jurisdictions only yields one.
#[derive(Debug, Clone)]
pub struct MetadataFilterExtractor {
    jurisdictions: Vec<(String, String)>,
    categories: Vec<(Category, Vec<String>)>,
}

impl MetadataFilterExtractor {
    pub fn new(lexicon: &LexiconSettings) -> Self {
        Self {
            jurisdictions: lexicon
                .jurisdictions
                .iter()
                .map(|j| (j.keyword.to_lowercase(), j.code.to_lowercase()))
                .collect(),
            categories: lexicon
                .categories
                .iter()
                .map(|c| (c.category, c.keywords.iter().map(|k| k.to_lowercase()).collect()))
                .collect(),
        }
    }

    pub fn extract(&self, query: &str) -> QueryFilters {
        let query_lower = query.to_lowercase();

        let jurisdiction = self
            .jurisdictions
            .iter()
            .find(|(keyword, _)| query_lower.contains(keyword.as_str()))
            .map(|(_, code)| code.clone());

        let category = self
            .categories
            .iter()
            .find(|(_, keywords)| keywords.iter().any(|k| query_lower.contains(k.as_str())))
            .map(|(category, _)| *category);

        QueryFilters { jurisdiction, category }
    }
}

impl Default for MetadataFilterExtractor {
    fn default() -> Self {
        Self::new(&LexiconSettings::default())
    }
}

/// Outcome of applying filters to a corpus
#[derive(Debug)]
pub struct FilteredCorpus<'a> {
    pub programs: Vec<Candidate<'a>>,
    /// True when the filters matched nothing and the full corpus was used instead
    pub fell_back: bool,
}

/// Case-insensitive equality filter on jurisdiction and category
///
/// An empty result falls back to the whole corpus.
pub fn filter_corpus<'a>(programs: &'a [Program], filters: &QueryFilters) -> FilteredCorpus<'a> {
    let jurisdictions: Vec<String> = filters.jurisdiction.iter().cloned().collect();
    let categories: Vec<Category> = filters.category.iter().copied().collect();
    filter_by_preferences(programs, &jurisdictions, &categories)
}

/// Pre-filter for the matching path, driven by the profile's preferences
pub fn filter_for_profile<'a>(programs: &'a [Program], profile: &UserProfile) -> FilteredCorpus<'a> {
    filter_by_preferences(programs, &profile.target_jurisdictions, &profile.target_categories)
}

fn filter_by_preferences<'a>(
    programs: &'a [Program],
    jurisdictions: &[String],
    categories: &[Category],
) -> FilteredCorpus<'a> {
    let all = || candidates(programs);

    if jurisdictions.is_empty() && categories.is_empty() {
        return FilteredCorpus { programs: all(), fell_back: false };
    }

    let jurisdictions: Vec<String> = jurisdictions.iter().map(|j| j.trim().to_lowercase()).collect();

    let filtered: Vec<Candidate<'a>> = candidates(programs)
        .into_iter()
        .filter(|c| matches_jurisdiction(c.program, &jurisdictions))
        .filter(|c| categories.is_empty() || categories.contains(&c.program.category))
        .collect();

    if filtered.is_empty() && !programs.is_empty() {
        tracing::warn!(
            "No programs match filters (jurisdictions={:?}, categories={:?}), using full corpus",
            jurisdictions,
            categories
        );
        return FilteredCorpus { programs: all(), fell_back: true };
    }

    FilteredCorpus { programs: filtered, fell_back: false }
}

#[inline]
fn matches_jurisdiction(program: &Program, jurisdictions: &[String]) -> bool {
    jurisdictions.is_empty() || jurisdictions.contains(&program.jurisdiction.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn program(name: &str, jurisdiction: &str, category: Category) -> Program {
        Program {
            name: name.to_string(),
            jurisdiction: jurisdiction.to_string(),
            category,
            ..Default::default()
        }
    }

    fn corpus() -> Vec<Program> {
        vec![
            program("Skilled Independent", "Australia", Category::Work),
            program("Student Visa", "Australia", Category::Study),
            program("Express Entry", "Canada", Category::Work),
        ]
    }

    #[test]
    fn test_extracts_jurisdiction_and_category() {
        let filters = MetadataFilterExtractor::default().extract("Can I get a JOB in Canada?");
        assert_eq!(filters.jurisdiction.as_deref(), Some("canada"));
        assert_eq!(filters.category, Some(Category::Work));
    }

    #[test]
    fn test_first_lexicon_entry_wins() {
        let filters = MetadataFilterExtractor::default().extract("canada or australia?");
        assert_eq!(filters.jurisdiction.as_deref(), Some("australia"));
    }

    #[test]
    fn test_alias_maps_to_code() {
        let filters = MetadataFilterExtractor::default().extract("moving to the United Arab Emirates");
        assert_eq!(filters.jurisdiction.as_deref(), Some("uae"));
    }

    #[test]
    fn test_no_match_yields_empty_filters() {
        let filters = MetadataFilterExtractor::default().extract("what are the fees?");
        assert!(filters.is_empty());
    }

    #[test]
    fn test_filter_is_case_insensitive() {
        let programs = corpus();
        let filters = QueryFilters {
            jurisdiction: Some("australia".to_string()),
            category: Some(Category::Study),
        };
        let result = filter_corpus(&programs, &filters);
        assert!(!result.fell_back);
        assert_eq!(result.programs.len(), 1);
        assert_eq!(result.programs[0].program.name, "Student Visa");
    }

    #[test]
    fn test_capitalised_categories_in_records_still_filter() {
        let programs: Vec<Program> = serde_json::from_str(
            r#"[{"name": "Skilled Worker", "country": "UK", "category": "Work"},
                {"name": "Student Route", "country": "UK", "category": "study"}]"#,
        )
        .unwrap();
        let filters = MetadataFilterExtractor::default().extract("WORK visa options");
        assert_eq!(filters.category, Some(Category::Work));

        let result = filter_corpus(&programs, &filters);
        assert!(!result.fell_back);
        assert_eq!(result.programs.len(), 1);
        assert_eq!(result.programs[0].program.name, "Skilled Worker");

        let profile: UserProfile = serde_json::from_str(r#"{"age": 28, "targetCategories": ["Work"]}"#).unwrap();
        let result = filter_for_profile(&programs, &profile);
        assert!(!result.fell_back);
        assert_eq!(result.programs[0].position, 0);
    }

    #[test]
    fn test_unknown_jurisdiction_falls_back_to_full_corpus() {
        let programs = corpus();
        let filters = QueryFilters {
            jurisdiction: Some("germany".to_string()),
            category: None,
        };
        let result = filter_corpus(&programs, &filters);
        assert!(result.fell_back);
        assert_eq!(result.programs.len(), programs.len());
    }

    #[test]
    fn test_profile_preferences_filter() {
        let programs = corpus();
        let profile = UserProfile {
            target_jurisdictions: vec!["CANADA".to_string()],
            ..Default::default()
        };
        let result = filter_for_profile(&programs, &profile);
        assert_eq!(result.programs.len(), 1);
        assert_eq!(result.programs[0].position, 2);
    }
}
