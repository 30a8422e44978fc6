use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::domain::{Category, UserProfile};

/// Request to match a profile against the corpus
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct MatchRequest {
    #[validate(nested)]
    pub profile: UserProfile,
    #[validate(range(min = 1, max = 500))]
    #[serde(default)]
    pub limit: Option<u16>,
    #[serde(alias = "eligible_only", rename = "eligibleOnly", default)]
    pub eligible_only: bool,
    #[serde(default)]
    pub category: Option<Category>,
}

/// Request to retrieve grounding context for a question
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RetrieveRequest {
    #[validate(length(min = 1, max = 2000))]
    pub query: String,
    #[validate(range(min = 1, max = 50))]
    #[serde(default)]
    pub limit: Option<u16>,
}

/// Request to rebuild the semantic index
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RebuildIndexRequest {
    #[serde(default)]
    pub force: bool,
}

/// Query string for the program details endpoint
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DetailsQuery {
    /// Comma-separated names of documents already gathered
    #[serde(default)]
    pub completed: Option<String>,
    #[serde(rename = "includeOptional", alias = "include_optional", default)]
    pub include_optional: bool,
}

impl DetailsQuery {
    pub fn completed_documents(&self) -> Option<Vec<String>> {
        self.completed.as_deref().map(|list| {
            list.split(',')
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .map(str::to_string)
                .collect()
        })
    }
}
