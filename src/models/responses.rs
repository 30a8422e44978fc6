use serde::{Deserialize, Serialize};

use crate::core::{ChecklistProgress, CostBreakdown, DocumentChecklist, Timeline};
use crate::models::domain::{MatchResult, Program, QueryFilters, RetrievalResult};

/// Response for the match endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchResponse {
    pub matches: Vec<MatchResult>,
    #[serde(rename = "totalResults")]
    pub total_results: usize,
    #[serde(rename = "eligibleCount")]
    pub eligible_count: usize,
    #[serde(rename = "noData")]
    pub no_data: bool,
}

/// Response for the retrieve endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrieveResponse {
    pub results: Vec<RetrievalResult>,
    pub context: String,
    pub filters: QueryFilters,
    #[serde(rename = "filterFallback")]
    pub filter_fallback: bool,
    pub mode: String,
    #[serde(rename = "noData")]
    pub no_data: bool,
}

/// Documents, timeline and costs for one program
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgramDetailsResponse {
    pub program: Program,
    pub documents: DocumentChecklist,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<ChecklistProgress>,
    pub timeline: Timeline,
    pub costs: CostBreakdown,
}

/// Index rebuild response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RebuildIndexResponse {
    pub indexed: usize,
    pub encoded: usize,
    #[serde(rename = "cacheKey")]
    pub cache_key: String,
}

/// Engine statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsResponse {
    #[serde(rename = "totalPrograms")]
    pub total_programs: usize,
    #[serde(rename = "corpusVersion")]
    pub corpus_version: String,
    pub mode: String,
    #[serde(rename = "indexedVectors")]
    pub indexed_vectors: usize,
    pub ready: bool,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub programs: usize,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}
