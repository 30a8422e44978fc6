// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    AgeRange, Category, Corpus, CostRange, MatchResult, Program, ProgramKey, QueryFilters,
    Requirements, RetrievalResult, ScoringWeights, Thresholds, Tier, UserProfile,
};
pub use requests::{DetailsQuery, MatchRequest, RebuildIndexRequest, RetrieveRequest};
pub use responses::{
    ErrorResponse, HealthResponse, MatchResponse, ProgramDetailsResponse, RebuildIndexResponse,
    RetrieveResponse, StatsResponse,
};
