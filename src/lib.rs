//! Pathway Engine - eligibility matching and retrieval over immigration programs
//!
//! Two pipelines share one program corpus:
//! - matching scores a user profile against every program's requirements, explains the
//!   gaps and sorts the results into tiers
//! - retrieval ranks programs for a free-text question with keyword, semantic and
//!   reranking stages and renders them as a context block

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use crate::core::{format_context, Matcher, Retriever, RetrievalMode};
pub use models::{Corpus, MatchResult, Program, RetrievalResult, UserProfile};
pub use services::CorpusStore;
