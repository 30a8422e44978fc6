// Core algorithm exports
pub mod checklist;
pub mod context;
pub mod costs;
pub mod embedder;
pub mod filters;
pub mod gaps;
pub mod hybrid;
pub mod keyword;
pub mod matcher;
pub mod ranking;
pub mod rerank;
pub mod retriever;
pub mod scoring;
pub mod semantic;
pub mod timeline;

pub use checklist::{ChecklistProgress, DocumentChecklist};
pub use context::format_context;
pub use costs::{calculate_costs, CostBreakdown};
pub use embedder::{EmbedError, Embedder, HashEmbedder};
pub use filters::{filter_corpus, filter_for_profile, MetadataFilterExtractor};
pub use gaps::GapAnalyzer;
pub use hybrid::HybridScoreCombiner;
pub use keyword::KeywordScorer;
pub use matcher::{MatchOutcome, Matcher};
pub use rerank::{LexicalReranker, RerankError, Reranker};
pub use retriever::{RetrievalMode, RetrievalOutcome, Retriever};
pub use scoring::{EducationTable, EligibilityScorer};
pub use semantic::{IndexReport, SemanticIndex};
pub use timeline::{Timeline, TimelineStage};
