use actix_web::{web, HttpResponse, Responder};
use std::sync::Arc;
use validator::Validate;

use crate::core::{calculate_costs, DocumentChecklist, Matcher, Retriever, Timeline};
use crate::models::{
    DetailsQuery, ErrorResponse, HealthResponse, MatchRequest, MatchResponse, MatchResult,
    ProgramDetailsResponse, RebuildIndexRequest, RebuildIndexResponse, RetrieveRequest,
    RetrieveResponse, StatsResponse,
};
use crate::services::CorpusStore;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub corpus: Arc<CorpusStore>,
    pub retriever: Arc<Retriever>,
    pub matcher: Matcher,
}

/// Configure all program routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/health", web::get().to(health_check))
        .route("/stats", web::get().to(stats))
        .route("/programs/match", web::post().to(match_programs))
        .route("/programs/retrieve", web::post().to(retrieve_programs))
        .route("/programs/{index}/details", web::get().to(program_details))
        .route("/index/rebuild", web::post().to(rebuild_index))
        .route("/corpus/reload", web::post().to(reload_corpus));
}

fn validation_error(errors: validator::ValidationErrors) -> HttpResponse {
    HttpResponse::BadRequest().json(ErrorResponse {
        error: "Validation failed".to_string(),
        message: errors.to_string(),
        status_code: 400,
    })
}

fn internal_error(error: &str, message: String) -> HttpResponse {
    HttpResponse::InternalServerError().json(ErrorResponse {
        error: error.to_string(),
        message,
        status_code: 500,
    })
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let programs = state.corpus.snapshot().len();
    let status = if programs > 0 { "healthy" } else { "degraded" };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        programs,
        timestamp: chrono::Utc::now(),
    })
}

/// Engine statistics
///
/// GET /api/v1/stats
async fn stats(state: web::Data<AppState>) -> impl Responder {
    let corpus = state.corpus.snapshot();
    let indexed_vectors = state.retriever.indexed_vectors();
    let semantic_ready = state.retriever.mode().index().is_none() || indexed_vectors >= corpus.len();

    HttpResponse::Ok().json(StatsResponse {
        total_programs: corpus.len(),
        corpus_version: corpus.version.clone(),
        mode: state.retriever.mode().name().to_string(),
        indexed_vectors,
        ready: !corpus.is_empty() && semantic_ready,
    })
}

/// Match a profile against every program
///
/// POST /api/v1/programs/match
///
/// Request body:
/// ```json
/// {
///   "profile": {"age": 30, "education": "bachelor", "experienceYears": 5},
///   "limit": 10,
///   "eligibleOnly": false,
///   "category": "work"
/// }
/// ```
async fn match_programs(state: web::Data<AppState>, req: web::Json<MatchRequest>) -> impl Responder {
    if let Err(errors) = req.validate() {
        tracing::info!("Validation failed for match request: {:?}", errors);
        return validation_error(errors);
    }
    if let Some(education) = req.profile.education.as_deref() {
        if !state.matcher.knows_education(education) {
            tracing::info!("Unknown education level in match request: {:?}", education);
            return HttpResponse::BadRequest().json(ErrorResponse {
                error: "Validation failed".to_string(),
                message: format!("Unknown education level: {}", education),
                status_code: 400,
            });
        }
    }

    let corpus = state.corpus.snapshot();
    if corpus.is_empty() {
        return HttpResponse::Ok().json(MatchResponse {
            matches: Vec::new(),
            total_results: 0,
            eligible_count: 0,
            no_data: true,
        });
    }

    let outcome = state.matcher.rank(&req.profile, &corpus);

    let mut matches: Vec<MatchResult> = match req.category {
        Some(category) => outcome.filter_by_category(category).into_iter().cloned().collect(),
        None => outcome.matches.clone(),
    };
    if req.eligible_only {
        matches.retain(|m| m.eligible);
    }
    let total_results = matches.len();
    if let Some(limit) = req.limit {
        matches.truncate(usize::from(limit));
    }

    tracing::info!(
        "Returning {} of {} matches ({} eligible) from {} programs",
        matches.len(),
        total_results,
        outcome.eligible_count(),
        outcome.total_programs
    );

    HttpResponse::Ok().json(MatchResponse {
        matches,
        total_results,
        eligible_count: outcome.eligible_count(),
        no_data: false,
    })
}

/// Retrieve programs and formatted context for a question
///
/// POST /api/v1/programs/retrieve
///
/// Request body:
/// ```json
/// {
///   "query": "skilled work visa for canada",
///   "limit": 5
/// }
/// ```
async fn retrieve_programs(state: web::Data<AppState>, req: web::Json<RetrieveRequest>) -> impl Responder {
    if let Err(errors) = req.validate() {
        return validation_error(errors);
    }

    let RetrieveRequest { query, limit } = req.into_inner();
    tracing::info!("Retrieving programs for query: {:?}", query);

    let corpus = state.corpus.snapshot();
    let retriever = state.retriever.clone();
    // First use may build the embedding index
    let outcome = web::block(move || retriever.retrieve(&query, &corpus, limit.map(usize::from))).await;

    match outcome {
        Ok(outcome) => {
            tracing::debug!("Retrieved {} programs in {} mode", outcome.results.len(), outcome.mode);
            HttpResponse::Ok().json(RetrieveResponse {
                results: outcome.results,
                context: outcome.context,
                filters: outcome.filters,
                filter_fallback: outcome.fell_back,
                mode: outcome.mode.to_string(),
                no_data: outcome.no_data,
            })
        }
        Err(e) => {
            tracing::error!("Retrieval task failed: {}", e);
            internal_error("Retrieval failed", e.to_string())
        }
    }
}

/// Document checklist, processing timeline and cost breakdown for one program
///
/// GET /api/v1/programs/{index}/details?completed=passport,birth%20certificate&includeOptional=true
///
/// `index` is the program's position in the current corpus snapshot.
async fn program_details(
    state: web::Data<AppState>,
    path: web::Path<usize>,
    query: web::Query<DetailsQuery>,
) -> impl Responder {
    let index = path.into_inner();
    let corpus = state.corpus.snapshot();

    let Some(program) = corpus.programs.get(index) else {
        return HttpResponse::NotFound().json(ErrorResponse {
            error: "Program not found".to_string(),
            message: format!("No program at index {} (corpus has {})", index, corpus.len()),
            status_code: 404,
        });
    };

    let documents = DocumentChecklist::for_program(program);
    let progress = query.completed_documents().map(|done| documents.progress(&done));

    HttpResponse::Ok().json(ProgramDetailsResponse {
        program: program.clone(),
        timeline: Timeline::for_program(program),
        costs: calculate_costs(program, query.include_optional),
        documents,
        progress,
    })
}

/// Rebuild the semantic index
///
/// POST /api/v1/index/rebuild
async fn rebuild_index(state: web::Data<AppState>, req: web::Json<RebuildIndexRequest>) -> impl Responder {
    let force = req.force;
    let corpus = state.corpus.snapshot();
    let retriever = state.retriever.clone();

    match web::block(move || retriever.reindex(&corpus, force)).await {
        Ok(Some(report)) => HttpResponse::Ok().json(RebuildIndexResponse {
            indexed: report.indexed,
            encoded: report.encoded,
            cache_key: report.cache_key,
        }),
        Ok(None) => HttpResponse::Conflict().json(ErrorResponse {
            error: "Semantic index disabled".to_string(),
            message: "Retrieval is running in keyword mode".to_string(),
            status_code: 409,
        }),
        Err(e) => {
            tracing::error!("Index rebuild task failed: {}", e);
            internal_error("Index rebuild failed", e.to_string())
        }
    }
}

/// Re-read the corpus file
///
/// POST /api/v1/corpus/reload
async fn reload_corpus(state: web::Data<AppState>) -> impl Responder {
    let store = state.corpus.clone();

    match web::block(move || store.reload()).await {
        Ok(Ok(corpus)) => HttpResponse::Ok().json(serde_json::json!({
            "version": corpus.version,
            "programs": corpus.len(),
        })),
        Ok(Err(e)) => {
            tracing::error!("Failed to reload corpus: {}", e);
            internal_error("Failed to reload corpus", e.to_string())
        }
        Err(e) => internal_error("Failed to reload corpus", e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{test, App};
    use crate::models::{Category, Corpus, Program, Requirements};

    fn state() -> AppState {
        let programs = vec![
            Program {
                name: "Express Entry".to_string(),
                jurisdiction: "Canada".to_string(),
                category: Category::Work,
                requirements: Requirements {
                    education: Some("bachelor".to_string()),
                    experience_years: Some(1.0),
                    ..Default::default()
                },
                ..Default::default()
            },
            Program {
                name: "Study Permit".to_string(),
                jurisdiction: "Canada".to_string(),
                category: Category::Study,
                ..Default::default()
            },
        ];
        AppState {
            corpus: Arc::new(CorpusStore::from_corpus(Corpus::new("test", programs))),
            retriever: Arc::new(Retriever::keyword_only()),
            matcher: Matcher::default(),
        }
    }

    #[actix_web::test]
    async fn test_health_check() {
        let app = test::init_service(App::new().app_data(web::Data::new(state())).configure(configure)).await;
        let req = test::TestRequest::get().uri("/health").to_request();
        let resp: HealthResponse = test::call_and_read_body_json(&app, req).await;

        assert_eq!(resp.status, "healthy");
        assert_eq!(resp.programs, 2);
    }

    #[actix_web::test]
    async fn test_match_eligible_only() {
        let app = test::init_service(App::new().app_data(web::Data::new(state())).configure(configure)).await;
        let req = test::TestRequest::post()
            .uri("/programs/match")
            .set_json(serde_json::json!({
                "profile": {"age": 25, "education": "secondary", "experienceYears": 0},
                "eligibleOnly": true
            }))
            .to_request();
        let resp: MatchResponse = test::call_and_read_body_json(&app, req).await;

        assert_eq!(resp.matches.len(), 1);
        assert_eq!(resp.matches[0].name, "Study Permit");
        assert_eq!(resp.eligible_count, 1);
    }

    #[actix_web::test]
    async fn test_match_rejects_invalid_profile() {
        let app = test::init_service(App::new().app_data(web::Data::new(state())).configure(configure)).await;
        let req = test::TestRequest::post()
            .uri("/programs/match")
            .set_json(serde_json::json!({
                "profile": {"age": 4000000000u64, "education": "bachelor", "experienceYears": -7}
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), actix_web::http::StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_match_rejects_unknown_education() {
        let app = test::init_service(App::new().app_data(web::Data::new(state())).configure(configure)).await;
        let req = test::TestRequest::post()
            .uri("/programs/match")
            .set_json(serde_json::json!({
                "profile": {"age": 30, "education": "wizard", "experienceYears": 2}
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), actix_web::http::StatusCode::BAD_REQUEST);

        let body: ErrorResponse = test::read_body_json(resp).await;
        assert_eq!(body.message, "Unknown education level: wizard");
    }

    #[actix_web::test]
    async fn test_program_details() {
        let app = test::init_service(App::new().app_data(web::Data::new(state())).configure(configure)).await;
        let req = test::TestRequest::get()
            .uri("/programs/1/details?completed=passport,transcripts")
            .to_request();
        let resp: ProgramDetailsResponse = test::call_and_read_body_json(&app, req).await;

        assert_eq!(resp.program.name, "Study Permit");
        assert_eq!(resp.timeline.stages[0].name, "University Admission");
        assert_eq!(resp.documents.recommended[0], "Statement of purpose");
        // "passport" matches the passport and the photo entries
        assert_eq!(resp.progress.map(|p| p.completed), Some(3));
        assert!(resp.costs.items.is_empty());
    }

    #[actix_web::test]
    async fn test_program_details_out_of_range() {
        let app = test::init_service(App::new().app_data(web::Data::new(state())).configure(configure)).await;
        let req = test::TestRequest::get().uri("/programs/7/details").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), actix_web::http::StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn test_retrieve_rejects_empty_query() {
        let app = test::init_service(App::new().app_data(web::Data::new(state())).configure(configure)).await;
        let req = test::TestRequest::post()
            .uri("/programs/retrieve")
            .set_json(serde_json::json!({"query": ""}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), actix_web::http::StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_retrieve_returns_context() {
        let app = test::init_service(App::new().app_data(web::Data::new(state())).configure(configure)).await;
        let req = test::TestRequest::post()
            .uri("/programs/retrieve")
            .set_json(serde_json::json!({"query": "work in canada"}))
            .to_request();
        let resp: RetrieveResponse = test::call_and_read_body_json(&app, req).await;

        assert_eq!(resp.mode, "keyword");
        assert_eq!(resp.results[0].program.name, "Express Entry");
        assert!(resp.context.starts_with("=== IMMIGRATION PROGRAMS ==="));
    }

    #[actix_web::test]
    async fn test_rebuild_in_keyword_mode_conflicts() {
        let app = test::init_service(App::new().app_data(web::Data::new(state())).configure(configure)).await;
        let req = test::TestRequest::post()
            .uri("/index/rebuild")
            .set_json(serde_json::json!({"force": true}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), actix_web::http::StatusCode::CONFLICT);
    }
}
