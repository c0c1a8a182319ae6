// src/routes.rs

use axum::{
    Router,
    http::{HeaderValue, Method},
    routing::{get, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{analysis, exams, scoring, stats},
    state::AppState,
};

/// Assembles the main application router.
///
/// * Merges all sub-routers (reference data, students, exams).
/// * Applies global middleware (Trace, CORS).
/// * Injects global state (Database Pool, Config).
pub fn create_router(state: AppState) -> Router {
    let origins: Vec<HeaderValue> = state
        .config
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([axum::http::header::CONTENT_TYPE]);

    let reference_routes = Router::new()
        .route("/api/health", get(scoring::health))
        .route("/api/quotas", get(scoring::list_quotas))
        .route("/api/scoring/totals", post(scoring::preview_totals));

    let student_routes = Router::new()
        .route(
            "/{student_id}/exams",
            get(exams::list_exams).post(exams::create_exam),
        )
        .route("/{student_id}/exams/legacy", post(exams::import_legacy_exam))
        .route("/{student_id}/stats/subjects", get(stats::subject_stats))
        .route("/{student_id}/stats/trend", get(stats::trend_stats))
        .route("/{student_id}/stats/summary", get(stats::summary_stats));

    let exam_routes = Router::new()
        .route("/{id}", get(exams::get_exam).delete(exams::delete_exam))
        .route(
            "/{id}/analysis",
            get(analysis::get_analysis).put(analysis::update_analysis),
        );

    Router::new()
        .merge(reference_routes)
        .nest("/api/students", student_routes)
        .nest("/api/exams", exam_routes)
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
