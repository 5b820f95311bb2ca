// src/routes.rs

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    routing::{get, post},
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{document, quiz, result, session},
    state::AppState,
};

/// Assembles the main application router.
///
/// * Every route is scoped to one in-memory quiz session.
/// * Applies global middleware (Trace, CORS).
/// * Injects global state (sessions, extractor, generator factory).
pub fn create_router(state: AppState) -> Router {
    let origins: Vec<HeaderValue> = state
        .config
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([axum::http::header::CONTENT_TYPE]);

    let quiz_routes = Router::new()
        .route("/", post(quiz::start_quiz).get(quiz::get_quiz))
        .route("/answer", post(quiz::select_answer))
        .route("/next", post(quiz::next_question))
        .route("/previous", post(quiz::previous_question));

    let result_routes = Router::new()
        .route("/", get(result::get_result))
        .route("/pdf", get(result::download_result_pdf));

    let session_routes = Router::new()
        .route("/", post(session::create_session))
        .route(
            "/{id}",
            get(session::get_session).delete(session::delete_session),
        )
        .route("/{id}/restart", post(session::restart_session))
        .route(
            "/{id}/document",
            post(document::upload_document)
                .layer(DefaultBodyLimit::max(state.config.max_upload_bytes)),
        )
        .nest("/{id}/quiz", quiz_routes)
        .nest("/{id}/result", result_routes);

    Router::new()
        .nest("/api/sessions", session_routes)
        // Global Middleware (applied from outside in)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}
