// src/routes.rs

use axum::{
    Router,
    http::Method,
    routing::{get, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{auth, exam_info, exam_paper, question, topic},
    state::AppState,
};

/// Assembles the main application router.
///
/// * Merges all sub-routers (auth, exams, topics, questions, exam papers).
/// * Applies global middleware (Trace, CORS).
/// * Injects global state (Database Pool + Config).
///
/// Write endpoints are admin-gated through the `CurrentAdmin` extractor
/// on the handlers themselves.
pub fn create_router(state: AppState) -> Router {
    let origins = [
        "http://localhost:3000".parse().unwrap(),
        "http://127.0.0.1:3000".parse().unwrap(),
    ];

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
        ]);

    let auth_routes = Router::new().route("/login", post(auth::login));

    let exam_routes = Router::new()
        .route("/", get(exam_info::list_exams).post(exam_info::create_exam))
        .route(
            "/{id}",
            get(exam_info::get_exam)
                .put(exam_info::update_exam)
                .delete(exam_info::delete_exam),
        );

    let topic_routes = Router::new()
        .route("/", get(topic::list_topics).post(topic::create_topic))
        .route("/by-subject", get(topic::topics_by_subject));

    // Static paths take precedence over the /{id} matcher.
    let question_routes = Router::new()
        .route("/numbers", get(question::question_numbers))
        .route(
            "/by-exam-and-number",
            get(question::question_by_exam_and_number),
        )
        .route("/by-exam", get(question::questions_by_exam))
        .route(
            "/",
            get(question::list_questions).post(question::create_question),
        )
        .route(
            "/{id}",
            get(question::get_question).put(question::update_question),
        );

    let exam_paper_routes = Router::new()
        .route("/view", get(exam_paper::view_exam_paper))
        .route("/stats", get(exam_paper::exam_paper_stats));

    Router::new()
        .nest("/api/auth", auth_routes)
        .nest("/api/exams", exam_routes)
        .nest("/api/topics", topic_routes)
        .nest("/api/questions", question_routes)
        .nest("/api/exam-papers", exam_paper_routes)
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
