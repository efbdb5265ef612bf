use std::sync::Arc;

use axum::{
    http::{header, Method},
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub mod config;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod metrics;
pub mod middlewares;
pub mod models;
pub mod repositories;
pub mod services;
pub mod utils;

pub use config::Config;
pub use error::AppError;
pub use services::AppState;

pub fn create_router(app_state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_origin(tower_http::cors::Any);

    let api = Router::new()
        .nest(
            "/teacher",
            teacher_routes().route_layer(middleware::from_fn(
                middlewares::auth::teacher_guard_middleware,
            )),
        )
        .nest(
            "/student",
            student_routes().route_layer(middleware::from_fn(
                middlewares::auth::student_guard_middleware,
            )),
        )
        .layer(middleware::from_fn_with_state(
            app_state.clone(),
            middlewares::auth::auth_middleware,
        ));

    Router::new()
        // Public endpoints (no auth required)
        .route("/health", get(handlers::health_check))
        // Metrics endpoint with Basic Auth protection
        .route(
            "/metrics",
            get(handlers::metrics_handler).layer(middleware::from_fn_with_state(
                app_state.clone(),
                handlers::metrics_auth_middleware,
            )),
        )
        .nest("/api/v1", api)
        .with_state(app_state)
        .layer(cors)
        .layer(middleware::from_fn(
            middlewares::metrics::metrics_middleware,
        ))
        .layer(TraceLayer::new_for_http())
}

fn teacher_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/assignments",
            get(handlers::teacher::list_assignments).post(handlers::teacher::create_assignment),
        )
        .route(
            "/assignments/needs-reinforcement",
            get(handlers::teacher::list_needs_reinforcement),
        )
        .route(
            "/assignments/{id}/summary",
            get(handlers::teacher::get_assignment_summary),
        )
        .route(
            "/assignments/{id}/submission",
            get(handlers::teacher::get_assignment_submission),
        )
        .route(
            "/assignments/{id}/reinforcements",
            get(handlers::teacher::list_reinforcements),
        )
        .route(
            "/assignments/{id}/reinforcement",
            post(handlers::teacher::create_auto_reinforcement),
        )
        .route(
            "/assignments/{id}/reinforcement/manual",
            post(handlers::teacher::create_manual_reinforcement),
        )
        .route(
            "/assignments/{id}/reinforcement/manual/activity",
            post(handlers::teacher::author_reinforcement_activity),
        )
        .route(
            "/assignments/{id}/reinforcement/manual/assign",
            post(handlers::teacher::assign_reinforcement_activity),
        )
        .route("/submissions", get(handlers::teacher::list_submissions))
        .route("/activities", post(handlers::teacher::create_activity))
        .route("/activities/{id}", get(handlers::teacher::get_activity))
}

fn student_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/assignments", get(handlers::student::list_assignments))
        .route("/assignments/{id}", get(handlers::student::get_assignment))
        .route(
            "/assignments/{id}/submit",
            post(handlers::student::submit_answers),
        )
}
