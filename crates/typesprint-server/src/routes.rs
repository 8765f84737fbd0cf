use std::sync::Arc;

use axum::{
    http::{header, Method},
    routing::{get, post},
    Router,
};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    let user_routes = Router::new()
        .route("/register", post(handlers::register))
        .route("/login", post(handlers::login))
        .route("/profile", get(handlers::profile))
        .route("/logout", post(handlers::logout));

    let text_routes = Router::new()
        .route("/", get(handlers::list_texts))
        .route("/random", get(handlers::random_text))
        .route("/:id", get(handlers::get_text));

    let result_routes = Router::new().route(
        "/",
        get(handlers::list_results).post(handlers::create_result),
    );

    // Mirror the caller's origin so credentialed browser requests work
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    Router::new()
        .route("/", get(handlers::health))
        .nest("/api/users", user_routes)
        .nest("/api/texts", text_routes)
        .nest("/api/results", result_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
