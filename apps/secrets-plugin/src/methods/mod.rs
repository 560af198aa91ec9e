pub mod activate;
pub mod entities;
pub mod get_secret;
pub mod routes;

use axum::routing::post;
use axum::Router;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};

use crate::methods::activate::activate;
use crate::methods::get_secret::get_secret;
use crate::methods::routes::{ACTIVATE_PATH, GET_SECRET_PATH};
use crate::state::AppState;

/// Plugin protocol routes with request tracing
pub fn router(state: AppState) -> Router {
    Router::new()
        .route(ACTIVATE_PATH, post(activate))
        .route(GET_SECRET_PATH, post(get_secret))
        .with_state(state)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(tracing::Level::DEBUG))
                .on_response(DefaultOnResponse::new().level(tracing::Level::DEBUG)),
        )
}
