use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::{films, handlers, middleware::metrics_middleware};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // API routes
    let api_routes = Router::new()
        // Health and config
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        // Films. `?search=` sets the term of the one hosted view, so it is
        // shared by every client until the next request that carries it.
        .route("/films", get(films::get_films))
        .route("/films/refresh", post(films::refresh_films))
        .with_state(Arc::clone(&state));

    Router::new()
        // Same shared search term as `/api/v1/films`
        .route("/films", get(films::films_page))
        .route("/metrics", get(handlers::metrics))
        .with_state(state)
        .nest("/api/v1", api_routes)
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
}
