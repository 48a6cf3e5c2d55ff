//! Central archive server: axum router plus the background snapshot task.

pub mod routes;
pub mod snapshot;
pub mod state;

use axum::routing::{get, put};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub use state::AppState;

/// Build the server's router: `PUT /submit`, `GET /get_state`, permissive CORS.
pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/submit", put(routes::submit_individual))
        .route("/get_state", get(routes::get_state))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
