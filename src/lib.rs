pub mod auth;
pub mod clock;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod state;
pub mod store;

use std::sync::Arc;

use axum::Router;
use axum::http::{HeaderName, HeaderValue};
use tower_http::cors::CorsLayer;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::auth::reset::ResetTokenManager;
use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::state::{AppState, SharedState};
use crate::store::RecordStore;

pub fn build_app(store: Arc<dyn RecordStore>, config: Config) -> Router {
    build_app_with_clock(store, config, Arc::new(SystemClock))
}

/// Same as [`build_app`] with an explicit time source.
pub fn build_app_with_clock(
    store: Arc<dyn RecordStore>,
    config: Config,
    clock: Arc<dyn Clock>,
) -> Router {
    let state: SharedState = Arc::new(AppState {
        resets: ResetTokenManager::with_clock(store.clone(), clock.clone()),
        store,
        config,
        clock,
    });

    Router::new()
        .merge(routes::api_routes())
        .route("/health", axum::routing::get(health))
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("x-content-type-options"),
            HeaderValue::from_static("nosniff"),
        ))
        .layer(CorsLayer::very_permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}
