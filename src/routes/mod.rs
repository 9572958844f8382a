pub mod auth;
pub mod chat;
pub mod status;
pub mod workouts;

use axum::Json;
use axum::Router;
use axum::routing::{delete, get, post, put};
use serde_json::{Value, json};

use crate::state::SharedState;

pub fn api_routes() -> Router<SharedState> {
    Router::new()
        .route("/api/", get(root))
        // Status checks
        .route("/api/status", get(status::list).post(status::create))
        // Users
        .route("/api/register", post(auth::register))
        .route("/api/login", post(auth::login))
        .route("/api/users/update", put(auth::update_user))
        .route("/api/users/{user_id}", delete(auth::delete_user))
        // Password reset
        .route("/api/forgot-password", post(auth::forgot_password))
        .route("/api/reset-password", post(auth::reset_password))
        .route(
            "/api/validate-reset-token/{token}",
            get(auth::validate_reset_token),
        )
        // Chat
        .route("/api/chat", post(chat::send))
        .route("/api/chat/{session_id}", get(chat::history))
        // Workouts
        .route("/api/workouts", post(workouts::save))
        .route("/api/workouts/{user_id}", get(workouts::list_for_user))
}

async fn root() -> Json<Value> {
    Json(json!({ "message": "Hello World" }))
}
