use axum::Json;
use axum::extract::{Path, State};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db;
use crate::error::AppError;
use crate::models::WorkoutPlan;
use crate::state::SharedState;

#[derive(Deserialize)]
pub struct SaveWorkoutRequest {
    pub id: Option<String>,
    pub user_id: String,
    pub title: String,
    pub category: String,
    #[serde(default)]
    pub exercises: Vec<serde_json::Value>,
    pub duration: String,
    pub difficulty: String,
    #[serde(default)]
    pub created_by_ai: bool,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Serialize)]
pub struct SaveWorkoutResponse {
    pub message: String,
    pub workout_id: String,
}

pub async fn save(
    State(state): State<SharedState>,
    Json(req): Json<SaveWorkoutRequest>,
) -> Result<Json<SaveWorkoutResponse>, AppError> {
    if req.exercises.iter().any(|e| !e.is_object()) {
        return Err(AppError::BadRequest(
            "Each exercise must be an object".to_string(),
        ));
    }

    let workout = WorkoutPlan {
        id: req.id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
        user_id: req.user_id,
        title: req.title,
        category: req.category,
        exercises: req.exercises,
        duration: req.duration,
        difficulty: req.difficulty,
        created_by_ai: req.created_by_ai,
        created_at: req.created_at.unwrap_or_else(|| state.clock.now()),
    };
    let workout_id = db::workouts::create(state.store.as_ref(), &workout).await?;

    Ok(Json(SaveWorkoutResponse {
        message: "Workout saved successfully".to_string(),
        workout_id,
    }))
}

pub async fn list_for_user(
    State(state): State<SharedState>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<WorkoutPlan>>, AppError> {
    Ok(Json(db::workouts::list_by_user(state.store.as_ref(), &user_id).await?))
}
