use axum::Json;
use axum::extract::State;
use serde::Deserialize;

use crate::db;
use crate::error::AppError;
use crate::models::StatusCheck;
use crate::state::SharedState;

#[derive(Deserialize)]
pub struct CreateStatusCheck {
    pub client_name: String,
}

pub async fn create(
    State(state): State<SharedState>,
    Json(req): Json<CreateStatusCheck>,
) -> Result<Json<StatusCheck>, AppError> {
    let check = StatusCheck {
        id: uuid::Uuid::new_v4().to_string(),
        client_name: req.client_name,
        timestamp: state.clock.now(),
    };
    db::status_checks::create(state.store.as_ref(), &check).await?;
    Ok(Json(check))
}

pub async fn list(State(state): State<SharedState>) -> Result<Json<Vec<StatusCheck>>, AppError> {
    Ok(Json(db::status_checks::list_all(state.store.as_ref()).await?))
}
