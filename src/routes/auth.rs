use axum::Json;
use axum::extract::{Path, State};
use serde::{Deserialize, Serialize};

use crate::auth::password;
use crate::auth::reset::{ResetOutcome, TokenStatus};
use crate::db;
use crate::error::AppError;
use crate::models::User;
use crate::state::SharedState;
use crate::store::Fields;

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct UpdateUserRequest {
    pub email: String,
    pub name: Option<String>,
    pub password: Option<String>,
}

#[derive(Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Deserialize)]
pub struct ResetPasswordRequest {
    pub token: String,
    pub new_password: String,
    pub confirm_password: String,
}

#[derive(Serialize)]
pub struct UserResponse {
    pub message: String,
    pub user_id: String,
    pub name: String,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Serialize)]
pub struct ForgotPasswordResponse {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reset_link: Option<String>,
}

fn message(text: &str) -> Json<MessageResponse> {
    Json(MessageResponse {
        message: text.to_string(),
    })
}

pub async fn register(
    State(state): State<SharedState>,
    Json(req): Json<RegisterRequest>,
) -> Result<Json<UserResponse>, AppError> {
    if req.email.is_empty() || req.password.is_empty() || req.name.is_empty() {
        return Err(AppError::BadRequest("All fields are required".to_string()));
    }

    if db::users::find_by_email(state.store.as_ref(), &req.email)
        .await?
        .is_some()
    {
        return Err(AppError::BadRequest("Email already registered".to_string()));
    }

    let pw_hash = password::hash(&req.password).map_err(AppError::Internal)?;
    let user = User::new(&req.name, &req.email, &pw_hash, state.clock.now());
    let user_id = db::users::create(state.store.as_ref(), &user).await?;

    tracing::info!(%user_id, "User registered");
    Ok(Json(UserResponse {
        message: "User created successfully".to_string(),
        user_id,
        name: user.name,
    }))
}

pub async fn login(
    State(state): State<SharedState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<UserResponse>, AppError> {
    let user = db::users::find_by_email(state.store.as_ref(), &req.email)
        .await?
        .filter(|user| password::verify(&req.password, &user.password))
        .ok_or_else(|| AppError::Unauthorized("Invalid email or password".to_string()))?;

    Ok(Json(UserResponse {
        message: "Login successful".to_string(),
        user_id: user.id,
        name: user.name,
    }))
}

pub async fn update_user(
    State(state): State<SharedState>,
    Json(req): Json<UpdateUserRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    let user = db::users::find_by_email(state.store.as_ref(), &req.email)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    let mut changes = Fields::new();
    if let Some(name) = req.name.filter(|n| !n.is_empty()) {
        changes.insert("name", name);
    }
    if let Some(new_password) = req.password.filter(|p| !p.is_empty()) {
        let pw_hash = password::hash(&new_password).map_err(AppError::Internal)?;
        changes.insert("password", pw_hash);
    }

    // An empty change set is rejected by the store as a validation error.
    if db::users::update(state.store.as_ref(), &user.id, changes).await? == 0 {
        return Err(AppError::NotFound("User not found".to_string()));
    }

    Ok(message("User updated successfully"))
}

pub async fn delete_user(
    State(state): State<SharedState>,
    Path(user_id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    if db::users::delete(state.store.as_ref(), &user_id).await? == 0 {
        return Err(AppError::NotFound("User not found".to_string()));
    }

    tracing::info!(%user_id, "User deleted");
    Ok(message("User deleted successfully"))
}

pub async fn forgot_password(
    State(state): State<SharedState>,
    Json(req): Json<ForgotPasswordRequest>,
) -> Result<Json<ForgotPasswordResponse>, AppError> {
    // Same answer whether or not the email exists
    let mut response = ForgotPasswordResponse {
        message: "If that email is registered, a reset link has been sent.".to_string(),
        reset_link: None,
    };

    let Some(user) = db::users::find_by_email(state.store.as_ref(), &req.email).await? else {
        return Ok(Json(response));
    };

    match state.resets.issue(&user.id).await {
        Ok(issued) => {
            let link = state.config.reset_link(&issued.token);
            if state.config.expose_reset_link {
                response.reset_link = Some(link);
            } else {
                tracing::warn!("No mail transport configured. Password reset link: {link}");
            }
        }
        Err(e) => tracing::error!("Failed to issue password reset token: {e}"),
    }

    Ok(Json(response))
}

pub async fn reset_password(
    State(state): State<SharedState>,
    Json(req): Json<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    if req.new_password != req.confirm_password {
        return Err(AppError::BadRequest("Passwords do not match".to_string()));
    }
    if req.new_password.is_empty() {
        return Err(AppError::BadRequest("Password is required".to_string()));
    }

    match state.resets.consume(&req.token, &req.new_password).await? {
        ResetOutcome::Consumed { .. } => Ok(message("Password reset successfully")),
        ResetOutcome::Invalid => Err(AppError::BadRequest(
            "Invalid or expired reset token".to_string(),
        )),
    }
}

pub async fn validate_reset_token(
    State(state): State<SharedState>,
    Path(token): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    match state.resets.validate(&token).await? {
        TokenStatus::Valid { .. } => Ok(message("Token is valid")),
        TokenStatus::Invalid => Err(AppError::BadRequest(
            "Invalid or expired reset token".to_string(),
        )),
    }
}
