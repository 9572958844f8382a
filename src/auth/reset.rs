//! Password-reset tokens.
//!
//! A token is issued on a forgot-password request, valid for one hour, and can
//! be consumed once. Expiry is never written back; it is detected when the
//! token is looked up. Callers only ever see [`TokenStatus::Invalid`] or
//! [`ResetOutcome::Invalid`] for a token that is unknown, used or expired.
//!
//! Issuing a new token leaves earlier ones for the same user untouched.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use sha2::{Digest, Sha256};

use crate::auth::password;
use crate::clock::Clock;
use crate::db;
use crate::models::PasswordResetToken;
use crate::store::{Fields, GuardedUpdate, RecordStore, StoreError, tables};

pub const RESET_TOKEN_TTL_MINUTES: i64 = 60;

#[derive(Debug, thiserror::Error)]
pub enum ResetError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Password hashing failed: {0}")]
    Hashing(String),
}

/// The secret handed to the user. Only its digest is stored.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenStatus {
    Valid { user_id: String },
    Invalid,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResetOutcome {
    Consumed { user_id: String },
    Invalid,
}

pub struct ResetTokenManager {
    store: Arc<dyn RecordStore>,
    clock: Arc<dyn Clock>,
}

fn generate_token() -> String {
    let bytes: [u8; 32] = rand::random();
    hex::encode(bytes)
}

pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

impl ResetTokenManager {
    pub fn with_clock(store: Arc<dyn RecordStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    pub async fn issue(&self, user_id: &str) -> Result<IssuedToken, ResetError> {
        let now = self.clock.now();
        let token = generate_token();
        let expires_at = now + Duration::minutes(RESET_TOKEN_TTL_MINUTES);

        db::password_reset_tokens::create(
            self.store.as_ref(),
            user_id,
            &hash_token(&token),
            expires_at,
            now,
        )
        .await?;

        tracing::info!(user_id, %expires_at, "Issued password reset token");
        Ok(IssuedToken { token, expires_at })
    }

    pub async fn validate(&self, token: &str) -> Result<TokenStatus, ResetError> {
        Ok(match self.active(token).await? {
            Some(stored) => TokenStatus::Valid {
                user_id: stored.user_id,
            },
            None => TokenStatus::Invalid,
        })
    }

    /// Set a new password for the token's owner and burn the token.
    ///
    /// Both writes run in one transaction: the password update first, then
    /// the `used` flip guarded on `used = false`. If either matches no row
    /// (owner gone, or a concurrent consume won) nothing is written.
    pub async fn consume(&self, token: &str, new_password: &str) -> Result<ResetOutcome, ResetError> {
        let Some(stored) = self.active(token).await? else {
            return Ok(ResetOutcome::Invalid);
        };

        let pw_hash = password::hash(new_password).map_err(ResetError::Hashing)?;
        let applied = self
            .store
            .apply_guarded(vec![
                GuardedUpdate::new(
                    tables::USERS,
                    &stored.user_id,
                    Fields::new().with("password", pw_hash),
                ),
                db::password_reset_tokens::mark_used(&stored.id),
            ])
            .await?;

        if !applied {
            tracing::warn!(token_id = %stored.id, "Password reset lost to a concurrent change");
            return Ok(ResetOutcome::Invalid);
        }

        tracing::info!(user_id = %stored.user_id, "Password reset completed");
        Ok(ResetOutcome::Consumed {
            user_id: stored.user_id,
        })
    }

    async fn active(&self, token: &str) -> Result<Option<PasswordResetToken>, ResetError> {
        let stored =
            db::password_reset_tokens::find_unused_by_hash(self.store.as_ref(), &hash_token(token))
                .await;

        let stored = match stored {
            Ok(found) => found,
            // A row whose expiry cannot be parsed can never be valid.
            Err(StoreError::Validation(e)) => {
                tracing::warn!("Unreadable password reset token row: {e}");
                None
            }
            Err(e) => return Err(e.into()),
        };

        let now = self.clock.now();
        Ok(stored.filter(|t| t.is_active(now)))
    }
}
