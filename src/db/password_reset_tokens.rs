use chrono::{DateTime, Utc};

use crate::models::PasswordResetToken;
use crate::store::{Fields, Filter, GuardedUpdate, RecordStore, StoreResult, tables};

pub async fn create(
    store: &dyn RecordStore,
    user_id: &str,
    token_hash: &str,
    expires_at: DateTime<Utc>,
    now: DateTime<Utc>,
) -> StoreResult<PasswordResetToken> {
    let token = PasswordResetToken {
        id: uuid::Uuid::new_v4().to_string(),
        user_id: user_id.to_string(),
        token: token_hash.to_string(),
        expires_at,
        used: false,
        created_at: now,
    };
    super::insert(store, &token).await?;
    Ok(token)
}

/// Unused token with this digest. Expiry is left to the caller.
pub async fn find_unused_by_hash(
    store: &dyn RecordStore,
    token_hash: &str,
) -> StoreResult<Option<PasswordResetToken>> {
    let filter = Filter::new().with("token", token_hash).with("used", false);
    super::find_one(store, &filter).await
}

pub async fn list_for_user(
    store: &dyn RecordStore,
    user_id: &str,
) -> StoreResult<Vec<PasswordResetToken>> {
    super::find_all(store, &Filter::new().with("user_id", user_id)).await
}

/// Flip `used` only while it is still false.
pub fn mark_used(id: &str) -> GuardedUpdate {
    GuardedUpdate::new(
        tables::PASSWORD_RESET_TOKENS,
        id,
        Fields::new().with("used", true),
    )
    .guarded_by(Filter::new().with("used", false))
}
