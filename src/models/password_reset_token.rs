use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Model;
use crate::store::{Fields, Record, StoreResult, tables};

/// A stored reset token. `token` holds the SHA-256 digest, not the secret.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PasswordResetToken {
    pub id: String,
    pub user_id: String,
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub used: bool,
    pub created_at: DateTime<Utc>,
}

impl PasswordResetToken {
    /// Unused and not yet expired. Expiry is exclusive: at `expires_at` the
    /// token is already dead.
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        !self.used && now < self.expires_at
    }
}

impl Model for PasswordResetToken {
    const TABLE: &'static str = tables::PASSWORD_RESET_TOKENS;

    fn to_fields(&self) -> Fields {
        Fields::new()
            .with("id", &self.id)
            .with("user_id", &self.user_id)
            .with("token", &self.token)
            .with("expires_at", self.expires_at)
            .with("used", self.used)
            .with("created_at", self.created_at)
    }

    fn from_record(record: &Record) -> StoreResult<Self> {
        Ok(Self {
            id: record.id()?,
            user_id: record.text("user_id")?,
            token: record.text("token")?,
            expires_at: record.time("expires_at")?,
            used: record.flag("used")?,
            created_at: record.time("created_at")?,
        })
    }
}
