use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Model;
use crate::store::{Fields, Record, StoreResult, tables};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    pub session_id: String,
    pub user_id: String,
    pub message: String,
    pub response: String,
    pub timestamp: DateTime<Utc>,
}

impl Model for ChatMessage {
    const TABLE: &'static str = tables::CHAT_MESSAGES;

    fn to_fields(&self) -> Fields {
        Fields::new()
            .with("id", &self.id)
            .with("session_id", &self.session_id)
            .with("user_id", &self.user_id)
            .with("message", &self.message)
            .with("response", &self.response)
            .with("timestamp", self.timestamp)
    }

    fn from_record(record: &Record) -> StoreResult<Self> {
        Ok(Self {
            id: record.id()?,
            session_id: record.text("session_id")?,
            user_id: record.text("user_id")?,
            message: record.text("message")?,
            response: record.text("response")?,
            timestamp: record.time("timestamp")?,
        })
    }
}
