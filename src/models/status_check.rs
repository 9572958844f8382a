use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Model;
use crate::store::{Fields, Record, StoreResult, tables};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusCheck {
    pub id: String,
    pub client_name: String,
    pub timestamp: DateTime<Utc>,
}

impl Model for StatusCheck {
    const TABLE: &'static str = tables::STATUS_CHECKS;

    fn to_fields(&self) -> Fields {
        Fields::new()
            .with("id", &self.id)
            .with("client_name", &self.client_name)
            .with("timestamp", self.timestamp)
    }

    fn from_record(record: &Record) -> StoreResult<Self> {
        Ok(Self {
            id: record.id()?,
            client_name: record.text("client_name")?,
            timestamp: record.time("timestamp")?,
        })
    }
}
