use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Model;
use crate::store::{Fields, Record, StoreResult, tables};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(name: &str, email: &str, password_hash: &str, now: DateTime<Utc>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.to_string(),
            email: email.to_string(),
            password: password_hash.to_string(),
            created_at: now,
        }
    }
}

impl Model for User {
    const TABLE: &'static str = tables::USERS;

    fn to_fields(&self) -> Fields {
        Fields::new()
            .with("id", &self.id)
            .with("name", &self.name)
            .with("email", &self.email)
            .with("password", &self.password)
            .with("created_at", self.created_at)
    }

    fn from_record(record: &Record) -> StoreResult<Self> {
        Ok(Self {
            id: record.id()?,
            name: record.text("name")?,
            email: record.text("email")?,
            password: record.text("password")?,
            created_at: record.time("created_at")?,
        })
    }
}
