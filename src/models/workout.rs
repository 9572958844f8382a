use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Model;
use crate::store::{Fields, Record, StoreError, StoreResult, tables};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkoutPlan {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub category: String,
    pub exercises: Vec<serde_json::Value>,
    pub duration: String,
    pub difficulty: String,
    pub created_by_ai: bool,
    pub created_at: DateTime<Utc>,
}

impl Model for WorkoutPlan {
    const TABLE: &'static str = tables::WORKOUTS;

    fn to_fields(&self) -> Fields {
        Fields::new()
            .with("id", &self.id)
            .with("user_id", &self.user_id)
            .with("title", &self.title)
            .with("category", &self.category)
            .with("exercises", serde_json::Value::Array(self.exercises.clone()))
            .with("duration", &self.duration)
            .with("difficulty", &self.difficulty)
            .with("created_by_ai", self.created_by_ai)
            .with("created_at", self.created_at)
    }

    fn from_record(record: &Record) -> StoreResult<Self> {
        let exercises = match record.json("exercises")? {
            serde_json::Value::Array(items) => items,
            serde_json::Value::Null => Vec::new(),
            other => {
                return Err(StoreError::Validation(format!(
                    "column `exercises` is not an array: {other}"
                )));
            }
        };

        Ok(Self {
            id: record.id()?,
            user_id: record.text("user_id")?,
            title: record.text("title")?,
            category: record.text("category")?,
            exercises,
            duration: record.text("duration")?,
            difficulty: record.text("difficulty")?,
            created_by_ai: record.flag("created_by_ai")?,
            created_at: record.time("created_at")?,
        })
    }
}
