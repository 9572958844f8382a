//! Generic record access over named tables.
//!
//! Every table has a string `id` column; all other columns are treated as an
//! opaque bag of [`Value`]s. Typed models live above this layer (see
//! [`crate::models`]) and only convert to and from [`Fields`] at the boundary.

pub mod memory;
pub mod postgres;

use std::collections::BTreeMap;
use std::sync::LazyLock;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use regex::Regex;

pub use memory::MemoryRecordStore;
pub use postgres::PgRecordStore;

/// Table names known to the application schema.
pub mod tables {
    pub const USERS: &str = "users";
    pub const PASSWORD_RESET_TOKENS: &str = "password_reset_tokens";
    pub const STATUS_CHECKS: &str = "status_checks";
    pub const CHAT_MESSAGES: &str = "chat_messages";
    pub const WORKOUTS: &str = "workouts";
}

pub const ID_COLUMN: &str = "id";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Pool exhausted or closed, backend unreachable. Retryable.
    #[error("Connection error: {0}")]
    Connection(String),

    /// Uniqueness, foreign-key, not-null or check violation.
    #[error("Constraint violation: {0}")]
    Constraint(String),

    /// Malformed input from the caller.
    #[error("Validation error: {0}")]
    Validation(String),
}

impl StoreError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, StoreError::Connection(_))
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// A single column value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Time(DateTime<Utc>),
    Json(serde_json::Value),
}

impl Value {
    /// Timestamps become canonical text; everything else is unchanged.
    pub fn canonical(self) -> Value {
        match self {
            Value::Time(t) => Value::Text(canonical_time(&t)),
            other => other,
        }
    }

    pub fn from_json(value: serde_json::Value) -> Value {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::Text(s),
            other => Value::Json(other),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<&String> for Value {
    fn from(v: &String) -> Self {
        Value::Text(v.clone())
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v.into())
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::Time(v)
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        Value::Json(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

/// Canonical persisted form of a timestamp: RFC 3339, UTC, microseconds.
pub fn canonical_time(t: &DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse a persisted timestamp. Accepts RFC 3339 and naive ISO-8601 (as UTC).
pub fn parse_time(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(t) = DateTime::parse_from_rfc3339(s) {
        return Some(t.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()
        .map(|naive| naive.and_utc())
}

/// An ordered column-name to value mapping.
///
/// Used for rows read back from a table ([`Record`]), for field sets passed to
/// `create`/`update`, and for equality filters ([`Filter`]).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fields(BTreeMap<String, Value>);

pub type Record = Fields;
pub type Filter = Fields;

impl Fields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.insert(column, value);
        self
    }

    pub fn insert(&mut self, column: &str, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(column.to_string(), value.into())
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.0.get(column)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn columns(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    /// Same fields with every timestamp replaced by its canonical text.
    pub fn canonical(self) -> Fields {
        Fields(self.0.into_iter().map(|(k, v)| (k, v.canonical())).collect())
    }

    /// Build a record from a JSON object (as produced by `to_jsonb(row)`).
    pub fn from_json_object(object: serde_json::Map<String, serde_json::Value>) -> Fields {
        Fields(
            object
                .into_iter()
                .map(|(k, v)| (k, Value::from_json(v)))
                .collect(),
        )
    }

    pub fn id(&self) -> StoreResult<String> {
        self.text(ID_COLUMN)
    }

    pub fn text(&self, column: &str) -> StoreResult<String> {
        match self.get(column) {
            Some(Value::Text(s)) => Ok(s.clone()),
            _ => Err(column_error(column, "text")),
        }
    }

    pub fn opt_text(&self, column: &str) -> StoreResult<Option<String>> {
        match self.get(column) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Text(s)) => Ok(Some(s.clone())),
            _ => Err(column_error(column, "text")),
        }
    }

    pub fn flag(&self, column: &str) -> StoreResult<bool> {
        match self.get(column) {
            Some(Value::Bool(b)) => Ok(*b),
            // MySQL-style tinyint booleans
            Some(Value::Int(i)) => Ok(*i != 0),
            None | Some(Value::Null) => Ok(false),
            _ => Err(column_error(column, "bool")),
        }
    }

    pub fn time(&self, column: &str) -> StoreResult<DateTime<Utc>> {
        match self.get(column) {
            Some(Value::Time(t)) => Ok(*t),
            Some(Value::Text(s)) => parse_time(s).ok_or_else(|| column_error(column, "timestamp")),
            _ => Err(column_error(column, "timestamp")),
        }
    }

    /// JSON column; text holding serialized JSON is decoded as well.
    pub fn json(&self, column: &str) -> StoreResult<serde_json::Value> {
        match self.get(column) {
            Some(Value::Json(j)) => Ok(j.clone()),
            Some(Value::Text(s)) => serde_json::from_str(s)
                .map_err(|e| StoreError::Validation(format!("column `{column}`: {e}"))),
            None | Some(Value::Null) => Ok(serde_json::Value::Null),
            _ => Err(column_error(column, "json")),
        }
    }
}

impl IntoIterator for Fields {
    type Item = (String, Value);
    type IntoIter = std::collections::btree_map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl FromIterator<(String, Value)> for Fields {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Fields(iter.into_iter().collect())
    }
}

fn column_error(column: &str, expected: &str) -> StoreError {
    StoreError::Validation(format!("column `{column}` is missing or not {expected}"))
}

/// One update inside [`RecordStore::apply_guarded`].
///
/// Matches the row with `id` and, additionally, every equality in `guard`.
#[derive(Debug, Clone)]
pub struct GuardedUpdate {
    pub table: String,
    pub id: String,
    pub fields: Fields,
    pub guard: Filter,
}

impl GuardedUpdate {
    pub fn new(table: &str, id: &str, fields: Fields) -> Self {
        Self {
            table: table.to_string(),
            id: id.to_string(),
            fields,
            guard: Filter::new(),
        }
    }

    pub fn guarded_by(mut self, guard: Filter) -> Self {
        self.guard = guard;
        self
    }
}

#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Insert a row and return its id, generating one when `fields` has none.
    async fn create(&self, table: &str, fields: Fields) -> StoreResult<String>;

    /// Partial update keyed on id. Returns the number of rows changed; 0 means
    /// no such row.
    async fn update(&self, table: &str, id: &str, fields: Fields) -> StoreResult<u64>;

    async fn delete(&self, table: &str, id: &str) -> StoreResult<u64>;

    async fn find_one(&self, table: &str, filter: &Filter) -> StoreResult<Option<Record>>;

    /// Every row matching `filter`; an empty filter matches all rows. No
    /// ordering is guaranteed.
    async fn find_all(&self, table: &str, filter: &Filter) -> StoreResult<Vec<Record>>;

    /// Apply all updates in one transaction. If any of them matches no row the
    /// whole batch is rolled back and `false` is returned.
    async fn apply_guarded(&self, updates: Vec<GuardedUpdate>) -> StoreResult<bool>;

    /// Release the pool. Later calls fail with [`StoreError::Connection`].
    async fn close(&self);
}

static IDENTIFIER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier pattern is valid")
});

pub(crate) fn check_identifier(name: &str) -> StoreResult<()> {
    if IDENTIFIER.is_match(name) {
        Ok(())
    } else {
        Err(StoreError::Validation(format!("invalid identifier `{name}`")))
    }
}

pub(crate) fn check_columns(table: &str, fields: &Fields) -> StoreResult<()> {
    check_identifier(table)?;
    fields.columns().try_for_each(|c| check_identifier(c))
}

pub(crate) fn check_update(table: &str, fields: &Fields) -> StoreResult<()> {
    if fields.is_empty() {
        return Err(StoreError::Validation("no fields to update".to_string()));
    }
    check_columns(table, fields)
}

pub(crate) fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
