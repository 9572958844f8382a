use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Mutex, Semaphore, SemaphorePermit};

use super::{
    Fields, Filter, GuardedUpdate, ID_COLUMN, Record, RecordStore, StoreError, StoreResult, Value,
    check_columns, check_identifier, check_update, new_id, tables,
};

const DEFAULT_CONNECTIONS: usize = 5;
const DEFAULT_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

/// In-process store used by tests and `ZENI_STORE=memory`.
///
/// A semaphore stands in for the connection pool so that the same bounded
/// acquire semantics apply as with PostgreSQL. Unique columns and column
/// defaults are enforced; foreign keys are not.
pub struct MemoryRecordStore {
    tables: Mutex<HashMap<String, Vec<Record>>>,
    unique: HashMap<String, Vec<String>>,
    defaults: HashMap<String, Fields>,
    connections: Semaphore,
    acquire_timeout: Duration,
}

impl Default for MemoryRecordStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryRecordStore {
    /// Store with the unique constraints and column defaults of the
    /// application schema.
    pub fn new() -> Self {
        Self::with_pool(DEFAULT_CONNECTIONS, DEFAULT_ACQUIRE_TIMEOUT)
            .with_unique(tables::USERS, "email")
            .with_unique(tables::PASSWORD_RESET_TOKENS, "token")
            .with_default(tables::PASSWORD_RESET_TOKENS, "used", false)
            .with_default(tables::WORKOUTS, "exercises", serde_json::json!([]))
            .with_default(tables::WORKOUTS, "created_by_ai", false)
    }

    pub fn with_pool(connections: usize, acquire_timeout: Duration) -> Self {
        Self {
            tables: Mutex::new(HashMap::new()),
            unique: HashMap::new(),
            defaults: HashMap::new(),
            connections: Semaphore::new(connections),
            acquire_timeout,
        }
    }

    pub fn with_unique(mut self, table: &str, column: &str) -> Self {
        self.unique
            .entry(table.to_string())
            .or_default()
            .push(column.to_string());
        self
    }

    /// Value stored in `column` when an insert leaves it out.
    pub fn with_default(mut self, table: &str, column: &str, value: impl Into<Value>) -> Self {
        self.defaults
            .entry(table.to_string())
            .or_default()
            .insert(column, value);
        self
    }

    async fn checkout(&self) -> StoreResult<SemaphorePermit<'_>> {
        match tokio::time::timeout(self.acquire_timeout, self.connections.acquire()).await {
            Ok(Ok(permit)) => Ok(permit),
            Ok(Err(_)) => Err(StoreError::Connection("store is closed".to_string())),
            Err(_) => Err(StoreError::Connection(
                "timed out waiting for a connection".to_string(),
            )),
        }
    }

    fn unique_columns(&self, table: &str) -> impl Iterator<Item = &str> {
        std::iter::once(ID_COLUMN).chain(
            self.unique
                .get(table)
                .into_iter()
                .flatten()
                .map(String::as_str),
        )
    }

    fn check_unique(&self, table: &str, rows: &[Record], candidate: &Record, skip: Option<usize>) -> StoreResult<()> {
        for column in self.unique_columns(table) {
            let Some(value) = candidate.get(column).filter(|v| !v.is_null()) else {
                continue;
            };
            let clash = rows
                .iter()
                .enumerate()
                .filter(|(i, _)| Some(*i) != skip)
                .any(|(_, row)| row.get(column) == Some(value));
            if clash {
                return Err(StoreError::Constraint(format!(
                    "duplicate value for {table}.{column}"
                )));
            }
        }
        Ok(())
    }
}

fn matches(row: &Record, filter: &Filter) -> bool {
    filter.iter().all(|(column, expected)| {
        let expected = expected.clone().canonical();
        match row.get(column) {
            Some(actual) => *actual == expected,
            None => expected == Value::Null,
        }
    })
}

fn merged(row: &Record, fields: &Fields) -> Record {
    let mut next = row.clone();
    for (column, value) in fields.clone().canonical() {
        next.insert(&column, value);
    }
    next
}

impl MemoryRecordStore {
    /// Index of the row targeted by an update, after checking it stays unique.
    fn locate(
        &self,
        rows: &[Record],
        table: &str,
        id: &str,
        guard: &Filter,
        fields: &Fields,
    ) -> StoreResult<Option<usize>> {
        let key = Value::Text(id.to_string());
        let Some(index) = rows
            .iter()
            .position(|row| row.get(ID_COLUMN) == Some(&key) && matches(row, guard))
        else {
            return Ok(None);
        };
        self.check_unique(table, rows, &merged(&rows[index], fields), Some(index))?;
        Ok(Some(index))
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn create(&self, table: &str, fields: Fields) -> StoreResult<String> {
        check_columns(table, &fields)?;
        let _conn = self.checkout().await?;

        let mut row = fields.canonical();
        for (column, value) in self.defaults.get(table).into_iter().flat_map(|d| d.iter()) {
            if row.get(column).is_none() {
                row.insert(column, value.clone().canonical());
            }
        }
        let id = match row.get(ID_COLUMN) {
            Some(Value::Text(id)) => id.clone(),
            Some(Value::Null) | None => {
                let id = new_id();
                row.insert(ID_COLUMN, id.as_str());
                id
            }
            Some(_) => return Err(StoreError::Validation("id must be text".to_string())),
        };

        let mut tables = self.tables.lock().await;
        let rows = tables.entry(table.to_string()).or_default();
        self.check_unique(table, rows, &row, None)?;
        rows.push(row);
        tracing::debug!(table, %id, "memory insert");
        Ok(id)
    }

    async fn update(&self, table: &str, id: &str, fields: Fields) -> StoreResult<u64> {
        check_update(table, &fields)?;
        let _conn = self.checkout().await?;

        let mut tables = self.tables.lock().await;
        let Some(rows) = tables.get_mut(table) else {
            return Ok(0);
        };
        match self.locate(rows, table, id, &Filter::new(), &fields)? {
            Some(index) => {
                rows[index] = merged(&rows[index], &fields);
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn delete(&self, table: &str, id: &str) -> StoreResult<u64> {
        check_identifier(table)?;
        let _conn = self.checkout().await?;

        let mut tables = self.tables.lock().await;
        let Some(rows) = tables.get_mut(table) else {
            return Ok(0);
        };
        let key = Value::Text(id.to_string());
        let before = rows.len();
        rows.retain(|row| row.get(ID_COLUMN) != Some(&key));
        Ok((before - rows.len()) as u64)
    }

    async fn find_one(&self, table: &str, filter: &Filter) -> StoreResult<Option<Record>> {
        check_columns(table, filter)?;
        let _conn = self.checkout().await?;

        let tables = self.tables.lock().await;
        Ok(tables
            .get(table)
            .and_then(|rows| rows.iter().find(|row| matches(row, filter)))
            .cloned())
    }

    async fn find_all(&self, table: &str, filter: &Filter) -> StoreResult<Vec<Record>> {
        check_columns(table, filter)?;
        let _conn = self.checkout().await?;

        let tables = self.tables.lock().await;
        Ok(tables
            .get(table)
            .map(|rows| rows.iter().filter(|row| matches(row, filter)).cloned().collect())
            .unwrap_or_default())
    }

    async fn apply_guarded(&self, updates: Vec<GuardedUpdate>) -> StoreResult<bool> {
        for update in &updates {
            check_update(&update.table, &update.fields)?;
            check_columns(&update.table, &update.guard)?;
        }
        let _conn = self.checkout().await?;

        // Work on a snapshot so a failed batch leaves nothing behind.
        let mut tables = self.tables.lock().await;
        let mut staged = tables.clone();
        for update in &updates {
            let Some(rows) = staged.get_mut(&update.table) else {
                return Ok(false);
            };
            match self.locate(rows, &update.table, &update.id, &update.guard, &update.fields)? {
                Some(index) => rows[index] = merged(&rows[index], &update.fields),
                None => return Ok(false),
            }
        }
        *tables = staged;
        Ok(true)
    }

    async fn close(&self) {
        self.connections.close();
    }
}
