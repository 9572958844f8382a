use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::{PgArguments, PgConnection, PgPoolOptions};
use sqlx::query::Query;
use sqlx::{PgPool, Postgres, Row};

use super::{
    Fields, Filter, GuardedUpdate, ID_COLUMN, Record, RecordStore, StoreError, StoreResult, Value,
    canonical_time, check_columns, check_identifier, check_update, new_id,
};

type PgQuery<'q> = Query<'q, Postgres, PgArguments>;

#[derive(Debug, Clone)]
pub struct PoolSettings {
    pub max_connections: u32,
    pub acquire_timeout: Duration,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_connections: 5,
            acquire_timeout: Duration::from_secs(5),
        }
    }
}

/// [`RecordStore`] backed by a PostgreSQL pool.
///
/// Rows are read back with `to_jsonb(row)` so any table can be decoded without
/// knowing its column types. Timestamps are stored as canonical text.
#[derive(Clone)]
pub struct PgRecordStore {
    pool: PgPool,
}

impl PgRecordStore {
    pub async fn connect(database_url: &str, settings: &PoolSettings) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(settings.max_connections)
            .acquire_timeout(settings.acquire_timeout)
            .connect(database_url)
            .await?;
        Ok(Self { pool })
    }

    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }
}

/// SQL text plus the values bound to its `$n` placeholders.
///
/// Nulls are written inline so no untyped parameter ever reaches the server.
struct Statement<'a> {
    sql: String,
    params: Vec<&'a Value>,
}

impl<'a> Statement<'a> {
    fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
        }
    }

    fn push(&mut self, sql: &str) {
        self.sql.push_str(sql);
    }

    fn push_value(&mut self, value: &'a Value) {
        if value.is_null() {
            self.sql.push_str("NULL");
        } else {
            self.params.push(value);
            self.sql.push_str(&format!("${}", self.params.len()));
        }
    }

    fn push_assignments(&mut self, fields: &'a Fields) {
        for (i, (column, value)) in fields.iter().enumerate() {
            if i > 0 {
                self.push(", ");
            }
            self.push(&format!("{column} = "));
            self.push_value(value);
        }
    }

    /// Appends ` WHERE a = $1 AND b IS NULL ...`; nothing for an empty filter.
    fn push_filter(&mut self, filter: &'a Filter) {
        for (i, (column, value)) in filter.iter().enumerate() {
            self.push(if i == 0 { " WHERE " } else { " AND " });
            self.push_predicate(column, value);
        }
    }

    fn push_predicate(&mut self, column: &str, value: &'a Value) {
        if value.is_null() {
            self.push(&format!("{column} IS NULL"));
        } else {
            self.push(&format!("{column} = "));
            self.push_value(value);
        }
    }

    fn query(&self) -> PgQuery<'_> {
        self.params
            .iter()
            .fold(sqlx::query(&self.sql), |query, value| bind(query, value))
    }
}

fn bind<'q>(query: PgQuery<'q>, value: &'q Value) -> PgQuery<'q> {
    match value {
        Value::Null => query.bind(Option::<String>::None),
        Value::Bool(b) => query.bind(*b),
        Value::Int(i) => query.bind(*i),
        Value::Float(f) => query.bind(*f),
        Value::Text(s) => query.bind(s.as_str()),
        Value::Time(t) => query.bind(canonical_time(t)),
        Value::Json(j) => query.bind(sqlx::types::Json(j)),
    }
}

fn update_statement<'a>(table: &str, id: &'a Value, fields: &'a Fields, guard: &'a Filter) -> Statement<'a> {
    let mut stmt = Statement::new(format!("UPDATE {table} SET "));
    stmt.push_assignments(fields);
    stmt.push(&format!(" WHERE {ID_COLUMN} = "));
    stmt.push_value(id);
    for (column, value) in guard.iter() {
        stmt.push(" AND ");
        stmt.push_predicate(column, value);
    }
    stmt
}

fn decode_row(row: &sqlx::postgres::PgRow) -> StoreResult<Record> {
    let json: serde_json::Value = row.try_get(0)?;
    match json {
        serde_json::Value::Object(object) => Ok(Fields::from_json_object(object)),
        other => Err(StoreError::Validation(format!(
            "expected a row object, got {other}"
        ))),
    }
}

async fn execute_update(
    conn: &mut PgConnection,
    table: &str,
    id: &str,
    fields: &Fields,
    guard: &Filter,
) -> StoreResult<u64> {
    let id = Value::Text(id.to_string());
    let stmt = update_statement(table, &id, fields, guard);
    tracing::debug!(sql = %stmt.sql, "update");
    let result = stmt.query().execute(&mut *conn).await?;
    Ok(result.rows_affected())
}

#[async_trait]
impl RecordStore for PgRecordStore {
    async fn create(&self, table: &str, fields: Fields) -> StoreResult<String> {
        check_columns(table, &fields)?;

        let mut row = fields.canonical();
        let id = match row.get(ID_COLUMN) {
            Some(Value::Text(id)) => id.clone(),
            Some(Value::Null) | None => {
                let id = new_id();
                row.insert(ID_COLUMN, id.as_str());
                id
            }
            Some(_) => return Err(StoreError::Validation("id must be text".to_string())),
        };

        let columns = row.columns().cloned().collect::<Vec<_>>().join(", ");
        let mut stmt = Statement::new(format!("INSERT INTO {table} ({columns}) VALUES ("));
        for (i, (_, value)) in row.iter().enumerate() {
            if i > 0 {
                stmt.push(", ");
            }
            stmt.push_value(value);
        }
        stmt.push(")");

        let mut conn = self.pool.acquire().await?;
        tracing::debug!(sql = %stmt.sql, "insert");
        stmt.query().execute(&mut *conn).await?;
        Ok(id)
    }

    async fn update(&self, table: &str, id: &str, fields: Fields) -> StoreResult<u64> {
        check_update(table, &fields)?;
        let mut conn = self.pool.acquire().await?;
        execute_update(&mut conn, table, id, &fields, &Filter::new()).await
    }

    async fn delete(&self, table: &str, id: &str) -> StoreResult<u64> {
        check_identifier(table)?;
        let id = Value::Text(id.to_string());
        let mut stmt = Statement::new(format!("DELETE FROM {table} WHERE {ID_COLUMN} = "));
        stmt.push_value(&id);

        let mut conn = self.pool.acquire().await?;
        let result = stmt.query().execute(&mut *conn).await?;
        Ok(result.rows_affected())
    }

    async fn find_one(&self, table: &str, filter: &Filter) -> StoreResult<Option<Record>> {
        check_columns(table, filter)?;
        let mut stmt = Statement::new(format!("SELECT to_jsonb(t) FROM {table} t"));
        stmt.push_filter(filter);
        stmt.push(" LIMIT 1");

        let mut conn = self.pool.acquire().await?;
        let row = stmt.query().fetch_optional(&mut *conn).await?;
        row.as_ref().map(decode_row).transpose()
    }

    async fn find_all(&self, table: &str, filter: &Filter) -> StoreResult<Vec<Record>> {
        check_columns(table, filter)?;
        let mut stmt = Statement::new(format!("SELECT to_jsonb(t) FROM {table} t"));
        stmt.push_filter(filter);

        let mut conn = self.pool.acquire().await?;
        let rows = stmt.query().fetch_all(&mut *conn).await?;
        rows.iter().map(decode_row).collect()
    }

    async fn apply_guarded(&self, updates: Vec<GuardedUpdate>) -> StoreResult<bool> {
        for update in &updates {
            check_update(&update.table, &update.fields)?;
            check_columns(&update.table, &update.guard)?;
        }

        let mut tx = self.pool.begin().await?;
        for update in &updates {
            let affected =
                execute_update(&mut tx, &update.table, &update.id, &update.fields, &update.guard)
                    .await?;
            if affected == 0 {
                tx.rollback().await?;
                return Ok(false);
            }
        }
        tx.commit().await?;
        Ok(true)
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db) => {
                use sqlx::error::ErrorKind;
                match db.kind() {
                    ErrorKind::UniqueViolation
                    | ErrorKind::ForeignKeyViolation
                    | ErrorKind::NotNullViolation
                    | ErrorKind::CheckViolation => StoreError::Constraint(db.message().to_string()),
                    _ => {
                        // SQLSTATE classes 22 (data exception) and 42 (syntax,
                        // undefined column/table) come from bad caller input.
                        let code = db.code().map(|c| c.into_owned()).unwrap_or_default();
                        if code.starts_with("22") || code.starts_with("42") {
                            StoreError::Validation(db.message().to_string())
                        } else {
                            StoreError::Connection(db.message().to_string())
                        }
                    }
                }
            }
            sqlx::Error::ColumnDecode { .. } | sqlx::Error::ColumnNotFound(_) | sqlx::Error::Decode(_) => {
                StoreError::Validation(err.to_string())
            }
            other => StoreError::Connection(other.to_string()),
        }
    }
}
