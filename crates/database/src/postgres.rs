//! Postgres-backed [`TableClient`]. Queries are assembled dynamically from
//! the typed conditions with every value bound as a parameter; rows travel
//! back as `to_jsonb` payloads so the rest of the stack stays on opaque
//! JSON objects.

use std::env;

use serde_json::Value;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use koinonia_common::EnvVars;

use crate::client::TableClient;
use crate::error::StorageError;
use crate::query::{check_ident, Condition, Operator, TableQuery};

pub struct PostgresEnv {
    pub database_url: String,
}

impl EnvVars for PostgresEnv {
    fn load() -> Self {
        Self {
            database_url: env::var("DATABASE_URL").unwrap(),
        }
    }

    fn get_env_var(&self, key: &str) -> String {
        match key {
            "DATABASE_URL" => self.database_url.clone(),
            _ => panic!("Invalid environment variable: {}", key),
        }
    }
}

#[derive(Clone)]
pub struct PostgresClient {
    pool: PgPool,
}

impl PostgresClient {
    pub async fn connect(env: &PostgresEnv) -> Result<Self, StorageError> {
        let pool = PgPool::connect(&env.database_url).await?;
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs one DDL statement verbatim. Table ownership lives with the
    /// domain crates; they call this at startup with their CREATE TABLE /
    /// CREATE INDEX statements.
    pub async fn execute_ddl(&self, sql: &str) -> Result<(), StorageError> {
        sqlx::query(sql).execute(&self.pool).await?;
        Ok(())
    }
}

/// Binds one JSON scalar as a query parameter. Strings that parse as UUIDs
/// are bound as such, since keys cross this boundary as JSON strings but
/// live in UUID columns. Nulls are spliced as literals; arrays and objects
/// go over as JSONB.
fn push_value(qb: &mut QueryBuilder<'_, Postgres>, value: &Value) -> Result<(), StorageError> {
    match value {
        Value::Null => {
            qb.push("NULL");
        }
        Value::Bool(b) => {
            qb.push_bind(*b);
        }
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                qb.push_bind(i);
            } else if let Some(f) = n.as_f64() {
                qb.push_bind(f);
            } else {
                return Err(StorageError::QueryConstruction(format!(
                    "unsupported numeric literal: {n}"
                )));
            }
        }
        Value::String(s) => match Uuid::parse_str(s) {
            Ok(id) => {
                qb.push_bind(id);
            }
            Err(_) => {
                qb.push_bind(s.clone());
            }
        },
        other => {
            qb.push_bind(sqlx::types::Json(other.clone()));
        }
    }
    Ok(())
}

fn push_operator_term(
    qb: &mut QueryBuilder<'_, Postgres>,
    column: &str,
    op: Operator,
    value: &Value,
) -> Result<(), StorageError> {
    match op {
        Operator::ILike => {
            let pattern = value.as_str().ok_or_else(|| {
                StorageError::QueryConstruction(format!(
                    "ILIKE on \"{column}\" needs a string pattern"
                ))
            })?;
            qb.push(format!("\"{column}\" ILIKE "));
            qb.push_bind(format!("%{pattern}%"));
        }
        Operator::Eq if value.is_null() => {
            qb.push(format!("\"{column}\" IS NULL"));
        }
        _ => {
            qb.push(format!("\"{column}\" {} ", op.as_sql()));
            push_value(qb, value)?;
        }
    }
    Ok(())
}

fn push_condition(
    qb: &mut QueryBuilder<'_, Postgres>,
    condition: &Condition,
) -> Result<(), StorageError> {
    match condition {
        Condition::Eq { column, value } => {
            let column = check_ident(column)?;
            push_operator_term(qb, column, Operator::Eq, value)?;
        }
        Condition::In { column, values } => {
            let column = check_ident(column)?;
            if values.is_empty() {
                // IN () is not valid SQL; an empty set matches nothing.
                qb.push("FALSE");
                return Ok(());
            }
            qb.push(format!("\"{column}\" IN ("));
            for (i, value) in values.iter().enumerate() {
                if i > 0 {
                    qb.push(", ");
                }
                push_value(qb, value)?;
            }
            qb.push(")");
        }
        Condition::ILike { column, pattern } => {
            let column = check_ident(column)?;
            qb.push(format!("\"{column}\" ILIKE "));
            qb.push_bind(format!("%{pattern}%"));
        }
        Condition::Gte { column, value } => {
            let column = check_ident(column)?;
            push_operator_term(qb, column, Operator::Gte, value)?;
        }
        Condition::Lte { column, value } => {
            let column = check_ident(column)?;
            push_operator_term(qb, column, Operator::Lte, value)?;
        }
        Condition::Not { column, op, value } => {
            let column = check_ident(column)?;
            qb.push("NOT (");
            push_operator_term(qb, column, *op, value)?;
            qb.push(")");
        }
        Condition::Or(terms) => {
            if terms.is_empty() {
                qb.push("TRUE");
                return Ok(());
            }
            qb.push("(");
            for (i, term) in terms.iter().enumerate() {
                if i > 0 {
                    qb.push(" OR ");
                }
                let column = check_ident(&term.column)?;
                push_operator_term(qb, column, term.op, &term.value)?;
            }
            qb.push(")");
        }
    }
    Ok(())
}

fn push_where(
    qb: &mut QueryBuilder<'_, Postgres>,
    conditions: &[Condition],
) -> Result<(), StorageError> {
    if conditions.is_empty() {
        return Ok(());
    }
    qb.push(" WHERE ");
    for (i, condition) in conditions.iter().enumerate() {
        if i > 0 {
            qb.push(" AND ");
        }
        push_condition(qb, condition)?;
    }
    Ok(())
}

#[async_trait::async_trait]
impl TableClient for PostgresClient {
    async fn fetch(&self, resource: &str, query: &TableQuery) -> Result<Vec<Value>, StorageError> {
        let table = check_ident(resource)?;
        let mut qb = QueryBuilder::<Postgres>::new("SELECT to_jsonb(t) FROM (SELECT ");
        match &query.projection {
            Some(columns) => {
                for (i, column) in columns.iter().enumerate() {
                    if i > 0 {
                        qb.push(", ");
                    }
                    qb.push(format!("\"{}\"", check_ident(column)?));
                }
            }
            None => {
                qb.push("*");
            }
        }
        qb.push(format!(" FROM \"{table}\""));
        push_where(&mut qb, &query.conditions)?;
        qb.push(") AS t");
        if !query.order_by.is_empty() {
            qb.push(" ORDER BY ");
            for (i, (column, direction)) in query.order_by.iter().enumerate() {
                if i > 0 {
                    qb.push(", ");
                }
                qb.push(format!("t.\"{}\" {}", check_ident(column)?, direction.as_sql()));
            }
        }
        if let Some((limit, offset)) = query.limit_offset() {
            qb.push(format!(" LIMIT {limit} OFFSET {offset}"));
        }
        let rows: Vec<(Value,)> = qb.build_query_as().fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(|(row,)| row).collect())
    }

    async fn count(&self, resource: &str, query: &TableQuery) -> Result<u64, StorageError> {
        let table = check_ident(resource)?;
        let mut qb = QueryBuilder::<Postgres>::new(format!("SELECT COUNT(*) FROM \"{table}\""));
        push_where(&mut qb, &query.conditions)?;
        let (count,): (i64,) = qb.build_query_as().fetch_one(&self.pool).await?;
        Ok(count.max(0) as u64)
    }

    async fn insert(&self, resource: &str, row: Value) -> Result<Value, StorageError> {
        let table = check_ident(resource)?;
        let object = row.as_object().ok_or_else(|| {
            StorageError::QueryConstruction("insert payload must be a JSON object".into())
        })?;
        if object.is_empty() {
            return Err(StorageError::QueryConstruction(
                "insert payload must not be empty".into(),
            ));
        }
        let mut qb = QueryBuilder::<Postgres>::new(format!("INSERT INTO \"{table}\" ("));
        for (i, column) in object.keys().enumerate() {
            if i > 0 {
                qb.push(", ");
            }
            qb.push(format!("\"{}\"", check_ident(column)?));
        }
        qb.push(") VALUES (");
        for (i, value) in object.values().enumerate() {
            if i > 0 {
                qb.push(", ");
            }
            push_value(&mut qb, value)?;
        }
        qb.push(format!(") RETURNING to_jsonb(\"{table}\".*)"));
        let (stored,): (Value,) = qb.build_query_as().fetch_one(&self.pool).await?;
        Ok(stored)
    }

    async fn update(
        &self,
        resource: &str,
        patch: Value,
        column: &str,
        value: Value,
    ) -> Result<u64, StorageError> {
        let table = check_ident(resource)?;
        let object = patch.as_object().ok_or_else(|| {
            StorageError::QueryConstruction("update patch must be a JSON object".into())
        })?;
        if object.is_empty() {
            return Err(StorageError::QueryConstruction(
                "update patch must not be empty".into(),
            ));
        }
        let mut qb = QueryBuilder::<Postgres>::new(format!("UPDATE \"{table}\" SET "));
        for (i, (key, val)) in object.iter().enumerate() {
            if i > 0 {
                qb.push(", ");
            }
            qb.push(format!("\"{}\" = ", check_ident(key)?));
            push_value(&mut qb, val)?;
        }
        qb.push(" WHERE ");
        push_operator_term(&mut qb, check_ident(column)?, Operator::Eq, &value)?;
        let result = qb.build().execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    async fn delete(&self, resource: &str, column: &str, value: Value) -> Result<u64, StorageError> {
        let table = check_ident(resource)?;
        let mut qb = QueryBuilder::<Postgres>::new(format!("DELETE FROM \"{table}\" WHERE "));
        push_operator_term(&mut qb, check_ident(column)?, Operator::Eq, &value)?;
        let result = qb.build().execute(&self.pool).await?;
        Ok(result.rows_affected())
    }
}
