use async_trait::async_trait;
use serde_json::Value;

use crate::error::StorageError;
use crate::query::TableQuery;

/// Generic remote tabular-query client. Implementations own the transport;
/// callers own the query shape. Every method is one remote round trip with
/// no retry and no client-side caching.
#[async_trait]
pub trait TableClient: Send + Sync {
    /// Returns every row of `resource` matching `query`, ordered and
    /// range-bounded as requested.
    async fn fetch(&self, resource: &str, query: &TableQuery) -> Result<Vec<Value>, StorageError>;

    /// Asserts a one-row result: `NotFound` on zero rows, an error on more
    /// than one.
    async fn fetch_one(&self, resource: &str, query: &TableQuery) -> Result<Value, StorageError> {
        let mut rows = self.fetch(resource, query).await?;
        match rows.len() {
            0 => Err(StorageError::not_found(resource)),
            1 => Ok(rows.remove(0)),
            n => Err(StorageError::remote(format!(
                "expected a single row from \"{resource}\", got {n}"
            ))),
        }
    }

    /// Exact count of rows matching the query's conditions, independent of
    /// its range, ordering, and projection. No row payload is transferred.
    async fn count(&self, resource: &str, query: &TableQuery) -> Result<u64, StorageError>;

    /// Inserts one row (a JSON object) and returns the stored row.
    async fn insert(&self, resource: &str, row: Value) -> Result<Value, StorageError>;

    /// Applies `patch` (a JSON object of column/value pairs) to every row
    /// where `column` equals `value`; returns the number of rows touched.
    async fn update(
        &self,
        resource: &str,
        patch: Value,
        column: &str,
        value: Value,
    ) -> Result<u64, StorageError>;

    /// Deletes every row where `column` equals `value`; returns the number
    /// of rows removed.
    async fn delete(&self, resource: &str, column: &str, value: Value) -> Result<u64, StorageError>;
}
