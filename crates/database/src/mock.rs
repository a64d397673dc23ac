//! In-memory [`TableClient`] for tests and local fixtures. Rows are plain
//! JSON objects grouped per resource; conditions, sort keys, ranges, and
//! projections are evaluated with the same semantics the remote backend
//! applies, so the paginator and the comment services behave identically
//! against it.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::{Map, Value};

use crate::client::TableClient;
use crate::error::StorageError;
use crate::query::{Condition, Operator, OrderDirection, TableQuery};

#[derive(Clone, Default)]
pub struct MemoryClient {
    inner: Arc<RwLock<HashMap<String, Vec<Value>>>>,
}

impl MemoryClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rows currently stored for `resource`, filters aside.
    pub fn stored(&self, resource: &str) -> usize {
        self.inner.read().get(resource).map_or(0, |rows| rows.len())
    }
}

/// A missing key and an explicit null are both "no value".
fn field<'a>(row: &'a Value, column: &str) -> Option<&'a Value> {
    match row.get(column) {
        Some(Value::Null) | None => None,
        Some(value) => Some(value),
    }
}

fn compare(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Number(l), Value::Number(r)) => l.as_f64().partial_cmp(&r.as_f64()),
        (Value::String(l), Value::String(r)) => Some(l.cmp(r)),
        (Value::Bool(l), Value::Bool(r)) => Some(l.cmp(r)),
        _ => None,
    }
}

fn compare_field(row: &Value, column: &str, target: &Value) -> Option<Ordering> {
    compare(field(row, column)?, target)
}

fn operator_matches(row: &Value, column: &str, op: Operator, target: &Value) -> bool {
    match op {
        Operator::Eq => match field(row, column) {
            Some(value) => value == target,
            None => target.is_null(),
        },
        Operator::ILike => match (field(row, column), target.as_str()) {
            (Some(Value::String(s)), Some(pattern)) => {
                s.to_lowercase().contains(&pattern.to_lowercase())
            }
            _ => false,
        },
        Operator::Gt => compare_field(row, column, target) == Some(Ordering::Greater),
        Operator::Gte => matches!(
            compare_field(row, column, target),
            Some(Ordering::Greater) | Some(Ordering::Equal)
        ),
        Operator::Lt => compare_field(row, column, target) == Some(Ordering::Less),
        Operator::Lte => matches!(
            compare_field(row, column, target),
            Some(Ordering::Less) | Some(Ordering::Equal)
        ),
    }
}

fn condition_matches(row: &Value, condition: &Condition) -> bool {
    match condition {
        Condition::Eq { column, value } => operator_matches(row, column, Operator::Eq, value),
        Condition::In { column, values } => values
            .iter()
            .any(|value| operator_matches(row, column, Operator::Eq, value)),
        Condition::ILike { column, pattern } => {
            operator_matches(row, column, Operator::ILike, &Value::String(pattern.clone()))
        }
        Condition::Gte { column, value } => operator_matches(row, column, Operator::Gte, value),
        Condition::Lte { column, value } => operator_matches(row, column, Operator::Lte, value),
        Condition::Not { column, op, value } => !operator_matches(row, column, *op, value),
        Condition::Or(terms) => terms
            .iter()
            .any(|term| operator_matches(row, &term.column, term.op, &term.value)),
    }
}

fn row_matches(row: &Value, conditions: &[Condition]) -> bool {
    conditions.iter().all(|condition| condition_matches(row, condition))
}

fn sort_rows(rows: &mut [Value], order_by: &[(String, OrderDirection)]) {
    rows.sort_by(|left, right| {
        for (column, direction) in order_by {
            // Nulls sort last ascending, first descending.
            let ordering = match (field(left, column), field(right, column)) {
                (None, None) => Ordering::Equal,
                (None, Some(_)) => Ordering::Greater,
                (Some(_), None) => Ordering::Less,
                (Some(l), Some(r)) => compare(l, r).unwrap_or(Ordering::Equal),
            };
            let ordering = match direction {
                OrderDirection::Asc => ordering,
                OrderDirection::Desc => ordering.reverse(),
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    });
}

fn project(row: &Value, columns: &[String]) -> Value {
    let mut out = Map::new();
    if let Some(object) = row.as_object() {
        for column in columns {
            if let Some(value) = object.get(column) {
                out.insert(column.clone(), value.clone());
            }
        }
    }
    Value::Object(out)
}

#[async_trait]
impl TableClient for MemoryClient {
    async fn fetch(&self, resource: &str, query: &TableQuery) -> Result<Vec<Value>, StorageError> {
        let mut rows: Vec<Value> = self
            .inner
            .read()
            .get(resource)
            .map(|rows| {
                rows.iter()
                    .filter(|row| row_matches(row, &query.conditions))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        sort_rows(&mut rows, &query.order_by);
        if let Some((from, to)) = query.range {
            let start = from.max(0);
            let count = (to - start + 1).max(0) as usize;
            rows = rows.into_iter().skip(start as usize).take(count).collect();
        }
        if let Some(columns) = &query.projection {
            rows = rows.iter().map(|row| project(row, columns)).collect();
        }
        Ok(rows)
    }

    async fn count(&self, resource: &str, query: &TableQuery) -> Result<u64, StorageError> {
        let count = self.inner.read().get(resource).map_or(0, |rows| {
            rows.iter().filter(|row| row_matches(row, &query.conditions)).count()
        });
        Ok(count as u64)
    }

    async fn insert(&self, resource: &str, row: Value) -> Result<Value, StorageError> {
        if !row.is_object() {
            return Err(StorageError::QueryConstruction(
                "insert payload must be a JSON object".into(),
            ));
        }
        self.inner
            .write()
            .entry(resource.to_string())
            .or_default()
            .push(row.clone());
        Ok(row)
    }

    async fn update(
        &self,
        resource: &str,
        patch: Value,
        column: &str,
        value: Value,
    ) -> Result<u64, StorageError> {
        let patch = patch
            .as_object()
            .ok_or_else(|| {
                StorageError::QueryConstruction("update patch must be a JSON object".into())
            })?
            .clone();
        let mut tables = self.inner.write();
        let Some(rows) = tables.get_mut(resource) else {
            return Ok(0);
        };
        let mut updated = 0;
        for row in rows.iter_mut() {
            if operator_matches(row, column, Operator::Eq, &value) {
                if let Some(object) = row.as_object_mut() {
                    for (key, val) in &patch {
                        object.insert(key.clone(), val.clone());
                    }
                    updated += 1;
                }
            }
        }
        Ok(updated)
    }

    async fn delete(&self, resource: &str, column: &str, value: Value) -> Result<u64, StorageError> {
        let mut tables = self.inner.write();
        let Some(rows) = tables.get_mut(resource) else {
            return Ok(0);
        };
        let before = rows.len();
        rows.retain(|row| !operator_matches(row, column, Operator::Eq, &value));
        Ok((before - rows.len()) as u64)
    }
}
