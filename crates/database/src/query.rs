use serde_json::Value;

use crate::error::StorageError;

/// Comparison operator usable inside negations and OR-groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Eq,
    Gt,
    Gte,
    Lt,
    Lte,
    ILike,
}

impl Operator {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::Gt => ">",
            Operator::Gte => ">=",
            Operator::Lt => "<",
            Operator::Lte => "<=",
            Operator::ILike => "ILIKE",
        }
    }
}

/// Specifies the direction for ordering query results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderDirection {
    Asc,
    Desc,
}

impl OrderDirection {
    pub fn as_sql(&self) -> &'static str {
        match self {
            OrderDirection::Asc => "ASC",
            OrderDirection::Desc => "DESC",
        }
    }
}

/// One alternative inside an OR-group.
#[derive(Debug, Clone)]
pub struct OrTerm {
    pub column: String,
    pub op: Operator,
    pub value: Value,
}

impl OrTerm {
    pub fn new(column: &str, op: Operator, value: Value) -> Self {
        Self { column: column.to_string(), op, value }
    }
}

/// A single predicate of a query. All conditions of a [`TableQuery`] are
/// AND-ed; [`Condition::Or`] contributes its alternatives as one AND-ed
/// group. `Eq` against a `Null` value means "column is null".
#[derive(Debug, Clone)]
pub enum Condition {
    Eq { column: String, value: Value },
    In { column: String, values: Vec<Value> },
    ILike { column: String, pattern: String },
    Gte { column: String, value: Value },
    Lte { column: String, value: Value },
    Not { column: String, op: Operator, value: Value },
    Or(Vec<OrTerm>),
}

/// Ternary status filter. `All` bypasses the predicate entirely; the other
/// two compare a boolean confirmation column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Active,
    Inactive,
}

/// Filtered, ordered, range-bounded description of one read against a named
/// resource. Built through chained methods and interpreted by a
/// [`TableClient`](crate::TableClient) implementation; rows stay opaque JSON
/// objects at this level.
#[derive(Debug, Clone, Default)]
pub struct TableQuery {
    /// Column projection; `None` selects all columns.
    pub projection: Option<Vec<String>>,
    /// Conditions in application order, all AND-ed.
    pub conditions: Vec<Condition>,
    /// Sort keys in priority order; the first entry is the primary key of
    /// the sort.
    pub order_by: Vec<(String, OrderDirection)>,
    /// Inclusive, zero-indexed row range.
    pub range: Option<(i64, i64)>,
}

impl TableQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn select(mut self, columns: &[&str]) -> Self {
        self.projection = Some(columns.iter().map(|c| c.to_string()).collect());
        self
    }

    pub fn eq(mut self, column: &str, value: Value) -> Self {
        self.conditions.push(Condition::Eq { column: column.to_string(), value });
        self
    }

    pub fn in_any(mut self, column: &str, values: Vec<Value>) -> Self {
        self.conditions.push(Condition::In { column: column.to_string(), values });
        self
    }

    pub fn ilike(mut self, column: &str, pattern: &str) -> Self {
        self.conditions.push(Condition::ILike {
            column: column.to_string(),
            pattern: pattern.to_string(),
        });
        self
    }

    pub fn gte(mut self, column: &str, value: Value) -> Self {
        self.conditions.push(Condition::Gte { column: column.to_string(), value });
        self
    }

    pub fn lte(mut self, column: &str, value: Value) -> Self {
        self.conditions.push(Condition::Lte { column: column.to_string(), value });
        self
    }

    pub fn not(mut self, column: &str, op: Operator, value: Value) -> Self {
        self.conditions.push(Condition::Not { column: column.to_string(), op, value });
        self
    }

    pub fn or_group(mut self, terms: Vec<OrTerm>) -> Self {
        self.conditions.push(Condition::Or(terms));
        self
    }

    pub fn order_by(mut self, column: &str, direction: OrderDirection) -> Self {
        self.order_by.push((column.to_string(), direction));
        self
    }

    /// Inclusive, zero-indexed row range `[from, to]`.
    pub fn range(mut self, from: i64, to: i64) -> Self {
        self.range = Some((from, to));
        self
    }

    /// LIMIT/OFFSET equivalent of the inclusive range.
    pub fn limit_offset(&self) -> Option<(i64, i64)> {
        self.range.map(|(from, to)| ((to - from + 1).max(0), from.max(0)))
    }
}

/// Identifiers are restricted to `[A-Za-z_][A-Za-z0-9_]*` so they can be
/// spliced into quoted SQL without escaping concerns.
pub(crate) fn check_ident(name: &str) -> Result<&str, StorageError> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    };
    if valid {
        Ok(name)
    } else {
        Err(StorageError::QueryConstruction(format!("invalid identifier: {name:?}")))
    }
}
