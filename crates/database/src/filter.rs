use serde_json::Value;

use crate::query::{Operator, OrTerm, OrderDirection, StatusFilter, TableQuery};

/// Declarative description of one filtered listing, translated into a
/// [`TableQuery`] by the paginator. All parts are optional; an absent part
/// imposes no constraint. Everything is AND-ed except the `or` group, which
/// joins the query as a single AND-ed OR-group.
#[derive(Debug, Clone, Default)]
pub struct ListFilter {
    query: Vec<(String, Value)>,
    inquery: Vec<(String, Value)>,
    eq: Option<(String, Value)>,
    ilike: Vec<(String, String)>,
    gte: Vec<(String, Value)>,
    lte: Vec<(String, Value)>,
    ids: Option<Vec<Value>>,
    in_set: Option<(String, Vec<Value>)>,
    not: Option<(String, Operator, Value)>,
    or: Vec<OrTerm>,
    active: Option<(String, StatusFilter)>,
    order: Vec<(String, bool)>,
    select: Option<Vec<String>>,
}

impl ListFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Exact match on `column`, one entry of the AND-ed equality map.
    pub fn query(mut self, column: &str, value: Value) -> Self {
        self.query.push((column.to_string(), value));
        self
    }

    /// IN-filter whose value set arrives as a raw JSON value. Listing
    /// screens forward these straight from request parameters, so anything
    /// that is not an array is logged and skipped at build time instead of
    /// failing the whole call.
    pub fn in_query(mut self, column: &str, values: Value) -> Self {
        self.inquery.push((column.to_string(), values));
        self
    }

    /// Single column/value exact filter.
    pub fn eq(mut self, column: &str, value: Value) -> Self {
        self.eq = Some((column.to_string(), value));
        self
    }

    /// Case-insensitive substring match.
    pub fn ilike(mut self, column: &str, pattern: &str) -> Self {
        self.ilike.push((column.to_string(), pattern.to_string()));
        self
    }

    /// Inclusive lower bound.
    pub fn gte(mut self, column: &str, value: Value) -> Self {
        self.gte.push((column.to_string(), value));
        self
    }

    /// Inclusive upper bound.
    pub fn lte(mut self, column: &str, value: Value) -> Self {
        self.lte.push((column.to_string(), value));
        self
    }

    /// Restricts to the given set of primary-key values.
    pub fn ids(mut self, ids: Vec<Value>) -> Self {
        self.ids = Some(ids);
        self
    }

    /// Generalized IN filter on an arbitrary column.
    pub fn in_set(mut self, column: &str, values: Vec<Value>) -> Self {
        self.in_set = Some((column.to_string(), values));
        self
    }

    /// Negated condition.
    pub fn not(mut self, column: &str, op: Operator, value: Value) -> Self {
        self.not = Some((column.to_string(), op, value));
        self
    }

    /// OR-group of alternatives, AND-ed with everything else as one unit.
    pub fn or(mut self, terms: Vec<OrTerm>) -> Self {
        self.or = terms;
        self
    }

    /// Ternary status filter against a boolean confirmation column.
    /// [`StatusFilter::All`] bypasses the predicate.
    pub fn active(mut self, column: &str, status: StatusFilter) -> Self {
        self.active = Some((column.to_string(), status));
        self
    }

    /// Adds a sort key; entries are applied in call order, first entry is
    /// the primary sort key.
    pub fn order_by(mut self, column: &str, ascending: bool) -> Self {
        self.order.push((column.to_string(), ascending));
        self
    }

    /// Column projection; default is all columns.
    pub fn select(mut self, columns: &[&str]) -> Self {
        self.select = Some(columns.iter().map(|c| c.to_string()).collect());
        self
    }

    /// Translates the descriptor into a query, applying the parts in the
    /// fixed order the listing screens rely on: equality map, sort keys,
    /// IN-map, status flag, bounds, substring, single eq, id set,
    /// generalized IN, negation, OR-group.
    pub(crate) fn build_query(&self, range: Option<(i64, i64)>) -> TableQuery {
        let mut query = TableQuery::new();
        query.projection = self.select.clone();
        if let Some((from, to)) = range {
            query = query.range(from, to);
        }
        for (column, value) in &self.query {
            query = query.eq(column, value.clone());
        }
        for (column, ascending) in &self.order {
            let direction = if *ascending { OrderDirection::Asc } else { OrderDirection::Desc };
            query = query.order_by(column, direction);
        }
        for (column, raw) in &self.inquery {
            match raw.as_array() {
                Some(values) => query = query.in_any(column, values.clone()),
                None => tracing::error!(
                    "[ListFilter::build_query] IN filter on \"{}\" expects an array, got {}; skipping",
                    column,
                    raw
                ),
            }
        }
        if let Some((column, status)) = &self.active {
            match status {
                StatusFilter::All => {}
                StatusFilter::Active => query = query.eq(column, Value::Bool(true)),
                StatusFilter::Inactive => query = query.eq(column, Value::Bool(false)),
            }
        }
        for (column, value) in &self.gte {
            query = query.gte(column, value.clone());
        }
        for (column, value) in &self.lte {
            query = query.lte(column, value.clone());
        }
        for (column, pattern) in &self.ilike {
            query = query.ilike(column, pattern);
        }
        if let Some((column, value)) = &self.eq {
            query = query.eq(column, value.clone());
        }
        if let Some(ids) = &self.ids {
            query = query.in_any("id", ids.clone());
        }
        if let Some((column, values)) = &self.in_set {
            query = query.in_any(column, values.clone());
        }
        if let Some((column, op, value)) = &self.not {
            query = query.not(column, *op, value.clone());
        }
        if !self.or.is_empty() {
            query = query.or_group(self.or.clone());
        }
        query
    }

    /// Count query: the full predicate set with no range, ordering, or
    /// projection, so totals always agree with the data query.
    pub(crate) fn build_count_query(&self) -> TableQuery {
        let mut query = self.build_query(None);
        query.order_by.clear();
        query.projection = None;
        query
    }
}
