//! Access to the hosted relational store.
//!
//! `DataStore` is the seam every handler talks to. `RestStore` speaks the
//! store's REST dialect over HTTP; `MemoryStore` keeps tables in process
//! and backs the test suite. Typed access lives in `repository`.

#[cfg(test)]
pub mod memory;
pub mod repository;
pub mod rest;

#[cfg(test)]
pub use memory::MemoryStore;
pub use rest::{Privilege, RestStore};

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Store unreachable: {0}")]
    Connection(String),

    #[error("Store rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Malformed store response: {0}")]
    Decode(String),

    #[error("Entity not found: {entity_type} with id {id}")]
    NotFound { entity_type: String, id: String },

    #[error("Invalid enum value for {field}: {value}")]
    InvalidEnum { field: String, value: String },
}

/// Table-level operations against the store. Rows are JSON objects.
#[async_trait]
pub trait DataStore: Send + Sync {
    async fn select(&self, table: &str, query: &Query) -> Result<Vec<Value>, DatabaseError>;

    /// Insert rows and return them as stored (with generated columns).
    async fn insert(&self, table: &str, rows: Vec<Value>) -> Result<Vec<Value>, DatabaseError>;

    /// Merge `patch` into every row matching `query`; returns updated rows.
    async fn update(
        &self,
        table: &str,
        query: &Query,
        patch: Value,
    ) -> Result<Vec<Value>, DatabaseError>;

    /// Insert rows, merging into existing rows that share `on_conflict`.
    async fn upsert(
        &self,
        table: &str,
        rows: Vec<Value>,
        on_conflict: &str,
    ) -> Result<Vec<Value>, DatabaseError>;

    async fn delete(&self, table: &str, query: &Query) -> Result<(), DatabaseError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Eq(String, Value),
    /// Case-insensitive substring match.
    ILike(String, String),
    In(String, Vec<Value>),
}

/// Filter/order/range description for a table read or write.
#[derive(Debug, Clone, Default)]
pub struct Query {
    filters: Vec<Filter>,
    order: Vec<(String, Direction)>,
    limit: Option<usize>,
    offset: Option<usize>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.filters.push(Filter::Eq(column.to_string(), value.into()));
        self
    }

    pub fn ilike(mut self, column: &str, needle: &str) -> Self {
        self.filters
            .push(Filter::ILike(column.to_string(), needle.to_string()));
        self
    }

    pub fn is_in(mut self, column: &str, values: Vec<Value>) -> Self {
        self.filters.push(Filter::In(column.to_string(), values));
        self
    }

    pub fn order(mut self, column: &str, direction: Direction) -> Self {
        self.order.push((column.to_string(), direction));
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    pub fn ordering(&self) -> &[(String, Direction)] {
        &self.order
    }

    pub fn range(&self) -> (Option<usize>, Option<usize>) {
        (self.offset, self.limit)
    }

    /// Encode as REST query-string pairs (`col=eq.value`, `order=col.desc`, ...).
    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut params = Vec::with_capacity(self.filters.len() + 3);
        for filter in &self.filters {
            match filter {
                Filter::Eq(col, Value::Null) => params.push((col.clone(), "is.null".into())),
                Filter::Eq(col, value) => {
                    params.push((col.clone(), format!("eq.{}", param_value(value))))
                }
                Filter::ILike(col, needle) => {
                    params.push((col.clone(), format!("ilike.*{needle}*")))
                }
                Filter::In(col, values) => {
                    let joined = values.iter().map(param_value).collect::<Vec<_>>().join(",");
                    params.push((col.clone(), format!("in.({joined})")));
                }
            }
        }
        if !self.order.is_empty() {
            let order = self
                .order
                .iter()
                .map(|(col, dir)| format!("{col}.{}", dir.as_str()))
                .collect::<Vec<_>>()
                .join(",");
            params.push(("order".into(), order));
        }
        if let Some(limit) = self.limit {
            params.push(("limit".into(), limit.to_string()));
        }
        if let Some(offset) = self.offset {
            params.push(("offset".into(), offset.to_string()));
        }
        params
    }
}

/// Render a JSON scalar the way it appears in a filter expression.
pub(crate) fn param_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "null".into(),
        other => other.to_string(),
    }
}
