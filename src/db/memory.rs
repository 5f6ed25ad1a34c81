//! In-process store with the same filter semantics as the REST client.
//!
//! Generates `id` (UUID v4) and `created_at` for inserted rows that lack
//! them, the way the hosted tables' column defaults do.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{Map, Value};

use super::{param_value, DataStore, DatabaseError, Direction, Filter, Query};

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<HashMap<String, Vec<Map<String, Value>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert rows without going through the async trait (test setup).
    pub fn seed(&self, table: &str, rows: Vec<Value>) {
        let mut tables = self.tables.lock().unwrap_or_else(|e| e.into_inner());
        let entries = tables.entry(table.to_string()).or_default();
        for row in rows {
            if let Value::Object(map) = row {
                entries.push(with_defaults(map));
            }
        }
    }

    /// Snapshot of a table's rows in insertion order.
    pub fn rows(&self, table: &str) -> Vec<Value> {
        let tables = self.tables.lock().unwrap_or_else(|e| e.into_inner());
        tables
            .get(table)
            .map(|rows| rows.iter().cloned().map(Value::Object).collect())
            .unwrap_or_default()
    }

    fn lock(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, HashMap<String, Vec<Map<String, Value>>>>, DatabaseError>
    {
        self.tables
            .lock()
            .map_err(|_| DatabaseError::Connection("memory store lock poisoned".into()))
    }
}

fn with_defaults(mut row: Map<String, Value>) -> Map<String, Value> {
    row.entry("id")
        .or_insert_with(|| Value::String(uuid::Uuid::new_v4().to_string()));
    row.entry("created_at")
        .or_insert_with(|| Value::String(chrono::Utc::now().to_rfc3339()));
    row
}

fn into_object(row: Value) -> Result<Map<String, Value>, DatabaseError> {
    match row {
        Value::Object(map) => Ok(map),
        other => Err(DatabaseError::Decode(format!("expected object row, got {other}"))),
    }
}

fn matches(row: &Map<String, Value>, filters: &[Filter]) -> bool {
    let cell = |col: &str| row.get(col).cloned().unwrap_or(Value::Null);
    filters.iter().all(|filter| match filter {
        Filter::Eq(col, Value::Null) => cell(col).is_null(),
        Filter::Eq(col, value) => {
            let actual = cell(col);
            !actual.is_null() && param_value(&actual) == param_value(value)
        }
        Filter::ILike(col, needle) => match cell(col) {
            Value::String(s) => s.to_lowercase().contains(&needle.to_lowercase()),
            _ => false,
        },
        Filter::In(col, values) => {
            let actual = param_value(&cell(col));
            values.iter().any(|v| param_value(v) == actual)
        }
    })
}

/// Nulls sort last in both directions.
fn compare(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => param_value(a).cmp(&param_value(b)),
    }
}

fn sort_rows(rows: &mut [Map<String, Value>], order: &[(String, Direction)]) {
    rows.sort_by(|a, b| {
        for (col, dir) in order {
            let (x, y) = (
                a.get(col).unwrap_or(&Value::Null),
                b.get(col).unwrap_or(&Value::Null),
            );
            let ord = match (x.is_null(), y.is_null()) {
                (true, true) => Ordering::Equal,
                (true, false) => Ordering::Greater,
                (false, true) => Ordering::Less,
                _ => match dir {
                    Direction::Asc => compare(x, y),
                    Direction::Desc => compare(y, x),
                },
            };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    });
}

#[async_trait]
impl DataStore for MemoryStore {
    async fn select(&self, table: &str, query: &Query) -> Result<Vec<Value>, DatabaseError> {
        let tables = self.lock()?;
        let mut rows: Vec<Map<String, Value>> = tables
            .get(table)
            .map(|rows| {
                rows.iter()
                    .filter(|row| matches(row, query.filters()))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        drop(tables);

        sort_rows(&mut rows, query.ordering());

        let (offset, limit) = query.range();
        Ok(rows
            .into_iter()
            .skip(offset.unwrap_or(0))
            .take(limit.unwrap_or(usize::MAX))
            .map(Value::Object)
            .collect())
    }

    async fn insert(&self, table: &str, rows: Vec<Value>) -> Result<Vec<Value>, DatabaseError> {
        let rows = rows
            .into_iter()
            .map(|row| into_object(row).map(with_defaults))
            .collect::<Result<Vec<_>, _>>()?;

        let mut tables = self.lock()?;
        tables
            .entry(table.to_string())
            .or_default()
            .extend(rows.iter().cloned());
        Ok(rows.into_iter().map(Value::Object).collect())
    }

    async fn update(
        &self,
        table: &str,
        query: &Query,
        patch: Value,
    ) -> Result<Vec<Value>, DatabaseError> {
        let patch = into_object(patch)?;
        let mut tables = self.lock()?;
        let mut updated = Vec::new();
        if let Some(rows) = tables.get_mut(table) {
            for row in rows.iter_mut().filter(|row| matches(row, query.filters())) {
                for (key, value) in &patch {
                    row.insert(key.clone(), value.clone());
                }
                updated.push(Value::Object(row.clone()));
            }
        }
        Ok(updated)
    }

    async fn upsert(
        &self,
        table: &str,
        rows: Vec<Value>,
        on_conflict: &str,
    ) -> Result<Vec<Value>, DatabaseError> {
        let rows = rows
            .into_iter()
            .map(into_object)
            .collect::<Result<Vec<_>, _>>()?;

        let mut tables = self.lock()?;
        let entries = tables.entry(table.to_string()).or_default();
        let mut stored = Vec::with_capacity(rows.len());
        for row in rows {
            let key = row.get(on_conflict).map(param_value);
            let position = key.as_ref().and_then(|key| {
                entries
                    .iter()
                    .position(|e| e.get(on_conflict).map(param_value).as_ref() == Some(key))
            });
            match position {
                Some(index) => {
                    let entry = &mut entries[index];
                    for (k, v) in row {
                        entry.insert(k, v);
                    }
                    stored.push(Value::Object(entry.clone()));
                }
                None => {
                    let row = with_defaults(row);
                    entries.push(row.clone());
                    stored.push(Value::Object(row));
                }
            }
        }
        Ok(stored)
    }

    async fn delete(&self, table: &str, query: &Query) -> Result<(), DatabaseError> {
        let mut tables = self.lock()?;
        if let Some(rows) = tables.get_mut(table) {
            rows.retain(|row| !matches(row, query.filters()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn centers() -> MemoryStore {
        let store = MemoryStore::new();
        store.seed(
            "health_centers",
            vec![
                json!({"name": "Zen Clinic", "pincode": "560001", "approved": true}),
                json!({"name": "Apollo", "pincode": "560001", "approved": false}),
                json!({"name": "Care Point", "pincode": "110001", "approved": true}),
            ],
        );
        store
    }

    #[tokio::test]
    async fn select_filters_and_orders() {
        let store = centers();
        let rows = store
            .select(
                "health_centers",
                &Query::new().eq("approved", true).order("name", Direction::Asc),
            )
            .await
            .unwrap();

        let names: Vec<_> = rows.iter().map(|r| r["name"].as_str().unwrap()).collect();
        assert_eq!(names, vec!["Care Point", "Zen Clinic"]);
    }

    #[tokio::test]
    async fn select_applies_offset_and_limit() {
        let store = centers();
        let rows = store
            .select(
                "health_centers",
                &Query::new().order("name", Direction::Asc).offset(1).limit(1),
            )
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["name"], "Care Point");
    }

    #[tokio::test]
    async fn ilike_is_case_insensitive_substring() {
        let store = centers();
        let rows = store
            .select("health_centers", &Query::new().ilike("name", "CLIN"))
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["name"], "Zen Clinic");
    }

    #[tokio::test]
    async fn insert_generates_id_and_timestamp() {
        let store = MemoryStore::new();
        let rows = store
            .insert("doctors", vec![json!({"name": "Dr. Rao"})])
            .await
            .unwrap();
        assert!(rows[0]["id"].is_string());
        assert!(rows[0]["created_at"].is_string());
        assert_eq!(store.rows("doctors").len(), 1);
    }

    #[tokio::test]
    async fn update_merges_patch_into_matching_rows() {
        let store = centers();
        let updated = store
            .update(
                "health_centers",
                &Query::new().eq("pincode", "560001"),
                json!({"approved": true}),
            )
            .await
            .unwrap();
        assert_eq!(updated.len(), 2);
        assert!(store
            .rows("health_centers")
            .iter()
            .all(|r| r["approved"] == true));
    }

    #[tokio::test]
    async fn upsert_merges_on_conflict_column() {
        let store = MemoryStore::new();
        store
            .upsert("doctors", vec![json!({"id": "d1", "name": "A", "approved": true})], "id")
            .await
            .unwrap();
        store
            .upsert("doctors", vec![json!({"id": "d1", "name": "B"})], "id")
            .await
            .unwrap();

        let rows = store.rows("doctors");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["name"], "B");
        assert_eq!(rows[0]["approved"], true);
    }

    #[tokio::test]
    async fn delete_removes_matching_rows() {
        let store = centers();
        store
            .delete("health_centers", &Query::new().eq("pincode", "110001"))
            .await
            .unwrap();
        assert_eq!(store.rows("health_centers").len(), 2);
    }

    #[tokio::test]
    async fn non_object_rows_are_rejected() {
        let store = MemoryStore::new();
        let err = store.insert("doctors", vec![json!(42)]).await.unwrap_err();
        assert!(matches!(err, DatabaseError::Decode(_)));
    }
}
