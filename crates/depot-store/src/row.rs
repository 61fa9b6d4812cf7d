//! Relational store driver boundary and in-memory backend.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use depot_types::{predicate, StoreResult};
use parking_lot::RwLock;
use serde_json::Value;

/// The abstract relational store interface.
///
/// Rows travel as JSON objects keyed by column name; tables are addressed by
/// name and identified rows by an explicit key column. Deletes here are hard
/// deletes, unlike the document path.
#[async_trait]
pub trait RowStore: Send + Sync {
    /// Fetch the first row whose column equals the value.
    async fn get_by_column(
        &self,
        table: &str,
        column: &str,
        value: &Value,
    ) -> StoreResult<Option<Value>>;

    /// All rows of a table, ordered by the key column.
    async fn list(&self, table: &str, key_column: &str) -> StoreResult<Vec<Value>>;

    /// All rows whose column equals the value.
    async fn list_by_column(
        &self,
        table: &str,
        column: &str,
        value: &Value,
    ) -> StoreResult<Vec<Value>>;

    /// Insert the row, or replace an existing row with the same key value.
    /// Returns true when a row was written.
    async fn upsert(&self, table: &str, key_column: &str, row: Value) -> StoreResult<bool>;

    /// Physically delete the row with the given key value. Returns true when
    /// a row existed.
    async fn delete_by_key(
        &self,
        table: &str,
        key_column: &str,
        value: &Value,
    ) -> StoreResult<bool>;
}

/// In-memory relational store.
#[derive(Clone)]
pub struct MemoryRowBackend {
    data: Arc<RwLock<HashMap<String, Vec<Value>>>>,
}

impl MemoryRowBackend {
    pub fn new() -> Self {
        Self {
            data: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl Default for MemoryRowBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn column_of(row: &Value, column: &str) -> Value {
    row.get(column).cloned().unwrap_or(Value::Null)
}

#[async_trait]
impl RowStore for MemoryRowBackend {
    async fn get_by_column(
        &self,
        table: &str,
        column: &str,
        value: &Value,
    ) -> StoreResult<Option<Value>> {
        let tables = self.data.read();
        Ok(tables
            .get(table)
            .and_then(|rows| rows.iter().find(|row| column_of(row, column) == *value))
            .cloned())
    }

    async fn list(&self, table: &str, key_column: &str) -> StoreResult<Vec<Value>> {
        let tables = self.data.read();
        let mut rows = tables.get(table).cloned().unwrap_or_default();
        drop(tables);

        rows.sort_by(|a, b| {
            predicate::compare(&column_of(a, key_column), &column_of(b, key_column))
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        Ok(rows)
    }

    async fn list_by_column(
        &self,
        table: &str,
        column: &str,
        value: &Value,
    ) -> StoreResult<Vec<Value>> {
        let tables = self.data.read();
        Ok(tables
            .get(table)
            .map(|rows| {
                rows.iter()
                    .filter(|row| column_of(row, column) == *value)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn upsert(&self, table: &str, key_column: &str, row: Value) -> StoreResult<bool> {
        let key = column_of(&row, key_column);
        let mut tables = self.data.write();
        let rows = tables.entry(table.to_string()).or_default();

        if let Some(slot) = rows.iter_mut().find(|r| column_of(r, key_column) == key) {
            *slot = row;
        } else {
            rows.push(row);
        }
        Ok(true)
    }

    async fn delete_by_key(
        &self,
        table: &str,
        key_column: &str,
        value: &Value,
    ) -> StoreResult<bool> {
        let mut tables = self.data.write();
        if let Some(rows) = tables.get_mut(table) {
            let before = rows.len();
            rows.retain(|row| column_of(row, key_column) != *value);
            return Ok(rows.len() < before);
        }
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_upsert_inserts_then_replaces() {
        let store = MemoryRowBackend::new();

        store
            .upsert("widgets", "id", json!({"id": 1, "name": "bolt"}))
            .await
            .unwrap();
        store
            .upsert("widgets", "id", json!({"id": 1, "name": "nut"}))
            .await
            .unwrap();

        let row = store
            .get_by_column("widgets", "id", &json!(1))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(row["name"], "nut");

        let all = store.list("widgets", "id").await.unwrap();
        assert_eq!(all.len(), 1);
    }

    #[tokio::test]
    async fn test_get_by_column_misses_cleanly() {
        let store = MemoryRowBackend::new();

        let row = store.get_by_column("widgets", "id", &json!(9)).await.unwrap();
        assert!(row.is_none());
    }

    #[tokio::test]
    async fn test_list_orders_by_key() {
        let store = MemoryRowBackend::new();
        for id in [3, 1, 2] {
            store
                .upsert("widgets", "id", json!({"id": id}))
                .await
                .unwrap();
        }

        let rows = store.list("widgets", "id").await.unwrap();
        let ids: Vec<i64> = rows.iter().map(|r| r["id"].as_i64().unwrap()).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_list_by_column_filters() {
        let store = MemoryRowBackend::new();
        store
            .upsert("widgets", "id", json!({"id": 1, "group": "a"}))
            .await
            .unwrap();
        store
            .upsert("widgets", "id", json!({"id": 2, "group": "b"}))
            .await
            .unwrap();

        let rows = store
            .list_by_column("widgets", "group", &json!("a"))
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["id"], 1);
    }

    #[tokio::test]
    async fn test_delete_by_key_reports_presence() {
        let store = MemoryRowBackend::new();
        store
            .upsert("widgets", "id", json!({"id": 1}))
            .await
            .unwrap();

        assert!(store.delete_by_key("widgets", "id", &json!(1)).await.unwrap());
        assert!(!store.delete_by_key("widgets", "id", &json!(1)).await.unwrap());
    }
}
