//! Row repository: hard deletes and a two-tier read cache.

use std::marker::PhantomData;
use std::sync::Arc;

use bon::bon;
use serde_json::Value;

use depot_cache::{FastCache, KeyValueCache};
use depot_store::RowStore;
use depot_types::Row;

use crate::error::{RepositoryError, RepositoryResult};

/// Repository over one relational table.
///
/// Reads by primary key go through two cache tiers: the fast in-process tier
/// first, then the key-value tier, then the store, populating the tiers on
/// the way back. Writes invalidate both tiers for the affected key before
/// touching the store, so a concurrent reader never keeps an entry that is
/// stale relative to the write. Reads by any other column bypass the cache,
/// since writes only invalidate the key entry. Deletes here are hard deletes.
pub struct RowRepository<M: Row> {
    store: Arc<dyn RowStore>,
    fast_cache: Arc<FastCache>,
    key_value_cache: Arc<dyn KeyValueCache>,
    table: String,
    key_column: String,
    _marker: PhantomData<fn() -> M>,
}

#[bon]
impl<M: Row> RowRepository<M> {
    #[builder]
    pub fn new(
        store: Arc<dyn RowStore>,
        fast_cache: Arc<FastCache>,
        key_value_cache: Arc<dyn KeyValueCache>,
        table: String,
        key_column: String,
    ) -> Self {
        Self {
            store,
            fast_cache,
            key_value_cache,
            table,
            key_column,
            _marker: PhantomData,
        }
    }
}

impl<M: Row> RowRepository<M> {
    /// Cache key of the form `{table}_{column}_{value}`.
    fn cache_key(&self, column: &str, value: &Value) -> String {
        let rendered = match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        format!("{}_{}_{}", self.table, column, rendered)
    }

    fn decode(&self, row: Value) -> RepositoryResult<M> {
        serde_json::from_value(row).map_err(RepositoryError::serialization)
    }

    fn encode_key(&self, key: &M::Key) -> RepositoryResult<Value> {
        serde_json::to_value(key).map_err(RepositoryError::serialization)
    }

    /// Fetch the row with the given primary key, through both cache tiers.
    pub async fn get(&self, key: &M::Key) -> RepositoryResult<Option<M>> {
        let value = self.encode_key(key)?;
        let column = self.key_column.clone();
        self.get_by_column(&column, &value).await
    }

    /// Fetch the first row whose column equals the value.
    ///
    /// Only the primary-key column is served from the cache tiers; writes
    /// invalidate exactly the key entry, so any other column reads through
    /// to the store.
    pub async fn get_by_column(&self, column: &str, value: &Value) -> RepositoryResult<Option<M>> {
        if column != self.key_column {
            return match self.store.get_by_column(&self.table, column, value).await? {
                Some(row) => Ok(Some(self.decode(row)?)),
                None => Ok(None),
            };
        }

        let cache_key = self.cache_key(column, value);

        if let Some(cached) = self.fast_cache.get(&cache_key) {
            return Ok(Some(self.decode(cached)?));
        }

        if let Some(serialized) = self.key_value_cache.get(&cache_key) {
            let row: Value =
                serde_json::from_str(&serialized).map_err(RepositoryError::serialization)?;
            self.fast_cache.put(cache_key, row.clone());
            return Ok(Some(self.decode(row)?));
        }

        match self.store.get_by_column(&self.table, column, value).await? {
            Some(row) => {
                self.key_value_cache.set(cache_key.clone(), row.to_string());
                self.fast_cache.put(cache_key, row.clone());
                Ok(Some(self.decode(row)?))
            }
            None => Ok(None),
        }
    }

    /// All rows of the table, ordered by primary key. Uncached.
    pub async fn get_all(&self) -> RepositoryResult<Vec<M>> {
        let rows = self.store.list(&self.table, &self.key_column).await?;
        rows.into_iter().map(|row| self.decode(row)).collect()
    }

    /// All rows whose column equals the value. Uncached.
    pub async fn list_by_column(&self, column: &str, value: &Value) -> RepositoryResult<Vec<M>> {
        let rows = self.store.list_by_column(&self.table, column, value).await?;
        rows.into_iter().map(|row| self.decode(row)).collect()
    }

    /// Insert or replace the row. Returns true when a row was written.
    ///
    /// Both cache tiers are refreshed before the store write: the fast tier
    /// by invalidation, the key-value tier by overwriting with the new
    /// serialized row.
    pub async fn save(&self, entity: &M) -> RepositoryResult<bool> {
        let row = serde_json::to_value(entity).map_err(RepositoryError::serialization)?;
        let key = self.encode_key(&entity.key())?;
        let cache_key = self.cache_key(&self.key_column, &key);

        self.fast_cache.invalidate(&cache_key);
        self.key_value_cache.set(cache_key, row.to_string());

        Ok(self.store.upsert(&self.table, &self.key_column, row).await?)
    }

    /// Hard-delete the row. Returns true when a row existed.
    pub async fn delete(&self, entity: &M) -> RepositoryResult<bool> {
        self.delete_by_key(&entity.key()).await
    }

    /// Hard-delete the row with the given primary key.
    pub async fn delete_by_key(&self, key: &M::Key) -> RepositoryResult<bool> {
        let value = self.encode_key(key)?;
        let cache_key = self.cache_key(&self.key_column, &value);

        self.fast_cache.invalidate(&cache_key);
        self.key_value_cache.remove(&cache_key);

        Ok(self
            .store
            .delete_by_key(&self.table, &self.key_column, &value)
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use depot_cache::MemoryKeyValueCache;
    use depot_store::MemoryRowBackend;
    use serde::{Deserialize, Serialize};
    use serde_json::json;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Part {
        id: i64,
        name: String,
    }

    impl Row for Part {
        type Key = i64;

        fn key(&self) -> i64 {
            self.id
        }
    }

    fn part(id: i64, name: &str) -> Part {
        Part {
            id,
            name: name.to_string(),
        }
    }

    fn repository() -> (
        RowRepository<Part>,
        Arc<MemoryRowBackend>,
        Arc<FastCache>,
        Arc<MemoryKeyValueCache>,
    ) {
        let store = Arc::new(MemoryRowBackend::new());
        let fast = Arc::new(FastCache::default());
        let kv = Arc::new(MemoryKeyValueCache::new());

        let repo = RowRepository::builder()
            .store(store.clone() as Arc<dyn RowStore>)
            .fast_cache(fast.clone())
            .key_value_cache(kv.clone() as Arc<dyn KeyValueCache>)
            .table("parts".to_string())
            .key_column("id".to_string())
            .build();

        (repo, store, fast, kv)
    }

    #[tokio::test]
    async fn test_save_then_get_round_trips() {
        let (repo, _, _, _) = repository();

        let p = part(1, "bolt");
        assert!(repo.save(&p).await.unwrap());

        assert_eq!(repo.get(&1).await.unwrap(), Some(p));
        assert_eq!(repo.get(&9).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_read_populates_both_cache_tiers() {
        let (repo, store, fast, kv) = repository();

        store
            .upsert("parts", "id", json!({"id": 1, "name": "bolt"}))
            .await
            .unwrap();

        repo.get(&1).await.unwrap();

        assert!(fast.get("parts_id_1").is_some());
        assert!(kv.get("parts_id_1").is_some());
    }

    #[tokio::test]
    async fn test_get_prefers_fast_tier() {
        let (repo, _, fast, _) = repository();

        // Only the fast tier knows this row; the store is empty.
        fast.put("parts_id_1".to_string(), json!({"id": 1, "name": "bolt"}));

        assert_eq!(repo.get(&1).await.unwrap(), Some(part(1, "bolt")));
    }

    #[tokio::test]
    async fn test_key_value_hit_backfills_fast_tier() {
        let (repo, _, fast, kv) = repository();

        kv.set(
            "parts_id_1".to_string(),
            "{\"id\":1,\"name\":\"bolt\"}".to_string(),
        );

        assert_eq!(repo.get(&1).await.unwrap(), Some(part(1, "bolt")));
        assert!(fast.get("parts_id_1").is_some());
    }

    #[tokio::test]
    async fn test_save_supersedes_stale_cache_entries() {
        let (repo, _, _, _) = repository();

        repo.save(&part(1, "bolt")).await.unwrap();
        repo.get(&1).await.unwrap();

        repo.save(&part(1, "nut")).await.unwrap();

        assert_eq!(repo.get(&1).await.unwrap(), Some(part(1, "nut")));
    }

    #[tokio::test]
    async fn test_delete_invalidates_both_tiers() {
        let (repo, _, fast, kv) = repository();

        repo.save(&part(1, "bolt")).await.unwrap();
        repo.get(&1).await.unwrap();

        assert!(repo.delete_by_key(&1).await.unwrap());

        assert!(fast.get("parts_id_1").is_none());
        assert!(kv.get("parts_id_1").is_none());
        assert_eq!(repo.get(&1).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_deleted_row_not_served_from_column_read() {
        let (repo, _, fast, kv) = repository();

        repo.save(&part(1, "bolt")).await.unwrap();
        assert!(repo
            .get_by_column("name", &json!("bolt"))
            .await
            .unwrap()
            .is_some());

        assert!(repo.delete_by_key(&1).await.unwrap());

        // A prior column read must not leave cache entries behind that
        // outlive the delete.
        assert_eq!(repo.get_by_column("name", &json!("bolt")).await.unwrap(), None);
        assert!(fast.get("parts_name_bolt").is_none());
        assert!(kv.get("parts_name_bolt").is_none());
    }

    #[tokio::test]
    async fn test_get_by_column_and_list_by_column() {
        let (repo, _, _, _) = repository();

        repo.save(&part(1, "bolt")).await.unwrap();
        repo.save(&part(2, "bolt")).await.unwrap();
        repo.save(&part(3, "nut")).await.unwrap();

        let first = repo
            .get_by_column("name", &json!("nut"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(first.id, 3);

        let bolts = repo.list_by_column("name", &json!("bolt")).await.unwrap();
        assert_eq!(bolts.len(), 2);

        let all = repo.get_all().await.unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].id, 1);
    }
}
