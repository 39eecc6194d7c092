//! In-memory document store for development and test environments.
//!
//! Mimics the subset of document-database behavior the services rely on.
//! Data lives in the process: a restart loses it and replicas do not share it.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::debug;

use super::{
    compare_values, matches_filter, timestamp, Document, DocumentStore, FindOptions, SortOrder, StoreError,
    CREATED_AT_FIELD, ID_FIELD, UPDATED_AT_FIELD,
};
use crate::config::DatabaseKind;

#[derive(Default)]
struct Collection {
    next_id: u64,
    // Insertion order doubles as the tie-breaker for sorting.
    documents: Vec<Document>,
}

impl Collection {
    fn position(&self, id: &str) -> Option<usize> {
        self.documents
            .iter()
            .position(|doc| doc.get(ID_FIELD).and_then(Value::as_str) == Some(id))
    }
}

#[derive(Default)]
pub struct InMemoryStore {
    collections: RwLock<HashMap<String, Collection>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        debug!("Initializing in-memory data store");
        Self::default()
    }
}

fn stamp_new(collection_name: &str, collection: &mut Collection, mut fields: Document) -> Document {
    collection.next_id += 1;
    let id = format!(
        "inmem_{collection_name}_{}_{}",
        collection.next_id,
        Utc::now().timestamp_millis()
    );
    let now = timestamp();

    fields.insert(ID_FIELD.to_string(), Value::String(id));
    fields.insert(CREATED_AT_FIELD.to_string(), Value::String(now.clone()));
    fields.insert(UPDATED_AT_FIELD.to_string(), Value::String(now));
    fields
}

fn merge(existing: &mut Document, fields: Document) {
    for (key, value) in fields {
        if key == ID_FIELD || key == CREATED_AT_FIELD {
            continue;
        }
        existing.insert(key, value);
    }
    existing.insert(UPDATED_AT_FIELD.to_string(), Value::String(timestamp()));
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    fn kind(&self) -> DatabaseKind {
        DatabaseKind::InMemory
    }

    async fn insert(&self, collection: &str, fields: Document) -> Result<Document, StoreError> {
        let mut collections = self.collections.write().await;
        let entry = collections.entry(collection.to_string()).or_default();
        let document = stamp_new(collection, entry, fields);
        entry.documents.push(document.clone());

        debug!("Created document in {collection}: {}", document[ID_FIELD]);
        Ok(document)
    }

    async fn find(
        &self,
        collection: &str,
        filter: &Document,
        options: &FindOptions,
    ) -> Result<Vec<Document>, StoreError> {
        let collections = self.collections.read().await;
        let Some(entry) = collections.get(collection) else {
            return Ok(Vec::new());
        };

        let mut results: Vec<Document> = entry
            .documents
            .iter()
            .filter(|doc| matches_filter(doc, filter))
            .cloned()
            .collect();

        if !options.sort.is_empty() {
            // `sort_by` is stable, so equal keys keep insertion order.
            results.sort_by(|a, b| {
                options
                    .sort
                    .iter()
                    .map(|(field, order)| {
                        let ordering = compare_values(a.get(field), b.get(field));
                        match order {
                            SortOrder::Ascending => ordering,
                            SortOrder::Descending => ordering.reverse(),
                        }
                    })
                    .find(|ordering| ordering.is_ne())
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
        }

        let skip = options.skip.unwrap_or(0) as usize;
        let limit = options.limit.map(|l| l as usize).unwrap_or(usize::MAX);
        Ok(results.into_iter().skip(skip).take(limit).collect())
    }

    async fn find_one(&self, collection: &str, filter: &Document) -> Result<Option<Document>, StoreError> {
        let options = FindOptions {
            limit: Some(1),
            ..FindOptions::default()
        };
        Ok(self.find(collection, filter, &options).await?.into_iter().next())
    }

    async fn find_by_id(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .and_then(|entry| entry.position(id).map(|i| entry.documents[i].clone())))
    }

    async fn update_by_id(
        &self,
        collection: &str,
        id: &str,
        fields: Document,
    ) -> Result<Option<Document>, StoreError> {
        let mut collections = self.collections.write().await;
        let Some(entry) = collections.get_mut(collection) else {
            return Ok(None);
        };
        let Some(index) = entry.position(id) else {
            return Ok(None);
        };

        let document = &mut entry.documents[index];
        merge(document, fields);
        debug!("Updated document in {collection}: {id}");
        Ok(Some(document.clone()))
    }

    async fn upsert_one(
        &self,
        collection: &str,
        filter: &Document,
        fields: Document,
    ) -> Result<Document, StoreError> {
        let mut collections = self.collections.write().await;
        let entry = collections.entry(collection.to_string()).or_default();

        if let Some(document) = entry.documents.iter_mut().find(|doc| matches_filter(doc, filter)) {
            merge(document, fields);
            return Ok(document.clone());
        }

        let mut combined = filter.clone();
        combined.extend(fields);
        let document = stamp_new(collection, entry, combined);
        entry.documents.push(document.clone());
        Ok(document)
    }

    async fn delete_by_id(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        let mut collections = self.collections.write().await;
        let removed = collections
            .get_mut(collection)
            .and_then(|entry| entry.position(id).map(|i| entry.documents.remove(i)));

        if removed.is_some() {
            debug!("Deleted document from {collection}: {id}");
        }
        Ok(removed)
    }

    async fn count(&self, collection: &str, filter: &Document) -> Result<u64, StoreError> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .map(|entry| entry.documents.iter().filter(|doc| matches_filter(doc, filter)).count() as u64)
            .unwrap_or(0))
    }

    async fn clear(&self) -> Result<(), StoreError> {
        self.collections.write().await.clear();
        debug!("Cleared all in-memory data");
        Ok(())
    }

    async fn collection_stats(&self) -> Option<BTreeMap<String, u64>> {
        let collections = self.collections.read().await;
        Some(
            collections
                .iter()
                .map(|(name, entry)| (name.clone(), entry.documents.len() as u64))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn doc(value: Value) -> Document {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[tokio::test]
    async fn insert_assigns_ids_and_timestamps() {
        let store = InMemoryStore::new();
        let first = store.insert("User", doc(json!({ "username": "ana" }))).await.unwrap();
        let second = store.insert("User", doc(json!({ "username": "bob" }))).await.unwrap();

        let first_id = first[ID_FIELD].as_str().unwrap();
        assert!(first_id.starts_with("inmem_User_1_"));
        assert!(second[ID_FIELD].as_str().unwrap().starts_with("inmem_User_2_"));
        assert_eq!(first[CREATED_AT_FIELD], first[UPDATED_AT_FIELD]);

        let found = store.find_by_id("User", first_id).await.unwrap().unwrap();
        assert_eq!(found["username"], "ana");
    }

    #[tokio::test]
    async fn find_sorts_then_skips_then_limits() {
        let store = InMemoryStore::new();
        for rank in [3, 1, 2, 5, 4] {
            store.insert("Score", doc(json!({ "rank": rank }))).await.unwrap();
        }

        let options = FindOptions {
            sort: vec![("rank".to_string(), SortOrder::Descending)],
            skip: Some(1),
            limit: Some(2),
        };
        let ranks: Vec<i64> = store
            .find("Score", &Document::new(), &options)
            .await
            .unwrap()
            .iter()
            .map(|d| d["rank"].as_i64().unwrap())
            .collect();

        assert_eq!(ranks, vec![4, 3]);
    }

    #[tokio::test]
    async fn update_preserves_identity_fields() {
        let store = InMemoryStore::new();
        let created = store.insert("User", doc(json!({ "username": "ana" }))).await.unwrap();
        let id = created[ID_FIELD].as_str().unwrap().to_string();

        let updated = store
            .update_by_id(
                "User",
                &id,
                doc(json!({ "_id": "hijack", "createdAt": "1970", "username": "ana-maria" })),
            )
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated[ID_FIELD], created[ID_FIELD]);
        assert_eq!(updated[CREATED_AT_FIELD], created[CREATED_AT_FIELD]);
        assert_eq!(updated["username"], "ana-maria");
        assert!(store.update_by_id("User", "missing", Document::new()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn upsert_inserts_once_then_updates() {
        let store = InMemoryStore::new();
        let filter = doc(json!({ "language": "en-us" }));

        let inserted = store
            .upsert_one("BadWords", &filter, doc(json!({ "swearWords": ["darn"] })))
            .await
            .unwrap();
        let updated = store
            .upsert_one("BadWords", &filter, doc(json!({ "swearWords": ["heck"] })))
            .await
            .unwrap();

        assert_eq!(inserted[ID_FIELD], updated[ID_FIELD]);
        assert_eq!(updated["swearWords"], json!(["heck"]));
        assert_eq!(store.count("BadWords", &Document::new()).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn delete_clear_and_stats() {
        let store = InMemoryStore::new();
        let created = store.insert("Hologram", doc(json!({ "name": "a" }))).await.unwrap();
        store.insert("User", doc(json!({ "username": "ana" }))).await.unwrap();

        let stats = store.collection_stats().await.unwrap();
        assert_eq!(stats.get("Hologram"), Some(&1));
        assert_eq!(stats.get("User"), Some(&1));

        let id = created[ID_FIELD].as_str().unwrap();
        assert!(store.delete_by_id("Hologram", id).await.unwrap().is_some());
        assert!(store.delete_by_id("Hologram", id).await.unwrap().is_none());

        store.clear().await.unwrap();
        assert!(store.collection_stats().await.unwrap().is_empty());
    }
}
