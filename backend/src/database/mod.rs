//! Module for database connection setup and common utilities.
//!
//! Storage is reached through the [`DocumentStore`] trait. Two backends exist:
//! an in-memory store for development and tests, and a MongoDB-compatible
//! document database for deployed environments. The backend is picked once at
//! startup by [`connect`] from the configured [`DatabaseSelection`].

pub mod documentdb;
pub mod memory;
pub mod models;
pub mod queries;

use std::{cmp::Ordering, collections::BTreeMap, path::Path, sync::Arc};

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::config::{DatabaseKind, DatabaseSelection};

/// A stored document: a JSON object carrying `_id`, `createdAt` and `updatedAt`.
pub type Document = Map<String, Value>;

pub const ID_FIELD: &str = "_id";
pub const CREATED_AT_FIELD: &str = "createdAt";
pub const UPDATED_AT_FIELD: &str = "updatedAt";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Backend(String),

    #[error("Document serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{0}")]
    Unsupported(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, Default)]
pub struct FindOptions {
    pub limit: Option<u64>,
    pub skip: Option<u64>,
    pub sort: Vec<(String, SortOrder)>,
}

impl FindOptions {
    pub fn newest_first() -> Self {
        Self {
            sort: vec![(CREATED_AT_FIELD.to_string(), SortOrder::Descending)],
            ..Self::default()
        }
    }
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    fn kind(&self) -> DatabaseKind;

    /// Stores `fields` as a new document and returns it with id and timestamps.
    async fn insert(&self, collection: &str, fields: Document) -> Result<Document, StoreError>;

    async fn find(
        &self,
        collection: &str,
        filter: &Document,
        options: &FindOptions,
    ) -> Result<Vec<Document>, StoreError>;

    async fn find_one(&self, collection: &str, filter: &Document) -> Result<Option<Document>, StoreError>;

    async fn find_by_id(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError>;

    /// Merges `fields` into the document. `_id` and `createdAt` are preserved.
    async fn update_by_id(
        &self,
        collection: &str,
        id: &str,
        fields: Document,
    ) -> Result<Option<Document>, StoreError>;

    /// Updates the first document matching `filter`, or inserts `filter` merged with `fields`.
    async fn upsert_one(
        &self,
        collection: &str,
        filter: &Document,
        fields: Document,
    ) -> Result<Document, StoreError>;

    /// Removes the document and returns it.
    async fn delete_by_id(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError>;

    async fn count(&self, collection: &str, filter: &Document) -> Result<u64, StoreError>;

    async fn clear(&self) -> Result<(), StoreError>;

    /// Document count per collection, when the backend can report it cheaply.
    async fn collection_stats(&self) -> Option<BTreeMap<String, u64>> {
        None
    }
}

pub async fn connect(
    selection: &DatabaseSelection,
    database_name: &str,
    ca_file: &Path,
) -> Result<Arc<dyn DocumentStore>, StoreError> {
    match (&selection.kind, &selection.connection_string) {
        (DatabaseKind::DocumentDb, Some(uri)) => {
            let store = documentdb::DocumentDbStore::connect(uri, database_name, ca_file).await?;
            Ok(Arc::new(store))
        }
        _ => Ok(Arc::new(memory::InMemoryStore::new())),
    }
}

pub fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// True when every filter field matches the document. Array filters match when
/// each requested element is present in the document's array.
pub fn matches_filter(document: &Document, filter: &Document) -> bool {
    filter.iter().all(|(key, expected)| match (expected, document.get(key)) {
        (Value::Array(wanted), Some(Value::Array(present))) => wanted.iter().all(|w| present.contains(w)),
        (Value::Array(_), _) => false,
        (expected, Some(actual)) => expected == actual,
        (Value::Null, None) => true,
        (_, None) => false,
    })
}

pub fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        _ => Ordering::Equal,
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

    #[test]
    fn filters_match_scalars_and_array_subsets() {
        let user = doc(json!({ "username": "ana", "roles": ["user", "moderator"], "isActive": true }));

        assert!(matches_filter(&user, &doc(json!({}))));
        assert!(matches_filter(&user, &doc(json!({ "isActive": true }))));
        assert!(matches_filter(&user, &doc(json!({ "roles": ["moderator"] }))));
        assert!(!matches_filter(&user, &doc(json!({ "roles": ["admin"] }))));
        assert!(!matches_filter(&user, &doc(json!({ "username": "bob" }))));
        assert!(!matches_filter(&user, &doc(json!({ "email": "ana@example.com" }))));
    }

    #[test]
    fn timestamps_sort_chronologically_as_strings() {
        let earlier = json!("2024-05-01T10:00:00.000Z");
        let later = json!("2024-05-01T10:00:00.250Z");
        assert_eq!(compare_values(Some(&earlier), Some(&later)), Ordering::Less);
        assert!(timestamp().ends_with('Z'));
    }
}
