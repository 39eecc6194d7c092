//! Database query functions (Data Access Objects).
//!
//! [`Repository`] is a typed view over one collection of a [`DocumentStore`],
//! so services work with models instead of raw JSON documents.

use std::{marker::PhantomData, sync::Arc};

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

use super::{models::Model, Document, DocumentStore, FindOptions, StoreError};

/// A stored model together with its identity and timestamps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record<T> {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "createdAt", default)]
    pub created_at: Option<String>,
    #[serde(rename = "updatedAt", default)]
    pub updated_at: Option<String>,
    #[serde(flatten)]
    pub data: T,
}

pub struct Repository<T> {
    store: Arc<dyn DocumentStore>,
    _model: PhantomData<fn() -> T>,
}

impl<T> Clone for Repository<T> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            _model: PhantomData,
        }
    }
}

/// Serializes any value that renders as a JSON object into a [`Document`].
pub fn to_document<S: Serialize>(value: &S) -> Result<Document, StoreError> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        other => Err(StoreError::Backend(format!("Expected a JSON object, got {other}"))),
    }
}

impl<T> Repository<T>
where
    T: Model + Serialize + DeserializeOwned,
{
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            _model: PhantomData,
        }
    }

    fn decode(document: Document) -> Result<Record<T>, StoreError> {
        Ok(serde_json::from_value(Value::Object(document))?)
    }

    pub async fn create(&self, model: &T) -> Result<Record<T>, StoreError> {
        let document = self.store.insert(T::COLLECTION, to_document(model)?).await?;
        Self::decode(document)
    }

    pub async fn find(&self, filter: &Document, options: &FindOptions) -> Result<Vec<Record<T>>, StoreError> {
        self.store
            .find(T::COLLECTION, filter, options)
            .await?
            .into_iter()
            .map(Self::decode)
            .collect()
    }

    pub async fn find_one(&self, filter: &Document) -> Result<Option<Record<T>>, StoreError> {
        self.store
            .find_one(T::COLLECTION, filter)
            .await?
            .map(Self::decode)
            .transpose()
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<Record<T>>, StoreError> {
        self.store
            .find_by_id(T::COLLECTION, id)
            .await?
            .map(Self::decode)
            .transpose()
    }

    pub async fn update_by_id(&self, id: &str, fields: Document) -> Result<Option<Record<T>>, StoreError> {
        self.store
            .update_by_id(T::COLLECTION, id, fields)
            .await?
            .map(Self::decode)
            .transpose()
    }

    pub async fn upsert(&self, filter: &Document, model: &T) -> Result<Record<T>, StoreError> {
        let document = self
            .store
            .upsert_one(T::COLLECTION, filter, to_document(model)?)
            .await?;
        Self::decode(document)
    }

    pub async fn delete_by_id(&self, id: &str) -> Result<Option<Record<T>>, StoreError> {
        self.store
            .delete_by_id(T::COLLECTION, id)
            .await?
            .map(Self::decode)
            .transpose()
    }

    pub async fn count(&self, filter: &Document) -> Result<u64, StoreError> {
        self.store.count(T::COLLECTION, filter).await
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::database::{
        memory::InMemoryStore,
        models::{Hologram, User, UserUpdate},
    };

    fn users() -> Repository<User> {
        Repository::new(Arc::new(InMemoryStore::new()))
    }

    #[tokio::test]
    async fn records_flatten_model_fields() {
        let repo = users();
        let record = repo
            .create(&User {
                username: "ana".into(),
                email: "ana@example.com".into(),
                roles: vec!["user".into()],
                is_active: true,
            })
            .await
            .unwrap();

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["_id"], json!(record.id));
        assert_eq!(json["username"], "ana");
        assert_eq!(json["isActive"], true);
        assert!(json["createdAt"].is_string());
    }

    #[tokio::test]
    async fn partial_updates_only_touch_given_fields() {
        let repo = users();
        let record = repo
            .create(&User {
                username: "ana".into(),
                email: "ana@example.com".into(),
                roles: vec!["user".into()],
                is_active: true,
            })
            .await
            .unwrap();

        let patch = to_document(&UserUpdate {
            is_active: Some(false),
            ..UserUpdate::default()
        })
        .unwrap();
        let updated = repo.update_by_id(&record.id, patch).await.unwrap().unwrap();

        assert_eq!(updated.data.username, "ana");
        assert!(!updated.data.is_active);
    }

    #[test]
    fn hologram_defaults_fill_missing_fields() {
        let hologram: Hologram = serde_json::from_value(json!({
            "name": "intro",
            "url": "https://cdn.example.com/intro.mp4",
            "userId": "u1"
        }))
        .unwrap();

        assert!(hologram.is_active);
        assert_eq!(hologram.metadata, json!({}));
        assert!(hologram.thumbnail_url.is_none());
    }

    #[test]
    fn scalars_are_not_documents() {
        assert!(to_document(&42).is_err());
    }
}
