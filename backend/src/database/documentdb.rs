//! MongoDB-compatible document database backend (Amazon DocumentDB in deployment).
//!
//! Documents cross the boundary as JSON objects. The driver's `ObjectId` is
//! exposed to callers as its hex string, and timestamps are stored as RFC 3339
//! strings so both backends return identical shapes.

use std::{path::Path, time::Duration};

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    bson::{self, doc, oid::ObjectId, Bson},
    options::{
        ClientOptions, FindOneAndUpdateOptions, FindOptions as MongoFindOptions, ReturnDocument, Tls,
        TlsOptions,
    },
    Client, Database,
};
use serde_json::Value;
use tracing::info;

use super::{
    timestamp, Document, DocumentStore, FindOptions, SortOrder, StoreError, CREATED_AT_FIELD, ID_FIELD,
    UPDATED_AT_FIELD,
};
use crate::config::DatabaseKind;

const SERVER_SELECTION_TIMEOUT: Duration = Duration::from_secs(10);

pub struct DocumentDbStore {
    database: Database,
}

fn backend(err: mongodb::error::Error) -> StoreError {
    StoreError::Backend(err.to_string())
}

impl DocumentDbStore {
    pub async fn connect(uri: &str, database_name: &str, ca_file: &Path) -> Result<Self, StoreError> {
        let mut options = ClientOptions::parse(uri).await.map_err(backend)?;
        options.server_selection_timeout = Some(SERVER_SELECTION_TIMEOUT);

        if uri.contains("tls=true") {
            options.tls = Some(Tls::Enabled(
                TlsOptions::builder().ca_file_path(ca_file.to_path_buf()).build(),
            ));
        }

        let client = Client::with_options(options).map_err(backend)?;
        let database = client.database(database_name);
        database.run_command(doc! { "ping": 1 }, None).await.map_err(backend)?;

        info!("DocumentDB connected successfully to database {database_name}");
        Ok(Self { database })
    }

    fn collection(&self, name: &str) -> mongodb::Collection<bson::Document> {
        self.database.collection::<bson::Document>(name)
    }
}

fn to_bson(document: &Document) -> Result<bson::Document, StoreError> {
    bson::to_document(document).map_err(|err| StoreError::Backend(err.to_string()))
}

/// Query form of a filter. Array values match when the stored array contains
/// every listed element, as in the in-memory store.
fn filter_to_bson(filter: &Document) -> Result<bson::Document, StoreError> {
    let query: Document = filter
        .iter()
        .map(|(field, value)| match value {
            Value::Array(items) => (field.clone(), serde_json::json!({ "$all": items })),
            other => (field.clone(), other.clone()),
        })
        .collect();
    to_bson(&query)
}

fn from_bson(mut document: bson::Document) -> Document {
    let hex_id = match document.get(ID_FIELD) {
        Some(Bson::ObjectId(oid)) => Some(oid.to_hex()),
        _ => None,
    };
    if let Some(hex) = hex_id {
        document.insert(ID_FIELD, hex);
    }

    match Bson::Document(document).into_relaxed_extjson() {
        Value::Object(map) => map,
        _ => Document::new(),
    }
}

fn id_filter(id: &str) -> Option<bson::Document> {
    ObjectId::parse_str(id).ok().map(|oid| doc! { "_id": oid })
}

fn without_identity(mut fields: Document) -> Document {
    fields.remove(ID_FIELD);
    fields.remove(CREATED_AT_FIELD);
    fields.insert(UPDATED_AT_FIELD.to_string(), Value::String(timestamp()));
    fields
}

fn after_update() -> FindOneAndUpdateOptions {
    let mut options = FindOneAndUpdateOptions::default();
    options.return_document = Some(ReturnDocument::After);
    options
}

#[async_trait]
impl DocumentStore for DocumentDbStore {
    fn kind(&self) -> DatabaseKind {
        DatabaseKind::DocumentDb
    }

    async fn insert(&self, collection: &str, mut fields: Document) -> Result<Document, StoreError> {
        let now = timestamp();
        fields.remove(ID_FIELD);
        fields.insert(CREATED_AT_FIELD.to_string(), Value::String(now.clone()));
        fields.insert(UPDATED_AT_FIELD.to_string(), Value::String(now));

        let mut document = to_bson(&fields)?;
        let result = self
            .collection(collection)
            .insert_one(&document, None)
            .await
            .map_err(backend)?;
        document.insert(ID_FIELD, result.inserted_id);

        Ok(from_bson(document))
    }

    async fn find(
        &self,
        collection: &str,
        filter: &Document,
        options: &FindOptions,
    ) -> Result<Vec<Document>, StoreError> {
        let mut find_options = MongoFindOptions::default();
        find_options.limit = options.limit.map(|l| l as i64);
        find_options.skip = options.skip;
        if !options.sort.is_empty() {
            let mut sort = bson::Document::new();
            for (field, order) in &options.sort {
                let direction = match order {
                    SortOrder::Ascending => 1,
                    SortOrder::Descending => -1,
                };
                sort.insert(field.as_str(), direction);
            }
            find_options.sort = Some(sort);
        }

        let cursor = self
            .collection(collection)
            .find(filter_to_bson(filter)?, find_options)
            .await
            .map_err(backend)?;
        let documents: Vec<bson::Document> = cursor.try_collect().await.map_err(backend)?;

        Ok(documents.into_iter().map(from_bson).collect())
    }

    async fn find_one(&self, collection: &str, filter: &Document) -> Result<Option<Document>, StoreError> {
        let found = self
            .collection(collection)
            .find_one(filter_to_bson(filter)?, None)
            .await
            .map_err(backend)?;

        Ok(found.map(from_bson))
    }

    async fn find_by_id(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        let Some(filter) = id_filter(id) else {
            return Ok(None);
        };
        let found = self
            .collection(collection)
            .find_one(filter, None)
            .await
            .map_err(backend)?;

        Ok(found.map(from_bson))
    }

    async fn update_by_id(
        &self,
        collection: &str,
        id: &str,
        fields: Document,
    ) -> Result<Option<Document>, StoreError> {
        let Some(filter) = id_filter(id) else {
            return Ok(None);
        };
        let update = doc! { "$set": to_bson(&without_identity(fields))? };

        let updated = self
            .collection(collection)
            .find_one_and_update(filter, update, after_update())
            .await
            .map_err(backend)?;

        Ok(updated.map(from_bson))
    }

    async fn upsert_one(
        &self,
        collection: &str,
        filter: &Document,
        fields: Document,
    ) -> Result<Document, StoreError> {
        let update = doc! {
            "$set": to_bson(&without_identity(fields))?,
            "$setOnInsert": { "createdAt": timestamp() },
        };
        let mut options = after_update();
        options.upsert = Some(true);

        let document = self
            .collection(collection)
            .find_one_and_update(filter_to_bson(filter)?, update, options)
            .await
            .map_err(backend)?
            .ok_or_else(|| StoreError::Backend(format!("Upsert into {collection} returned no document")))?;

        Ok(from_bson(document))
    }

    async fn delete_by_id(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        let Some(filter) = id_filter(id) else {
            return Ok(None);
        };
        let removed = self
            .collection(collection)
            .find_one_and_delete(filter, None)
            .await
            .map_err(backend)?;

        Ok(removed.map(from_bson))
    }

    async fn count(&self, collection: &str, filter: &Document) -> Result<u64, StoreError> {
        self.collection(collection)
            .count_documents(filter_to_bson(filter)?, None)
            .await
            .map_err(backend)
    }

    async fn clear(&self) -> Result<(), StoreError> {
        Err(StoreError::Unsupported("Clear operation only available for in-memory storage"))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn object_ids_are_exposed_as_hex_strings() {
        let oid = ObjectId::new();
        let document = doc! { "_id": oid, "username": "ana", "roles": ["user"] };

        let converted = from_bson(document);
        assert_eq!(converted[ID_FIELD], json!(oid.to_hex()));
        assert_eq!(converted["roles"], json!(["user"]));
    }

    #[test]
    fn malformed_ids_never_reach_the_database() {
        assert!(id_filter("inmem_User_1_1700000000000").is_none());
        assert!(id_filter(&ObjectId::new().to_hex()).is_some());
    }

    #[test]
    fn array_filters_match_as_subsets() {
        let mut filter = Document::new();
        filter.insert("roles".to_string(), json!(["moderator"]));
        filter.insert("isActive".to_string(), json!(true));

        let query = filter_to_bson(&filter).unwrap();
        assert_eq!(query.get_document("roles").unwrap(), &doc! { "$all": ["moderator"] });
        assert_eq!(query.get_bool("isActive").unwrap(), true);
    }

    #[test]
    fn updates_cannot_rewrite_identity_fields() {
        let mut fields = Document::new();
        fields.insert(ID_FIELD.to_string(), json!("x"));
        fields.insert(CREATED_AT_FIELD.to_string(), json!("1970"));
        fields.insert("name".to_string(), json!("clip"));

        let cleaned = without_identity(fields);
        assert!(!cleaned.contains_key(ID_FIELD));
        assert!(!cleaned.contains_key(CREATED_AT_FIELD));
        assert!(cleaned.contains_key(UPDATED_AT_FIELD));
    }
}
