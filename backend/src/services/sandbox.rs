//! Sample users and holograms for exercising whichever store is configured.

use std::{collections::BTreeMap, sync::Arc};

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::{
    config::DatabaseKind,
    database::{
        models::{Hologram, User, UserUpdate},
        queries::{to_document, Record, Repository},
        timestamp, Document, DocumentStore, FindOptions, StoreError,
    },
    errors::AppError,
};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub roles: Option<Vec<String>>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewHologram {
    pub name: String,
    pub url: String,
    pub thumbnail_url: Option<String>,
    pub user_id: String,
    pub metadata: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserQuery {
    pub is_active: Option<bool>,
    pub limit: Option<u64>,
    pub skip: Option<u64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageStats {
    pub storage_type: DatabaseKind,
    pub users: u64,
    pub holograms: u64,
    pub timestamp: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SeededData {
    pub users: Vec<Record<User>>,
    pub holograms: Vec<Record<Hologram>>,
}

#[derive(Clone)]
pub struct SandboxService {
    store: Arc<dyn DocumentStore>,
    users: Repository<User>,
    holograms: Repository<Hologram>,
}

fn require(value: &str) -> bool {
    !value.trim().is_empty()
}

impl SandboxService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            users: Repository::new(store.clone()),
            holograms: Repository::new(store.clone()),
            store,
        }
    }

    pub fn kind(&self) -> DatabaseKind {
        self.store.kind()
    }

    pub async fn create_user(&self, new_user: NewUser) -> Result<Record<User>, AppError> {
        if !require(&new_user.username) || !require(&new_user.email) {
            return Err(AppError::BadRequest("Username and email are required".to_string()));
        }

        let user = User {
            username: new_user.username,
            email: new_user.email,
            roles: new_user.roles.unwrap_or_else(|| vec!["user".to_string()]),
            is_active: new_user.is_active.unwrap_or(true),
        };
        let record = self.users.create(&user).await?;
        info!("Created user {} ({}) in {} storage", record.data.username, record.id, self.kind().as_str());
        Ok(record)
    }

    pub async fn get_users(&self, query: &UserQuery) -> Result<Vec<Record<User>>, AppError> {
        let mut filter = Document::new();
        if let Some(is_active) = query.is_active {
            filter.insert("isActive".to_string(), Value::Bool(is_active));
        }
        let options = FindOptions {
            limit: query.limit,
            skip: query.skip,
            ..FindOptions::newest_first()
        };

        let users = self.users.find(&filter, &options).await?;
        debug!("Found {} users", users.len());
        Ok(users)
    }

    pub async fn get_user(&self, id: &str) -> Result<Option<Record<User>>, AppError> {
        Ok(self.users.find_by_id(id).await?)
    }

    pub async fn update_user(&self, id: &str, update: &UserUpdate) -> Result<Option<Record<User>>, AppError> {
        Ok(self.users.update_by_id(id, to_document(update)?).await?)
    }

    pub async fn delete_user(&self, id: &str) -> Result<bool, AppError> {
        let deleted = self.users.delete_by_id(id).await?.is_some();
        if deleted {
            info!("Deleted user {id}");
        }
        Ok(deleted)
    }

    pub async fn create_hologram(&self, new_hologram: NewHologram) -> Result<Record<Hologram>, AppError> {
        if !require(&new_hologram.name) || !require(&new_hologram.url) || !require(&new_hologram.user_id) {
            return Err(AppError::BadRequest("Name, URL, and userId are required".to_string()));
        }

        let hologram = Hologram {
            name: new_hologram.name,
            url: new_hologram.url,
            thumbnail_url: new_hologram.thumbnail_url,
            user_id: new_hologram.user_id,
            is_active: true,
            metadata: new_hologram.metadata.unwrap_or_else(|| json!({})),
        };
        let record = self.holograms.create(&hologram).await?;
        info!("Created hologram {} for user {}", record.id, record.data.user_id);
        Ok(record)
    }

    pub async fn holograms_by_user(&self, user_id: &str) -> Result<Vec<Record<Hologram>>, AppError> {
        let filter = to_document(&json!({ "userId": user_id, "isActive": true }))?;
        Ok(self.holograms.find(&filter, &FindOptions::newest_first()).await?)
    }

    pub async fn storage_stats(&self) -> Result<StorageStats, AppError> {
        let everything = Document::new();
        Ok(StorageStats {
            storage_type: self.kind(),
            users: self.users.count(&everything).await?,
            holograms: self.holograms.count(&everything).await?,
            timestamp: timestamp(),
        })
    }

    pub async fn collection_stats(&self) -> Option<BTreeMap<String, u64>> {
        self.store.collection_stats().await
    }

    pub async fn clear(&self) -> Result<(), StoreError> {
        self.store.clear().await
    }

    pub async fn seed_sample_data(&self) -> Result<SeededData, AppError> {
        let first = self
            .create_user(NewUser {
                username: "testuser1".into(),
                email: "user1@example.com".into(),
                roles: Some(vec!["user".into(), "moderator".into()]),
                is_active: None,
            })
            .await?;
        let second = self
            .create_user(NewUser {
                username: "testuser2".into(),
                email: "user2@example.com".into(),
                roles: Some(vec!["user".into()]),
                is_active: None,
            })
            .await?;

        let holograms = vec![
            self.create_hologram(NewHologram {
                name: "Sample Hologram 1".into(),
                url: "https://example.com/hologram1.mp4".into(),
                thumbnail_url: Some("https://example.com/thumb1.jpg".into()),
                user_id: first.id.clone(),
                metadata: Some(json!({ "duration": 30, "quality": "HD" })),
            })
            .await?,
            self.create_hologram(NewHologram {
                name: "Sample Hologram 2".into(),
                url: "https://example.com/hologram2.mp4".into(),
                thumbnail_url: None,
                user_id: second.id.clone(),
                metadata: Some(json!({ "duration": 45, "quality": "4K" })),
            })
            .await?,
        ];

        info!("Seeded sample data: 2 users, {} holograms", holograms.len());
        Ok(SeededData {
            users: vec![first, second],
            holograms,
        })
    }
}
