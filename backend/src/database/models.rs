//! Rust structs that represent the stored collections.
//!
//! Field names follow the JSON the front end already consumes (camelCase).
//! Identity and timestamps are added by [`super::queries::Record`].

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub trait Model {
    const COLLECTION: &'static str;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default = "active")]
    pub is_active: bool,
}

impl Model for User {
    const COLLECTION: &'static str = "User";
}

/// Partial update for a [`User`]. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roles: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hologram {
    pub name: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    pub user_id: String,
    #[serde(default = "active")]
    pub is_active: bool,
    #[serde(default = "empty_object")]
    pub metadata: Value,
}

impl Model for Hologram {
    const COLLECTION: &'static str = "Hologram";
}

/// Profanity list for one transcription language (stored lower-cased, e.g. `en-us`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BadWords {
    pub language: String,
    #[serde(default)]
    pub swear_words: Vec<String>,
}

impl Model for BadWords {
    const COLLECTION: &'static str = "BadWords";
}

fn active() -> bool {
    true
}

fn empty_object() -> Value {
    Value::Object(Default::default())
}
