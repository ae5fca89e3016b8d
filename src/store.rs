//! Narrow interface to the external document store, plus its two backends:
//! Redis (one hash per collection, JSON document bodies) and an in-memory
//! store seedable from a static menu document.
//!
//! Collection paths mirror the document layout: `sections`,
//! `sections/{id}/items`, `sections/{id}/toppings` and `settings`.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use redis::{
    aio::{ConnectionManager, ConnectionManagerConfig},
    AsyncCommands, Client,
};
use serde_json::{Map, Value};
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::text::slugify;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("store backend error: {0}")]
    Backend(String),

    #[error("document is not valid JSON: {0}")]
    Corrupt(#[from] serde_json::Error),

    #[error("document not found: {0}")]
    NotFound(String),
}

impl From<redis::RedisError> for StoreError {
    fn from(e: redis::RedisError) -> Self {
        StoreError::Backend(e.to_string())
    }
}

/// The only operations the rest of the system may issue against the store.
///
/// `patch` and `merge` both apply partial field maps where `null` means
/// "delete this field" and dotted keys (`base.title_en`) address nested
/// fields; `patch` fails on a missing document, `merge` creates it.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn list(&self, collection: &str) -> Result<Vec<(String, Value)>, StoreError>;
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Value>, StoreError>;
    /// Create with a generated opaque id.
    async fn create(&self, collection: &str, data: Value) -> Result<String, StoreError>;
    /// Create or replace at a known id.
    async fn put(&self, collection: &str, id: &str, data: Value) -> Result<(), StoreError>;
    async fn patch(
        &self,
        collection: &str,
        id: &str,
        fields: Map<String, Value>,
    ) -> Result<(), StoreError>;
    async fn merge(
        &self,
        collection: &str,
        id: &str,
        fields: Map<String, Value>,
    ) -> Result<(), StoreError>;
    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError>;
}

/// Merge patch fields into a document body. A `null` value deletes the field;
/// dotted keys walk (and create) nested objects.
pub fn apply_patch(doc: &mut Value, fields: &Map<String, Value>) {
    if !doc.is_object() {
        *doc = Value::Object(Map::new());
    }
    for (key, val) in fields {
        let parts: Vec<&str> = key.split('.').collect();
        patch_path(doc, &parts, val);
    }
}

fn patch_path(node: &mut Value, parts: &[&str], val: &Value) {
    let Some((head, rest)) = parts.split_first() else {
        return;
    };
    let Some(obj) = node.as_object_mut() else {
        return;
    };
    if rest.is_empty() {
        if val.is_null() {
            obj.remove(*head);
        } else {
            obj.insert((*head).to_string(), val.clone());
        }
        return;
    }
    // deleting below a missing parent is a no-op
    if val.is_null() && !obj.contains_key(*head) {
        return;
    }
    let child = obj
        .entry((*head).to_string())
        .or_insert_with(|| Value::Object(Map::new()));
    if !child.is_object() {
        *child = Value::Object(Map::new());
    }
    patch_path(child, rest, val);
}

// ── Redis backend ──

pub struct RedisStore {
    conn: ConnectionManager,
}

impl RedisStore {
    pub async fn connect(redis_url: &str) -> Result<Self, StoreError> {
        let config = ConnectionManagerConfig::new()
            .set_number_of_retries(1)
            .set_connection_timeout(Duration::from_millis(100));

        let client = Client::open(redis_url)?;
        let conn = client.get_connection_manager_with_config(config).await?;
        Ok(Self { conn })
    }

    fn key(collection: &str) -> String {
        format!("carta:{collection}")
    }
}

#[async_trait]
impl DocumentStore for RedisStore {
    async fn list(&self, collection: &str) -> Result<Vec<(String, Value)>, StoreError> {
        let mut conn = self.conn.clone();
        let raw: BTreeMap<String, String> = conn.hgetall(Self::key(collection)).await?;
        let mut docs = Vec::with_capacity(raw.len());
        for (id, body) in raw {
            docs.push((id, serde_json::from_str(&body)?));
        }
        Ok(docs)
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Value>, StoreError> {
        let mut conn = self.conn.clone();
        let body: Option<String> = conn.hget(Self::key(collection), id).await?;
        match body {
            Some(body) => Ok(Some(serde_json::from_str(&body)?)),
            None => Ok(None),
        }
    }

    async fn create(&self, collection: &str, data: Value) -> Result<String, StoreError> {
        let id = Uuid::new_v4().to_string();
        self.put(collection, &id, data).await?;
        Ok(id)
    }

    async fn put(&self, collection: &str, id: &str, data: Value) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let body = serde_json::to_string(&data)?;
        let _: () = conn.hset(Self::key(collection), id, body).await?;
        Ok(())
    }

    async fn patch(
        &self,
        collection: &str,
        id: &str,
        fields: Map<String, Value>,
    ) -> Result<(), StoreError> {
        let mut doc = self
            .get(collection, id)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("{collection}/{id}")))?;
        apply_patch(&mut doc, &fields);
        self.put(collection, id, doc).await
    }

    async fn merge(
        &self,
        collection: &str,
        id: &str,
        fields: Map<String, Value>,
    ) -> Result<(), StoreError> {
        let mut doc = self
            .get(collection, id)
            .await?
            .unwrap_or_else(|| Value::Object(Map::new()));
        apply_patch(&mut doc, &fields);
        self.put(collection, id, doc).await
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let _: () = conn.hdel(Self::key(collection), id).await?;
        Ok(())
    }
}

// ── In-memory backend ──

/// In-memory document store. Backs the static-JSON variant of the public
/// site and every test.
#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<BTreeMap<String, BTreeMap<String, Value>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed from a static menu document of the shape
    /// `{"settings": {...}, "sections": [{"id", ..., "items": [], "toppings": []}]}`.
    ///
    /// Child arrays are split out into their sub-collection paths; children
    /// without an id get a positional one.
    pub fn from_json(doc: &Value) -> Result<Self, StoreError> {
        let mut collections: BTreeMap<String, BTreeMap<String, Value>> = BTreeMap::new();

        if let Some(settings) = doc.get("settings") {
            collections
                .entry("settings".to_string())
                .or_default()
                .insert("menu".to_string(), settings.clone());
        }

        for section in doc
            .get("sections")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
        {
            let mut body = section
                .as_object()
                .cloned()
                .ok_or_else(|| StoreError::Backend("section is not an object".to_string()))?;
            let id = match body.remove("id") {
                Some(Value::String(id)) => id,
                _ => slugify(body.get("title").and_then(Value::as_str).unwrap_or("")),
            };
            if id.is_empty() {
                return Err(StoreError::Backend(
                    "section without id or title".to_string(),
                ));
            }
            for child_kind in ["items", "toppings"] {
                let children = body.remove(child_kind).unwrap_or(Value::Null);
                let path = format!("sections/{id}/{child_kind}");
                for (i, child) in children.as_array().into_iter().flatten().enumerate() {
                    let mut child = child.clone();
                    let child_id = child
                        .as_object_mut()
                        .and_then(|o| o.remove("id"))
                        .and_then(|v| v.as_str().map(str::to_string))
                        .unwrap_or_else(|| format!("{i:04}"));
                    collections
                        .entry(path.clone())
                        .or_default()
                        .insert(child_id, child);
                }
            }
            collections
                .entry("sections".to_string())
                .or_default()
                .insert(id, Value::Object(body));
        }

        Ok(Self {
            collections: RwLock::new(collections),
        })
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn list(&self, collection: &str) -> Result<Vec<(String, Value)>, StoreError> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .map(|docs| docs.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
            .unwrap_or_default())
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Value>, StoreError> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.get(id))
            .cloned())
    }

    async fn create(&self, collection: &str, data: Value) -> Result<String, StoreError> {
        let id = Uuid::new_v4().to_string();
        self.put(collection, &id, data).await?;
        Ok(id)
    }

    async fn put(&self, collection: &str, id: &str, data: Value) -> Result<(), StoreError> {
        let mut collections = self.collections.write().await;
        collections
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), data);
        Ok(())
    }

    async fn patch(
        &self,
        collection: &str,
        id: &str,
        fields: Map<String, Value>,
    ) -> Result<(), StoreError> {
        let mut collections = self.collections.write().await;
        let doc = collections
            .get_mut(collection)
            .and_then(|docs| docs.get_mut(id))
            .ok_or_else(|| StoreError::NotFound(format!("{collection}/{id}")))?;
        apply_patch(doc, &fields);
        Ok(())
    }

    async fn merge(
        &self,
        collection: &str,
        id: &str,
        fields: Map<String, Value>,
    ) -> Result<(), StoreError> {
        let mut collections = self.collections.write().await;
        let doc = collections
            .entry(collection.to_string())
            .or_default()
            .entry(id.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        apply_patch(doc, &fields);
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        let mut collections = self.collections.write().await;
        if let Some(docs) = collections.get_mut(collection) {
            docs.remove(id);
        }
        Ok(())
    }
}
