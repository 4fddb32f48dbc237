//! MongoDB implementation of the repositories
//!
//! Each collection keeps its own integer id sequence. Todo documents store
//! only the ids of their tags; the todo repository resolves them through the
//! tag repository on every read.

use std::sync::Arc;

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::{Bson, Document, doc};
use mongodb::{Collection, Database};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{TodoError, TodoResult};

mod tags;
mod todos;

#[cfg(test)]
pub(crate) mod memory;

pub use tags::MongoTagRepository;
pub use todos::MongoTodoRepository;

pub const TODOS_COLLECTION: &str = "todos";
pub const TAGS_COLLECTION: &str = "tags";

/// Stored shape of a todo
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TodoDocument {
    #[serde(rename = "_id")]
    pub id: i32,
    pub description: String,
    pub done: bool,
    #[serde(default)]
    pub tag_ids: Vec<i32>,
}

/// Stored shape of a tag
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagDocument {
    #[serde(rename = "_id")]
    pub id: i32,
    pub name: String,
}

/// The id after `id`, or an error once the `i32` range is used up
fn next_after(id: i32, collection: &str) -> TodoResult<i32> {
    id.checked_add(1).ok_or_else(|| exhausted(collection))
}

fn exhausted(collection: &str) -> TodoError {
    TodoError::Internal(format!("{collection} id sequence exhausted"))
}

/// Query over a collection
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentFilter {
    All,
    Eq(&'static str, Bson),
    /// Case-insensitive substring match; the keyword is matched literally
    ContainsIgnoreCase(&'static str, String),
}

impl DocumentFilter {
    pub fn to_document(&self) -> Document {
        match self {
            DocumentFilter::All => doc! {},
            DocumentFilter::Eq(field, value) => doc! { *field: value.clone() },
            DocumentFilter::ContainsIgnoreCase(field, keyword) => doc! {
                *field: { "$regex": regex::escape(keyword), "$options": "i" }
            },
        }
    }
}

/// Minimal collection surface the repositories need.
///
/// Results of `find` come back sorted by `_id`.
#[async_trait]
pub trait DocumentCollection<T>: Send + Sync
where
    T: Send + Sync,
{
    async fn find(&self, filter: DocumentFilter) -> TodoResult<Vec<T>>;

    async fn find_by_id(&self, id: i32) -> TodoResult<Option<T>>;

    /// Replace the document with this `_id`, inserting it if absent
    async fn upsert(&self, id: i32, record: &T) -> TodoResult<()>;

    /// Returns whether a document was removed
    async fn delete_by_id(&self, id: i32) -> TodoResult<bool>;

    async fn max_id(&self) -> TodoResult<Option<i32>>;
}

/// [`DocumentCollection`] backed by a MongoDB collection
pub struct MongoCollection<T: Send + Sync> {
    inner: Collection<T>,
}

impl<T> MongoCollection<T>
where
    T: Send + Sync,
{
    pub fn new(db: &Database, name: &str) -> Self {
        Self {
            inner: db.collection::<T>(name),
        }
    }

    /// Shared handle, ready to pass to a repository
    pub fn shared(db: &Database, name: &str) -> Arc<Self> {
        Arc::new(Self::new(db, name))
    }
}

#[async_trait]
impl<T> DocumentCollection<T> for MongoCollection<T>
where
    T: Serialize + DeserializeOwned + Unpin + Send + Sync,
{
    async fn find(&self, filter: DocumentFilter) -> TodoResult<Vec<T>> {
        let cursor = self
            .inner
            .find(filter.to_document())
            .sort(doc! { "_id": 1 })
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn find_by_id(&self, id: i32) -> TodoResult<Option<T>> {
        Ok(self.inner.find_one(doc! { "_id": id }).await?)
    }

    async fn upsert(&self, id: i32, record: &T) -> TodoResult<()> {
        self.inner
            .replace_one(doc! { "_id": id }, record)
            .upsert(true)
            .await?;
        Ok(())
    }

    async fn delete_by_id(&self, id: i32) -> TodoResult<bool> {
        let result = self.inner.delete_one(doc! { "_id": id }).await?;
        Ok(result.deleted_count > 0)
    }

    async fn max_id(&self) -> TodoResult<Option<i32>> {
        let newest = self
            .inner
            .clone_with_type::<Document>()
            .find_one(doc! {})
            .sort(doc! { "_id": -1 })
            .await?;

        Ok(newest.and_then(|d| match d.get("_id") {
            Some(Bson::Int32(id)) => Some(*id),
            Some(Bson::Int64(id)) => i32::try_from(*id).ok(),
            _ => None,
        }))
    }
}
