use std::collections::BTreeMap;
use std::marker::PhantomData;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use mongodb::bson::{self, Bson, Document};
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::{DocumentCollection, DocumentFilter};
use crate::error::{TodoError, TodoResult};

/// In-memory stand-in for a MongoDB collection.
///
/// Clones share storage, so a second repository built over a clone sees
/// everything the first one wrote.
pub struct MemoryCollection<T> {
    documents: Arc<Mutex<BTreeMap<i32, Document>>>,
    _record: PhantomData<fn() -> T>,
}

impl<T> Clone for MemoryCollection<T> {
    fn clone(&self) -> Self {
        Self {
            documents: self.documents.clone(),
            _record: PhantomData,
        }
    }
}

impl<T> MemoryCollection<T> {
    pub fn new() -> Self {
        Self {
            documents: Arc::new(Mutex::new(BTreeMap::new())),
            _record: PhantomData,
        }
    }

    pub fn len(&self) -> usize {
        self.lock().map(|d| d.len()).unwrap_or(0)
    }

    /// Write a raw document, bypassing the repository
    pub fn insert_raw(&self, id: i32, document: Document) {
        if let Ok(mut docs) = self.lock() {
            docs.insert(id, document);
        }
    }

    fn lock(&self) -> TodoResult<std::sync::MutexGuard<'_, BTreeMap<i32, Document>>> {
        self.documents
            .lock()
            .map_err(|_| TodoError::Internal("memory collection poisoned".into()))
    }
}

fn matches(document: &Document, filter: &DocumentFilter) -> bool {
    match filter {
        DocumentFilter::All => true,
        DocumentFilter::Eq(field, value) => document.get(*field) == Some(value),
        DocumentFilter::ContainsIgnoreCase(field, keyword) => match document.get(*field) {
            Some(Bson::String(text)) => text.to_lowercase().contains(&keyword.to_lowercase()),
            _ => false,
        },
    }
}

#[async_trait]
impl<T> DocumentCollection<T> for MemoryCollection<T>
where
    T: Serialize + DeserializeOwned + Send + Sync,
{
    async fn find(&self, filter: DocumentFilter) -> TodoResult<Vec<T>> {
        let docs = self.lock()?;
        let records: TodoResult<Vec<T>> = docs
            .values()
            .filter(|d| matches(d, &filter))
            .map(|d| bson::from_document(d.clone()).map_err(TodoError::from))
            .collect();
        records
    }

    async fn find_by_id(&self, id: i32) -> TodoResult<Option<T>> {
        let document = self.lock()?.get(&id).cloned();
        document
            .map(|d| bson::from_document(d).map_err(TodoError::from))
            .transpose()
    }

    async fn upsert(&self, id: i32, record: &T) -> TodoResult<()> {
        let document = bson::to_document(record)?;
        self.lock()?.insert(id, document);
        Ok(())
    }

    async fn delete_by_id(&self, id: i32) -> TodoResult<bool> {
        Ok(self.lock()?.remove(&id).is_some())
    }

    async fn max_id(&self) -> TodoResult<Option<i32>> {
        Ok(self.lock()?.keys().next_back().copied())
    }
}
