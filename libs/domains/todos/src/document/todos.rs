use std::sync::Arc;
use std::sync::atomic::{AtomicI32, Ordering};

use async_trait::async_trait;
use mongodb::Database;
use mongodb::bson::Bson;
use tracing::{debug, info, instrument, warn};

use super::{
    DocumentCollection, DocumentFilter, MongoCollection, MongoTagRepository, TODOS_COLLECTION,
    TodoDocument, exhausted, next_after,
};
use crate::error::TodoResult;
use crate::models::Todo;
use crate::repository::TagRepository;
use crate::repository::TodoRepository;

/// Todo repository over the `todos` collection.
///
/// Holds the tag repository to turn stored `tag_ids` back into tags. Ids that
/// no longer resolve are dropped from the loaded todo and disappear from
/// storage the next time that todo is saved.
pub struct MongoTodoRepository {
    collection: Option<Arc<dyn DocumentCollection<TodoDocument>>>,
    next_id: AtomicI32,
    tags: Arc<MongoTagRepository>,
}

impl MongoTodoRepository {
    pub async fn new(db: &Database, tags: Arc<MongoTagRepository>) -> TodoResult<Self> {
        Self::with_collection(MongoCollection::shared(db, TODOS_COLLECTION), tags).await
    }

    /// Build over any collection, resuming the id sequence after its highest `_id`
    pub async fn with_collection(
        collection: Arc<dyn DocumentCollection<TodoDocument>>,
        tags: Arc<MongoTagRepository>,
    ) -> TodoResult<Self> {
        let next_id = match collection.max_id().await? {
            Some(max) => next_after(max, TODOS_COLLECTION)?,
            None => 1,
        };
        debug!(next_id, "Todo id sequence resumed");

        Ok(Self {
            collection: Some(collection),
            next_id: AtomicI32::new(next_id),
            tags,
        })
    }

    pub fn disconnected(tags: Arc<MongoTagRepository>) -> Self {
        Self {
            collection: None,
            next_id: AtomicI32::new(1),
            tags,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.collection.is_some()
    }

    /// The id to store under, drawing a new one for unsaved todos
    fn claim_id(&self, todo: &mut Todo) -> TodoResult<i32> {
        match todo.id() {
            Some(id) => {
                let next = next_after(id, TODOS_COLLECTION)?;
                self.next_id.fetch_max(next, Ordering::SeqCst);
                Ok(id)
            }
            None => {
                let id = self
                    .next_id
                    .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |id| id.checked_add(1))
                    .map_err(|_| exhausted(TODOS_COLLECTION))?;
                todo.assign_id(id);
                Ok(id)
            }
        }
    }

    async fn hydrate(&self, record: TodoDocument) -> TodoResult<Todo> {
        let mut tags = Vec::with_capacity(record.tag_ids.len());
        for tag_id in &record.tag_ids {
            match self.tags.find_by_id(*tag_id).await? {
                Some(tag) => tags.push(tag),
                None => debug!(todo_id = record.id, tag_id, "Skipping dangling tag reference"),
            }
        }

        Ok(Todo::restore(Some(record.id), record.description, record.done).with_tags(tags))
    }

    async fn find(&self, filter: DocumentFilter) -> TodoResult<Vec<Todo>> {
        let Some(collection) = &self.collection else {
            return Ok(Vec::new());
        };

        let mut todos = Vec::new();
        for record in collection.find(filter).await? {
            todos.push(self.hydrate(record).await?);
        }
        Ok(todos)
    }
}

#[async_trait]
impl TodoRepository for MongoTodoRepository {
    #[instrument(skip(self))]
    async fn find_all(&self) -> TodoResult<Vec<Todo>> {
        self.find(DocumentFilter::All).await
    }

    #[instrument(skip(self))]
    async fn find_by_id(&self, id: i32) -> TodoResult<Option<Todo>> {
        let Some(collection) = &self.collection else {
            return Ok(None);
        };

        match collection.find_by_id(id).await? {
            Some(record) => Ok(Some(self.hydrate(record).await?)),
            None => Ok(None),
        }
    }

    #[instrument(skip(self, todo), fields(todo_id = ?todo.id()))]
    async fn save(&self, mut todo: Todo) -> TodoResult<Todo> {
        let tag_ids = todo.persisted_tag_ids()?;
        let id = self.claim_id(&mut todo)?;

        let Some(collection) = &self.collection else {
            warn!(todo_id = id, "MongoDB disconnected, todo not persisted");
            return Ok(todo);
        };

        let record = TodoDocument {
            id,
            description: todo.description().to_owned(),
            done: todo.is_done(),
            tag_ids,
        };
        collection.upsert(id, &record).await?;
        info!(todo_id = id, "Saved todo");
        Ok(todo)
    }

    #[instrument(skip(self, todo), fields(todo_id = ?todo.id()))]
    async fn delete(&self, todo: &Todo) -> TodoResult<()> {
        match todo.id() {
            Some(id) => self.delete_by_id(id).await,
            None => Ok(()),
        }
    }

    #[instrument(skip(self))]
    async fn delete_by_id(&self, id: i32) -> TodoResult<()> {
        let Some(collection) = &self.collection else {
            return Ok(());
        };

        if collection.delete_by_id(id).await? {
            info!(todo_id = id, "Deleted todo");
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn find_by_done(&self, done: bool) -> TodoResult<Vec<Todo>> {
        self.find(DocumentFilter::Eq("done", Bson::Boolean(done)))
            .await
    }

    #[instrument(skip(self))]
    async fn find_by_description_containing(&self, keyword: &str) -> TodoResult<Vec<Todo>> {
        self.find(DocumentFilter::ContainsIgnoreCase(
            "description",
            keyword.to_owned(),
        ))
        .await
    }
}
