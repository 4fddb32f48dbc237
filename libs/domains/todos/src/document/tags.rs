use std::sync::Arc;
use std::sync::atomic::{AtomicI32, Ordering};

use async_trait::async_trait;
use mongodb::Database;
use mongodb::bson::Bson;
use tracing::{debug, info, instrument, warn};

use super::{
    DocumentCollection, DocumentFilter, MongoCollection, TAGS_COLLECTION, TagDocument, exhausted,
    next_after,
};
use crate::error::TodoResult;
use crate::models::Tag;
use crate::repository::TagRepository;

/// Tag repository over the `tags` collection.
///
/// Without a collection the repository runs disconnected: reads are empty,
/// deletes do nothing and `save` only assigns an id.
pub struct MongoTagRepository {
    collection: Option<Arc<dyn DocumentCollection<TagDocument>>>,
    next_id: AtomicI32,
}

impl MongoTagRepository {
    pub async fn new(db: &Database) -> TodoResult<Self> {
        Self::with_collection(MongoCollection::shared(db, TAGS_COLLECTION)).await
    }

    /// Build over any collection, resuming the id sequence after its highest `_id`
    pub async fn with_collection(
        collection: Arc<dyn DocumentCollection<TagDocument>>,
    ) -> TodoResult<Self> {
        let next_id = match collection.max_id().await? {
            Some(max) => next_after(max, TAGS_COLLECTION)?,
            None => 1,
        };
        debug!(next_id, "Tag id sequence resumed");

        Ok(Self {
            collection: Some(collection),
            next_id: AtomicI32::new(next_id),
        })
    }

    pub fn disconnected() -> Self {
        Self {
            collection: None,
            next_id: AtomicI32::new(1),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.collection.is_some()
    }

    /// The id to store under, drawing a new one for unsaved tags
    fn claim_id(&self, tag: &mut Tag) -> TodoResult<i32> {
        match tag.id() {
            Some(id) => {
                let next = next_after(id, TAGS_COLLECTION)?;
                self.next_id.fetch_max(next, Ordering::SeqCst);
                Ok(id)
            }
            None => {
                let id = self
                    .next_id
                    .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |id| id.checked_add(1))
                    .map_err(|_| exhausted(TAGS_COLLECTION))?;
                tag.assign_id(id);
                Ok(id)
            }
        }
    }

    async fn find(&self, filter: DocumentFilter) -> TodoResult<Vec<Tag>> {
        let Some(collection) = &self.collection else {
            return Ok(Vec::new());
        };

        let records = collection.find(filter).await?;
        Ok(records.into_iter().map(Tag::from).collect())
    }
}

impl From<TagDocument> for Tag {
    fn from(record: TagDocument) -> Self {
        Tag::restore(Some(record.id), record.name)
    }
}

#[async_trait]
impl TagRepository for MongoTagRepository {
    #[instrument(skip(self))]
    async fn find_all(&self) -> TodoResult<Vec<Tag>> {
        self.find(DocumentFilter::All).await
    }

    #[instrument(skip(self))]
    async fn find_by_id(&self, id: i32) -> TodoResult<Option<Tag>> {
        let Some(collection) = &self.collection else {
            return Ok(None);
        };

        Ok(collection.find_by_id(id).await?.map(Tag::from))
    }

    #[instrument(skip(self, tag), fields(tag_id = ?tag.id()))]
    async fn save(&self, mut tag: Tag) -> TodoResult<Tag> {
        let id = self.claim_id(&mut tag)?;

        let Some(collection) = &self.collection else {
            warn!(tag_id = id, "MongoDB disconnected, tag not persisted");
            return Ok(tag);
        };

        let record = TagDocument {
            id,
            name: tag.name().to_owned(),
        };
        collection.upsert(id, &record).await?;
        info!(tag_id = id, "Saved tag");
        Ok(tag)
    }

    #[instrument(skip(self, tag), fields(tag_id = ?tag.id()))]
    async fn delete(&self, tag: &Tag) -> TodoResult<()> {
        match tag.id() {
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
            info!(tag_id = id, "Deleted tag");
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn find_by_name(&self, name: &str) -> TodoResult<Option<Tag>> {
        let tags = self
            .find(DocumentFilter::Eq("name", Bson::String(name.to_owned())))
            .await?;
        Ok(tags.into_iter().next())
    }

    #[instrument(skip(self))]
    async fn find_by_name_containing(&self, keyword: &str) -> TodoResult<Vec<Tag>> {
        self.find(DocumentFilter::ContainsIgnoreCase("name", keyword.to_owned()))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::memory::MemoryCollection;
    use crate::error::TodoError;
    use mongodb::bson::doc;

    async fn repo(storage: &MemoryCollection<TagDocument>) -> MongoTagRepository {
        MongoTagRepository::with_collection(Arc::new(storage.clone()))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_save_assigns_sequential_ids() {
        let storage = MemoryCollection::new();
        let tags = repo(&storage).await;

        let a = tags.save(Tag::new("a").unwrap()).await.unwrap();
        let b = tags.save(Tag::new("b").unwrap()).await.unwrap();
        assert_eq!(a.id(), Some(1));
        assert_eq!(b.id(), Some(2));
        assert_eq!(storage.len(), 2);
    }

    #[tokio::test]
    async fn test_sequence_resumes_after_highest_id() {
        let storage = MemoryCollection::new();
        {
            let tags = repo(&storage).await;
            tags.save(Tag::new("first").unwrap()).await.unwrap();
            tags.save(Tag::new("second").unwrap()).await.unwrap();
        }

        let fresh = repo(&storage).await;
        let third = fresh.save(Tag::new("third").unwrap()).await.unwrap();
        assert_eq!(third.id(), Some(3));
    }

    #[tokio::test]
    async fn test_save_returns_argument_and_is_idempotent() {
        let storage = MemoryCollection::new();
        let tags = repo(&storage).await;

        let saved = tags.save(Tag::new("same").unwrap()).await.unwrap();
        let again = tags.save(saved.clone()).await.unwrap();
        assert_eq!(again, saved);
        assert_eq!(storage.len(), 1);

        let mut renamed = again;
        renamed.set_name("renamed").unwrap();
        tags.save(renamed).await.unwrap();
        let found = tags.find_by_id(saved.id().unwrap()).await.unwrap().unwrap();
        assert_eq!(found.name(), "renamed");
    }

    #[tokio::test]
    async fn test_explicit_id_advances_sequence() {
        let storage = MemoryCollection::new();
        let tags = repo(&storage).await;

        tags.save(Tag::restore(Some(10), "imported".into()))
            .await
            .unwrap();
        let next = tags.save(Tag::new("next").unwrap()).await.unwrap();
        assert_eq!(next.id(), Some(11));
    }

    #[tokio::test]
    async fn test_sequence_exhaustion_is_an_error() {
        let storage = MemoryCollection::new();
        let tags = repo(&storage).await;

        let result = tags.save(Tag::restore(Some(i32::MAX), "last".into())).await;
        assert!(matches!(result, Err(TodoError::Internal(_))));
        assert_eq!(storage.len(), 0);

        tags.save(Tag::restore(Some(i32::MAX - 1), "almost".into()))
            .await
            .unwrap();
        let result = tags.save(Tag::new("one too many").unwrap()).await;
        assert!(matches!(result, Err(TodoError::Internal(_))));
        assert_eq!(storage.len(), 1);
    }

    #[tokio::test]
    async fn test_resuming_after_max_id_is_an_error() {
        let storage = MemoryCollection::<TagDocument>::new();
        storage.insert_raw(i32::MAX, doc! { "_id": i32::MAX, "name": "last" });

        let result = MongoTagRepository::with_collection(Arc::new(storage)).await;
        assert!(matches!(result, Err(TodoError::Internal(_))));
    }

    #[tokio::test]
    async fn test_finders() {
        let storage = MemoryCollection::new();
        let tags = repo(&storage).await;
        for name in ["Work", "homework", "garden"] {
            tags.save(Tag::new(name).unwrap()).await.unwrap();
        }

        assert_eq!(tags.find_all().await.unwrap().len(), 3);
        assert!(tags.find_by_name("Work").await.unwrap().is_some());
        assert!(tags.find_by_name("work").await.unwrap().is_none());

        let names: Vec<String> = tags
            .find_by_name_containing("WORK")
            .await
            .unwrap()
            .iter()
            .map(|t| t.name().to_owned())
            .collect();
        assert_eq!(names, vec!["Work", "homework"]);
    }

    #[tokio::test]
    async fn test_delete_by_id_missing_is_noop() {
        let storage = MemoryCollection::new();
        let tags = repo(&storage).await;
        let kept = tags.save(Tag::new("kept").unwrap()).await.unwrap();

        tags.delete_by_id(999_999).await.unwrap();
        assert_eq!(storage.len(), 1);

        tags.delete(&kept).await.unwrap();
        assert_eq!(storage.len(), 0);
    }

    #[tokio::test]
    async fn test_disconnected_repository() {
        let tags = MongoTagRepository::disconnected();
        assert!(!tags.is_connected());

        let saved = tags.save(Tag::new("offline").unwrap()).await.unwrap();
        assert_eq!(saved.id(), Some(1));
        assert!(tags.find_all().await.unwrap().is_empty());
        assert!(tags.find_by_id(1).await.unwrap().is_none());
        assert!(tags.find_by_name("offline").await.unwrap().is_none());
        tags.delete_by_id(1).await.unwrap();
    }
}
