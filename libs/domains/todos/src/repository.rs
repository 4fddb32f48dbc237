use async_trait::async_trait;

use crate::error::TodoResult;
use crate::models::{Tag, Todo};

/// Persistence interface for todos
///
/// Finders never fail for "not found"; they return an empty list or `None`.
/// `save` inserts when the todo has no id and updates otherwise. Always keep
/// using the instance it returns: depending on the backend it may be a
/// freshly loaded copy rather than the argument.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TodoRepository: Send + Sync {
    async fn find_all(&self) -> TodoResult<Vec<Todo>>;

    async fn find_by_id(&self, id: i32) -> TodoResult<Option<Todo>>;

    async fn save(&self, todo: Todo) -> TodoResult<Todo>;

    /// Delete by the entity's id; a todo without id is ignored
    async fn delete(&self, todo: &Todo) -> TodoResult<()>;

    /// Missing ids are a silent no-op
    async fn delete_by_id(&self, id: i32) -> TodoResult<()>;

    async fn find_by_done(&self, done: bool) -> TodoResult<Vec<Todo>>;

    /// Case-insensitive substring match on the description
    async fn find_by_description_containing(&self, keyword: &str) -> TodoResult<Vec<Todo>>;
}

/// Persistence interface for tags
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TagRepository: Send + Sync {
    async fn find_all(&self) -> TodoResult<Vec<Tag>>;

    async fn find_by_id(&self, id: i32) -> TodoResult<Option<Tag>>;

    async fn save(&self, tag: Tag) -> TodoResult<Tag>;

    async fn delete(&self, tag: &Tag) -> TodoResult<()>;

    async fn delete_by_id(&self, id: i32) -> TodoResult<()>;

    /// Exact name match; the lowest id wins if names repeat
    async fn find_by_name(&self, name: &str) -> TodoResult<Option<Tag>>;

    /// Case-insensitive substring match on the name
    async fn find_by_name_containing(&self, keyword: &str) -> TodoResult<Vec<Tag>>;
}
