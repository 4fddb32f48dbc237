use std::sync::Arc;

use tracing::{info, instrument};
use validator::Validate;

use crate::error::TodoResult;
use crate::factory::Repositories;
use crate::models::{CreateTag, CreateTodo, Tag, Todo};
use crate::repository::{TagRepository, TodoRepository};

/// Use cases spanning both repositories.
///
/// Lookups that miss return `Ok(None)` rather than an error.
#[derive(Clone)]
pub struct TodoService {
    todos: Arc<dyn TodoRepository>,
    tags: Arc<dyn TagRepository>,
}

impl TodoService {
    pub fn new(todos: Arc<dyn TodoRepository>, tags: Arc<dyn TagRepository>) -> Self {
        Self { todos, tags }
    }

    pub fn from_repositories(repositories: &Repositories) -> Self {
        Self::new(repositories.todos.clone(), repositories.tags.clone())
    }

    #[instrument(skip(self))]
    pub async fn create_todo(&self, description: &str) -> TodoResult<Todo> {
        CreateTodo {
            description: description.to_owned(),
        }
        .validate()?;

        let todo = self.todos.save(Todo::new(description)?).await?;
        info!(todo_id = ?todo.id(), "Todo created");
        Ok(todo)
    }

    #[instrument(skip(self))]
    pub async fn create_tag(&self, name: &str) -> TodoResult<Tag> {
        CreateTag {
            name: name.to_owned(),
        }
        .validate()?;

        let tag = self.tags.save(Tag::new(name)?).await?;
        info!(tag_id = ?tag.id(), "Tag created");
        Ok(tag)
    }

    /// Link a tag to a todo and save both. `None` if either is missing.
    #[instrument(skip(self))]
    pub async fn add_tag_to_todo(&self, todo_id: i32, tag_id: i32) -> TodoResult<Option<Todo>> {
        let Some(mut todo) = self.todos.find_by_id(todo_id).await? else {
            return Ok(None);
        };
        let Some(mut tag) = self.tags.find_by_id(tag_id).await? else {
            return Ok(None);
        };

        todo.add_tag(&mut tag);
        let saved = self.todos.save(todo).await?;
        self.tags.save(tag).await?;
        Ok(Some(saved))
    }

    /// Unlink a tag from a todo and save both. `None` if either is missing.
    #[instrument(skip(self))]
    pub async fn remove_tag_from_todo(
        &self,
        todo_id: i32,
        tag_id: i32,
    ) -> TodoResult<Option<Todo>> {
        let Some(mut todo) = self.todos.find_by_id(todo_id).await? else {
            return Ok(None);
        };
        let Some(mut tag) = self.tags.find_by_id(tag_id).await? else {
            return Ok(None);
        };

        todo.remove_tag(&mut tag);
        let saved = self.todos.save(todo).await?;
        self.tags.save(tag).await?;
        Ok(Some(saved))
    }

    /// Blank or missing keyword lists everything
    #[instrument(skip(self))]
    pub async fn search_todos(&self, keyword: Option<&str>) -> TodoResult<Vec<Todo>> {
        match keyword.map(str::trim).filter(|k| !k.is_empty()) {
            Some(keyword) => self.todos.find_by_description_containing(keyword).await,
            None => self.todos.find_all().await,
        }
    }

    #[instrument(skip(self))]
    pub async fn mark_todo_complete(&self, id: i32) -> TodoResult<Option<Todo>> {
        self.update_todo(id, |todo| {
            todo.set_done(true);
            Ok(())
        })
        .await
    }

    #[instrument(skip(self))]
    pub async fn mark_todo_incomplete(&self, id: i32) -> TodoResult<Option<Todo>> {
        self.update_todo(id, |todo| {
            todo.set_done(false);
            Ok(())
        })
        .await
    }

    #[instrument(skip(self))]
    pub async fn toggle_todo_done(&self, id: i32) -> TodoResult<Option<Todo>> {
        self.update_todo(id, |todo| {
            todo.toggle_done();
            Ok(())
        })
        .await
    }

    #[instrument(skip(self))]
    pub async fn update_todo_description(
        &self,
        id: i32,
        description: &str,
    ) -> TodoResult<Option<Todo>> {
        CreateTodo {
            description: description.to_owned(),
        }
        .validate()?;

        self.update_todo(id, |todo| todo.set_description(description))
            .await
    }

    #[instrument(skip(self))]
    pub async fn rename_tag(&self, id: i32, name: &str) -> TodoResult<Option<Tag>> {
        CreateTag {
            name: name.to_owned(),
        }
        .validate()?;

        let Some(mut tag) = self.tags.find_by_id(id).await? else {
            return Ok(None);
        };
        tag.set_name(name)?;
        Ok(Some(self.tags.save(tag).await?))
    }

    /// Missing ids are ignored
    #[instrument(skip(self))]
    pub async fn delete_todo(&self, id: i32) -> TodoResult<()> {
        self.todos.delete_by_id(id).await
    }

    /// Todos keep existing; only their link to this tag goes away
    #[instrument(skip(self))]
    pub async fn delete_tag(&self, id: i32) -> TodoResult<()> {
        self.tags.delete_by_id(id).await
    }

    pub async fn get_all_todos(&self) -> TodoResult<Vec<Todo>> {
        self.todos.find_all().await
    }

    pub async fn get_all_tags(&self) -> TodoResult<Vec<Tag>> {
        self.tags.find_all().await
    }

    pub async fn get_todo(&self, id: i32) -> TodoResult<Option<Todo>> {
        self.todos.find_by_id(id).await
    }

    pub async fn get_tag(&self, id: i32) -> TodoResult<Option<Tag>> {
        self.tags.find_by_id(id).await
    }

    pub async fn get_todos_by_done(&self, done: bool) -> TodoResult<Vec<Todo>> {
        self.todos.find_by_done(done).await
    }

    pub async fn search_tags(&self, keyword: Option<&str>) -> TodoResult<Vec<Tag>> {
        match keyword.map(str::trim).filter(|k| !k.is_empty()) {
            Some(keyword) => self.tags.find_by_name_containing(keyword).await,
            None => self.tags.find_all().await,
        }
    }

    pub async fn find_tag_by_name(&self, name: &str) -> TodoResult<Option<Tag>> {
        self.tags.find_by_name(name).await
    }

    async fn update_todo<F>(&self, id: i32, change: F) -> TodoResult<Option<Todo>>
    where
        F: FnOnce(&mut Todo) -> TodoResult<()> + Send,
    {
        let Some(mut todo) = self.todos.find_by_id(id).await? else {
            return Ok(None);
        };
        change(&mut todo)?;
        Ok(Some(self.todos.save(todo).await?))
    }
}
