use std::sync::Arc;

use async_trait::async_trait;
use sea_orm::ActiveValue::Set;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
    Select,
};
use tracing::{debug, info, instrument};

use super::{PersistenceContext, contains_ignore_case, filter_contains};
use crate::entity::{tag, todo, todo_tag};
use crate::error::TodoResult;
use crate::models::{Tag, Todo};
use crate::repository::TodoRepository;

/// Todo repository over SeaORM. Todos own the `todo_tags` rows.
pub struct SeaTodoRepository {
    ctx: Arc<PersistenceContext>,
}

impl SeaTodoRepository {
    pub fn new(ctx: Arc<PersistenceContext>) -> Self {
        Self { ctx }
    }
}

async fn load<C: ConnectionTrait>(
    conn: &C,
    select: Select<todo::Entity>,
) -> Result<Vec<Todo>, DbErr> {
    let rows = select
        .order_by_asc(todo::Column::Id)
        .find_with_related(tag::Entity)
        .all(conn)
        .await?;

    Ok(rows
        .into_iter()
        .map(|(model, tags)| Todo::from(model).with_tags(tags.into_iter().map(Tag::from)))
        .collect())
}

async fn load_one<C: ConnectionTrait>(conn: &C, id: i32) -> Result<Option<Todo>, DbErr> {
    Ok(load(conn, todo::Entity::find_by_id(id)).await?.into_iter().next())
}

async fn replace_links<C: ConnectionTrait>(
    conn: &C,
    todo_id: i32,
    tag_ids: &[i32],
) -> Result<(), DbErr> {
    todo_tag::Entity::delete_many()
        .filter(todo_tag::Column::TodoId.eq(todo_id))
        .exec(conn)
        .await?;

    if tag_ids.is_empty() {
        return Ok(());
    }

    let rows = tag_ids.iter().map(|&tag_id| todo_tag::ActiveModel {
        todo_id: Set(todo_id),
        tag_id: Set(tag_id),
    });
    todo_tag::Entity::insert_many(rows)
        .exec_without_returning(conn)
        .await?;
    Ok(())
}

async fn save<C: ConnectionTrait>(
    conn: &C,
    mut todo: Todo,
    tag_ids: Vec<i32>,
) -> Result<Todo, DbErr> {
    let Some(id) = todo.id() else {
        let model = todo::ActiveModel {
            description: Set(todo.description().to_owned()),
            done: Set(todo.is_done()),
            ..Default::default()
        }
        .insert(conn)
        .await?;

        replace_links(conn, model.id, &tag_ids).await?;
        todo.assign_id(model.id);
        info!(todo_id = model.id, "Created todo");
        return Ok(todo);
    };

    let active = todo::ActiveModel {
        id: Set(id),
        description: Set(todo.description().to_owned()),
        done: Set(todo.is_done()),
    };
    if todo::Entity::find_by_id(id).one(conn).await?.is_some() {
        active.update(conn).await?;
    } else {
        todo::Entity::insert(active).exec_without_returning(conn).await?;
    }
    replace_links(conn, id, &tag_ids).await?;
    info!(todo_id = id, "Merged todo");

    load_one(conn, id)
        .await?
        .ok_or_else(|| DbErr::RecordNotFound(format!("todo {id} vanished during save")))
}

async fn remove<C: ConnectionTrait>(conn: &C, id: i32) -> Result<bool, DbErr> {
    if todo::Entity::find_by_id(id).one(conn).await?.is_none() {
        return Ok(false);
    }

    todo_tag::Entity::delete_many()
        .filter(todo_tag::Column::TodoId.eq(id))
        .exec(conn)
        .await?;
    todo::Entity::delete_by_id(id).exec(conn).await?;
    Ok(true)
}

#[async_trait]
impl TodoRepository for SeaTodoRepository {
    #[instrument(skip(self))]
    async fn find_all(&self) -> TodoResult<Vec<Todo>> {
        let todos = with_connection!(self.ctx, conn => load(conn, todo::Entity::find()).await)?;
        Ok(todos)
    }

    #[instrument(skip(self))]
    async fn find_by_id(&self, id: i32) -> TodoResult<Option<Todo>> {
        let todo = with_connection!(self.ctx, conn => load_one(conn, id).await)?;
        Ok(todo)
    }

    #[instrument(skip(self, todo), fields(todo_id = ?todo.id()))]
    async fn save(&self, todo: Todo) -> TodoResult<Todo> {
        let tag_ids = todo.persisted_tag_ids()?;
        let saved = with_connection!(self.ctx, conn => save(conn, todo, tag_ids).await)?;
        Ok(saved)
    }

    #[instrument(skip(self, todo), fields(todo_id = ?todo.id()))]
    async fn delete(&self, todo: &Todo) -> TodoResult<()> {
        match todo.id() {
            Some(id) => self.delete_by_id(id).await,
            None => {
                debug!("Ignoring delete of unsaved todo");
                Ok(())
            }
        }
    }

    #[instrument(skip(self))]
    async fn delete_by_id(&self, id: i32) -> TodoResult<()> {
        let deleted = with_connection!(self.ctx, conn => remove(conn, id).await)?;
        if deleted {
            info!(todo_id = id, "Deleted todo");
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn find_by_done(&self, done: bool) -> TodoResult<Vec<Todo>> {
        let select = todo::Entity::find().filter(todo::Column::Done.eq(done));
        let todos = with_connection!(self.ctx, conn => load(conn, select).await)?;
        Ok(todos)
    }

    #[instrument(skip(self))]
    async fn find_by_description_containing(&self, keyword: &str) -> TodoResult<Vec<Todo>> {
        let select = filter_contains(
            todo::Entity::find(),
            self.ctx.connection().get_database_backend(),
            r#""todos"."description""#,
            keyword,
        );
        let todos = with_connection!(self.ctx, conn => load(conn, select).await)?;
        Ok(todos
            .into_iter()
            .filter(|t| contains_ignore_case(t.description(), keyword))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relational::SeaTagRepository;
    use crate::relational::testing::context;
    use crate::repository::TagRepository;

    async fn repos() -> (SeaTodoRepository, SeaTagRepository) {
        let ctx = context().await;
        (SeaTodoRepository::new(ctx.clone()), SeaTagRepository::new(ctx))
    }

    #[tokio::test]
    async fn test_insert_returns_same_instance_with_id() {
        let (todos, _) = repos().await;
        let todo = Todo::new("Buy milk").unwrap();
        let copy = todo.clone();

        let saved = todos.save(todo).await.unwrap();
        assert!(saved.id().is_some());
        assert_ne!(saved, copy);

        let found = todos.find_by_id(saved.id().unwrap()).await.unwrap().unwrap();
        assert_eq!(found, saved);
        assert_eq!(found.description(), "Buy milk");
        assert!(!found.is_done());
    }

    #[tokio::test]
    async fn test_save_with_id_merges_and_reloads() {
        let (todos, _) = repos().await;
        let mut saved = todos.save(Todo::new("Draft").unwrap()).await.unwrap();
        let id = saved.id().unwrap();

        saved.set_description("Final").unwrap();
        saved.set_done(true);
        let merged = todos.save(saved).await.unwrap();
        assert_eq!(merged.id(), Some(id));

        let again = todos.save(merged.clone()).await.unwrap();
        assert_eq!(again, merged);

        let all = todos.find_all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].description(), "Final");
        assert!(all[0].is_done());
    }

    #[tokio::test]
    async fn test_links_are_visible_from_both_sides() {
        let (todos, tags) = repos().await;
        let mut todo = todos.save(Todo::new("Pack bags").unwrap()).await.unwrap();
        let mut tag = tags.save(Tag::new("travel").unwrap()).await.unwrap();

        todo.add_tag(&mut tag);
        let todo = todos.save(todo).await.unwrap();
        assert_eq!(todo.tag_names(), vec!["travel".to_string()]);

        let tag = tags.find_by_id(tag.id().unwrap()).await.unwrap().unwrap();
        assert!(tag.has_todo(&todo));
    }

    #[tokio::test]
    async fn test_unsaved_tag_cannot_be_linked() {
        let (todos, _) = repos().await;
        let mut todo = Todo::new("Orphan link").unwrap();
        let mut tag = Tag::new("unsaved").unwrap();
        todo.add_tag(&mut tag);

        let result = todos.save(todo).await;
        assert!(matches!(result, Err(crate::TodoError::Validation(_))));
        assert!(todos.find_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_find_by_done() {
        let (todos, _) = repos().await;
        let mut done = Todo::new("Finished").unwrap();
        done.set_done(true);
        todos.save(done).await.unwrap();
        todos.save(Todo::new("Open").unwrap()).await.unwrap();

        let finished = todos.find_by_done(true).await.unwrap();
        assert_eq!(finished.len(), 1);
        assert_eq!(finished[0].description(), "Finished");
        assert_eq!(todos.find_by_done(false).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_search_is_case_insensitive() {
        let (todos, _) = repos().await;
        for d in ["Buy groceries", "Buy tickets", "Call mom"] {
            todos.save(Todo::new(d).unwrap()).await.unwrap();
        }

        let found = todos.find_by_description_containing("buy").await.unwrap();
        let descriptions: Vec<&str> = found.iter().map(|t| t.description()).collect();
        assert_eq!(descriptions, vec!["Buy groceries", "Buy tickets"]);

        assert_eq!(todos.find_by_description_containing("MOM").await.unwrap().len(), 1);
        assert!(todos.find_by_description_containing("xyz").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_search_folds_non_ascii_case() {
        let (todos, _) = repos().await;
        todos.save(Todo::new("École run").unwrap()).await.unwrap();
        todos.save(Todo::new("Buy groceries").unwrap()).await.unwrap();

        for keyword in ["école", "ÉCOLE", "École"] {
            let found = todos.find_by_description_containing(keyword).await.unwrap();
            let descriptions: Vec<&str> = found.iter().map(|t| t.description()).collect();
            assert_eq!(descriptions, vec!["École run"], "keyword {keyword}");
        }
    }

    #[tokio::test]
    async fn test_search_matches_wildcards_literally() {
        let (todos, _) = repos().await;
        for d in ["Buy groceries", "Call mom", "100 percent", "rename snake_case", "50% off"] {
            todos.save(Todo::new(d).unwrap()).await.unwrap();
        }

        let underscore = todos.find_by_description_containing("_").await.unwrap();
        let descriptions: Vec<&str> = underscore.iter().map(|t| t.description()).collect();
        assert_eq!(descriptions, vec!["rename snake_case"]);

        let percent = todos.find_by_description_containing("%").await.unwrap();
        let descriptions: Vec<&str> = percent.iter().map(|t| t.description()).collect();
        assert_eq!(descriptions, vec!["50% off"]);
    }

    #[tokio::test]
    async fn test_delete_removes_todo_and_links() {
        let (todos, tags) = repos().await;
        let mut todo = todos.save(Todo::new("Temp").unwrap()).await.unwrap();
        let mut tag = tags.save(Tag::new("t").unwrap()).await.unwrap();
        todo.add_tag(&mut tag);
        let todo = todos.save(todo).await.unwrap();

        todos.delete(&todo).await.unwrap();
        assert!(todos.find_by_id(todo.id().unwrap()).await.unwrap().is_none());

        let tag = tags.find_by_id(tag.id().unwrap()).await.unwrap().unwrap();
        assert!(tag.todos().is_empty());
    }

    #[tokio::test]
    async fn test_delete_missing_or_unsaved_is_noop() {
        let (todos, _) = repos().await;
        todos.save(Todo::new("Keep").unwrap()).await.unwrap();

        todos.delete_by_id(999_999).await.unwrap();
        todos.delete(&Todo::new("Never saved").unwrap()).await.unwrap();

        assert_eq!(todos.find_all().await.unwrap().len(), 1);
    }
}
