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
use crate::repository::TagRepository;

/// Tag repository over SeaORM.
///
/// Tags are the inverse side of the link: their `todos` are loaded from
/// `todo_tags` but saving a tag never rewrites those rows.
pub struct SeaTagRepository {
    ctx: Arc<PersistenceContext>,
}

impl SeaTagRepository {
    pub fn new(ctx: Arc<PersistenceContext>) -> Self {
        Self { ctx }
    }
}

async fn load<C: ConnectionTrait>(
    conn: &C,
    select: Select<tag::Entity>,
) -> Result<Vec<Tag>, DbErr> {
    let rows = select
        .order_by_asc(tag::Column::Id)
        .find_with_related(todo::Entity)
        .all(conn)
        .await?;

    Ok(rows
        .into_iter()
        .map(|(model, todos)| Tag::from(model).with_todos(todos.into_iter().map(Todo::from)))
        .collect())
}

async fn load_one<C: ConnectionTrait>(conn: &C, id: i32) -> Result<Option<Tag>, DbErr> {
    Ok(load(conn, tag::Entity::find_by_id(id)).await?.into_iter().next())
}

async fn save<C: ConnectionTrait>(conn: &C, mut tag: Tag) -> Result<Tag, DbErr> {
    let Some(id) = tag.id() else {
        let model = tag::ActiveModel {
            name: Set(tag.name().to_owned()),
            ..Default::default()
        }
        .insert(conn)
        .await?;

        tag.assign_id(model.id);
        info!(tag_id = model.id, "Created tag");
        return Ok(tag);
    };

    let active = tag::ActiveModel {
        id: Set(id),
        name: Set(tag.name().to_owned()),
    };
    if tag::Entity::find_by_id(id).one(conn).await?.is_some() {
        active.update(conn).await?;
    } else {
        tag::Entity::insert(active).exec_without_returning(conn).await?;
    }
    info!(tag_id = id, "Merged tag");

    load_one(conn, id)
        .await?
        .ok_or_else(|| DbErr::RecordNotFound(format!("tag {id} vanished during save")))
}

async fn remove<C: ConnectionTrait>(conn: &C, id: i32) -> Result<bool, DbErr> {
    if tag::Entity::find_by_id(id).one(conn).await?.is_none() {
        return Ok(false);
    }

    todo_tag::Entity::delete_many()
        .filter(todo_tag::Column::TagId.eq(id))
        .exec(conn)
        .await?;
    tag::Entity::delete_by_id(id).exec(conn).await?;
    Ok(true)
}

#[async_trait]
impl TagRepository for SeaTagRepository {
    #[instrument(skip(self))]
    async fn find_all(&self) -> TodoResult<Vec<Tag>> {
        let tags = with_connection!(self.ctx, conn => load(conn, tag::Entity::find()).await)?;
        Ok(tags)
    }

    #[instrument(skip(self))]
    async fn find_by_id(&self, id: i32) -> TodoResult<Option<Tag>> {
        let tag = with_connection!(self.ctx, conn => load_one(conn, id).await)?;
        Ok(tag)
    }

    #[instrument(skip(self, tag), fields(tag_id = ?tag.id()))]
    async fn save(&self, tag: Tag) -> TodoResult<Tag> {
        let saved = with_connection!(self.ctx, conn => save(conn, tag).await)?;
        Ok(saved)
    }

    #[instrument(skip(self, tag), fields(tag_id = ?tag.id()))]
    async fn delete(&self, tag: &Tag) -> TodoResult<()> {
        match tag.id() {
            Some(id) => self.delete_by_id(id).await,
            None => {
                debug!("Ignoring delete of unsaved tag");
                Ok(())
            }
        }
    }

    #[instrument(skip(self))]
    async fn delete_by_id(&self, id: i32) -> TodoResult<()> {
        let deleted = with_connection!(self.ctx, conn => remove(conn, id).await)?;
        if deleted {
            info!(tag_id = id, "Deleted tag");
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn find_by_name(&self, name: &str) -> TodoResult<Option<Tag>> {
        let select = tag::Entity::find().filter(tag::Column::Name.eq(name));
        let tags = with_connection!(self.ctx, conn => load(conn, select).await)?;
        Ok(tags.into_iter().next())
    }

    #[instrument(skip(self))]
    async fn find_by_name_containing(&self, keyword: &str) -> TodoResult<Vec<Tag>> {
        let select = filter_contains(
            tag::Entity::find(),
            self.ctx.connection().get_database_backend(),
            r#""tags"."name""#,
            keyword,
        );
        let tags = with_connection!(self.ctx, conn => load(conn, select).await)?;
        Ok(tags
            .into_iter()
            .filter(|t| contains_ignore_case(t.name(), keyword))
            .collect())
    }
}
