use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};

use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::error::{TodoError, TodoResult};

/// A task with a description and a completion flag.
///
/// Equality follows persistence identity: two todos are equal when both carry
/// the same id. A todo without an id is only equal to itself (or a clone of
/// itself). Hashing uses the description alone so that assigning an id on
/// save never moves a todo to a different hash bucket.
///
/// Tags held by a todo are shallow: their own `todos` set is empty.
#[derive(Debug, Clone)]
pub struct Todo {
    id: Option<i32>,
    description: String,
    done: bool,
    tags: HashSet<Tag>,
    instance: Uuid,
}

/// A named label attachable to many todos.
///
/// Same identity rules as [`Todo`], hashing on the name.
#[derive(Debug, Clone)]
pub struct Tag {
    id: Option<i32>,
    name: String,
    todos: HashSet<Todo>,
    instance: Uuid,
}

impl Todo {
    /// New transient todo; fails when the description is blank
    pub fn new(description: impl Into<String>) -> TodoResult<Self> {
        let description = description.into();
        ensure_not_blank("description", &description)?;

        Ok(Self::restore(None, description, false))
    }

    /// Rebuild a stored todo without validation
    pub(crate) fn restore(id: Option<i32>, description: String, done: bool) -> Self {
        Self {
            id,
            description,
            done,
            tags: HashSet::new(),
            instance: Uuid::new_v4(),
        }
    }

    pub fn id(&self) -> Option<i32> {
        self.id
    }

    pub(crate) fn assign_id(&mut self, id: i32) {
        self.id = Some(id);
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn set_description(&mut self, description: impl Into<String>) -> TodoResult<()> {
        let description = description.into();
        ensure_not_blank("description", &description)?;
        self.description = description;
        Ok(())
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    pub fn set_done(&mut self, done: bool) {
        self.done = done;
    }

    /// Flip the completion flag and return the new value
    pub fn toggle_done(&mut self) -> bool {
        self.done = !self.done;
        self.done
    }

    /// Copy of the tag set; changes to it do not reach this todo
    pub fn tags(&self) -> HashSet<Tag> {
        self.tags.clone()
    }

    pub fn has_tag(&self, tag: &Tag) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Tag names in alphabetical order
    pub fn tag_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tags.iter().map(|t| t.name.clone()).collect();
        names.sort();
        names
    }

    /// Replace the tag set. `None` clears it.
    ///
    /// Only this side changes; the tags passed in are not updated.
    pub fn set_tags(&mut self, tags: Option<HashSet<Tag>>) {
        self.tags = tags
            .unwrap_or_default()
            .iter()
            .map(Tag::shallow)
            .collect();
    }

    /// Link a tag, updating both this todo and the tag
    pub fn add_tag(&mut self, tag: &mut Tag) {
        upsert_member(&mut tag.todos, self.shallow());
        upsert_member(&mut self.tags, tag.shallow());
    }

    /// Unlink a tag, updating both this todo and the tag
    pub fn remove_tag(&mut self, tag: &mut Tag) {
        let me = self.shallow();
        tag.todos.retain(|t| *t != me);
        self.tags.retain(|t| *t != *tag);
    }

    /// Attach already-shallow tags loaded from storage
    pub(crate) fn with_tags(mut self, tags: impl IntoIterator<Item = Tag>) -> Self {
        for tag in tags {
            upsert_member(&mut self.tags, tag.shallow());
        }
        self
    }

    /// Ids of linked tags, sorted. Fails if any linked tag was never saved.
    pub(crate) fn persisted_tag_ids(&self) -> TodoResult<Vec<i32>> {
        let mut ids = self
            .tags
            .iter()
            .map(|t| {
                t.id.ok_or_else(|| {
                    TodoError::Validation(format!(
                        "tag '{}' must be saved before it is linked to a todo",
                        t.name
                    ))
                })
            })
            .collect::<TodoResult<Vec<i32>>>()?;
        ids.sort_unstable();
        Ok(ids)
    }

    fn shallow(&self) -> Self {
        Self {
            id: self.id,
            description: self.description.clone(),
            done: self.done,
            tags: HashSet::new(),
            instance: self.instance,
        }
    }
}

impl Tag {
    /// New transient tag; fails when the name is blank
    pub fn new(name: impl Into<String>) -> TodoResult<Self> {
        let name = name.into();
        ensure_not_blank("name", &name)?;

        Ok(Self::restore(None, name))
    }

    pub(crate) fn restore(id: Option<i32>, name: String) -> Self {
        Self {
            id,
            name,
            todos: HashSet::new(),
            instance: Uuid::new_v4(),
        }
    }

    pub fn id(&self) -> Option<i32> {
        self.id
    }

    pub(crate) fn assign_id(&mut self, id: i32) {
        self.id = Some(id);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) -> TodoResult<()> {
        let name = name.into();
        ensure_not_blank("name", &name)?;
        self.name = name;
        Ok(())
    }

    /// Copy of the todo set; changes to it do not reach this tag
    pub fn todos(&self) -> HashSet<Todo> {
        self.todos.clone()
    }

    pub fn has_todo(&self, todo: &Todo) -> bool {
        self.todos.iter().any(|t| t == todo)
    }

    /// Replace the todo set. `None` clears it.
    pub fn set_todos(&mut self, todos: Option<HashSet<Todo>>) {
        self.todos = todos
            .unwrap_or_default()
            .iter()
            .map(Todo::shallow)
            .collect();
    }

    /// Link a todo, updating both sides
    pub fn add_todo(&mut self, todo: &mut Todo) {
        todo.add_tag(self);
    }

    /// Unlink a todo, updating both sides
    pub fn remove_todo(&mut self, todo: &mut Todo) {
        todo.remove_tag(self);
    }

    pub(crate) fn with_todos(mut self, todos: impl IntoIterator<Item = Todo>) -> Self {
        for todo in todos {
            upsert_member(&mut self.todos, todo.shallow());
        }
        self
    }

    fn shallow(&self) -> Self {
        Self {
            id: self.id,
            name: self.name.clone(),
            todos: HashSet::new(),
            instance: self.instance,
        }
    }
}

impl PartialEq for Todo {
    fn eq(&self, other: &Self) -> bool {
        same_identity((self.id, self.instance), (other.id, other.instance))
    }
}

impl Eq for Todo {}

impl Hash for Todo {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.description.hash(state);
    }
}

impl PartialEq for Tag {
    fn eq(&self, other: &Self) -> bool {
        same_identity((self.id, self.instance), (other.id, other.instance))
    }
}

impl Eq for Tag {}

impl Hash for Tag {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl fmt::Display for Todo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mark = if self.done { "x" } else { " " };
        match self.id {
            Some(id) => write!(f, "#{id} [{mark}] {}", self.description)?,
            None => write!(f, "#- [{mark}] {}", self.description)?,
        }
        let names = self.tag_names();
        if !names.is_empty() {
            write!(f, " ({})", names.join(", "))?;
        }
        Ok(())
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.id {
            Some(id) => write!(f, "#{id} {}", self.name),
            None => write!(f, "#- {}", self.name),
        }
    }
}

/// Input for creating a todo
#[derive(Debug, Clone, Validate)]
pub struct CreateTodo {
    #[validate(custom(function = "not_blank"))]
    pub description: String,
}

/// Input for creating a tag
#[derive(Debug, Clone, Validate)]
pub struct CreateTag {
    #[validate(custom(function = "not_blank"))]
    pub name: String,
}

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("must not be blank".into());
        return Err(err);
    }
    Ok(())
}

fn ensure_not_blank(field: &str, value: &str) -> TodoResult<()> {
    if value.trim().is_empty() {
        return Err(TodoError::Validation(format!("{field} must not be blank")));
    }
    Ok(())
}

fn same_identity(a: (Option<i32>, Uuid), b: (Option<i32>, Uuid)) -> bool {
    match (a.0, b.0) {
        (Some(x), Some(y)) => x == y,
        (None, None) => a.1 == b.1,
        _ => false,
    }
}

/// Insert or refresh a member. A plain `replace` would miss an equal member
/// whose hash key changed since it was inserted.
fn upsert_member<T: Eq + Hash>(set: &mut HashSet<T>, member: T) {
    set.retain(|existing| *existing != member);
    set.insert(member);
}
