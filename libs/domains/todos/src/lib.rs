//! Todos Domain
//!
//! Todos and tags with a many-to-many relationship, persisted through one of
//! two interchangeable backends chosen at startup.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐
//! │   Service   │  ← Use cases, validation
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │ Repository  │  ← TodoRepository / TagRepository traits
//! └──────┬──────┘
//!        │
//! ┌──────▼───────────────────┐
//! │ relational  │  document  │  ← SeaORM / MongoDB
//! └──────┬───────────────────┘
//!        │
//! ┌──────▼──────┐
//! │   Models    │  ← Todo, Tag, DTOs
//! └─────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use core_config::FromEnv;
//! use domain_todos::{RepositoryConfig, TodoService, create_repositories};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = RepositoryConfig::from_env()?;
//! let repositories = create_repositories(&config).await?;
//! let service = TodoService::from_repositories(&repositories);
//!
//! let todo = service.create_todo("Buy milk").await?;
//! let tag = service.create_tag("errands").await?;
//! service.add_tag_to_todo(todo.id().unwrap(), tag.id().unwrap()).await?;
//! # Ok(())
//! # }
//! ```

pub mod document;
pub mod entity;
pub mod error;
pub mod factory;
pub mod models;
pub mod relational;
pub mod repository;
pub mod service;

pub use document::{MongoTagRepository, MongoTodoRepository};
pub use error::{TodoError, TodoResult};
pub use factory::{BackendKind, Repositories, RepositoryConfig, create_repositories};
pub use models::{CreateTag, CreateTodo, Tag, Todo};
pub use relational::{PersistenceContext, SeaTagRepository, SeaTodoRepository};
pub use repository::{TagRepository, TodoRepository};
pub use service::TodoService;
