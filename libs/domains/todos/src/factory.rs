//! Builds the repository pair for the configured backend

use std::str::FromStr;
use std::sync::Arc;

use core_config::{ConfigError, FromEnv, env_required};
use database::mongodb::{self as mongo, Client, MongoConfig};
use database::relational::{self, RelationalConfig};
use database::{HealthStatus, RetryConfig};
use migration::Migrator;
use strum::{Display, EnumString};
use tracing::{info, instrument, warn};

use crate::document::{MongoTagRepository, MongoTodoRepository};
use crate::error::{TodoError, TodoResult};
use crate::relational::{PersistenceContext, SeaTagRepository, SeaTodoRepository};
use crate::repository::{TagRepository, TodoRepository};

/// Which storage engine backs the repositories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum BackendKind {
    #[strum(to_string = "relational", serialize = "sql")]
    Relational,
    #[strum(to_string = "document", serialize = "mongodb")]
    Document,
}

/// Everything needed to build the repositories.
///
/// Built once at startup and passed by reference to [`create_repositories`].
#[derive(Debug, Clone)]
pub struct RepositoryConfig {
    pub backend: BackendKind,
    pub relational: RelationalConfig,
    pub document: MongoConfig,
}

impl RepositoryConfig {
    pub fn new(backend: BackendKind) -> Self {
        Self {
            backend,
            relational: RelationalConfig::default(),
            document: MongoConfig::default(),
        }
    }

    pub fn with_relational(mut self, relational: RelationalConfig) -> Self {
        self.relational = relational;
        self
    }

    pub fn with_document(mut self, document: MongoConfig) -> Self {
        self.document = document;
        self
    }
}

/// Load from the environment. `TODO_BACKEND` is required.
impl FromEnv for RepositoryConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let raw = env_required("TODO_BACKEND")?;
        let backend = BackendKind::from_str(raw.trim()).map_err(|_| ConfigError::InvalidValue {
            key: "TODO_BACKEND".to_string(),
            details: format!("unsupported backend '{raw}', expected 'relational' or 'document'"),
        })?;

        Ok(Self {
            backend,
            relational: RelationalConfig::from_env()?,
            document: MongoConfig::from_env()?,
        })
    }
}

enum BackendHandle {
    Relational(Arc<PersistenceContext>),
    Document(Option<Client>),
}

/// The todo and tag repositories for one backend, sharing one connection
pub struct Repositories {
    pub todos: Arc<dyn TodoRepository>,
    pub tags: Arc<dyn TagRepository>,
    backend: BackendKind,
    handle: BackendHandle,
}

impl Repositories {
    pub fn backend(&self) -> BackendKind {
        self.backend
    }

    /// Transaction control; only the relational backend has one
    pub fn context(&self) -> Option<Arc<PersistenceContext>> {
        match &self.handle {
            BackendHandle::Relational(ctx) => Some(ctx.clone()),
            BackendHandle::Document(_) => None,
        }
    }

    /// False when the document backend fell back to disconnected mode
    pub fn is_connected(&self) -> bool {
        match &self.handle {
            BackendHandle::Relational(_) => true,
            BackendHandle::Document(client) => client.is_some(),
        }
    }

    pub async fn health(&self) -> HealthStatus {
        match &self.handle {
            BackendHandle::Relational(ctx) => {
                relational::check_health_detailed(ctx.connection()).await
            }
            BackendHandle::Document(Some(client)) => mongo::check_health_detailed(client).await,
            BackendHandle::Document(None) => {
                HealthStatus::unhealthy("mongodb", "running disconnected".to_string(), 0)
            }
        }
    }
}

/// Connect to the configured backend and build its repositories.
///
/// Relational connection failures are returned as errors. A document
/// backend that cannot be reached yields disconnected repositories instead.
#[instrument(skip(config), fields(backend = %config.backend))]
pub async fn create_repositories(config: &RepositoryConfig) -> TodoResult<Repositories> {
    match config.backend {
        BackendKind::Relational => relational_repositories(&config.relational).await,
        BackendKind::Document => Ok(document_repositories(&config.document).await),
    }
}

async fn relational_repositories(config: &RelationalConfig) -> TodoResult<Repositories> {
    let db = relational::connect_with_retry(config, Some(RetryConfig::default()))
        .await
        .map_err(|e| TodoError::Connection(format!("{}: {}", config.redacted_url(), e)))?;
    relational::run_migrations::<Migrator>(&db, "todo").await?;

    let ctx = Arc::new(PersistenceContext::new(db));
    info!("Relational repositories ready");

    Ok(Repositories {
        todos: Arc::new(SeaTodoRepository::new(ctx.clone())),
        tags: Arc::new(SeaTagRepository::new(ctx.clone())),
        backend: BackendKind::Relational,
        handle: BackendHandle::Relational(ctx),
    })
}

async fn document_repositories(config: &MongoConfig) -> Repositories {
    match connect_document(config).await {
        Ok((client, todos, tags)) => {
            info!(database = %config.database, "Document repositories ready");
            Repositories {
                todos,
                tags,
                backend: BackendKind::Document,
                handle: BackendHandle::Document(Some(client)),
            }
        }
        Err(e) => {
            warn!(
                error = %e,
                url = %config.url(),
                "MongoDB unavailable, continuing with disconnected repositories"
            );
            let tags = Arc::new(MongoTagRepository::disconnected());
            Repositories {
                todos: Arc::new(MongoTodoRepository::disconnected(tags.clone())),
                tags,
                backend: BackendKind::Document,
                handle: BackendHandle::Document(None),
            }
        }
    }
}

async fn connect_document(
    config: &MongoConfig,
) -> TodoResult<(Client, Arc<dyn TodoRepository>, Arc<dyn TagRepository>)> {
    let client = mongo::connect_from_config(config).await?;
    let db = client.database(config.database());

    let tags = Arc::new(MongoTagRepository::new(&db).await?);
    let todos = MongoTodoRepository::new(&db, tags.clone()).await?;
    Ok((client, Arc::new(todos), tags))
}
