use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use sea_orm_migration::MigratorTrait;
use tracing::info;

use super::RelationalConfig;
use crate::common::{RetryConfig, retry_with_backoff};

/// Connect using a RelationalConfig
///
/// ```ignore
/// use database::relational::{RelationalConfig, connect};
///
/// let db = connect(&RelationalConfig::new("sqlite::memory:")).await?;
/// ```
pub async fn connect(config: &RelationalConfig) -> Result<DatabaseConnection, DbErr> {
    let url = config.redacted_url();
    let db = connect_with_options(config.clone().into_connect_options()).await?;
    info!(url = %url, backend = ?db.get_database_backend(), "Connected to relational database");
    Ok(db)
}

/// Connect with hand-built connection options
pub async fn connect_with_options(options: ConnectOptions) -> Result<DatabaseConnection, DbErr> {
    Database::connect(options).await
}

/// Connect with exponential backoff between failed attempts
///
/// `None` uses [`RetryConfig::default`].
pub async fn connect_with_retry(
    config: &RelationalConfig,
    retry_config: Option<RetryConfig>,
) -> Result<DatabaseConnection, DbErr> {
    let options = config.clone().into_connect_options();
    let url = config.redacted_url();

    let db = retry_with_backoff(
        "relational connect",
        || connect_with_options(options.clone()),
        retry_config.unwrap_or_default(),
    )
    .await?;

    info!(url = %url, backend = ?db.get_database_backend(), "Connected to relational database");
    Ok(db)
}

/// Apply every pending migration of `M`
///
/// `app_name` only labels the log output.
pub async fn run_migrations<M: MigratorTrait>(
    db: &DatabaseConnection,
    app_name: &str,
) -> Result<(), DbErr> {
    info!("Running {} database migrations...", app_name);
    M::up(db, None).await?;
    info!("Migrations completed successfully for {}", app_name);
    Ok(())
}
