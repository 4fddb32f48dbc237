//! Connectors for the two storage backends of the todo manager.
//!
//! # Features
//!
//! - `relational` (default) - SeaORM over SQLite or PostgreSQL
//! - `mongodb` (default) - MongoDB document store
//! - `config` - `core_config::FromEnv` implementations for the config structs
//! - `all` - everything above
//!
//! # Examples
//!
//! ## Relational
//!
//! ```ignore
//! use database::relational::{self, RelationalConfig};
//! use migration::Migrator;
//!
//! let config = RelationalConfig::new("sqlite://todoapp.db?mode=rwc");
//! let db = relational::connect(&config).await?;
//! relational::run_migrations::<Migrator>(&db, "todo").await?;
//! ```
//!
//! ## MongoDB
//!
//! ```ignore
//! use database::mongodb::{self, MongoConfig};
//!
//! let config = MongoConfig::default();
//! let client = mongodb::connect_from_config(&config).await?;
//! let db = client.database(config.database());
//! ```

pub mod common;

#[cfg(feature = "relational")]
pub mod relational;

#[cfg(feature = "mongodb")]
pub mod mongodb;

pub use common::{DatabaseError, DatabaseResult, HealthStatus, RetryConfig};
