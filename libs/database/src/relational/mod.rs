//! SeaORM connector for SQLite and PostgreSQL

mod config;
mod connector;
mod health;

pub use config::{DEFAULT_DATABASE_URL, RelationalConfig};
pub use connector::{connect, connect_with_options, connect_with_retry, run_migrations};
pub use health::{check_health, check_health_detailed};

pub use sea_orm::{DatabaseConnection, DbErr};
