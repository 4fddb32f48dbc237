//! Relational test infrastructure
//!
//! Provides a `TestDatabase` backed by a private in-memory SQLite database
//! with the workspace migrations applied. No container is needed, so these
//! tests run everywhere.

use database::relational::{self, RelationalConfig};
use migration::Migrator;
use sea_orm::DatabaseConnection;

/// Migrated in-memory database, dropped with the struct
pub struct TestDatabase {
    pub connection: DatabaseConnection,
    pub connection_string: String,
}

impl TestDatabase {
    /// Create a new empty database with migrations applied
    ///
    /// # Example
    ///
    /// ```no_run
    /// use test_utils::TestDatabase;
    ///
    /// # async fn example() {
    /// let db = TestDatabase::new().await;
    /// // Pass db.connection() to your persistence context
    /// # }
    /// ```
    pub async fn new() -> Self {
        let connection_string = "sqlite::memory:".to_string();

        let connection = relational::connect(&RelationalConfig::new(&connection_string))
            .await
            .expect("Failed to open in-memory database");

        relational::run_migrations::<Migrator>(&connection, "test")
            .await
            .expect("Failed to run migrations");

        tracing::debug!("Test database ready (in-memory SQLite)");

        Self {
            connection,
            connection_string,
        }
    }

    /// Get a cloned connection (useful for passing to repositories)
    pub fn connection(&self) -> DatabaseConnection {
        self.connection.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{ConnectionTrait, Statement};

    #[tokio::test]
    async fn test_database_is_migrated() {
        let db = TestDatabase::new().await;
        let backend = db.connection.get_database_backend();

        let row = db
            .connection
            .query_one_raw(Statement::from_string(
                backend,
                "SELECT COUNT(*) AS n FROM todos",
            ))
            .await
            .unwrap()
            .unwrap();
        let count: i64 = row.try_get("", "n").unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_databases_are_isolated() {
        let first = TestDatabase::new().await;
        let second = TestDatabase::new().await;
        let backend = first.connection.get_database_backend();

        first
            .connection
            .execute_raw(Statement::from_string(
                backend,
                "INSERT INTO tags (name) VALUES ('only-here')",
            ))
            .await
            .unwrap();

        let row = second
            .connection
            .query_one_raw(Statement::from_string(
                backend,
                "SELECT COUNT(*) AS n FROM tags",
            ))
            .await
            .unwrap()
            .unwrap();
        let count: i64 = row.try_get("", "n").unwrap();
        assert_eq!(count, 0);
    }
}
