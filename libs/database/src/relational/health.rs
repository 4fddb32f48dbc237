use sea_orm::{ConnectionTrait, DatabaseConnection, Statement};
use std::time::Instant;
use tracing::debug;

use crate::common::{DatabaseError, HealthStatus};

/// Run `SELECT 1` against the connection
pub async fn check_health(db: &DatabaseConnection) -> Result<(), DatabaseError> {
    debug!("Running relational health check");

    let stmt = Statement::from_string(db.get_database_backend(), "SELECT 1".to_owned());
    db.query_one_raw(stmt).await.map_err(|e| {
        DatabaseError::HealthCheckFailed(format!("relational health check failed: {}", e))
    })?;

    debug!("Relational health check passed");
    Ok(())
}

/// Health check with timing, for status reporting
pub async fn check_health_detailed(db: &DatabaseConnection) -> HealthStatus {
    let start = Instant::now();
    let result = check_health(db).await;
    HealthStatus::from_probe("relational", start, result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relational::{RelationalConfig, connect};

    #[tokio::test]
    async fn test_check_health_on_sqlite() {
        let db = connect(&RelationalConfig::new("sqlite::memory:")).await.unwrap();
        assert!(check_health(&db).await.is_ok());

        let status = check_health_detailed(&db).await;
        assert!(status.healthy);
        assert_eq!(status.backend, "relational");
    }
}
