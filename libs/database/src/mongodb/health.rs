use mongodb::Client;
use std::time::Instant;
use tracing::debug;

use super::connector::ping;
use crate::common::{DatabaseError, HealthStatus};

/// Check MongoDB health with a ping command
pub async fn check_health(client: &Client) -> Result<(), DatabaseError> {
    debug!("Running MongoDB health check");
    ping(client)
        .await
        .map_err(|e| {
            DatabaseError::HealthCheckFailed(format!("MongoDB health check failed: {}", e))
        })
}

/// Health check with timing, for status reporting
pub async fn check_health_detailed(client: &Client) -> HealthStatus {
    let start = Instant::now();
    let result = check_health(client).await;
    HealthStatus::from_probe("mongodb", start, result)
}
