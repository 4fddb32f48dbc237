use mongodb::bson::doc;
use mongodb::{Client, options::ClientOptions};
use std::time::Duration;
use tracing::info;

use super::MongoConfig;
use crate::common::{DatabaseError, DatabaseResult};

/// Build a client from config and verify the server answers a ping.
///
/// The driver connects lazily, so without the ping an unreachable server
/// would only surface on the first query.
pub async fn connect_from_config(config: &MongoConfig) -> DatabaseResult<Client> {
    let url = config.url();
    info!("Attempting to connect to MongoDB at {}", url);

    let mut options = ClientOptions::parse(&url).await?;
    options.connect_timeout = Some(Duration::from_secs(config.connect_timeout_secs));
    options.server_selection_timeout =
        Some(Duration::from_secs(config.server_selection_timeout_secs));
    if let Some(ref app_name) = config.app_name {
        options.app_name = Some(app_name.clone());
    }

    let client = Client::with_options(options)?;
    ping(&client).await?;

    info!(database = %config.database, "Successfully connected to MongoDB");
    Ok(client)
}

/// Send `{ ping: 1 }` to the admin database
pub async fn ping(client: &Client) -> DatabaseResult<()> {
    client
        .database("admin")
        .run_command(doc! { "ping": 1 })
        .await
        .map(|_| ())
        .map_err(|e| DatabaseError::ConnectionFailed(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_connect_fails_fast_without_server() {
        let config = MongoConfig::new("127.0.0.1", 1).with_server_selection_timeout(1);
        let result = connect_from_config(&config).await;
        assert!(matches!(result, Err(DatabaseError::ConnectionFailed(_))));
    }

    #[tokio::test]
    #[ignore] // Requires actual MongoDB
    async fn test_connect_local() {
        let result = connect_from_config(&MongoConfig::default()).await;
        assert!(result.is_ok());
    }
}
