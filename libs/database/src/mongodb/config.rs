#[cfg(feature = "config")]
use core_config::{ConfigError, FromEnv, env_optional, env_or_default, env_parse};

/// MongoDB connection settings
///
/// The server is addressed by host and port rather than a full connection
/// string; [`MongoConfig::url`] builds the `mongodb://` URL from them.
///
/// # Example
///
/// ```ignore
/// use database::mongodb::MongoConfig;
///
/// let config = MongoConfig::new("db.internal", 27018).with_database("todos");
/// assert_eq!(config.url(), "mongodb://db.internal:27018");
/// ```
#[derive(Clone, Debug)]
pub struct MongoConfig {
    /// Server host name
    pub host: String,

    /// Server port
    pub port: u16,

    /// Database holding the `todos` and `tags` collections
    pub database: String,

    /// Optional application name for server logs
    pub app_name: Option<String>,

    /// Connection timeout in seconds
    pub connect_timeout_secs: u64,

    /// Server selection timeout in seconds
    pub server_selection_timeout_secs: u64,
}

impl MongoConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Self::default()
        }
    }

    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = database.into();
        self
    }

    pub fn with_app_name(mut self, app_name: impl Into<String>) -> Self {
        self.app_name = Some(app_name.into());
        self
    }

    pub fn with_server_selection_timeout(mut self, secs: u64) -> Self {
        self.server_selection_timeout_secs = secs;
        self
    }

    pub fn url(&self) -> String {
        format!("mongodb://{}:{}", self.host, self.port)
    }

    pub fn database(&self) -> &str {
        &self.database
    }
}

impl Default for MongoConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 27017,
            database: "todoapp".to_string(),
            app_name: None,
            connect_timeout_secs: 10,
            server_selection_timeout_secs: 30,
        }
    }
}

/// Load MongoConfig from environment variables
///
/// - `MONGODB_HOST` (default: localhost)
/// - `MONGODB_PORT` (default: 27017)
/// - `MONGODB_DATABASE` (default: todoapp)
/// - `MONGODB_APP_NAME` (optional)
/// - `MONGODB_SERVER_SELECTION_TIMEOUT_SECS` (default: 30)
#[cfg(feature = "config")]
impl FromEnv for MongoConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        Ok(Self {
            host: env_or_default("MONGODB_HOST", &defaults.host),
            port: env_parse("MONGODB_PORT", defaults.port)?,
            database: env_or_default("MONGODB_DATABASE", &defaults.database),
            app_name: env_optional("MONGODB_APP_NAME"),
            connect_timeout_secs: defaults.connect_timeout_secs,
            server_selection_timeout_secs: env_parse(
                "MONGODB_SERVER_SELECTION_TIMEOUT_SECS",
                defaults.server_selection_timeout_secs,
            )?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mongo_config_default() {
        let config = MongoConfig::default();
        assert_eq!(config.url(), "mongodb://localhost:27017");
        assert_eq!(config.database(), "todoapp");
        assert!(config.app_name.is_none());
    }

    #[test]
    fn test_mongo_config_builders() {
        let config = MongoConfig::new("mongo", 28000)
            .with_database("todos_test")
            .with_app_name("todo-cli");
        assert_eq!(config.url(), "mongodb://mongo:28000");
        assert_eq!(config.database, "todos_test");
        assert_eq!(config.app_name.as_deref(), Some("todo-cli"));
    }

    #[cfg(feature = "config")]
    #[test]
    fn test_mongo_config_from_env_defaults() {
        temp_env::with_vars_unset(
            ["MONGODB_HOST", "MONGODB_PORT", "MONGODB_DATABASE", "MONGODB_APP_NAME"],
            || {
                let config = MongoConfig::from_env().unwrap();
                assert_eq!(config.host, "localhost");
                assert_eq!(config.port, 27017);
                assert_eq!(config.database, "todoapp");
            },
        );
    }

    #[cfg(feature = "config")]
    #[test]
    fn test_mongo_config_from_env_custom() {
        temp_env::with_vars(
            [
                ("MONGODB_HOST", Some("mongo.local")),
                ("MONGODB_PORT", Some("27999")),
                ("MONGODB_DATABASE", Some("todos")),
            ],
            || {
                let config = MongoConfig::from_env().unwrap();
                assert_eq!(config.url(), "mongodb://mongo.local:27999");
                assert_eq!(config.database, "todos");
            },
        );
    }

    #[cfg(feature = "config")]
    #[test]
    fn test_mongo_config_from_env_invalid_port() {
        temp_env::with_var("MONGODB_PORT", Some("not-a-port"), || {
            let err = MongoConfig::from_env().unwrap_err();
            assert!(err.to_string().contains("MONGODB_PORT"));
        });
    }
}
