use core_config::ConfigError;
use database::DatabaseError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TodoError {
    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type TodoResult<T> = Result<T, TodoError>;

impl From<sea_orm::DbErr> for TodoError {
    fn from(err: sea_orm::DbErr) -> Self {
        TodoError::Database(err.to_string())
    }
}

impl From<mongodb::error::Error> for TodoError {
    fn from(err: mongodb::error::Error) -> Self {
        TodoError::Database(err.to_string())
    }
}

impl From<mongodb::bson::ser::Error> for TodoError {
    fn from(err: mongodb::bson::ser::Error) -> Self {
        TodoError::Internal(format!("BSON encoding failed: {}", err))
    }
}

impl From<mongodb::bson::de::Error> for TodoError {
    fn from(err: mongodb::bson::de::Error) -> Self {
        TodoError::Internal(format!("BSON decoding failed: {}", err))
    }
}

impl From<validator::ValidationErrors> for TodoError {
    fn from(err: validator::ValidationErrors) -> Self {
        TodoError::Validation(err.to_string())
    }
}

impl From<ConfigError> for TodoError {
    fn from(err: ConfigError) -> Self {
        TodoError::Configuration(err.to_string())
    }
}

impl From<DatabaseError> for TodoError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::ConnectionFailed(msg) => TodoError::Connection(msg),
            DatabaseError::ConfigError(msg) => TodoError::Configuration(msg),
            other => TodoError::Database(other.to_string()),
        }
    }
}
