//! MongoDB connector for the document backend

mod config;
mod connector;
mod health;

pub use config::MongoConfig;
pub use connector::{connect_from_config, ping};
pub use health::{check_health, check_health_detailed};

pub use mongodb::{Client, Collection, Database};
