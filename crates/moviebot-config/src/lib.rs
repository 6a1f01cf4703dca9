pub mod config;
pub mod credentials;
pub mod paths;

pub use config::{BotConfig, Config, ConfigError, Settings, StorageConfig, TmdbConfig};
pub use credentials::CredentialStore;
pub use paths::{container_base_path, PathManager};
