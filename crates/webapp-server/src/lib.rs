pub mod config;
pub mod db;
pub mod error;

pub use config::Settings;
pub use db::Dialect;
pub use error::ConfigError;
