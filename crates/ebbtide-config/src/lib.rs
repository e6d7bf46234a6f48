pub mod config;
pub mod error;

pub use config::{ConfigOverrides, EbbtideConfig, DEFAULT_CONFIG_FILE};
pub use error::ConfigError;
