//! fintrack-config
//!
//! Persistent user preferences: the Config model plus disk persistence helpers.

pub mod error;
pub mod manager;
pub mod model;

pub use error::ConfigError;
pub use manager::ConfigManager;
pub use model::{Config, OutputStyle};
