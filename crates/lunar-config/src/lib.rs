//! Lunar Configuration System
//!
//! Provides configuration for the Lunar VM and its tooling:
//! - Runtime limits (call depth, initial register stack size)
//! - Debug hook settings (trigger mode, tracer limits)
//! - Which numeric libraries are opened into the global table
//!
//! # Configuration Hierarchy
//!
//! Configuration is loaded and merged in the following order (later overrides earlier):
//! 1. Global config (~/.lunar/config.toml)
//! 2. Project config (./lunar.toml, searched upwards)
//! 3. Environment variables (LUNAR_*)
//! 4. CLI flags
//!
//! # Example
//!
//! ```no_run
//! use lunar_config::ConfigLoader;
//! use std::path::Path;
//!
//! let mut loader = ConfigLoader::new();
//! let config = loader.load_from_directory(Path::new(".")).unwrap();
//! println!("max call depth: {}", config.max_call_depth());
//! ```

pub mod loader;
pub mod settings;

use std::path::PathBuf;
use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to read configuration file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid TOML syntax in {file}: {error}")]
    TomlParseError {
        file: PathBuf,
        error: toml::de::Error,
    },

    #[error("Invalid configuration: {0}")]
    ValidationError(String),

    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Home directory not found")]
    HomeNotFound,
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

// Re-export main types
pub use loader::{Config, ConfigLoader};
pub use settings::{DebugSection, HookMode, LibrariesSection, LunarConfig, RuntimeSection};
