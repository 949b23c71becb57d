//! Configuration for the widget store.
//!
//! Configuration is written in TOML. Every section and key is optional:
//!
//! ```toml
//! [storage]
//! backend = "durable"      # or "snapshot" (in-memory, default)
//! path = "data/easel.db"   # database file for the durable backend
//!
//! [listing]
//! max_page_size = 500
//! default_page_size = 10
//!
//! [log]
//! level = "info"           # trace, debug, info, warn, error
//! ```
//!
//! # Configuration Files
//!
//! Easel looks for configuration in these locations (in order):
//!
//! 1. The path given on the command line
//! 2. `$XDG_CONFIG_HOME/easel/config.toml` (or `~/.config/easel/config.toml`)
//! 3. Built-in defaults
//!
//! Unknown keys are rejected so that typos do not silently fall back to defaults.

pub mod error;

use std::path::{Path, PathBuf};

pub use error::{ConfigError, Result};
use easel_service::ListingLimits;
use easel_store::{BackendKind, StoreSpec};
use serde::Deserialize;

/// Parsed configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
	pub storage: StorageConfig,
	pub listing: ListingConfig,
	pub log: LogConfig,
}

/// Backend selection.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StorageConfig {
	pub backend: BackendKind,
	/// Database file used by the durable backend; ignored otherwise.
	pub path: PathBuf,
}

impl Default for StorageConfig {
	fn default() -> Self {
		Self {
			backend: BackendKind::Snapshot,
			path: PathBuf::from("easel.db"),
		}
	}
}

impl StorageConfig {
	pub fn store_spec(&self) -> StoreSpec {
		match self.backend {
			BackendKind::Snapshot => StoreSpec::Snapshot,
			BackendKind::Durable => StoreSpec::Durable {
				path: self.path.clone(),
			},
		}
	}
}

/// Paging bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ListingConfig {
	pub max_page_size: u32,
	pub default_page_size: u32,
}

impl Default for ListingConfig {
	fn default() -> Self {
		let limits = ListingLimits::default();
		Self {
			max_page_size: limits.max_page_size,
			default_page_size: limits.default_page_size,
		}
	}
}

impl ListingConfig {
	pub fn limits(&self) -> ListingLimits {
		ListingLimits {
			max_page_size: self.max_page_size,
			default_page_size: self.default_page_size,
		}
	}
}

/// Logging verbosity.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LogConfig {
	pub level: String,
}

impl Default for LogConfig {
	fn default() -> Self {
		Self {
			level: "info".to_string(),
		}
	}
}

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

impl Config {
	/// Parse a TOML string into a [`Config`].
	pub fn parse(input: &str) -> Result<Self> {
		let config: Self = toml::from_str(input)?;
		config.validate()?;
		Ok(config)
	}

	/// Load configuration from a file.
	pub fn load(path: &Path) -> Result<Self> {
		let content = std::fs::read_to_string(path).map_err(|error| ConfigError::Io {
			path: path.to_path_buf(),
			error,
		})?;
		let mut config = Self::parse(&content)?;

		// Relative database paths are resolved against the config file.
		if config.storage.path.is_relative() {
			if let Some(dir) = path.parent() {
				config.storage.path = dir.join(&config.storage.path);
			}
		}
		tracing::debug!(path = %path.display(), "loaded configuration");
		Ok(config)
	}

	/// Load from `explicit` when given, else from the user config file when it
	/// exists, else defaults.
	pub fn discover(explicit: Option<&Path>) -> Result<Self> {
		if let Some(path) = explicit {
			return Self::load(path);
		}
		match default_path() {
			Some(path) if path.is_file() => Self::load(&path),
			_ => Ok(Self::default()),
		}
	}

	fn validate(&self) -> Result<()> {
		if self.listing.max_page_size == 0 {
			return Err(ConfigError::InvalidValue {
				field: "listing.max_page_size",
				message: "must be at least 1".to_string(),
			});
		}
		if self.listing.default_page_size == 0
			|| self.listing.default_page_size > self.listing.max_page_size
		{
			return Err(ConfigError::InvalidValue {
				field: "listing.default_page_size",
				message: format!("must be between 1 and {}", self.listing.max_page_size),
			});
		}
		if !LOG_LEVELS.contains(&self.log.level.to_ascii_lowercase().as_str()) {
			return Err(ConfigError::InvalidValue {
				field: "log.level",
				message: format!("expected one of {}", LOG_LEVELS.join(", ")),
			});
		}
		Ok(())
	}
}

/// `$XDG_CONFIG_HOME/easel/config.toml`, when a config directory is known.
pub fn default_path() -> Option<PathBuf> {
	dirs::config_dir().map(|dir| dir.join("easel").join("config.toml"))
}
