//! Store configuration.
//!
//! Settings are read from TOML; every key is optional:
//!
//! ```toml
//! max_undo_depth = 50
//! monitor_interval_ms = 2000
//! tolerate_load_errors_for = ["X", "SC", "SD"]
//! validate_comment_length = true
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use nickdb_primitives::MemoryType;
use serde::Deserialize;
use thiserror::Error;

use crate::history::DEFAULT_MAX_UNDO_DEPTH;

/// Errors from loading a [`StoreConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error reading a configuration file.
	#[error("I/O error reading {path}: {error}")]
	Io {
		/// Path to the file that failed to read.
		path: PathBuf,
		/// The underlying I/O error.
		error: std::io::Error,
	},

	/// Error parsing TOML syntax or field types.
	#[error("TOML parse error: {0}")]
	Parse(#[from] toml::de::Error),

	/// A value parsed but is out of range.
	#[error("invalid setting: {0}")]
	Invalid(String),
}

/// Tunables of an [`AddressStore`](crate::AddressStore).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
	/// Undo frames kept before the oldest is dropped.
	pub max_undo_depth: usize,
	/// Suggested cadence for [`AddressStore::poll_external_changes`](crate::AddressStore::poll_external_changes).
	pub monitor_interval_ms: u64,
	/// Memory types whose invalid nicknames are tolerated at load time.
	pub tolerate_load_errors_for: Vec<MemoryType>,
	/// Treat comments over the length limit as invalid.
	pub validate_comment_length: bool,
}

impl Default for StoreConfig {
	fn default() -> Self {
		Self {
			max_undo_depth: DEFAULT_MAX_UNDO_DEPTH,
			monitor_interval_ms: 2000,
			tolerate_load_errors_for: vec![MemoryType::X, MemoryType::SC, MemoryType::SD],
			validate_comment_length: true,
		}
	}
}

impl StoreConfig {
	pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
		let config: Self = toml::from_str(input)?;
		config.validate()?;
		Ok(config)
	}

	pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
		let path = path.as_ref();
		let input = std::fs::read_to_string(path).map_err(|error| ConfigError::Io {
			path: path.to_path_buf(),
			error,
		})?;
		Self::from_toml_str(&input)
	}

	pub fn monitor_interval(&self) -> Duration {
		Duration::from_millis(self.monitor_interval_ms)
	}

	pub fn tolerates_load_errors(&self, memory_type: MemoryType) -> bool {
		self.tolerate_load_errors_for.contains(&memory_type)
	}

	fn validate(&self) -> Result<(), ConfigError> {
		if self.max_undo_depth == 0 {
			return Err(ConfigError::Invalid("max_undo_depth must be at least 1".into()));
		}
		if self.monitor_interval_ms == 0 {
			return Err(ConfigError::Invalid("monitor_interval_ms must be at least 1".into()));
		}
		Ok(())
	}
}
