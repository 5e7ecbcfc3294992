//! Config file discovery and command-line overrides.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use ledger_connect_runtime::ConnectorConfig;
use tracing::debug;

use crate::cli::RunArgs;
use crate::error::{CliError, Result};

/// Directory under the user config dir holding this tool's files.
pub const APP_DIR: &str = "ledger-connect";
pub const CONFIG_FILE: &str = "config.json";
pub const DEVICE_FILE: &str = "device.json";

pub fn default_config_path() -> Option<PathBuf> {
	dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
}

pub fn default_store_path() -> Option<PathBuf> {
	dirs::config_dir().map(|dir| dir.join(APP_DIR).join(DEVICE_FILE))
}

/// Loads the connector config.
///
/// An explicit `path` must exist. The default location is optional and
/// yields built-in defaults when absent.
pub fn load_config(path: Option<&Path>) -> Result<ConnectorConfig> {
	match path {
		Some(path) => read_config(path),
		None => match default_config_path() {
			Some(path) if path.exists() => read_config(&path),
			_ => Ok(ConnectorConfig::default()),
		},
	}
}

fn read_config(path: &Path) -> Result<ConnectorConfig> {
	let content = fs::read_to_string(path).map_err(|source| CliError::ConfigRead {
		path: path.to_path_buf(),
		source,
	})?;
	debug!(target = "ledger_connect.config", path = %path.display(), "loaded config");
	serde_json::from_str(&content).map_err(|source| CliError::ConfigParse {
		path: path.to_path_buf(),
		source,
	})
}

/// Applies `run` flags on top of the file config.
pub fn apply_overrides(config: &mut ConnectorConfig, args: &RunArgs) {
	if let Some(transport) = &args.transport {
		config.transport = transport.clone();
	}
	if let Some(target) = &args.target {
		config.target = target.clone();
	}
	if let Some(ms) = args.lock_timeout_ms {
		config.lock_check_timeout_ms = ms;
	}
	if let Some(origin) = &args.reply_origin {
		config.reply_origin = origin.clone();
	}
}

/// Whether `err` only says the file is not there.
pub(crate) fn is_missing(err: &std::io::Error) -> bool {
	err.kind() == ErrorKind::NotFound
}
