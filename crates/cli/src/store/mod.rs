//! Device-code persistence in a small JSON file.

use std::fs;
use std::path::{Path, PathBuf};

use ledger_connect_protocol::DeviceCode;
use ledger_connect_runtime::{DeviceCodeStore, StoreError};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::is_missing;

/// On-disk shape: `{ "deviceCode": "s" }`, or `{}` when cleared.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredDevice {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub device_code: Option<String>,
}

/// Last-used device, kept in a JSON file.
#[derive(Debug, Clone)]
pub struct FileDeviceCodeStore {
	path: PathBuf,
}

impl FileDeviceCodeStore {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	fn read(&self) -> StoredDevice {
		match fs::read_to_string(&self.path) {
			Ok(content) => serde_json::from_str(&content).unwrap_or_else(|err| {
				debug!(target = "ledger_connect.store", path = %self.path.display(), error = %err, "unreadable device file");
				StoredDevice::default()
			}),
			Err(err) => {
				if !is_missing(&err) {
					debug!(target = "ledger_connect.store", path = %self.path.display(), error = %err, "cannot open device file");
				}
				StoredDevice::default()
			}
		}
	}
}

impl DeviceCodeStore for FileDeviceCodeStore {
	fn load(&self) -> DeviceCode {
		DeviceCode::from_stored(self.read().device_code.as_deref())
	}

	fn save(&self, code: DeviceCode) -> Result<(), StoreError> {
		let stored = StoredDevice {
			device_code: code.as_stored().map(str::to_string),
		};
		if let Some(parent) = self.path.parent() {
			fs::create_dir_all(parent).map_err(|e| StoreError(format!("{}: {e}", parent.display())))?;
		}
		let json = serde_json::to_string_pretty(&stored).map_err(|e| StoreError(e.to_string()))?;
		fs::write(&self.path, json).map_err(|e| StoreError(format!("{}: {e}", self.path.display())))?;
		debug!(target = "ledger_connect.store", path = %self.path.display(), device = %code, "device code saved");
		Ok(())
	}
}
