//! Tunable connector settings.

use std::time::Duration;

use ledger_connect_protocol::TRANSPORT_WEBAUTHN;
use serde::{Deserialize, Serialize};

/// How long a version query may take before the device is presumed locked.
pub const DEVICE_LOCK_CHECK_TIMEOUT_MS: u64 = 2000;

/// Default `target` a message must carry to reach this connector.
pub const CONNECTOR_TARGET: &str = "YOROI-LEDGER-CONNECT";

/// Post replies to any origin.
pub const WILDCARD_ORIGIN: &str = "*";

/// Connector configuration.
///
/// Every field has a default, so a partial JSON document is a valid config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ConnectorConfig {
	/// Lock-detection timeout in milliseconds.
	pub lock_check_timeout_ms: u64,
	/// Identity inbound messages must name in their `target` field.
	pub target: String,
	/// Origin replies are posted to.
	pub reply_origin: String,
	/// Transport identifier the session starts with.
	pub transport: String,
}

impl ConnectorConfig {
	pub fn lock_check_timeout(&self) -> Duration {
		Duration::from_millis(self.lock_check_timeout_ms)
	}
}

impl Default for ConnectorConfig {
	fn default() -> Self {
		Self {
			lock_check_timeout_ms: DEVICE_LOCK_CHECK_TIMEOUT_MS,
			target: CONNECTOR_TARGET.to_string(),
			reply_origin: WILDCARD_ORIGIN.to_string(),
			transport: TRANSPORT_WEBAUTHN.to_string(),
		}
	}
}
