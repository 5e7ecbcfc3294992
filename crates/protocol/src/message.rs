//! Inbound request and outbound reply envelopes.
//!
//! Inbound format, as posted by the wallet page:
//! ```json
//! {
//!   "action": "ledger-get-extended-public-key",
//!   "params": { "hdPath": [2147485500, 2147485463, 2147483648] },
//!   "target": "YOROI-LEDGER-CONNECT"
//! }
//! ```
//!
//! Outbound format, posted back by the connector:
//! ```json
//! {
//!   "action": "ledger-get-extended-public-key-reply",
//!   "success": false,
//!   "payload": { "error": "LEDGER_WRONG_APP" }
//! }
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error_code::ErrorCode;
use crate::types::Operation;

/// Message received from the page bus.
///
/// Every field is optional on the wire; the bus carries unrelated traffic
/// too, so nothing here is validated beyond its JSON shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InboundMessage {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub action: Option<String>,
	#[serde(default)]
	pub params: Value,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub target: Option<String>,
}

impl InboundMessage {
	/// Reads a message out of raw event data. Non-object data yields `None`.
	pub fn from_value(data: &Value) -> Option<Self> {
		if !data.is_object() {
			return None;
		}
		serde_json::from_value(data.clone()).ok()
	}

	/// Target named by raw event data, read before the rest of the message
	/// is trusted.
	pub fn target_of(data: &Value) -> Option<&str> {
		data.get("target").and_then(Value::as_str)
	}
}

/// Failure payload: `{ "error": <code> }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
	pub error: ErrorCode,
}

/// Outcome of one operation, before it is put on the wire.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
	pub action: Operation,
	pub success: bool,
	pub payload: Value,
}

impl Reply {
	pub fn success(action: Operation, payload: Value) -> Self {
		Self {
			action,
			success: true,
			payload,
		}
	}

	pub fn failure(action: Operation, error: ErrorCode) -> Self {
		let payload = serde_json::json!({ "error": String::from(error) });
		Self {
			action,
			success: false,
			payload,
		}
	}

	/// Converts to the wire envelope, suffixing the action with `-reply`.
	pub fn into_wire(self) -> WireReply {
		WireReply {
			action: self.action.reply_action(),
			success: self.success,
			payload: self.payload,
		}
	}
}

/// Reply envelope exactly as posted to the page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireReply {
	pub action: String,
	pub success: bool,
	pub payload: Value,
}

impl WireReply {
	/// Error code carried by a failure reply.
	pub fn error(&self) -> Option<ErrorCode> {
		if self.success {
			return None;
		}
		serde_json::from_value::<ErrorPayload>(self.payload.clone()).ok().map(|p| p.error)
	}
}
