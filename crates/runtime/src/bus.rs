use ledger_connect_protocol::WireReply;
use serde_json::Value;

/// Event delivered by the window message bus.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowEvent {
	pub origin: String,
	pub data: Value,
}

impl WindowEvent {
	pub fn new(origin: impl Into<String>, data: Value) -> Self {
		Self {
			origin: origin.into(),
			data,
		}
	}
}

/// Outbound side of the window message bus.
pub trait MessageBus: Send + Sync {
	/// Posts a reply to the opener, restricted to `target_origin`.
	fn post(&self, reply: &WireReply, target_origin: &str);

	/// Closes the connector page.
	fn close_window(&self);
}
