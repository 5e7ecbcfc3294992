//! Line-oriented driver for a [`Bridge`].
//!
//! Each input line is either a page message (any JSON object, passed to
//! [`Bridge::on_message`]) or a harness control line:
//!
//! ```json
//! {"select-device": "s"}
//! {"set-transport": "u2f"}
//! ```

use ledger_connect_protocol::DeviceCode;
use ledger_connect_runtime::{Bridge, Inbound, WindowEvent};
use serde::Deserialize;
use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, warn};

use crate::error::Result;

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum HarnessInput {
	Control(Control),
	Message(Value),
}

/// Stand-ins for the user clicking through the connector page.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
enum Control {
	SelectDevice(DeviceCode),
	SetTransport(String),
}

#[derive(Debug, Clone)]
pub struct HarnessOptions {
	/// Origin stamped on every inbound message.
	pub origin: String,
	/// Device chosen as soon as a request is accepted.
	pub auto_device: Option<DeviceCode>,
}

/// Feeds `input` to `bridge` until end of input or `close-window`.
pub async fn run<R>(bridge: &Bridge, input: R, options: &HarnessOptions) -> Result<()>
where
	R: AsyncBufRead + Unpin,
{
	let mut lines = input.lines();
	while let Some(line) = lines.next_line().await? {
		let line = line.trim();
		if line.is_empty() {
			continue;
		}

		let parsed = match serde_json::from_str::<HarnessInput>(line) {
			Ok(parsed) => parsed,
			Err(err) => {
				warn!(target = "ledger_connect.harness", error = %err, "skipping malformed input line");
				continue;
			}
		};

		match parsed {
			HarnessInput::Control(Control::SelectDevice(code)) => execute(bridge, code).await,
			HarnessInput::Control(Control::SetTransport(id)) => bridge.set_transport(id),
			HarnessInput::Message(data) => {
				let outcome = bridge.on_message(&WindowEvent::new(options.origin.clone(), data));
				debug!(target = "ledger_connect.harness", ?outcome, "message handled");
				if let (Inbound::Accepted(_), Some(code)) = (&outcome, options.auto_device) {
					execute(bridge, code).await;
				}
			}
		}

		if bridge.session().closed {
			debug!(target = "ledger_connect.harness", "session closed; stopping");
			break;
		}
	}
	Ok(())
}

async fn execute(bridge: &Bridge, code: DeviceCode) {
	if let Err(err) = bridge.execute_action(code).await {
		warn!(target = "ledger_connect.harness", error = %err, "device selection ignored");
	}
}
