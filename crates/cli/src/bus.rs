use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};

use ledger_connect_protocol::WireReply;
use ledger_connect_runtime::MessageBus;
use parking_lot::Mutex;
use serde::Serialize;
use tracing::{info, warn};

/// One line of harness output.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutboundLine<'a> {
	pub target_origin: &'a str,
	pub message: &'a WireReply,
}

/// Message bus that writes each posted reply as a JSON line.
pub struct JsonLineBus<W> {
	out: Mutex<W>,
	closed: AtomicBool,
}

impl<W: Write + Send> JsonLineBus<W> {
	pub fn new(out: W) -> Self {
		Self {
			out: Mutex::new(out),
			closed: AtomicBool::new(false),
		}
	}

	pub fn is_closed(&self) -> bool {
		self.closed.load(Ordering::SeqCst)
	}

	pub fn with_writer<R>(&self, f: impl FnOnce(&W) -> R) -> R {
		f(&self.out.lock())
	}
}

impl<W: Write + Send> MessageBus for JsonLineBus<W> {
	fn post(&self, reply: &WireReply, target_origin: &str) {
		let line = OutboundLine {
			target_origin,
			message: reply,
		};
		let mut out = self.out.lock();
		let written = serde_json::to_writer(&mut *out, &line)
			.map_err(std::io::Error::from)
			.and_then(|()| writeln!(out))
			.and_then(|()| out.flush());
		if let Err(err) = written {
			warn!(target = "ledger_connect.bus", error = %err, action = %reply.action, "failed to write reply");
		}
	}

	fn close_window(&self) {
		info!(target = "ledger_connect.bus", "window close requested");
		self.closed.store(true, Ordering::SeqCst);
	}
}

#[cfg(test)]
mod tests {
	use ledger_connect_protocol::{ErrorCode, Operation, Reply};

	use super::*;

	#[test]
	fn replies_are_written_one_per_line() {
		let bus = JsonLineBus::new(Vec::new());
		bus.post(&Reply::failure(Operation::GetVersion, ErrorCode::LedgerLocked).into_wire(), "*");
		bus.post(&Reply::success(Operation::GetSerial, serde_json::json!({ "serial": "01" })).into_wire(), "*");

		let text = bus.with_writer(|out| String::from_utf8(out.clone()).unwrap());
		let lines: Vec<serde_json::Value> = text.lines().map(|l| serde_json::from_str(l).unwrap()).collect();
		assert_eq!(lines.len(), 2);
		assert_eq!(lines[0]["targetOrigin"], "*");
		assert_eq!(lines[0]["message"]["payload"]["error"], "LEDGER_LOCKED");
		assert_eq!(lines[1]["message"]["action"], "ledger-get-serial-reply");
	}

	#[test]
	fn close_sets_flag() {
		let bus = JsonLineBus::new(Vec::new());
		assert!(!bus.is_closed());
		bus.close_window();
		assert!(bus.is_closed());
	}
}
