//! Window-message side of the connector.
//!
//! A page load gets one [`Bridge`]. It reads messages off the bus, holds
//! the first operation request until the user has picked a device, then
//! dispatches it and posts exactly one reply.

use std::sync::Arc;

use ledger_connect_protocol::{Action, DeviceCode, InboundMessage, Operation, Reply, WireReply};
use serde_json::Value;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::acquire::TransportAcquirer;
use crate::bus::{MessageBus, WindowEvent};
use crate::config::ConnectorConfig;
use crate::device::TransportFactory;
use crate::dispatch::Dispatcher;
use crate::error::BridgeError;
use crate::lock::LockDetector;
use crate::session::{Admission, PendingRequest, Session, SessionCell};
use crate::store::DeviceCodeStore;

/// What the bridge did with an inbound event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
	/// Not addressed to this connector, or not a message at all.
	Ignored,
	/// Request stored; waiting for [`Bridge::execute_action`].
	Accepted(Operation),
	/// Dropped because the session already holds a request for this operation.
	AlreadyPending(Operation),
	/// `close-window` handled, or the session was already closed.
	Closed,
	/// Addressed here but with a missing or unknown action.
	Unrecognized(String),
}

/// Protocol endpoint for one connector page.
pub struct Bridge {
	config: ConnectorConfig,
	session: SessionCell,
	dispatcher: Dispatcher,
	store: Arc<dyn DeviceCodeStore>,
	bus: Arc<dyn MessageBus>,
}

impl Bridge {
	/// Starts a session, seeding the device code from `store`.
	pub fn new(
		config: ConnectorConfig,
		factory: Arc<dyn TransportFactory>,
		store: Arc<dyn DeviceCodeStore>,
		bus: Arc<dyn MessageBus>,
	) -> Self {
		let device_code = store.load();
		let session = SessionCell::new(Session::new(config.transport.clone(), device_code));
		let dispatcher = Dispatcher::new(
			TransportAcquirer::new(factory),
			LockDetector::new(config.lock_check_timeout()),
		);
		debug!(
			target = "ledger_connect.bridge",
			transport = %config.transport,
			device = %device_code,
			"session created"
		);
		Self {
			config,
			session,
			dispatcher,
			store,
			bus,
		}
	}

	pub fn session(&self) -> Session {
		self.session.snapshot()
	}

	/// Read-only session updates for hint renderers.
	pub fn subscribe(&self) -> watch::Receiver<Session> {
		self.session.subscribe()
	}

	/// Transport the next dispatch will open.
	pub fn set_transport(&self, transport_id: impl Into<String>) {
		self.session.set_transport(transport_id);
	}

	pub fn on_message(&self, event: &WindowEvent) -> Inbound {
		let to = InboundMessage::target_of(&event.data);
		if to != Some(self.config.target.as_str()) {
			debug!(
				target = "ledger_connect.bridge",
				origin = %event.origin,
				to = to.unwrap_or(""),
				"ignoring message for another target"
			);
			return Inbound::Ignored;
		}
		let Some(message) = InboundMessage::from_value(&event.data) else {
			let raw_action = event.data.get("action").map(Value::to_string).unwrap_or_default();
			error!(
				target = "ledger_connect.bridge",
				origin = %event.origin,
				action = %raw_action,
				"dropping malformed message"
			);
			return Inbound::Unrecognized(raw_action);
		};

		let raw_action = message.action.clone().unwrap_or_default();
		let action = match raw_action.parse::<Action>() {
			Ok(action) => action,
			Err(err) => {
				error!(target = "ledger_connect.bridge", origin = %event.origin, error = %err, "dropping message");
				return Inbound::Unrecognized(raw_action);
			}
		};

		match action {
			Action::CloseWindow => {
				info!(target = "ledger_connect.bridge", "closing window");
				self.bus.close_window();
				self.session.close();
				Inbound::Closed
			}
			Action::Operation(operation) => self.accept(operation, message),
		}
	}

	fn accept(&self, operation: Operation, message: InboundMessage) -> Inbound {
		let request = PendingRequest {
			operation,
			params: message.params,
		};
		match self.session.accept_request(request) {
			Admission::Accepted => {}
			Admission::AlreadyAccepted(held) => {
				warn!(
					target = "ledger_connect.bridge",
					%operation,
					pending = %held,
					"request already in progress; ignoring"
				);
				return Inbound::AlreadyPending(held);
			}
			Admission::Closed => {
				warn!(target = "ledger_connect.bridge", %operation, "session closed; ignoring request");
				return Inbound::Closed;
			}
		}

		info!(target = "ledger_connect.bridge", %operation, "request accepted");
		if operation == Operation::GetExtendedPublicKey {
			self.session.force_device_code(DeviceCode::None);
			self.persist(DeviceCode::None);
		}
		Inbound::Accepted(operation)
	}

	/// Runs the accepted request with the device the user picked.
	///
	/// Fails without posting anything when no request was accepted or it has
	/// already run.
	pub async fn execute_action(&self, device_code: DeviceCode) -> Result<WireReply, BridgeError> {
		let request = self.session.begin_dispatch(device_code)?;
		self.persist(device_code);
		info!(
			target = "ledger_connect.bridge",
			operation = %request.operation,
			device = %device_code,
			"executing request"
		);

		let reply = self.dispatcher.dispatch(&request, &self.session).await;
		Ok(self.reply_message(reply))
	}

	/// Posts `reply` to the page.
	pub fn reply_message(&self, reply: Reply) -> WireReply {
		let wire = reply.into_wire();
		debug!(
			target = "ledger_connect.bridge",
			action = %wire.action,
			success = wire.success,
			origin = %self.config.reply_origin,
			"posting reply"
		);
		self.bus.post(&wire, &self.config.reply_origin);
		wire
	}

	fn persist(&self, code: DeviceCode) {
		if let Err(err) = self.store.save(code) {
			warn!(target = "ledger_connect.bridge", error = %err, "failed to persist device code");
		}
	}
}
