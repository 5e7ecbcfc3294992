//! Per-page session state and its transitions.
//!
//! [`Session`] is plain data. [`SessionCell`] owns it behind a
//! [`tokio::sync::watch`] channel: the bridge mutates it through the named
//! transitions below, and hint renderers hold receivers that only ever see
//! complete snapshots.

use ledger_connect_protocol::{
	DeviceCode, Operation, ProgressState, TRANSPORT_U2F, TRANSPORT_WEBAUTHN, TRANSPORT_WEBUSB,
};
use serde_json::Value;
use tokio::sync::watch;

use crate::error::BridgeError;

/// Extra hint steps shown when the device had to be unlocked first.
pub const LOCKED_STEP_OFFSET: usize = 2;

/// Operation accepted from the page, with its parameters still raw.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingRequest {
	pub operation: Operation,
	pub params: Value,
}

/// Lifecycle of the single request a session may carry.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum RequestSlot {
	#[default]
	Empty,
	Accepted(PendingRequest),
	Dispatched(PendingRequest),
}

impl RequestSlot {
	pub fn request(&self) -> Option<&PendingRequest> {
		match self {
			RequestSlot::Empty => None,
			RequestSlot::Accepted(req) | RequestSlot::Dispatched(req) => Some(req),
		}
	}
}

/// Snapshot of one connector page's protocol state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
	pub transport_id: String,
	pub progress_state: ProgressState,
	pub current_operation: Option<Operation>,
	pub device_code: DeviceCode,
	pub was_device_locked: bool,
	pub request: RequestSlot,
	pub closed: bool,
}

impl Session {
	pub fn new(transport_id: impl Into<String>, device_code: DeviceCode) -> Self {
		Self {
			transport_id: transport_id.into(),
			device_code,
			..Self::default()
		}
	}

	pub fn is_transport_webauthn(&self) -> bool {
		self.transport_id == TRANSPORT_WEBAUTHN
	}

	pub fn is_transport_u2f(&self) -> bool {
		self.transport_id == TRANSPORT_U2F
	}

	pub fn is_transport_webusb(&self) -> bool {
		self.transport_id == TRANSPORT_WEBUSB
	}

	/// How far hint step numbering shifts for this session.
	pub fn hint_step_offset(&self) -> usize {
		if self.was_device_locked { LOCKED_STEP_OFFSET } else { 0 }
	}

	/// Raw parameters of the accepted request, for hint screens.
	pub fn request_params(&self) -> Option<&Value> {
		self.request.request().map(|req| &req.params)
	}
}

/// Result of offering a request to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
	Accepted,
	/// A request was already taken; carries the operation that holds the slot.
	AlreadyAccepted(Operation),
	Closed,
}

/// Shared, observable session.
#[derive(Debug)]
pub struct SessionCell {
	tx: watch::Sender<Session>,
}

impl SessionCell {
	pub fn new(session: Session) -> Self {
		let (tx, _rx) = watch::channel(session);
		Self { tx }
	}

	/// Read-only view for hint renderers.
	pub fn subscribe(&self) -> watch::Receiver<Session> {
		self.tx.subscribe()
	}

	pub fn snapshot(&self) -> Session {
		self.tx.borrow().clone()
	}

	pub fn read<R>(&self, f: impl FnOnce(&Session) -> R) -> R {
		f(&self.tx.borrow())
	}

	/// Stores `request` if the slot is empty and moves to device selection.
	pub fn accept_request(&self, request: PendingRequest) -> Admission {
		let mut admission = Admission::Closed;
		self.tx.send_if_modified(|s| {
			if s.closed {
				return false;
			}
			if let Some(held) = s.request.request() {
				admission = Admission::AlreadyAccepted(held.operation);
				return false;
			}
			s.current_operation = Some(request.operation);
			s.progress_state = ProgressState::DeviceTypeSelection;
			s.request = RequestSlot::Accepted(request);
			admission = Admission::Accepted;
			true
		});
		admission
	}

	pub fn force_device_code(&self, code: DeviceCode) {
		self.tx.send_if_modified(|s| {
			let changed = s.device_code != code;
			s.device_code = code;
			changed
		});
	}

	/// Records the chosen device and hands out the accepted request.
	pub fn begin_dispatch(&self, code: DeviceCode) -> Result<PendingRequest, BridgeError> {
		let mut outcome = Err(BridgeError::NoPendingRequest);
		self.tx.send_if_modified(|s| {
			if s.closed {
				outcome = Err(BridgeError::Closed);
				return false;
			}
			let request = match std::mem::take(&mut s.request) {
				RequestSlot::Accepted(req) => req,
				RequestSlot::Dispatched(req) => {
					outcome = Err(BridgeError::AlreadyDispatched(req.operation));
					s.request = RequestSlot::Dispatched(req);
					return false;
				}
				RequestSlot::Empty => return false,
			};
			s.device_code = code;
			s.progress_state = ProgressState::DeviceTypeSelected;
			s.request = RequestSlot::Dispatched(request.clone());
			outcome = Ok(request);
			true
		});
		outcome
	}

	/// Timer side of lock detection. Returns whether the session moved.
	pub fn presume_locked(&self) -> bool {
		self.tx.send_if_modified(|s| {
			if s.progress_state != ProgressState::DeviceTypeSelected {
				return false;
			}
			s.progress_state = ProgressState::DetectingDevice;
			s.was_device_locked = true;
			true
		})
	}

	pub fn device_found(&self) {
		self.tx.send_if_modified(|s| {
			let changed = s.progress_state != ProgressState::DeviceFound;
			s.progress_state = ProgressState::DeviceFound;
			changed
		});
	}

	pub fn set_transport(&self, transport_id: impl Into<String>) {
		let transport_id = transport_id.into();
		self.tx.send_if_modified(|s| {
			if s.transport_id == transport_id {
				return false;
			}
			s.transport_id = transport_id;
			true
		});
	}

	/// Marks the session terminal. Returns `false` if it was already closed.
	pub fn close(&self) -> bool {
		self.tx.send_if_modified(|s| {
			if s.closed {
				return false;
			}
			s.closed = true;
			true
		})
	}
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	fn request(operation: Operation) -> PendingRequest {
		PendingRequest {
			operation,
			params: json!({}),
		}
	}

	#[test]
	fn first_request_wins() {
		let cell = SessionCell::new(Session::new("webauthn", DeviceCode::NanoS));
		assert_eq!(cell.accept_request(request(Operation::SignTransaction)), Admission::Accepted);
		assert_eq!(
			cell.accept_request(request(Operation::GetVersion)),
			Admission::AlreadyAccepted(Operation::SignTransaction)
		);

		let session = cell.snapshot();
		assert_eq!(session.current_operation, Some(Operation::SignTransaction));
		assert_eq!(session.progress_state, ProgressState::DeviceTypeSelection);
	}

	#[test]
	fn dispatch_happens_once() {
		let cell = SessionCell::new(Session::default());
		assert_eq!(cell.begin_dispatch(DeviceCode::NanoX), Err(BridgeError::NoPendingRequest));

		cell.accept_request(request(Operation::GetSerial));
		let taken = cell.begin_dispatch(DeviceCode::NanoX).unwrap();
		assert_eq!(taken.operation, Operation::GetSerial);
		assert_eq!(
			cell.begin_dispatch(DeviceCode::NanoX),
			Err(BridgeError::AlreadyDispatched(Operation::GetSerial))
		);

		let session = cell.snapshot();
		assert_eq!(session.device_code, DeviceCode::NanoX);
		assert_eq!(session.progress_state, ProgressState::DeviceTypeSelected);
		assert!(matches!(session.request, RequestSlot::Dispatched(_)));
	}

	#[test]
	fn presume_locked_only_from_device_type_selected() {
		let cell = SessionCell::new(Session::default());
		assert!(!cell.presume_locked());

		cell.accept_request(request(Operation::GetVersion));
		cell.begin_dispatch(DeviceCode::NanoS).unwrap();
		assert!(cell.presume_locked());

		let session = cell.snapshot();
		assert_eq!(session.progress_state, ProgressState::DetectingDevice);
		assert!(session.was_device_locked);
		assert_eq!(session.hint_step_offset(), LOCKED_STEP_OFFSET);
	}

	#[test]
	fn closed_session_refuses_requests() {
		let cell = SessionCell::new(Session::default());
		assert!(cell.close());
		assert!(!cell.close());
		assert_eq!(cell.accept_request(request(Operation::GetVersion)), Admission::Closed);
	}

	#[test]
	fn subscribers_see_transitions() {
		let cell = SessionCell::new(Session::new("u2f", DeviceCode::None));
		let mut rx = cell.subscribe();
		assert!(rx.borrow_and_update().is_transport_u2f());

		cell.set_transport("webusb");
		assert!(rx.has_changed().unwrap());
		assert!(rx.borrow_and_update().is_transport_webusb());

		cell.set_transport("webusb");
		assert!(!rx.has_changed().unwrap());
	}
}
