//! Enumerations shared by both sides of the window message bus.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Wire identifier of the WebAuthn transport.
pub const TRANSPORT_WEBAUTHN: &str = "webauthn";
/// Wire identifier of the legacy U2F transport.
pub const TRANSPORT_U2F: &str = "u2f";
/// Wire identifier of the WebUSB transport.
pub const TRANSPORT_WEBUSB: &str = "webusb";

/// Suffix appended to an operation action to form its reply action.
pub const REPLY_SUFFIX: &str = "-reply";

/// Hardware operation a page can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operation {
	#[serde(rename = "ledger-get-version")]
	GetVersion,
	#[serde(rename = "ledger-get-serial")]
	GetSerial,
	#[serde(rename = "ledger-get-extended-public-key")]
	GetExtendedPublicKey,
	#[serde(rename = "ledger-sign-transaction")]
	SignTransaction,
	#[serde(rename = "ledger-show-address")]
	ShowAddress,
	#[serde(rename = "ledger-derive-address")]
	DeriveAddress,
}

impl Operation {
	/// Every operation, in wire declaration order.
	pub const ALL: [Operation; 6] = [
		Operation::GetVersion,
		Operation::GetSerial,
		Operation::GetExtendedPublicKey,
		Operation::SignTransaction,
		Operation::ShowAddress,
		Operation::DeriveAddress,
	];

	pub fn as_str(self) -> &'static str {
		match self {
			Operation::GetVersion => "ledger-get-version",
			Operation::GetSerial => "ledger-get-serial",
			Operation::GetExtendedPublicKey => "ledger-get-extended-public-key",
			Operation::SignTransaction => "ledger-sign-transaction",
			Operation::ShowAddress => "ledger-show-address",
			Operation::DeriveAddress => "ledger-derive-address",
		}
	}

	/// Action string carried by the reply to this operation.
	pub fn reply_action(self) -> String {
		format!("{}{REPLY_SUFFIX}", self.as_str())
	}
}

impl fmt::Display for Operation {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for Operation {
	type Err = UnknownAction;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Operation::ALL
			.into_iter()
			.find(|op| op.as_str() == s)
			.ok_or_else(|| UnknownAction(s.to_string()))
	}
}

/// Inbound action: either a hardware operation or a page control request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
	Operation(Operation),
	CloseWindow,
}

impl Action {
	pub const CLOSE_WINDOW: &'static str = "close-window";

	pub fn as_str(self) -> &'static str {
		match self {
			Action::Operation(op) => op.as_str(),
			Action::CloseWindow => Self::CLOSE_WINDOW,
		}
	}
}

impl FromStr for Action {
	type Err = UnknownAction;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		if s == Self::CLOSE_WINDOW {
			return Ok(Action::CloseWindow);
		}
		s.parse().map(Action::Operation)
	}
}

impl fmt::Display for Action {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Action string that matches no known action.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown action `{0}`")]
pub struct UnknownAction(pub String);

/// Hardware model the user picked (persisted as `s` / `x`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DeviceCode {
	#[serde(rename = "s")]
	NanoS,
	#[serde(rename = "x")]
	NanoX,
	#[default]
	#[serde(rename = "none")]
	None,
}

impl DeviceCode {
	/// Persisted form; `None` has no stored representation.
	pub fn as_stored(self) -> Option<&'static str> {
		match self {
			DeviceCode::NanoS => Some("s"),
			DeviceCode::NanoX => Some("x"),
			DeviceCode::None => None,
		}
	}

	/// Lenient parse of a persisted value. Anything unrecognized is `None`.
	pub fn from_stored(value: Option<&str>) -> Self {
		match value.map(str::trim) {
			Some("s") => DeviceCode::NanoS,
			Some("x") => DeviceCode::NanoX,
			_ => DeviceCode::None,
		}
	}
}

impl fmt::Display for DeviceCode {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_stored().unwrap_or("none"))
	}
}

/// Transport protocol used to reach the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportId {
	#[serde(rename = "webauthn")]
	WebAuthn,
	U2f,
	#[serde(rename = "webusb")]
	WebUsb,
}

impl TransportId {
	pub const ALL: [TransportId; 3] = [TransportId::WebAuthn, TransportId::U2f, TransportId::WebUsb];

	pub fn as_str(self) -> &'static str {
		match self {
			TransportId::WebAuthn => TRANSPORT_WEBAUTHN,
			TransportId::U2f => TRANSPORT_U2F,
			TransportId::WebUsb => TRANSPORT_WEBUSB,
		}
	}
}

impl fmt::Display for TransportId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for TransportId {
	type Err = UnsupportedTransport;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		TransportId::ALL
			.into_iter()
			.find(|id| id.as_str() == s)
			.ok_or_else(|| UnsupportedTransport(s.to_string()))
	}
}

/// Transport identifier outside the supported set.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("transport protocol `{0}` not supported")]
pub struct UnsupportedTransport(pub String);

/// Connector progress as observed by the hint screens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProgressState {
	#[default]
	Loading,
	DeviceTypeSelection,
	DeviceTypeSelected,
	DetectingDevice,
	DeviceFound,
}
