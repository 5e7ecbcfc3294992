use std::fmt;

use serde::{Deserialize, Serialize};

/// Symbolic error reported in a failure reply's `error` field.
///
/// Known conditions serialize to fixed strings; anything else carries the
/// raw stringified error.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ErrorCode {
	/// FIDO transport timeout or user cancel.
	LedgerTimeout,
	/// A different application is open on the device.
	LedgerWrongApp,
	/// The device is PIN-locked.
	LedgerLocked,
	/// The host environment lacks the requested transport.
	U2fNotSupported,
	/// Transport identifier not recognized.
	UnsupportedTransport,
	/// Request parameters failed validation.
	InvalidParams,
	/// Raw error text for anything unrecognized.
	Other(String),
}

impl ErrorCode {
	pub fn as_str(&self) -> &str {
		match self {
			ErrorCode::LedgerTimeout => "LEDGER_TIMEOUT",
			ErrorCode::LedgerWrongApp => "LEDGER_WRONG_APP",
			ErrorCode::LedgerLocked => "LEDGER_LOCKED",
			ErrorCode::U2fNotSupported => "U2F_NOT_SUPPORTED",
			ErrorCode::UnsupportedTransport => "UnsupportedTransport",
			ErrorCode::InvalidParams => "InvalidParams",
			ErrorCode::Other(raw) => raw,
		}
	}
}

impl fmt::Display for ErrorCode {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl From<String> for ErrorCode {
	fn from(value: String) -> Self {
		match value.as_str() {
			"LEDGER_TIMEOUT" => ErrorCode::LedgerTimeout,
			"LEDGER_WRONG_APP" => ErrorCode::LedgerWrongApp,
			"LEDGER_LOCKED" => ErrorCode::LedgerLocked,
			"U2F_NOT_SUPPORTED" => ErrorCode::U2fNotSupported,
			"UnsupportedTransport" => ErrorCode::UnsupportedTransport,
			"InvalidParams" => ErrorCode::InvalidParams,
			_ => ErrorCode::Other(value),
		}
	}
}

impl From<ErrorCode> for String {
	fn from(code: ErrorCode) -> Self {
		match code {
			ErrorCode::Other(raw) => raw,
			known => known.as_str().to_string(),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn known_codes_serialize_to_stable_strings() {
		assert_eq!(serde_json::to_value(ErrorCode::LedgerWrongApp).unwrap(), "LEDGER_WRONG_APP");
		assert_eq!(serde_json::to_value(ErrorCode::U2fNotSupported).unwrap(), "U2F_NOT_SUPPORTED");
		assert_eq!(serde_json::to_value(ErrorCode::UnsupportedTransport).unwrap(), "UnsupportedTransport");
	}

	#[test]
	fn unknown_text_is_carried_verbatim() {
		let code: ErrorCode = serde_json::from_str(r#""TransportStatusError: 0x6e00""#).unwrap();
		assert_eq!(code, ErrorCode::Other("TransportStatusError: 0x6e00".to_string()));
		assert_eq!(code.to_string(), "TransportStatusError: 0x6e00");
	}

	#[test]
	fn known_strings_parse_back_to_variants() {
		let code: ErrorCode = serde_json::from_str(r#""LEDGER_LOCKED""#).unwrap();
		assert_eq!(code, ErrorCode::LedgerLocked);
	}
}
