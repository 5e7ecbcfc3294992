//! Maps raised errors onto the stable wire error taxonomy.

use ledger_connect_protocol::ErrorCode;

use crate::device::DeviceError;
use crate::error::DispatchError;

/// U2F client error code for a request that timed out or was cancelled.
const U2F_TIMEOUT_CODE: u32 = 5;
/// Status word: wrong application open on the device.
const STATUS_WRONG_APP: &str = "6804";
/// Status word: device locked.
const STATUS_LOCKED: &str = "6801";
const U2F_NOT_SUPPORTED_MESSAGE: &str = "U2F not supported";

/// Error code reported for a failed dispatch.
pub fn translate(err: &DispatchError) -> ErrorCode {
	match err {
		DispatchError::UnsupportedTransport(_) => ErrorCode::UnsupportedTransport,
		DispatchError::InvalidParams(_) => ErrorCode::InvalidParams,
		DispatchError::Device(device) => translate_device_error(device),
		DispatchError::Encode(e) => ErrorCode::Other(e.to_string()),
	}
}

/// Error code reported for an error raised by the device or its transport.
pub fn translate_device_error(err: &DeviceError) -> ErrorCode {
	match err {
		DeviceError::U2f { code, .. } if *code == U2F_TIMEOUT_CODE => ErrorCode::LedgerTimeout,
		DeviceError::U2f { kind, .. } => ErrorCode::Other(kind.clone()),
		DeviceError::Status(text) if text.contains(STATUS_WRONG_APP) => ErrorCode::LedgerWrongApp,
		DeviceError::Status(text) if text.contains(STATUS_LOCKED) => ErrorCode::LedgerLocked,
		DeviceError::Status(text) => ErrorCode::Other(text.clone()),
		DeviceError::Identified { message, .. } if message.contains(U2F_NOT_SUPPORTED_MESSAGE) => {
			ErrorCode::U2fNotSupported
		}
		other => ErrorCode::Other(other.to_string()),
	}
}
