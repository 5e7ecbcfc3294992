use ledger_connect_protocol::{Operation, ParamsError, UnsupportedTransport};
use thiserror::Error;

use crate::device::DeviceError;

/// Failure of a single dispatched operation.
///
/// Every variant ends up as a failure reply; none escapes the dispatcher.
#[derive(Debug, Error)]
pub enum DispatchError {
	#[error(transparent)]
	UnsupportedTransport(#[from] UnsupportedTransport),

	#[error("invalid parameters: {0}")]
	InvalidParams(#[from] ParamsError),

	#[error(transparent)]
	Device(#[from] DeviceError),

	#[error("failed to encode result: {0}")]
	Encode(#[from] serde_json::Error),
}

/// Misuse of the bridge by its embedder.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BridgeError {
	#[error("no request has been accepted in this session")]
	NoPendingRequest,

	#[error("request `{0}` was already dispatched")]
	AlreadyDispatched(Operation),

	#[error("session is closed")]
	Closed,
}

/// Persisted device-code storage failure.
#[derive(Debug, Error)]
#[error("device code store: {0}")]
pub struct StoreError(pub String);
