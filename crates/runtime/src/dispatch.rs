//! Routes one accepted request to the device app.

use ledger_connect_protocol::{ExtendedPublicKeyReply, OperationParams, Reply};
use serde_json::Value;
use tracing::{debug, error};

use crate::acquire::TransportAcquirer;
use crate::device::DeviceApp;
use crate::error::DispatchError;
use crate::lock::LockDetector;
use crate::session::{PendingRequest, SessionCell};
use crate::translate::translate;

/// Runs a request against the device and turns the outcome into a reply.
#[derive(Clone)]
pub struct Dispatcher {
	acquirer: TransportAcquirer,
	detector: LockDetector,
}

impl Dispatcher {
	pub fn new(acquirer: TransportAcquirer, detector: LockDetector) -> Self {
		Self { acquirer, detector }
	}

	/// Dispatches `request`. Failures come back as failure replies.
	pub async fn dispatch(&self, request: &PendingRequest, session: &SessionCell) -> Reply {
		let operation = request.operation;
		match self.run(request, session).await {
			Ok(payload) => {
				debug!(target = "ledger_connect.dispatch", %operation, "operation succeeded");
				Reply::success(operation, payload)
			}
			Err(err) => {
				let code = translate(&err);
				error!(target = "ledger_connect.dispatch", %operation, error = %err, code = %code, "operation failed");
				Reply::failure(operation, code)
			}
		}
	}

	async fn run(&self, request: &PendingRequest, session: &SessionCell) -> Result<Value, DispatchError> {
		let params = OperationParams::parse(request.operation, &request.params)?;
		let transport_id = session.read(|s| s.transport_id.clone());
		let transport = self.acquirer.acquire(&transport_id).await?;

		let result = self.invoke(&params, transport.app(), session).await;
		self.acquirer.release(transport).await;
		result
	}

	async fn invoke(&self, params: &OperationParams, app: &dyn DeviceApp, session: &SessionCell) -> Result<Value, DispatchError> {
		let payload = match params {
			OperationParams::GetVersion => serde_json::to_value(app.get_version().await?)?,
			OperationParams::GetSerial => serde_json::to_value(app.get_serial().await?)?,
			OperationParams::GetExtendedPublicKey(p) => {
				let device_version = self.detector.detect(app, session).await?;
				let e_public_key = app.get_extended_public_key(&p.hd_path).await?;
				serde_json::to_value(ExtendedPublicKeyReply {
					e_public_key,
					device_version,
				})?
			}
			OperationParams::SignTransaction(p) => {
				self.detector.detect(app, session).await?;
				serde_json::to_value(app.sign_transaction(p).await?)?
			}
			OperationParams::ShowAddress(p) => {
				self.detector.detect(app, session).await?;
				app.show_address(p).await?;
				Value::Null
			}
			OperationParams::DeriveAddress(p) => {
				self.detector.detect(app, session).await?;
				serde_json::to_value(app.derive_address(p).await?)?
			}
		};
		Ok(payload)
	}
}
