use std::sync::Arc;

use ledger_connect_protocol::TransportId;
use tracing::{debug, warn};

use crate::device::{Transport, TransportFactory};
use crate::error::DispatchError;

/// Opens and releases device transports for the dispatcher.
#[derive(Clone)]
pub struct TransportAcquirer {
	factory: Arc<dyn TransportFactory>,
}

impl TransportAcquirer {
	pub fn new(factory: Arc<dyn TransportFactory>) -> Self {
		Self { factory }
	}

	/// Opens a transport for the wire identifier `transport_id`.
	///
	/// Unknown identifiers fail before the factory is asked for anything.
	pub async fn acquire(&self, transport_id: &str) -> Result<Box<dyn Transport>, DispatchError> {
		let id: TransportId = transport_id.parse()?;
		debug!(target = "ledger_connect.transport", transport = %id, "opening transport");
		let transport = self.factory.create(id).await?;
		Ok(transport)
	}

	/// Closes a transport. Failures are logged and otherwise ignored.
	pub async fn release(&self, transport: Box<dyn Transport>) {
		match transport.close().await {
			Ok(()) => debug!(target = "ledger_connect.transport", "transport closed"),
			Err(err) => warn!(target = "ledger_connect.transport", error = %err, "failed to close transport"),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::simulated::SimulatedDeviceBuilder;

	#[tokio::test]
	async fn unsupported_identifier_never_reaches_factory() {
		let (factory, controller) = SimulatedDeviceBuilder::new().build();
		let acquirer = TransportAcquirer::new(Arc::new(factory));

		let err = acquirer.acquire("bluetooth").await.err();
		assert!(matches!(err, Some(DispatchError::UnsupportedTransport(_))));
		assert_eq!(controller.opened(), 0);
	}

	#[tokio::test]
	async fn acquire_then_release_closes_once() {
		let (factory, controller) = SimulatedDeviceBuilder::new().build();
		let acquirer = TransportAcquirer::new(Arc::new(factory));

		let transport = acquirer.acquire("webusb").await.unwrap();
		acquirer.release(transport).await;
		assert_eq!(controller.opened(), 1);
		assert_eq!(controller.closed(), 1);
		assert_eq!(controller.last_transport(), Some(TransportId::WebUsb));
	}
}
