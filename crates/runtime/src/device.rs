//! Capabilities the connector borrows from the hardware wallet stack.
//!
//! APDU encoding and the USB/FIDO transports are not implemented here; an
//! embedder supplies them through these traits.

use async_trait::async_trait;
use ledger_connect_protocol::{
	AddressParams, DerivationPath, DerivedAddress, ExtendedPublicKey, SerialInfo, SignTransactionParams, SignedTransaction,
	TransportId, VersionInfo,
};
use thiserror::Error;

/// Error raised by a device app call or a transport.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeviceError {
	/// FIDO U2F client error, with the client's numeric code and type name.
	#[error("U2F error {code}: {kind}")]
	U2f { code: u32, kind: String },

	/// Status reported by the device, as text (e.g. `Ledger device: 0x6804`).
	#[error("{0}")]
	Status(String),

	/// Host error carrying an identifier and a message.
	#[error("{id}: {message}")]
	Identified { id: String, message: String },

	#[error("{0}")]
	Other(String),
}

/// Cardano app on the device.
#[async_trait]
pub trait DeviceApp: Send + Sync {
	async fn get_version(&self) -> Result<VersionInfo, DeviceError>;

	async fn get_serial(&self) -> Result<SerialInfo, DeviceError>;

	async fn get_extended_public_key(&self, path: &DerivationPath) -> Result<ExtendedPublicKey, DeviceError>;

	async fn sign_transaction(&self, params: &SignTransactionParams) -> Result<SignedTransaction, DeviceError>;

	/// Shows the address on the device screen for the user to verify.
	async fn show_address(&self, params: &AddressParams) -> Result<(), DeviceError>;

	async fn derive_address(&self, params: &AddressParams) -> Result<DerivedAddress, DeviceError>;
}

/// Open channel to the device.
#[async_trait]
pub trait Transport: Send + Sync {
	/// Device app reachable over this transport.
	fn app(&self) -> &dyn DeviceApp;

	/// Releases the channel. Closing twice must not fail.
	async fn close(&self) -> Result<(), DeviceError>;
}

/// Opens transports by identifier.
///
/// May trigger a browser permission prompt outside the connector's control.
#[async_trait]
pub trait TransportFactory: Send + Sync {
	async fn create(&self, id: TransportId) -> Result<Box<dyn Transport>, DeviceError>;
}
