//! In-memory device, transport factory and message bus.
//!
//! Used by the tests and by the command-line harness. Results are
//! deterministic functions of the request, so repeated runs give the same
//! replies.
//!
//! # Example
//!
//! ```ignore
//! let (factory, controller) = SimulatedDeviceBuilder::new()
//!     .latency(Duration::from_millis(3000))
//!     .build();
//! let bridge = Bridge::new(config, Arc::new(factory), store, bus);
//! // ... drive the bridge ...
//! assert_eq!(controller.closed(), 1);
//! ```

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use ledger_connect_protocol::{
	AddressParams, AddressType, DerivationPath, DerivedAddress, ExtendedPublicKey, SerialInfo, SignTransactionParams,
	SignedTransaction, TransportId, VersionFlags, VersionInfo, WireReply, Witness,
};
use parking_lot::Mutex;
use tokio::time::sleep;

use crate::bus::MessageBus;
use crate::device::{DeviceApp, DeviceError, Transport, TransportFactory};

const PUBLIC_KEY_LEN: usize = 32;
const CHAIN_CODE_LEN: usize = 32;
const SIGNATURE_LEN: usize = 64;
const TX_HASH_LEN: usize = 32;
const KEY_HASH_LEN: usize = 28;

/// Builder for a simulated device.
pub struct SimulatedDeviceBuilder {
	version: VersionInfo,
	serial: String,
	latency: Duration,
	failure: Option<DeviceError>,
	transport_failure: Option<DeviceError>,
}

impl SimulatedDeviceBuilder {
	pub fn new() -> Self {
		Self {
			version: VersionInfo {
				major: 2,
				minor: 0,
				patch: 4,
				flags: VersionFlags { is_debug: false },
			},
			serial: "3037303730303030".to_string(),
			latency: Duration::ZERO,
			failure: None,
			transport_failure: None,
		}
	}

	pub fn version(mut self, version: VersionInfo) -> Self {
		self.version = version;
		self
	}

	pub fn serial(mut self, serial: impl Into<String>) -> Self {
		self.serial = serial.into();
		self
	}

	/// Delay before every device call answers.
	pub fn latency(mut self, latency: Duration) -> Self {
		self.latency = latency;
		self
	}

	/// Every device call fails with `err`.
	pub fn fail_with(mut self, err: DeviceError) -> Self {
		self.failure = Some(err);
		self
	}

	/// Opening a transport fails with `err`.
	pub fn fail_transport(mut self, err: DeviceError) -> Self {
		self.transport_failure = Some(err);
		self
	}

	/// Returns the factory to hand to the bridge and a controller for
	/// inspecting what the bridge did with it.
	pub fn build(self) -> (SimulatedTransportFactory, SimulatedDeviceController) {
		let shared = Arc::new(Shared {
			version: self.version,
			serial: self.serial,
			latency: self.latency,
			failure: self.failure,
			transport_failure: self.transport_failure,
			log: Mutex::new(DeviceLog::default()),
		});
		let factory = SimulatedTransportFactory {
			shared: Arc::clone(&shared),
		};
		(factory, SimulatedDeviceController { shared })
	}
}

impl Default for SimulatedDeviceBuilder {
	fn default() -> Self {
		Self::new()
	}
}

struct Shared {
	version: VersionInfo,
	serial: String,
	latency: Duration,
	failure: Option<DeviceError>,
	transport_failure: Option<DeviceError>,
	log: Mutex<DeviceLog>,
}

#[derive(Default)]
struct DeviceLog {
	opened: usize,
	closed: usize,
	last_transport: Option<TransportId>,
	calls: HashMap<&'static str, usize>,
}

/// Inspects a simulated device after the fact.
#[derive(Clone)]
pub struct SimulatedDeviceController {
	shared: Arc<Shared>,
}

impl SimulatedDeviceController {
	/// Transports successfully opened.
	pub fn opened(&self) -> usize {
		self.shared.log.lock().opened
	}

	/// Close calls received, across all transports.
	pub fn closed(&self) -> usize {
		self.shared.log.lock().closed
	}

	pub fn last_transport(&self) -> Option<TransportId> {
		self.shared.log.lock().last_transport
	}

	/// Number of times the device app method `method` was called.
	pub fn calls(&self, method: &str) -> usize {
		self.shared.log.lock().calls.get(method).copied().unwrap_or(0)
	}
}

/// Transport factory backed by the simulated device.
pub struct SimulatedTransportFactory {
	shared: Arc<Shared>,
}

#[async_trait]
impl TransportFactory for SimulatedTransportFactory {
	async fn create(&self, id: TransportId) -> Result<Box<dyn Transport>, DeviceError> {
		if let Some(err) = &self.shared.transport_failure {
			return Err(err.clone());
		}
		{
			let mut log = self.shared.log.lock();
			log.opened += 1;
			log.last_transport = Some(id);
		}
		Ok(Box::new(SimulatedTransport {
			app: SimulatedApp {
				shared: Arc::clone(&self.shared),
			},
		}))
	}
}

struct SimulatedTransport {
	app: SimulatedApp,
}

#[async_trait]
impl Transport for SimulatedTransport {
	fn app(&self) -> &dyn DeviceApp {
		&self.app
	}

	async fn close(&self) -> Result<(), DeviceError> {
		self.app.shared.log.lock().closed += 1;
		Ok(())
	}
}

struct SimulatedApp {
	shared: Arc<Shared>,
}

impl SimulatedApp {
	/// Records the call, waits out the latency and applies any failure.
	async fn call(&self, method: &'static str) -> Result<(), DeviceError> {
		*self.shared.log.lock().calls.entry(method).or_default() += 1;
		if !self.shared.latency.is_zero() {
			sleep(self.shared.latency).await;
		}
		match &self.shared.failure {
			Some(err) => Err(err.clone()),
			None => Ok(()),
		}
	}
}

#[async_trait]
impl DeviceApp for SimulatedApp {
	async fn get_version(&self) -> Result<VersionInfo, DeviceError> {
		self.call("get_version").await?;
		Ok(self.shared.version.clone())
	}

	async fn get_serial(&self) -> Result<SerialInfo, DeviceError> {
		self.call("get_serial").await?;
		Ok(SerialInfo {
			serial: self.shared.serial.clone(),
		})
	}

	async fn get_extended_public_key(&self, path: &DerivationPath) -> Result<ExtendedPublicKey, DeviceError> {
		self.call("get_extended_public_key").await?;
		let seed = path_seed(path);
		Ok(ExtendedPublicKey {
			public_key_hex: fake_hex(seed, PUBLIC_KEY_LEN),
			chain_code_hex: fake_hex(!seed, CHAIN_CODE_LEN),
		})
	}

	async fn sign_transaction(&self, params: &SignTransactionParams) -> Result<SignedTransaction, DeviceError> {
		self.call("sign_transaction").await?;

		let mut seed = fold(u64::from(params.protocol_magic), params.fee_str.bytes().map(u64::from));
		seed = fold(seed, params.ttl_str.bytes().map(u64::from));
		for input in &params.inputs {
			seed = fold(seed, input.tx_hash_hex.bytes().map(u64::from));
			seed = fold(seed, [u64::from(input.output_index)]);
		}

		let mut paths: Vec<&DerivationPath> = Vec::new();
		let signing_paths = params
			.inputs
			.iter()
			.filter_map(|input| input.path.as_ref())
			.chain(params.certificates.iter().map(|cert| &cert.path))
			.chain(params.withdrawals.iter().map(|w| &w.path));
		for path in signing_paths {
			if !paths.contains(&path) {
				paths.push(path);
			}
		}

		let witnesses = paths
			.into_iter()
			.map(|path| Witness {
				path: path.clone(),
				witness_signature_hex: fake_hex(seed ^ path_seed(path), SIGNATURE_LEN),
			})
			.collect();

		Ok(SignedTransaction {
			tx_hash_hex: fake_hex(seed, TX_HASH_LEN),
			witnesses,
		})
	}

	async fn show_address(&self, _params: &AddressParams) -> Result<(), DeviceError> {
		self.call("show_address").await
	}

	async fn derive_address(&self, params: &AddressParams) -> Result<DerivedAddress, DeviceError> {
		self.call("derive_address").await?;
		Ok(DerivedAddress {
			address_hex: address_hex(params),
		})
	}
}

fn address_hex(params: &AddressParams) -> String {
	let spend = path_seed(&params.spending_path);
	let kind = params.address_type_nibble;
	if kind == AddressType::Byron {
		return fake_hex(spend ^ u64::from(params.network_id_or_protocol_magic), KEY_HASH_LEN + 4);
	}

	let header = (u8::from(kind) << 4) | (params.network_id_or_protocol_magic & 0x0f) as u8;
	let mut hex = format!("{header:02x}{}", fake_hex(spend, KEY_HASH_LEN));
	if kind == AddressType::Base {
		let staking = match (&params.staking.staking_path, &params.staking.staking_key_hash_hex) {
			(Some(path), _) => fake_hex(path_seed(path), KEY_HASH_LEN),
			(None, Some(hash)) => hash.to_ascii_lowercase(),
			(None, None) => String::new(),
		};
		hex.push_str(&staking);
	}
	hex
}

fn fold(seed: u64, values: impl IntoIterator<Item = u64>) -> u64 {
	values
		.into_iter()
		.fold(seed, |acc, v| (acc ^ v).wrapping_mul(0x0100_0000_01b3).rotate_left(7))
}

fn path_seed(path: &DerivationPath) -> u64 {
	fold(0xcbf2_9ce4_8422_2325, path.indices().iter().map(|&i| u64::from(i)))
}

fn fake_hex(seed: u64, bytes: usize) -> String {
	let mut state = seed ^ 0x9e37_79b9_7f4a_7c15;
	(0..bytes)
		.map(|_| {
			state = state
				.wrapping_mul(6_364_136_223_846_793_005)
				.wrapping_add(1_442_695_040_888_963_407);
			format!("{:02x}", (state >> 56) as u8)
		})
		.collect()
}

/// Bus that keeps what was posted to it.
#[derive(Debug, Default)]
pub struct RecordingBus {
	posted: Mutex<Vec<(WireReply, String)>>,
	close_requests: Mutex<usize>,
}

impl RecordingBus {
	pub fn new() -> Self {
		Self::default()
	}

	/// Replies posted so far, with the origin each was posted to.
	pub fn posted(&self) -> Vec<(WireReply, String)> {
		self.posted.lock().clone()
	}

	pub fn replies(&self) -> Vec<WireReply> {
		self.posted.lock().iter().map(|(reply, _)| reply.clone()).collect()
	}

	pub fn close_requests(&self) -> usize {
		*self.close_requests.lock()
	}
}

impl MessageBus for RecordingBus {
	fn post(&self, reply: &WireReply, target_origin: &str) {
		self.posted.lock().push((reply.clone(), target_origin.to_string()));
	}

	fn close_window(&self) {
		*self.close_requests.lock() += 1;
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn fake_hex_is_deterministic_and_sized() {
		assert_eq!(fake_hex(42, 32), fake_hex(42, 32));
		assert_ne!(fake_hex(42, 32), fake_hex(43, 32));
		assert_eq!(fake_hex(7, 28).len(), 56);
	}

	#[tokio::test]
	async fn close_is_counted_per_call() {
		let (factory, controller) = SimulatedDeviceBuilder::new().build();
		let transport = factory.create(TransportId::U2f).await.unwrap();
		transport.close().await.unwrap();
		transport.close().await.unwrap();
		assert_eq!(controller.opened(), 1);
		assert_eq!(controller.closed(), 2);
	}

	#[tokio::test]
	async fn enterprise_address_has_header_and_key_hash() {
		let (factory, _controller) = SimulatedDeviceBuilder::new().build();
		let transport = factory.create(TransportId::WebAuthn).await.unwrap();
		let params: AddressParams = serde_json::from_value(serde_json::json!({
			"addressTypeNibble": 6,
			"networkIdOrProtocolMagic": 1,
			"spendingPath": [2147485500u32, 2147485463u32, 2147483648u32, 0, 0]
		}))
		.unwrap();

		let derived = transport.app().derive_address(&params).await.unwrap();
		assert!(derived.address_hex.starts_with("61"));
		assert_eq!(derived.address_hex.len(), 2 + KEY_HASH_LEN * 2);
	}
}
