//! Typed parameters for each hardware operation.
//!
//! Requests arrive with untyped `params`. [`OperationParams::parse`] turns
//! them into one of the shapes below and validates them, so malformed input
//! is rejected before any transport is opened.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::path::DerivationPath;
use crate::types::Operation;

/// Byte length of a transaction hash.
pub const TX_HASH_LEN: usize = 32;
/// Byte length of a stake pool key hash.
pub const POOL_KEY_HASH_LEN: usize = 28;
/// Byte length of a staking key hash.
pub const STAKING_KEY_HASH_LEN: usize = 28;
/// Byte length of a transaction metadata hash.
pub const METADATA_HASH_LEN: usize = 32;

/// Parameter validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParamsError {
	#[error("malformed parameters: {0}")]
	Malformed(String),

	#[error("{field}: derivation path must hold 1 to 10 indices, got {len}")]
	PathLength { field: String, len: usize },

	#[error("invalid derivation path `{0}`")]
	PathSyntax(String),

	#[error("{field}: expected {bytes}-byte hex string")]
	Hex { field: String, bytes: usize },

	#[error("{field}: expected non-empty even-length hex string")]
	HexBlob { field: String },

	#[error("{field}: expected decimal amount, got `{value}`")]
	Amount { field: String, value: String },

	#[error("{0}: at least one entry is required")]
	Empty(&'static str),

	#[error("at most one staking credential may be given")]
	ConflictingStaking,

	#[error("{kind:?} address {reason}")]
	StakingMismatch { kind: AddressType, reason: &'static str },

	#[error("certificates[{index}]: {reason}")]
	Certificate { index: usize, reason: &'static str },

	#[error("unknown address type nibble {0}")]
	AddressType(u8),

	#[error("unknown certificate type {0}")]
	CertificateType(u8),
}

/// Validated parameters, one variant per operation.
#[derive(Debug, Clone, PartialEq)]
pub enum OperationParams {
	GetVersion,
	GetSerial,
	GetExtendedPublicKey(ExtendedPublicKeyParams),
	SignTransaction(SignTransactionParams),
	ShowAddress(AddressParams),
	DeriveAddress(AddressParams),
}

impl OperationParams {
	/// Parses and validates raw `params` for `operation`.
	pub fn parse(operation: Operation, params: &Value) -> Result<Self, ParamsError> {
		Ok(match operation {
			Operation::GetVersion => OperationParams::GetVersion,
			Operation::GetSerial => OperationParams::GetSerial,
			Operation::GetExtendedPublicKey => {
				let p: ExtendedPublicKeyParams = from_params(params)?;
				p.hd_path.validate("hdPath")?;
				OperationParams::GetExtendedPublicKey(p)
			}
			Operation::SignTransaction => {
				let p: SignTransactionParams = from_params(params)?;
				p.validate()?;
				OperationParams::SignTransaction(p)
			}
			Operation::ShowAddress => {
				let p: AddressParams = from_params(params)?;
				p.validate()?;
				OperationParams::ShowAddress(p)
			}
			Operation::DeriveAddress => {
				let p: AddressParams = from_params(params)?;
				p.validate()?;
				OperationParams::DeriveAddress(p)
			}
		})
	}

	pub fn operation(&self) -> Operation {
		match self {
			OperationParams::GetVersion => Operation::GetVersion,
			OperationParams::GetSerial => Operation::GetSerial,
			OperationParams::GetExtendedPublicKey(_) => Operation::GetExtendedPublicKey,
			OperationParams::SignTransaction(_) => Operation::SignTransaction,
			OperationParams::ShowAddress(_) => Operation::ShowAddress,
			OperationParams::DeriveAddress(_) => Operation::DeriveAddress,
		}
	}
}

fn from_params<T: serde::de::DeserializeOwned>(params: &Value) -> Result<T, ParamsError> {
	serde_json::from_value(params.clone()).map_err(|e| ParamsError::Malformed(e.to_string()))
}

/// `ledger-get-extended-public-key` parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtendedPublicKeyParams {
	pub hd_path: DerivationPath,
}

/// `ledger-sign-transaction` parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignTransactionParams {
	pub network_id: u8,
	pub protocol_magic: u32,
	pub inputs: Vec<TxInput>,
	pub outputs: Vec<TxOutput>,
	pub fee_str: String,
	pub ttl_str: String,
	#[serde(default)]
	pub certificates: Vec<Certificate>,
	#[serde(default)]
	pub withdrawals: Vec<Withdrawal>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub metadata_hash_hex: Option<String>,
}

impl SignTransactionParams {
	pub fn validate(&self) -> Result<(), ParamsError> {
		if self.inputs.is_empty() {
			return Err(ParamsError::Empty("inputs"));
		}
		if self.outputs.is_empty() {
			return Err(ParamsError::Empty("outputs"));
		}

		for (i, input) in self.inputs.iter().enumerate() {
			check_hex(&input.tx_hash_hex, TX_HASH_LEN, || format!("inputs[{i}].txHashHex"))?;
			if let Some(path) = &input.path {
				path.validate(&format!("inputs[{i}].path"))?;
			}
		}

		for (i, output) in self.outputs.iter().enumerate() {
			match output {
				TxOutput::Address(out) => {
					check_hex_blob(&out.address_hex, || format!("outputs[{i}].addressHex"))?;
					check_amount(&out.amount_str, || format!("outputs[{i}].amountStr"))?;
				}
				TxOutput::Params(out) => {
					check_amount(&out.amount_str, || format!("outputs[{i}].amountStr"))?;
					out.staking.validate(out.address_type_nibble, &out.spending_path, &format!("outputs[{i}]"))?;
				}
			}
		}

		check_amount(&self.fee_str, || "feeStr".to_string())?;
		check_amount(&self.ttl_str, || "ttlStr".to_string())?;

		for (index, cert) in self.certificates.iter().enumerate() {
			cert.path.validate(&format!("certificates[{index}].path"))?;
			match (cert.kind, &cert.pool_key_hash_hex) {
				(CertificateKind::StakeDelegation, None) => {
					return Err(ParamsError::Certificate {
						index,
						reason: "delegation requires poolKeyHashHex",
					});
				}
				(CertificateKind::StakeDelegation, Some(hash)) => {
					check_hex(hash, POOL_KEY_HASH_LEN, || format!("certificates[{index}].poolKeyHashHex"))?;
				}
				(_, Some(_)) => {
					return Err(ParamsError::Certificate {
						index,
						reason: "only delegation carries poolKeyHashHex",
					});
				}
				(_, None) => {}
			}
		}

		for (i, withdrawal) in self.withdrawals.iter().enumerate() {
			withdrawal.path.validate(&format!("withdrawals[{i}].path"))?;
			check_amount(&withdrawal.amount_str, || format!("withdrawals[{i}].amountStr"))?;
		}

		if let Some(hash) = &self.metadata_hash_hex {
			check_hex(hash, METADATA_HASH_LEN, || "metadataHashHex".to_string())?;
		}
		Ok(())
	}
}

/// Unspent output being consumed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxInput {
	pub tx_hash_hex: String,
	pub output_index: u32,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub path: Option<DerivationPath>,
}

/// Transaction output: a literal address, or one the device derives itself.
///
/// An output carrying `addressHex` together with any derivation field is
/// rejected rather than read as either shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum TxOutput {
	Address(AddressOutput),
	Params(ParamsOutput),
}

const DERIVED_OUTPUT_FIELDS: [&str; 5] = [
	"addressTypeNibble",
	"spendingPath",
	"stakingPath",
	"stakingKeyHashHex",
	"stakingBlockchainPointer",
];

impl<'de> Deserialize<'de> for TxOutput {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		let output = Value::Object(Map::deserialize(deserializer)?);
		if output.get("addressHex").is_none() {
			return serde_json::from_value(output).map(TxOutput::Params).map_err(D::Error::custom);
		}
		let mixed = DERIVED_OUTPUT_FIELDS
			.iter()
			.find(|field| output.get(**field).is_some_and(|v| !v.is_null()));
		if let Some(field) = mixed {
			return Err(D::Error::custom(format!("output has both `addressHex` and `{field}`")));
		}
		serde_json::from_value(output).map(TxOutput::Address).map_err(D::Error::custom)
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressOutput {
	pub address_hex: String,
	pub amount_str: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParamsOutput {
	pub address_type_nibble: AddressType,
	pub spending_path: DerivationPath,
	pub amount_str: String,
	#[serde(flatten)]
	pub staking: StakingCredential,
}

/// Certificate kinds, numbered as the device app numbers them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum CertificateKind {
	StakeRegistration,
	StakeDeregistration,
	StakeDelegation,
}

impl TryFrom<u8> for CertificateKind {
	type Error = ParamsError;

	fn try_from(value: u8) -> Result<Self, Self::Error> {
		match value {
			0 => Ok(CertificateKind::StakeRegistration),
			1 => Ok(CertificateKind::StakeDeregistration),
			2 => Ok(CertificateKind::StakeDelegation),
			other => Err(ParamsError::CertificateType(other)),
		}
	}
}

impl From<CertificateKind> for u8 {
	fn from(kind: CertificateKind) -> Self {
		match kind {
			CertificateKind::StakeRegistration => 0,
			CertificateKind::StakeDeregistration => 1,
			CertificateKind::StakeDelegation => 2,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Certificate {
	#[serde(rename = "type")]
	pub kind: CertificateKind,
	pub path: DerivationPath,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub pool_key_hash_hex: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Withdrawal {
	pub path: DerivationPath,
	pub amount_str: String,
}

/// Shelley/Byron address header nibble.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum AddressType {
	Base,
	Pointer,
	Enterprise,
	Byron,
	Reward,
}

impl TryFrom<u8> for AddressType {
	type Error = ParamsError;

	fn try_from(value: u8) -> Result<Self, Self::Error> {
		match value {
			0b0000 => Ok(AddressType::Base),
			0b0100 => Ok(AddressType::Pointer),
			0b0110 => Ok(AddressType::Enterprise),
			0b1000 => Ok(AddressType::Byron),
			0b1110 => Ok(AddressType::Reward),
			other => Err(ParamsError::AddressType(other)),
		}
	}
}

impl From<AddressType> for u8 {
	fn from(kind: AddressType) -> Self {
		match kind {
			AddressType::Base => 0b0000,
			AddressType::Pointer => 0b0100,
			AddressType::Enterprise => 0b0110,
			AddressType::Byron => 0b1000,
			AddressType::Reward => 0b1110,
		}
	}
}

/// Position of a stake registration certificate on chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StakingPointer {
	pub block_index: u32,
	pub tx_index: u32,
	pub certificate_index: u32,
}

/// The three mutually exclusive staking credential encodings, as they sit
/// side by side on the wire. At most one may be set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StakingCredential {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub staking_path: Option<DerivationPath>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub staking_key_hash_hex: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub staking_blockchain_pointer: Option<StakingPointer>,
}

impl StakingCredential {
	fn count(&self) -> usize {
		usize::from(self.staking_path.is_some())
			+ usize::from(self.staking_key_hash_hex.is_some())
			+ usize::from(self.staking_blockchain_pointer.is_some())
	}

	/// Checks exclusivity and that the credential suits `kind`.
	pub fn validate(&self, kind: AddressType, spending_path: &DerivationPath, field: &str) -> Result<(), ParamsError> {
		spending_path.validate(&format!("{field}.spendingPath"))?;
		if self.count() > 1 {
			return Err(ParamsError::ConflictingStaking);
		}
		if let Some(path) = &self.staking_path {
			path.validate(&format!("{field}.stakingPath"))?;
		}
		if let Some(hash) = &self.staking_key_hash_hex {
			check_hex(hash, STAKING_KEY_HASH_LEN, || format!("{field}.stakingKeyHashHex"))?;
		}

		let mismatch = |reason: &'static str| -> Result<(), ParamsError> { Err(ParamsError::StakingMismatch { kind, reason }) };
		match kind {
			AddressType::Base if self.staking_path.is_none() && self.staking_key_hash_hex.is_none() => {
				mismatch("requires stakingPath or stakingKeyHashHex")
			}
			AddressType::Base if self.staking_blockchain_pointer.is_some() => mismatch("cannot use a blockchain pointer"),
			AddressType::Pointer if self.staking_blockchain_pointer.is_none() => mismatch("requires stakingBlockchainPointer"),
			AddressType::Enterprise | AddressType::Byron | AddressType::Reward if self.count() > 0 => {
				mismatch("carries no staking credential")
			}
			_ => Ok(()),
		}
	}
}

/// `ledger-show-address` / `ledger-derive-address` parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressParams {
	pub address_type_nibble: AddressType,
	pub network_id_or_protocol_magic: u32,
	pub spending_path: DerivationPath,
	#[serde(flatten)]
	pub staking: StakingCredential,
	/// Human-readable address the page expects the device to display.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub address: Option<String>,
}

impl AddressParams {
	pub fn validate(&self) -> Result<(), ParamsError> {
		self.staking.validate(self.address_type_nibble, &self.spending_path, "params")
	}
}

fn check_hex(value: &str, bytes: usize, field: impl FnOnce() -> String) -> Result<(), ParamsError> {
	if value.len() == bytes * 2 && value.bytes().all(|b| b.is_ascii_hexdigit()) {
		Ok(())
	} else {
		Err(ParamsError::Hex { field: field(), bytes })
	}
}

fn check_hex_blob(value: &str, field: impl FnOnce() -> String) -> Result<(), ParamsError> {
	if !value.is_empty() && value.len() % 2 == 0 && value.bytes().all(|b| b.is_ascii_hexdigit()) {
		Ok(())
	} else {
		Err(ParamsError::HexBlob { field: field() })
	}
}

fn check_amount(value: &str, field: impl FnOnce() -> String) -> Result<(), ParamsError> {
	let digits_only = !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit());
	if digits_only && value.parse::<u64>().is_ok() {
		Ok(())
	} else {
		Err(ParamsError::Amount {
			field: field(),
			value: value.to_string(),
		})
	}
}
