//! Success payloads returned by the device app.

use serde::{Deserialize, Serialize};

use crate::path::DerivationPath;

/// Device app version (`ledger-get-version` payload).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionInfo {
	pub major: u8,
	pub minor: u8,
	pub patch: u8,
	#[serde(default)]
	pub flags: VersionFlags,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionFlags {
	pub is_debug: bool,
}

/// Device serial (`ledger-get-serial` payload).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SerialInfo {
	pub serial: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtendedPublicKey {
	pub public_key_hex: String,
	pub chain_code_hex: String,
}

/// `ledger-get-extended-public-key` payload: the key plus the version the
/// device reported while it was being detected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtendedPublicKeyReply {
	pub e_public_key: ExtendedPublicKey,
	pub device_version: VersionInfo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Witness {
	pub path: DerivationPath,
	pub witness_signature_hex: String,
}

/// `ledger-sign-transaction` payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedTransaction {
	pub tx_hash_hex: String,
	pub witnesses: Vec<Witness>,
}

/// `ledger-derive-address` payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DerivedAddress {
	pub address_hex: String,
}
