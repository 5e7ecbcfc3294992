//! Canned requests for manual testing against a device.
//!
//! Values match the mainnet fixtures the wallet uses during development.

use ledger_connect_protocol::{AddressType, CertificateKind, DerivationPath, Operation, ParamsError};
use serde_json::{Value, json};

const MAINNET_NETWORK_ID: u8 = 1;
/// Byron-era addresses are keyed by protocol magic instead of network id.
const MAINNET_PROTOCOL_MAGIC: u32 = 764_824_073;

fn path(s: &str) -> Result<DerivationPath, ParamsError> {
	s.parse()
}

/// `params` for `operation`.
pub fn sample_params(operation: Operation) -> Result<Value, ParamsError> {
	Ok(match operation {
		Operation::GetVersion | Operation::GetSerial => Value::Null,
		Operation::GetExtendedPublicKey => json!({ "hdPath": path("1852'/1815'/0'")? }),
		Operation::SignTransaction => {
			let staking = path("1852'/1815'/0'/2/0")?;
			json!({
				"networkId": MAINNET_NETWORK_ID,
				"protocolMagic": MAINNET_PROTOCOL_MAGIC,
				"inputs": [{
					"txHashHex": "e3a768c5b3109fa3268d875316063809a298602a272d7933c2b4443b69058d7a",
					"outputIndex": 0,
					"path": path("1852'/1815'/0'/0/0")?
				}],
				"outputs": [
					{
						"amountStr": "700000",
						"addressHex": "82d818582183581c9f01f38ec3af8341f45a301b075bfd6fd0cfbaddb01c5ebe780918b9a0001adb482c56"
					},
					{
						"addressTypeNibble": AddressType::Base,
						"amountStr": "100000",
						"spendingPath": path("1852'/1815'/0'/1/0")?,
						"stakingPath": staking
					}
				],
				"feeStr": "500",
				"ttlStr": "20",
				"certificates": [
					{ "type": CertificateKind::StakeRegistration, "path": staking },
					{
						"type": CertificateKind::StakeDelegation,
						"path": staking,
						"poolKeyHashHex": "df1750df9b2df285fcfb50f4740657a18ee3af42727d410c37b86207"
					},
					{ "type": CertificateKind::StakeDeregistration, "path": staking }
				],
				"withdrawals": [{ "path": staking, "amountStr": "1000000" }],
				"metadataHashHex": "deadbeefdeadbeefdeadbeefdeadbeefdeadbeefdeadbeefdeadbeefdeadbeef"
			})
		}
		Operation::ShowAddress => json!({
			"address": "Ae2tdPwUPEZ46CWnexxkBpEM4Y1Y2QQxz8zDE9TtFK6PjM7xsizBAPShHVV",
			"addressTypeNibble": AddressType::Base,
			"networkIdOrProtocolMagic": MAINNET_NETWORK_ID,
			"spendingPath": path("1852'/1815'/0'/0/0")?,
			"stakingPath": path("1852'/1815'/0'/2/0")?
		}),
		Operation::DeriveAddress => json!({
			"addressTypeNibble": AddressType::Byron,
			"networkIdOrProtocolMagic": MAINNET_PROTOCOL_MAGIC,
			"spendingPath": path("44'/1815'/0'/0/0")?
		}),
	})
}

/// Full inbound message for `operation`, addressed to `target`.
pub fn sample_request(operation: Operation, target: &str) -> Result<Value, ParamsError> {
	Ok(json!({
		"action": operation,
		"params": sample_params(operation)?,
		"target": target
	}))
}

#[cfg(test)]
mod tests {
	use ledger_connect_protocol::{InboundMessage, OperationParams};

	use super::*;

	#[test]
	fn every_sample_passes_validation() {
		for op in Operation::ALL {
			let params = sample_params(op).unwrap();
			let parsed = OperationParams::parse(op, &params).unwrap_or_else(|e| panic!("{op}: {e}"));
			assert_eq!(parsed.operation(), op);
		}
	}

	#[test]
	fn sample_request_is_addressed() {
		let value = sample_request(Operation::SignTransaction, "YOROI-LEDGER-CONNECT").unwrap();
		assert_eq!(InboundMessage::target_of(&value), Some("YOROI-LEDGER-CONNECT"));
		let message = InboundMessage::from_value(&value).unwrap();
		assert_eq!(message.action.as_deref(), Some("ledger-sign-transaction"));
		assert_eq!(value["params"]["certificates"][1]["type"], 2);
	}
}
