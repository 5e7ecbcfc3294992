use std::sync::Arc;
use std::time::Duration;

use ledger_connect_protocol::{DeviceCode, ErrorCode, HARDENED, Operation, ProgressState, VersionFlags, VersionInfo};
use ledger_connect_runtime::simulated::{RecordingBus, SimulatedDeviceBuilder, SimulatedDeviceController};
use ledger_connect_runtime::{
	Bridge, BridgeError, ConnectorConfig, DeviceCodeStore, DeviceError, Inbound, MemoryDeviceCodeStore, RequestSlot,
	WindowEvent,
};
use serde_json::{Value, json};
use tokio::task::JoinHandle;

const TARGET: &str = "YOROI-LEDGER-CONNECT";
const ORIGIN: &str = "https://wallet.example";

struct Harness {
	bridge: Bridge,
	controller: SimulatedDeviceController,
	store: Arc<MemoryDeviceCodeStore>,
	bus: Arc<RecordingBus>,
}

fn harness(builder: SimulatedDeviceBuilder) -> Harness {
	harness_with(builder, ConnectorConfig::default(), DeviceCode::None)
}

fn harness_with(builder: SimulatedDeviceBuilder, config: ConnectorConfig, stored: DeviceCode) -> Harness {
	let (factory, controller) = builder.build();
	let store = Arc::new(MemoryDeviceCodeStore::new(stored));
	let bus = Arc::new(RecordingBus::new());
	let bridge = Bridge::new(config, Arc::new(factory), Arc::clone(&store) as _, Arc::clone(&bus) as _);
	Harness {
		bridge,
		controller,
		store,
		bus,
	}
}

fn request(action: &str, params: Value) -> WindowEvent {
	WindowEvent::new(
		ORIGIN,
		json!({
			"action": action,
			"params": params,
			"target": TARGET
		}),
	)
}

fn h(index: u32) -> u32 {
	index | HARDENED
}

fn account_path() -> Value {
	json!([h(1852), h(1815), h(0)])
}

fn address_params() -> Value {
	json!({
		"addressTypeNibble": 0,
		"networkIdOrProtocolMagic": 1,
		"spendingPath": [h(1852), h(1815), h(0), 0, 0],
		"stakingPath": [h(1852), h(1815), h(0), 2, 0]
	})
}

fn sign_params() -> Value {
	json!({
		"networkId": 1,
		"protocolMagic": 764824073,
		"inputs": [{
			"txHashHex": "e3a768c5b3109fa3268d875316063809a298602a272d7933c2b4443b69058d7a",
			"outputIndex": 0,
			"path": [h(1852), h(1815), h(0), 0, 0]
		}],
		"outputs": [{
			"amountStr": "700000",
			"addressHex": "82d818582183581c9f01f38ec3af8341f45a301b075bfd6fd0cfbaddb01c5ebe780918b9a0001adb482c56"
		}],
		"feeStr": "500",
		"ttlStr": "20",
		"withdrawals": [{ "path": [h(1852), h(1815), h(0), 2, 0], "amountStr": "1000000" }]
	})
}

fn params_for(op: Operation) -> Value {
	match op {
		Operation::GetVersion | Operation::GetSerial => Value::Null,
		Operation::GetExtendedPublicKey => json!({ "hdPath": account_path() }),
		Operation::SignTransaction => sign_params(),
		Operation::ShowAddress | Operation::DeriveAddress => address_params(),
	}
}

#[tokio::test]
async fn second_request_is_dropped_for_every_operation() {
	for first in Operation::ALL {
		let t = harness(SimulatedDeviceBuilder::new());
		assert_eq!(
			t.bridge.on_message(&request(first.as_str(), params_for(first))),
			Inbound::Accepted(first)
		);

		for second in Operation::ALL {
			assert_eq!(
				t.bridge.on_message(&request(second.as_str(), params_for(second))),
				Inbound::AlreadyPending(first),
				"{second} after {first}"
			);
		}

		let session = t.bridge.session();
		assert_eq!(session.current_operation, Some(first));
		assert_eq!(session.request.request().map(|r| r.operation), Some(first));
		assert_eq!(session.request_params(), Some(&params_for(first)));
		assert!(t.bus.posted().is_empty());

		let reply = t.bridge.execute_action(DeviceCode::NanoS).await.unwrap();
		assert_eq!(reply.action, first.reply_action());
		assert!(reply.success, "{first}: {:?}", reply.payload);
		assert_eq!(t.bus.replies(), vec![reply]);
	}
}

#[tokio::test]
async fn extended_public_key_request_clears_device_choice() {
	let t = harness_with(SimulatedDeviceBuilder::new(), ConnectorConfig::default(), DeviceCode::NanoX);
	assert_eq!(t.bridge.session().device_code, DeviceCode::NanoX);

	t.bridge
		.on_message(&request("ledger-get-extended-public-key", json!({ "hdPath": account_path() })));

	let session = t.bridge.session();
	assert_eq!(session.device_code, DeviceCode::None);
	assert_eq!(session.progress_state, ProgressState::DeviceTypeSelection);
	assert_eq!(t.store.load(), DeviceCode::None);
	assert_eq!(t.store.raw(), None);
}

#[tokio::test]
async fn other_requests_keep_device_choice() {
	let t = harness_with(SimulatedDeviceBuilder::new(), ConnectorConfig::default(), DeviceCode::NanoS);

	t.bridge.on_message(&request("ledger-sign-transaction", sign_params()));

	assert_eq!(t.bridge.session().device_code, DeviceCode::NanoS);
	assert_eq!(t.store.load(), DeviceCode::NanoS);
}

#[tokio::test]
async fn execute_action_persists_chosen_device() {
	let t = harness(SimulatedDeviceBuilder::new());
	t.bridge.on_message(&request("ledger-derive-address", address_params()));

	let reply = t.bridge.execute_action(DeviceCode::NanoX).await.unwrap();

	assert!(reply.success);
	assert!(reply.payload["addressHex"].as_str().is_some_and(|hex| hex.starts_with("01")));
	assert_eq!(t.store.raw().as_deref(), Some("x"));
	assert_eq!(t.bridge.session().device_code, DeviceCode::NanoX);
}

/// Records progress states from now until the device is found.
fn record_progress(bridge: &Bridge) -> JoinHandle<Vec<ProgressState>> {
	let mut rx = bridge.subscribe();
	let mut seen = vec![rx.borrow_and_update().progress_state];
	tokio::spawn(async move {
		while seen.last() != Some(&ProgressState::DeviceFound) && rx.changed().await.is_ok() {
			seen.push(rx.borrow_and_update().progress_state);
		}
		seen
	})
}

#[tokio::test(start_paused = true)]
async fn prompt_device_is_not_locked() {
	let t = harness(SimulatedDeviceBuilder::new().latency(Duration::from_millis(300)));
	t.bridge.on_message(&request("ledger-sign-transaction", sign_params()));
	let progress = record_progress(&t.bridge);

	let reply = t.bridge.execute_action(DeviceCode::NanoS).await.unwrap();

	assert!(reply.success);
	assert_eq!(reply.payload["witnesses"].as_array().map(Vec::len), Some(2));
	let session = t.bridge.session();
	assert!(!session.was_device_locked);
	assert_eq!(session.hint_step_offset(), 0);
	assert_eq!(
		progress.await.unwrap(),
		vec![
			ProgressState::DeviceTypeSelection,
			ProgressState::DeviceTypeSelected,
			ProgressState::DeviceFound,
		]
	);
}

#[tokio::test(start_paused = true)]
async fn slow_device_is_presumed_locked() {
	let t = harness(SimulatedDeviceBuilder::new().latency(Duration::from_secs(10)));
	t.bridge.on_message(&request("ledger-show-address", address_params()));
	let progress = record_progress(&t.bridge);

	let reply = t.bridge.execute_action(DeviceCode::NanoX).await.unwrap();

	assert!(reply.success);
	assert_eq!(reply.payload, Value::Null);
	let session = t.bridge.session();
	assert!(session.was_device_locked);
	assert_eq!(session.hint_step_offset(), 2);
	assert_eq!(
		progress.await.unwrap(),
		vec![
			ProgressState::DeviceTypeSelection,
			ProgressState::DeviceTypeSelected,
			ProgressState::DetectingDevice,
			ProgressState::DeviceFound,
		]
	);
}

#[tokio::test(start_paused = true)]
async fn lock_timeout_is_configurable() {
	let config = ConnectorConfig {
		lock_check_timeout_ms: 50,
		..ConnectorConfig::default()
	};
	let t = harness_with(SimulatedDeviceBuilder::new().latency(Duration::from_millis(300)), config, DeviceCode::None);
	t.bridge.on_message(&request("ledger-sign-transaction", sign_params()));

	t.bridge.execute_action(DeviceCode::NanoS).await.unwrap();

	assert!(t.bridge.session().was_device_locked);
}

#[tokio::test]
async fn transport_is_closed_once_on_success() {
	let t = harness(SimulatedDeviceBuilder::new());
	t.bridge.on_message(&request("ledger-sign-transaction", sign_params()));

	t.bridge.execute_action(DeviceCode::NanoS).await.unwrap();

	assert_eq!(t.controller.opened(), 1);
	assert_eq!(t.controller.closed(), 1);
}

#[tokio::test]
async fn transport_is_closed_once_on_failure() {
	let t = harness(SimulatedDeviceBuilder::new().fail_with(DeviceError::Status("Ledger device: 0x6801".to_string())));
	t.bridge.on_message(&request("ledger-sign-transaction", sign_params()));

	let reply = t.bridge.execute_action(DeviceCode::NanoS).await.unwrap();

	assert_eq!(reply.error(), Some(ErrorCode::LedgerLocked));
	assert_eq!(t.controller.opened(), 1);
	assert_eq!(t.controller.closed(), 1);
	assert_eq!(t.controller.calls("sign_transaction"), 0);
}

#[tokio::test]
async fn version_query_scenario() {
	let t = harness(SimulatedDeviceBuilder::new());

	t.bridge.on_message(&request("ledger-get-version", Value::Null));
	let reply = t.bridge.execute_action(DeviceCode::NanoS).await.unwrap();

	assert_eq!(
		serde_json::to_value(&reply).unwrap(),
		json!({
			"action": "ledger-get-version-reply",
			"success": true,
			"payload": { "major": 2, "minor": 0, "patch": 4, "flags": { "isDebug": false } }
		})
	);
	assert_eq!(t.bus.posted(), vec![(reply, "*".to_string())]);
	assert_eq!(t.bridge.session().progress_state, ProgressState::DeviceTypeSelected);
}

#[tokio::test]
async fn serial_query_reports_device_serial() {
	let t = harness(SimulatedDeviceBuilder::new().serial("4c4544474552"));

	t.bridge.on_message(&request("ledger-get-serial", Value::Null));
	let reply = t.bridge.execute_action(DeviceCode::NanoX).await.unwrap();

	assert_eq!(reply.action, "ledger-get-serial-reply");
	assert_eq!(reply.payload, json!({ "serial": "4c4544474552" }));
	assert_eq!(t.controller.calls("get_serial"), 1);
}

#[tokio::test]
async fn extended_public_key_carries_device_version() {
	let version = VersionInfo {
		major: 2,
		minor: 2,
		patch: 1,
		flags: VersionFlags { is_debug: true },
	};
	let t = harness(SimulatedDeviceBuilder::new().version(version));

	t.bridge
		.on_message(&request("ledger-get-extended-public-key", json!({ "hdPath": account_path() })));
	let reply = t.bridge.execute_action(DeviceCode::NanoS).await.unwrap();

	assert!(reply.success, "{:?}", reply.payload);
	assert_eq!(
		reply.payload["deviceVersion"],
		json!({ "major": 2, "minor": 2, "patch": 1, "flags": { "isDebug": true } })
	);
}

#[tokio::test]
async fn wrong_app_scenario() {
	let t = harness(SimulatedDeviceBuilder::new().fail_with(DeviceError::Status("Ledger device: Wrong app (0x6804)".to_string())));

	t.bridge
		.on_message(&request("ledger-get-extended-public-key", json!({ "hdPath": account_path() })));
	let reply = t.bridge.execute_action(DeviceCode::NanoS).await.unwrap();

	assert_eq!(
		serde_json::to_value(&reply).unwrap(),
		json!({
			"action": "ledger-get-extended-public-key-reply",
			"success": false,
			"payload": { "error": "LEDGER_WRONG_APP" }
		})
	);
	assert_eq!(t.controller.closed(), 1);
}

#[tokio::test]
async fn u2f_timeout_scenario() {
	let t = harness(SimulatedDeviceBuilder::new().fail_with(DeviceError::U2f {
		code: 5,
		kind: "TIMEOUT".to_string(),
	}));

	t.bridge.on_message(&request("ledger-get-serial", Value::Null));
	let reply = t.bridge.execute_action(DeviceCode::NanoX).await.unwrap();

	assert_eq!(reply.error(), Some(ErrorCode::LedgerTimeout));
}

#[tokio::test]
async fn unsupported_transport_scenario() {
	let t = harness(SimulatedDeviceBuilder::new());
	t.bridge.set_transport("bluetooth");

	t.bridge.on_message(&request("ledger-get-version", Value::Null));
	let reply = t.bridge.execute_action(DeviceCode::NanoS).await.unwrap();

	assert_eq!(reply.action, "ledger-get-version-reply");
	assert_eq!(reply.error(), Some(ErrorCode::UnsupportedTransport));
	assert_eq!(t.controller.opened(), 0);
	assert_eq!(t.controller.closed(), 0);
}

#[tokio::test]
async fn set_transport_picks_transport_for_dispatch() {
	let t = harness(SimulatedDeviceBuilder::new());
	t.bridge.set_transport("webusb");
	assert!(t.bridge.session().is_transport_webusb());

	t.bridge.on_message(&request("ledger-get-serial", Value::Null));
	t.bridge.execute_action(DeviceCode::NanoX).await.unwrap();

	assert_eq!(t.controller.last_transport(), Some(ledger_connect_protocol::TransportId::WebUsb));
}

#[tokio::test]
async fn invalid_params_fail_before_transport_acquisition() {
	let t = harness(SimulatedDeviceBuilder::new());
	let mut params = sign_params();
	params["inputs"] = json!([]);

	t.bridge.on_message(&request("ledger-sign-transaction", params));
	let reply = t.bridge.execute_action(DeviceCode::NanoS).await.unwrap();

	assert_eq!(reply.error(), Some(ErrorCode::InvalidParams));
	assert_eq!(t.controller.opened(), 0);
}

#[tokio::test]
async fn request_runs_only_once() {
	let t = harness(SimulatedDeviceBuilder::new());
	t.bridge.on_message(&request("ledger-get-version", Value::Null));

	t.bridge.execute_action(DeviceCode::NanoS).await.unwrap();
	let again = t.bridge.execute_action(DeviceCode::NanoS).await;

	assert_eq!(again, Err(BridgeError::AlreadyDispatched(Operation::GetVersion)));
	assert_eq!(t.bus.posted().len(), 1);
	assert!(matches!(t.bridge.session().request, RequestSlot::Dispatched(_)));
}

#[tokio::test]
async fn messages_for_other_targets_are_ignored() {
	let t = harness(SimulatedDeviceBuilder::new());
	let foreign = WindowEvent::new(
		ORIGIN,
		json!({ "action": "ledger-get-version", "params": null, "target": "TREZOR-CONNECT" }),
	);
	let untargeted = WindowEvent::new(ORIGIN, json!({ "action": "ledger-get-version" }));
	let noise = WindowEvent::new(ORIGIN, json!("webpackHotUpdate"));

	assert_eq!(t.bridge.on_message(&foreign), Inbound::Ignored);
	assert_eq!(t.bridge.on_message(&untargeted), Inbound::Ignored);
	assert_eq!(t.bridge.on_message(&noise), Inbound::Ignored);

	let session = t.bridge.session();
	assert_eq!(session.current_operation, None);
	assert_eq!(session.progress_state, ProgressState::Loading);
	assert_eq!(t.bridge.execute_action(DeviceCode::NanoS).await, Err(BridgeError::NoPendingRequest));
}

#[tokio::test]
async fn custom_target_is_honored() {
	let config = ConnectorConfig {
		target: "EMURGO-LEDGER-CONNECT".to_string(),
		..ConnectorConfig::default()
	};
	let t = harness_with(SimulatedDeviceBuilder::new(), config, DeviceCode::None);

	assert_eq!(t.bridge.on_message(&request("ledger-get-version", Value::Null)), Inbound::Ignored);
	let event = WindowEvent::new(
		ORIGIN,
		json!({ "action": "ledger-get-version", "target": "EMURGO-LEDGER-CONNECT" }),
	);
	assert_eq!(t.bridge.on_message(&event), Inbound::Accepted(Operation::GetVersion));
}

#[tokio::test]
async fn close_window_closes_without_reply() {
	let t = harness(SimulatedDeviceBuilder::new());

	assert_eq!(t.bridge.on_message(&request("close-window", Value::Null)), Inbound::Closed);

	assert_eq!(t.bus.close_requests(), 1);
	assert!(t.bus.posted().is_empty());
	assert!(t.bridge.session().closed);
	assert_eq!(t.bridge.on_message(&request("ledger-get-version", Value::Null)), Inbound::Closed);
	assert_eq!(t.bridge.execute_action(DeviceCode::NanoS).await, Err(BridgeError::Closed));
}
