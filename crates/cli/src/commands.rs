use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use ledger_connect_protocol::Operation;
use ledger_connect_runtime::simulated::SimulatedDeviceBuilder;
use ledger_connect_runtime::{Bridge, DeviceCodeStore, DeviceError, MemoryDeviceCodeStore};
use tokio::io::BufReader;
use tracing::{info, warn};

use crate::bus::JsonLineBus;
use crate::cli::{Cli, Commands, RunArgs};
use crate::config::{apply_overrides, default_store_path, load_config};
use crate::harness::{self, HarnessOptions};
use crate::samples::sample_request;
use crate::store::FileDeviceCodeStore;

pub async fn dispatch(cli: Cli) -> anyhow::Result<()> {
	match cli.command {
		Commands::Run(args) => run(cli.config.as_deref(), args).await,
		Commands::Sample { operation } => sample(cli.config.as_deref(), operation),
	}
}

async fn run(config_path: Option<&std::path::Path>, args: RunArgs) -> anyhow::Result<()> {
	let mut config = load_config(config_path)?;
	apply_overrides(&mut config, &args);

	let store: Arc<dyn DeviceCodeStore> = match args.store.clone().or_else(default_store_path) {
		Some(path) => Arc::new(FileDeviceCodeStore::new(path)),
		None => {
			warn!(target = "ledger_connect", "no config directory; device choice will not persist");
			Arc::new(MemoryDeviceCodeStore::default())
		}
	};

	let mut device = SimulatedDeviceBuilder::new().latency(Duration::from_millis(args.latency_ms));
	if let Some(status) = &args.fail_with {
		device = device.fail_with(DeviceError::Status(status.clone()));
	}
	let (factory, _controller) = device.build();

	let bus = Arc::new(JsonLineBus::new(std::io::stdout()));
	info!(
		target = "ledger_connect",
		transport = %config.transport,
		target_name = %config.target,
		"harness ready"
	);
	let bridge = Bridge::new(config, Arc::new(factory), store, bus);

	let options = HarnessOptions {
		origin: args.origin,
		auto_device: args.device.map(Into::into),
	};
	harness::run(&bridge, BufReader::new(tokio::io::stdin()), &options)
		.await
		.context("harness stopped")
}

fn sample(config_path: Option<&std::path::Path>, operation: Option<Operation>) -> anyhow::Result<()> {
	let config = load_config(config_path)?;
	let operations = match operation {
		Some(op) => vec![op],
		None => Operation::ALL.to_vec(),
	};
	for op in operations {
		let request = sample_request(op, &config.target).with_context(|| format!("building sample for {op}"))?;
		println!("{}", serde_json::to_string(&request)?);
	}
	Ok(())
}
