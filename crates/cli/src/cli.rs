use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use ledger_connect_protocol::{DeviceCode, Operation};

#[derive(Parser, Debug)]
#[command(name = "ledger-connect")]
#[command(about = "Ledger connector bridge - drive hardware-wallet requests from the command line")]
#[command(version)]
pub struct Cli {
	/// Increase verbosity (-v info, -vv debug)
	#[arg(short, long, global = true, action = clap::ArgAction::Count)]
	pub verbose: u8,

	/// Connector config file (JSON)
	#[arg(long, global = true, value_name = "FILE")]
	pub config: Option<PathBuf>,

	#[command(subcommand)]
	pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
	/// Read page messages from stdin and print replies as JSON lines
	Run(RunArgs),

	/// Print a canned request (every operation when none is given)
	Sample {
		/// Operation action, e.g. ledger-sign-transaction
		operation: Option<Operation>,
	},
}

#[derive(Args, Debug, Clone, Default)]
pub struct RunArgs {
	/// Device picked for every accepted request. Without it the harness
	/// waits for a `{"select-device": "s"}` line.
	#[arg(long, value_enum)]
	pub device: Option<DeviceArg>,

	/// Transport identifier (webauthn, u2f, webusb)
	#[arg(long)]
	pub transport: Option<String>,

	/// Connector target inbound messages must carry
	#[arg(long)]
	pub target: Option<String>,

	/// Lock-detection timeout
	#[arg(long, value_name = "MS")]
	pub lock_timeout_ms: Option<u64>,

	/// Origin replies are posted to
	#[arg(long, value_name = "ORIGIN")]
	pub reply_origin: Option<String>,

	/// Origin stamped on inbound messages
	#[arg(long, default_value = "harness")]
	pub origin: String,

	/// Simulated device answer delay
	#[arg(long, value_name = "MS", default_value_t = 0)]
	pub latency_ms: u64,

	/// Status text every simulated device call fails with (e.g. 0x6804)
	#[arg(long, value_name = "STATUS")]
	pub fail_with: Option<String>,

	/// Device-code file (defaults to the user config dir)
	#[arg(long, value_name = "FILE")]
	pub store: Option<PathBuf>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceArg {
	/// Nano S
	S,
	/// Nano X
	X,
}

impl From<DeviceArg> for DeviceCode {
	fn from(arg: DeviceArg) -> Self {
		match arg {
			DeviceArg::S => DeviceCode::NanoS,
			DeviceArg::X => DeviceCode::NanoX,
		}
	}
}
