use clap::Parser;
use ledger_connect_cli::{cli::Cli, commands, logging};
use tracing::error;

#[tokio::main(flavor = "current_thread")]
async fn main() {
	let cli = Cli::parse();
	logging::init_logging(cli.verbose);

	if let Err(err) = commands::dispatch(cli).await {
		error!(target = "ledger_connect", error = %format!("{err:#}"), "command failed");
		std::process::exit(1);
	}
}
