use tracing_subscriber::{EnvFilter, fmt};

/// Installs the stderr subscriber.
///
/// `-v` selects info, `-vv` debug, `-vvv` trace. Without `-v`, `RUST_LOG`
/// applies, falling back to warnings only.
pub fn init_logging(verbose: u8) {
	let filter = match verbose {
		0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
		1 => EnvFilter::new("info"),
		2 => EnvFilter::new("debug"),
		_ => EnvFilter::new("trace"),
	};

	fmt()
		.with_env_filter(filter)
		.with_target(verbose > 1)
		.with_writer(std::io::stderr)
		.init();
}
