use std::time::Duration;

use ledger_connect_protocol::VersionInfo;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::device::{DeviceApp, DeviceError};
use crate::session::SessionCell;

/// Decides whether the device was PIN-locked when an operation started.
///
/// A locked device does not answer a version query until it is unlocked,
/// so a query that outlives `timeout` marks the session as locked. The
/// query itself is never cut short.
#[derive(Debug, Clone, Copy)]
pub struct LockDetector {
	timeout: Duration,
}

impl LockDetector {
	pub fn new(timeout: Duration) -> Self {
		Self { timeout }
	}

	/// Runs the version query against the lock timer.
	///
	/// On success the session moves to `DEVICE_FOUND` and the version is
	/// returned. A failing query leaves the progress state where it was.
	pub async fn detect(&self, app: &dyn DeviceApp, session: &SessionCell) -> Result<VersionInfo, DeviceError> {
		let answered = CancellationToken::new();

		let timer = async {
			tokio::select! {
				() = answered.cancelled() => {}
				() = sleep(self.timeout) => {
					if session.presume_locked() {
						info!(
							target = "ledger_connect.lock",
							timeout_ms = self.timeout.as_millis() as u64,
							"device did not answer in time; presuming locked"
						);
					}
				}
			}
		};

		let query = async {
			let result = app.get_version().await;
			answered.cancel();
			result
		};

		let ((), result) = tokio::join!(timer, query);
		let version = result?;
		debug!(
			target = "ledger_connect.lock",
			major = version.major,
			minor = version.minor,
			patch = version.patch,
			"device found"
		);
		session.device_found();
		Ok(version)
	}
}
