use ledger_connect_protocol::DeviceCode;
use parking_lot::Mutex;

use crate::error::StoreError;

/// Persisted "last used device" slot.
///
/// Loading never fails: unreadable or unrecognized state is `None`.
/// Saving `None` clears the slot.
pub trait DeviceCodeStore: Send + Sync {
	fn load(&self) -> DeviceCode;

	fn save(&self, code: DeviceCode) -> Result<(), StoreError>;
}

/// Store that lives for the process only.
#[derive(Debug, Default)]
pub struct MemoryDeviceCodeStore {
	stored: Mutex<Option<String>>,
}

impl MemoryDeviceCodeStore {
	pub fn new(initial: DeviceCode) -> Self {
		Self {
			stored: Mutex::new(initial.as_stored().map(str::to_string)),
		}
	}

	/// Raw persisted value, `None` when the slot is clear.
	pub fn raw(&self) -> Option<String> {
		self.stored.lock().clone()
	}
}

impl DeviceCodeStore for MemoryDeviceCodeStore {
	fn load(&self) -> DeviceCode {
		DeviceCode::from_stored(self.stored.lock().as_deref())
	}

	fn save(&self, code: DeviceCode) -> Result<(), StoreError> {
		*self.stored.lock() = code.as_stored().map(str::to_string);
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn saving_none_clears_slot() {
		let store = MemoryDeviceCodeStore::new(DeviceCode::NanoX);
		assert_eq!(store.load(), DeviceCode::NanoX);
		assert_eq!(store.raw().as_deref(), Some("x"));

		store.save(DeviceCode::None).unwrap();
		assert_eq!(store.raw(), None);
		assert_eq!(store.load(), DeviceCode::None);
	}
}
