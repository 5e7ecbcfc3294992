//! BIP32 derivation paths.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::params::ParamsError;

/// Bit marking a hardened path index.
pub const HARDENED: u32 = 0x8000_0000;

/// Longest path the device app accepts.
pub const MAX_PATH_LEN: usize = 10;

/// Hierarchical derivation path, serialized as a plain index array.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DerivationPath(pub Vec<u32>);

impl DerivationPath {
	pub fn indices(&self) -> &[u32] {
		&self.0
	}

	pub fn len(&self) -> usize {
		self.0.len()
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Checks the path length against what the device accepts.
	pub fn validate(&self, field: &str) -> Result<(), ParamsError> {
		if self.is_empty() || self.len() > MAX_PATH_LEN {
			return Err(ParamsError::PathLength {
				field: field.to_string(),
				len: self.len(),
			});
		}
		Ok(())
	}
}

impl From<Vec<u32>> for DerivationPath {
	fn from(indices: Vec<u32>) -> Self {
		Self(indices)
	}
}

/// Renders `m/1852'/1815'/0'/0/0`.
impl fmt::Display for DerivationPath {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str("m")?;
		for &index in &self.0 {
			if index >= HARDENED {
				write!(f, "/{}'", index - HARDENED)?;
			} else {
				write!(f, "/{index}")?;
			}
		}
		Ok(())
	}
}

/// Parses `m/44'/1815'/0'`, with or without the leading `m/`. Both `'` and
/// `h` mark a hardened index.
impl FromStr for DerivationPath {
	type Err = ParamsError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let syntax = || ParamsError::PathSyntax(s.to_string());
		let body = s.trim();
		let body = body.strip_prefix("m/").unwrap_or(body);
		if body.is_empty() {
			return Err(syntax());
		}

		body.split('/')
			.map(|segment| {
				let (digits, hardened) = match segment.strip_suffix('\'').or_else(|| segment.strip_suffix('h')) {
					Some(digits) => (digits, true),
					None => (segment, false),
				};
				let index: u32 = digits.parse().map_err(|_| syntax())?;
				if index >= HARDENED {
					return Err(syntax());
				}
				Ok(if hardened { index + HARDENED } else { index })
			})
			.collect::<Result<Vec<_>, _>>()
			.map(DerivationPath)
	}
}
