//! Dense address keys.
//!
//! An [`AddrKey`] packs a memory type and an address into one integer:
//! `(type_ordinal << 24) | address`. It is the key of every map in the store
//! and is never recomputed from a display string at lookup time.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::memory::MemoryType;

/// Largest address representable in the lower 24 bits of a key.
pub const MAX_ADDRESS: u32 = 0x00FF_FFFF;

const TYPE_SHIFT: u32 = 24;

/// Errors from encoding or decoding address keys.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyError {
	/// The memory type name is not one of the sixteen known types.
	#[error("invalid memory type: {0:?}")]
	InvalidMemoryType(String),

	/// The key's embedded type ordinal is out of range.
	#[error("invalid address key: {0:#x}")]
	InvalidKey(u32),

	/// The address does not fit in the 24-bit address field.
	#[error("address {address} out of range for {memory_type}")]
	AddressOutOfRange {
		memory_type: MemoryType,
		address: u32,
	},
}

/// Dense integer key of one address slot.
#[derive(
	Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct AddrKey(u32);

impl AddrKey {
	/// Encodes a memory type and address.
	pub fn encode(memory_type: MemoryType, address: u32) -> Result<Self, KeyError> {
		if address > MAX_ADDRESS {
			return Err(KeyError::AddressOutOfRange {
				memory_type,
				address,
			});
		}
		Ok(Self(((memory_type.ordinal() as u32) << TYPE_SHIFT) | address))
	}

	/// Encodes from a memory type name such as `"DS"`.
	pub fn encode_named(memory_type: &str, address: u32) -> Result<Self, KeyError> {
		Self::encode(memory_type.parse()?, address)
	}

	/// Reinterprets a raw key, checking its type ordinal.
	pub fn from_raw(raw: u32) -> Result<Self, KeyError> {
		let key = Self(raw);
		key.decode()?;
		Ok(key)
	}

	/// Splits the key back into memory type and address.
	pub fn decode(self) -> Result<(MemoryType, u32), KeyError> {
		let ordinal = self.0 >> TYPE_SHIFT;
		let memory_type = u8::try_from(ordinal)
			.ok()
			.and_then(MemoryType::from_ordinal)
			.ok_or(KeyError::InvalidKey(self.0))?;
		Ok((memory_type, self.0 & MAX_ADDRESS))
	}

	/// Raw integer value, as stored in the backing database.
	#[inline]
	pub const fn raw(self) -> u32 {
		self.0
	}
}

impl fmt::Display for AddrKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self.decode() {
			Ok((ty, addr)) => write!(f, "{}", crate::display::format_display(ty, addr)),
			Err(_) => write!(f, "{:#x}", self.0),
		}
	}
}
