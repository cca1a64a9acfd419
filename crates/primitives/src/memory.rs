//! PLC memory types, their address ranges, data types and per-type defaults.

use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::key::KeyError;

/// One of the sixteen PLC memory-type namespaces.
///
/// The discriminant is the fixed type ordinal stored in the upper byte of an
/// [`AddrKey`](crate::AddrKey); it must never be reordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum MemoryType {
	X = 0,
	Y = 1,
	C = 2,
	T = 3,
	CT = 4,
	SC = 5,
	DS = 6,
	DD = 7,
	DH = 8,
	DF = 9,
	XD = 10,
	YD = 11,
	TD = 12,
	CTD = 13,
	SD = 14,
	TXT = 15,
}

impl MemoryType {
	/// All memory types in ordinal order.
	pub const ALL: [MemoryType; 16] = [
		MemoryType::X,
		MemoryType::Y,
		MemoryType::C,
		MemoryType::T,
		MemoryType::CT,
		MemoryType::SC,
		MemoryType::DS,
		MemoryType::DD,
		MemoryType::DH,
		MemoryType::DF,
		MemoryType::XD,
		MemoryType::YD,
		MemoryType::TD,
		MemoryType::CTD,
		MemoryType::SD,
		MemoryType::TXT,
	];

	/// Display order of the unified view. Interleaved pairs appear as one
	/// group whose members alternate by address.
	pub const DISPLAY_GROUPS: [&'static [MemoryType]; 14] = [
		&[MemoryType::X],
		&[MemoryType::Y],
		&[MemoryType::C],
		&[MemoryType::T, MemoryType::TD],
		&[MemoryType::CT, MemoryType::CTD],
		&[MemoryType::SC],
		&[MemoryType::DS],
		&[MemoryType::DD],
		&[MemoryType::DH],
		&[MemoryType::DF],
		&[MemoryType::XD],
		&[MemoryType::YD],
		&[MemoryType::SD],
		&[MemoryType::TXT],
	];

	/// Fixed type ordinal (0-15).
	#[inline]
	pub const fn ordinal(self) -> u8 {
		self as u8
	}

	/// Looks up a memory type by ordinal.
	pub fn from_ordinal(ordinal: u8) -> Option<Self> {
		Self::ALL.get(ordinal as usize).copied()
	}

	pub const fn as_str(self) -> &'static str {
		match self {
			MemoryType::X => "X",
			MemoryType::Y => "Y",
			MemoryType::C => "C",
			MemoryType::T => "T",
			MemoryType::CT => "CT",
			MemoryType::SC => "SC",
			MemoryType::DS => "DS",
			MemoryType::DD => "DD",
			MemoryType::DH => "DH",
			MemoryType::DF => "DF",
			MemoryType::XD => "XD",
			MemoryType::YD => "YD",
			MemoryType::TD => "TD",
			MemoryType::CTD => "CTD",
			MemoryType::SD => "SD",
			MemoryType::TXT => "TXT",
		}
	}

	/// Valid backing-store address range (inclusive).
	///
	/// XD/YD use a doubled space: 0 = `XD0`, 1 = `XD0u`, 2 = `XD1` ... 16 = `XD8`.
	/// Odd addresses above 1 are hidden slots, see [`MemoryType::is_hidden_slot`].
	pub const fn address_range(self) -> RangeInclusive<u32> {
		match self {
			MemoryType::X | MemoryType::Y => 1..=816,
			MemoryType::C => 1..=2000,
			MemoryType::T => 1..=500,
			MemoryType::CT => 1..=250,
			MemoryType::SC => 1..=1000,
			MemoryType::DS => 1..=4500,
			MemoryType::DD => 1..=1000,
			MemoryType::DH => 1..=500,
			MemoryType::DF => 1..=500,
			MemoryType::XD | MemoryType::YD => 0..=16,
			MemoryType::TD => 1..=500,
			MemoryType::CTD => 1..=250,
			MemoryType::SD => 1..=1000,
			MemoryType::TXT => 1..=1000,
		}
	}

	/// Returns `true` for XD/YD upper-byte slots that never appear in a view.
	pub const fn is_hidden_slot(self, address: u32) -> bool {
		matches!(self, MemoryType::XD | MemoryType::YD) && address >= 3 && address % 2 == 1
	}

	/// Iterates the visible addresses of this type in ascending order.
	pub fn visible_addresses(self) -> impl Iterator<Item = u32> {
		self.address_range()
			.filter(move |&addr| !self.is_hidden_slot(addr))
	}

	/// Default data type of slots of this memory type.
	pub const fn data_type(self) -> DataType {
		match self {
			MemoryType::X
			| MemoryType::Y
			| MemoryType::C
			| MemoryType::T
			| MemoryType::CT
			| MemoryType::SC => DataType::Bit,
			MemoryType::DS | MemoryType::SD | MemoryType::TD => DataType::Int,
			MemoryType::DD | MemoryType::CTD => DataType::Int2,
			MemoryType::DF => DataType::Float,
			MemoryType::DH | MemoryType::XD | MemoryType::YD => DataType::Hex,
			MemoryType::TXT => DataType::Txt,
		}
	}

	/// Retentive flag a freshly created slot carries.
	pub const fn default_retentive(self) -> bool {
		matches!(
			self,
			MemoryType::CT
				| MemoryType::DS
				| MemoryType::DD
				| MemoryType::DH
				| MemoryType::DF
				| MemoryType::CTD
				| MemoryType::TXT
		)
	}

	/// System types whose initial value and retentive flag are fixed.
	pub const fn is_value_editable(self) -> bool {
		!matches!(
			self,
			MemoryType::SC | MemoryType::SD | MemoryType::XD | MemoryType::YD
		)
	}

	/// Same-address partner of an interleaved pair (T/TD, CT/CTD).
	pub const fn interleaved_partner(self) -> Option<MemoryType> {
		match self {
			MemoryType::T => Some(MemoryType::TD),
			MemoryType::TD => Some(MemoryType::T),
			MemoryType::CT => Some(MemoryType::CTD),
			MemoryType::CTD => Some(MemoryType::CT),
			_ => None,
		}
	}

	/// Group used for block-tag matching: both members of an interleaved pair
	/// share the group of the bit type, every other type is its own group.
	pub const fn block_group(self) -> MemoryType {
		match self {
			MemoryType::TD => MemoryType::T,
			MemoryType::CTD => MemoryType::CT,
			other => other,
		}
	}
}

impl fmt::Display for MemoryType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for MemoryType {
	type Err = KeyError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::ALL
			.into_iter()
			.find(|ty| ty.as_str().eq_ignore_ascii_case(s))
			.ok_or_else(|| KeyError::InvalidMemoryType(s.to_string()))
	}
}

/// Data type of an address slot, as stored in the backing database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
	/// `"0"` or `"1"`.
	Bit,
	/// 16-bit signed.
	Int,
	/// 32-bit signed.
	Int2,
	/// IEEE float.
	Float,
	/// Up to four hex digits.
	Hex,
	/// One ASCII character.
	Txt,
}

impl DataType {
	/// Database code for this type.
	pub const fn code(self) -> u8 {
		match self {
			DataType::Bit => 0,
			DataType::Int => 1,
			DataType::Int2 => 2,
			DataType::Float => 3,
			DataType::Hex => 4,
			DataType::Txt => 6,
		}
	}

	/// Maps a database code back to a type. Unknown codes yield `None`.
	pub const fn from_code(code: u8) -> Option<Self> {
		match code {
			0 => Some(DataType::Bit),
			1 => Some(DataType::Int),
			2 => Some(DataType::Int2),
			3 => Some(DataType::Float),
			4 => Some(DataType::Hex),
			6 => Some(DataType::Txt),
			_ => None,
		}
	}

	pub const fn as_str(self) -> &'static str {
		match self {
			DataType::Bit => "BIT",
			DataType::Int => "INT",
			DataType::Int2 => "INT2",
			DataType::Float => "FLOAT",
			DataType::Hex => "HEX",
			DataType::Txt => "TXT",
		}
	}
}

impl fmt::Display for DataType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}
