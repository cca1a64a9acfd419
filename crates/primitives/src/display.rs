//! Display addresses.
//!
//! Most types display as `<TYPE><address>`. X/Y pad to three digits
//! (`X001`). XD/YD map their doubled backing space onto `XD0`, `XD0u`,
//! `XD1` .. `XD8`.

use crate::memory::MemoryType;

/// Formats a backing-store address for display.
///
/// Hidden XD/YD slots format as the even slot below them; they never reach
/// a view, so the collision is harmless.
pub fn format_display(memory_type: MemoryType, address: u32) -> String {
	match memory_type {
		MemoryType::XD | MemoryType::YD => match address {
			0 => format!("{memory_type}0"),
			1 => format!("{memory_type}0u"),
			n => format!("{memory_type}{}", n / 2),
		},
		MemoryType::X | MemoryType::Y => format!("{memory_type}{address:03}"),
		_ => format!("{memory_type}{address}"),
	}
}

/// Parses a display address (`"x1"`, `"XD0u"`, `"DS100"`) to its memory type
/// and backing address. Returns `None` for malformed input, unknown types, or
/// an upper-byte suffix on anything but `XD0`/`YD0`.
pub fn parse_display(text: &str) -> Option<(MemoryType, u32)> {
	let text = text.trim();
	let split = text.find(|c: char| c.is_ascii_digit())?;
	let (prefix, rest) = text.split_at(split);
	if prefix.is_empty() || !prefix.chars().all(|c| c.is_ascii_alphabetic()) {
		return None;
	}
	let memory_type: MemoryType = prefix.parse().ok()?;

	let (digits, upper) = match rest.strip_suffix(['u', 'U']) {
		Some(digits) => (digits, true),
		None => (rest, false),
	};
	if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
		return None;
	}
	let number: u32 = digits.parse().ok()?;

	match memory_type {
		MemoryType::XD | MemoryType::YD => match (number, upper) {
			(0, upper) => Some((memory_type, u32::from(upper))),
			(_, true) => None,
			(n, false) => Some((memory_type, n.checked_mul(2)?)),
		},
		_ if upper => None,
		_ => Some((memory_type, number)),
	}
}

/// Canonical display form of a user-typed address (`"x1"` becomes `"X001"`).
pub fn normalize_display(text: &str) -> Option<String> {
	parse_display(text).map(|(ty, addr)| format_display(ty, addr))
}
