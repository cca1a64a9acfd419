//! Validation rules for the editable fields of an address.
//!
//! These functions are pure. Validation failures are data: the store records
//! the rendered message on the affected record and never raises them.

use thiserror::Error;

use crate::key::AddrKey;
use crate::memory::DataType;

/// Maximum nickname length, in characters.
pub const NICKNAME_MAX_LENGTH: usize = 24;
/// Maximum comment length, in characters.
pub const COMMENT_MAX_LENGTH: usize = 128;

/// Maximum number of offending characters listed in an error message.
const MAX_LISTED_CHARS: usize = 3;

const INT_RANGE: (i128, i128) = (i16::MIN as i128, i16::MAX as i128);
const INT2_RANGE: (i128, i128) = (i32::MIN as i128, i32::MAX as i128);
const FLOAT_LIMIT: f64 = 3.402_823_5e38;

/// Reasons a nickname is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NicknameError {
	#[error("Too long ({len}/{max})", max = NICKNAME_MAX_LENGTH)]
	TooLong { len: usize },

	#[error("Cannot start with _")]
	LeadingUnderscore,

	/// Sorted, de-duplicated, and truncated to the first few offenders.
	#[error("Invalid: {0}")]
	InvalidChars(String),

	#[error("Duplicate")]
	Duplicate,
}

/// Reasons an initial value or comment is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueError {
	#[error("Must be 0 or 1")]
	NotBit,

	#[error("Must be integer")]
	NotInteger,

	#[error("Range: {min} to {max}")]
	OutOfRange { min: i64, max: i64 },

	#[error("Must be number")]
	NotNumber,

	#[error("Out of float range")]
	FloatOutOfRange,

	#[error("Max 4 hex digits")]
	TooManyDigits,

	#[error("Must be hex (0-9, A-F)")]
	NotHex,

	/// TXT values hold exactly one character.
	#[error("Must be single char")]
	TooLong,

	#[error("Must be ASCII")]
	NotAscii,

	#[error("Too long ({len}/{max})", max = COMMENT_MAX_LENGTH)]
	CommentTooLong { len: usize },
}

fn is_allowed_nickname_char(c: char) -> bool {
	c.is_alphanumeric() || c == ' ' || c == '_'
}

/// Checks length, leading underscore, and character set. The empty string is
/// valid and means "unassigned".
pub fn validate_nickname_format(nickname: &str) -> Result<(), NicknameError> {
	if nickname.is_empty() {
		return Ok(());
	}

	let len = nickname.chars().count();
	if len > NICKNAME_MAX_LENGTH {
		return Err(NicknameError::TooLong { len });
	}

	if nickname.starts_with('_') {
		return Err(NicknameError::LeadingUnderscore);
	}

	let mut bad: Vec<char> = nickname
		.chars()
		.filter(|&c| !is_allowed_nickname_char(c))
		.collect();
	if !bad.is_empty() {
		bad.sort_unstable();
		bad.dedup();
		bad.truncate(MAX_LISTED_CHARS);
		return Err(NicknameError::InvalidChars(bad.into_iter().collect()));
	}

	Ok(())
}

/// Full nickname check: format first, then case-insensitive uniqueness.
///
/// `is_duplicate` is the O(1) index lookup; when absent, `all_nicknames` is
/// scanned. A nickname equal to the one already stored at `exclude` is not a
/// duplicate.
pub fn validate_nickname<'a, I>(
	nickname: &str,
	all_nicknames: I,
	exclude: AddrKey,
	is_duplicate: Option<&dyn Fn(&str, AddrKey) -> bool>,
) -> Result<(), NicknameError>
where
	I: IntoIterator<Item = (AddrKey, &'a str)>,
{
	validate_nickname_format(nickname)?;
	if nickname.is_empty() {
		return Ok(());
	}

	let duplicate = match is_duplicate {
		Some(check) => check(nickname, exclude),
		None => {
			let lower = nickname.to_lowercase();
			all_nicknames
				.into_iter()
				.any(|(key, other)| key != exclude && other.to_lowercase() == lower)
		}
	};

	if duplicate {
		Err(NicknameError::Duplicate)
	} else {
		Ok(())
	}
}

/// Surrounding whitespace and single `_` separators between digits are
/// accepted, as legacy files contain both.
fn check_integer(value: &str, (min, max): (i128, i128)) -> Result<(), ValueError> {
	let value = value.trim();
	let digits = value.strip_prefix(['+', '-']).unwrap_or(value);
	let well_formed = !digits.is_empty()
		&& digits.split('_').all(|group| !group.is_empty() && group.chars().all(|c| c.is_ascii_digit()));
	if !well_formed {
		return Err(ValueError::NotInteger);
	}
	let out_of_range = ValueError::OutOfRange {
		min: min as i64,
		max: max as i64,
	};
	match value.replace('_', "").parse::<i128>() {
		Ok(n) if (min..=max).contains(&n) => Ok(()),
		_ => Err(out_of_range),
	}
}

/// Checks an initial value against the rules of its data type.
///
/// Empty is always valid. `None` stands for a data type code outside the
/// known set; such values are accepted unchecked.
pub fn validate_initial_value(value: &str, data_type: Option<DataType>) -> Result<(), ValueError> {
	if value.is_empty() {
		return Ok(());
	}

	let Some(data_type) = data_type else {
		return Ok(());
	};

	match data_type {
		DataType::Bit => match value {
			"0" | "1" => Ok(()),
			_ => Err(ValueError::NotBit),
		},
		DataType::Int => check_integer(value, INT_RANGE),
		DataType::Int2 => check_integer(value, INT2_RANGE),
		DataType::Float => {
			let parsed: f64 = value.trim().parse().map_err(|_| ValueError::NotNumber)?;
			if parsed < -FLOAT_LIMIT || parsed > FLOAT_LIMIT {
				Err(ValueError::FloatOutOfRange)
			} else {
				Ok(())
			}
		}
		DataType::Hex => {
			if value.chars().count() > 4 {
				Err(ValueError::TooManyDigits)
			} else if value.chars().all(|c| c.is_ascii_hexdigit()) {
				Ok(())
			} else {
				Err(ValueError::NotHex)
			}
		}
		DataType::Txt => {
			let mut chars = value.chars();
			match (chars.next(), chars.next()) {
				(Some(c), None) if c.is_ascii() => Ok(()),
				(Some(_), None) => Err(ValueError::NotAscii),
				_ => Err(ValueError::TooLong),
			}
		}
	}
}

/// Checks comment length.
pub fn validate_comment(comment: &str) -> Result<(), ValueError> {
	let len = comment.chars().count();
	if len > COMMENT_MAX_LENGTH {
		Err(ValueError::CommentTooLong { len })
	} else {
		Ok(())
	}
}
