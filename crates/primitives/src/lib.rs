//! Core types for the address database: memory types, address keys, display
//! addresses, validation rules, and block tags.
//!
//! Everything here is pure. Stateful concerns (records, indices, sessions,
//! history) live in `nickdb-store`.

/// Block tag parsing and formatting for address comments.
pub mod blocktag;
/// Display address formatting and parsing (`X001`, `XD0u`, `DS100`).
pub mod display;
/// Dense address keys and the memory-type codec.
pub mod key;
/// Memory type table, data types, and per-type defaults.
pub mod memory;
/// Nickname, comment, and initial value validation rules.
pub mod validation;

pub use blocktag::{
	BlockTag, TagKind, extract_block_name, format_block_tag, parse_block_tag, strip_block_tag,
};
pub use display::{format_display, normalize_display, parse_display};
pub use key::{AddrKey, KeyError};
pub use memory::{DataType, MemoryType};
pub use validation::{
	COMMENT_MAX_LENGTH, NICKNAME_MAX_LENGTH, NicknameError, ValueError, validate_comment,
	validate_initial_value, validate_nickname, validate_nickname_format,
};
