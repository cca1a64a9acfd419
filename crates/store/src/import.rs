//! Merging imported rows into the address skeleton.
//!
//! Each field of an imported row is applied according to its own
//! [`MergeMode`]. Writes go through an [`EditSession`], so one import is
//! one undo step. Reading the import file is the caller's job.

use std::fmt;

use nickdb_primitives::{format_block_tag, parse_block_tag, strip_block_tag};
use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::error::StoreError;
use crate::record::{AddressRecord, Field, FieldValue};
use crate::session::EditSession;

/// How one field of an imported row is applied to the existing row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum MergeMode {
	/// Leave the field alone.
	#[default]
	Skip,
	/// Replace the field. Empty imported text does not clear a nickname or
	/// initial value, but does clear a comment.
	Overwrite,
	/// Fill the field only while it is empty (unset for retentive).
	MergeIfEmpty,
	/// Comments only: join the imported comment after the existing one.
	Append,
	/// Comments only: replace just the block tag, keeping the other text.
	BlockTagOnly,
}

impl MergeMode {
	pub const fn as_str(self) -> &'static str {
		match self {
			MergeMode::Skip => "Skip",
			MergeMode::Overwrite => "Overwrite",
			MergeMode::MergeIfEmpty => "Merge",
			MergeMode::Append => "Append",
			MergeMode::BlockTagOnly => "Block Tag",
		}
	}

	/// Whether this mode can be chosen for `field`.
	pub const fn supports(self, field: Field) -> bool {
		match self {
			MergeMode::Skip | MergeMode::Overwrite => true,
			MergeMode::MergeIfEmpty => !matches!(field, Field::Comment),
			MergeMode::Append | MergeMode::BlockTagOnly => matches!(field, Field::Comment),
		}
	}
}

impl fmt::Display for MergeMode {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Per-field merge modes. Everything is skipped by default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeOptions {
	pub nickname: MergeMode,
	pub comment: MergeMode,
	pub initial_value: MergeMode,
	pub retentive: MergeMode,
}

impl MergeOptions {
	pub const fn mode(&self, field: Field) -> MergeMode {
		match field {
			Field::Nickname => self.nickname,
			Field::Comment => self.comment,
			Field::InitialValue => self.initial_value,
			Field::Retentive => self.retentive,
		}
	}

	fn check(&self) -> Result<(), ImportError> {
		match Field::ALL.into_iter().find(|&field| !self.mode(field).supports(field)) {
			Some(field) => Err(ImportError::UnsupportedMode {
				field,
				mode: self.mode(field),
			}),
			None => Ok(()),
		}
	}
}

/// Imported rows grouped under the block they were read from.
#[derive(Debug, Clone, Default)]
pub struct ImportBlock {
	pub name: String,
	pub rows: Vec<AddressRecord>,
}

#[derive(Debug, Error)]
pub enum ImportError {
	#[error("\"{mode}\" cannot be used for {field}")]
	UnsupportedMode { field: Field, mode: MergeMode },
	#[error(transparent)]
	Store(#[from] StoreError),
}

/// Value `field` of `current` takes after merging `incoming` with `mode`,
/// or `None` when the field stays as it is.
pub fn merge_field(
	mode: MergeMode,
	field: Field,
	current: &AddressRecord,
	incoming: &AddressRecord,
) -> Option<FieldValue> {
	if field == Field::Retentive {
		let value = match mode {
			MergeMode::Overwrite => incoming.retentive(),
			MergeMode::MergeIfEmpty if !current.retentive() => incoming.retentive(),
			_ => return None,
		};
		return Some(value.into());
	}

	let existing = current.get(field);
	let existing = existing.as_text().unwrap_or_default();
	let imported = incoming.get(field);
	let imported = imported.as_text().unwrap_or_default();
	let merged = match (mode, field) {
		(MergeMode::Overwrite, Field::Comment) => imported.to_string(),
		(MergeMode::Overwrite, _) if !imported.is_empty() => imported.to_string(),
		(MergeMode::MergeIfEmpty, _) if !imported.is_empty() && existing.is_empty() => {
			imported.to_string()
		}
		(MergeMode::Append, Field::Comment) if !imported.is_empty() => {
			if existing.is_empty() {
				imported.to_string()
			} else {
				format!("{existing} {imported}")
			}
		}
		(MergeMode::BlockTagOnly, Field::Comment) => {
			let tag = parse_block_tag(imported);
			let (Some(name), Some(kind)) = (tag.name, tag.kind) else {
				return None;
			};
			let tag = format_block_tag(&name, kind, None);
			let text = strip_block_tag(existing);
			if text.is_empty() { tag } else { format!("{text} {tag}") }
		}
		_ => return None,
	};
	Some(FieldValue::Text(merged))
}

/// Merges `rows` into the store with one set of modes.
///
/// Rows outside the address map are skipped. Value fields a row's memory
/// type cannot edit are left alone. Returns the number of rows processed.
pub fn merge_rows(
	session: &mut EditSession<'_>,
	rows: &[AddressRecord],
	options: &MergeOptions,
) -> Result<usize, ImportError> {
	options.check()?;
	apply_rows(session, rows, options)
}

/// Merges each block with the modes registered under its name. Blocks
/// without an entry are processed with every field skipped.
///
/// All modes are checked before anything is written.
pub fn merge_blocks(
	session: &mut EditSession<'_>,
	blocks: &[ImportBlock],
	options: &FxHashMap<String, MergeOptions>,
) -> Result<usize, ImportError> {
	for block_options in options.values() {
		block_options.check()?;
	}
	let mut processed = 0;
	for block in blocks {
		let block_options = options.get(&block.name).copied().unwrap_or_default();
		processed += apply_rows(session, &block.rows, &block_options)?;
	}
	Ok(processed)
}

fn apply_rows(
	session: &mut EditSession<'_>,
	rows: &[AddressRecord],
	options: &MergeOptions,
) -> Result<usize, ImportError> {
	let mut processed = 0;
	for incoming in rows {
		let key = incoming.key();
		let Some(current) = session.record(key) else {
			continue;
		};
		let writes: Vec<(Field, FieldValue)> = Field::ALL
			.into_iter()
			.filter(|&field| current.can_edit(field))
			.filter_map(|field| {
				merge_field(options.mode(field), field, current, incoming).map(|value| (field, value))
			})
			.collect();
		for (field, value) in writes {
			session.set_field(key, field, value)?;
		}
		processed += 1;
	}
	Ok(processed)
}
