//! Multi-row edits: fill down and clone structure.
//!
//! Both replicate template rows onto empty destination rows, incrementing
//! the rightmost number in each nickname. They write through an
//! [`EditSession`], so one call is one undo step.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use nickdb_primitives::{AddrKey, MemoryType};
use regex::Regex;
use thiserror::Error;

use crate::KeySet;
use crate::error::{Result, StoreError};
use crate::record::{AddressRecord, Content, Field};
use crate::session::EditSession;

static NUMBER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[0-9]+").expect("valid regex"));

/// Why a row operation cannot run on the given selection.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RowOpError {
	#[error("Select multiple rows")]
	NeedMultipleRows,
	#[error("First row must have a nickname")]
	FirstRowUnnamed,
	#[error("First nickname must contain a number")]
	FirstNicknameWithoutNumber,
	#[error("Other selected rows must be empty")]
	TargetsNotEmpty,
	#[error("Select rows to clone")]
	NothingSelected,
	#[error("At least one nickname must contain a number")]
	NoNumberedNickname,
	#[error("Destination row {0} is not empty. All destination rows must be empty.")]
	DestinationNotEmpty(String),
	#[error(
		"Destination row {address} is a different memory type ({memory_type}). Clone cannot cross memory type boundaries."
	)]
	DestinationTypeMismatch {
		address: String,
		memory_type: MemoryType,
	},
	#[error("Clone needs {needed} destination rows, got {available}")]
	NotEnoughDestinations { needed: usize, available: usize },
}

/// Result of [`increment_nickname_suffix`] when the nickname holds a number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Incremented {
	pub nickname: String,
	pub from: u64,
	pub to: u64,
}

fn has_number(nickname: &str) -> bool {
	NUMBER.is_match(nickname)
}

/// Adds `increment` to the rightmost number in `nickname`, keeping its
/// zero padding. `None` if there is no number or it overflows.
pub fn increment_nickname_suffix(nickname: &str, increment: u64) -> Option<Incremented> {
	let found = NUMBER.find_iter(nickname).last()?;
	let digits = found.as_str();
	let from: u64 = digits.parse().ok()?;
	let to = from.checked_add(increment)?;
	let nickname = format!(
		"{}{:0width$}{}",
		&nickname[..found.start()],
		to,
		&nickname[found.end()..],
		width = digits.len()
	);
	Some(Incremented { nickname, from, to })
}

/// Checks a fill-down selection: a numbered first row followed by empty
/// rows.
pub fn can_fill_down(rows: &[&AddressRecord]) -> std::result::Result<(), RowOpError> {
	let [first, rest @ ..] = rows else {
		return Err(RowOpError::NeedMultipleRows);
	};
	if rest.is_empty() {
		return Err(RowOpError::NeedMultipleRows);
	}
	if first.nickname().is_empty() {
		return Err(RowOpError::FirstRowUnnamed);
	}
	if !has_number(first.nickname()) {
		return Err(RowOpError::FirstNicknameWithoutNumber);
	}
	if rest.iter().any(|row| !row.is_empty()) {
		return Err(RowOpError::TargetsNotEmpty);
	}
	Ok(())
}

/// Checks a clone template: at least one row, one numbered nickname.
pub fn can_clone_structure(rows: &[&AddressRecord]) -> std::result::Result<(), RowOpError> {
	if rows.is_empty() {
		return Err(RowOpError::NothingSelected);
	}
	if rows.iter().any(|row| has_number(row.nickname())) {
		Ok(())
	} else {
		Err(RowOpError::NoNumberedNickname)
	}
}

/// Destination rows must be empty and of a memory type the template uses.
pub fn validate_clone_destination(
	template: &[&AddressRecord],
	destination: &[&AddressRecord],
) -> std::result::Result<(), RowOpError> {
	let types: BTreeSet<MemoryType> = template.iter().map(|row| row.memory_type()).collect();
	for row in destination {
		if !row.is_empty() {
			return Err(RowOpError::DestinationNotEmpty(row.display_address()));
		}
		if !types.contains(&row.memory_type()) {
			return Err(RowOpError::DestinationTypeMismatch {
				address: row.display_address(),
				memory_type: row.memory_type(),
			});
		}
	}
	Ok(())
}

/// Errors of [`fill_down`] and [`clone_structure`].
#[derive(Debug, Error)]
pub enum RowEditError {
	#[error(transparent)]
	Rejected(#[from] RowOpError),
	#[error(transparent)]
	Store(#[from] StoreError),
}

/// Copies `source` onto `targets` with nicknames numbered onward.
///
/// Returns the written keys plus `source`.
pub fn fill_down(
	session: &mut EditSession<'_>,
	source: AddrKey,
	targets: &[AddrKey],
	increment_initial_value: bool,
) -> std::result::Result<KeySet, RowEditError> {
	{
		let store = session.store();
		let rows = lookup(store, std::iter::once(&source).chain(targets))?;
		can_fill_down(&rows)?;
	}
	let mut affected = clone_structure(session, &[source], targets, targets.len(), increment_initial_value)?;
	affected.insert(source);
	Ok(affected)
}

/// Writes `clone_count` copies of the `template` rows onto `destination`.
///
/// Copy `n` (starting at 1) goes to `destination[(n - 1) * template.len()..]`
/// and has `n` added to the rightmost number of each nickname. Template rows
/// without a nickname still copy their comment, initial value and retentive
/// flag. With `increment_initial_value`, an initial value equal to the
/// nickname's number follows it. Value fields a destination type cannot
/// edit are skipped.
pub fn clone_structure(
	session: &mut EditSession<'_>,
	template: &[AddrKey],
	destination: &[AddrKey],
	clone_count: usize,
	increment_initial_value: bool,
) -> std::result::Result<KeySet, RowEditError> {
	let needed = clone_count * template.len();
	if destination.len() < needed {
		return Err(RowOpError::NotEnoughDestinations {
			needed,
			available: destination.len(),
		}
		.into());
	}
	let destination = &destination[..needed];

	let contents: Vec<Content> = {
		let store = session.store();
		let template_rows = lookup(store, template)?;
		can_clone_structure(&template_rows)?;
		let destination_rows = lookup(store, destination)?;
		validate_clone_destination(&template_rows, &destination_rows)?;
		template_rows.iter().map(|row| row.content().clone()).collect()
	};

	let mut affected = KeySet::new();
	for (idx, &key) in destination.iter().enumerate() {
		let copy = (idx / template.len() + 1) as u64;
		let source = &contents[idx % template.len()];
		let (nickname, initial_value) = cloned_fields(source, copy, increment_initial_value);

		if let Some(nickname) = nickname {
			session.set_field(key, Field::Nickname, nickname)?;
		}
		session.set_field(key, Field::Comment, source.comment.as_str())?;
		let editable = session
			.record(key)
			.is_some_and(|record| record.can_edit(Field::InitialValue));
		if editable {
			session.set_field(key, Field::InitialValue, initial_value)?;
			session.set_field(key, Field::Retentive, source.retentive)?;
		}
		affected.insert(key);
	}
	Ok(affected)
}

/// Nickname and initial value of copy number `copy` of `source`.
fn cloned_fields(source: &Content, copy: u64, increment_initial_value: bool) -> (Option<String>, String) {
	if source.nickname.is_empty() {
		return (None, source.initial_value.clone());
	}
	let Some(incremented) = increment_nickname_suffix(&source.nickname, copy) else {
		return (Some(source.nickname.clone()), source.initial_value.clone());
	};
	let follows = increment_initial_value
		&& source
			.initial_value
			.trim()
			.parse::<i64>()
			.is_ok_and(|value| u64::try_from(value) == Ok(incremented.from));
	let initial_value = if follows {
		incremented.to.to_string()
	} else {
		source.initial_value.clone()
	};
	(Some(incremented.nickname), initial_value)
}

fn lookup<'s, 'k>(
	store: &'s crate::AddressStore,
	keys: impl IntoIterator<Item = &'k AddrKey>,
) -> Result<Vec<&'s AddressRecord>> {
	keys.into_iter()
		.map(|&key| store.visible(key).ok_or(StoreError::UnknownAddress(key)))
		.collect()
}
