//! Block ranges over an ordered row sequence.
//!
//! Tags are matched with a stack per (block group, name): an opening tag
//! pushes, a closing tag pops the innermost open tag of the same name. The
//! block group merges the interleaved pairs, so a block opened on a `T` row
//! may be closed on a `TD` row. Rows without a memory type all share one
//! group.

use std::cmp::Reverse;
use std::collections::BTreeSet;

use nickdb_primitives::{BlockTag, MemoryType, TagKind, parse_block_tag};
use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::record::AddressRecord;

/// A row that may carry a block tag in its comment.
pub trait TaggedRow {
	fn comment(&self) -> &str;

	/// Memory type used to keep unrelated types from matching each other.
	fn memory_type(&self) -> Option<MemoryType> {
		None
	}
}

impl TaggedRow for AddressRecord {
	fn comment(&self) -> &str {
		AddressRecord::comment(self)
	}

	fn memory_type(&self) -> Option<MemoryType> {
		Some(self.memory_type)
	}
}

impl TaggedRow for &AddressRecord {
	fn comment(&self) -> &str {
		AddressRecord::comment(self)
	}

	fn memory_type(&self) -> Option<MemoryType> {
		Some(self.memory_type)
	}
}

impl TaggedRow for &str {
	fn comment(&self) -> &str {
		self
	}
}

impl TaggedRow for (MemoryType, &str) {
	fn comment(&self) -> &str {
		self.1
	}

	fn memory_type(&self) -> Option<MemoryType> {
		Some(self.0)
	}
}

/// An inclusive span of row indices covered by one block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockRange {
	pub start: usize,
	pub end: usize,
	pub name: String,
	pub bg_color: Option<String>,
	/// Memory type of the row that opened the block.
	pub memory_type: Option<MemoryType>,
	/// `false` for an opening tag that never found its close; such a block
	/// covers only its own row.
	pub matched: bool,
}

impl BlockRange {
	pub fn contains(&self, idx: usize) -> bool {
		(self.start..=self.end).contains(&idx)
	}
}

type StackKey = (Option<MemoryType>, String);

fn group_of(row: &impl TaggedRow) -> Option<MemoryType> {
	row.memory_type().map(MemoryType::block_group)
}

/// Computes every block range in one left-to-right pass.
///
/// The result is ordered by start index, outer before inner on ties, which
/// is also the order in which colors must be applied.
pub fn compute_block_ranges<R: TaggedRow>(rows: &[R]) -> Vec<BlockRange> {
	let mut ranges = Vec::new();
	let mut open: FxHashMap<StackKey, Vec<(usize, Option<String>, Option<MemoryType>)>> =
		FxHashMap::default();

	for (idx, row) in rows.iter().enumerate() {
		let tag = parse_block_tag(row.comment());
		let (Some(name), Some(kind)) = (tag.name, tag.kind) else {
			continue;
		};
		let stack_key = (group_of(row), name);

		match kind {
			TagKind::SelfClosing => ranges.push(BlockRange {
				start: idx,
				end: idx,
				name: stack_key.1,
				bg_color: tag.bg_color,
				memory_type: row.memory_type(),
				matched: true,
			}),
			TagKind::Open => {
				open.entry(stack_key)
					.or_default()
					.push((idx, tag.bg_color, row.memory_type()));
			}
			TagKind::Close => {
				let popped = open.get_mut(&stack_key).and_then(Vec::pop);
				if let Some((start, bg_color, memory_type)) = popped {
					ranges.push(BlockRange {
						start,
						end: idx,
						name: stack_key.1,
						bg_color,
						memory_type,
						matched: true,
					});
				}
			}
		}
	}

	for ((_, name), stack) in open {
		for (start, bg_color, memory_type) in stack {
			ranges.push(BlockRange {
				start,
				end: start,
				name: name.clone(),
				bg_color,
				memory_type,
				matched: false,
			});
		}
	}

	ranges.sort_by_key(|range| (range.start, Reverse(range.end)));
	ranges
}

/// Resolves the displayed color of every row. Inner blocks win over the
/// blocks that contain them.
pub fn block_colors(ranges: &[BlockRange], row_count: usize) -> Vec<Option<&str>> {
	let mut colors = vec![None; row_count];
	for range in ranges {
		let Some(color) = range.bg_color.as_deref() else {
			continue;
		};
		let end = range.end.min(row_count.saturating_sub(1));
		for slot in colors.iter_mut().take(end + 1).skip(range.start) {
			*slot = Some(color);
		}
	}
	colors
}

/// Finds the row holding the partner of the open or close tag at `idx`.
///
/// `tag` overrides the tag parsed from the row itself, which lets callers
/// ask about a tag the row held before an edit. Nesting of same-named
/// blocks is respected. Self-closing tags have no partner.
pub fn find_paired_tag_index<R: TaggedRow>(
	rows: &[R],
	idx: usize,
	tag: Option<&BlockTag>,
) -> Option<usize> {
	let parsed;
	let tag = match tag {
		Some(tag) => tag,
		None => {
			parsed = parse_block_tag(rows.get(idx)?.comment());
			&parsed
		}
	};
	let name = tag.name.as_deref()?;
	let group = group_of(rows.get(idx)?);

	let (toward, away, candidates): (TagKind, TagKind, Box<dyn Iterator<Item = usize>>) =
		match tag.kind? {
			TagKind::Open => (TagKind::Close, TagKind::Open, Box::new(idx + 1..rows.len())),
			TagKind::Close => (TagKind::Open, TagKind::Close, Box::new((0..idx).rev())),
			TagKind::SelfClosing => return None,
		};

	let mut depth = 1usize;
	for i in candidates {
		let row = &rows[i];
		if group.is_some() && group_of(row) != group {
			continue;
		}
		let other = parse_block_tag(row.comment());
		if other.name.as_deref() != Some(name) {
			continue;
		}
		if other.kind == Some(away) {
			depth += 1;
		} else if other.kind == Some(toward) {
			depth -= 1;
			if depth == 0 {
				return Some(i);
			}
		}
	}
	None
}

/// Inclusive `(start, end)` of the block whose tag sits at `idx`. Unpaired
/// tags cover only their own row.
pub fn find_block_range_indices<R: TaggedRow>(
	rows: &[R],
	idx: usize,
	tag: Option<&BlockTag>,
) -> Option<(usize, usize)> {
	let parsed;
	let tag = match tag {
		Some(tag) => tag,
		None => {
			parsed = parse_block_tag(rows.get(idx)?.comment());
			&parsed
		}
	};
	tag.name.as_ref()?;
	match tag.kind? {
		TagKind::SelfClosing => Some((idx, idx)),
		TagKind::Open => Some((idx, find_paired_tag_index(rows, idx, Some(tag)).unwrap_or(idx))),
		TagKind::Close => Some((find_paired_tag_index(rows, idx, Some(tag)).unwrap_or(idx), idx)),
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Blocks cannot span multiple memory types ({0})")]
pub struct BlockSpanError(pub String);

/// Checks that a prospective block stays within one memory type, or within
/// one interleaved pair.
pub fn validate_block_span(
	types: impl IntoIterator<Item = MemoryType>,
) -> Result<(), BlockSpanError> {
	let types: BTreeSet<MemoryType> = types.into_iter().collect();
	let groups: BTreeSet<MemoryType> = types.iter().map(|ty| ty.block_group()).collect();
	if groups.len() <= 1 {
		return Ok(());
	}
	let listed: Vec<&str> = types.iter().map(|ty| ty.as_str()).collect();
	Err(BlockSpanError(listed.join(", ")))
}

#[cfg(test)]
mod tests;
