//! Comment rewrites that keep related rows consistent.
//!
//! Two relations are maintained when a session ends:
//!
//! - Interleaved partners (T/TD, CT/CTD at the same address) carry the same
//!   retentive flag and the same block tag. The row that was edited wins and
//!   the untouched partner follows.
//! - The open and close tags of one block keep the same name. Renaming or
//!   removing one end renames or removes the other.
//!
//! The functions here are pure; the store decides which rows they apply to.

use nickdb_primitives::{BlockTag, TagKind, format_block_tag, parse_block_tag};

fn same_tag(a: &BlockTag, b: &BlockTag) -> bool {
	a.name == b.name && a.kind == b.kind && a.bg_color == b.bg_color
}

/// Mirrors the block tag of `source` onto `target`, keeping the target's
/// own free text. Returns `None` when the tags already agree.
pub fn sync_block_tag(source: &str, target: &str) -> Option<String> {
	let source_tag = parse_block_tag(source);
	let target_tag = parse_block_tag(target);
	if same_tag(&source_tag, &target_tag) {
		return None;
	}

	let remaining = target_tag.remaining_text.trim();
	let synced = match source_tag.format_tag() {
		None => remaining.to_string(),
		Some(tag) if remaining.is_empty() => tag,
		Some(tag) => format!("{remaining} {tag}"),
	};
	(synced != target).then_some(synced)
}

/// Rewrites the partner of a block tag that changed from `old` to `new`.
///
/// `paired` is the comment of the row holding the other end of the block.
/// A removed tag strips the partner; a renamed tag renames it, keeping the
/// partner's color and trailing text. Returns `None` when nothing changes.
pub fn follow_paired_tag(old: &BlockTag, new: &BlockTag, paired: &str) -> Option<String> {
	if !matches!(old.kind, Some(TagKind::Open | TagKind::Close)) {
		return None;
	}
	let old_name = old.name.as_deref()?;

	let partner = parse_block_tag(paired);
	if partner.name.as_deref() != Some(old_name) {
		return None;
	}

	let rewritten = match new.name.as_deref() {
		None => partner.remaining_text,
		Some(new_name) if new_name == old_name => return None,
		Some(new_name) => {
			let kind = partner.kind?;
			let tag = format_block_tag(new_name, kind, partner.bg_color.as_deref());
			if partner.remaining_text.is_empty() {
				tag
			} else {
				format!("{tag} {}", partner.remaining_text)
			}
		}
	};
	(rewritten != paired).then_some(rewritten)
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::*;

	#[test]
	fn mirrors_added_tag_after_partner_text() {
		assert_eq!(
			sync_block_tag("<Timers>", "preset"),
			Some("preset <Timers>".to_string())
		);
		assert_eq!(sync_block_tag("<Timers>", ""), Some("<Timers>".to_string()));
	}

	#[test]
	fn mirrors_removed_tag() {
		assert_eq!(
			sync_block_tag("no tag", "<Timers> preset"),
			Some("preset".to_string())
		);
	}

	#[test]
	fn mirrors_color_and_kind() {
		assert_eq!(
			sync_block_tag("<T bg=\"Red\" />", "<T>"),
			Some("<T bg=\"Red\" />".to_string())
		);
	}

	#[test]
	fn agreeing_tags_need_nothing() {
		assert_eq!(sync_block_tag("<Timers> a", "<Timers> b"), None);
		assert_eq!(sync_block_tag("plain", "other"), None);
	}

	#[test]
	fn rename_follows_to_partner() {
		let old = parse_block_tag("<Pumps>");
		let new = parse_block_tag("<Motors>");
		assert_eq!(
			follow_paired_tag(&old, &new, "</Pumps> end"),
			Some("</Motors> end".to_string())
		);
	}

	#[test]
	fn rename_keeps_partner_color() {
		let old = parse_block_tag("</Pumps>");
		let new = parse_block_tag("</Motors>");
		assert_eq!(
			follow_paired_tag(&old, &new, "<Pumps bg=\"Blue\">"),
			Some("<Motors bg=\"Blue\">".to_string())
		);
	}

	#[test]
	fn removal_strips_partner() {
		let old = parse_block_tag("<Pumps>");
		let new = parse_block_tag("just text");
		assert_eq!(
			follow_paired_tag(&old, &new, "</Pumps> end"),
			Some("end".to_string())
		);
	}

	#[test]
	fn unrelated_or_unchanged_partner_is_left_alone() {
		let old = parse_block_tag("<Pumps>");
		let same = parse_block_tag("<Pumps> with text");
		assert_eq!(follow_paired_tag(&old, &same, "</Pumps>"), None);

		let new = parse_block_tag("<Motors>");
		assert_eq!(follow_paired_tag(&old, &new, "</Other>"), None);

		let single = parse_block_tag("<Spare />");
		assert_eq!(follow_paired_tag(&single, &new, "</Spare>"), None);
	}
}
