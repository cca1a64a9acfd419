//! Block tags embedded in address comments.
//!
//! A comment may carry one HTML-like tag that groups rows into a named
//! block:
//!
//! - `<Name>` opens a block, `</Name>` closes it.
//! - `<Name />` marks a single row.
//! - Opening and self-closing tags accept `bg="color"` (or single quotes).
//!
//! The first `<...>` anywhere in the comment that parses as a tag wins. The
//! text around it is kept as [`BlockTag::remaining_text`].

use std::sync::LazyLock;

use regex::Regex;

static BG_ATTR: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r#"\s+bg=["']([^"']+)["']"#).expect("bg attribute pattern: compile failed")
});

/// Kind of a parsed block tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagKind {
	Open,
	Close,
	SelfClosing,
}

/// Result of parsing a comment for a block tag.
///
/// `name` and `kind` are either both set or both `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockTag {
	pub name: Option<String>,
	pub kind: Option<TagKind>,
	/// Comment text with the tag removed.
	pub remaining_text: String,
	pub bg_color: Option<String>,
}

impl BlockTag {
	fn untagged(comment: &str) -> Self {
		Self {
			remaining_text: comment.to_string(),
			..Self::default()
		}
	}

	/// Returns `true` if a tag was found.
	pub fn is_tag(&self) -> bool {
		self.kind.is_some()
	}

	/// Renders just the tag part, without the remaining text.
	pub fn format_tag(&self) -> Option<String> {
		match (&self.name, self.kind) {
			(Some(name), Some(kind)) => Some(format_block_tag(name, kind, self.bg_color.as_deref())),
			_ => None,
		}
	}
}

fn has_letter(name: &str) -> bool {
	name.chars().any(char::is_alphabetic)
}

fn extract_bg(content: &str) -> (String, Option<String>) {
	match BG_ATTR.captures(content) {
		Some(caps) => {
			let whole = caps.get(0).map_or(0..0, |m| m.range());
			let color = caps.get(1).map(|m| m.as_str().to_string());
			let name = format!("{}{}", &content[..whole.start], &content[whole.end..]);
			(name.trim().to_string(), color)
		}
		None => (content.trim().to_string(), None),
	}
}

/// Parses the text between `<` and `>`.
fn parse_tag_content(content: &str) -> Option<(String, TagKind, Option<String>)> {
	let trimmed = content.trim_end();
	if let Some(inner) = trimmed.strip_suffix('/') {
		let (name, bg) = extract_bg(inner.trim());
		return has_letter(&name).then_some((name, TagKind::SelfClosing, bg));
	}

	if let Some(inner) = content.strip_prefix('/') {
		let name = inner.trim().to_string();
		return has_letter(&name).then_some((name, TagKind::Close, None));
	}

	let (name, bg) = extract_bg(content);
	has_letter(&name).then_some((name, TagKind::Open, bg))
}

fn join_remaining(before: &str, after: &str) -> String {
	match (before.trim(), after.trim()) {
		("", after) => after.to_string(),
		(before, "") => before.to_string(),
		(before, after) => format!("{before} {after}"),
	}
}

/// Parses the first valid block tag in `comment`.
///
/// Bracketed text without a letter in the name (`< 5 >`) is not a tag and
/// scanning continues past it.
pub fn parse_block_tag(comment: &str) -> BlockTag {
	let mut from = 0;
	while let Some(offset) = comment[from..].find('<') {
		let open = from + offset;
		let body_start = open + 1;
		let Some(len) = comment[body_start..].find('>') else {
			break;
		};
		let close = body_start + len;
		let content = &comment[body_start..close];

		// A later '<' inside the brackets starts a closer candidate.
		if !content.contains('<') {
			if let Some((name, kind, bg_color)) = parse_tag_content(content) {
				return BlockTag {
					name: Some(name),
					kind: Some(kind),
					remaining_text: join_remaining(&comment[..open], &comment[close + 1..]),
					bg_color,
				};
			}
		}
		from = body_start;
	}

	BlockTag::untagged(comment)
}

/// Formats a tag. Close tags never carry a color.
pub fn format_block_tag(name: &str, kind: TagKind, bg_color: Option<&str>) -> String {
	let bg = match (kind, bg_color) {
		(TagKind::Close, _) | (_, None) => String::new(),
		(_, Some(color)) => format!(" bg=\"{color}\""),
	};
	match kind {
		TagKind::Open => format!("<{name}{bg}>"),
		TagKind::Close => format!("</{name}>"),
		TagKind::SelfClosing => format!("<{name}{bg} />"),
	}
}

/// Removes the block tag from a comment, keeping the surrounding text.
/// Comments without a tag are returned unchanged.
pub fn strip_block_tag(comment: &str) -> String {
	parse_block_tag(comment).remaining_text
}

/// Block name of the comment's tag, if any.
pub fn extract_block_name(comment: &str) -> Option<String> {
	parse_block_tag(comment).name
}
