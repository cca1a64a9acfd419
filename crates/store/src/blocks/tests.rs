use nickdb_primitives::MemoryType;
use pretty_assertions::assert_eq;

use super::*;

fn spans(ranges: &[BlockRange]) -> Vec<(usize, usize, &str)> {
	ranges
		.iter()
		.map(|r| (r.start, r.end, r.name.as_str()))
		.collect()
}

#[test]
fn nested_blocks_resolve_inner_color() {
	let rows = ["<A bg=\"Red\">", "<B bg=\"Blue\">", "</B>", "</A>"];
	let ranges = compute_block_ranges(&rows);
	assert_eq!(spans(&ranges), vec![(0, 3, "A"), (1, 2, "B")]);

	let colors = block_colors(&ranges, rows.len());
	assert_eq!(colors, vec![Some("Red"), Some("Blue"), Some("Blue"), Some("Red")]);
}

#[test]
fn uncolored_inner_block_inherits_outer_color() {
	let rows = ["<A bg=\"Red\">", "<B>", "</B>", "</A>"];
	let ranges = compute_block_ranges(&rows);
	assert_eq!(block_colors(&ranges, rows.len())[1], Some("Red"));
}

#[test]
fn self_closing_colors_only_its_row() {
	let rows = ["", "<X bg='G' />", ""];
	let ranges = compute_block_ranges(&rows);
	assert_eq!(spans(&ranges), vec![(1, 1, "X")]);
	assert_eq!(block_colors(&ranges, 3), vec![None, Some("G"), None]);
}

#[test]
fn unmatched_open_degrades_to_single_row() {
	let rows = ["<Lonely bg=\"Red\">", "plain", "</Other>"];
	let ranges = compute_block_ranges(&rows);
	assert_eq!(ranges.len(), 1);
	assert_eq!((ranges[0].start, ranges[0].end), (0, 0));
	assert!(!ranges[0].matched);
	assert_eq!(block_colors(&ranges, 3), vec![Some("Red"), None, None]);
}

#[test]
fn same_name_nesting_uses_stack_discipline() {
	let rows = ["<A>", "<A>", "</A>", "</A>"];
	let ranges = compute_block_ranges(&rows);
	assert_eq!(spans(&ranges), vec![(0, 3, "A"), (1, 2, "A")]);
}

#[test]
fn distinct_types_do_not_match() {
	let rows = [
		(MemoryType::DS, "<Tank>"),
		(MemoryType::DD, "</Tank>"),
		(MemoryType::DS, "</Tank>"),
	];
	let ranges = compute_block_ranges(&rows);
	assert_eq!(spans(&ranges), vec![(0, 2, "Tank")]);
}

#[test]
fn interleaved_pair_matches_across_types() {
	let rows = [
		(MemoryType::T, "<Timers>"),
		(MemoryType::TD, ""),
		(MemoryType::T, ""),
		(MemoryType::TD, "</Timers>"),
	];
	let ranges = compute_block_ranges(&rows);
	assert_eq!(spans(&ranges), vec![(0, 3, "Timers")]);
	assert!(ranges[0].matched);
	assert_eq!(ranges[0].memory_type, Some(MemoryType::T));
}

#[test]
fn paired_tag_lookup_respects_nesting() {
	let rows = ["<A>", "<A>", "</A>", "x", "</A>"];
	assert_eq!(find_paired_tag_index(&rows, 0, None), Some(4));
	assert_eq!(find_paired_tag_index(&rows, 1, None), Some(2));
	assert_eq!(find_paired_tag_index(&rows, 4, None), Some(0));
	assert_eq!(find_paired_tag_index(&rows, 3, None), None);
}

#[test]
fn paired_tag_lookup_with_previous_tag() {
	// Row 0 was "<Old>" before an edit renamed it.
	let rows = ["<New>", "", "</Old>"];
	let old = parse_block_tag("<Old>");
	assert_eq!(find_paired_tag_index(&rows, 0, Some(&old)), Some(2));
	assert_eq!(find_paired_tag_index(&rows, 0, None), None);
}

#[test]
fn paired_tag_lookup_skips_other_groups() {
	let rows = [
		(MemoryType::C, "<Run>"),
		(MemoryType::DS, "</Run>"),
		(MemoryType::C, "</Run>"),
	];
	assert_eq!(find_paired_tag_index(&rows, 0, None), Some(2));
}

#[test]
fn block_range_indices() {
	let rows = ["<A>", "", "</A>", "<S />", "<Open>"];
	assert_eq!(find_block_range_indices(&rows, 0, None), Some((0, 2)));
	assert_eq!(find_block_range_indices(&rows, 2, None), Some((0, 2)));
	assert_eq!(find_block_range_indices(&rows, 3, None), Some((3, 3)));
	assert_eq!(find_block_range_indices(&rows, 4, None), Some((4, 4)));
	assert_eq!(find_block_range_indices(&rows, 1, None), None);
}

#[test]
fn block_span_rules() {
	assert_eq!(validate_block_span([MemoryType::DS, MemoryType::DS]), Ok(()));
	assert_eq!(validate_block_span([MemoryType::T, MemoryType::TD]), Ok(()));
	assert_eq!(validate_block_span([MemoryType::CTD, MemoryType::CT]), Ok(()));
	assert_eq!(validate_block_span(Vec::<MemoryType>::new()), Ok(()));
	let err = validate_block_span([MemoryType::DS, MemoryType::C]).unwrap_err();
	assert_eq!(
		err.to_string(),
		"Blocks cannot span multiple memory types (C, DS)"
	);
}
