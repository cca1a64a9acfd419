use nickdb_primitives::{MemoryType, NicknameError};
use nickdb_store::{Field, KeySet, StoreError};
use pretty_assertions::assert_eq;

use crate::common::{key, observe, open, row, set};

#[test]
fn session_is_atomic_for_observers() {
	let (mut store, _) = open([row(MemoryType::DS, 1).with_nickname("Motor")]);
	let (ds1, ds2, ds3) = (
		key(MemoryType::DS, 1),
		key(MemoryType::DS, 2),
		key(MemoryType::DS, 3),
	);

	let seen = std::sync::Arc::new(parking_lot::Mutex::new(Vec::new()));
	let sink = std::sync::Arc::clone(&seen);
	store.add_observer(
		move |store: &nickdb_store::AddressStore,
		      _: Option<&KeySet>|
		      -> anyhow::Result<()> {
			sink.lock().push((
				store.keys_for_nickname("motor").len(),
				store.visible(key(MemoryType::DS, 3)).map(|r| r.nickname().to_string()),
			));
			Ok(())
		},
	);

	let mut session = store.edit("batch").unwrap();
	session.set_field(ds2, Field::Nickname, "motor").unwrap();
	session.set_field(ds3, Field::Nickname, "Fan").unwrap();
	session.set_field(ds1, Field::Comment, "main drive").unwrap();
	session.commit().unwrap();

	assert_eq!(*seen.lock(), vec![(2, Some("Fan".to_string()))]);
}

#[test]
fn nesting_is_rejected_after_any_history() {
	let (mut store, _) = open([]);
	let ds1 = key(MemoryType::DS, 1);
	set(&mut store, ds1, Field::Nickname, "A");
	store.undo().unwrap();
	store.redo().unwrap();

	let _outer = store.begin_session("outer");
	assert!(matches!(store.begin_session("inner"), Err(StoreError::NestedSession)));
	assert!(matches!(store.edit("guarded"), Err(StoreError::NestedSession)));
}

#[test]
fn duplicate_symmetry() {
	let (mut store, _) = open([]);
	let (ds1, dd1) = (key(MemoryType::DS, 1), key(MemoryType::DD, 1));
	set(&mut store, ds1, Field::Nickname, "Flow");
	set(&mut store, dd1, Field::Nickname, "FLOW");

	assert!(store.is_duplicate_nickname("Flow", ds1));
	assert!(store.is_duplicate_nickname("FLOW", dd1));
	assert_eq!(
		store.visible(ds1).unwrap().validation().nickname,
		Some(NicknameError::Duplicate)
	);
	assert_eq!(store.visible(dd1).unwrap().validation_error(), "Duplicate");

	set(&mut store, dd1, Field::Nickname, "");
	assert!(!store.is_duplicate_nickname("Flow", ds1));
	assert!(store.visible(ds1).unwrap().is_valid());
	assert!(store.nickname_index().lookup_exact("FLOW").is_empty());
}

#[test]
fn nested_block_colors() {
	let (store, _) = open([
		row(MemoryType::DS, 1).with_comment("<A bg=\"Red\">"),
		row(MemoryType::DS, 2).with_comment("<B bg=\"Blue\">"),
		row(MemoryType::DS, 3).with_comment("</B>"),
		row(MemoryType::DS, 4).with_comment("</A>"),
		row(MemoryType::DS, 6).with_comment("<X bg='Green' />"),
	]);
	let color = |addr| store.visible(key(MemoryType::DS, addr)).unwrap().block_color();
	assert_eq!(
		[1, 2, 3, 4, 5, 6, 7].map(color),
		[
			Some("Red"),
			Some("Blue"),
			Some("Blue"),
			Some("Red"),
			None,
			Some("Green"),
			None
		]
	);
}

#[test]
fn interleaved_retentive_sync() {
	let (mut store, _) = open([]);
	let log = observe(&mut store);
	let (t1, td1) = (key(MemoryType::T, 1), key(MemoryType::TD, 1));

	set(&mut store, t1, Field::Retentive, true);

	assert!(store.visible(td1).unwrap().retentive());
	let notified = log.lock();
	assert_eq!(notified.len(), 1);
	assert!(notified[0].as_ref().unwrap().contains(&td1));
}

#[test]
fn external_reload_keeps_pending_override() {
	let (mut store, source) = open([row(MemoryType::X, 1).with_comment("Button")]);
	let x1 = key(MemoryType::X, 1);
	set(&mut store, x1, Field::Comment, "UserComment");
	let log = observe(&mut store);

	source.put(row(MemoryType::X, 1).with_comment("ExternallyUpdated"));
	let affected = store.reload_from_source().unwrap();

	assert_eq!(store.base_record(x1).unwrap().comment(), "ExternallyUpdated");
	assert_eq!(store.visible(x1).unwrap().comment(), "UserComment");
	assert_eq!(store.visible(x1).unwrap().original().comment, "ExternallyUpdated");
	assert!(store.is_dirty(x1));
	assert!(affected.contains(&x1));
	assert_eq!(*log.lock(), vec![Some(affected)]);
}

#[test]
fn reload_drops_override_that_now_matches() {
	let (mut store, source) = open([row(MemoryType::C, 5).with_nickname("Old")]);
	let c5 = key(MemoryType::C, 5);
	set(&mut store, c5, Field::Nickname, "New");

	source.put(row(MemoryType::C, 5).with_nickname("New"));
	let affected = store.reload_from_source().unwrap();

	assert!(affected.contains(&c5));
	assert!(!store.is_dirty(c5));
	assert_eq!(store.visible(c5).unwrap().nickname(), "New");
	assert_eq!(store.keys_for_nickname("new"), KeySet::from([c5]));
}

#[test]
fn reload_resets_rows_missing_from_source() {
	let (mut store, source) = open([row(MemoryType::DH, 3).with_nickname("Mask")]);
	let dh3 = key(MemoryType::DH, 3);
	source.remove(dh3);

	let affected = store.reload_from_source().unwrap();
	assert_eq!(affected, KeySet::from([dh3]));
	let record = store.visible(dh3).unwrap();
	assert_eq!(record.nickname(), "");
	assert!(record.is_virtual());
	assert!(store.keys_for_nickname("mask").is_empty());

	assert!(store.reload_from_source().unwrap().is_empty());
}

#[test]
fn full_delete_versus_clear_only() {
	let (mut store, _) = open([
		row(MemoryType::DS, 1).with_nickname("Old"),
		row(MemoryType::DS, 2).with_nickname("Old2").with_comment("Keep"),
	]);
	let (ds1, ds2) = (key(MemoryType::DS, 1), key(MemoryType::DS, 2));
	set(&mut store, ds1, Field::Nickname, "");
	set(&mut store, ds2, Field::Nickname, "");

	let cleared = store.visible(ds1).unwrap();
	assert!(cleared.needs_full_delete());
	assert!(!cleared.needs_nickname_clear_only());

	let kept = store.visible(ds2).unwrap();
	assert!(kept.needs_nickname_clear_only());
	assert!(!kept.needs_full_delete());
}
