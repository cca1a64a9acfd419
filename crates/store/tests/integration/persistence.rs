use std::io::Write;
use std::time::{Duration, SystemTime};

use nickdb_primitives::MemoryType;
use nickdb_store::{AddressStore, Field, SourceError, StoreConfig, StoreError};
use pretty_assertions::assert_eq;

use crate::common::{key, observe, open, row, set};

#[test]
fn save_persists_and_cleans() {
	let (mut store, source) = open([
		row(MemoryType::DS, 1).with_nickname("Old"),
		row(MemoryType::DS, 2).with_nickname("Named").with_comment("Keep"),
	]);
	let (ds1, ds2, ds3) = (
		key(MemoryType::DS, 1),
		key(MemoryType::DS, 2),
		key(MemoryType::DS, 3),
	);
	set(&mut store, ds1, Field::Nickname, "");
	set(&mut store, ds2, Field::Nickname, "");
	set(&mut store, ds3, Field::Nickname, "Fresh");
	let log = observe(&mut store);

	let written = store.save().unwrap();
	assert_eq!(written, 3);
	assert!(!store.has_unsaved_changes());
	assert!(store.can_undo());

	assert!(source.get(ds1).is_none());
	let skeleton = store.visible(ds1).unwrap();
	assert!(skeleton.is_virtual());
	assert!(!skeleton.is_dirty());

	assert_eq!(source.get(ds2).unwrap().comment(), "Keep");
	assert_eq!(source.get(ds3).unwrap().nickname(), "Fresh");
	assert!(store.visible(ds3).unwrap().exists_in_mdb());

	let notified = log.lock();
	assert_eq!(notified.len(), 1);
	assert_eq!(notified[0].as_ref().unwrap().len(), 3);
}

#[test]
fn save_with_nothing_pending_skips_source() {
	let (mut store, source) = open([]);
	assert_eq!(store.save().unwrap(), 0);
	assert_eq!(source.save_calls(), 0);
}

#[test]
fn failed_save_changes_nothing() {
	let (mut store, source) = open([]);
	let ds1 = key(MemoryType::DS, 1);
	set(&mut store, ds1, Field::Nickname, "Pending");
	source.fail_next_save("disk full");

	let err = store.save().unwrap_err();
	assert!(matches!(err, StoreError::Source(SourceError::Backend(_))));
	assert!(store.is_dirty(ds1));
	assert_eq!(store.visible(ds1).unwrap().original().nickname, "");

	assert_eq!(store.save().unwrap(), 1);
	assert!(!store.is_dirty(ds1));
}

#[test]
fn cleared_row_that_stays_in_use_is_written() {
	let (mut store, source) = open([row(MemoryType::DS, 1).with_comment("x").with_used(true)]);
	let ds1 = key(MemoryType::DS, 1);
	set(&mut store, ds1, Field::Comment, "");
	assert!(!store.visible(ds1).unwrap().needs_full_delete());

	assert_eq!(store.save().unwrap(), 1);
	let stored = source.get(ds1).unwrap();
	assert_eq!(stored.comment(), "");
	assert!(stored.used());

	store.reload_from_source().unwrap();
	assert_eq!(store.visible(ds1).unwrap().comment(), "");
	assert!(!store.is_dirty(ds1));
}

#[test]
fn read_only_source_refuses_save() {
	let (mut store, source) = open([]);
	set(&mut store, key(MemoryType::DS, 1), Field::Comment, "x");
	source.set_read_only(true);

	assert!(store.is_read_only());
	assert!(matches!(
		store.save(),
		Err(StoreError::Source(SourceError::ReadOnly))
	));
	assert!(store.has_unsaved_changes());
}

#[test]
fn saved_edit_can_still_be_undone() {
	let (mut store, _) = open([]);
	let ds1 = key(MemoryType::DS, 1);
	set(&mut store, ds1, Field::Nickname, "Saved");
	store.save().unwrap();

	store.undo().unwrap();
	let record = store.visible(ds1).unwrap();
	assert_eq!(record.nickname(), "");
	assert!(record.is_dirty());
	assert_eq!(store.modified_count_for(MemoryType::DS), 1);
}

fn set_mtime(path: &std::path::Path, secs: u64) {
	std::fs::File::options()
		.write(true)
		.open(path)
		.unwrap()
		.set_modified(SystemTime::UNIX_EPOCH + Duration::from_secs(secs))
		.unwrap();
}

#[test]
fn poll_reloads_on_external_change() {
	let mut file = tempfile::NamedTempFile::new().unwrap();
	writeln!(file, "db").unwrap();
	set_mtime(file.path(), 10);

	let source = nickdb_store::MemoryDataSource::with_rows([row(MemoryType::Y, 1).with_nickname("Lamp")])
		.with_path(file.path());
	let mut store = AddressStore::open(source.clone(), StoreConfig::default()).unwrap();
	assert!(store.monitor().is_some());
	assert_eq!(store.poll_external_changes().unwrap(), None);

	source.put(row(MemoryType::Y, 1).with_nickname("Horn"));
	set_mtime(file.path(), 20);
	let affected = store.poll_external_changes().unwrap().unwrap();
	assert!(affected.contains(&key(MemoryType::Y, 1)));
	assert_eq!(store.visible(key(MemoryType::Y, 1)).unwrap().nickname(), "Horn");
	assert_eq!(store.poll_external_changes().unwrap(), None);
}

#[test]
fn locked_source_defers_reload_to_next_poll() {
	let file = tempfile::NamedTempFile::new().unwrap();
	set_mtime(file.path(), 10);
	let source = nickdb_store::MemoryDataSource::new().with_path(file.path());
	let mut store = AddressStore::open(source.clone(), StoreConfig::default()).unwrap();

	source.put(row(MemoryType::C, 1).with_nickname("Run"));
	source.set_locked(true);
	set_mtime(file.path(), 20);
	assert_eq!(store.poll_external_changes().unwrap(), None);
	assert_eq!(store.visible(key(MemoryType::C, 1)).unwrap().nickname(), "");

	source.set_locked(false);
	let affected = store.poll_external_changes().unwrap().unwrap();
	assert!(affected.contains(&key(MemoryType::C, 1)));
}

#[test]
fn open_session_defers_reload_to_next_poll() {
	let file = tempfile::NamedTempFile::new().unwrap();
	set_mtime(file.path(), 10);
	let source = nickdb_store::MemoryDataSource::with_rows([row(MemoryType::Y, 2).with_nickname("Old")])
		.with_path(file.path());
	let mut store = AddressStore::open(source.clone(), StoreConfig::default()).unwrap();
	let y2 = key(MemoryType::Y, 2);

	source.put(row(MemoryType::Y, 2).with_nickname("External"));
	set_mtime(file.path(), 20);
	store.begin_session("typing").unwrap();
	assert_eq!(store.poll_external_changes().unwrap(), None);
	store.end_session().unwrap();

	let affected = store.poll_external_changes().unwrap().unwrap();
	assert!(affected.contains(&y2));
	assert_eq!(store.visible(y2).unwrap().nickname(), "External");
}

#[test]
fn own_save_is_not_an_external_change() {
	let file = tempfile::NamedTempFile::new().unwrap();
	let source = nickdb_store::MemoryDataSource::new().with_path(file.path());
	let mut store = AddressStore::open(source, StoreConfig::default()).unwrap();

	set(&mut store, key(MemoryType::DS, 9), Field::Nickname, "Mine");
	set_mtime(file.path(), 99);
	store.save().unwrap();
	assert_eq!(store.poll_external_changes().unwrap(), None);
}

#[test]
fn stores_without_a_file_never_poll() {
	let (mut store, _) = open([]);
	assert!(store.monitor().is_none());
	assert_eq!(store.poll_external_changes().unwrap(), None);
}
