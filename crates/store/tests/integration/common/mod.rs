//! Common utilities for store integration tests.

use std::sync::Arc;

use nickdb_primitives::{AddrKey, MemoryType};
use nickdb_store::{
	AddressRecord, AddressStore, Field, FieldValue, KeySet, MemoryDataSource, SessionOutcome,
	StoreConfig,
};
use parking_lot::Mutex;

pub fn key(memory_type: MemoryType, address: u32) -> AddrKey {
	AddrKey::encode(memory_type, address).expect("address fits")
}

/// A clean stored row.
pub fn row(memory_type: MemoryType, address: u32) -> AddressRecord {
	AddressRecord::loaded(memory_type, address).expect("address fits")
}

/// Opens a store over a shared in-memory source and returns both handles.
pub fn open(rows: impl IntoIterator<Item = AddressRecord>) -> (AddressStore, MemoryDataSource) {
	let source = MemoryDataSource::with_rows(rows);
	let store = AddressStore::open(source.clone(), StoreConfig::default()).expect("load succeeds");
	(store, source)
}

/// One committed session writing a single field.
pub fn set(
	store: &mut AddressStore,
	key: AddrKey,
	field: Field,
	value: impl Into<FieldValue>,
) -> SessionOutcome {
	let mut session = store.edit(format!("set {field} of {key}")).expect("no session open");
	session.set_field(key, field, value).expect("write accepted");
	session.commit().expect("session ends")
}

pub type Notifications = Arc<Mutex<Vec<Option<KeySet>>>>;

/// Registers an observer that records every notification.
pub fn observe(store: &mut AddressStore) -> Notifications {
	let log = Notifications::default();
	let sink = Arc::clone(&log);
	store.add_observer(move |_: &AddressStore, keys: Option<&KeySet>| -> anyhow::Result<()> {
		sink.lock().push(keys.cloned());
		Ok(())
	});
	log
}
