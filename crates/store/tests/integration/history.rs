use nickdb_primitives::{AddrKey, MemoryType};
use nickdb_store::{AddressRecord, AddressStore, Field, MemoryDataSource, StoreConfig};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

use crate::common::{key, open, row, set};

/// Visible content of the rows an edit can reach, including dependency
/// partners.
fn snapshot(store: &AddressStore, keys: &[AddrKey]) -> Vec<AddressRecord> {
	keys.iter()
		.map(|&k| store.visible(k).expect("skeleton key").clone())
		.collect()
}

fn reachable() -> Vec<AddrKey> {
	let mut keys: Vec<AddrKey> = (1..=4).map(|addr| key(MemoryType::DS, addr)).collect();
	keys.extend((1..=3).flat_map(|addr| [key(MemoryType::T, addr), key(MemoryType::TD, addr)]));
	keys
}

fn edit_strategy() -> impl Strategy<Value = (usize, Field, String, bool)> {
	(
		0usize..10,
		prop_oneof![
			Just(Field::Nickname),
			Just(Field::Comment),
			Just(Field::InitialValue),
			Just(Field::Retentive),
		],
		prop_oneof![
			"[A-Za-z]{1,4}[0-9]?",
			Just(String::new()),
			Just("<Blk>".to_string()),
			Just("</Blk>".to_string()),
			"-?[0-9]{1,3}",
		],
		any::<bool>(),
	)
}

proptest! {
	#[test]
	fn undo_then_redo_restores_post_session_state(
		sessions in prop::collection::vec(prop::collection::vec(edit_strategy(), 1..4), 1..6)
	) {
		let keys = reachable();
		let mut store = AddressStore::open(MemoryDataSource::new(), StoreConfig::default()).unwrap();

		for edits in sessions {
			let before = snapshot(&store, &keys);
			let mut session = store.edit("random").unwrap();
			for (slot, field, text, flag) in edits {
				let target = keys[slot % keys.len()];
				let result = match field {
					Field::Retentive => session.set_field(target, field, flag),
					_ => session.set_field(target, field, text),
				};
				prop_assert!(result.is_ok());
			}
			let outcome = session.commit().unwrap();
			let after = snapshot(&store, &keys);

			if outcome.recorded {
				prop_assert!(store.undo().unwrap());
				prop_assert_eq!(snapshot(&store, &keys), before);
				prop_assert!(store.redo().unwrap());
				prop_assert_eq!(snapshot(&store, &keys), after);
			} else {
				prop_assert_eq!(&before, &after);
			}
		}
		prop_assert!(!store.redo().unwrap());
	}
}

#[test]
fn undo_stack_is_bounded() {
	let config = StoreConfig {
		max_undo_depth: 5,
		..StoreConfig::default()
	};
	let mut store = AddressStore::open(MemoryDataSource::new(), config).unwrap();
	let ds1 = key(MemoryType::DS, 1);
	for n in 1..=8 {
		set(&mut store, ds1, Field::Comment, format!("rev {n}"));
	}
	assert_eq!(store.history().undo_len(), 5);

	let mut undone = 0;
	while store.undo().unwrap() {
		undone += 1;
	}
	assert_eq!(undone, 5);
	assert_eq!(store.visible(ds1).unwrap().comment(), "rev 3");
}

#[test]
fn new_session_clears_redo() {
	let (mut store, _) = open([row(MemoryType::DF, 1).with_nickname("Ratio")]);
	let df1 = key(MemoryType::DF, 1);
	set(&mut store, df1, Field::InitialValue, "1.5e3");
	store.undo().unwrap();
	assert_eq!(store.redo_description(), Some("set initial_value of DF1"));

	set(&mut store, df1, Field::Comment, "gain");
	assert!(!store.can_redo());
	assert!(!store.redo().unwrap());
}

#[test]
fn undo_on_empty_history_is_noop() {
	let (mut store, _) = open([]);
	assert!(!store.undo().unwrap());
	assert!(!store.redo().unwrap());
	assert_eq!(store.undo_description(), None);
}
