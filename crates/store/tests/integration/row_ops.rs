use nickdb_primitives::MemoryType;
use nickdb_store::rows::{clone_structure, fill_down};
use nickdb_store::{Field, RowEditError, RowOpError};
use pretty_assertions::assert_eq;

use crate::common::{key, open, row};

#[test]
fn fill_down_numbers_targets() {
	let (mut store, _) = open([row(MemoryType::DS, 1)
		.with_nickname("Sensor1")
		.with_initial_value("1")
		.with_comment("C")
		.with_retentive(true)]);
	let source = key(MemoryType::DS, 1);
	let targets = [2, 3, 4].map(|addr| key(MemoryType::DS, addr));

	let mut session = store.edit("Fill down").unwrap();
	let affected = fill_down(&mut session, source, &targets, true).unwrap();
	session.commit().unwrap();

	assert_eq!(affected.len(), 4);
	for (n, target) in (2..=4).zip(targets) {
		let record = store.visible(target).unwrap();
		assert_eq!(record.nickname(), format!("Sensor{n}"));
		assert_eq!(record.initial_value(), n.to_string());
		assert_eq!(record.comment(), "C");
		assert!(record.retentive());
		assert!(record.is_valid());
	}
	for k in std::iter::once(source).chain(targets) {
		let nickname = store.visible(k).unwrap().nickname().to_string();
		assert!(!store.is_duplicate_nickname(&nickname, k));
	}

	assert_eq!(store.history().undo_len(), 1);
	store.undo().unwrap();
	assert!(targets.iter().all(|&k| store.visible(k).unwrap().is_empty()));
}

#[test]
fn fill_down_rejects_occupied_targets() {
	let (mut store, _) = open([
		row(MemoryType::DS, 1).with_nickname("Sensor1"),
		row(MemoryType::DS, 3).with_nickname("Taken"),
	]);
	let targets = [key(MemoryType::DS, 2), key(MemoryType::DS, 3)];

	let mut session = store.edit("Fill down").unwrap();
	let err = fill_down(&mut session, key(MemoryType::DS, 1), &targets, false).unwrap_err();
	assert!(matches!(err, RowEditError::Rejected(RowOpError::TargetsNotEmpty)));
	let outcome = session.commit().unwrap();
	assert!(!outcome.changed());
}

#[test]
fn clone_structure_replicates_template_blocks() {
	let (mut store, _) = open([
		row(MemoryType::DS, 1).with_nickname("Tank1_Level"),
		row(MemoryType::DS, 2).with_comment("spare"),
		row(MemoryType::DS, 3).with_nickname("Tank1_Temp").with_initial_value("7"),
	]);
	let template = [1, 2, 3].map(|addr| key(MemoryType::DS, addr));
	let destination: Vec<_> = (11..=16).map(|addr| key(MemoryType::DS, addr)).collect();

	let mut session = store.edit("Clone structure").unwrap();
	let affected = clone_structure(&mut session, &template, &destination, 2, true).unwrap();
	session.commit().unwrap();

	assert_eq!(affected.len(), 6);
	let nick = |addr| store.visible(key(MemoryType::DS, addr)).unwrap().nickname().to_string();
	assert_eq!(
		[11, 12, 13, 14, 15, 16].map(nick),
		["Tank2_Level", "", "Tank2_Temp", "Tank3_Level", "", "Tank3_Temp"].map(String::from)
	);
	let ds12 = store.visible(key(MemoryType::DS, 12)).unwrap();
	assert_eq!(ds12.comment(), "spare");
	let ds13 = store.visible(key(MemoryType::DS, 13)).unwrap();
	assert_eq!(ds13.initial_value(), "7");
}

#[test]
fn clone_structure_checks_destination() {
	let (mut store, _) = open([row(MemoryType::DS, 1).with_nickname("Pump1")]);
	let template = [key(MemoryType::DS, 1)];

	let mut session = store.edit("Clone structure").unwrap();
	let err = clone_structure(&mut session, &template, &[key(MemoryType::DD, 1)], 1, false).unwrap_err();
	assert!(matches!(
		err,
		RowEditError::Rejected(RowOpError::DestinationTypeMismatch { .. })
	));

	let err = clone_structure(&mut session, &template, &[], 1, false).unwrap_err();
	assert!(matches!(
		err,
		RowEditError::Rejected(RowOpError::NotEnoughDestinations { needed: 1, available: 0 })
	));
	drop(session);
	assert!(!store.can_undo());
}

#[test]
fn clone_onto_system_rows_skips_locked_fields() {
	let (mut store, _) = open([row(MemoryType::SC, 1).with_nickname("Sys1")]);
	let mut session = store.edit("Clone structure").unwrap();
	clone_structure(
		&mut session,
		&[key(MemoryType::SC, 1)],
		&[key(MemoryType::SC, 2)],
		1,
		false,
	)
	.unwrap();
	session.commit().unwrap();

	let sc2 = store.visible(key(MemoryType::SC, 2)).unwrap();
	assert_eq!(sc2.nickname(), "Sys2");
	assert!(!store.is_field_dirty(key(MemoryType::SC, 2), Field::Retentive));
}
