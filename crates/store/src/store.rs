//! The address store: base snapshot, sparse edit overlay, undo history and
//! the derived state kept consistent with them.
//!
//! Visible state is `overrides[key]` if present, else `base[key]`. User
//! edits only ever write overrides; loads and reloads only ever replace
//! base. An override exists exactly while its record is dirty.
//!
//! Derived state (nickname index, validation, block colors) is brought up to
//! date when a session ends, on undo/redo, and after load, reload and save.

mod derive;
mod edit;
mod persist;

use std::collections::hash_map::Entry;

use nickdb_primitives::{AddrKey, MemoryType};
use rustc_hash::FxHashMap;

use crate::KeySet;
use crate::blocks::{BlockRange, compute_block_ranges};
use crate::config::StoreConfig;
use crate::history::History;
use crate::monitor::FileMonitor;
use crate::nickname_index::NicknameIndex;
use crate::observer::{Observer, ObserverId, ObserverRegistry};
use crate::record::{AddressRecord, Field};
use crate::session::SessionState;
use crate::source::DataSource;

/// Base and overlay maps.
#[derive(Debug, Default)]
struct Layers {
	base: FxHashMap<AddrKey, AddressRecord>,
	overrides: FxHashMap<AddrKey, AddressRecord>,
}

impl Layers {
	fn visible(&self, key: AddrKey) -> Option<&AddressRecord> {
		self.overrides.get(&key).or_else(|| self.base.get(&key))
	}

	fn visible_mut(&mut self, key: AddrKey) -> Option<&mut AddressRecord> {
		match self.overrides.get_mut(&key) {
			Some(record) => Some(record),
			None => self.base.get_mut(&key),
		}
	}

	/// Override for `key`, created from base on first write.
	fn override_mut(&mut self, key: AddrKey) -> Option<&mut AddressRecord> {
		match self.overrides.entry(key) {
			Entry::Occupied(entry) => Some(entry.into_mut()),
			Entry::Vacant(entry) => {
				let base = self.base.get(&key)?.clone();
				Some(entry.insert(base))
			}
		}
	}

	/// Drops a clean override, handing its derived state to base.
	fn prune(&mut self, key: AddrKey) -> bool {
		if self.overrides.get(&key).is_none_or(AddressRecord::is_dirty) {
			return false;
		}
		let Some(record) = self.overrides.remove(&key) else {
			return false;
		};
		if let Some(base) = self.base.get_mut(&key) {
			record.transfer_derived(base);
		}
		true
	}
}

/// Block listing entry returned by [`AddressStore::block_addresses`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockSpan {
	pub start: AddrKey,
	/// `None` for single-row blocks.
	pub end: Option<AddrKey>,
	pub name: String,
	pub bg_color: Option<String>,
}

/// In-memory address database.
pub struct AddressStore {
	config: StoreConfig,
	source: Box<dyn DataSource>,
	/// Every visible slot in display order.
	order: Vec<AddrKey>,
	positions: FxHashMap<AddrKey, usize>,
	layers: Layers,
	nicknames: NicknameIndex,
	history: History,
	session: Option<SessionState>,
	observers: ObserverRegistry,
	monitor: Option<FileMonitor>,
	loaded: bool,
}

impl AddressStore {
	/// Builds the empty skeleton. Nothing is read until [`load`](Self::load).
	pub fn new(source: impl DataSource + 'static, config: StoreConfig) -> Self {
		let order = skeleton_order();
		let positions = order.iter().enumerate().map(|(idx, &key)| (key, idx)).collect();
		let layers = Layers {
			base: skeleton_base(&order),
			overrides: FxHashMap::default(),
		};
		Self {
			history: History::new(config.max_undo_depth),
			config,
			source: Box::new(source),
			order,
			positions,
			layers,
			nicknames: NicknameIndex::new(),
			session: None,
			observers: ObserverRegistry::default(),
			monitor: None,
			loaded: false,
		}
	}

	/// Builds the skeleton and loads it from `source`.
	pub fn open(source: impl DataSource + 'static, config: StoreConfig) -> crate::Result<Self> {
		let mut store = Self::new(source, config);
		store.load()?;
		Ok(store)
	}

	pub fn config(&self) -> &StoreConfig {
		&self.config
	}

	pub fn is_loaded(&self) -> bool {
		self.loaded
	}

	pub fn source(&self) -> &dyn DataSource {
		self.source.as_ref()
	}

	pub fn is_read_only(&self) -> bool {
		self.source.is_read_only()
	}

	pub fn monitor(&self) -> Option<&FileMonitor> {
		self.monitor.as_ref()
	}

	/// Number of visible slots.
	pub fn len(&self) -> usize {
		self.order.len()
	}

	pub fn is_empty(&self) -> bool {
		self.order.is_empty()
	}

	/// Keys in display order.
	pub fn order(&self) -> &[AddrKey] {
		&self.order
	}

	/// Position of `key` in display order.
	pub fn row_index(&self, key: AddrKey) -> Option<usize> {
		self.positions.get(&key).copied()
	}

	/// Visible record of `key`.
	pub fn visible(&self, key: AddrKey) -> Option<&AddressRecord> {
		self.layers.visible(key)
	}

	pub fn base_record(&self, key: AddrKey) -> Option<&AddressRecord> {
		self.layers.base.get(&key)
	}

	pub fn override_record(&self, key: AddrKey) -> Option<&AddressRecord> {
		self.layers.overrides.get(&key)
	}

	pub fn record_at(&self, idx: usize) -> Option<&AddressRecord> {
		self.layers.visible(*self.order.get(idx)?)
	}

	/// Visible records in display order.
	pub fn rows(&self) -> impl Iterator<Item = &AddressRecord> {
		self.order.iter().filter_map(|&key| self.layers.visible(key))
	}

	/// Visible records of one memory type, in address order.
	pub fn rows_of_type(&self, memory_type: MemoryType) -> impl Iterator<Item = &AddressRecord> {
		self.rows()
			.filter(move |record| record.memory_type() == memory_type)
	}

	pub fn nickname_index(&self) -> &NicknameIndex {
		&self.nicknames
	}

	/// Keys whose nickname matches `nickname` case-insensitively.
	pub fn keys_for_nickname(&self, nickname: &str) -> KeySet {
		self.nicknames.lookup_insensitive(nickname)
	}

	pub fn is_duplicate_nickname(&self, nickname: &str, exclude: AddrKey) -> bool {
		self.nicknames.is_duplicate(nickname, exclude)
	}

	pub fn history(&self) -> &History {
		&self.history
	}

	pub fn can_undo(&self) -> bool {
		self.history.can_undo()
	}

	pub fn can_redo(&self) -> bool {
		self.history.can_redo()
	}

	pub fn undo_description(&self) -> Option<&str> {
		self.history.undo_description()
	}

	pub fn redo_description(&self) -> Option<&str> {
		self.history.redo_description()
	}

	/// Number of records with pending edits.
	pub fn modified_count(&self) -> usize {
		self.layers.overrides.len()
	}

	pub fn modified_count_for(&self, memory_type: MemoryType) -> usize {
		self.layers
			.overrides
			.values()
			.filter(|record| record.memory_type() == memory_type)
			.count()
	}

	pub fn has_unsaved_changes(&self) -> bool {
		!self.layers.overrides.is_empty()
	}

	pub fn dirty_keys(&self) -> KeySet {
		self.layers.overrides.keys().copied().collect()
	}

	pub fn is_dirty(&self, key: AddrKey) -> bool {
		self.layers.overrides.contains_key(&key)
	}

	pub fn is_field_dirty(&self, key: AddrKey, field: Field) -> bool {
		self.layers
			.overrides
			.get(&key)
			.is_some_and(|record| record.is_field_dirty(field))
	}

	/// Records with an error worth reporting.
	pub fn error_count(&self) -> usize {
		self.rows().filter(|record| record.has_reportable_error()).count()
	}

	pub fn error_count_for(&self, memory_type: MemoryType) -> usize {
		self.rows_of_type(memory_type)
			.filter(|record| record.has_reportable_error())
			.count()
	}

	pub fn has_errors(&self) -> bool {
		self.rows().any(AddressRecord::has_reportable_error)
	}

	/// Block ranges over the whole display order.
	pub fn block_ranges(&self) -> Vec<BlockRange> {
		let rows: Vec<&AddressRecord> = self.rows().collect();
		compute_block_ranges(&rows)
	}

	/// Blocks opened on rows of `memory_type`, in display order.
	pub fn block_addresses(&self, memory_type: MemoryType) -> Vec<BlockSpan> {
		self.block_ranges()
			.into_iter()
			.filter(|range| range.memory_type == Some(memory_type))
			.filter_map(|range| {
				let start = *self.order.get(range.start)?;
				let end = (range.end != range.start)
					.then(|| self.order.get(range.end).copied())
					.flatten();
				Some(BlockSpan {
					start,
					end,
					name: range.name,
					bg_color: range.bg_color,
				})
			})
			.collect()
	}

	/// Registers an observer for change notifications.
	pub fn add_observer(&mut self, observer: impl Observer + 'static) -> ObserverId {
		self.observers.add(Box::new(observer))
	}

	pub fn remove_observer(&mut self, id: ObserverId) -> bool {
		self.observers.remove(id)
	}

	pub fn observer_count(&self) -> usize {
		self.observers.len()
	}

	fn notify(&self, keys: Option<&KeySet>) {
		self.observers.notify_all(self, keys);
	}
}

/// Visible slots in display order. Interleaved pairs alternate by address.
fn skeleton_order() -> Vec<AddrKey> {
	let mut order = Vec::new();
	for group in MemoryType::DISPLAY_GROUPS {
		let mut slots: Vec<(u32, usize, MemoryType)> = group
			.iter()
			.enumerate()
			.flat_map(|(rank, &memory_type)| {
				memory_type
					.visible_addresses()
					.map(move |address| (address, rank, memory_type))
			})
			.collect();
		slots.sort_unstable_by_key(|&(address, rank, _)| (address, rank));
		order.extend(
			slots
				.into_iter()
				.filter_map(|(address, _, memory_type)| AddrKey::encode(memory_type, address).ok()),
		);
	}
	order
}

fn skeleton_base(order: &[AddrKey]) -> FxHashMap<AddrKey, AddressRecord> {
	order
		.iter()
		.filter_map(|&key| Some((key, AddressRecord::skeleton(key).ok()?)))
		.collect()
}
