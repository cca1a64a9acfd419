//! Reverse index from nickname to address keys.
//!
//! Two maps are kept in lockstep: exact-case and lowercased. Nicknames are
//! case-insensitive for duplicate purposes, so the lowercased map answers
//! [`NicknameIndex::is_duplicate`] in O(1).

use nickdb_primitives::AddrKey;
use rustc_hash::FxHashMap;

use crate::KeySet;
use crate::record::AddressRecord;

#[derive(Debug, Default, Clone)]
pub struct NicknameIndex {
	exact: FxHashMap<String, KeySet>,
	insensitive: FxHashMap<String, KeySet>,
}

fn insert(map: &mut FxHashMap<String, KeySet>, name: String, key: AddrKey) {
	map.entry(name).or_default().insert(key);
}

fn remove(map: &mut FxHashMap<String, KeySet>, name: &str, key: AddrKey) {
	if let Some(keys) = map.get_mut(name) {
		keys.remove(&key);
		if keys.is_empty() {
			map.remove(name);
		}
	}
}

impl NicknameIndex {
	pub fn new() -> Self {
		Self::default()
	}

	/// Clears and repopulates both maps in one pass.
	pub fn rebuild<'a>(&mut self, records: impl IntoIterator<Item = &'a AddressRecord>) {
		self.exact.clear();
		self.insensitive.clear();
		for record in records {
			let nickname = record.nickname();
			if nickname.is_empty() {
				continue;
			}
			insert(&mut self.exact, nickname.to_string(), record.key());
			insert(&mut self.insensitive, nickname.to_lowercase(), record.key());
		}
	}

	/// Moves `key` from `old` to `new`. A no-op when the two are equal.
	pub fn update(&mut self, key: AddrKey, old: &str, new: &str) {
		if old == new {
			return;
		}
		if !old.is_empty() {
			remove(&mut self.exact, old, key);
			remove(&mut self.insensitive, &old.to_lowercase(), key);
		}
		if !new.is_empty() {
			insert(&mut self.exact, new.to_string(), key);
			insert(&mut self.insensitive, new.to_lowercase(), key);
		}
	}

	/// Keys holding exactly `nickname`.
	pub fn lookup_exact(&self, nickname: &str) -> KeySet {
		self.exact.get(nickname).cloned().unwrap_or_default()
	}

	/// Keys holding `nickname` in any letter case.
	pub fn lookup_insensitive(&self, nickname: &str) -> KeySet {
		if nickname.is_empty() {
			return KeySet::new();
		}
		self.insensitive
			.get(&nickname.to_lowercase())
			.cloned()
			.unwrap_or_default()
	}

	/// Whether any key other than `exclude` holds `nickname` (any case).
	pub fn is_duplicate(&self, nickname: &str, exclude: AddrKey) -> bool {
		if nickname.is_empty() {
			return false;
		}
		match self.insensitive.get(&nickname.to_lowercase()) {
			Some(keys) => keys.len() > 1 || (keys.len() == 1 && !keys.contains(&exclude)),
			None => false,
		}
	}

	/// Number of distinct exact-case nicknames.
	pub fn len(&self) -> usize {
		self.exact.len()
	}

	pub fn is_empty(&self) -> bool {
		self.exact.is_empty()
	}
}
