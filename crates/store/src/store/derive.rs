use nickdb_primitives::{
	AddrKey, validate_comment, validate_initial_value, validate_nickname, validate_nickname_format,
};
use tracing::trace;

use super::AddressStore;
use crate::KeySet;
use crate::blocks::{block_colors, compute_block_ranges};
use crate::history::FieldChange;
use crate::record::{AddressRecord, Field, Validation};

impl AddressStore {
	/// Brings derived state up to date after `changes` were applied.
	///
	/// Prunes clean overrides among `touched`, updates the nickname index,
	/// revalidates changed keys plus every key sharing an old or new
	/// nickname, and recomputes block colors if a comment changed. Returns
	/// the changed keys together with every key whose derived state moved.
	pub(super) fn converge(&mut self, touched: &KeySet, changes: &[FieldChange]) -> KeySet {
		for &key in touched {
			self.layers.prune(key);
		}

		let mut affected: KeySet = changes.iter().map(|change| change.key).collect();
		let mut names = Vec::new();
		for change in changes.iter().filter(|change| change.field == Field::Nickname) {
			let old = change.old.as_text().unwrap_or_default();
			let new = change.new.as_text().unwrap_or_default();
			self.nicknames.update(change.key, old, new);
			names.extend([old, new].into_iter().filter(|name| !name.is_empty()));
		}

		let mut to_validate = affected.clone();
		for name in names {
			to_validate.extend(self.nicknames.lookup_insensitive(name));
		}
		for &key in &to_validate {
			if self.validate_key(key) {
				affected.insert(key);
			}
		}

		if changes.iter().any(|change| change.field == Field::Comment) {
			affected.extend(self.recompute_block_colors());
		}

		trace!(
			changes = changes.len(),
			validated = to_validate.len(),
			affected = affected.len(),
			"derived state converged"
		);
		affected
	}

	/// Revalidates one visible record. Returns whether its validation moved.
	pub(super) fn validate_key(&mut self, key: AddrKey) -> bool {
		let Some(record) = self.layers.visible(key) else {
			return false;
		};
		let nicknames = &self.nicknames;
		let is_duplicate = |name: &str, exclude: AddrKey| nicknames.is_duplicate(name, exclude);
		let validation = Validation {
			nickname: validate_nickname(
				record.nickname(),
				std::iter::empty::<(AddrKey, &str)>(),
				key,
				Some(&is_duplicate),
			)
			.err(),
			initial_value: validate_initial_value(record.initial_value(), record.data_type()).err(),
			comment: if self.config.validate_comment_length {
				validate_comment(record.comment()).err()
			} else {
				None
			},
		};

		let Some(record) = self.layers.visible_mut(key) else {
			return false;
		};
		if record.validation == validation {
			return false;
		}
		record.validation = validation;
		true
	}

	pub(super) fn validate_all(&mut self) -> KeySet {
		let mut changed = KeySet::new();
		for idx in 0..self.order.len() {
			let key = self.order[idx];
			if self.validate_key(key) {
				changed.insert(key);
			}
		}
		changed
	}

	/// Recomputes block colors over the whole display order. Returns the keys
	/// whose color changed.
	pub(super) fn recompute_block_colors(&mut self) -> KeySet {
		let updates: Vec<(AddrKey, Option<String>)> = {
			let rows: Vec<&AddressRecord> = self.rows().collect();
			let ranges = compute_block_ranges(&rows);
			let colors = block_colors(&ranges, rows.len());
			rows.iter()
				.zip(colors)
				.filter(|(record, color)| record.block_color() != *color)
				.map(|(record, color)| (record.key(), color.map(str::to_string)))
				.collect()
		};

		let mut changed = KeySet::new();
		for (key, color) in updates {
			if let Some(record) = self.layers.visible_mut(key) {
				record.block_color = color;
				changed.insert(key);
			}
		}
		trace!(changed = changed.len(), "block colors recomputed");
		changed
	}

	/// Flags tolerated legacy nicknames that are invalid as loaded.
	pub(super) fn mark_loaded_errors(&mut self) {
		let flagged: Vec<AddrKey> = self
			.layers
			.base
			.values()
			.filter(|record| {
				self.config.tolerates_load_errors(record.memory_type())
					&& !record.nickname().is_empty()
					&& (validate_nickname_format(record.nickname()).is_err()
						|| self.nicknames.is_duplicate(record.nickname(), record.key()))
			})
			.map(AddressRecord::key)
			.collect();

		for &key in &flagged {
			if let Some(record) = self.layers.base.get_mut(&key) {
				record.loaded_with_error = true;
			}
		}
		for (key, record) in self.layers.overrides.iter_mut() {
			if let Some(base) = self.layers.base.get(key) {
				record.loaded_with_error = base.loaded_with_error;
			}
		}
		if !flagged.is_empty() {
			trace!(flagged = flagged.len(), "legacy nickname errors tolerated");
		}
	}
}
