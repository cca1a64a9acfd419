use nickdb_primitives::AddrKey;
use rustc_hash::FxHashMap;
use tracing::{debug, trace, warn};

use super::{AddressStore, skeleton_base};
use crate::KeySet;
use crate::error::{Result, SourceError, StoreError};
use crate::monitor::FileMonitor;
use crate::record::AddressRecord;

impl AddressStore {
	/// Replaces all state with what the data source holds.
	///
	/// Drops pending edits and history. Observers get a full-refresh
	/// notification.
	pub fn load(&mut self) -> Result<()> {
		self.ensure_idle()?;
		let loaded = self.source.load_all_addresses()?;
		self.layers.base = self.build_base(&loaded);
		self.layers.overrides.clear();
		self.history.clear();

		self.nicknames.rebuild(self.layers.base.values());
		self.mark_loaded_errors();
		self.validate_all();
		self.recompute_block_colors();

		self.monitor = self
			.source
			.file_path()
			.map(|path| FileMonitor::new(path, self.config.monitor_interval()));
		self.loaded = true;
		debug!(rows = loaded.len(), skeleton = self.order.len(), "address data loaded");
		self.notify(None);
		Ok(())
	}

	/// Re-reads the data source underneath pending edits.
	///
	/// Base is replaced wholesale. Overrides keep their content but adopt
	/// the new saved values; an override that now matches base is dropped.
	/// Every key whose base changed is reported, including keys whose
	/// visible content is unchanged because an override hides it.
	pub fn reload_from_source(&mut self) -> Result<KeySet> {
		self.ensure_idle()?;
		let loaded = self.source.load_all_addresses()?;
		let mut base = self.build_base(&loaded);

		let mut affected = KeySet::new();
		for (key, fresh) in base.iter_mut() {
			if let Some(previous) = self.layers.base.get(key) {
				if !previous.same_source_state(fresh) {
					affected.insert(*key);
				}
				previous.transfer_derived(fresh);
			}
		}
		self.layers.base = base;

		let overridden: Vec<AddrKey> = self.layers.overrides.keys().copied().collect();
		let mut pruned = 0usize;
		for key in overridden {
			let Some(fresh) = self.layers.base.get(&key) else {
				self.layers.overrides.remove(&key);
				continue;
			};
			if let Some(record) = self.layers.overrides.get_mut(&key) {
				record.rebase(fresh);
			}
			if self.layers.prune(key) {
				pruned += 1;
			}
		}

		self.nicknames
			.rebuild(self.order.iter().filter_map(|&key| self.layers.visible(key)));
		self.mark_loaded_errors();
		affected.extend(self.validate_all());
		affected.extend(self.recompute_block_colors());

		debug!(
			rows = loaded.len(),
			changed = affected.len(),
			pruned,
			pending = self.layers.overrides.len(),
			"reloaded from source"
		);
		if !affected.is_empty() {
			self.notify(Some(&affected));
		}
		Ok(affected)
	}

	/// Persists pending edits through the data source.
	///
	/// All or nothing: if the source fails, no record is marked saved. On
	/// success emptied rows return to skeleton defaults, the rest adopt
	/// their content as the saved state, and the overlay is cleared.
	pub fn save(&mut self) -> Result<usize> {
		self.ensure_idle()?;
		if self.source.is_read_only() {
			return Err(SourceError::ReadOnly.into());
		}
		if self.layers.overrides.is_empty() {
			trace!("save: nothing pending");
			return Ok(0);
		}

		let written = {
			let records: Vec<&AddressRecord> = self
				.order
				.iter()
				.filter_map(|&key| self.layers.visible(key))
				.collect();
			self.source.save_changes(&records)?
		};

		let overrides = std::mem::take(&mut self.layers.overrides);
		let mut saved = KeySet::new();
		for (key, mut record) in overrides {
			if record.needs_full_delete() {
				record.reset_to_skeleton();
			} else {
				record.mark_saved();
			}
			self.layers.base.insert(key, record);
			saved.insert(key);
		}
		for &key in &saved {
			self.validate_key(key);
		}

		if let Some(monitor) = self.monitor.as_mut() {
			monitor.acknowledge();
		}
		debug!(written, rows = saved.len(), "saved");
		self.notify(Some(&saved));
		Ok(written)
	}

	/// Reloads if the backing file changed since the last poll.
	///
	/// Nothing is polled while a session is open. A locked or unreadable
	/// file counts as "no change". Whenever the reload fails the monitor is
	/// rewound so the next poll retries. Returns the affected keys when a
	/// reload happened.
	pub fn poll_external_changes(&mut self) -> Result<Option<KeySet>> {
		if self.session.is_some() {
			return Ok(None);
		}
		let Some(monitor) = self.monitor.as_mut() else {
			return Ok(None);
		};
		if !monitor.poll() {
			return Ok(None);
		}
		let result = self.reload_from_source();
		if result.is_err() {
			if let Some(monitor) = self.monitor.as_mut() {
				monitor.rewind();
			}
		}
		match result {
			Ok(affected) => Ok(Some(affected)),
			Err(StoreError::Source(error)) if error.is_transient() => {
				warn!(%error, "external change not loaded; retrying on next poll");
				Ok(None)
			}
			Err(error) => Err(error),
		}
	}

	/// Skeleton hydrated with the loaded rows. Rows outside the skeleton
	/// are ignored.
	fn build_base(&self, loaded: &FxHashMap<AddrKey, AddressRecord>) -> FxHashMap<AddrKey, AddressRecord> {
		let mut base = skeleton_base(&self.order);
		let mut ignored = 0usize;
		for (key, row) in loaded {
			match base.get_mut(key) {
				Some(slot) => slot.hydrate(row),
				None => ignored += 1,
			}
		}
		if ignored > 0 {
			warn!(ignored, "loaded rows outside the address map ignored");
		}
		base
	}
}
