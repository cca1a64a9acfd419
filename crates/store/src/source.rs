//! The persistence boundary.
//!
//! The store loads and saves through a [`DataSource`]; concrete database and
//! file drivers live outside this crate. [`MemoryDataSource`] is a complete
//! in-process implementation for embedding and tests.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use nickdb_primitives::AddrKey;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use crate::error::SourceError;
use crate::record::AddressRecord;

/// Loads and persists address rows.
pub trait DataSource: Send {
	/// Reads every stored row. Keys absent from the result are empty slots.
	fn load_all_addresses(&mut self) -> Result<FxHashMap<AddrKey, AddressRecord>, SourceError>;

	/// Persists changes.
	///
	/// `records` is the whole visible skeleton in display order. Returns how
	/// many rows were written. An implementation may rewrite everything or
	/// only the dirty rows.
	fn save_changes(&mut self, records: &[&AddressRecord]) -> Result<usize, SourceError>;

	/// Backing file, if any. Enables external change polling.
	fn file_path(&self) -> Option<&Path> {
		None
	}

	fn supports_used_field(&self) -> bool {
		true
	}

	fn is_read_only(&self) -> bool {
		false
	}
}

#[derive(Debug, Default)]
struct MemoryInner {
	rows: FxHashMap<AddrKey, AddressRecord>,
	read_only: bool,
	locked: bool,
	fail_next_save: Option<String>,
	save_calls: usize,
}

/// Shared in-memory row table.
///
/// Clones share the same table, so a test can keep one handle and give
/// another to the store, then change rows "externally" and reload.
#[derive(Debug, Clone, Default)]
pub struct MemoryDataSource {
	inner: Arc<Mutex<MemoryInner>>,
	path: Option<PathBuf>,
}

impl MemoryDataSource {
	pub fn new() -> Self {
		Self::default()
	}

	/// Seeds the table with clean rows.
	pub fn with_rows(rows: impl IntoIterator<Item = AddressRecord>) -> Self {
		let source = Self::new();
		for row in rows {
			source.put(row);
		}
		source
	}

	/// Reports `path` as the backing file so the store polls it for changes.
	pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
		self.path = Some(path.into());
		self
	}

	/// Inserts or replaces a stored row.
	pub fn put(&self, row: AddressRecord) {
		self.inner.lock().rows.insert(row.key(), row);
	}

	pub fn remove(&self, key: AddrKey) -> Option<AddressRecord> {
		self.inner.lock().rows.remove(&key)
	}

	pub fn get(&self, key: AddrKey) -> Option<AddressRecord> {
		self.inner.lock().rows.get(&key).cloned()
	}

	pub fn len(&self) -> usize {
		self.inner.lock().rows.len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	pub fn set_read_only(&self, read_only: bool) {
		self.inner.lock().read_only = read_only;
	}

	/// Simulates another process holding the backing file.
	pub fn set_locked(&self, locked: bool) {
		self.inner.lock().locked = locked;
	}

	/// Makes the next save fail with a backend error.
	pub fn fail_next_save(&self, message: impl Into<String>) {
		self.inner.lock().fail_next_save = Some(message.into());
	}

	/// Number of `save_changes` calls that reached the table.
	pub fn save_calls(&self) -> usize {
		self.inner.lock().save_calls
	}
}

impl DataSource for MemoryDataSource {
	fn load_all_addresses(&mut self) -> Result<FxHashMap<AddrKey, AddressRecord>, SourceError> {
		let inner = self.inner.lock();
		if inner.locked {
			return Err(SourceError::Locked);
		}
		Ok(inner.rows.clone())
	}

	fn save_changes(&mut self, records: &[&AddressRecord]) -> Result<usize, SourceError> {
		let mut inner = self.inner.lock();
		if inner.read_only {
			return Err(SourceError::ReadOnly);
		}
		if inner.locked {
			return Err(SourceError::Locked);
		}
		if let Some(message) = inner.fail_next_save.take() {
			return Err(SourceError::Backend(message));
		}
		inner.save_calls += 1;

		let mut written = 0;
		for record in records.iter().filter(|record| record.is_dirty()) {
			if record.needs_full_delete() {
				inner.rows.remove(&record.key());
				written += 1;
			} else {
				let mut row = (*record).clone();
				row.mark_saved();
				inner.rows.insert(row.key(), row);
				written += 1;
			}
		}
		Ok(written)
	}

	fn file_path(&self) -> Option<&Path> {
		self.path.as_deref()
	}

	fn is_read_only(&self) -> bool {
		self.inner.lock().read_only
	}
}
