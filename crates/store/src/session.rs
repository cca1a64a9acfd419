//! Edit sessions.
//!
//! A session groups field writes into one transaction. Writes land in the
//! overlay immediately but nothing derived (dependency sync, nickname index,
//! validation, block colors, observers) runs until the session ends.
//! Sessions never nest.
//!
//! [`EditSession`] is the scoped form: ending the session is tied to the
//! guard's `Drop`, so finalization also runs on early return and unwinding.

use std::collections::BTreeMap;

use nickdb_primitives::AddrKey;
use tracing::warn;

use crate::KeySet;
use crate::error::Result;
use crate::history::UndoPolicy;
use crate::record::{AddressRecord, Field, FieldValue};
use crate::store::AddressStore;

/// How a session is finalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOptions {
	pub undo: UndoPolicy,
	/// Run interleaved-pair and block-partner sync on end.
	pub sync_dependencies: bool,
}

impl Default for SessionOptions {
	fn default() -> Self {
		Self {
			undo: UndoPolicy::Record,
			sync_dependencies: true,
		}
	}
}

/// Bookkeeping of the open session.
#[derive(Debug)]
pub(crate) struct SessionState {
	pub description: String,
	pub options: SessionOptions,
	/// Value each (key, field) held before its first write in this session.
	pub originals: BTreeMap<(AddrKey, Field), FieldValue>,
	/// Keys written by the caller, as opposed to by dependency sync.
	pub explicit: KeySet,
	/// Every key written in this session.
	pub touched: KeySet,
}

impl SessionState {
	pub fn new(description: String, options: SessionOptions) -> Self {
		Self {
			description,
			options,
			originals: BTreeMap::new(),
			explicit: KeySet::new(),
			touched: KeySet::new(),
		}
	}

	pub fn original(&self, key: AddrKey, field: Field) -> Option<&FieldValue> {
		self.originals.get(&(key, field))
	}

	pub fn record_write(&mut self, key: AddrKey, field: Field, old: FieldValue, explicit: bool) {
		self.originals.entry((key, field)).or_insert(old);
		self.touched.insert(key);
		if explicit {
			self.explicit.insert(key);
		}
	}
}

/// What ending a session did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionOutcome {
	/// Keys observers were notified about. Empty if nothing changed.
	pub affected: KeySet,
	/// Whether an undo frame was pushed.
	pub recorded: bool,
}

impl SessionOutcome {
	pub fn changed(&self) -> bool {
		!self.affected.is_empty()
	}
}

/// Scoped edit session. Ends the session when dropped.
pub struct EditSession<'a> {
	store: &'a mut AddressStore,
	finished: bool,
}

impl<'a> EditSession<'a> {
	pub(crate) fn new(store: &'a mut AddressStore) -> Self {
		Self {
			store,
			finished: false,
		}
	}

	/// Writes one field into the overlay.
	pub fn set_field(&mut self, key: AddrKey, field: Field, value: impl Into<FieldValue>) -> Result<()> {
		self.store.set_field(key, field, value)
	}

	/// Visible record, including writes made earlier in this session.
	pub fn record(&self, key: AddrKey) -> Option<&AddressRecord> {
		self.store.visible(key)
	}

	/// Read access to the whole store.
	pub fn store(&self) -> &AddressStore {
		self.store
	}

	/// Ends the session and reports what it changed.
	pub fn commit(mut self) -> Result<SessionOutcome> {
		self.finished = true;
		self.store.end_session()
	}
}

impl Drop for EditSession<'_> {
	fn drop(&mut self) {
		if self.finished {
			return;
		}
		if let Err(err) = self.store.end_session() {
			warn!(error = %err, "edit session finalizer failed");
		}
	}
}
