//! Cross-thread handle to one store.
//!
//! The lock is held for the whole of an [`edit`](SharedStore::edit), so no
//! other thread can observe or modify the store between the start and end
//! of a session.

use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};

use crate::error::{Result, StoreError};
use crate::session::{EditSession, SessionOutcome};
use crate::store::AddressStore;

#[derive(Clone)]
pub struct SharedStore {
	inner: Arc<Mutex<AddressStore>>,
}

impl SharedStore {
	pub fn new(store: AddressStore) -> Self {
		Self {
			inner: Arc::new(Mutex::new(store)),
		}
	}

	/// Locks the store for direct access.
	pub fn lock(&self) -> MutexGuard<'_, AddressStore> {
		self.inner.lock()
	}

	/// Runs `f` inside one session while holding the lock.
	///
	/// The session ends even if `f` fails; writes made before the failure
	/// are committed.
	pub fn edit<R, E>(
		&self,
		description: impl Into<String>,
		f: impl FnOnce(&mut EditSession<'_>) -> std::result::Result<R, E>,
	) -> std::result::Result<(R, SessionOutcome), E>
	where
		E: From<StoreError>,
	{
		let mut store = self.inner.lock();
		let mut session = store.edit(description)?;
		let value = f(&mut session)?;
		let outcome = session.commit()?;
		Ok((value, outcome))
	}

	/// Runs `f` with shared access.
	pub fn read<R>(&self, f: impl FnOnce(&AddressStore) -> R) -> R {
		f(&self.inner.lock())
	}

	pub fn undo(&self) -> Result<bool> {
		self.inner.lock().undo()
	}

	pub fn redo(&self) -> Result<bool> {
		self.inner.lock().redo()
	}

	pub fn save(&self) -> Result<usize> {
		self.inner.lock().save()
	}
}
