//! Change notification.
//!
//! Observers are told which keys a committed change affected, or `None` when
//! everything must be refreshed. A failing or panicking observer is logged
//! and skipped; the remaining observers are still notified.

use std::panic::{AssertUnwindSafe, catch_unwind};

use slab::Slab;
use tracing::warn;

use crate::KeySet;
use crate::store::AddressStore;

/// Receives change notifications from an [`AddressStore`].
pub trait Observer: Send {
	/// `keys` is `None` after a full load.
	fn notify(&self, store: &AddressStore, keys: Option<&KeySet>) -> anyhow::Result<()>;
}

impl<F> Observer for F
where
	F: Fn(&AddressStore, Option<&KeySet>) -> anyhow::Result<()> + Send,
{
	fn notify(&self, store: &AddressStore, keys: Option<&KeySet>) -> anyhow::Result<()> {
		self(store, keys)
	}
}

/// Handle returned by [`AddressStore::add_observer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(usize);

#[derive(Default)]
pub(crate) struct ObserverRegistry {
	observers: Slab<Box<dyn Observer>>,
}

impl ObserverRegistry {
	pub fn add(&mut self, observer: Box<dyn Observer>) -> ObserverId {
		ObserverId(self.observers.insert(observer))
	}

	pub fn remove(&mut self, id: ObserverId) -> bool {
		self.observers.try_remove(id.0).is_some()
	}

	pub fn len(&self) -> usize {
		self.observers.len()
	}

	pub fn notify_all(&self, store: &AddressStore, keys: Option<&KeySet>) {
		for (id, observer) in &self.observers {
			match catch_unwind(AssertUnwindSafe(|| observer.notify(store, keys))) {
				Ok(Ok(())) => {}
				Ok(Err(error)) => warn!(observer = id, error = %error, "observer failed"),
				Err(_) => warn!(observer = id, "observer panicked"),
			}
		}
	}
}

impl std::fmt::Debug for ObserverRegistry {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ObserverRegistry")
			.field("observers", &self.observers.len())
			.finish()
	}
}
