//! In-memory address database with transactional edits.
//!
//! [`AddressStore`] holds one [`AddressRecord`] per address slot, split into
//! a base snapshot from the [`DataSource`] and a sparse overlay of pending
//! edits. Edits are grouped into sessions; ending a session re-converges
//! the nickname index, validation state and block colors, records one undo
//! frame and notifies observers with the affected keys.
//!
//! ```no_run
//! use nickdb_primitives::{AddrKey, MemoryType};
//! use nickdb_store::{AddressStore, Field, MemoryDataSource, StoreConfig};
//!
//! # fn main() -> nickdb_store::Result<()> {
//! let mut store = AddressStore::open(MemoryDataSource::new(), StoreConfig::default())?;
//! let key = AddrKey::encode(MemoryType::DS, 1)?;
//! {
//! 	let mut session = store.edit("Rename DS1")?;
//! 	session.set_field(key, Field::Nickname, "TankLevel")?;
//! 	session.commit()?;
//! }
//! store.undo()?;
//! # Ok(())
//! # }
//! ```

use std::collections::BTreeSet;

use nickdb_primitives::AddrKey;

/// Block ranges and tag-pair lookup over ordered rows.
pub mod blocks;
/// TOML configuration.
pub mod config;
/// Interleaved-pair and block-partner comment rewrites.
pub mod dependency;
/// Error types.
pub mod error;
/// Undo/redo frames and stacks.
pub mod history;
/// Merging imported rows with per-field modes.
pub mod import;
/// Backing file change detection.
pub mod monitor;
/// Case-exact and case-insensitive nickname lookup.
pub mod nickname_index;
/// Change notification.
pub mod observer;
/// The per-address record.
pub mod record;
/// Fill down and clone structure.
pub mod rows;
/// Edit sessions.
pub mod session;
/// Lock-guarded shared handle.
pub mod shared;
/// The persistence boundary.
pub mod source;
mod store;

/// Ordered set of address keys, as reported to observers.
pub type KeySet = BTreeSet<AddrKey>;

pub use blocks::{BlockRange, BlockSpanError, compute_block_ranges, find_paired_tag_index};
pub use config::{ConfigError, StoreConfig};
pub use error::{Result, SourceError, StoreError};
pub use history::{FieldChange, History, UndoFrame, UndoPolicy};
pub use import::{ImportBlock, ImportError, MergeMode, MergeOptions};
pub use monitor::FileMonitor;
pub use nickname_index::NicknameIndex;
pub use observer::{Observer, ObserverId};
pub use record::{AddressRecord, Content, Field, FieldValue, Validation};
pub use rows::{RowEditError, RowOpError};
pub use session::{EditSession, SessionOptions, SessionOutcome};
pub use shared::SharedStore;
pub use source::{DataSource, MemoryDataSource};
pub use store::{AddressStore, BlockSpan};
