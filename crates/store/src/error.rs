//! Error types for the address store and its data-source boundary.

use std::path::PathBuf;

use nickdb_primitives::{AddrKey, KeyError};
use thiserror::Error;

use crate::record::Field;

/// Errors raised by a [`DataSource`](crate::DataSource) implementation.
#[derive(Debug, Error)]
pub enum SourceError {
	/// Reading or writing the backing file failed.
	#[error("I/O error on {path}: {error}")]
	Io {
		/// Path of the backing file.
		path: PathBuf,
		/// The underlying I/O error.
		error: std::io::Error,
	},

	/// The source refuses writes.
	#[error("data source is read-only")]
	ReadOnly,

	/// Another process holds the backing file. Transient.
	#[error("data source is locked by another process")]
	Locked,

	/// Backend-specific failure.
	#[error("data source error: {0}")]
	Backend(String),
}

impl SourceError {
	/// Returns `true` for failures that a later retry may not hit.
	pub fn is_transient(&self) -> bool {
		matches!(self, SourceError::Locked | SourceError::Io { .. })
	}
}

/// Errors raised by [`AddressStore`](crate::AddressStore) operations.
///
/// These are contract violations or persistence failures. Bad user data
/// never shows up here; it is stored on the affected record instead.
#[derive(Debug, Error)]
pub enum StoreError {
	/// An edit session is already open.
	#[error("an edit session is already active; sessions cannot nest")]
	NestedSession,

	/// A field write was attempted outside an edit session.
	#[error("no edit session is active")]
	NoActiveSession,

	/// The key is not part of the address skeleton.
	#[error("unknown address {0}")]
	UnknownAddress(AddrKey),

	/// The value's type does not match the field.
	#[error("field {field} expects a {expected} value")]
	FieldType {
		field: Field,
		expected: &'static str,
	},

	/// The field is fixed for this memory type.
	#[error("field {field} of {key} cannot be edited")]
	FieldNotEditable { key: AddrKey, field: Field },

	#[error(transparent)]
	Key(#[from] KeyError),

	#[error(transparent)]
	Source(#[from] SourceError),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
