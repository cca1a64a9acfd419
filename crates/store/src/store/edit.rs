use nickdb_primitives::{AddrKey, TagKind, parse_block_tag};
use tracing::{debug, trace, warn};

use super::AddressStore;
use crate::KeySet;
use crate::blocks::find_paired_tag_index;
use crate::dependency::{follow_paired_tag, sync_block_tag};
use crate::error::{Result, StoreError};
use crate::history::{FieldChange, UndoFrame, UndoPolicy};
use crate::record::{AddressRecord, Field, FieldValue};
use crate::session::{EditSession, SessionOptions, SessionOutcome, SessionState};

impl AddressStore {
	/// Opens a recorded session with dependency sync.
	pub fn begin_session(&mut self, description: impl Into<String>) -> Result<()> {
		self.begin_session_with(description, SessionOptions::default())
	}

	pub fn begin_session_with(
		&mut self,
		description: impl Into<String>,
		options: SessionOptions,
	) -> Result<()> {
		self.ensure_idle()?;
		let description = description.into();
		trace!(description = %description, ?options, "session: begin");
		self.session = Some(SessionState::new(description, options));
		Ok(())
	}

	/// Opens a session bound to a guard that ends it on drop.
	pub fn edit(&mut self, description: impl Into<String>) -> Result<EditSession<'_>> {
		self.edit_with(description, SessionOptions::default())
	}

	pub fn edit_with(
		&mut self,
		description: impl Into<String>,
		options: SessionOptions,
	) -> Result<EditSession<'_>> {
		self.begin_session_with(description, options)?;
		Ok(EditSession::new(self))
	}

	pub fn is_session_active(&self) -> bool {
		self.session.is_some()
	}

	pub(super) fn ensure_idle(&self) -> Result<()> {
		match self.session {
			Some(_) => Err(StoreError::NestedSession),
			None => Ok(()),
		}
	}

	/// Writes one field into the overlay of the open session.
	///
	/// Nothing derived is updated until the session ends. Writing the value
	/// a field already holds is a no-op.
	pub fn set_field(&mut self, key: AddrKey, field: Field, value: impl Into<FieldValue>) -> Result<()> {
		self.write_field(key, field, value.into(), true)
	}

	fn write_field(&mut self, key: AddrKey, field: Field, value: FieldValue, explicit: bool) -> Result<()> {
		if self.session.is_none() {
			return Err(StoreError::NoActiveSession);
		}
		let record = self
			.layers
			.visible(key)
			.ok_or(StoreError::UnknownAddress(key))?;
		if !value.fits(field) {
			return Err(StoreError::FieldType {
				field,
				expected: field.expected(),
			});
		}
		if explicit && !record.can_edit(field) {
			return Err(StoreError::FieldNotEditable { key, field });
		}
		let old = record.get(field);
		if old == value {
			return Ok(());
		}

		let record = self
			.layers
			.override_mut(key)
			.ok_or(StoreError::UnknownAddress(key))?;
		record.content.set(field, value);
		if let Some(session) = self.session.as_mut() {
			session.record_write(key, field, old, explicit);
		}
		Ok(())
	}

	/// Ends the open session and runs the commit pipeline: dependency sync,
	/// close, nickname index, validation cascade, block colors, undo frame,
	/// notification.
	pub fn end_session(&mut self) -> Result<SessionOutcome> {
		let sync = match &self.session {
			Some(session) => session.options.sync_dependencies,
			None => return Err(StoreError::NoActiveSession),
		};
		if sync {
			self.sync_dependencies();
		}

		let Some(session) = self.session.take() else {
			return Err(StoreError::NoActiveSession);
		};
		trace!(
			description = %session.description,
			touched = session.touched.len(),
			"session: closed"
		);

		let changes: Vec<FieldChange> = session
			.originals
			.into_iter()
			.filter_map(|((key, field), old)| {
				let new = self.layers.visible(key)?.get(field);
				(new != old).then_some(FieldChange { key, field, old, new })
			})
			.collect();
		let affected = self.converge(&session.touched, &changes);

		if changes.is_empty() {
			trace!(description = %session.description, "session: no net change");
			return Ok(SessionOutcome::default());
		}

		let recorded = session.options.undo == UndoPolicy::Record;
		if recorded {
			self.history.push(UndoFrame {
				description: session.description,
				changes,
			});
		}
		self.notify(Some(&affected));
		Ok(SessionOutcome { affected, recorded })
	}

	/// Propagates explicit edits to rows that must follow them.
	///
	/// For every explicitly edited key, in key order: a changed retentive
	/// flag is copied to the interleaved partner; a changed block tag is
	/// followed by the other end of its block and mirrored onto interleaved
	/// partners. Rows the caller edited explicitly are never overwritten.
	fn sync_dependencies(&mut self) {
		let Some(session) = self.session.as_ref() else {
			return;
		};
		let explicit = session.explicit.clone();

		for &key in &explicit {
			let partner = self.interleaved_partner(key).filter(|p| !explicit.contains(p));

			if let Some(partner) = partner.filter(|_| self.session_changed(key, Field::Retentive)) {
				if let Some(retentive) = self.layers.visible(key).map(AddressRecord::retentive) {
					self.follow_write(partner, Field::Retentive, retentive.into());
				}
			}

			if !self.session_changed(key, Field::Comment) {
				continue;
			}
			let old_comment = self
				.session
				.as_ref()
				.and_then(|session| session.original(key, Field::Comment))
				.and_then(FieldValue::as_text)
				.map(str::to_owned)
				.unwrap_or_default();
			let new_comment = self
				.layers
				.visible(key)
				.map(|record| record.comment().to_owned())
				.unwrap_or_default();

			self.follow_block_partner(key, &old_comment, &new_comment, &explicit);
			if let Some(partner) = partner {
				self.mirror_tag(&new_comment, partner);
			}
		}
	}

	/// Whether `field` of `key` differs from its value when the session began.
	fn session_changed(&self, key: AddrKey, field: Field) -> bool {
		let Some(old) = self.session.as_ref().and_then(|session| session.original(key, field)) else {
			return false;
		};
		self.layers
			.visible(key)
			.is_some_and(|record| record.get(field) != *old)
	}

	fn interleaved_partner(&self, key: AddrKey) -> Option<AddrKey> {
		let record = self.layers.visible(key)?;
		let memory_type = record.memory_type().interleaved_partner()?;
		let partner = AddrKey::encode(memory_type, record.address()).ok()?;
		self.layers.base.contains_key(&partner).then_some(partner)
	}

	/// Renames or strips the other end of a block whose tag at `key` changed.
	fn follow_block_partner(&mut self, key: AddrKey, old_comment: &str, new_comment: &str, explicit: &KeySet) {
		let old_tag = parse_block_tag(old_comment);
		if !matches!(old_tag.kind, Some(TagKind::Open | TagKind::Close)) {
			return;
		}
		let new_tag = parse_block_tag(new_comment);
		let Some(idx) = self.row_index(key) else {
			return;
		};

		let (paired_key, rewritten) = {
			let rows: Vec<&AddressRecord> = self.rows().collect();
			let Some(paired) = find_paired_tag_index(&rows, idx, Some(&old_tag)).map(|i| rows[i]) else {
				return;
			};
			if explicit.contains(&paired.key()) {
				return;
			}
			let Some(rewritten) = follow_paired_tag(&old_tag, &new_tag, paired.comment()) else {
				return;
			};
			(paired.key(), rewritten)
		};

		trace!(%key, paired = %paired_key, "block partner follows tag edit");
		self.follow_write(paired_key, Field::Comment, FieldValue::Text(rewritten.clone()));
		if let Some(partner) = self.interleaved_partner(paired_key).filter(|p| !explicit.contains(p)) {
			self.mirror_tag(&rewritten, partner);
		}
	}

	fn mirror_tag(&mut self, source_comment: &str, target: AddrKey) {
		let Some(target_comment) = self.layers.visible(target).map(AddressRecord::comment) else {
			return;
		};
		if let Some(synced) = sync_block_tag(source_comment, target_comment) {
			self.follow_write(target, Field::Comment, synced.into());
		}
	}

	fn follow_write(&mut self, key: AddrKey, field: Field, value: FieldValue) {
		if let Err(error) = self.write_field(key, field, value, false) {
			warn!(%key, %field, %error, "dependent write skipped");
		}
	}

	/// Reverts the most recent committed session. Returns `false` if there
	/// is nothing to undo.
	pub fn undo(&mut self) -> Result<bool> {
		self.ensure_idle()?;
		let Some(frame) = self.history.pop_undo() else {
			return Ok(false);
		};
		let targets = frame
			.changes
			.iter()
			.rev()
			.map(|change| (change.key, change.field, change.old.clone()))
			.collect();
		let affected = self.apply_values(targets, frame.keys());
		trace!(description = %frame.description, affected = affected.len(), "undo: applied");
		self.history.push_redo(frame);
		self.notify(Some(&affected));
		Ok(true)
	}

	/// Re-applies the most recently undone session. Returns `false` if there
	/// is nothing to redo.
	pub fn redo(&mut self) -> Result<bool> {
		self.ensure_idle()?;
		let Some(frame) = self.history.pop_redo() else {
			return Ok(false);
		};
		let targets = frame
			.changes
			.iter()
			.map(|change| (change.key, change.field, change.new.clone()))
			.collect();
		let affected = self.apply_values(targets, frame.keys());
		trace!(description = %frame.description, affected = affected.len(), "redo: applied");
		self.history.push_undone(frame);
		self.notify(Some(&affected));
		Ok(true)
	}

	/// Writes absolute values outside any session and converges.
	fn apply_values(&mut self, targets: Vec<(AddrKey, Field, FieldValue)>, frame_keys: KeySet) -> KeySet {
		let mut touched = KeySet::new();
		let mut applied = Vec::new();
		for (key, field, value) in targets {
			let Some(current) = self.layers.visible(key).map(|record| record.get(field)) else {
				continue;
			};
			if current == value {
				continue;
			}
			let Some(record) = self.layers.override_mut(key) else {
				continue;
			};
			record.content.set(field, value.clone());
			touched.insert(key);
			applied.push(FieldChange {
				key,
				field,
				old: current,
				new: value,
			});
		}

		let mut affected = self.converge(&touched, &applied);
		affected.extend(frame_keys);
		affected
	}

	/// Reverts every pending edit to its saved value.
	///
	/// Runs as one session that skips dependency sync and leaves the undo
	/// history untouched.
	pub fn discard_all_changes(&mut self) -> Result<SessionOutcome> {
		self.ensure_idle()?;
		let mut reverts: Vec<(AddrKey, Field, FieldValue)> = self
			.layers
			.overrides
			.iter()
			.flat_map(|(&key, record)| {
				Field::ALL
					.into_iter()
					.filter(|&field| record.is_field_dirty(field))
					.map(move |field| (key, field, record.original().get(field)))
			})
			.collect();
		if reverts.is_empty() {
			return Ok(SessionOutcome::default());
		}
		reverts.sort_by_key(|&(key, field, _)| (key, field));
		let fields = reverts.len();

		self.begin_session_with(
			"Discard all changes",
			SessionOptions {
				undo: UndoPolicy::NoUndo,
				sync_dependencies: false,
			},
		)?;
		for (key, field, value) in reverts {
			self.follow_write(key, field, value);
		}
		let outcome = self.end_session()?;
		debug!(fields, rows = outcome.affected.len(), "pending changes discarded");
		Ok(outcome)
	}
}
