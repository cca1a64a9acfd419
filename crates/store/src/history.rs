//! Undo/redo history of committed edit sessions.
//!
//! Each committed session becomes one [`UndoFrame`]: the list of fields it
//! changed with their old and new values. Undo re-applies the old values,
//! redo the new ones. Frames are absolute, so applying one never depends on
//! the overlay state it was recorded against.

use std::collections::VecDeque;

use nickdb_primitives::AddrKey;
use tracing::trace;

use crate::KeySet;
use crate::record::{Field, FieldValue};

/// Default bound on the undo stack.
pub const DEFAULT_MAX_UNDO_DEPTH: usize = 50;

/// Whether a session records an undo frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UndoPolicy {
	#[default]
	Record,
	NoUndo,
}

/// One field write with both of its endpoints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldChange {
	pub key: AddrKey,
	pub field: Field,
	pub old: FieldValue,
	pub new: FieldValue,
}

/// Everything one session changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UndoFrame {
	pub description: String,
	pub changes: Vec<FieldChange>,
}

impl UndoFrame {
	pub fn keys(&self) -> KeySet {
		self.changes.iter().map(|change| change.key).collect()
	}

	pub fn touches(&self, field: Field) -> bool {
		self.changes.iter().any(|change| change.field == field)
	}

	pub fn is_empty(&self) -> bool {
		self.changes.is_empty()
	}
}

/// Bounded undo stack plus redo stack.
#[derive(Debug)]
pub struct History {
	undo_stack: VecDeque<UndoFrame>,
	redo_stack: Vec<UndoFrame>,
	max_depth: usize,
}

impl Default for History {
	fn default() -> Self {
		Self::new(DEFAULT_MAX_UNDO_DEPTH)
	}
}

impl History {
	pub fn new(max_depth: usize) -> Self {
		Self {
			undo_stack: VecDeque::new(),
			redo_stack: Vec::new(),
			max_depth: max_depth.max(1),
		}
	}

	pub fn max_depth(&self) -> usize {
		self.max_depth
	}

	pub fn undo_len(&self) -> usize {
		self.undo_stack.len()
	}

	pub fn redo_len(&self) -> usize {
		self.redo_stack.len()
	}

	pub fn can_undo(&self) -> bool {
		!self.undo_stack.is_empty()
	}

	pub fn can_redo(&self) -> bool {
		!self.redo_stack.is_empty()
	}

	pub fn undo_description(&self) -> Option<&str> {
		self.undo_stack.back().map(|frame| frame.description.as_str())
	}

	pub fn redo_description(&self) -> Option<&str> {
		self.redo_stack.last().map(|frame| frame.description.as_str())
	}

	/// Records a newly committed frame. Drops the oldest frame past the depth
	/// bound and invalidates redo.
	pub fn push(&mut self, frame: UndoFrame) {
		trace!(
			description = %frame.description,
			changes = frame.changes.len(),
			undo_stack = self.undo_stack.len() + 1,
			"undo frame pushed"
		);
		self.undo_stack.push_back(frame);
		while self.undo_stack.len() > self.max_depth {
			self.undo_stack.pop_front();
			trace!(max_depth = self.max_depth, "oldest undo frame dropped");
		}
		if !self.redo_stack.is_empty() {
			trace!(cleared = self.redo_stack.len(), "redo stack cleared");
		}
		self.redo_stack.clear();
	}

	pub(crate) fn pop_undo(&mut self) -> Option<UndoFrame> {
		let frame = self.undo_stack.pop_back();
		trace!(
			undo_stack = self.undo_stack.len(),
			redo_stack = self.redo_stack.len(),
			popped = frame.is_some(),
			"undo: pop"
		);
		frame
	}

	pub(crate) fn pop_redo(&mut self) -> Option<UndoFrame> {
		let frame = self.redo_stack.pop();
		trace!(
			undo_stack = self.undo_stack.len(),
			redo_stack = self.redo_stack.len(),
			popped = frame.is_some(),
			"redo: pop"
		);
		frame
	}

	/// Moves an undone frame onto the redo stack.
	pub(crate) fn push_redo(&mut self, frame: UndoFrame) {
		self.redo_stack.push(frame);
		trace!(redo_stack = self.redo_stack.len(), "undo: pushed to redo stack");
	}

	/// Moves a redone frame back onto the undo stack without touching redo.
	pub(crate) fn push_undone(&mut self, frame: UndoFrame) {
		self.undo_stack.push_back(frame);
		while self.undo_stack.len() > self.max_depth {
			self.undo_stack.pop_front();
		}
		trace!(undo_stack = self.undo_stack.len(), "redo: pushed to undo stack");
	}

	pub fn clear(&mut self) {
		self.undo_stack.clear();
		self.redo_stack.clear();
	}
}
