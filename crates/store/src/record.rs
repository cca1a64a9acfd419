//! The per-address value type.
//!
//! One [`AddressRecord`] exists per visible skeleton slot. Records carry the
//! current editable [`Content`], the content captured at load or last save
//! (the shadow copy used for dirty tracking), read-only metadata from the
//! data source, and derived state computed by the store.
//!
//! Records expose no setters. Every edit goes through
//! [`AddressStore::set_field`](crate::AddressStore::set_field).

use std::fmt;

use nickdb_primitives::{
	AddrKey, DataType, MemoryType, NicknameError, ValueError, format_display,
};

/// An editable field of an address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
	Nickname,
	Comment,
	InitialValue,
	Retentive,
}

impl Field {
	pub const ALL: [Field; 4] = [
		Field::Nickname,
		Field::Comment,
		Field::InitialValue,
		Field::Retentive,
	];

	pub const fn as_str(self) -> &'static str {
		match self {
			Field::Nickname => "nickname",
			Field::Comment => "comment",
			Field::InitialValue => "initial_value",
			Field::Retentive => "retentive",
		}
	}

	/// Fields locked for system memory types.
	pub const fn is_value_field(self) -> bool {
		matches!(self, Field::InitialValue | Field::Retentive)
	}

	pub(crate) const fn expected(self) -> &'static str {
		match self {
			Field::Retentive => "boolean",
			_ => "text",
		}
	}
}

impl fmt::Display for Field {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// A field value: text for nickname, comment and initial value, a flag for
/// retentive.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldValue {
	Text(String),
	Bool(bool),
}

impl FieldValue {
	pub fn as_text(&self) -> Option<&str> {
		match self {
			FieldValue::Text(s) => Some(s),
			FieldValue::Bool(_) => None,
		}
	}

	pub fn as_bool(&self) -> Option<bool> {
		match self {
			FieldValue::Bool(b) => Some(*b),
			FieldValue::Text(_) => None,
		}
	}

	pub(crate) fn fits(&self, field: Field) -> bool {
		matches!(
			(field, self),
			(Field::Retentive, FieldValue::Bool(_))
				| (Field::Nickname | Field::Comment | Field::InitialValue, FieldValue::Text(_))
		)
	}
}

impl From<&str> for FieldValue {
	fn from(value: &str) -> Self {
		FieldValue::Text(value.to_string())
	}
}

impl From<String> for FieldValue {
	fn from(value: String) -> Self {
		FieldValue::Text(value)
	}
}

impl From<bool> for FieldValue {
	fn from(value: bool) -> Self {
		FieldValue::Bool(value)
	}
}

/// The four user-editable fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Content {
	pub nickname: String,
	pub comment: String,
	pub initial_value: String,
	pub retentive: bool,
}

impl Content {
	/// Reads one field.
	pub fn get(&self, field: Field) -> FieldValue {
		match field {
			Field::Nickname => FieldValue::Text(self.nickname.clone()),
			Field::Comment => FieldValue::Text(self.comment.clone()),
			Field::InitialValue => FieldValue::Text(self.initial_value.clone()),
			Field::Retentive => FieldValue::Bool(self.retentive),
		}
	}

	/// Writes one field. Returns `false` and leaves the content untouched if
	/// the value has the wrong type.
	pub(crate) fn set(&mut self, field: Field, value: FieldValue) -> bool {
		match (field, value) {
			(Field::Nickname, FieldValue::Text(s)) => self.nickname = s,
			(Field::Comment, FieldValue::Text(s)) => self.comment = s,
			(Field::InitialValue, FieldValue::Text(s)) => self.initial_value = s,
			(Field::Retentive, FieldValue::Bool(b)) => self.retentive = b,
			_ => return false,
		}
		true
	}

	fn field_eq(&self, other: &Content, field: Field) -> bool {
		match field {
			Field::Nickname => self.nickname == other.nickname,
			Field::Comment => self.comment == other.comment,
			Field::InitialValue => self.initial_value == other.initial_value,
			Field::Retentive => self.retentive == other.retentive,
		}
	}
}

/// Validation outcome stored on a record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Validation {
	pub nickname: Option<NicknameError>,
	pub initial_value: Option<ValueError>,
	pub comment: Option<ValueError>,
}

impl Validation {
	pub fn is_valid(&self) -> bool {
		self.nickname.is_none() && self.initial_value.is_none() && self.comment.is_none()
	}

	/// The message shown for an invalid record: the nickname error if there
	/// is one, else the initial value error, else the comment error.
	pub fn message(&self) -> String {
		if let Some(err) = &self.nickname {
			return err.to_string();
		}
		if let Some(err) = &self.initial_value {
			return err.to_string();
		}
		self.comment.as_ref().map(ToString::to_string).unwrap_or_default()
	}
}

/// One address slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressRecord {
	pub(crate) memory_type: MemoryType,
	pub(crate) address: u32,
	pub(crate) key: AddrKey,
	pub(crate) content: Content,
	pub(crate) original: Content,
	pub(crate) used: bool,
	pub(crate) data_type_code: u8,
	pub(crate) exists_in_mdb: bool,
	pub(crate) loaded_with_error: bool,
	pub(crate) validation: Validation,
	pub(crate) block_color: Option<String>,
}

impl AddressRecord {
	/// An empty slot with the memory type's defaults.
	pub fn new(key: AddrKey, memory_type: MemoryType, address: u32) -> Self {
		let content = Content {
			retentive: memory_type.default_retentive(),
			..Content::default()
		};
		Self {
			memory_type,
			address,
			key,
			original: content.clone(),
			content,
			used: false,
			data_type_code: memory_type.data_type().code(),
			exists_in_mdb: false,
			loaded_with_error: false,
			validation: Validation::default(),
			block_color: None,
		}
	}

	/// Empty slot for `key`. Fails if the key does not decode.
	pub fn skeleton(key: AddrKey) -> Result<Self, nickdb_primitives::KeyError> {
		let (memory_type, address) = key.decode()?;
		Ok(Self::new(key, memory_type, address))
	}

	/// Starts a clean record as a data source would load it: content and
	/// shadow copy agree, and the row exists in the backing store.
	pub fn loaded(memory_type: MemoryType, address: u32) -> Result<Self, nickdb_primitives::KeyError> {
		let key = AddrKey::encode(memory_type, address)?;
		let mut record = Self::new(key, memory_type, address);
		record.exists_in_mdb = true;
		Ok(record)
	}

	pub fn with_nickname(mut self, nickname: impl Into<String>) -> Self {
		self.content.nickname = nickname.into();
		self.original.nickname = self.content.nickname.clone();
		self
	}

	pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
		self.content.comment = comment.into();
		self.original.comment = self.content.comment.clone();
		self
	}

	pub fn with_initial_value(mut self, value: impl Into<String>) -> Self {
		self.content.initial_value = value.into();
		self.original.initial_value = self.content.initial_value.clone();
		self
	}

	pub fn with_retentive(mut self, retentive: bool) -> Self {
		self.content.retentive = retentive;
		self.original.retentive = retentive;
		self
	}

	pub fn with_used(mut self, used: bool) -> Self {
		self.used = used;
		self
	}

	pub fn with_data_type_code(mut self, code: u8) -> Self {
		self.data_type_code = code;
		self
	}

	/// Overrides the shadow copy, producing a record that is dirty relative
	/// to what the backing store last held.
	pub fn with_original(mut self, original: Content) -> Self {
		self.original = original;
		self
	}

	pub fn memory_type(&self) -> MemoryType {
		self.memory_type
	}

	pub fn address(&self) -> u32 {
		self.address
	}

	pub fn key(&self) -> AddrKey {
		self.key
	}

	pub fn display_address(&self) -> String {
		format_display(self.memory_type, self.address)
	}

	pub fn content(&self) -> &Content {
		&self.content
	}

	pub fn original(&self) -> &Content {
		&self.original
	}

	pub fn nickname(&self) -> &str {
		&self.content.nickname
	}

	pub fn comment(&self) -> &str {
		&self.content.comment
	}

	pub fn initial_value(&self) -> &str {
		&self.content.initial_value
	}

	pub fn retentive(&self) -> bool {
		self.content.retentive
	}

	pub fn used(&self) -> bool {
		self.used
	}

	pub fn exists_in_mdb(&self) -> bool {
		self.exists_in_mdb
	}

	pub fn loaded_with_error(&self) -> bool {
		self.loaded_with_error
	}

	/// Raw data type code as stored by the data source.
	pub fn data_type_code(&self) -> u8 {
		self.data_type_code
	}

	/// Decoded data type; `None` for codes outside the known set.
	pub fn data_type(&self) -> Option<DataType> {
		DataType::from_code(self.data_type_code)
	}

	pub fn validation(&self) -> &Validation {
		&self.validation
	}

	pub fn is_valid(&self) -> bool {
		self.validation.is_valid()
	}

	pub fn validation_error(&self) -> String {
		self.validation.message()
	}

	pub fn initial_value_valid(&self) -> bool {
		self.validation.initial_value.is_none()
	}

	pub fn initial_value_error(&self) -> Option<&ValueError> {
		self.validation.initial_value.as_ref()
	}

	/// Background color of the innermost colored block containing this row.
	pub fn block_color(&self) -> Option<&str> {
		self.block_color.as_deref()
	}

	/// Read one field of the current content.
	pub fn get(&self, field: Field) -> FieldValue {
		self.content.get(field)
	}

	pub fn is_field_dirty(&self, field: Field) -> bool {
		!self.content.field_eq(&self.original, field)
	}

	pub fn is_dirty(&self) -> bool {
		self.content != self.original
	}

	pub fn is_nickname_dirty(&self) -> bool {
		self.is_field_dirty(Field::Nickname)
	}

	pub fn is_empty(&self) -> bool {
		self.content.nickname.is_empty()
	}

	pub fn is_virtual(&self) -> bool {
		!self.exists_in_mdb
	}

	pub fn can_edit(&self, field: Field) -> bool {
		!field.is_value_field() || self.memory_type.is_value_editable()
	}

	pub fn is_default_retentive(&self) -> bool {
		self.content.retentive == self.memory_type.default_retentive()
	}

	/// Anything worth persisting besides the row's mere existence.
	pub fn has_content(&self) -> bool {
		!self.content.nickname.is_empty()
			|| !self.content.comment.is_empty()
			|| !self.content.initial_value.is_empty()
			|| !self.is_default_retentive()
	}

	/// Tolerated legacy error: loaded invalid and the nickname is untouched.
	pub fn should_ignore_validation_error(&self) -> bool {
		self.loaded_with_error && !self.is_nickname_dirty()
	}

	/// Invalid, named, and not a tolerated legacy error.
	pub fn has_reportable_error(&self) -> bool {
		!(self.is_valid() || self.is_empty() || self.should_ignore_validation_error())
	}

	pub fn needs_insert(&self) -> bool {
		self.is_dirty() && self.has_content() && self.is_virtual()
	}

	pub fn needs_update(&self) -> bool {
		self.is_dirty() && self.has_content() && !self.is_virtual()
	}

	/// Nickname cleared on a row that still holds other data: only the
	/// nickname column is cleared on save.
	pub fn needs_nickname_clear_only(&self) -> bool {
		let has_other_content = !self.content.comment.is_empty()
			|| self.used
			|| !self.content.initial_value.is_empty()
			|| !self.is_default_retentive();
		self.is_nickname_dirty()
			&& self.content.nickname.is_empty()
			&& !self.original.nickname.is_empty()
			&& has_other_content
	}

	/// The row is now completely empty and unused: delete it on save.
	pub fn needs_full_delete(&self) -> bool {
		self.is_dirty()
			&& self.content.nickname.is_empty()
			&& self.content.comment.is_empty()
			&& self.content.initial_value.is_empty()
			&& self.is_default_retentive()
			&& !self.used
			&& !self.is_virtual()
	}

	/// Shadow copy catches up with the content after a successful save.
	pub(crate) fn mark_saved(&mut self) {
		if self.is_nickname_dirty() {
			self.loaded_with_error = false;
		}
		self.original = self.content.clone();
		self.exists_in_mdb = true;
	}

	/// Back to skeleton defaults after a full delete, keeping derived color.
	pub(crate) fn reset_to_skeleton(&mut self) {
		let block_color = self.block_color.take();
		*self = Self::new(self.key, self.memory_type, self.address);
		self.block_color = block_color;
	}

	/// Adopts what the data source now reports as the shadow copy and
	/// metadata, leaving the content alone.
	pub(crate) fn rebase(&mut self, base: &AddressRecord) {
		self.original = base.content.clone();
		self.used = base.used;
		self.data_type_code = base.data_type_code;
		self.exists_in_mdb = base.exists_in_mdb;
		self.loaded_with_error = base.loaded_with_error;
	}

	/// Copies source-owned fields from `loaded` onto this slot.
	pub(crate) fn hydrate(&mut self, loaded: &AddressRecord) {
		self.content = loaded.content.clone();
		self.original = loaded.content.clone();
		self.used = loaded.used;
		self.data_type_code = loaded.data_type_code;
		self.exists_in_mdb = loaded.exists_in_mdb;
		self.loaded_with_error = loaded.loaded_with_error;
	}

	/// Source-owned state, ignoring derived fields.
	pub(crate) fn same_source_state(&self, other: &AddressRecord) -> bool {
		self.content == other.content
			&& self.original == other.original
			&& self.used == other.used
			&& self.data_type_code == other.data_type_code
			&& self.exists_in_mdb == other.exists_in_mdb
	}

	/// Moves derived state onto another copy of the same slot.
	pub(crate) fn transfer_derived(&self, target: &mut AddressRecord) {
		target.validation = self.validation.clone();
		target.block_color = self.block_color.clone();
	}
}
