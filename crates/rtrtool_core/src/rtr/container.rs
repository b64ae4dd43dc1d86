use std::mem::size_of;
use std::path::Path;

use crate::rtr::relref::position_in;
use crate::rtr::{Result, RootRecord, Storage, SubHeader, SubHeaderRef, ValidationError, validate};

/// Validated, immutable `.rtr` container.
///
/// Every reference reachable from the root record was checked when the
/// container was opened, so lookups below never re-validate.
#[derive(Debug)]
pub struct Container {
	storage: Storage,
	declared_size: usize,
}

impl Container {
	/// Validate `storage` and take ownership of it.
	pub fn open(storage: Storage) -> std::result::Result<Self, ValidationError> {
		let declared_size = validate(storage.bytes())?;
		Ok(Self { storage, declared_size })
	}

	/// Map a file read-only and validate it.
	pub fn open_file(path: impl AsRef<Path>) -> Result<Self> {
		Ok(Self::open(Storage::open_file(path)?)?)
	}

	/// Copy `bytes` into aligned storage and validate them.
	pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
		Ok(Self::open(Storage::from_bytes(bytes)?)?)
	}

	/// Container bytes up to the declared size.
	pub fn bytes(&self) -> &[u8] {
		&self.storage.bytes()[..self.declared_size]
	}

	/// Declared size in bytes.
	pub fn len(&self) -> usize {
		self.declared_size
	}

	/// Always false; a valid container holds at least its root record.
	pub fn is_empty(&self) -> bool {
		self.declared_size == 0
	}

	/// Root record.
	pub fn root(&self) -> &RootRecord {
		bytemuck::from_bytes(&self.bytes()[..size_of::<RootRecord>()])
	}

	/// Sub-header table in address order.
	pub fn sub_headers(&self) -> &[SubHeaderRef] {
		self.root().sub_headers.resolve(self.bytes()).unwrap_or_default()
	}

	/// First sub-header of type `T` with a supported version, if any.
	///
	/// Scans only the sub-header table.
	pub fn find<T: SubHeader>(&self) -> Option<&T> {
		let bytes = self.bytes();
		self.sub_headers()
			.iter()
			.find(|entry| entry.tag == T::TAG as u32 && entry.version == T::VERSION)
			.and_then(|entry| entry.target.cast::<T>().resolve_at(position_in(&entry.target, bytes)?, bytes))
	}

	/// Release the backing storage.
	pub fn into_storage(self) -> Storage {
		self.storage
	}
}
