use std::fs::File;
use std::mem::size_of;
use std::path::Path;

use memmap2::{Mmap, MmapMut};

use crate::rtr::{Result, RootRecord, RtrError, ValidationError};

/// Read-only, page-aligned bytes backing a container.
///
/// Either a read-only file mapping or a sealed anonymous mapping. The base
/// address is page aligned, so every in-container alignment holds in memory.
pub struct Storage {
	map: Mmap,
	len: usize,
}

impl Storage {
	/// Map a file read-only.
	pub fn open_file(path: impl AsRef<Path>) -> Result<Self> {
		let path = path.as_ref();
		let file = File::open(path).map_err(|source| RtrError::Resource {
			path: path.to_path_buf(),
			source,
		})?;
		let size = usize::try_from(file.metadata()?.len()).unwrap_or(usize::MAX);
		if size < size_of::<RootRecord>() {
			return Err(ValidationError::Truncated {
				size,
				need: size_of::<RootRecord>(),
			}
			.into());
		}

		// SAFETY: the mapping is read-only; concurrent truncation of the file by
		// another process is outside what this reader defends against.
		let map = unsafe { Mmap::map(&file)? };
		let len = map.len();
		Ok(Self { map, len })
	}

	/// Copy arbitrary bytes into an aligned anonymous mapping.
	pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
		let mut map = MmapMut::map_anon(bytes.len().max(1))?;
		map[..bytes.len()].copy_from_slice(bytes);
		Ok(Self {
			map: map.make_read_only()?,
			len: bytes.len(),
		})
	}

	pub(crate) fn from_map(map: Mmap, len: usize) -> Self {
		Self { map, len }
	}

	/// Backing bytes.
	pub fn bytes(&self) -> &[u8] {
		&self.map[..self.len]
	}

	/// Byte length.
	pub fn len(&self) -> usize {
		self.len
	}

	/// Whether the storage holds no bytes.
	pub fn is_empty(&self) -> bool {
		self.len == 0
	}
}

impl std::fmt::Debug for Storage {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Storage").field("len", &self.len).finish()
	}
}
