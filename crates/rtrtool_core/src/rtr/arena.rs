use std::fs::{self, File, OpenOptions};
use std::marker::PhantomData;
use std::mem::{align_of, size_of};
use std::path::{Path, PathBuf};

use bytemuck::Pod;
use log::debug;
use memmap2::{MmapMut, MmapOptions};

use crate::rtr::{ArrayRef, ConversionError, Ref, Result, RtrError, Storage};

/// Default address-space reservation for one conversion: 1 GiB.
pub const DEFAULT_CAPACITY: usize = 1 << 30;

/// Sequential bump allocator over a fixed, stably addressed mapping.
///
/// Every allocation is zeroed and aligned, and earlier positions never move,
/// so relative references computed from them stay valid while the arena grows.
pub struct ArenaWriter {
	map: MmapMut,
	used: usize,
	pending: Option<PendingFile>,
}

/// Temporary output file owned by a file-backed writer.
struct PendingFile {
	file: File,
	temp: PathBuf,
	output: PathBuf,
	finished: bool,
}

/// Typed position of one value inside the arena.
pub struct Slot<T> {
	pos: usize,
	_marker: PhantomData<T>,
}

/// Typed position of a contiguous run of values inside the arena.
pub struct ArraySlot<T> {
	pos: usize,
	len: usize,
	_marker: PhantomData<T>,
}

impl ArenaWriter {
	/// Reserve an anonymous mapping of `capacity` bytes.
	pub fn in_memory(capacity: usize) -> Result<Self> {
		let map = MmapMut::map_anon(capacity.max(1))?;
		debug!("reserved {capacity} bytes of anonymous arena");
		Ok(Self {
			map,
			used: 0,
			pending: None,
		})
	}

	/// Reserve a sparse file mapping next to `output`.
	///
	/// Bytes go to `<output>.partial`; only [`ArenaWriter::finish`] moves them
	/// onto `output`.
	pub fn create_file(output: impl AsRef<Path>, capacity: usize) -> Result<Self> {
		let output = output.as_ref().to_path_buf();
		let temp = partial_path(&output);
		let file = OpenOptions::new()
			.read(true)
			.write(true)
			.create(true)
			.truncate(true)
			.open(&temp)
			.map_err(|source| RtrError::Resource {
				path: temp.clone(),
				source,
			})?;
		let pending = PendingFile {
			file,
			temp,
			output,
			finished: false,
		};
		pending.file.set_len(capacity.max(1) as u64)?;

		// SAFETY: the temp file is created and truncated by this writer and is
		// not shared with other mappings.
		let map = unsafe { MmapOptions::new().len(capacity.max(1)).map_mut(&pending.file)? };
		debug!("reserved {capacity} bytes of file arena at {}", pending.temp.display());

		Ok(Self {
			map,
			used: 0,
			pending: Some(pending),
		})
	}

	/// Bytes handed out so far.
	pub fn used(&self) -> usize {
		self.used
	}

	/// Reserved upper bound.
	pub fn capacity(&self) -> usize {
		self.map.len()
	}

	/// Allocated prefix of the arena.
	pub fn bytes(&self) -> &[u8] {
		&self.map[..self.used]
	}

	/// Reserve `size` zeroed bytes aligned to `align` and return their position.
	pub fn allocate_bytes(&mut self, size: usize, align: usize) -> Result<usize> {
		let out_of_space = || ConversionError::OutOfSpace {
			requested: size,
			used: self.used,
			capacity: self.map.len(),
		};
		let start = self.used.checked_next_multiple_of(align.max(1)).ok_or_else(out_of_space)?;
		let end = start.checked_add(size).ok_or_else(out_of_space)?;
		if end > self.map.len() {
			return Err(out_of_space().into());
		}

		self.used = end;
		Ok(start)
	}

	/// Copy one value into the arena.
	pub fn alloc<T: Pod>(&mut self, value: &T) -> Result<Slot<T>> {
		let pos = self.allocate_bytes(size_of::<T>(), align_of::<T>())?;
		self.map[pos..pos + size_of::<T>()].copy_from_slice(bytemuck::bytes_of(value));
		Ok(Slot::at(pos))
	}

	/// Copy a slice into the arena.
	pub fn alloc_array<T: Pod>(&mut self, values: &[T]) -> Result<ArraySlot<T>> {
		let slot = self.alloc_zeroed_array::<T>(values.len())?;
		self.array_mut(slot).copy_from_slice(values);
		Ok(slot)
	}

	/// Reserve `len` zeroed values.
	pub fn alloc_zeroed_array<T: Pod>(&mut self, len: usize) -> Result<ArraySlot<T>> {
		let size = size_of::<T>().checked_mul(len).ok_or(ConversionError::OutOfSpace {
			requested: usize::MAX,
			used: self.used,
			capacity: self.map.len(),
		})?;
		let pos = self.allocate_bytes(size, align_of::<T>())?;
		Ok(ArraySlot {
			pos,
			len,
			_marker: PhantomData,
		})
	}

	/// Mutable view of a previously allocated value.
	pub fn get_mut<T: Pod>(&mut self, slot: Slot<T>) -> &mut T {
		bytemuck::from_bytes_mut(&mut self.map[slot.pos..slot.pos + size_of::<T>()])
	}

	/// Mutable view of a previously allocated array.
	pub fn array_mut<T: Pod>(&mut self, slot: ArraySlot<T>) -> &mut [T] {
		bytemuck::cast_slice_mut(&mut self.map[slot.pos..slot.pos + slot.len * size_of::<T>()])
	}

	/// Seal the arena.
	///
	/// The memory form becomes a read-only [`Storage`] of the used length. The
	/// file form is flushed, truncated to the used length, renamed onto its
	/// output path, and reopened read-only.
	pub fn finish(self) -> Result<Storage> {
		let Self { map, used, pending } = self;
		match pending {
			None => Ok(Storage::from_map(map.make_read_only()?, used)),
			Some(mut pending) => {
				map.flush()?;
				drop(map);
				pending.file.set_len(used as u64)?;
				pending.file.sync_all()?;
				fs::rename(&pending.temp, &pending.output)?;
				pending.finished = true;
				debug!("wrote {used} bytes to {}", pending.output.display());
				Storage::open_file(&pending.output)
			}
		}
	}
}

impl Drop for PendingFile {
	fn drop(&mut self) {
		if !self.finished {
			let _ = fs::remove_file(&self.temp);
		}
	}
}

/// Temporary sibling path used while a container is being written.
pub fn partial_path(output: &Path) -> PathBuf {
	let mut name = output.file_name().map(|name| name.to_os_string()).unwrap_or_default();
	name.push(".partial");
	output.with_file_name(name)
}

impl<T> Slot<T> {
	fn at(pos: usize) -> Self {
		Self {
			pos,
			_marker: PhantomData,
		}
	}

	/// Absolute arena position.
	pub fn pos(&self) -> usize {
		self.pos
	}

	/// Reference stored at `at` pointing to this slot.
	pub fn ref_from(&self, at: usize) -> Ref<T> {
		Ref::between(at, self.pos)
	}
}

impl<T> ArraySlot<T> {
	/// Absolute arena position of the first element.
	pub fn pos(&self) -> usize {
		self.pos
	}

	/// Element count.
	pub fn len(&self) -> usize {
		self.len
	}

	/// Whether the run is empty.
	pub fn is_empty(&self) -> bool {
		self.len == 0
	}

	/// Absolute position of element `index`.
	pub fn element_pos(&self, index: usize) -> usize {
		self.pos + index * size_of::<T>()
	}

	/// Typed slot for element `index`.
	pub fn element(&self, index: usize) -> Slot<T> {
		Slot::at(self.element_pos(index))
	}

	/// Array reference stored at `at` covering this run.
	pub fn array_ref_from(&self, at: usize) -> ArrayRef<T> {
		ArrayRef::between(at, self.pos, self.len)
	}
}

impl<T> Clone for Slot<T> {
	fn clone(&self) -> Self {
		*self
	}
}
impl<T> Copy for Slot<T> {}

impl<T> Clone for ArraySlot<T> {
	fn clone(&self) -> Self {
		*self
	}
}
impl<T> Copy for ArraySlot<T> {}

#[cfg(test)]
mod tests;
