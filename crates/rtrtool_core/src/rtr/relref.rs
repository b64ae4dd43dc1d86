use std::fmt;
use std::marker::PhantomData;
use std::mem::size_of;

use bytemuck::{Pod, Zeroable};

/// Self-relative reference to one `T`.
///
/// Stores the signed byte distance from the reference's own position to its
/// target. The encoding is base independent: the same bytes resolve correctly
/// wherever the container is mapped.
#[repr(C)]
pub struct Ref<T> {
	offset: i64,
	_marker: PhantomData<T>,
}

/// Self-relative reference to a contiguous run of `T`.
#[repr(C)]
pub struct ArrayRef<T> {
	offset: i64,
	len: u64,
	_marker: PhantomData<T>,
}

/// `u32` table index where `u32::MAX` means "none".
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, Hash, Pod, Zeroable)]
pub struct OptionalIndex(u32);

impl<T> Ref<T> {
	/// Null reference; only meaningful where self-reference is impossible.
	pub const NULL: Self = Self {
		offset: 0,
		_marker: PhantomData,
	};

	/// Build a reference stored at `at` that points at `target`.
	pub fn between(at: usize, target: usize) -> Self {
		Self {
			offset: target as i64 - at as i64,
			_marker: PhantomData,
		}
	}

	/// Raw stored offset.
	pub fn offset(&self) -> i64 {
		self.offset
	}

	/// Whether the stored offset is zero.
	pub fn is_null(&self) -> bool {
		self.offset == 0
	}

	/// Absolute target position for a reference stored at `at`.
	pub fn target(&self, at: usize) -> Option<usize> {
		at.checked_add_signed(isize::try_from(self.offset).ok()?)
	}

	/// Reinterpret the target type, keeping the offset.
	pub fn cast<U>(self) -> Ref<U> {
		Ref {
			offset: self.offset,
			_marker: PhantomData,
		}
	}
}

impl<T: Pod> Ref<T> {
	/// Resolve against the base bytes this reference lives in.
	///
	/// Returns `None` when `self` is not inside `base` or the target range is
	/// out of bounds or misaligned.
	pub fn resolve<'a>(&self, base: &'a [u8]) -> Option<&'a T> {
		self.resolve_at(position_in(self, base)?, base)
	}

	/// Resolve as if this reference were stored at `at` within `base`.
	pub fn resolve_at<'a>(&self, at: usize, base: &'a [u8]) -> Option<&'a T> {
		let start = self.target(at)?;
		let end = start.checked_add(size_of::<T>())?;
		bytemuck::try_from_bytes(base.get(start..end)?).ok()
	}
}

impl<T> ArrayRef<T> {
	/// Empty array; stores a zero offset.
	pub const EMPTY: Self = Self {
		offset: 0,
		len: 0,
		_marker: PhantomData,
	};

	/// Build an array reference stored at `at` covering `len` items at `target`.
	pub fn between(at: usize, target: usize, len: usize) -> Self {
		if len == 0 {
			return Self::EMPTY;
		}
		Self {
			offset: target as i64 - at as i64,
			len: len as u64,
			_marker: PhantomData,
		}
	}

	/// Raw stored offset.
	pub fn offset(&self) -> i64 {
		self.offset
	}

	/// Element count.
	pub fn len(&self) -> usize {
		usize::try_from(self.len).unwrap_or(usize::MAX)
	}

	/// Whether the array has no elements.
	pub fn is_empty(&self) -> bool {
		self.len == 0
	}

	/// Total byte length, if it fits.
	pub fn byte_len(&self) -> Option<u64> {
		self.len.checked_mul(size_of::<T>() as u64)
	}

	/// Absolute position of the first element for a reference stored at `at`.
	pub fn target(&self, at: usize) -> Option<usize> {
		at.checked_add_signed(isize::try_from(self.offset).ok()?)
	}
}

impl<T: Pod> ArrayRef<T> {
	/// Resolve against the base bytes this reference lives in.
	pub fn resolve<'a>(&self, base: &'a [u8]) -> Option<&'a [T]> {
		if self.len == 0 {
			return Some(&[]);
		}
		let at = position_in(self, base)?;
		let start = self.target(at)?;
		let end = start.checked_add(usize::try_from(self.byte_len()?).ok()?)?;
		bytemuck::try_cast_slice(base.get(start..end)?).ok()
	}
}

impl ArrayRef<u8> {
	/// Resolve a stored UTF-8 string.
	pub fn resolve_str<'a>(&self, base: &'a [u8]) -> Option<&'a str> {
		std::str::from_utf8(self.resolve(base)?).ok()
	}
}

impl OptionalIndex {
	/// Absent index.
	pub const NONE: Self = Self(u32::MAX);

	/// Present index.
	pub fn some(index: u32) -> Self {
		Self(index)
	}

	/// Decoded value.
	pub fn get(self) -> Option<u32> {
		(self.0 != u32::MAX).then_some(self.0)
	}
}

impl Default for OptionalIndex {
	fn default() -> Self {
		Self::NONE
	}
}

impl From<Option<u32>> for OptionalIndex {
	fn from(value: Option<u32>) -> Self {
		value.map_or(Self::NONE, Self::some)
	}
}

impl fmt::Debug for OptionalIndex {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self.get() {
			Some(index) => write!(f, "Some({index})"),
			None => f.write_str("None"),
		}
	}
}

/// Position of `item` within `base`, if it lies entirely inside it.
pub(crate) fn position_in<S>(item: &S, base: &[u8]) -> Option<usize> {
	let addr = item as *const S as usize;
	let at = addr.checked_sub(base.as_ptr() as usize)?;
	(at.checked_add(size_of::<S>())? <= base.len()).then_some(at)
}

// Derives would bound `T`; only the marker mentions it.
impl<T> Clone for Ref<T> {
	fn clone(&self) -> Self {
		*self
	}
}
impl<T> Copy for Ref<T> {}
impl<T> PartialEq for Ref<T> {
	fn eq(&self, other: &Self) -> bool {
		self.offset == other.offset
	}
}
impl<T> Eq for Ref<T> {}
impl<T> fmt::Debug for Ref<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "Ref({:+})", self.offset)
	}
}
// SAFETY: `repr(C)` with one `i64` and a zero-sized marker; no padding and
// every bit pattern is a valid offset.
unsafe impl<T: 'static> Zeroable for Ref<T> {}
unsafe impl<T: 'static> Pod for Ref<T> {}

impl<T> Clone for ArrayRef<T> {
	fn clone(&self) -> Self {
		*self
	}
}
impl<T> Copy for ArrayRef<T> {}
impl<T> PartialEq for ArrayRef<T> {
	fn eq(&self, other: &Self) -> bool {
		self.offset == other.offset && self.len == other.len
	}
}
impl<T> Eq for ArrayRef<T> {}
impl<T> fmt::Debug for ArrayRef<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "ArrayRef({:+}, len={})", self.offset, self.len)
	}
}
// SAFETY: `repr(C)` with `i64` + `u64` and a zero-sized marker; no padding.
unsafe impl<T: 'static> Zeroable for ArrayRef<T> {}
unsafe impl<T: 'static> Pod for ArrayRef<T> {}

#[cfg(test)]
mod tests;
