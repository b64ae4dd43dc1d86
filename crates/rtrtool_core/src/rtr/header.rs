use std::mem::{offset_of, size_of};

use bytemuck::{Pod, Zeroable};
use log::debug;

use crate::rtr::{ArenaWriter, ArrayRef, Ref, Result, RtrError, Slot};

/// Leading signature of every container.
pub const MAGIC: [u8; 8] = *b"RTRFILE\0";

/// Container format version written and accepted by this crate.
pub const VERSION: u32 = 1;

/// First record of every container, always at offset 0.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct RootRecord {
	/// Format signature, [`MAGIC`].
	pub magic: [u8; 8],
	/// Format version, [`VERSION`].
	pub version: u32,
	/// Always zero.
	pub reserved: u32,
	/// Total container size in bytes.
	pub declared_size: u64,
	/// Sub-header table, sorted by target address.
	pub sub_headers: ArrayRef<SubHeaderRef>,
}

/// One entry of the sub-header table.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct SubHeaderRef {
	/// Raw [`HeaderTag`] value.
	pub tag: u32,
	/// Record layout version for the tag.
	pub version: u32,
	/// Size of the sub-header record in bytes.
	pub size: u64,
	/// Untyped reference to the sub-header record.
	pub target: Ref<()>,
}

const _: () = assert!(size_of::<RootRecord>() == 40);
const _: () = assert!(size_of::<SubHeaderRef>() == 24);

/// Known sub-header kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum HeaderTag {
	/// Mesh table, [`crate::rtr::MeshHeader`].
	Mesh = 1,
	/// Material and texture tables, [`crate::rtr::MaterialHeader`].
	Material = 2,
	/// Node hierarchy and attachments, [`crate::rtr::SceneHeader`].
	Scene = 3,
}

impl HeaderTag {
	/// Decode a raw tag; `None` for tags this reader does not know.
	pub fn from_u32(raw: u32) -> Option<Self> {
		match raw {
			1 => Some(Self::Mesh),
			2 => Some(Self::Material),
			3 => Some(Self::Scene),
			_ => None,
		}
	}

	/// Stable lowercase label.
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Mesh => "mesh",
			Self::Material => "material",
			Self::Scene => "scene",
		}
	}
}

/// Label for a raw tag, `"unknown"` when not recognised.
pub fn tag_label(raw: u32) -> &'static str {
	HeaderTag::from_u32(raw).map_or("unknown", HeaderTag::as_str)
}

/// Record type discoverable through the sub-header table.
pub trait SubHeader: Pod {
	/// Tag identifying this record.
	const TAG: HeaderTag;
	/// Record layout version.
	const VERSION: u32 = 1;
}

/// Write side of the header registry.
///
/// Owns the root record slot and collects sub-header entries from builders.
/// Entries are sorted once, right before the table is written.
pub struct HeaderTable {
	root: Slot<RootRecord>,
	entries: Vec<PendingEntry>,
}

struct PendingEntry {
	tag: HeaderTag,
	version: u32,
	pos: usize,
	size: usize,
}

impl HeaderTable {
	/// Allocate the root record; must be the first allocation in `arena`.
	pub fn begin(arena: &mut ArenaWriter) -> Result<Self> {
		if arena.used() != 0 {
			return Err(RtrError::Usage {
				message: format!("root record must be the first allocation, arena already holds {} bytes", arena.used()),
			});
		}
		let root = arena.alloc(&RootRecord::zeroed())?;
		Ok(Self {
			root,
			entries: Vec::new(),
		})
	}

	/// Record a finished sub-header.
	pub fn register<T: SubHeader>(&mut self, slot: Slot<T>) {
		self.entries.push(PendingEntry {
			tag: T::TAG,
			version: T::VERSION,
			pos: slot.pos(),
			size: size_of::<T>(),
		});
	}

	/// Number of registered sub-headers.
	pub fn len(&self) -> usize {
		self.entries.len()
	}

	/// Whether no sub-header has been registered.
	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// Write the sorted table and fill in the root record.
	pub fn finalize(mut self, arena: &mut ArenaWriter) -> Result<()> {
		self.entries.sort_by_key(|entry| entry.pos);

		let table = arena.alloc_zeroed_array::<SubHeaderRef>(self.entries.len())?;
		for (index, entry) in self.entries.iter().enumerate() {
			let at = table.element_pos(index);
			*arena.get_mut(table.element(index)) = SubHeaderRef {
				tag: entry.tag as u32,
				version: entry.version,
				size: entry.size as u64,
				target: Ref::between(at + offset_of!(SubHeaderRef, target), entry.pos),
			};
			debug!("sub-header {} at {} ({} bytes)", entry.tag.as_str(), entry.pos, entry.size);
		}

		let declared_size = arena.used() as u64;
		*arena.get_mut(self.root) = RootRecord {
			magic: MAGIC,
			version: VERSION,
			reserved: 0,
			declared_size,
			sub_headers: table.array_ref_from(self.root.pos() + offset_of!(RootRecord, sub_headers)),
		};
		Ok(())
	}
}
