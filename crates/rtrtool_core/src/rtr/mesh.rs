use std::mem::{offset_of, size_of};

use bytemuck::{Pod, Zeroable};
use log::debug;

use crate::rtr::{ArenaWriter, ArrayRef, ConversionError, HeaderTag, Slot, SubHeader, compute_normals, compute_tangents};

/// Sub-header listing every mesh in the container.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct MeshHeader {
	/// Mesh table.
	pub meshes: ArrayRef<Mesh>,
}

impl SubHeader for MeshHeader {
	const TAG: HeaderTag = HeaderTag::Mesh;
}

/// One indexed triangle mesh; every vertex attribute has one entry per position.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct Mesh {
	/// Triangle vertex index triples.
	pub triangles: ArrayRef<[u32; 3]>,
	/// Vertex positions.
	pub positions: ArrayRef<[f32; 3]>,
	/// Unit vertex normals.
	pub normals: ArrayRef<[f32; 3]>,
	/// First texture coordinate set.
	pub tex_coords0: ArrayRef<[f32; 2]>,
	/// Unit tangents, handedness in `w`.
	pub tangents: ArrayRef<[f32; 4]>,
	/// UTF-8 name.
	pub name: ArrayRef<u8>,
}

const _: () = assert!(size_of::<Mesh>() == 96);

/// Source arrays for one mesh as supplied by an importer.
#[derive(Debug, Clone, Default)]
pub struct MeshSource {
	/// Display name.
	pub name: String,
	/// Vertex positions; required.
	pub positions: Option<Vec<[f32; 3]>>,
	/// Flat triangle list indices; required.
	pub indices: Option<Vec<u32>>,
	/// Vertex normals; computed when absent.
	pub normals: Option<Vec<[f32; 3]>>,
	/// First texture coordinate set; required.
	pub tex_coords0: Option<Vec<[f32; 2]>>,
	/// Vertex tangents; computed when absent.
	pub tangents: Option<Vec<[f32; 4]>>,
}

/// Mesh that passed the attribute policy, with every attribute present.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedMesh {
	/// Display name.
	pub name: String,
	/// Triangle vertex index triples.
	pub triangles: Vec<[u32; 3]>,
	/// Vertex positions.
	pub positions: Vec<[f32; 3]>,
	/// Vertex normals.
	pub normals: Vec<[f32; 3]>,
	/// First texture coordinate set.
	pub tex_coords0: Vec<[f32; 2]>,
	/// Vertex tangents.
	pub tangents: Vec<[f32; 4]>,
}

/// Apply the required-attribute policy to one source mesh.
///
/// Positions, indices, and UV0 must be present. Missing normals and tangents
/// are generated. Runs before anything is written to the arena.
pub fn prepare_mesh(source: &MeshSource) -> std::result::Result<PreparedMesh, ConversionError> {
	let missing = |attribute| ConversionError::MissingAttribute {
		mesh: source.name.clone(),
		attribute,
	};
	let invalid = |reason: String| ConversionError::InvalidMesh {
		mesh: source.name.clone(),
		reason,
	};

	let positions = source.positions.as_ref().ok_or_else(|| missing("POSITION"))?;
	let indices = source.indices.as_ref().ok_or_else(|| missing("indices"))?;
	let tex_coords0 = source.tex_coords0.as_ref().ok_or_else(|| missing("TEXCOORD_0"))?;

	if indices.len() % 3 != 0 {
		return Err(invalid(format!("index count {} is not a multiple of 3", indices.len())));
	}
	if let Some(bad) = indices.iter().find(|&&index| index as usize >= positions.len()) {
		return Err(invalid(format!("index {bad} out of range for {} vertices", positions.len())));
	}
	check_len("TEXCOORD_0", tex_coords0.len(), positions.len()).map_err(invalid)?;

	let normals = match &source.normals {
		Some(normals) => {
			check_len("NORMAL", normals.len(), positions.len()).map_err(invalid)?;
			normals.clone()
		}
		None => {
			debug!("mesh {:?}: generating normals", source.name);
			compute_normals(positions, indices)
		}
	};
	let tangents = match &source.tangents {
		Some(tangents) => {
			check_len("TANGENT", tangents.len(), positions.len()).map_err(invalid)?;
			tangents.clone()
		}
		None => {
			debug!("mesh {:?}: generating tangents", source.name);
			compute_tangents(positions, &normals, tex_coords0, indices)
		}
	};

	Ok(PreparedMesh {
		name: source.name.clone(),
		triangles: indices.chunks_exact(3).map(|tri| [tri[0], tri[1], tri[2]]).collect(),
		positions: positions.clone(),
		normals,
		tex_coords0: tex_coords0.clone(),
		tangents,
	})
}

fn check_len(attribute: &str, len: usize, expected: usize) -> std::result::Result<(), String> {
	if len == expected {
		Ok(())
	} else {
		Err(format!("{attribute} has {len} entries, expected {expected}"))
	}
}

/// Lay out prepared meshes as one mesh sub-header.
pub fn write_meshes(arena: &mut ArenaWriter, meshes: &[PreparedMesh]) -> crate::rtr::Result<Slot<MeshHeader>> {
	let header = arena.alloc(&MeshHeader::zeroed())?;
	let table = arena.alloc_zeroed_array::<Mesh>(meshes.len())?;
	arena.get_mut(header).meshes = table.array_ref_from(header.pos() + offset_of!(MeshHeader, meshes));

	for (index, mesh) in meshes.iter().enumerate() {
		let at = table.element_pos(index);
		let triangles = arena.alloc_array(&mesh.triangles)?;
		let positions = arena.alloc_array(&mesh.positions)?;
		let normals = arena.alloc_array(&mesh.normals)?;
		let tex_coords0 = arena.alloc_array(&mesh.tex_coords0)?;
		let tangents = arena.alloc_array(&mesh.tangents)?;
		let name = arena.alloc_array(mesh.name.as_bytes())?;

		*arena.get_mut(table.element(index)) = Mesh {
			triangles: triangles.array_ref_from(at + offset_of!(Mesh, triangles)),
			positions: positions.array_ref_from(at + offset_of!(Mesh, positions)),
			normals: normals.array_ref_from(at + offset_of!(Mesh, normals)),
			tex_coords0: tex_coords0.array_ref_from(at + offset_of!(Mesh, tex_coords0)),
			tangents: tangents.array_ref_from(at + offset_of!(Mesh, tangents)),
			name: name.array_ref_from(at + offset_of!(Mesh, name)),
		};
	}

	debug!("wrote {} mesh(es)", meshes.len());
	Ok(header)
}

impl MeshHeader {
	/// Mesh records.
	pub fn meshes<'a>(&'a self, base: &'a [u8]) -> &'a [Mesh] {
		self.meshes.resolve(base).unwrap_or_default()
	}

	/// Mesh `index` as a borrowed view.
	pub fn mesh<'a>(&'a self, base: &'a [u8], index: usize) -> Option<MeshView<'a>> {
		self.meshes(base).get(index).map(|mesh| MeshView { mesh, base })
	}

	/// Every mesh as a borrowed view.
	pub fn iter<'a>(&'a self, base: &'a [u8]) -> impl ExactSizeIterator<Item = MeshView<'a>> + 'a {
		self.meshes(base).iter().map(move |mesh| MeshView { mesh, base })
	}
}

/// Borrowed view of one mesh inside a validated container.
#[derive(Clone, Copy)]
pub struct MeshView<'a> {
	mesh: &'a Mesh,
	base: &'a [u8],
}

impl<'a> MeshView<'a> {
	/// Name; empty when not valid UTF-8.
	pub fn name(&self) -> &'a str {
		self.mesh.name.resolve_str(self.base).unwrap_or_default()
	}

	/// Triangle index triples.
	pub fn triangles(&self) -> &'a [[u32; 3]] {
		self.mesh.triangles.resolve(self.base).unwrap_or_default()
	}

	/// Vertex positions.
	pub fn positions(&self) -> &'a [[f32; 3]] {
		self.mesh.positions.resolve(self.base).unwrap_or_default()
	}

	/// Vertex normals.
	pub fn normals(&self) -> &'a [[f32; 3]] {
		self.mesh.normals.resolve(self.base).unwrap_or_default()
	}

	/// First texture coordinate set.
	pub fn tex_coords0(&self) -> &'a [[f32; 2]] {
		self.mesh.tex_coords0.resolve(self.base).unwrap_or_default()
	}

	/// Vertex tangents.
	pub fn tangents(&self) -> &'a [[f32; 4]] {
		self.mesh.tangents.resolve(self.base).unwrap_or_default()
	}
}

#[cfg(test)]
mod tests;
