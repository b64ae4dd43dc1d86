use std::mem::{align_of, size_of};

use bytemuck::Pod;
use log::{debug, warn};

use crate::rtr::relref::position_in;
use crate::rtr::{ArrayRef, HeaderTag, MAGIC, MaterialHeader, MeshHeader, Ref, RootRecord, SceneHeader, SubHeader, SubHeaderRef, VERSION, ValidationError};

type VResult<T> = std::result::Result<T, ValidationError>;

/// Check every structural rule reachable from the root record.
///
/// Returns the declared container size on success. Nothing is trusted before
/// it has been bounds and alignment checked.
pub fn validate(bytes: &[u8]) -> VResult<usize> {
	let need = size_of::<RootRecord>();
	if bytes.len() < need {
		return Err(ValidationError::Truncated { size: bytes.len(), need });
	}

	let mut got = [0_u8; 8];
	got.copy_from_slice(&bytes[..8]);
	if got != MAGIC {
		return Err(ValidationError::BadSignature { expected: MAGIC, got });
	}

	let root: &RootRecord = bytemuck::try_from_bytes(&bytes[..need]).map_err(|_| ValidationError::Misaligned {
		what: "root record",
		target: bytes.as_ptr() as usize % align_of::<RootRecord>(),
		align: align_of::<RootRecord>(),
	})?;
	if root.version != VERSION {
		return Err(ValidationError::UnsupportedVersion {
			version: root.version,
			expected: VERSION,
		});
	}
	let declared = usize::try_from(root.declared_size).unwrap_or(usize::MAX);
	if declared > bytes.len() {
		return Err(ValidationError::DeclaredSizeMismatch {
			declared: root.declared_size,
			size: bytes.len(),
		});
	}
	if declared < need {
		return Err(ValidationError::Truncated { size: declared, need });
	}

	let checker = Checker { base: &bytes[..declared] };
	checker.container()?;
	debug!("validated container of {declared} bytes");
	Ok(declared)
}

struct Checker<'a> {
	base: &'a [u8],
}

#[derive(Default)]
struct Found<'a> {
	meshes: Option<usize>,
	materials: Option<usize>,
	scenes: Vec<&'a SceneHeader>,
}

impl<'a> Checker<'a> {
	fn container(&self) -> VResult<()> {
		let root: &'a RootRecord = bytemuck::from_bytes(&self.base[..size_of::<RootRecord>()]);
		let table = self.array("sub-header table", &root.sub_headers)?;

		let mut found = Found::default();
		let mut prev_end = size_of::<RootRecord>();
		for (index, entry) in table.iter().enumerate() {
			let (start, end) = self.region(entry)?;
			if start < prev_end {
				return Err(ValidationError::OverlappingSubHeaders { index, start, prev_end });
			}
			prev_end = end;

			let Some(tag) = HeaderTag::from_u32(entry.tag) else {
				warn!("skipping sub-header {index} with unknown tag {}", entry.tag);
				continue;
			};
			match tag {
				HeaderTag::Mesh => {
					if let Some(header) = self.sub_header::<MeshHeader>(entry, start)? {
						let count = self.mesh_header(header)?;
						found.meshes = found.meshes.or(Some(count));
					}
				}
				HeaderTag::Material => {
					if let Some(header) = self.sub_header::<MaterialHeader>(entry, start)? {
						let count = self.material_header(header)?;
						found.materials = found.materials.or(Some(count));
					}
				}
				HeaderTag::Scene => {
					if let Some(header) = self.sub_header::<SceneHeader>(entry, start)? {
						self.scene_header(header)?;
						found.scenes.push(header);
					}
				}
			}
		}

		for scene in found.scenes {
			self.instance_targets(scene, found.meshes, found.materials)?;
		}
		Ok(())
	}

	fn region(&self, entry: &'a SubHeaderRef) -> VResult<(usize, usize)> {
		let at = position_in(&entry.target, self.base).ok_or(self.out_of_bounds("sub-header", 0, entry.target.offset(), entry.size))?;
		let out = || self.out_of_bounds("sub-header", at, entry.target.offset(), entry.size);
		let start = entry.target.target(at).ok_or_else(out)?;
		let end = usize::try_from(entry.size).ok().and_then(|size| start.checked_add(size)).ok_or_else(out)?;
		if end > self.base.len() {
			return Err(out());
		}
		Ok((start, end))
	}

	fn sub_header<T: SubHeader>(&self, entry: &SubHeaderRef, start: usize) -> VResult<Option<&'a T>> {
		if entry.version != T::VERSION {
			warn!("skipping {} sub-header with unsupported version {}", T::TAG.as_str(), entry.version);
			return Ok(None);
		}
		let need = size_of::<T>();
		if (entry.size as usize) < need {
			return Err(ValidationError::SubHeaderTooSmall {
				tag: T::TAG.as_str(),
				size: entry.size,
				need,
			});
		}
		if start % align_of::<T>() != 0 {
			return Err(ValidationError::Misaligned {
				what: T::TAG.as_str(),
				target: start,
				align: align_of::<T>(),
			});
		}
		Ok(Some(bytemuck::from_bytes(&self.base[start..start + need])))
	}

	fn mesh_header(&self, header: &'a MeshHeader) -> VResult<usize> {
		let meshes = self.array("meshes", &header.meshes)?;
		for mesh in meshes {
			let triangles = self.array("mesh triangles", &mesh.triangles)?;
			let positions = self.array("mesh positions", &mesh.positions)?;
			let normals = self.array("mesh normals", &mesh.normals)?;
			let tex_coords0 = self.array("mesh tex_coords0", &mesh.tex_coords0)?;
			let tangents = self.array("mesh tangents", &mesh.tangents)?;
			self.array("mesh name", &mesh.name)?;

			let expected = positions.len() as u64;
			for (what, len) in [("mesh normals", normals.len()), ("mesh tex_coords0", tex_coords0.len()), ("mesh tangents", tangents.len())] {
				if len as u64 != expected {
					return Err(ValidationError::LengthMismatch {
						what,
						len: len as u64,
						expected,
					});
				}
			}
			for (at, tri) in triangles.iter().enumerate() {
				for &index in tri {
					check_index("mesh triangle", at, index, positions.len())?;
				}
			}
		}
		Ok(meshes.len())
	}

	fn material_header(&self, header: &'a MaterialHeader) -> VResult<usize> {
		let materials = self.array("materials", &header.materials)?;
		let textures = self.array("textures", &header.textures)?;
		for texture in textures {
			self.array("texture blob", &texture.blob)?;
		}
		for (at, material) in materials.iter().enumerate() {
			for (_, index) in material.textures.slots() {
				if let Some(index) = index.get() {
					check_index("material texture", at, index, textures.len())?;
				}
			}
		}
		Ok(materials.len())
	}

	fn scene_header(&self, header: &'a SceneHeader) -> VResult<()> {
		let nodes = self.array("nodes", &header.nodes)?;
		// (slot, last slot) of each subtree enclosing the current node, innermost last.
		let mut enclosing: Vec<(usize, usize)> = Vec::new();
		for (slot, node) in nodes.iter().enumerate() {
			let parent_offset = node.parent_offset as usize;
			if parent_offset > slot {
				return Err(ValidationError::BadParentOffset {
					node: slot,
					parent_offset: node.parent_offset,
				});
			}
			let end = slot.saturating_add(node.descendant_count as usize);
			let bad_count = || ValidationError::BadDescendantCount {
				node: slot,
				descendant_count: node.descendant_count,
				len: nodes.len(),
			};
			if end >= nodes.len() {
				return Err(bad_count());
			}
			if parent_offset != 0 {
				let parent = slot - parent_offset;
				if end > parent + nodes[parent].descendant_count as usize {
					return Err(bad_count());
				}
			}

			while enclosing.last().is_some_and(|&(_, last)| last < slot) {
				enclosing.pop();
			}
			let expected = enclosing.last().map_or(0, |&(parent, _)| slot - parent);
			if parent_offset != expected {
				return Err(ValidationError::MisplacedNode {
					node: slot,
					parent_offset: node.parent_offset,
				});
			}
			enclosing.push((slot, end));
		}

		let scenes = self.array("scenes", &header.scenes)?;
		for (scene, root) in scenes.iter().enumerate() {
			self.single("scene root", root)?;
			match header.scene_root(self.base, scene) {
				Some(slot) if nodes.get(slot).is_some_and(|node| node.is_root()) => {}
				_ => return Err(ValidationError::BadSceneRoot { scene }),
			}
		}

		let node_count = nodes.len();
		for (at, instance) in self.array("instances", &header.instances)?.iter().enumerate() {
			check_index("instance node", at, instance.node, node_count)?;
		}
		let cameras = self.array("cameras", &header.cameras)?;
		for (at, camera) in cameras.iter().enumerate() {
			check_index("camera node", at, camera.node, node_count)?;
		}
		let names = self.array("camera names", &header.camera_names)?;
		if names.len() != cameras.len() {
			return Err(ValidationError::LengthMismatch {
				what: "camera names",
				len: names.len() as u64,
				expected: cameras.len() as u64,
			});
		}
		for name in names {
			self.array("camera name", name)?;
		}
		for (at, light) in self.array("directional lights", &header.directional_lights)?.iter().enumerate() {
			check_index("directional light node", at, light.node, node_count)?;
		}
		for (at, light) in self.array("point lights", &header.point_lights)?.iter().enumerate() {
			check_index("point light node", at, light.node, node_count)?;
		}
		for (at, light) in self.array("spot lights", &header.spot_lights)?.iter().enumerate() {
			check_index("spot light node", at, light.node, node_count)?;
		}
		Ok(())
	}

	fn instance_targets(&self, header: &'a SceneHeader, meshes: Option<usize>, materials: Option<usize>) -> VResult<()> {
		for (at, instance) in header.instances(self.base).iter().enumerate() {
			if let Some(len) = meshes {
				check_index("instance mesh", at, instance.mesh, len)?;
			}
			if let Some(len) = materials {
				check_index("instance material", at, instance.material, len)?;
			}
		}
		Ok(())
	}

	fn array<T: Pod>(&self, what: &'static str, array: &'a ArrayRef<T>) -> VResult<&'a [T]> {
		if array.is_empty() {
			return Ok(&[]);
		}
		let len = array.byte_len().unwrap_or(u64::MAX);
		let at = position_in(array, self.base).ok_or(self.out_of_bounds(what, 0, array.offset(), len))?;
		let out = || self.out_of_bounds(what, at, array.offset(), len);
		let start = array.target(at).ok_or_else(out)?;
		let end = usize::try_from(len).ok().and_then(|len| start.checked_add(len)).ok_or_else(out)?;
		if end > self.base.len() {
			return Err(out());
		}
		if start % align_of::<T>() != 0 {
			return Err(ValidationError::Misaligned {
				what,
				target: start,
				align: align_of::<T>(),
			});
		}
		array.resolve(self.base).ok_or_else(out)
	}

	fn single<T: Pod>(&self, what: &'static str, item: &'a Ref<T>) -> VResult<&'a T> {
		let len = size_of::<T>() as u64;
		let at = position_in(item, self.base).ok_or(self.out_of_bounds(what, 0, item.offset(), len))?;
		let out = || self.out_of_bounds(what, at, item.offset(), len);
		let start = item.target(at).ok_or_else(out)?;
		if start.checked_add(size_of::<T>()).is_none_or(|end| end > self.base.len()) {
			return Err(out());
		}
		if start % align_of::<T>() != 0 {
			return Err(ValidationError::Misaligned {
				what,
				target: start,
				align: align_of::<T>(),
			});
		}
		item.resolve(self.base).ok_or_else(out)
	}

	fn out_of_bounds(&self, what: &'static str, at: usize, offset: i64, len: u64) -> ValidationError {
		ValidationError::OutOfBounds {
			what,
			at,
			offset,
			len,
			size: self.base.len(),
		}
	}
}

fn check_index(what: &'static str, at: usize, index: u32, len: usize) -> VResult<()> {
	if (index as usize) < len {
		Ok(())
	} else {
		Err(ValidationError::IndexOutOfRange { what, at, index, len })
	}
}

#[cfg(test)]
mod tests;
