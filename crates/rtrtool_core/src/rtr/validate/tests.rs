use std::mem::{offset_of, size_of};

use crate::rtr::fixtures::two_node_container;
use crate::rtr::relref::position_in;
use crate::rtr::{Instance, MAGIC, Mesh, MeshHeader, Node, RootRecord, SceneHeader, SubHeaderRef, ValidationError, validate};

/// Copy `bytes` into 8-byte aligned memory and validate the copy.
fn check(bytes: &[u8]) -> Result<usize, ValidationError> {
	let mut words = vec![0_u64; bytes.len().div_ceil(8)];
	let aligned = &mut bytemuck::cast_slice_mut::<u64, u8>(&mut words)[..bytes.len()];
	aligned.copy_from_slice(bytes);
	validate(aligned)
}

fn put_u32(bytes: &mut [u8], at: usize, value: u32) {
	bytes[at..at + 4].copy_from_slice(&value.to_ne_bytes());
}

fn put_u64(bytes: &mut [u8], at: usize, value: u64) {
	bytes[at..at + 8].copy_from_slice(&value.to_ne_bytes());
}

/// Field positions inside the sample container.
struct Layout {
	bytes: Vec<u8>,
	table: usize,
	first_mesh: usize,
	nodes: usize,
	scenes: usize,
	instances: usize,
}

fn layout() -> Layout {
	let container = two_node_container();
	let bytes = container.bytes();
	let at = |pos: Option<usize>| pos.expect("position inside container");

	let table = at(container.root().sub_headers.target(at(position_in(&container.root().sub_headers, bytes))));
	let meshes = container.find::<MeshHeader>().expect("mesh header");
	let first_mesh = at(meshes.meshes.target(at(position_in(&meshes.meshes, bytes))));
	let scene = container.find::<SceneHeader>().expect("scene header");
	let nodes = at(scene.nodes.target(at(position_in(&scene.nodes, bytes))));
	let scenes = at(scene.scenes.target(at(position_in(&scene.scenes, bytes))));
	let instances = at(scene.instances.target(at(position_in(&scene.instances, bytes))));

	Layout {
		bytes: bytes.to_vec(),
		table,
		first_mesh,
		nodes,
		scenes,
		instances,
	}
}

fn node_field(layout: &Layout, slot: usize, field: usize) -> usize {
	layout.nodes + slot * size_of::<Node>() + field
}

#[test]
fn sample_container_is_valid() {
	let layout = layout();
	assert_eq!(check(&layout.bytes), Ok(layout.bytes.len()));
}

#[test]
fn flipped_magic_is_bad_signature() {
	let mut bytes = layout().bytes;
	bytes[0] ^= 0xff;
	assert!(matches!(check(&bytes), Err(ValidationError::BadSignature { expected: MAGIC, .. })));
}

#[test]
fn buffers_shorter_than_root_are_truncated() {
	let bytes = layout().bytes;
	assert_eq!(
		check(&bytes[..size_of::<RootRecord>() - 1]),
		Err(ValidationError::Truncated {
			size: size_of::<RootRecord>() - 1,
			need: size_of::<RootRecord>()
		})
	);
	assert!(matches!(check(&[]), Err(ValidationError::Truncated { size: 0, .. })));
}

#[test]
fn truncated_file_mismatches_declared_size() {
	let bytes = layout().bytes;
	let half = bytes.len() / 2;
	assert_eq!(
		check(&bytes[..half]),
		Err(ValidationError::DeclaredSizeMismatch {
			declared: bytes.len() as u64,
			size: half
		})
	);
}

#[test]
fn declared_size_below_root_is_truncated() {
	let mut bytes = layout().bytes;
	put_u64(&mut bytes, offset_of!(RootRecord, declared_size), 8);
	assert_eq!(check(&bytes), Err(ValidationError::Truncated { size: 8, need: size_of::<RootRecord>() }));
}

#[test]
fn trailing_bytes_are_ignored() {
	let mut bytes = layout().bytes;
	let declared = bytes.len();
	bytes.extend_from_slice(&[0xab; 100]);
	assert_eq!(check(&bytes), Ok(declared));
}

#[test]
fn unknown_version_is_rejected() {
	let mut bytes = layout().bytes;
	put_u32(&mut bytes, offset_of!(RootRecord, version), 2);
	assert_eq!(check(&bytes), Err(ValidationError::UnsupportedVersion { version: 2, expected: 1 }));
}

#[test]
fn misaligned_root_is_rejected() {
	let bytes = layout().bytes;
	let mut words = vec![0_u64; bytes.len().div_ceil(8) + 1];
	let shifted = &mut bytemuck::cast_slice_mut::<u64, u8>(&mut words)[1..=bytes.len()];
	shifted.copy_from_slice(&bytes);
	assert!(matches!(validate(shifted), Err(ValidationError::Misaligned { what: "root record", .. })));
}

#[test]
fn parent_offset_past_array_start_is_rejected() {
	let layout = layout();
	let mut bytes = layout.bytes.clone();
	put_u32(&mut bytes, node_field(&layout, 2, offset_of!(Node, parent_offset)), 3);
	assert_eq!(check(&bytes), Err(ValidationError::BadParentOffset { node: 2, parent_offset: 3 }));
}

#[test]
fn subtree_escaping_array_is_rejected() {
	let layout = layout();
	let mut bytes = layout.bytes.clone();
	put_u32(&mut bytes, node_field(&layout, 0, offset_of!(Node, descendant_count)), 99);
	assert_eq!(
		check(&bytes),
		Err(ValidationError::BadDescendantCount {
			node: 0,
			descendant_count: 99,
			len: 3
		})
	);
}

#[test]
fn subtree_escaping_parent_is_rejected() {
	let layout = layout();
	let mut bytes = layout.bytes.clone();
	put_u32(&mut bytes, node_field(&layout, 1, offset_of!(Node, descendant_count)), 0);
	assert!(matches!(check(&bytes), Err(ValidationError::BadDescendantCount { node: 2, .. })));
}

#[test]
fn root_nested_inside_a_subtree_is_rejected() {
	let layout = layout();
	let mut bytes = layout.bytes.clone();
	put_u32(&mut bytes, node_field(&layout, 2, offset_of!(Node, parent_offset)), 0);
	assert_eq!(check(&bytes), Err(ValidationError::MisplacedNode { node: 2, parent_offset: 0 }));
}

#[test]
fn parent_link_skipping_enclosing_node_is_rejected() {
	let layout = layout();
	let mut bytes = layout.bytes.clone();
	put_u32(&mut bytes, node_field(&layout, 2, offset_of!(Node, parent_offset)), 2);
	assert_eq!(check(&bytes), Err(ValidationError::MisplacedNode { node: 2, parent_offset: 2 }));
}

#[test]
fn scene_targeting_non_root_node_is_rejected() {
	let layout = layout();
	let mut bytes = layout.bytes.clone();
	let offset = i64::from_ne_bytes(bytes[layout.scenes..layout.scenes + 8].try_into().expect("8 bytes"));
	put_u64(&mut bytes, layout.scenes, (offset + size_of::<Node>() as i64) as u64);
	assert_eq!(check(&bytes), Err(ValidationError::BadSceneRoot { scene: 0 }));
}

#[test]
fn instance_mesh_index_out_of_range() {
	let layout = layout();
	let mut bytes = layout.bytes.clone();
	put_u32(&mut bytes, layout.instances + offset_of!(Instance, mesh), 7);
	assert_eq!(
		check(&bytes),
		Err(ValidationError::IndexOutOfRange {
			what: "instance mesh",
			at: 0,
			index: 7,
			len: 2
		})
	);
}

#[test]
fn escaping_array_reference_is_out_of_bounds() {
	let layout = layout();
	let mut bytes = layout.bytes.clone();
	put_u64(&mut bytes, layout.first_mesh + offset_of!(Mesh, positions), 1 << 40);
	assert!(matches!(check(&bytes), Err(ValidationError::OutOfBounds { what: "mesh positions", .. })));
}

#[test]
fn misaligned_array_target_is_rejected() {
	let layout = layout();
	let mut bytes = layout.bytes.clone();
	let field = layout.first_mesh + offset_of!(Mesh, positions);
	let offset = i64::from_ne_bytes(bytes[field..field + 8].try_into().expect("eight bytes"));
	put_u64(&mut bytes, field, (offset + 1) as u64);
	assert!(matches!(check(&bytes), Err(ValidationError::Misaligned { what: "mesh positions", .. })));
}

#[test]
fn overlapping_sub_headers_are_rejected() {
	let layout = layout();
	let mut bytes = layout.bytes.clone();
	let second_target = layout.table + size_of::<SubHeaderRef>() + offset_of!(SubHeaderRef, target);
	let first_header = size_of::<RootRecord>();
	put_u64(&mut bytes, second_target, (first_header as i64 - second_target as i64) as u64);
	assert_eq!(
		check(&bytes),
		Err(ValidationError::OverlappingSubHeaders {
			index: 1,
			start: first_header,
			prev_end: first_header + size_of::<MeshHeader>()
		})
	);
}

#[test]
fn undersized_sub_header_is_rejected() {
	let layout = layout();
	let mut bytes = layout.bytes.clone();
	put_u64(&mut bytes, layout.table + offset_of!(SubHeaderRef, size), 8);
	assert_eq!(
		check(&bytes),
		Err(ValidationError::SubHeaderTooSmall {
			tag: "mesh",
			size: 8,
			need: size_of::<MeshHeader>()
		})
	);
}

#[test]
fn unknown_tags_are_skipped() {
	let layout = layout();
	let mut bytes = layout.bytes.clone();
	let scene_entry = layout.table + 2 * size_of::<SubHeaderRef>();
	put_u32(&mut bytes, scene_entry + offset_of!(SubHeaderRef, tag), 99);
	assert_eq!(check(&bytes), Ok(bytes.len()));
}

#[test]
fn corrupted_bytes_never_panic() {
	let bytes = layout().bytes;
	for len in 0..bytes.len() {
		assert!(check(&bytes[..len]).is_err(), "prefix of {len} bytes");
	}
	for at in 0..bytes.len() {
		for mask in [0x01, 0x80, 0xff] {
			let mut corrupted = bytes.clone();
			corrupted[at] ^= mask;
			let _ = check(&corrupted);
		}
	}
}
