use std::mem::size_of;

use crate::rtr::{ArenaWriter, ConversionError, MeshHeader, MeshSource, prepare_mesh, write_meshes};

fn quad() -> MeshSource {
	MeshSource {
		name: String::from("quad"),
		positions: Some(vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]]),
		indices: Some(vec![0, 1, 2, 0, 2, 3]),
		normals: None,
		tex_coords0: Some(vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]]),
		tangents: None,
	}
}

fn missing_attribute(source: &MeshSource) -> &'static str {
	match prepare_mesh(source).expect_err("policy rejects mesh") {
		ConversionError::MissingAttribute { mesh, attribute } => {
			assert_eq!(mesh, "quad");
			attribute
		}
		other => panic!("unexpected error: {other}"),
	}
}

fn invalid_reason(source: &MeshSource) -> String {
	match prepare_mesh(source).expect_err("policy rejects mesh") {
		ConversionError::InvalidMesh { reason, .. } => reason,
		other => panic!("unexpected error: {other}"),
	}
}

#[test]
fn required_attributes_are_enforced() {
	let mut source = quad();
	source.tex_coords0 = None;
	assert_eq!(missing_attribute(&source), "TEXCOORD_0");

	let mut source = quad();
	source.positions = None;
	assert_eq!(missing_attribute(&source), "POSITION");

	let mut source = quad();
	source.indices = None;
	assert_eq!(missing_attribute(&source), "indices");
}

#[test]
fn malformed_index_lists_are_rejected() {
	let mut source = quad();
	source.indices = Some(vec![0, 1, 2, 3]);
	assert!(invalid_reason(&source).contains("multiple of 3"));

	let mut source = quad();
	source.indices = Some(vec![0, 1, 4]);
	assert!(invalid_reason(&source).contains("index 4"));
}

#[test]
fn attribute_lengths_must_match_positions() {
	let mut source = quad();
	source.tex_coords0 = Some(vec![[0.0, 0.0]; 3]);
	assert!(invalid_reason(&source).starts_with("TEXCOORD_0"));

	let mut source = quad();
	source.normals = Some(vec![[0.0, 0.0, 1.0]; 5]);
	assert!(invalid_reason(&source).starts_with("NORMAL"));

	let mut source = quad();
	source.tangents = Some(vec![[1.0, 0.0, 0.0, 1.0]; 2]);
	assert!(invalid_reason(&source).starts_with("TANGENT"));
}

#[test]
fn missing_normals_and_tangents_are_generated() {
	let prepared = prepare_mesh(&quad()).expect("quad passes");
	assert_eq!(prepared.triangles, [[0, 1, 2], [0, 2, 3]]);
	assert_eq!(prepared.normals, vec![[0.0, 0.0, 1.0]; 4]);
	assert_eq!(prepared.tangents, vec![[1.0, 0.0, 0.0, 1.0]; 4]);
}

#[test]
fn supplied_attributes_are_kept() {
	let mut source = quad();
	source.normals = Some(vec![[0.0, 1.0, 0.0]; 4]);
	source.tangents = Some(vec![[0.0, 0.0, 1.0, -1.0]; 4]);
	let prepared = prepare_mesh(&source).expect("quad passes");
	assert_eq!(prepared.normals, vec![[0.0, 1.0, 0.0]; 4]);
	assert_eq!(prepared.tangents, vec![[0.0, 0.0, 1.0, -1.0]; 4]);
}

#[test]
fn written_meshes_read_back_through_views() {
	let mut second = quad();
	second.name = String::from("second");
	second.indices = Some(vec![0, 1, 2]);
	let meshes = [prepare_mesh(&quad()).expect("quad"), prepare_mesh(&second).expect("second")];

	let mut arena = ArenaWriter::in_memory(1 << 16).expect("arena");
	let header = write_meshes(&mut arena, &meshes).expect("write meshes");
	let storage = arena.finish().expect("finish");
	let bytes = storage.bytes();
	let header: &MeshHeader = bytemuck::from_bytes(&bytes[header.pos()..header.pos() + size_of::<MeshHeader>()]);

	let names: Vec<_> = header.iter(bytes).map(|mesh| mesh.name()).collect();
	assert_eq!(names, ["quad", "second"]);
	let view = header.mesh(bytes, 1).expect("second mesh");
	assert_eq!(view.triangles(), [[0, 1, 2]]);
	assert_eq!(view.positions(), meshes[1].positions.as_slice());
	assert_eq!(view.normals().len(), 4);
	assert_eq!(view.tex_coords0().len(), 4);
	assert_eq!(view.tangents()[0], [1.0, 0.0, 0.0, 1.0]);
	assert!(header.mesh(bytes, 2).is_none());
}
