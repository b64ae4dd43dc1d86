//! Shared test helpers for workspace crates.

use std::path::{Path, PathBuf};

use rtrtool::rtr::{IDENTITY, InstanceSource, MaterialSource, MeshSource, SceneSource, SourceNode};
use serde_json::json;

/// Column-major translation matrix.
pub fn translation(x: f32, y: f32, z: f32) -> [[f32; 4]; 4] {
	let mut matrix = IDENTITY;
	matrix[3] = [x, y, z, 1.0];
	matrix
}

/// Unit quad in the XY plane with UVs matching positions.
pub fn quad_mesh(name: &str) -> MeshSource {
	MeshSource {
		name: name.to_owned(),
		positions: Some(vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]]),
		indices: Some(vec![0, 1, 2, 0, 2, 3]),
		normals: None,
		tex_coords0: Some(vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]]),
		tangents: None,
	}
}

/// One scene with `root -> child`, a quad on each, and one untextured material.
///
/// `root` is translated by `(1, 0, 0)` and `child` by `(0, 2, 0)`.
pub fn two_node_scene() -> SceneSource {
	SceneSource {
		meshes: vec![quad_mesh("root"), quad_mesh("child")],
		materials: vec![MaterialSource::default()],
		nodes: vec![
			SourceNode {
				name: Some(String::from("root")),
				transform: translation(1.0, 0.0, 0.0),
				children: vec![1],
				instances: vec![InstanceSource { mesh: 0, material: 0 }],
				..SourceNode::default()
			},
			SourceNode {
				name: Some(String::from("child")),
				transform: translation(0.0, 2.0, 0.0),
				instances: vec![InstanceSource { mesh: 1, material: 0 }],
				..SourceNode::default()
			},
		],
		scenes: vec![vec![0]],
	}
}

/// Write `<dir>/<stem>.gltf` plus an external `<stem>.bin` buffer.
///
/// The document mirrors [`two_node_scene`] with triangles instead of quads,
/// uses TRS translations, and adds a perspective camera on the child.
pub fn write_two_node_gltf(dir: &Path, stem: &str) -> PathBuf {
	let positions: [[f32; 3]; 3] = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]];
	let tex_coords: [[f32; 2]; 3] = [[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]];
	let indices: [u16; 3] = [0, 1, 2];

	let mut bin = Vec::new();
	bin.extend(positions.iter().flatten().flat_map(|value| value.to_le_bytes()));
	bin.extend(tex_coords.iter().flatten().flat_map(|value| value.to_le_bytes()));
	bin.extend(indices.iter().flat_map(|value| value.to_le_bytes()));
	bin.resize(bin.len().next_multiple_of(4), 0);

	let primitive = json!({ "attributes": { "POSITION": 0, "TEXCOORD_0": 1 }, "indices": 2, "material": 0 });
	let document = json!({
		"asset": { "version": "2.0", "generator": "rtrtool_testkit" },
		"scene": 0,
		"scenes": [{ "nodes": [0] }],
		"nodes": [
			{ "name": "root", "mesh": 0, "translation": [1.0, 0.0, 0.0], "children": [1] },
			{ "name": "child", "mesh": 1, "camera": 0, "translation": [0.0, 2.0, 0.0] }
		],
		"cameras": [{ "name": "main", "type": "perspective", "perspective": { "yfov": 0.8, "znear": 0.1, "zfar": 100.0 } }],
		"meshes": [
			{ "name": "root", "primitives": [primitive.clone()] },
			{ "name": "child", "primitives": [primitive] }
		],
		"materials": [{ "name": "paint", "pbrMetallicRoughness": { "baseColorFactor": [0.8, 0.2, 0.2, 1.0] } }],
		"accessors": [
			{ "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3", "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 0.0] },
			{ "bufferView": 1, "componentType": 5126, "count": 3, "type": "VEC2" },
			{ "bufferView": 2, "componentType": 5123, "count": 3, "type": "SCALAR" }
		],
		"bufferViews": [
			{ "buffer": 0, "byteOffset": 0, "byteLength": 36 },
			{ "buffer": 0, "byteOffset": 36, "byteLength": 24 },
			{ "buffer": 0, "byteOffset": 60, "byteLength": 6 }
		],
		"buffers": [{ "uri": format!("{stem}.bin"), "byteLength": bin.len() }]
	});

	std::fs::write(dir.join(format!("{stem}.bin")), &bin).expect("write glTF buffer");
	let path = dir.join(format!("{stem}.gltf"));
	let text = serde_json::to_string_pretty(&document).expect("serialize glTF document");
	std::fs::write(&path, text).expect("write glTF document");
	path
}
