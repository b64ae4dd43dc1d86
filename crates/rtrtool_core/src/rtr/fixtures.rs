//! Small in-memory scenes shared by the unit tests.
//!
//! Mirrors `rtrtool_testkit::{quad_mesh, two_node_scene}`. Unit tests cannot
//! use the testkit: it links a second copy of this crate through the
//! dev-dependency cycle, so its types differ from `crate::rtr`'s. Keep both
//! scenes in step.

use cgmath::{Matrix4, Vector3};

use crate::rtr::{Container, ConvertOptions, InstanceSource, MaterialSource, MeshSource, PngEncoder, SceneSource, SourceNode, convert_to_memory};

pub(crate) fn translation(x: f32, y: f32, z: f32) -> [[f32; 4]; 4] {
	Matrix4::from_translation(Vector3::new(x, y, z)).into()
}

pub(crate) fn quad(name: &str) -> MeshSource {
	MeshSource {
		name: name.to_owned(),
		positions: Some(vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]]),
		indices: Some(vec![0, 1, 2, 0, 2, 3]),
		normals: None,
		tex_coords0: Some(vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]]),
		tangents: None,
	}
}

/// Two meshes on `root -> child`, one scene, one default material.
pub(crate) fn two_node_scene() -> SceneSource {
	SceneSource {
		meshes: vec![quad("root"), quad("child")],
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

pub(crate) fn two_node_container() -> Container {
	convert_to_memory(&two_node_scene(), &ConvertOptions::default(), &mut PngEncoder).expect("sample converts")
}
