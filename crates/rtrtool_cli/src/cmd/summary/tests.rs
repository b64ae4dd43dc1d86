use rtrtool::rtr::{CameraSource, ConvertOptions, LightKind, LightSource, PngEncoder, RtrError, convert_to_memory};
use rtrtool_testkit::two_node_scene;

use crate::cmd::summary::Summary;

fn summary_json(scene: Option<usize>) -> serde_json::Value {
	let mut source = two_node_scene();
	source.nodes[1].camera = Some(CameraSource {
		name: String::from("main"),
		yfov: 0.5,
		znear: 0.1,
		zfar: None,
	});
	source.nodes[1].light = Some(LightSource {
		color: [1.0, 1.0, 1.0],
		intensity: 1.0,
		kind: LightKind::Point,
	});
	let container = convert_to_memory(&source, &ConvertOptions::default(), &mut PngEncoder).expect("sample converts");
	let summary = Summary::collect("memory", &container, scene).expect("summary collects");
	serde_json::to_value(&summary).expect("summary serializes")
}

#[test]
fn summary_lists_meshes_and_instances() {
	let json = summary_json(None);
	assert_eq!(json["meshes"][0]["name"], "root");
	assert_eq!(json["meshes"][1]["triangles"], 2);
	assert_eq!(json["sub_headers"].as_array().map(Vec::len), Some(3));
	assert_eq!(json["sub_headers"][2]["tag"], "scene");

	let scene = &json["scenes"][0];
	assert_eq!(scene["root"], 0);
	assert_eq!(scene["nodes"], 3);
	let instances = scene["instances"].as_array().expect("instances");
	let child = instances.iter().find(|item| item["mesh"] == 1).expect("child instance");
	assert_eq!(child["translation"], serde_json::json!([1.0, 2.0, 0.0]));
}

#[test]
fn infinite_far_plane_is_null() {
	let json = summary_json(Some(0));
	assert_eq!(json["cameras"][0]["name"], "main");
	assert!(json["cameras"][0]["zfar"].is_null());
	assert_eq!(json["lights"]["point"], 1);
}

#[test]
fn unknown_scene_is_usage_error() {
	let container = convert_to_memory(&two_node_scene(), &ConvertOptions::default(), &mut PngEncoder).expect("sample converts");
	let err = Summary::collect("memory", &container, Some(4)).err().expect("scene 4 does not exist");
	assert!(matches!(err, RtrError::Usage { .. }));
}
