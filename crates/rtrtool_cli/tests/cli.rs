#![allow(missing_docs)]

use std::path::Path;
use std::process::{Command, Output};

use rtrtool_testkit::write_two_node_gltf;

fn run_rtrtool(args: &[&str]) -> Output {
	Command::new(env!("CARGO_BIN_EXE_rtrtool")).args(args).output().expect("rtrtool command executes")
}

fn run_rtrtool_json(args: &[&str]) -> serde_json::Value {
	let output = run_rtrtool(args);
	assert!(
		output.status.success(),
		"rtrtool command failed with status={}: {}",
		output.status,
		String::from_utf8_lossy(&output.stderr)
	);
	serde_json::from_slice(&output.stdout).expect("stdout should be valid json")
}

fn arg(path: &Path) -> String {
	path.to_string_lossy().into_owned()
}

#[test]
fn write_then_view_round_trip() {
	let dir = tempfile::tempdir().expect("temp dir");
	let input = arg(&write_two_node_gltf(dir.path(), "pair"));
	let output = arg(&dir.path().join("pair.rtr"));

	let written = run_rtrtool_json(&[&input, &output, "--json"]);
	assert!(written["bytes"].as_u64().is_some_and(|bytes| bytes > 40));

	let viewed = run_rtrtool_json(&[&output, "--json"]);
	assert_eq!(viewed["bytes"], written["bytes"]);
	assert_eq!(viewed["meshes"].as_array().map(Vec::len), Some(2));
	assert_eq!(viewed["cameras"][0]["name"], "main");
	assert_eq!(viewed["scenes"][0]["instances"].as_array().map(Vec::len), Some(2));
}

#[test]
fn print_matches_in_memory_view() {
	let dir = tempfile::tempdir().expect("temp dir");
	let input = arg(&write_two_node_gltf(dir.path(), "pair"));
	let output = arg(&dir.path().join("pair.rtr"));

	let printed = run_rtrtool_json(&[&input, &output, "--print", "--json"]);
	let in_memory = run_rtrtool_json(&[&input, "--json"]);
	assert_eq!(printed["bytes"], in_memory["bytes"]);
	assert_eq!(printed["scenes"], in_memory["scenes"]);
}

#[test]
fn print_without_output_is_usage_error() {
	let dir = tempfile::tempdir().expect("temp dir");
	let input = arg(&write_two_node_gltf(dir.path(), "pair"));
	let result = run_rtrtool(&[&input, "--print"]);
	assert_eq!(result.status.code(), Some(2));
	assert!(String::from_utf8_lossy(&result.stderr).contains("OUTPUT"));
}

#[test]
fn text_view_lists_sub_headers() {
	let dir = tempfile::tempdir().expect("temp dir");
	let input = arg(&write_two_node_gltf(dir.path(), "pair"));
	let output = run_rtrtool(&[&input]);
	assert!(output.status.success());
	let stdout = String::from_utf8_lossy(&output.stdout);
	assert!(stdout.contains("sub_headers:"));
	assert!(stdout.contains("  mesh v1:"));
	assert!(stdout.contains("meshes: 2"));
}

#[test]
fn non_gltf_input_with_output_is_usage_error() {
	let dir = tempfile::tempdir().expect("temp dir");
	let input = dir.path().join("scene.obj");
	std::fs::write(&input, "o nothing").expect("write input");
	let output = dir.path().join("scene.rtr");

	let result = run_rtrtool(&[&arg(&input), &arg(&output)]);
	assert_eq!(result.status.code(), Some(2));
	assert!(String::from_utf8_lossy(&result.stderr).starts_with("error: usage:"));
	assert!(!output.exists());
}

#[test]
fn invalid_container_fails_with_error() {
	let dir = tempfile::tempdir().expect("temp dir");
	let path = dir.path().join("garbage.rtr");
	std::fs::write(&path, [0_u8; 128]).expect("write garbage");

	let result = run_rtrtool(&[&arg(&path)]);
	assert_eq!(result.status.code(), Some(1));
	assert!(String::from_utf8_lossy(&result.stderr).contains("bad signature"));
}

#[test]
fn missing_input_fails_with_error() {
	let dir = tempfile::tempdir().expect("temp dir");
	let result = run_rtrtool(&[&arg(&dir.path().join("absent.gltf"))]);
	assert_eq!(result.status.code(), Some(1));
	assert!(String::from_utf8_lossy(&result.stderr).contains("cannot read"));
}
