use std::path::Path;

use rtrtool::rtr::Result;

/// Whether `path` names a glTF document by extension.
pub(crate) fn is_gltf(path: &Path) -> bool {
	path.extension()
		.and_then(|ext| ext.to_str())
		.is_some_and(|ext| ext.eq_ignore_ascii_case("gltf") || ext.eq_ignore_ascii_case("glb"))
}

/// Print `payload` as pretty JSON on stdout.
pub(crate) fn emit_json<T: serde::Serialize>(payload: &T) -> Result<()> {
	let text = serde_json::to_string_pretty(payload).map_err(std::io::Error::other)?;
	println!("{text}");
	Ok(())
}

/// Translation column of a column-major matrix.
pub(crate) fn translation_of(matrix: [[f32; 4]; 4]) -> [f32; 3] {
	[matrix[3][0], matrix[3][1], matrix[3][2]]
}

/// Render an optional float, `inf` when absent.
pub(crate) fn float_or_inf(value: Option<f32>) -> String {
	value.map_or_else(|| "inf".to_owned(), |value| value.to_string())
}
