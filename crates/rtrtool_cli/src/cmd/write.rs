use std::path::PathBuf;

use rtrtool::rtr::{PngEncoder, Result, RtrError, convert_to_file, import_gltf};

use crate::cmd::Args;
use crate::cmd::summary::Summary;
use crate::cmd::util::{emit_json, is_gltf};

#[derive(serde::Serialize)]
struct WrittenJson {
	output: String,
	bytes: usize,
}

/// Convert glTF `args.input` into a container at `output`.
pub fn run(args: Args, output: PathBuf) -> Result<()> {
	if !is_gltf(&args.input) {
		return Err(RtrError::Usage {
			message: format!("{} is not a .gltf or .glb file; only glTF input can be written", args.input.display()),
		});
	}

	let source = import_gltf(&args.input)?;
	let container = convert_to_file(&source, &output, &args.convert_options(), &mut PngEncoder)?;
	let path = output.display().to_string();

	if args.print {
		return Summary::collect(&path, &container, args.scene)?.emit(args.json);
	}
	if args.json {
		return emit_json(&WrittenJson {
			output: path,
			bytes: container.len(),
		});
	}
	println!("wrote {path}: {} bytes", container.len());
	Ok(())
}
