use log::info;
use rtrtool::rtr::{Container, PngEncoder, Result, convert_to_memory, import_gltf};

use crate::cmd::Args;
use crate::cmd::summary::Summary;
use crate::cmd::util::is_gltf;

/// Summarise `args.input`, converting glTF input in memory first.
pub fn run(args: Args) -> Result<()> {
	let container = if is_gltf(&args.input) {
		let source = import_gltf(&args.input)?;
		convert_to_memory(&source, &args.convert_options(), &mut PngEncoder)?
	} else {
		Container::open_file(&args.input)?
	};
	info!("opened {} ({} bytes)", args.input.display(), container.len());

	Summary::collect(&args.input.display().to_string(), &container, args.scene)?.emit(args.json)
}
