use std::path::PathBuf;

use rtrtool::rtr::ConvertOptions;

/// Container summary shared by view and write modes.
pub mod summary;
/// Convert glTF input into a container file.
pub mod write;
/// Open or convert input in memory and print its summary.
pub mod view;

mod util;

#[derive(clap::Args)]
pub struct Args {
	/// Input `.gltf`/`.glb` scene or `.rtr` container.
	pub input: PathBuf,
	/// Output container path; omit to view the input instead.
	pub output: Option<PathBuf>,
	/// Also print the summary of the written container; needs an output
	/// path, view mode always prints it.
	#[arg(long, requires = "output")]
	pub print: bool,
	/// Emit the summary as JSON.
	#[arg(long)]
	pub json: bool,
	/// Restrict the instance listing to one scene.
	#[arg(long)]
	pub scene: Option<usize>,
	/// Arena reservation in bytes used while converting.
	#[arg(long, value_name = "BYTES")]
	pub capacity: Option<usize>,
}

impl Args {
	pub(crate) fn convert_options(&self) -> ConvertOptions {
		let mut options = ConvertOptions::default();
		if let Some(capacity) = self.capacity {
			options.capacity = capacity;
		}
		options
	}
}
