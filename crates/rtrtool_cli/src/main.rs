#![allow(missing_docs)]

use clap::Parser;
use env_logger::Env;
use rtrtool::rtr::{Result, RtrError};

mod cmd;

#[derive(Parser)]
#[command(name = "rtrtool", about = "Convert glTF scenes to ready-to-render (.rtr) containers and inspect them")]
struct Cli {
	#[command(flatten)]
	args: cmd::Args,
}

fn main() {
	env_logger::Builder::from_env(Env::default().default_filter_or("warn")).init();

	if let Err(err) = run() {
		eprintln!("error: {err}");
		let code = match err {
			RtrError::Usage { .. } => 2,
			_ => 1,
		};
		std::process::exit(code);
	}
}

fn run() -> Result<()> {
	let Cli { args } = Cli::parse();
	match args.output.clone() {
		Some(output) => cmd::write::run(args, output),
		None => cmd::view::run(args),
	}
}
