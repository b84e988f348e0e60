//! `hostfacts` binary.
//!
//! Exit status: 0 on success (including a run that found no facts), 1 when
//! the conditional document could not be written, 2 for configuration or
//! discovery errors. Producer failures are logged and do not change it.

mod cli;
mod commands;
mod logging;

use std::process::ExitCode;

use clap::Parser;
use cli::{Cli, Command};
// Force linking of hostfacts-producers so its inventory submissions are registered
#[allow(unused_imports, reason = "ensures built-in producers are linked")]
use hostfacts_producers as _;

fn main() -> ExitCode {
	let cli = Cli::parse();
	logging::init(cli.global.verbose, cli.global.log_format);

	match dispatch(&cli) {
		Ok(()) => ExitCode::SUCCESS,
		Err(err) => {
			eprintln!("hostfacts: {err:#}");
			ExitCode::from(commands::exit_code(&err))
		}
	}
}

fn dispatch(cli: &Cli) -> anyhow::Result<()> {
	let mut settings = commands::settings(&cli.global)?;
	match cli.command() {
		Command::Run { dry_run } => {
			settings.dry_run |= dry_run;
			commands::run(&settings)
		}
		Command::List => commands::list(&settings),
		Command::Show { names } => commands::show(&settings, &names),
	}
}
