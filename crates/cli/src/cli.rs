use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "hostfacts")]
#[command(about = "Collect host facts into the managed install conditional document")]
#[command(version)]
/// Command-line arguments.
pub struct Cli {
	#[command(flatten)]
	pub global: GlobalArgs,

	/// Subcommand to execute (defaults to `run`).
	#[command(subcommand)]
	pub command: Option<Command>,
}

/// Options shared by every subcommand.
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct GlobalArgs {
	/// Settings file (TOML); falls back to $HOSTFACTS_CONFIG
	#[arg(long, global = true, value_name = "PATH")]
	pub config: Option<PathBuf>,

	/// Directory of external producer executables
	#[arg(long, global = true, value_name = "DIR")]
	pub facts_dir: Option<PathBuf>,

	/// Directory holding the conditional document (overrides ManagedInstallDir)
	#[arg(long, global = true, value_name = "DIR")]
	pub managed_install_dir: Option<PathBuf>,

	/// Producers executed at the same time
	#[arg(long, short = 'j', global = true)]
	pub jobs: Option<usize>,

	/// Per-producer deadline in seconds
	#[arg(long, global = true, value_name = "SECS")]
	pub timeout: Option<u64>,

	/// More logging (-v info, -vv debug); $HOSTFACTS_LOG takes precedence
	#[arg(short, long, global = true, action = clap::ArgAction::Count)]
	pub verbose: u8,

	/// Log line format
	#[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
	pub log_format: LogFormat,
}

#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
	#[default]
	Text,
	Json,
}

/// Available subcommands.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
	/// Run every producer and update the conditional document
	Run {
		/// Print the merged facts as JSON instead of writing them
		#[arg(long)]
		dry_run: bool,
	},
	/// List producers in invocation order
	List,
	/// Run only the named producers and print their outcomes as JSON
	Show {
		/// Producer names
		#[arg(required = true)]
		names: Vec<String>,
	},
}

impl Cli {
	/// The subcommand, with a bare invocation meaning `run`.
	pub fn command(&self) -> Command {
		self.command.clone().unwrap_or(Command::Run { dry_run: false })
	}
}

#[cfg(test)]
mod tests;
