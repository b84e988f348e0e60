use tracing_subscriber::EnvFilter;

use crate::cli::LogFormat;

/// Environment variable holding an `EnvFilter` directive.
pub const LOG_ENV: &str = "HOSTFACTS_LOG";

/// Installs the stderr subscriber. Stdout is reserved for command output.
pub fn init(verbose: u8, format: LogFormat) {
	let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));
	let builder = tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.with_target(false);

	match format {
		LogFormat::Text => builder.init(),
		LogFormat::Json => builder.json().init(),
	}
}

fn default_directive(verbose: u8) -> &'static str {
	match verbose {
		0 => "warn",
		1 => "info",
		_ => "debug",
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn verbosity_levels() {
		assert_eq!(default_directive(0), "warn");
		assert_eq!(default_directive(1), "info");
		assert_eq!(default_directive(5), "debug");
	}
}
