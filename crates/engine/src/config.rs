//! Run settings, loaded from an optional TOML file and overridden from the
//! command line.

use std::path::{Path, PathBuf};
use std::time::Duration;

use hostfacts_worker::JobBudget;
use serde::Deserialize;

use crate::error::ConfigError;

/// Default location of external producer executables.
pub const DEFAULT_FACTS_DIR: &str = "/usr/local/hostfacts/facts";

/// File name of the conditional document inside the managed install dir.
pub const DEFAULT_DOCUMENT_NAME: &str = "ConditionalItems.plist";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
	/// Directory scanned for external producers. `None` disables them.
	pub facts_dir: Option<PathBuf>,
	/// Overrides the managed install directory preference.
	pub managed_install_dir: Option<PathBuf>,
	pub document_name: String,
	/// Producers executed concurrently.
	pub jobs: usize,
	/// Per-producer deadline in seconds.
	pub timeout_secs: u64,
	/// Producer names to skip.
	pub disabled: Vec<String>,
	/// Stop after merging; never touch the document.
	#[serde(skip)]
	pub dry_run: bool,
}

impl Default for Settings {
	fn default() -> Self {
		Self {
			facts_dir: Some(PathBuf::from(DEFAULT_FACTS_DIR)),
			managed_install_dir: None,
			document_name: DEFAULT_DOCUMENT_NAME.to_string(),
			jobs: JobBudget::DEFAULT_CONCURRENCY.get(),
			timeout_secs: JobBudget::DEFAULT_DEADLINE.as_secs(),
			disabled: Vec::new(),
			dry_run: false,
		}
	}
}

impl Settings {
	/// Reads settings from a TOML file.
	pub fn load(path: &Path) -> Result<Self, ConfigError> {
		let text = std::fs::read_to_string(path).map_err(|error| ConfigError::Io {
			path: path.to_path_buf(),
			error,
		})?;
		Self::parse(&text, path)
	}

	/// Parses settings from TOML text; `origin` is used in error messages.
	pub fn parse(text: &str, origin: &Path) -> Result<Self, ConfigError> {
		let settings: Self = toml::from_str(text).map_err(|error| ConfigError::Parse {
			path: origin.to_path_buf(),
			error,
		})?;
		settings.validate()?;
		Ok(settings)
	}

	/// Checks the limits are usable: at least one job and a non-zero
	/// timeout.
	pub fn validate(&self) -> Result<(), ConfigError> {
		if self.jobs == 0 {
			return Err(ConfigError::ZeroJobs);
		}
		if self.timeout_secs == 0 {
			return Err(ConfigError::ZeroTimeout);
		}
		Ok(())
	}

	/// Execution limits for the coordinator.
	pub fn limits(&self) -> Result<JobBudget, ConfigError> {
		let concurrency = std::num::NonZeroUsize::new(self.jobs).ok_or(ConfigError::ZeroJobs)?;
		if self.timeout_secs == 0 {
			return Err(ConfigError::ZeroTimeout);
		}
		Ok(JobBudget::new(concurrency, Duration::from_secs(self.timeout_secs)))
	}
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::*;

	fn parse(text: &str) -> Result<Settings, ConfigError> {
		Settings::parse(text, Path::new("hostfacts.toml"))
	}

	#[test]
	fn empty_file_yields_defaults() {
		assert_eq!(parse("").unwrap(), Settings::default());
	}

	#[test]
	fn fields_are_read() {
		let settings = parse(
			r#"
facts_dir = "/opt/facts"
managed_install_dir = "/var/munki"
jobs = 8
timeout_secs = 5
disabled = ["top_user"]
"#,
		)
		.unwrap();
		assert_eq!(settings.facts_dir, Some(PathBuf::from("/opt/facts")));
		assert_eq!(settings.managed_install_dir, Some(PathBuf::from("/var/munki")));
		assert_eq!(settings.jobs, 8);
		assert_eq!(settings.disabled, ["top_user"]);
		assert_eq!(settings.limits().unwrap().deadline, Duration::from_secs(5));
	}

	#[test]
	fn unknown_keys_are_rejected() {
		assert!(matches!(parse("colour = \"red\""), Err(ConfigError::Parse { .. })));
	}

	#[test]
	fn zero_jobs_is_rejected() {
		assert!(matches!(parse("jobs = 0"), Err(ConfigError::ZeroJobs)));
	}

	#[test]
	fn zero_timeout_is_rejected() {
		assert!(matches!(parse("timeout_secs = 0"), Err(ConfigError::ZeroTimeout)));
	}

	#[test]
	fn missing_file_is_an_io_error() {
		let err = Settings::load(Path::new("/nonexistent/hostfacts.toml")).unwrap_err();
		assert!(matches!(err, ConfigError::Io { .. }));
	}
}
