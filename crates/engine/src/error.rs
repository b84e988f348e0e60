//! Error taxonomy of a collection run.
//!
//! Producer and read-side store errors are contained where they occur;
//! only [`EngineError`] reaches the caller.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Failure of a single fact producer. Never aborts a run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProducerError {
	/// The producer reported a failure of its own.
	#[error("{0}")]
	Failed(String),

	/// The producer panicked.
	#[error("panicked: {0}")]
	Panicked(String),

	/// The producer exceeded the per-producer deadline.
	#[error("timed out after {}s", .0.as_secs_f64())]
	TimedOut(Duration),

	/// The producer task was cancelled before reporting.
	#[error("cancelled")]
	Cancelled,

	/// An external producer could not be started.
	#[error("failed to launch {path}: {error}")]
	Spawn {
		path: PathBuf,
		error: String,
	},

	/// An external producer exited unsuccessfully.
	#[error("exited with {status}{}", stderr_suffix(.stderr))]
	Exit {
		status: String,
		stderr: String,
	},

	/// The producer returned something that is not a fact mapping.
	#[error("invalid output: {0}")]
	InvalidOutput(String),
}

fn stderr_suffix(stderr: &str) -> String {
	let trimmed = stderr.trim();
	if trimmed.is_empty() { String::new() } else { format!(": {trimmed}") }
}

impl ProducerError {
	/// Creates a [`ProducerError::Failed`] from a message.
	pub fn failed(msg: impl Into<String>) -> Self {
		Self::Failed(msg.into())
	}
}

impl From<std::io::Error> for ProducerError {
	fn from(err: std::io::Error) -> Self {
		Self::Failed(err.to_string())
	}
}

/// Failure to persist the conditional document.
#[derive(Debug, Error)]
pub enum StoreError {
	#[error("failed to stage {path}: {error}")]
	Stage {
		path: PathBuf,
		error: std::io::Error,
	},

	#[error("failed to serialize {path}: {error}")]
	Serialize {
		path: PathBuf,
		error: plist::Error,
	},

	#[error("failed to replace {path}: {error}")]
	Persist {
		path: PathBuf,
		error: std::io::Error,
	},
}

/// Errors loading [`Settings`](crate::Settings).
#[derive(Debug, Error)]
pub enum ConfigError {
	#[error("I/O error reading {path}: {error}")]
	Io {
		path: PathBuf,
		error: std::io::Error,
	},

	#[error("invalid config {path}: {error}")]
	Parse {
		path: PathBuf,
		error: toml::de::Error,
	},

	#[error("`jobs` must be at least 1")]
	ZeroJobs,

	#[error("`timeout_secs` must be at least 1")]
	ZeroTimeout,
}

/// Errors that end a run.
#[derive(Debug, Error)]
pub enum EngineError {
	#[error(transparent)]
	Config(#[from] ConfigError),

	/// The facts directory exists but cannot be listed.
	#[error("cannot read facts directory {path}: {error}")]
	Discovery {
		path: PathBuf,
		error: std::io::Error,
	},

	/// The merged document could not be written.
	#[error(transparent)]
	Store(#[from] StoreError),
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;
