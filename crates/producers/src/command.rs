//! Subprocess helpers shared by producers that shell out.

use std::process::{Command, Stdio};

use hostfacts_engine::{ProducerError, process};

/// Runs `program` and returns its stdout as text. The child is killed if
/// the producer's deadline passes first.
///
/// The exit status is not checked: several tools print a usable status line
/// and still exit non-zero (`csrutil` without full disk access, `spctl` when
/// assessments are disabled).
pub(crate) fn stdout_of(program: &str, args: &[&str]) -> Result<String, ProducerError> {
	let mut command = Command::new(program);
	command.args(args).stdin(Stdio::null()).stdout(Stdio::piped()).stderr(Stdio::piped());
	let output = process::output(command)?;

	if !output.status.success() {
		tracing::debug!(program, status = %output.status, "command.nonzero_exit");
	}
	Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Trimmed stdout of a status tool, or `"Unknown"` if it cannot be launched.
/// Other failures, such as overrunning the deadline, are returned.
pub(crate) fn status_line(program: &str, args: &[&str]) -> Result<String, ProducerError> {
	match stdout_of(program, args) {
		Ok(stdout) => Ok(stdout.trim().to_string()),
		Err(err @ ProducerError::Spawn { .. }) => {
			tracing::debug!(program, error = %err, "command.unavailable");
			Ok("Unknown".to_string())
		}
		Err(err) => Err(err),
	}
}
