//! Subprocess execution bounded by the running producer's deadline.
//!
//! The coordinator runs each producer on a blocking thread inside
//! [`with_deadline`]. Any child started through [`output`] on that thread
//! gets its own process group, and the whole group is killed once the
//! deadline passes. Without a deadline (or outside a runtime) [`output`]
//! waits for the child like [`Command::output`].

use std::cell::Cell;
use std::path::PathBuf;
use std::process::{Command, Output};
use std::time::{Duration, Instant};

use tokio::runtime::Handle;

use crate::error::ProducerError;

thread_local! {
	static DEADLINE: Cell<Option<Deadline>> = const { Cell::new(None) };
}

#[derive(Debug, Clone, Copy)]
struct Deadline {
	at: Instant,
	limit: Duration,
}

/// Runs `f` with a deadline of `limit` from now applied to every
/// subprocess it starts through [`output`].
///
/// Must be called from a blocking thread, not from async code.
pub fn with_deadline<R>(limit: Duration, f: impl FnOnce() -> R) -> R {
	struct Restore(Option<Deadline>);

	impl Drop for Restore {
		fn drop(&mut self) {
			DEADLINE.with(|d| d.set(self.0));
		}
	}

	let deadline = Deadline {
		at: Instant::now() + limit,
		limit,
	};
	let _restore = Restore(DEADLINE.with(|d| d.replace(Some(deadline))));
	f()
}

/// Time left before the current thread's deadline, if one is set.
pub fn remaining() -> Option<Duration> {
	DEADLINE.with(Cell::get).map(|d| d.at.saturating_duration_since(Instant::now()))
}

/// Runs `command` to completion and collects its output.
///
/// Stdio configuration is taken from `command`. Under a deadline the child
/// and its descendants are killed when it expires and the call fails with
/// [`ProducerError::TimedOut`].
pub fn output(mut command: Command) -> Result<Output, ProducerError> {
	let program = PathBuf::from(command.get_program());
	let bounded = DEADLINE.with(Cell::get).zip(Handle::try_current().ok());
	let Some((deadline, runtime)) = bounded else {
		return command.output().map_err(|e| spawn_error(program, e));
	};

	#[cfg(unix)]
	{
		use std::os::unix::process::CommandExt;
		command.process_group(0);
	}
	let wait = remaining().unwrap_or_default();
	runtime.block_on(output_within(command.into(), program, wait, deadline.limit))
}

async fn output_within(
	mut command: tokio::process::Command,
	program: PathBuf,
	wait: Duration,
	limit: Duration,
) -> Result<Output, ProducerError> {
	command.kill_on_drop(true);
	let child = command.spawn().map_err(|e| spawn_error(program.clone(), e))?;
	let pid = child.id();

	match tokio::time::timeout(wait, child.wait_with_output()).await {
		Ok(result) => result.map_err(ProducerError::from),
		Err(_) => {
			if let Some(pid) = pid {
				kill_group(pid);
			}
			tracing::warn!(program = %program.display(), pid, "process.killed_at_deadline");
			Err(ProducerError::TimedOut(limit))
		}
	}
}

fn spawn_error(path: PathBuf, error: std::io::Error) -> ProducerError {
	ProducerError::Spawn {
		path,
		error: error.to_string(),
	}
}

/// Kills the process group led by `pid`.
#[cfg(unix)]
fn kill_group(pid: u32) {
	let Ok(pgid) = libc::pid_t::try_from(pid) else {
		return;
	};
	// SAFETY: kill(2) has no memory-safety preconditions. The group was
	// created for this child with `process_group(0)`, so the negated pid
	// addresses only the child and its descendants.
	let rc = unsafe { libc::kill(-pgid, libc::SIGKILL) };
	if rc != 0 {
		tracing::debug!(pid, error = %std::io::Error::last_os_error(), "process.kill_group_failed");
	}
}

#[cfg(not(unix))]
fn kill_group(_pid: u32) {}
