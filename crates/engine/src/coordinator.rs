//! Isolated execution of every discovered producer.

use std::time::Duration;

use hostfacts_worker::{Job, JobBudget, JobFailure, run_bounded};

use crate::error::ProducerError;
use crate::process;
use crate::producer::{ProducerHandle, ProducerResult, ProducerSource};
use crate::value::FactMap;

/// Per-producer record of one run.
#[derive(Debug, Clone)]
pub struct RunOutcome {
	/// Producer name.
	pub producer: String,
	pub source: ProducerSource,
	/// Wall time from start to report, or to the deadline.
	pub elapsed: Duration,
	pub status: ProducerResult,
}

impl RunOutcome {
	/// Returns true if the producer reported facts.
	pub fn is_success(&self) -> bool {
		self.status.is_ok()
	}

	/// Returns the reported facts, if any.
	pub fn facts(&self) -> Option<&FactMap> {
		self.status.as_ref().ok()
	}

	/// Returns the failure, if the producer did not report facts.
	pub fn error(&self) -> Option<&ProducerError> {
		self.status.as_ref().err()
	}
}

/// Extra time a producer gets past its deadline to kill its subprocesses
/// and report before the worker abandons it.
const CLEANUP_GRACE: Duration = Duration::from_millis(250);

/// Runs every producer under `limits`, one outcome per handle, in handle
/// order.
///
/// A producer that fails, panics, or overruns the deadline yields a failure
/// outcome; the remaining producers are unaffected. Subprocesses a producer
/// starts through [`process::output`] are killed at the deadline.
pub async fn run(handles: &[ProducerHandle], limits: JobBudget) -> Vec<RunOutcome> {
	let deadline = limits.deadline;
	let jobs: Vec<Job<ProducerResult>> = handles
		.iter()
		.map(|handle| {
			let handle = handle.clone();
			Job::new(handle.name().to_string(), move || process::with_deadline(deadline, || handle.invoke()))
		})
		.collect();

	let backstop = JobBudget::new(limits.concurrency, deadline + CLEANUP_GRACE);
	let outputs = run_bounded(jobs, backstop).await;

	handles
		.iter()
		.zip(outputs)
		.map(|(handle, output)| {
			let status = output.result.unwrap_or_else(|failure| match failure {
				JobFailure::TimedOut(_) => Err(ProducerError::TimedOut(deadline)),
				other => Err(other.into()),
			});
			let outcome = RunOutcome {
				producer: handle.name().to_string(),
				source: handle.source().clone(),
				elapsed: output.elapsed,
				status,
			};
			log_outcome(&outcome);
			outcome
		})
		.collect()
}

fn log_outcome(outcome: &RunOutcome) {
	match &outcome.status {
		Ok(facts) => tracing::debug!(
			producer = %outcome.producer,
			source = %outcome.source,
			facts = facts.len(),
			elapsed_ms = outcome.elapsed.as_millis() as u64,
			"producer.ok"
		),
		Err(err) => tracing::error!(
			producer = %outcome.producer,
			source = %outcome.source,
			error = %err,
			"fact producer failed"
		),
	}
}

impl From<JobFailure> for ProducerError {
	fn from(failure: JobFailure) -> Self {
		match failure {
			JobFailure::Panicked(msg) => Self::Panicked(msg),
			JobFailure::TimedOut(limit) => Self::TimedOut(limit),
			JobFailure::Cancelled => Self::Cancelled,
		}
	}
}
