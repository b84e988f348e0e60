use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::JobBudget;
use crate::panic::join_error_panic_message;

type JobFn<T> = Box<dyn FnOnce() -> T + Send + 'static>;

/// One unit of blocking work, labelled for logs and reports.
pub struct Job<T> {
	label: String,
	run: JobFn<T>,
}

impl<T> Job<T> {
	/// Creates a job running `run`, reported under `label`.
	pub fn new(label: impl Into<String>, run: impl FnOnce() -> T + Send + 'static) -> Self {
		Self {
			label: label.into(),
			run: Box::new(run),
		}
	}
}

impl<T> fmt::Debug for Job<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Job").field("label", &self.label).finish_non_exhaustive()
	}
}

/// Why a job produced no value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobFailure {
	/// The closure panicked; carries the panic message.
	Panicked(String),
	/// The closure did not return within the budget deadline.
	TimedOut(Duration),
	/// The task was cancelled before it could report.
	Cancelled,
}

impl fmt::Display for JobFailure {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Panicked(msg) => write!(f, "panicked: {msg}"),
			Self::TimedOut(limit) => write!(f, "timed out after {}s", limit.as_secs_f64()),
			Self::Cancelled => f.write_str("cancelled"),
		}
	}
}

/// Result of one job, reported at its submission index.
#[derive(Debug)]
pub struct JobOutput<T> {
	pub label: String,
	pub elapsed: Duration,
	pub result: Result<T, JobFailure>,
}

/// Runs every job on the blocking pool under `budget`.
///
/// Jobs start in submission order as permits free up. The returned vector has
/// one entry per job, in submission order, whatever order they finished in.
///
/// A job that overruns its deadline is reported as [`JobFailure::TimedOut`]
/// and its permit is released; the blocking thread itself cannot be
/// interrupted and is left to finish on its own.
pub async fn run_bounded<T>(jobs: Vec<Job<T>>, budget: JobBudget) -> Vec<JobOutput<T>>
where
	T: Send + 'static,
{
	let semaphore = Arc::new(Semaphore::new(budget.concurrency.get()));
	let labels: Vec<String> = jobs.iter().map(|job| job.label.clone()).collect();
	let mut set = JoinSet::new();

	for (index, job) in jobs.into_iter().enumerate() {
		let permit = match Arc::clone(&semaphore).acquire_owned().await {
			Ok(permit) => permit,
			Err(_) => break,
		};
		let deadline = budget.deadline;
		set.spawn(async move {
			let output = execute(job, deadline).await;
			drop(permit);
			(index, output)
		});
	}

	let mut slots: Vec<Option<JobOutput<T>>> = labels.iter().map(|_| None).collect();
	while let Some(joined) = set.join_next().await {
		match joined {
			Ok((index, output)) => slots[index] = Some(output),
			Err(err) => tracing::error!(error = %err, "worker.run_bounded.lost_task"),
		}
	}

	slots
		.into_iter()
		.zip(labels)
		.map(|(slot, label)| {
			slot.unwrap_or(JobOutput {
				label,
				elapsed: Duration::ZERO,
				result: Err(JobFailure::Cancelled),
			})
		})
		.collect()
}

async fn execute<T>(job: Job<T>, deadline: Duration) -> JobOutput<T>
where
	T: Send + 'static,
{
	let Job { label, run } = job;
	tracing::trace!(job = %label, "worker.spawn_blocking");

	let started = Instant::now();
	let handle = tokio::task::spawn_blocking(run);
	let result = match tokio::time::timeout(deadline, handle).await {
		Ok(Ok(value)) => Ok(value),
		Ok(Err(err)) => Err(match join_error_panic_message(err) {
			Some(msg) => JobFailure::Panicked(msg),
			None => JobFailure::Cancelled,
		}),
		Err(_) => Err(JobFailure::TimedOut(deadline)),
	};

	JobOutput {
		label,
		elapsed: started.elapsed(),
		result,
	}
}

#[cfg(test)]
mod tests {
	use std::num::NonZeroUsize;
	use std::sync::atomic::{AtomicUsize, Ordering};

	use super::*;

	fn budget(concurrency: usize, deadline_ms: u64) -> JobBudget {
		JobBudget::new(NonZeroUsize::new(concurrency).unwrap(), Duration::from_millis(deadline_ms))
	}

	#[tokio::test]
	async fn results_follow_submission_order() {
		let jobs = vec![
			Job::new("slow", || {
				std::thread::sleep(Duration::from_millis(50));
				1
			}),
			Job::new("fast", || 2),
			Job::new("medium", || {
				std::thread::sleep(Duration::from_millis(10));
				3
			}),
		];

		let out = run_bounded(jobs, budget(3, 5_000)).await;
		let labels: Vec<_> = out.iter().map(|o| o.label.as_str()).collect();
		let values: Vec<_> = out.iter().map(|o| o.result.clone().unwrap()).collect();
		assert_eq!(labels, ["slow", "fast", "medium"]);
		assert_eq!(values, [1, 2, 3]);
	}

	#[tokio::test]
	async fn panic_is_contained_to_its_job() {
		let jobs = vec![
			Job::new("ok-before", || "a"),
			Job::new("boom", || panic!("kaboom")),
			Job::new("ok-after", || "c"),
		];

		let out = run_bounded(jobs, budget(2, 5_000)).await;
		assert_eq!(out[0].result, Ok("a"));
		assert_eq!(out[1].result, Err(JobFailure::Panicked("kaboom".to_string())));
		assert_eq!(out[2].result, Ok("c"));
	}

	#[tokio::test]
	async fn overrunning_job_times_out() {
		let jobs = vec![
			Job::new("hang", || {
				std::thread::sleep(Duration::from_millis(500));
			}),
			Job::new("quick", || {}),
		];

		let out = run_bounded(jobs, budget(2, 50)).await;
		assert_eq!(out[0].result, Err(JobFailure::TimedOut(Duration::from_millis(50))));
		assert_eq!(out[1].result, Ok(()));
	}

	#[tokio::test]
	async fn concurrency_never_exceeds_budget() {
		let active = Arc::new(AtomicUsize::new(0));
		let peak = Arc::new(AtomicUsize::new(0));
		let jobs = (0..8)
			.map(|i| {
				let active = Arc::clone(&active);
				let peak = Arc::clone(&peak);
				Job::new(format!("job-{i}"), move || {
					let now = active.fetch_add(1, Ordering::SeqCst) + 1;
					peak.fetch_max(now, Ordering::SeqCst);
					std::thread::sleep(Duration::from_millis(10));
					active.fetch_sub(1, Ordering::SeqCst);
				})
			})
			.collect();

		let out = run_bounded(jobs, budget(2, 5_000)).await;
		assert_eq!(out.len(), 8);
		assert!(peak.load(Ordering::SeqCst) <= 2);
	}

	#[tokio::test]
	async fn empty_input_yields_empty_output() {
		let out = run_bounded(Vec::<Job<()>>::new(), JobBudget::default()).await;
		assert!(out.is_empty());
	}

	#[test]
	fn failure_messages_are_readable() {
		assert_eq!(JobFailure::Panicked("x".into()).to_string(), "panicked: x");
		assert_eq!(JobFailure::TimedOut(Duration::from_secs(2)).to_string(), "timed out after 2s");
		assert_eq!(JobFailure::Cancelled.to_string(), "cancelled");
	}
}
