use std::num::NonZeroUsize;
use std::time::Duration;

/// Limits applied to one [`run_bounded`](crate::run_bounded) call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobBudget {
	/// Maximum number of jobs executing at the same time.
	pub concurrency: NonZeroUsize,
	/// Wall-clock limit for a single job, measured from when it starts.
	pub deadline: Duration,
}

impl JobBudget {
	pub const DEFAULT_CONCURRENCY: NonZeroUsize = NonZeroUsize::new(4).unwrap();
	pub const DEFAULT_DEADLINE: Duration = Duration::from_secs(60);

	/// Creates a budget of `concurrency` parallel jobs, each limited to
	/// `deadline`.
	pub fn new(concurrency: NonZeroUsize, deadline: Duration) -> Self {
		Self { concurrency, deadline }
	}
}

impl Default for JobBudget {
	fn default() -> Self {
		Self::new(Self::DEFAULT_CONCURRENCY, Self::DEFAULT_DEADLINE)
	}
}
