//! Blocking job fan-out for one-shot collection runs.
//!
//! Jobs are plain closures executed on the tokio blocking pool. A semaphore
//! bounds how many run at once, each job races its own deadline, and a
//! panicking job is reported as a [`JobFailure`] instead of tearing down its
//! siblings. Results come back in submission order.

mod budget;
mod join_set;
mod panic;

pub use budget::JobBudget;
pub use join_set::{Job, JobFailure, JobOutput, run_bounded};
pub use panic::join_error_panic_message;
