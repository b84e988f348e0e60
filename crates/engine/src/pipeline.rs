//! One collection run: discover, execute, merge, persist.

use std::path::PathBuf;

use crate::config::Settings;
use crate::coordinator::{self, RunOutcome};
use crate::error::Result;
use crate::normalize;
use crate::prefs::{PreferenceSource, resolve_managed_install_dir};
use crate::registry;
use crate::store::{ApplyOutcome, StateStore};
use crate::value::FactMap;

/// Everything a run produced.
#[derive(Debug)]
pub struct RunReport {
	/// One entry per producer, in invocation order.
	pub outcomes: Vec<RunOutcome>,
	/// Merged facts, with nulls already replaced.
	pub merged: FactMap,
	/// Conditional document the run targeted.
	pub document: PathBuf,
	/// `None` for a dry run.
	pub apply: Option<ApplyOutcome>,
}

impl RunReport {
	/// Returns the failed outcomes, in invocation order.
	pub fn failures(&self) -> Vec<&RunOutcome> {
		normalize::failures(&self.outcomes)
	}
}

/// Runs every enabled producer and writes the merged facts into the
/// conditional document.
///
/// Producer failures are recorded in the report. Only configuration,
/// discovery, and document write errors are returned as `Err`.
pub async fn run_once(settings: &Settings, prefs: &dyn PreferenceSource) -> Result<RunReport> {
	let limits = settings.limits()?;
	let handles = registry::discover(settings.facts_dir.as_deref(), &settings.disabled)?;
	tracing::info!(producers = handles.len(), jobs = limits.concurrency.get(), "run.start");

	let outcomes = coordinator::run(&handles, limits).await;
	let merged = normalize::merge(&outcomes);
	let failed = outcomes.iter().filter(|o| !o.is_success()).count();

	let document = resolve_managed_install_dir(settings.managed_install_dir.as_deref(), prefs).join(&settings.document_name);

	let apply = if settings.dry_run {
		tracing::info!(path = %document.display(), "run.dry_run");
		None
	} else {
		Some(StateStore::new(&document).apply(&merged)?)
	};

	tracing::info!(facts = merged.len(), failed, "run.finished");
	Ok(RunReport {
		outcomes,
		merged,
		document,
		apply,
	})
}
