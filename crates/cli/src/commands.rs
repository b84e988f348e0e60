//! Subcommand implementations.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, bail};
use hostfacts_engine::producer::builtin_producers;
use hostfacts_engine::{
	ApplyOutcome, EngineError, ManagedInstallsPlist, ProducerSource, RunOutcome, Settings, coordinator, registry, run_once,
};
use serde_json::{Map, Value, json};

use crate::cli::GlobalArgs;

/// Settings file used when `--config` is not given.
pub const CONFIG_ENV: &str = "HOSTFACTS_CONFIG";

/// How long to wait on producers still running past their deadline before
/// exiting anyway.
const SHUTDOWN_GRACE: Duration = Duration::from_millis(250);

/// Settings file, then command-line overrides.
pub fn settings(global: &GlobalArgs) -> anyhow::Result<Settings> {
	let path = global.config.clone().or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from));
	let mut settings = match &path {
		Some(path) => Settings::load(path)?,
		None => Settings::default(),
	};

	if let Some(dir) = &global.facts_dir {
		settings.facts_dir = Some(dir.clone());
	}
	if let Some(dir) = &global.managed_install_dir {
		settings.managed_install_dir = Some(dir.clone());
	}
	if let Some(jobs) = global.jobs {
		settings.jobs = jobs;
	}
	if let Some(timeout) = global.timeout {
		settings.timeout_secs = timeout;
	}
	settings.validate()?;
	Ok(settings)
}

/// Drives `fut` to completion on a single-threaded runtime. Producers run on
/// its blocking pool; the I/O driver reaps their subprocesses.
fn block_on<F: Future>(fut: F) -> anyhow::Result<F::Output> {
	let runtime = tokio::runtime::Builder::new_current_thread()
		.enable_all()
		.build()
		.context("failed to start runtime")?;
	let output = runtime.block_on(fut);
	// A producer past its deadline keeps its thread; do not wait for it.
	runtime.shutdown_timeout(SHUTDOWN_GRACE);
	Ok(output)
}

pub fn run(settings: &Settings) -> anyhow::Result<()> {
	let report = block_on(run_once(settings, &ManagedInstallsPlist::default()))??;

	let failed = report.failures().len();
	match report.apply {
		None => println!("{}", serde_json::to_string_pretty(&report.merged)?),
		Some(ApplyOutcome::Skipped) => tracing::warn!(path = %report.document.display(), "no facts collected; document left unchanged"),
		Some(ApplyOutcome::Written { facts, retained }) => {
			tracing::info!(path = %report.document.display(), facts, retained, failed, "conditional document updated");
		}
	}
	Ok(())
}

pub fn list(settings: &Settings) -> anyhow::Result<()> {
	let handles = registry::discover(settings.facts_dir.as_deref(), &settings.disabled)?;
	let descriptions: HashMap<_, _> = builtin_producers().map(|p| (p.name, p.description)).collect();

	let width = handles.iter().map(|h| h.name().len()).max().unwrap_or(0);
	for handle in &handles {
		let source = handle.source().to_string();
		let description = match handle.source() {
			ProducerSource::Builtin => descriptions.get(handle.name()).copied().unwrap_or(""),
			ProducerSource::External(_) => "",
		};
		println!("{:width$}  {source:8}  {description}", handle.name());
	}
	Ok(())
}

pub fn show(settings: &Settings, names: &[String]) -> anyhow::Result<()> {
	let handles = registry::discover(settings.facts_dir.as_deref(), &[])?;
	let unknown: Vec<_> = names.iter().filter(|n| !handles.iter().any(|h| h.name() == n.as_str())).collect();
	if !unknown.is_empty() {
		bail!("unknown producer(s): {}", unknown.iter().map(|n| n.as_str()).collect::<Vec<_>>().join(", "));
	}

	let selected: Vec<_> = handles.into_iter().filter(|h| names.iter().any(|n| n == h.name())).collect();
	let outcomes = block_on(coordinator::run(&selected, settings.limits()?))?;
	println!("{}", serde_json::to_string_pretty(&outcomes_json(&outcomes))?);
	Ok(())
}

/// `{ producer: { "facts": {...} } | { "error": "..." } }`, with external
/// producers keyed by name and source when they shadow a built-in.
fn outcomes_json(outcomes: &[RunOutcome]) -> Value {
	let mut out = Map::new();
	for outcome in outcomes {
		let mut key = outcome.producer.clone();
		if out.contains_key(&key) {
			key = format!("{} ({})", outcome.producer, outcome.source);
		}
		let entry = match &outcome.status {
			Ok(facts) => json!({ "facts": facts }),
			Err(err) => json!({ "error": err.to_string() }),
		};
		out.insert(key, entry);
	}
	Value::Object(out)
}

/// Exit status for an error: 1 when the document could not be written,
/// 2 for configuration and discovery problems.
pub fn exit_code(err: &anyhow::Error) -> u8 {
	match err.downcast_ref::<EngineError>() {
		Some(EngineError::Store(_)) => 1,
		_ => 2,
	}
}
