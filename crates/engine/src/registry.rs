//! Producer discovery.
//!
//! The producer set is the linked built-ins plus every executable in the
//! facts directory. Handles come back sorted by `(name, source)` so that
//! last-write-wins between producers emitting the same fact does not depend
//! on directory enumeration order. Built-ins sort before externals of the
//! same name, letting an external producer override a built-in.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use std::sync::Arc;

use crate::error::{EngineError, Result};
use crate::external::ExternalProducer;
use crate::producer::{ProducerHandle, ProducerSource, builtin_producers};

/// Discovers all producers, dropping the names listed in `disabled`.
///
/// A missing `facts_dir` contributes nothing; an unreadable one is fatal.
pub fn discover(facts_dir: Option<&Path>, disabled: &[String]) -> Result<Vec<ProducerHandle>> {
	let mut handles = builtin_handles();
	if let Some(dir) = facts_dir {
		handles.extend(external_handles(dir)?);
	}

	handles.retain(|h| {
		let keep = !disabled.iter().any(|d| d == h.name());
		if !keep {
			tracing::debug!(producer = h.name(), "registry.disabled");
		}
		keep
	});
	sort_handles(&mut handles);

	tracing::debug!(count = handles.len(), "registry.discovered");
	Ok(handles)
}

/// Handles for every linked built-in producer, unsorted.
pub fn builtin_handles() -> Vec<ProducerHandle> {
	builtin_producers()
		.map(|p| ProducerHandle::new(p.name, ProducerSource::Builtin, Arc::new(p)))
		.collect()
}

/// Handles for the executables in `dir`, unsorted.
pub fn external_handles(dir: &Path) -> Result<Vec<ProducerHandle>> {
	let entries = match fs::read_dir(dir) {
		Ok(entries) => entries,
		Err(err) if err.kind() == ErrorKind::NotFound => {
			tracing::debug!(dir = %dir.display(), "registry.facts_dir_missing");
			return Ok(Vec::new());
		}
		Err(error) => {
			return Err(EngineError::Discovery {
				path: dir.to_path_buf(),
				error,
			});
		}
	};

	let mut handles = Vec::new();
	for entry in entries {
		let entry = match entry {
			Ok(entry) => entry,
			Err(err) => {
				tracing::warn!(dir = %dir.display(), error = %err, "registry.entry_unreadable");
				continue;
			}
		};
		let path = entry.path();
		let Some(name) = producer_name(&path) else {
			continue;
		};
		match fs::metadata(&path) {
			Ok(meta) if meta.is_file() && is_executable(&meta) => {
				handles.push(ProducerHandle::new(
					name,
					ProducerSource::External(path.clone()),
					Arc::new(ExternalProducer::new(path)),
				));
			}
			Ok(_) => tracing::debug!(path = %path.display(), "registry.skip_not_executable"),
			Err(err) => tracing::warn!(path = %path.display(), error = %err, "registry.skip_unreadable"),
		}
	}
	Ok(handles)
}

/// Producer name for a facts-directory entry, or `None` if the entry is
/// hidden or an index file (leading `.` or `_`).
fn producer_name(path: &Path) -> Option<String> {
	let file_name = path.file_name()?.to_str()?;
	if file_name.starts_with('.') || file_name.starts_with('_') {
		return None;
	}
	let stem = path.file_stem()?.to_str()?;
	Some(stem.to_string())
}

#[cfg(unix)]
fn is_executable(meta: &fs::Metadata) -> bool {
	use std::os::unix::fs::PermissionsExt;
	meta.permissions().mode() & 0o111 != 0
}

#[cfg(not(unix))]
fn is_executable(_meta: &fs::Metadata) -> bool {
	true
}

fn sort_handles(handles: &mut [ProducerHandle]) {
	handles.sort_by(|a, b| a.name().cmp(b.name()).then_with(|| a.source().cmp(b.source())));
}

#[cfg(test)]
mod tests {
	use std::path::PathBuf;

	use rstest::rstest;

	use super::*;
	use crate::producer::FactProducer;
	use crate::value::FactMap;

	struct Nothing;

	impl FactProducer for Nothing {
		fn produce(&self) -> crate::producer::ProducerResult {
			Ok(FactMap::new())
		}
	}

	#[rstest]
	#[case("sip_status.sh", Some("sip_status"))]
	#[case("top_user", Some("top_user"))]
	#[case("__init__.py", None)]
	#[case("_index", None)]
	#[case(".DS_Store", None)]
	fn names_follow_convention(#[case] file: &str, #[case] expected: Option<&str>) {
		let path = PathBuf::from("/facts").join(file);
		assert_eq!(producer_name(&path).as_deref(), expected);
	}

	#[test]
	fn missing_directory_is_empty() {
		let handles = external_handles(Path::new("/nonexistent/hostfacts/facts")).unwrap();
		assert!(handles.is_empty());
	}

	#[test]
	fn file_in_place_of_directory_is_fatal() {
		let dir = tempfile::tempdir().unwrap();
		let file = dir.path().join("facts");
		fs::write(&file, "").unwrap();
		assert!(matches!(external_handles(&file), Err(EngineError::Discovery { .. })));
	}

	#[cfg(unix)]
	#[test]
	fn only_executables_are_registered() {
		use crate::test_support::write_script;

		let dir = tempfile::tempdir().unwrap();
		write_script(dir.path(), "zeta.sh", "#!/bin/sh\necho '{}'\n");
		write_script(dir.path(), "alpha", "#!/bin/sh\necho '{}'\n");
		write_script(dir.path(), "__init__.py", "");
		fs::write(dir.path().join("README"), "not a producer").unwrap();

		let mut handles = external_handles(dir.path()).unwrap();
		sort_handles(&mut handles);
		let names: Vec<_> = handles.iter().map(|h| h.name()).collect();
		assert_eq!(names, ["alpha", "zeta"]);
		assert!(matches!(handles[0].source(), ProducerSource::External(_)));
	}

	#[test]
	fn sorting_is_by_name_then_source() {
		let mut handles = vec![
			ProducerHandle::new("b", ProducerSource::Builtin, Arc::new(Nothing)),
			ProducerHandle::new("a", ProducerSource::External(PathBuf::from("/f/a")), Arc::new(Nothing)),
			ProducerHandle::new("a", ProducerSource::Builtin, Arc::new(Nothing)),
		];
		sort_handles(&mut handles);
		let order: Vec<_> = handles.iter().map(|h| (h.name(), h.source().clone())).collect();
		assert_eq!(
			order,
			[
				("a", ProducerSource::Builtin),
				("a", ProducerSource::External(PathBuf::from("/f/a"))),
				("b", ProducerSource::Builtin),
			]
		);
	}

	#[test]
	fn disabled_producers_are_dropped() {
		let dir = tempfile::tempdir().unwrap();
		#[cfg(unix)]
		crate::test_support::write_script(dir.path(), "custom", "#!/bin/sh\necho '{}'\n");

		let handles = discover(Some(dir.path()), &["custom".to_string()]).unwrap();
		assert!(handles.iter().all(|h| h.name() != "custom"));
	}
}
