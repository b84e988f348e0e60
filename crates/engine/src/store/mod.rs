//! Persistence of the conditional document.
//!
//! A run reads the prior document, overlays the merged facts, and replaces
//! the file in one rename. Keys the run did not produce are carried over
//! untouched, including values of types producers never emit.
//!
//! Nothing here guards against two runs racing on the same document; the
//! later rename wins.

use std::fs;
use std::io::{self, Cursor, ErrorKind, Write};
use std::path::{Path, PathBuf};

use plist::{Dictionary, Value};
use tempfile::NamedTempFile;

use crate::error::StoreError;
use crate::value::FactMap;

/// State of the document before a run, as found by [`StateStore::load`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PriorState {
	Loaded,
	Missing,
	/// The file exists but could not be read or is not a dictionary.
	Unreadable(String),
}

/// Result of [`StateStore::apply`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
	/// No facts; the document was not touched.
	Skipped,
	Written {
		/// Facts written by this run.
		facts: usize,
		/// Prior keys carried over unchanged.
		retained: usize,
	},
}

/// The conditional document at one path.
#[derive(Debug, Clone)]
pub struct StateStore {
	path: PathBuf,
}

impl StateStore {
	/// Creates a store for the document at `path`. Nothing is read until
	/// [`load`](Self::load) or [`apply`](Self::apply).
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	/// Reads the prior document. Never fails: anything short of a readable
	/// dictionary yields an empty one.
	pub fn load(&self) -> (Dictionary, PriorState) {
		let bytes = match fs::read(&self.path) {
			Ok(bytes) => bytes,
			Err(err) if err.kind() == ErrorKind::NotFound => return (Dictionary::new(), PriorState::Missing),
			Err(err) => return self.unreadable(err.to_string()),
		};
		match Value::from_reader(Cursor::new(bytes)) {
			Ok(Value::Dictionary(dict)) => (dict, PriorState::Loaded),
			Ok(_) => self.unreadable("root is not a dictionary".to_string()),
			Err(err) => self.unreadable(err.to_string()),
		}
	}

	fn unreadable(&self, reason: String) -> (Dictionary, PriorState) {
		tracing::warn!(path = %self.path.display(), reason = %reason, "store.prior_unreadable");
		(Dictionary::new(), PriorState::Unreadable(reason))
	}

	/// Overlays `facts` onto the prior document and writes it back.
	///
	/// An empty `facts` skips the write so that a run which found nothing
	/// cannot erase a valid document.
	pub fn apply(&self, facts: &FactMap) -> Result<ApplyOutcome, StoreError> {
		if facts.is_empty() {
			tracing::info!(path = %self.path.display(), "store.skip_empty");
			return Ok(ApplyOutcome::Skipped);
		}

		let (mut doc, prior) = self.load();
		let retained = doc.keys().filter(|key| !facts.contains_key(key.as_str())).count();
		for (name, value) in facts {
			doc.insert(name.clone(), value.to_plist());
		}

		self.write(doc)?;
		tracing::info!(
			path = %self.path.display(),
			?prior,
			facts = facts.len(),
			retained,
			"store.written"
		);
		Ok(ApplyOutcome::Written {
			facts: facts.len(),
			retained,
		})
	}

	fn write(&self, doc: Dictionary) -> Result<(), StoreError> {
		let dir = match self.path.parent() {
			Some(dir) if !dir.as_os_str().is_empty() => dir,
			_ => Path::new("."),
		};
		let stage = |error: io::Error| StoreError::Stage {
			path: self.path.clone(),
			error,
		};

		let mut tmp = NamedTempFile::new_in(dir).map_err(stage)?;
		Value::Dictionary(doc)
			.to_writer_xml(tmp.as_file_mut())
			.map_err(|error| StoreError::Serialize {
				path: self.path.clone(),
				error,
			})?;
		tmp.as_file_mut().flush().map_err(stage)?;
		if let Some(perms) = self.permissions() {
			tmp.as_file().set_permissions(perms).map_err(stage)?;
		}
		tmp.as_file().sync_all().map_err(stage)?;

		tmp.persist(&self.path).map_err(|err| StoreError::Persist {
			path: self.path.clone(),
			error: err.error,
		})?;
		Ok(())
	}

	/// Permissions of the existing document, or 0644 for a new one.
	fn permissions(&self) -> Option<fs::Permissions> {
		fs::metadata(&self.path).ok().map(|meta| meta.permissions()).or_else(default_permissions)
	}
}

#[cfg(unix)]
fn default_permissions() -> Option<fs::Permissions> {
	use std::os::unix::fs::PermissionsExt;
	Some(fs::Permissions::from_mode(0o644))
}

#[cfg(not(unix))]
fn default_permissions() -> Option<fs::Permissions> {
	None
}
