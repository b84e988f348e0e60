//! Managed install directory lookup.
//!
//! The device-management agent records where it keeps its working files in
//! the `ManagedInstallDir` key of its `ManagedInstalls` preference domain.
//! The conditional document lives in that directory.

use std::path::{Path, PathBuf};

/// Preference domain file consulted by [`ManagedInstallsPlist`].
pub const MANAGED_INSTALLS_PLIST: &str = "/Library/Preferences/ManagedInstalls.plist";

/// Preference key naming the managed install directory.
pub const MANAGED_INSTALL_DIR_KEY: &str = "ManagedInstallDir";

/// The agent's own default when the preference is unset.
pub const DEFAULT_MANAGED_INSTALL_DIR: &str = "/Library/Managed Installs";

/// External source of the managed install directory preference.
pub trait PreferenceSource: Send + Sync {
	/// Returns the configured directory, or `None` if unset or unreadable.
	fn managed_install_dir(&self) -> Option<PathBuf>;
}

/// Reads the preference from the domain's property list on disk.
#[derive(Debug, Clone)]
pub struct ManagedInstallsPlist {
	path: PathBuf,
}

impl Default for ManagedInstallsPlist {
	fn default() -> Self {
		Self::new(MANAGED_INSTALLS_PLIST)
	}
}

impl ManagedInstallsPlist {
	/// Creates a source reading the property list at `path`.
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}
}

impl PreferenceSource for ManagedInstallsPlist {
	fn managed_install_dir(&self) -> Option<PathBuf> {
		let value = match plist::Value::from_file(&self.path) {
			Ok(value) => value,
			Err(err) => {
				tracing::debug!(path = %self.path.display(), error = %err, "prefs.unreadable");
				return None;
			}
		};
		let dir = value
			.as_dictionary()
			.and_then(|dict| dict.get(MANAGED_INSTALL_DIR_KEY))
			.and_then(plist::Value::as_string)
			.filter(|s| !s.is_empty())?;
		Some(PathBuf::from(dir))
	}
}

/// Fixed preference value, for overrides and tests.
#[derive(Debug, Clone, Default)]
pub struct StaticPreference(pub Option<PathBuf>);

impl PreferenceSource for StaticPreference {
	fn managed_install_dir(&self) -> Option<PathBuf> {
		self.0.clone()
	}
}

/// Resolves the managed install directory: explicit override, then the
/// preference, then the agent default.
pub fn resolve_managed_install_dir(override_dir: Option<&Path>, prefs: &dyn PreferenceSource) -> PathBuf {
	override_dir
		.map(Path::to_path_buf)
		.or_else(|| prefs.managed_install_dir())
		.unwrap_or_else(|| PathBuf::from(DEFAULT_MANAGED_INSTALL_DIR))
}
