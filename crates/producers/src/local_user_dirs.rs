//! Home directories present under `/Users`.

use std::fs;
use std::path::Path;

use hostfacts_engine::{FactMap, FactValue, ProducerError, ProducerResult, fact_producer};

const USERS_DIR: &str = "/Users";

/// Entries of `/Users` that are not somebody's home.
const SKIP: &[&str] = &["Deleted Users", "Shared", "admin"];

fact_producer!(
	local_user_dirs,
	{ description: "User home directories under /Users" },
	produce: local_user_dirs
);

fn local_user_dirs() -> ProducerResult {
	let dirs = user_dirs(Path::new(USERS_DIR))?;
	Ok(FactMap::from([("local_user_dirs".to_string(), FactValue::List(dirs))]))
}

fn user_dirs(root: &Path) -> Result<Vec<String>, ProducerError> {
	let mut dirs = Vec::new();
	for entry in fs::read_dir(root)? {
		let name = entry?.file_name().to_string_lossy().into_owned();
		if name.starts_with('.') || SKIP.contains(&name.as_str()) {
			continue;
		}
		dirs.push(name);
	}
	dirs.sort();
	Ok(dirs)
}
