//! Account signed in to the CrashPlan backup client.

use std::fs;
use std::path::Path;

use hostfacts_engine::{FactMap, FactValue, ProducerResult, fact_producer};

const IDENTITY_FILE: &str = "/Library/Application Support/CrashPlan/.identity";

fact_producer!(
	crashplan_username,
	{ description: "User name from CrashPlan's identity file" },
	produce: crashplan_username
);

fn crashplan_username() -> ProducerResult {
	let username = identity_username(Path::new(IDENTITY_FILE)).unwrap_or_default();
	Ok(FactMap::from([("crashplan_username".to_string(), FactValue::String(username))]))
}

/// The `username=` entry of an identity file, if the file is readable.
fn identity_username(path: &Path) -> Option<String> {
	let text = fs::read_to_string(path).ok()?;
	text.lines()
		.find_map(|line| line.strip_prefix("username="))
		.map(|name| name.trim_end().to_string())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn reads_username_line() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join(".identity");
		fs::write(&path, "guid=8123\nusername=jdoe@example.com  \nserver=central\n").unwrap();
		assert_eq!(identity_username(&path).as_deref(), Some("jdoe@example.com"));
	}

	#[test]
	fn missing_file_or_line_is_none() {
		let dir = tempfile::tempdir().unwrap();
		assert_eq!(identity_username(&dir.path().join("absent")), None);

		let path = dir.path().join(".identity");
		fs::write(&path, "guid=8123\n").unwrap();
		assert_eq!(identity_username(&path), None);
	}
}
