//! Installed system extensions as a list of records.
//!
//! Each record carries `teamID`, `bundleID`, `version`, `name` and `state`,
//! e.g. for a predicate such as
//! `SUBQUERY(system_extensions, $s, $s.state BEGINSWITH 'activated').@count > 0`.

use hostfacts_engine::{FactMap, FactValue, ProducerError, ProducerResult, Record, fact_producer};
use regex::Regex;

use crate::command::stdout_of;

fact_producer!(
	system_extensions,
	{ description: "System extensions reported by systemextensionsctl" },
	produce: system_extensions
);

/// One extension row: enabled/active markers, then tab-separated columns.
const EXTENSION_LINE: &str =
	r"(?m)^(\t|\*\t\*|\t\*)\t(?P<teamID>\S*)\t(?P<bundleID>\S*)\s*\((?P<version>\S*)\)\t(?P<name>.*)\b\t\[(?P<state>.*)\]";

const FIELDS: [&str; 5] = ["teamID", "bundleID", "version", "name", "state"];

fn system_extensions() -> ProducerResult {
	let listing = match stdout_of("/usr/bin/systemextensionsctl", &["list"]) {
		Ok(listing) => listing,
		Err(err @ ProducerError::Spawn { .. }) => {
			tracing::debug!(error = %err, "system_extensions.unavailable");
			String::new()
		}
		Err(err) => return Err(err),
	};
	Ok(FactMap::from([(
		"system_extensions".to_string(),
		FactValue::Table(parse_listing(&listing)?),
	)]))
}

fn parse_listing(listing: &str) -> Result<Vec<Record>, ProducerError> {
	let pattern = Regex::new(EXTENSION_LINE).map_err(|e| ProducerError::failed(e.to_string()))?;
	let records = pattern
		.captures_iter(listing)
		.map(|caps| {
			FIELDS
				.iter()
				.map(|field| (field.to_string(), caps.name(field).map_or("", |m| m.as_str()).to_string()))
				.collect()
		})
		.collect();
	Ok(records)
}
