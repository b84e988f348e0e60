//! Merging of producer outcomes into one fact mapping.

use crate::coordinator::RunOutcome;
use crate::value::{FactMap, FactValue};

/// Merges successful outcomes in sequence order.
///
/// Later outcomes overwrite earlier ones on equal fact names. Null values
/// are stored as empty strings. Failed outcomes contribute nothing.
pub fn merge(outcomes: &[RunOutcome]) -> FactMap {
	let mut merged = FactMap::new();
	for outcome in outcomes {
		let Some(facts) = outcome.facts() else {
			continue;
		};
		for (name, value) in facts {
			let value = match value {
				FactValue::Null => FactValue::String(String::new()),
				other => other.clone(),
			};
			if merged.insert(name.clone(), value).is_some() {
				tracing::trace!(fact = %name, producer = %outcome.producer, "normalize.overwrite");
			}
		}
	}
	merged
}

/// Failed outcomes, in sequence order.
pub fn failures(outcomes: &[RunOutcome]) -> Vec<&RunOutcome> {
	outcomes.iter().filter(|o| !o.is_success()).collect()
}
