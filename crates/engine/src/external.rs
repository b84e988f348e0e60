//! Out-of-process fact producers.
//!
//! An external producer is an executable in the facts directory. It is run
//! with no arguments and an empty stdin; on exit status 0 its stdout must
//! hold one mapping of fact name to value, either as a JSON object or as a
//! property-list dictionary (XML or binary).

use std::io::Cursor;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use crate::error::ProducerError;
use crate::process;
use crate::producer::{FactProducer, ProducerResult};
use crate::value::{FactMap, FactValue};

/// Executable producer at a fixed path.
#[derive(Debug, Clone)]
pub struct ExternalProducer {
	path: PathBuf,
}

impl ExternalProducer {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}
}

impl FactProducer for ExternalProducer {
	fn produce(&self) -> ProducerResult {
		let mut command = Command::new(&self.path);
		command.stdin(Stdio::null()).stdout(Stdio::piped()).stderr(Stdio::piped());
		let output = process::output(command)?;

		if !output.status.success() {
			return Err(ProducerError::Exit {
				status: output.status.to_string(),
				stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
			});
		}

		parse_output(&output.stdout)
	}
}

/// Parses producer stdout into facts. Blank output is zero facts.
pub fn parse_output(stdout: &[u8]) -> ProducerResult {
	let first = stdout.iter().position(|b| !b.is_ascii_whitespace());
	match first.map(|i| stdout[i]) {
		None => Ok(FactMap::new()),
		Some(b'{' | b'[') => parse_json(stdout),
		Some(_) => parse_plist(stdout),
	}
}

fn parse_json(stdout: &[u8]) -> ProducerResult {
	let value: serde_json::Value = serde_json::from_slice(stdout).map_err(|e| ProducerError::InvalidOutput(e.to_string()))?;
	let serde_json::Value::Object(obj) = value else {
		return Err(ProducerError::InvalidOutput("expected a JSON object".into()));
	};
	obj.into_iter().map(|(name, v)| convert(name, FactValue::try_from(v))).collect()
}

fn parse_plist(stdout: &[u8]) -> ProducerResult {
	let value = plist::Value::from_reader(Cursor::new(stdout)).map_err(|e| ProducerError::InvalidOutput(e.to_string()))?;
	let Some(dict) = value.into_dictionary() else {
		return Err(ProducerError::InvalidOutput("expected a property-list dictionary".into()));
	};
	dict.into_iter().map(|(name, v)| convert(name, FactValue::try_from(v))).collect()
}

fn convert(name: String, value: Result<FactValue, crate::value::UnsupportedValue>) -> Result<(String, FactValue), ProducerError> {
	match value {
		Ok(v) => Ok((name, v)),
		Err(err) => Err(ProducerError::InvalidOutput(format!("fact `{name}`: {err}"))),
	}
}
