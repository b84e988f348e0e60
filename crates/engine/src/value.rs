//! Fact values and their conversions to and from wire formats.

use std::collections::BTreeMap;

use serde::Serialize;
use thiserror::Error;

/// Fact name to value, ordered by name.
pub type FactMap = BTreeMap<String, FactValue>;

/// String record, as used by [`FactValue::Map`] and [`FactValue::Table`].
pub type Record = BTreeMap<String, String>;

/// A single fact value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FactValue {
	/// Absent value. Never persisted; the normalizer turns it into `""`.
	Null,
	Bool(bool),
	String(String),
	List(Vec<String>),
	Map(Record),
	/// List of string records, e.g. one row per installed system extension.
	Table(Vec<Record>),
}

/// Returned when a wire value has no [`FactValue`] counterpart.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsupported {kind} value")]
pub struct UnsupportedValue {
	pub kind: &'static str,
}

impl FactValue {
	/// Returns true for [`FactValue::Null`].
	pub fn is_null(&self) -> bool {
		matches!(self, Self::Null)
	}

	/// Converts to a property-list value for persistence.
	pub fn to_plist(&self) -> plist::Value {
		match self {
			Self::Null => plist::Value::String(String::new()),
			Self::Bool(b) => plist::Value::Boolean(*b),
			Self::String(s) => plist::Value::String(s.clone()),
			Self::List(items) => plist::Value::Array(items.iter().cloned().map(plist::Value::String).collect()),
			Self::Map(record) => plist::Value::Dictionary(record_to_dict(record)),
			Self::Table(rows) => plist::Value::Array(rows.iter().map(|r| plist::Value::Dictionary(record_to_dict(r))).collect()),
		}
	}
}

fn record_to_dict(record: &Record) -> plist::Dictionary {
	record
		.iter()
		.map(|(k, v)| (k.clone(), plist::Value::String(v.clone())))
		.collect()
}

impl From<bool> for FactValue {
	fn from(value: bool) -> Self {
		Self::Bool(value)
	}
}

impl From<String> for FactValue {
	fn from(value: String) -> Self {
		Self::String(value)
	}
}

impl From<&str> for FactValue {
	fn from(value: &str) -> Self {
		Self::String(value.to_string())
	}
}

impl From<Vec<String>> for FactValue {
	fn from(value: Vec<String>) -> Self {
		Self::List(value)
	}
}

impl From<Record> for FactValue {
	fn from(value: Record) -> Self {
		Self::Map(value)
	}
}

impl From<Vec<Record>> for FactValue {
	fn from(value: Vec<Record>) -> Self {
		Self::Table(value)
	}
}

impl<T: Into<FactValue>> From<Option<T>> for FactValue {
	fn from(value: Option<T>) -> Self {
		value.map_or(Self::Null, Into::into)
	}
}

impl TryFrom<plist::Value> for FactValue {
	type Error = UnsupportedValue;

	fn try_from(value: plist::Value) -> Result<Self, Self::Error> {
		match value {
			plist::Value::Boolean(b) => Ok(Self::Bool(b)),
			plist::Value::String(s) => Ok(Self::String(s)),
			plist::Value::Dictionary(dict) => plist_record(dict).map(Self::Map),
			plist::Value::Array(items) => plist_array(items),
			plist::Value::Integer(_) | plist::Value::Real(_) => Err(UnsupportedValue { kind: "number" }),
			plist::Value::Date(_) => Err(UnsupportedValue { kind: "date" }),
			plist::Value::Data(_) => Err(UnsupportedValue { kind: "data" }),
			_ => Err(UnsupportedValue { kind: "plist" }),
		}
	}
}

fn plist_record(dict: plist::Dictionary) -> Result<Record, UnsupportedValue> {
	dict.into_iter()
		.map(|(k, v)| match v {
			plist::Value::String(s) => Ok((k, s)),
			_ => Err(UnsupportedValue { kind: "non-string dictionary" }),
		})
		.collect()
}

fn plist_array(items: Vec<plist::Value>) -> Result<FactValue, UnsupportedValue> {
	if items.iter().all(|v| matches!(v, plist::Value::Dictionary(_))) && !items.is_empty() {
		let rows = items
			.into_iter()
			.filter_map(plist::Value::into_dictionary)
			.map(plist_record)
			.collect::<Result<_, _>>()?;
		return Ok(FactValue::Table(rows));
	}
	items
		.into_iter()
		.map(|v| match v {
			plist::Value::String(s) => Ok(s),
			_ => Err(UnsupportedValue { kind: "mixed array" }),
		})
		.collect::<Result<_, _>>()
		.map(FactValue::List)
}

impl TryFrom<serde_json::Value> for FactValue {
	type Error = UnsupportedValue;

	fn try_from(value: serde_json::Value) -> Result<Self, Self::Error> {
		use serde_json::Value;

		match value {
			Value::Null => Ok(Self::Null),
			Value::Bool(b) => Ok(Self::Bool(b)),
			Value::String(s) => Ok(Self::String(s)),
			Value::Number(_) => Err(UnsupportedValue { kind: "number" }),
			Value::Object(obj) => json_record(obj).map(Self::Map),
			Value::Array(items) => {
				if !items.is_empty() && items.iter().all(Value::is_object) {
					let rows = items
						.into_iter()
						.filter_map(|v| match v {
							Value::Object(obj) => Some(json_record(obj)),
							_ => None,
						})
						.collect::<Result<_, _>>()?;
					return Ok(Self::Table(rows));
				}
				items
					.into_iter()
					.map(|v| match v {
						Value::String(s) => Ok(s),
						_ => Err(UnsupportedValue { kind: "mixed array" }),
					})
					.collect::<Result<_, _>>()
					.map(Self::List)
			}
		}
	}
}

fn json_record(obj: serde_json::Map<String, serde_json::Value>) -> Result<Record, UnsupportedValue> {
	obj.into_iter()
		.map(|(k, v)| match v {
			serde_json::Value::String(s) => Ok((k, s)),
			_ => Err(UnsupportedValue { kind: "non-string object" }),
		})
		.collect()
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;
	use serde_json::json;

	use super::*;

	fn record(pairs: &[(&str, &str)]) -> Record {
		pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
	}

	#[test]
	fn null_persists_as_empty_string() {
		assert_eq!(FactValue::Null.to_plist(), plist::Value::String(String::new()));
	}

	#[test]
	fn table_persists_as_array_of_dictionaries() {
		let value = FactValue::Table(vec![record(&[("bundleID", "com.example.ext")])]);
		let plist::Value::Array(rows) = value.to_plist() else {
			panic!("expected array");
		};
		let dict = rows[0].as_dictionary().unwrap();
		assert_eq!(dict.get("bundleID").and_then(plist::Value::as_string), Some("com.example.ext"));
	}

	#[test]
	fn json_values_convert() {
		assert_eq!(FactValue::try_from(json!(null)), Ok(FactValue::Null));
		assert_eq!(FactValue::try_from(json!(true)), Ok(FactValue::Bool(true)));
		assert_eq!(FactValue::try_from(json!(["a", "b"])), Ok(FactValue::List(vec!["a".into(), "b".into()])));
		assert_eq!(FactValue::try_from(json!({"k": "v"})), Ok(FactValue::Map(record(&[("k", "v")]))));
		assert_eq!(
			FactValue::try_from(json!([{"k": "v"}, {"k": "w"}])),
			Ok(FactValue::Table(vec![record(&[("k", "v")]), record(&[("k", "w")])]))
		);
	}

	#[test]
	fn empty_json_array_is_an_empty_list() {
		assert_eq!(FactValue::try_from(json!([])), Ok(FactValue::List(Vec::new())));
	}

	#[test]
	fn numbers_are_rejected() {
		assert_eq!(FactValue::try_from(json!(3)), Err(UnsupportedValue { kind: "number" }));
		assert_eq!(FactValue::try_from(plist::Value::Integer(3_i64.into())), Err(UnsupportedValue { kind: "number" }));
	}

	#[test]
	fn mixed_arrays_are_rejected() {
		assert!(FactValue::try_from(json!(["a", 1])).is_err());
		assert!(FactValue::try_from(plist::Value::Array(vec![plist::Value::String("a".into()), plist::Value::Boolean(true)])).is_err());
	}

	#[test]
	fn option_maps_none_to_null() {
		assert_eq!(FactValue::from(None::<String>), FactValue::Null);
		assert_eq!(FactValue::from(Some("alice")), FactValue::String("alice".into()));
	}

	#[test]
	fn serializes_untagged() {
		let value = FactValue::List(vec!["x".into()]);
		assert_eq!(serde_json::to_value(&value).unwrap(), json!(["x"]));
		assert_eq!(serde_json::to_value(FactValue::Null).unwrap(), json!(null));
	}
}
