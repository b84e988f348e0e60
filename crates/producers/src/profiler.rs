//! The hardware and ethernet sections of `system_profiler -xml`.

use std::io::Cursor;

use hostfacts_engine::ProducerError;
use plist::Value;

use crate::command::stdout_of;

const SYSTEM_PROFILER: &str = "/usr/sbin/system_profiler";

/// PCI vendor id of Parallels' virtual ethernet adapter.
pub(crate) const PARALLELS_VENDOR_ID: &str = "0x1ab8";

/// Fields of the report that identify a hypervisor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct HardwareProfile {
	pub boot_rom_version: Option<String>,
	pub ethernet_vendor_id: Option<String>,
}

/// Raw `system_profiler -xml SPEthernetDataType SPHardwareDataType` output.
pub(crate) fn report() -> Result<String, ProducerError> {
	stdout_of(SYSTEM_PROFILER, &["-xml", "SPEthernetDataType", "SPHardwareDataType"])
}

/// Reads the first ethernet and hardware items of a report. `None` if the
/// report is not a plist array.
pub(crate) fn parse(xml: &[u8]) -> Option<HardwareProfile> {
	let Ok(Value::Array(sections)) = Value::from_reader(Cursor::new(xml)) else {
		return None;
	};
	Some(HardwareProfile {
		boot_rom_version: first_item_string(sections.get(1), "boot_rom_version"),
		ethernet_vendor_id: first_item_string(sections.first(), "spethernet_vendor-id"),
	})
}

/// `section["_items"][0][key]` as a string.
fn first_item_string(section: Option<&Value>, key: &str) -> Option<String> {
	section?
		.as_dictionary()?
		.get("_items")?
		.as_array()?
		.first()?
		.as_dictionary()?
		.get(key)?
		.as_string()
		.map(str::to_string)
}

/// Report with one ethernet item and one hardware item, as the profiler
/// prints them.
#[cfg(test)]
pub(crate) fn sample_report(vendor_id: &str, boot_rom: &str) -> Vec<u8> {
	use plist::Dictionary;

	fn section(key: &str, value: &str) -> Value {
		let mut item = Dictionary::new();
		item.insert(key.to_string(), Value::String(value.to_string()));
		let mut section = Dictionary::new();
		section.insert("_items".to_string(), Value::Array(vec![Value::Dictionary(item)]));
		Value::Dictionary(section)
	}

	let mut out = Vec::new();
	Value::Array(vec![
		section("spethernet_vendor-id", vendor_id),
		section("boot_rom_version", boot_rom),
	])
	.to_writer_xml(&mut out)
	.unwrap();
	out
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::*;

	#[test]
	fn fields_are_read_from_first_items() {
		assert_eq!(
			parse(&sample_report("0x1ab8", "10151.1.1")),
			Some(HardwareProfile {
				boot_rom_version: Some("10151.1.1".into()),
				ethernet_vendor_id: Some("0x1ab8".into()),
			})
		);
	}

	#[test]
	fn empty_sections_have_no_fields() {
		let mut out = Vec::new();
		Value::Array(Vec::new()).to_writer_xml(&mut out).unwrap();
		assert_eq!(parse(&out), Some(HardwareProfile::default()));
	}

	#[test]
	fn non_array_report_is_rejected() {
		assert_eq!(parse(b"<html/>"), None);
		assert_eq!(parse(b""), None);
	}
}
