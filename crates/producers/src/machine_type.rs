//! Hypervisor vendor as seen by `system_profiler`, without consulting the
//! kernel: `vmware`, `parallels` or `physical`.

use hostfacts_engine::{FactMap, FactValue, ProducerError, ProducerResult, fact_producer};

use crate::profiler::{self, HardwareProfile, PARALLELS_VENDOR_ID};

fact_producer!(
	machine_type,
	{ description: "vmware, parallels or physical from system_profiler; Unknown without it" },
	produce: machine_type
);

fn machine_type() -> ProducerResult {
	let kind = match profiler::report() {
		Ok(xml) => {
			let profile = profiler::parse(xml.as_bytes())
				.ok_or_else(|| ProducerError::InvalidOutput("system_profiler report is not a plist array".into()))?;
			classify(&profile)?
		}
		Err(err @ ProducerError::Spawn { .. }) => {
			tracing::debug!(error = %err, "machine_type.profiler_unavailable");
			"Unknown"
		}
		Err(err) => return Err(err),
	};
	Ok(FactMap::from([("machine_type".to_string(), FactValue::from(kind))]))
}

/// Both fields are required; a report without them is not trusted.
fn classify(profile: &HardwareProfile) -> Result<&'static str, ProducerError> {
	let missing = |field: &str| ProducerError::InvalidOutput(format!("system_profiler report has no {field}"));
	let boot_rom = profile.boot_rom_version.as_deref().ok_or_else(|| missing("boot_rom_version"))?;
	let vendor_id = profile.ethernet_vendor_id.as_deref().ok_or_else(|| missing("spethernet_vendor-id"))?;

	Ok(if boot_rom.contains("VMW") {
		"vmware"
	} else if vendor_id.contains(PARALLELS_VENDOR_ID) {
		"parallels"
	} else {
		"physical"
	})
}
