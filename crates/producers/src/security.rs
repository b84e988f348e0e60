//! Security posture reported by the system's own status tools.

use hostfacts_engine::{FactMap, FactValue, ProducerResult, fact_producer};

use crate::command::status_line;

fact_producer!(
	filevault_status,
	{ description: "FileVault status of the startup disk (fdesetup)" },
	produce: filevault_status
);

fact_producer!(
	gatekeeper_status,
	{ description: "Gatekeeper assessment status (spctl)" },
	produce: gatekeeper_status
);

fact_producer!(
	sip_status,
	{ description: "System Integrity Protection status (csrutil)" },
	produce: sip_status
);

fn filevault_status() -> ProducerResult {
	Ok(single("filevault_status", status_line("/usr/bin/fdesetup", &["status"])?))
}

fn gatekeeper_status() -> ProducerResult {
	Ok(single("gatekeeper_status", status_line("/usr/sbin/spctl", &["--status"])?))
}

fn sip_status() -> ProducerResult {
	Ok(single("sip_status", status_line("/usr/bin/csrutil", &["status"])?))
}

fn single(name: &str, value: String) -> FactMap {
	FactMap::from([(name.to_string(), FactValue::String(value))])
}
