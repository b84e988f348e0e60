//! Physical hardware or a virtual machine, and which hypervisor.

use hostfacts_engine::{FactMap, FactValue, ProducerError, ProducerResult, fact_producer};

use crate::profiler::{self, PARALLELS_VENDOR_ID};
use crate::sysctl;

fact_producer!(
	physical_or_virtual,
	{ description: "physical, vmware, virtualbox, parallels or unknown_virtual" },
	produce: physical_or_virtual
);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MachineKind {
	Physical,
	VMware,
	VirtualBox,
	Parallels,
	UnknownVirtual,
}

impl MachineKind {
	pub(crate) fn as_str(self) -> &'static str {
		match self {
			Self::Physical => "physical",
			Self::VMware => "vmware",
			Self::VirtualBox => "virtualbox",
			Self::Parallels => "parallels",
			Self::UnknownVirtual => "unknown_virtual",
		}
	}
}

fn physical_or_virtual() -> ProducerResult {
	let kind = if is_virtual_machine()? {
		hypervisor()
	} else {
		MachineKind::Physical
	};
	Ok(FactMap::from([(
		"physical_or_virtual".to_string(),
		FactValue::from(kind.as_str()),
	)]))
}

/// Whether the kernel reports running under a hypervisor.
pub(crate) fn is_virtual_machine() -> Result<bool, ProducerError> {
	match sysctl::int("kern.hv_vmm_present") {
		Ok(present) => Ok(present != 0),
		// Releases before Big Sur only expose the CPU feature flag.
		Err(_) => sysctl::string("machdep.cpu.features").map(|features| features.split_whitespace().any(|f| f == "VMM")),
	}
}

fn hypervisor() -> MachineKind {
	match profiler::report() {
		Ok(xml) => classify_profile(xml.as_bytes()),
		Err(err) => {
			tracing::debug!(error = %err, "physical_or_virtual.profiler_unavailable");
			MachineKind::UnknownVirtual
		}
	}
}

/// Vendor of a virtual machine from a `system_profiler` report.
fn classify_profile(xml: &[u8]) -> MachineKind {
	let Some(profile) = profiler::parse(xml) else {
		return MachineKind::UnknownVirtual;
	};

	if let Some(boot_rom) = profile.boot_rom_version.as_deref() {
		if boot_rom.contains("VMW") {
			return MachineKind::VMware;
		}
		if boot_rom.contains("VirtualBox") {
			return MachineKind::VirtualBox;
		}
	}
	match profile.ethernet_vendor_id.as_deref() {
		Some(vid) if vid.contains(PARALLELS_VENDOR_ID) => MachineKind::Parallels,
		_ => MachineKind::UnknownVirtual,
	}
}
