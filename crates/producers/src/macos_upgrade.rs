//! Whether this machine can upgrade to each recent macOS release.
//!
//! Model lists are the union of `SupportedProductTypes` (Restore.plist) and
//! `SupportedModelProperties` (PlatformSupport.plist) from each release's
//! full installer.

use hostfacts_engine::{FactMap, FactValue, ProducerError, ProducerResult, fact_producer};

use crate::physical_or_virtual::is_virtual_machine;
use crate::sysctl;

fact_producer!(
	macos_upgrade_supported,
	{ description: "<release>_upgrade_supported for Ventura, Sonoma and Sequoia" },
	produce: macos_upgrade_supported
);

struct Release {
	name: &'static str,
	major: u32,
	models: &'static [&'static str],
}

const RELEASES: &[Release] = &[
	Release {
		name: "sequoia",
		major: 15,
		models: &[
			"iMac19,1", "iMac19,2", "iMac20,1", "iMac20,2", "iMac21,1", "iMac21,2", "iMacPro1,1", "Mac13,1", "Mac13,2",
			"Mac14,10", "Mac14,12", "Mac14,13", "Mac14,14", "Mac14,15", "Mac14,2", "Mac14,3", "Mac14,5", "Mac14,6",
			"Mac14,7", "Mac14,8", "Mac14,9", "Mac15,10", "Mac15,11", "Mac15,12", "Mac15,13", "Mac15,3", "Mac15,4",
			"Mac15,5", "Mac15,6", "Mac15,7", "Mac15,8", "Mac15,9", "MacBookAir10,1", "MacBookAir9,1", "MacBookPro15,1",
			"MacBookPro15,2", "MacBookPro15,3", "MacBookPro15,4", "MacBookPro16,1", "MacBookPro16,2", "MacBookPro16,3",
			"MacBookPro16,4", "MacBookPro17,1", "MacBookPro18,1", "MacBookPro18,2", "MacBookPro18,3", "MacBookPro18,4",
			"Macmini8,1", "Macmini9,1", "MacPro7,1", "VirtualMac2,1",
		],
	},
	Release {
		name: "sonoma",
		major: 14,
		models: &[
			"iMac19,1", "iMac19,2", "iMac20,1", "iMac20,2", "iMac21,1", "iMac21,2", "iMacPro1,1", "iSim1,1", "Mac13,1",
			"Mac13,2", "Mac14,10", "Mac14,12", "Mac14,13", "Mac14,14", "Mac14,15", "Mac14,2", "Mac14,3", "Mac14,5",
			"Mac14,6", "Mac14,7", "Mac14,8", "Mac14,9", "Mac15,3", "Mac15,4", "Mac15,5", "Mac15,6", "Mac15,7", "Mac15,8",
			"Mac15,9", "MacBookAir10,1", "MacBookAir8,1", "MacBookAir8,2", "MacBookAir9,1", "MacBookPro15,1",
			"MacBookPro15,2", "MacBookPro15,3", "MacBookPro15,4", "MacBookPro16,1", "MacBookPro16,2", "MacBookPro16,3",
			"MacBookPro16,4", "MacBookPro17,1", "MacBookPro18,1", "MacBookPro18,2", "MacBookPro18,3", "MacBookPro18,4",
			"Macmini8,1", "Macmini9,1", "MacPro7,1", "VirtualMac2,1",
		],
	},
	Release {
		name: "ventura",
		major: 13,
		models: &[
			"iMac18,1", "iMac18,2", "iMac18,3", "iMac19,1", "iMac19,2", "iMac20,1", "iMac20,2", "iMac21,1", "iMac21,2",
			"iMacPro1,1", "iSim1,1", "Mac13,1", "Mac13,2", "Mac14,2", "Mac14,7", "MacBook10,1", "MacBookAir10,1",
			"MacBookAir8,1", "MacBookAir8,2", "MacBookAir9,1", "MacBookPro14,1", "MacBookPro14,2", "MacBookPro14,3",
			"MacBookPro15,1", "MacBookPro15,2", "MacBookPro15,3", "MacBookPro15,4", "MacBookPro16,1", "MacBookPro16,2",
			"MacBookPro16,3", "MacBookPro16,4", "MacBookPro17,1", "MacBookPro18,1", "MacBookPro18,2", "MacBookPro18,3",
			"MacBookPro18,4", "Macmini8,1", "Macmini9,1", "MacPro7,1", "VirtualMac2,1",
		],
	},
];

/// What the upgrade decision depends on.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Host {
	virtual_machine: bool,
	model: String,
	/// Major version of the running OS.
	major: u32,
}

fn macos_upgrade_supported() -> ProducerResult {
	let host = Host {
		virtual_machine: is_virtual_machine()?,
		model: sysctl::string("hw.model")?,
		major: major_version(&sysctl::string("kern.osproductversion")?)?,
	};
	Ok(upgrade_facts(&host))
}

fn upgrade_facts(host: &Host) -> FactMap {
	RELEASES
		.iter()
		.map(|release| {
			let supported = host.virtual_machine || (release.models.contains(&host.model.as_str()) && host.major < release.major);
			(format!("{}_upgrade_supported", release.name), FactValue::Bool(supported))
		})
		.collect()
}

/// `14` for `"14.5"`.
fn major_version(product_version: &str) -> Result<u32, ProducerError> {
	let version = product_version.trim();
	version
		.split('.')
		.next()
		.and_then(|major| major.parse().ok())
		.ok_or_else(|| ProducerError::InvalidOutput(format!("unrecognised product version `{version}`")))
}
