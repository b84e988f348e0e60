//! Members of the local `admin` group.

use hostfacts_engine::{FactMap, FactValue, ProducerResult, fact_producer};

/// Group id of `admin` on macOS.
const ADMIN_GID: u32 = 80;

fact_producer!(
	admin_users,
	{ description: "Members of the local admin group (gid 80)" },
	produce: admin_users
);

fn admin_users() -> ProducerResult {
	let members = group_members(ADMIN_GID)?;
	Ok(FactMap::from([("admin_users".to_string(), FactValue::List(members))]))
}

#[cfg(unix)]
fn group_members(gid: u32) -> Result<Vec<String>, hostfacts_engine::ProducerError> {
	use std::ffi::CStr;
	use std::{io, mem, ptr};

	use hostfacts_engine::ProducerError;

	// SAFETY: `group` is plain data; getgrgid_r fills it before it is read.
	let mut group: libc::group = unsafe { mem::zeroed() };
	let mut buf: Vec<libc::c_char> = vec![0; 1024];
	let mut found: *mut libc::group = ptr::null_mut();

	loop {
		// SAFETY: all pointers are valid for the duration of the call and
		// `buf.len()` is the true capacity of `buf`.
		let rc = unsafe { libc::getgrgid_r(gid as libc::gid_t, &mut group, buf.as_mut_ptr(), buf.len(), &mut found) };
		match rc {
			0 => break,
			libc::ERANGE if buf.len() < 1 << 20 => buf.resize(buf.len() * 2, 0),
			errno => return Err(ProducerError::failed(format!("getgrgid({gid}): {}", io::Error::from_raw_os_error(errno)))),
		}
	}
	if found.is_null() {
		return Err(ProducerError::failed(format!("no group with gid {gid}")));
	}

	let mut members = Vec::new();
	let mut cursor = group.gr_mem;
	// SAFETY: `gr_mem` is a null-terminated array of C strings pointing into
	// `buf`, which outlives this loop.
	unsafe {
		while !cursor.is_null() && !(*cursor).is_null() {
			members.push(CStr::from_ptr(*cursor).to_string_lossy().into_owned());
			cursor = cursor.add(1);
		}
	}
	Ok(members)
}

#[cfg(not(unix))]
fn group_members(gid: u32) -> Result<Vec<String>, hostfacts_engine::ProducerError> {
	Err(hostfacts_engine::ProducerError::failed(format!("group {gid} lookup is not available on this platform")))
}
