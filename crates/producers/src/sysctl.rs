//! Kernel state lookups by sysctl name.

use hostfacts_engine::ProducerError;

/// String value of a sysctl, e.g. `hw.model`.
pub(crate) fn string(name: &str) -> Result<String, ProducerError> {
	raw(name).map(|buf| decode_string(&buf))
}

/// Integer value of a sysctl, e.g. `kern.hv_vmm_present`.
pub(crate) fn int(name: &str) -> Result<i64, ProducerError> {
	let buf = raw(name)?;
	decode_int(&buf).ok_or_else(|| ProducerError::failed(format!("sysctl {name}: unexpected {}-byte value", buf.len())))
}

fn decode_string(buf: &[u8]) -> String {
	let end = buf.iter().position(|&b| b == 0).unwrap_or(buf.len());
	String::from_utf8_lossy(&buf[..end]).into_owned()
}

fn decode_int(buf: &[u8]) -> Option<i64> {
	match buf.len() {
		4 => buf.try_into().ok().map(i32::from_ne_bytes).map(i64::from),
		8 => buf.try_into().ok().map(i64::from_ne_bytes),
		_ => None,
	}
}

#[cfg(target_os = "macos")]
fn raw(name: &str) -> Result<Vec<u8>, ProducerError> {
	use std::ffi::CString;
	use std::{io, ptr};

	let cname = CString::new(name).map_err(|_| ProducerError::failed(format!("invalid sysctl name {name:?}")))?;
	let fail = |err: io::Error| ProducerError::failed(format!("sysctl {name}: {err}"));

	let mut size: libc::size_t = 0;
	// SAFETY: a null output buffer asks only for the value size, written to `size`.
	let rc = unsafe { libc::sysctlbyname(cname.as_ptr(), ptr::null_mut(), &mut size, ptr::null_mut(), 0) };
	if rc != 0 {
		return Err(fail(io::Error::last_os_error()));
	}

	let mut buf = vec![0u8; size];
	// SAFETY: `buf` is valid for `size` bytes and the kernel writes at most that many.
	let rc = unsafe { libc::sysctlbyname(cname.as_ptr(), buf.as_mut_ptr().cast(), &mut size, ptr::null_mut(), 0) };
	if rc != 0 {
		return Err(fail(io::Error::last_os_error()));
	}
	buf.truncate(size);
	Ok(buf)
}

#[cfg(not(target_os = "macos"))]
fn raw(name: &str) -> Result<Vec<u8>, ProducerError> {
	Err(ProducerError::failed(format!("sysctl {name} is not available on this platform")))
}
