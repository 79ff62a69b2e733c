//! Host side of the C ABI shared with generated behaviour libraries.
//!
//! Layouts mirror the `host` and `__kiln` modules of the injected prelude and
//! must change together with it (bump `KILN_ABI_VERSION`).

use std::ffi::c_void;
use std::sync::LazyLock;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::time::Instant;

pub const KILN_ABI_VERSION: u32 = 1;

#[repr(C)]
pub struct HostVTable {
    pub abi_version: u32,
    pub frame_time: extern "C" fn() -> f32,
    pub elapsed: extern "C" fn() -> f64,
    pub frame: extern "C" fn() -> u64,
    pub log: extern "C" fn(*const u8, usize),
}

#[repr(C)]
#[derive(Clone, Copy)]
pub struct InstanceVTable {
    pub initialize: extern "C" fn(*mut c_void) -> bool,
    pub update: extern "C" fn(*mut c_void) -> bool,
    pub destroy: extern "C" fn(*mut c_void),
}

#[repr(C)]
pub struct TypeEntry {
    pub name_ptr: *const u8,
    pub name_len: usize,
    pub create: extern "C" fn() -> *mut c_void,
}

#[repr(C)]
pub struct ModuleDescriptor {
    pub abi_version: u32,
    pub vtable: InstanceVTable,
    pub type_count: usize,
    pub types: *const TypeEntry,
}

pub type ModuleEntry = unsafe extern "C" fn(*const HostVTable) -> *const ModuleDescriptor;

/// Handed to every loaded library; lives for the whole process.
pub static HOST_VTABLE: HostVTable = HostVTable {
    abi_version: KILN_ABI_VERSION,
    frame_time: host_frame_time,
    elapsed: host_elapsed,
    frame: host_frame,
    log: host_log,
};

// ============================================================================
// Frame clock
// ============================================================================

static START: LazyLock<Instant> = LazyLock::new(Instant::now);
static FRAME_TIME_BITS: AtomicU32 = AtomicU32::new(0);
static FRAME: AtomicU64 = AtomicU64::new(0);

/// Record one host frame of `dt` seconds. Called by the frame loop.
pub fn advance_frame(dt: f32) {
    LazyLock::force(&START);
    FRAME_TIME_BITS.store(dt.to_bits(), Ordering::Relaxed);
    FRAME.fetch_add(1, Ordering::Relaxed);
}

pub fn frame_count() -> u64 {
    FRAME.load(Ordering::Relaxed)
}

extern "C" fn host_frame_time() -> f32 {
    f32::from_bits(FRAME_TIME_BITS.load(Ordering::Relaxed))
}

extern "C" fn host_elapsed() -> f64 {
    START.elapsed().as_secs_f64()
}

extern "C" fn host_frame() -> u64 {
    frame_count()
}

extern "C" fn host_log(ptr: *const u8, len: usize) {
    if ptr.is_null() {
        return;
    }
    // SAFETY: the prelude passes a live `&str` split into pointer and length.
    let bytes = unsafe { std::slice::from_raw_parts(ptr, len) };
    crate::log!("plugin"; "{}", String::from_utf8_lossy(bytes));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_clock() {
        let before = frame_count();
        advance_frame(0.25);

        assert_eq!((HOST_VTABLE.frame_time)(), 0.25);
        assert!((HOST_VTABLE.frame)() > before);
        assert!((HOST_VTABLE.elapsed)() >= 0.0);
    }

    #[test]
    fn test_log_tolerates_null() {
        (HOST_VTABLE.log)(std::ptr::null(), 3);
        let msg = "hello";
        (HOST_VTABLE.log)(msg.as_ptr(), msg.len());
    }
}
