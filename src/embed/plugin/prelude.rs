/// Capability surface visible to behaviour sources (`use crate::prelude::*;`).
#[allow(dead_code)]
pub mod prelude {
    pub use super::host;

    /// A runtime-pluggable behaviour. One fresh instance is created per
    /// successful build; `initialize` runs once before the first `update`.
    pub trait Behaviour {
        fn initialize(&mut self) {}
        fn update(&mut self);
    }
}

/// Services provided by the running host.
#[allow(dead_code)]
pub mod host {
    use std::sync::atomic::{AtomicPtr, Ordering};

    #[doc(hidden)]
    #[repr(C)]
    pub struct HostVTable {
        pub abi_version: u32,
        pub frame_time: extern "C" fn() -> f32,
        pub elapsed: extern "C" fn() -> f64,
        pub frame: extern "C" fn() -> u64,
        pub log: extern "C" fn(*const u8, usize),
    }

    static HOST: AtomicPtr<HostVTable> = AtomicPtr::new(std::ptr::null_mut());

    #[doc(hidden)]
    pub fn attach(host: *const HostVTable) {
        HOST.store(host as *mut HostVTable, Ordering::Release);
    }

    fn vtable() -> Option<&'static HostVTable> {
        // SAFETY: the host hands out a pointer to a static that outlives this library.
        unsafe { HOST.load(Ordering::Acquire).as_ref() }
    }

    /// Seconds since the previous frame.
    pub fn frame_time() -> f32 {
        vtable().map_or(0.0, |h| (h.frame_time)())
    }

    /// Seconds since the host started.
    pub fn elapsed() -> f64 {
        vtable().map_or(0.0, |h| (h.elapsed)())
    }

    /// Number of frames run so far.
    pub fn frame() -> u64 {
        vtable().map_or(0, |h| (h.frame)())
    }

    /// Print a line on the host console.
    pub fn log(message: &str) {
        if let Some(h) = vtable() {
            (h.log)(message.as_ptr(), message.len());
        }
    }
}

#[doc(hidden)]
#[allow(dead_code)]
pub mod __kiln {
    use std::ffi::c_void;
    use std::panic::{AssertUnwindSafe, catch_unwind};

    use super::host::HostVTable;
    use super::prelude::Behaviour;

    pub const ABI_VERSION: u32 = 1;

    #[repr(C)]
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

    type Instance = Box<dyn Behaviour>;

    pub extern "C" fn create<T: Behaviour + Default + 'static>() -> *mut c_void {
        match catch_unwind(|| Box::new(Box::new(T::default()) as Instance)) {
            Ok(instance) => Box::into_raw(instance).cast(),
            Err(_) => std::ptr::null_mut(),
        }
    }

    extern "C" fn initialize(this: *mut c_void) -> bool {
        // SAFETY: `this` came from `create` and the host never shares it across threads.
        let instance = unsafe { &mut *this.cast::<Instance>() };
        catch_unwind(AssertUnwindSafe(|| instance.initialize())).is_ok()
    }

    extern "C" fn update(this: *mut c_void) -> bool {
        // SAFETY: as in `initialize`.
        let instance = unsafe { &mut *this.cast::<Instance>() };
        catch_unwind(AssertUnwindSafe(|| instance.update())).is_ok()
    }

    extern "C" fn destroy(this: *mut c_void) {
        // SAFETY: called exactly once per `create`.
        let instance = unsafe { Box::from_raw(this.cast::<Instance>()) };
        let _ = catch_unwind(AssertUnwindSafe(move || drop(instance)));
    }

    pub fn entry(name: &'static str, create: extern "C" fn() -> *mut c_void) -> TypeEntry {
        TypeEntry {
            name_ptr: name.as_ptr(),
            name_len: name.len(),
            create,
        }
    }

    /// Build the descriptor returned from the module entry point.
    /// Leaked on purpose: it lives as long as the library stays mapped.
    pub fn describe(host: *const HostVTable, types: Vec<TypeEntry>) -> *const ModuleDescriptor {
        super::host::attach(host);
        let types: &'static [TypeEntry] = Box::leak(types.into_boxed_slice());
        Box::into_raw(Box::new(ModuleDescriptor {
            abi_version: ABI_VERSION,
            vtable: InstanceVTable {
                initialize,
                update,
                destroy,
            },
            type_count: types.len(),
            types: types.as_ptr(),
        }))
    }
}
