//! Raw entry points of the host callback ABI, operating on the
//! process-wide [`Runtime`].
//!
//! A plugin shared object exports these under the `FLBPlugin*` symbol
//! names via [`register_input_plugin!`] or [`register_output_plugin!`];
//! the functions here hold the actual logic so it stays testable without
//! symbol exports.

use core::ffi::{c_char, c_int, c_void};
use std::ffi::CStr;
use std::sync::OnceLock;

use crate::host::HostHandle;
use crate::runtime::{PollInput, Runtime};
use crate::status::Status;

/// The process-wide runtime instance backing the exported entry points.
pub fn runtime() -> &'static Runtime {
    static RUNTIME: OnceLock<Runtime> = OnceLock::new();
    RUNTIME.get_or_init(Runtime::new)
}

/// Host register callback.
///
/// # Safety
/// `def` must be the host's plugin definition pointer (or null); it is
/// never dereferenced here, only forwarded to the host bindings.
pub unsafe fn plugin_register(def: *mut c_void) -> c_int {
    runtime().register(HostHandle::from_ptr(def)).code()
}

/// Host init callback.
///
/// # Safety
/// `ptr` must be the host's plugin instance pointer (or null); it is
/// never dereferenced here, only forwarded to the host bindings.
pub unsafe fn plugin_init(ptr: *mut c_void) -> c_int {
    Status::from_result(&runtime().init(HostHandle::from_ptr(ptr))).code()
}

/// Host input poll callback. On OK with data, `*data`/`*size` describe an
/// encoded batch owned by the lease table until the paired cleanup call.
///
/// # Safety
/// `data` and `size` must be valid for writes (or null, in which case the
/// corresponding out-value is discarded).
pub unsafe fn input_callback(data: *mut *mut c_void, size: *mut usize) -> c_int {
    let (ptr, len, status) = match runtime().poll_input() {
        Ok(PollInput::Batch(batch)) => {
            let (ptr, len) = runtime().leases().lease(batch);
            (ptr as *mut c_void, len, Status::Ok)
        }
        Ok(PollInput::Empty) => (std::ptr::null_mut(), 0, Status::Ok),
        Err(err) => {
            log::error!("{err}");
            (std::ptr::null_mut(), 0, Status::from_error(&err))
        }
    };

    if !data.is_null() {
        // SAFETY: the caller guarantees `data` is valid for writes.
        unsafe { *data = ptr };
    }
    if !size.is_null() {
        // SAFETY: the caller guarantees `size` is valid for writes.
        unsafe { *size = len };
    }
    status.code()
}

/// Host input cleanup callback: release the batch returned by the
/// previous poll. Safe against stray addresses; releasing twice is a
/// logged no-op.
///
/// # Safety
/// `data` must be either null or an address previously returned through
/// `input_callback`.
pub unsafe fn input_cleanup(data: *mut c_void) -> c_int {
    if !data.is_null() {
        runtime().leases().release(data as usize);
    }
    Status::Ok.code()
}

/// Host flush callback: deliver one encoded batch to the output plugin.
///
/// # Safety
/// `data` must point to `length` readable bytes (or be null with a
/// non-positive `length`); `tag` must be null or a NUL-terminated string.
pub unsafe fn plugin_flush(data: *const c_void, length: c_int, tag: *const c_char) -> c_int {
    let bytes: &[u8] = if data.is_null() || length <= 0 {
        &[]
    } else {
        // SAFETY: the caller guarantees `data` points to `length` bytes.
        unsafe { std::slice::from_raw_parts(data.cast::<u8>(), length as usize) }
    };

    let tag = if tag.is_null() {
        String::new()
    } else {
        // SAFETY: the caller guarantees `tag` is NUL-terminated.
        unsafe { CStr::from_ptr(tag) }.to_string_lossy().into_owned()
    };

    Status::from_result(&runtime().flush(bytes, &tag)).code()
}

/// Host exit callback.
pub fn plugin_exit() -> c_int {
    runtime().exit().code()
}

/// Export the entry points shared by both plugin roles. Used internally
/// by the role-specific registration macros.
#[doc(hidden)]
#[macro_export]
macro_rules! __export_flb_entry_points {
    () => {
        #[no_mangle]
        pub unsafe extern "C" fn FLBPluginInit(ptr: *mut ::core::ffi::c_void) -> ::core::ffi::c_int {
            $crate::cshared::plugin_init(ptr)
        }

        #[no_mangle]
        pub unsafe extern "C" fn FLBPluginInputCallback(
            data: *mut *mut ::core::ffi::c_void,
            size: *mut usize,
        ) -> ::core::ffi::c_int {
            $crate::cshared::input_callback(data, size)
        }

        #[no_mangle]
        pub unsafe extern "C" fn FLBPluginInputCleanupCallback(
            data: *mut ::core::ffi::c_void,
        ) -> ::core::ffi::c_int {
            $crate::cshared::input_cleanup(data)
        }

        #[no_mangle]
        pub unsafe extern "C" fn FLBPluginFlush(
            data: *const ::core::ffi::c_void,
            length: ::core::ffi::c_int,
            tag: *const ::core::ffi::c_char,
        ) -> ::core::ffi::c_int {
            $crate::cshared::plugin_flush(data, length, tag)
        }

        #[no_mangle]
        pub extern "C" fn FLBPluginExit() -> ::core::ffi::c_int {
            $crate::cshared::plugin_exit()
        }
    };
}

/// Turn the enclosing cdylib into an input plugin: supplies the
/// implementation to the runtime and exports the `FLBPlugin*` symbols.
///
/// ```ignore
/// fluentbit_plugin::register_input_plugin!("ticker", "emits a record per second", Ticker::default());
/// ```
#[macro_export]
macro_rules! register_input_plugin {
    ($name:expr, $desc:expr, $plugin:expr) => {
        $crate::__export_flb_entry_points!();

        #[no_mangle]
        pub unsafe extern "C" fn FLBPluginRegister(
            def: *mut ::core::ffi::c_void,
        ) -> ::core::ffi::c_int {
            static SUPPLY: ::std::sync::Once = ::std::sync::Once::new();
            SUPPLY.call_once(|| {
                $crate::cshared::runtime().register_input(
                    $name,
                    $desc,
                    ::std::boxed::Box::new($plugin),
                );
            });
            $crate::cshared::plugin_register(def)
        }
    };
}

/// Turn the enclosing cdylib into an output plugin. See
/// [`register_input_plugin!`].
#[macro_export]
macro_rules! register_output_plugin {
    ($name:expr, $desc:expr, $plugin:expr) => {
        $crate::__export_flb_entry_points!();

        #[no_mangle]
        pub unsafe extern "C" fn FLBPluginRegister(
            def: *mut ::core::ffi::c_void,
        ) -> ::core::ffi::c_int {
            static SUPPLY: ::std::sync::Once = ::std::sync::Once::new();
            SUPPLY.call_once(|| {
                $crate::cshared::runtime().register_output(
                    $name,
                    $desc,
                    ::std::boxed::Box::new($plugin),
                );
            });
            $crate::cshared::plugin_register(def)
        }
    };
}
