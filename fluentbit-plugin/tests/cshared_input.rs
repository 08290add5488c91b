//! Full input lifecycle through the raw entry points and the
//! process-global runtime. Single test: the global runtime is one per
//! process.

use core::ffi::c_void;
use std::collections::BTreeMap;
use std::ptr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant, SystemTime};

use fluentbit_plugin::codec;
use fluentbit_plugin::cshared;
use fluentbit_plugin::host::Fluentbit;
use fluentbit_plugin::prelude::*;

struct ThreeRecords {
    produced: Arc<AtomicUsize>,
}

impl InputPlugin for ThreeRecords {
    fn init(&mut self, _fbit: &Fluentbit) -> Result<(), PluginError> {
        Ok(())
    }

    fn collect(
        &mut self,
        _shutdown: &ShutdownToken,
        out: &Sender<Message>,
    ) -> Result<(), PluginError> {
        if self.produced.load(Ordering::SeqCst) >= 3 {
            return Ok(());
        }
        let mut record = BTreeMap::new();
        record.insert("x".to_string(), "1".to_string());
        if out.send(Message::new(SystemTime::now(), record)).is_ok() {
            self.produced.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }
}

#[test]
fn input_lifecycle_over_the_c_abi() {
    let produced = Arc::new(AtomicUsize::new(0));
    cshared::runtime().register_input(
        "abi-input",
        "input lifecycle test",
        Box::new(ThreeRecords {
            produced: produced.clone(),
        }),
    );

    // SAFETY: null handles are valid; the bridge never dereferences them.
    unsafe {
        assert_eq!(cshared::plugin_register(ptr::null_mut()), 1);
        assert_eq!(cshared::plugin_init(ptr::null_mut()), 1);
    }

    let mut records = 0;
    let deadline = Instant::now() + Duration::from_secs(10);
    while records < 3 && Instant::now() < deadline {
        let mut data: *mut c_void = ptr::null_mut();
        let mut size: usize = 0;
        // SAFETY: both out-pointers reference live locals.
        let code = unsafe { cshared::input_callback(&mut data, &mut size) };
        assert_eq!(code, 1);

        if data.is_null() {
            assert_eq!(size, 0);
            thread::sleep(Duration::from_millis(5));
            continue;
        }

        // SAFETY: the lease table guarantees `data` points to `size`
        // bytes until the cleanup call below.
        let batch = unsafe { std::slice::from_raw_parts(data.cast::<u8>(), size) };
        for (_, record) in codec::decode_all(batch).unwrap() {
            assert_eq!(record.get("x"), Some(&"1".to_string()));
            records += 1;
        }

        // SAFETY: `data` came from the poll above and is released once.
        unsafe {
            assert_eq!(cshared::input_cleanup(data), 1);
        }
    }
    assert_eq!(records, 3);
    assert_eq!(cshared::runtime().leases().outstanding(), 0);

    // Flush against an input plugin is the retryable mismatch.
    // SAFETY: an empty payload is expressed as null with length zero.
    let code = unsafe { cshared::plugin_flush(ptr::null(), 0, ptr::null()) };
    assert_eq!(code, 2);

    assert_eq!(cshared::plugin_exit(), 1);

    // Cleanup of an unknown address after exit stays a harmless OK.
    // SAFETY: null is explicitly tolerated.
    unsafe {
        assert_eq!(cshared::input_cleanup(ptr::null_mut()), 1);
    }
}
