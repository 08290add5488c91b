//! Lifecycle ordering across register, init, data calls and exit.

use std::collections::BTreeMap;
use std::thread;
use std::time::{Duration, Instant, SystemTime};

use fluentbit_plugin::host::{Fluentbit, HostHandle};
use fluentbit_plugin::prelude::*;
use fluentbit_plugin::Runtime;

struct IdleInput;

impl InputPlugin for IdleInput {
    fn init(&mut self, _fbit: &Fluentbit) -> Result<(), PluginError> {
        Ok(())
    }

    fn collect(
        &mut self,
        _shutdown: &ShutdownToken,
        _out: &Sender<Message>,
    ) -> Result<(), PluginError> {
        Ok(())
    }
}

/// Pushes records until cancellation, never returning in between.
struct BusyInput;

impl InputPlugin for BusyInput {
    fn init(&mut self, _fbit: &Fluentbit) -> Result<(), PluginError> {
        Ok(())
    }

    fn collect(
        &mut self,
        shutdown: &ShutdownToken,
        out: &Sender<Message>,
    ) -> Result<(), PluginError> {
        let mut record = BTreeMap::new();
        record.insert("busy".to_string(), "yes".to_string());
        while !shutdown.is_shutdown() {
            if out
                .send(Message::new(SystemTime::now(), record.clone()))
                .is_err()
            {
                break;
            }
        }
        Ok(())
    }
}

#[test]
fn init_blocks_until_register_completes() {
    let runtime = Runtime::new();
    runtime.register_input("in", "", Box::new(IdleInput));

    // init on a second thread must not proceed before register.
    thread::scope(|scope| {
        let init = scope.spawn(|| {
            runtime.init(HostHandle::null()).unwrap();
        });
        thread::sleep(Duration::from_millis(50));
        assert!(!init.is_finished());
        assert!(!runtime.is_initialized());

        assert_eq!(runtime.register(HostHandle::null()), Status::Ok);
        init.join().unwrap();
    });
    assert!(runtime.is_initialized());
    runtime.exit();
}

#[test]
fn failed_init_still_unblocks_data_entry_points() {
    struct BadInit;
    impl InputPlugin for BadInit {
        fn init(&mut self, _fbit: &Fluentbit) -> Result<(), PluginError> {
            Err(PluginError::msg("refused"))
        }
        fn collect(
            &mut self,
            _shutdown: &ShutdownToken,
            _out: &Sender<Message>,
        ) -> Result<(), PluginError> {
            Ok(())
        }
    }

    let runtime = Runtime::new();
    runtime.register_input("in", "", Box::new(BadInit));
    runtime.register(HostHandle::null());
    assert!(runtime.init(HostHandle::null()).is_err());

    // The gate opened anyway; a poll returns promptly instead of hanging.
    let start = Instant::now();
    let _ = runtime.poll_input();
    assert!(start.elapsed() < Duration::from_secs(1));
    runtime.exit();
}

#[test]
fn exit_terminates_a_saturating_producer() {
    let runtime = Runtime::new();
    runtime.register_input("busy", "", Box::new(BusyInput));
    runtime.register(HostHandle::null());
    runtime.init(HostHandle::null()).unwrap();

    // Start the pipeline and let the producer run hot for a moment.
    runtime.poll_input().unwrap();
    thread::sleep(Duration::from_millis(50));

    let start = Instant::now();
    assert_eq!(runtime.exit(), Status::Ok);
    // join_workers is bounded; exit must not hang on the busy producer.
    assert!(start.elapsed() < Duration::from_secs(2));
}

#[test]
fn exit_before_any_data_call_is_clean() {
    let runtime = Runtime::new();
    runtime.register_input("in", "", Box::new(IdleInput));
    runtime.register(HostHandle::null());
    runtime.init(HostHandle::null()).unwrap();
    assert_eq!(runtime.exit(), Status::Ok);
}

#[test]
fn register_with_nothing_supplied_reports_retry_every_time() {
    let runtime = Runtime::new();
    assert_eq!(runtime.register(HostHandle::null()), Status::Retry);
    assert_eq!(runtime.register(HostHandle::null()), Status::Retry);
}
