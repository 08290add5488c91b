//! Demo input plugin: one record per second carrying a configured field.
//!
//! Build as a cdylib and load it with:
//!
//! ```text
//! fluent-bit -e ./libinput_ticker.so -i ticker -p foo=bar -o stdout
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use crossbeam_channel::{select, tick};
use fluentbit_plugin::prelude::*;
use fluentbit_plugin::register_input_plugin;

#[derive(Default)]
struct Ticker {
    foo: String,
    collected: Option<Arc<dyn Counter>>,
}

impl InputPlugin for Ticker {
    fn init(&mut self, fbit: &Fluentbit) -> Result<(), PluginError> {
        self.foo = fbit.conf.string("foo");
        self.collected = Some(fbit.metrics.counter(
            "collect_total",
            "Total number of records collected",
            "ticker",
        ));
        fbit.logger.info(&format!("ticker starting, foo={:?}", self.foo));
        Ok(())
    }

    fn collect(
        &mut self,
        shutdown: &ShutdownToken,
        out: &Sender<Message>,
    ) -> Result<(), PluginError> {
        // Takes over the collect thread for the plugin's lifetime.
        let ticker = tick(Duration::from_secs(1));
        loop {
            select! {
                recv(ticker) -> _ => {
                    let mut record = BTreeMap::new();
                    record.insert("message".to_string(), "hello from input-ticker".to_string());
                    record.insert("foo".to_string(), self.foo.clone());
                    if out.send(Message::new(SystemTime::now(), record)).is_err() {
                        return Ok(());
                    }
                    if let Some(counter) = &self.collected {
                        counter.inc();
                    }
                }
                recv(shutdown.channel()) -> _ => return Ok(()),
            }
        }
    }
}

register_input_plugin!(
    "ticker",
    "emits one record per second",
    Ticker::default()
);
