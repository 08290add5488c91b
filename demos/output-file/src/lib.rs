//! Demo output plugin: appends one line per record to a file.
//!
//! Build as a cdylib and load it with:
//!
//! ```text
//! fluent-bit -e ./liboutput_file.so -i dummy -o file-writer -p path=out.log
//! ```

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::time::UNIX_EPOCH;

use crossbeam_channel::select;
use fluentbit_plugin::prelude::*;
use fluentbit_plugin::register_output_plugin;

const DEFAULT_PATH: &str = "output.txt";

#[derive(Default)]
struct FileWriter {
    path: String,
}

impl FileWriter {
    fn write_line(&self, file: &mut File, msg: &Message) -> Result<(), PluginError> {
        let (secs, nanos) = match msg.time.duration_since(UNIX_EPOCH) {
            Ok(d) => (d.as_secs(), d.subsec_nanos()),
            Err(_) => (0, 0),
        };
        writeln!(
            file,
            "message=\"got record\" tag={} time={secs}.{nanos:09} record={:?}",
            msg.tag(),
            msg.record,
        )?;
        Ok(())
    }
}

impl OutputPlugin for FileWriter {
    fn init(&mut self, fbit: &Fluentbit) -> Result<(), PluginError> {
        self.path = fbit.conf.string("path");
        if self.path.is_empty() {
            self.path = DEFAULT_PATH.to_string();
        }
        fbit.logger
            .info(&format!("file-writer starting, path={:?}", self.path));
        Ok(())
    }

    fn flush(
        &mut self,
        shutdown: &ShutdownToken,
        records: &Receiver<Message>,
    ) -> Result<(), PluginError> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        loop {
            select! {
                recv(records) -> msg => {
                    let Ok(msg) = msg else { return Ok(()) };
                    self.write_line(&mut file, &msg)?;
                }
                recv(shutdown.channel()) -> _ => return Ok(()),
            }
        }
    }
}

register_output_plugin!(
    "file-writer",
    "appends one line per record to a file",
    FileWriter::default()
);
