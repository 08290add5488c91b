//! The two data pipelines bridging long-running plugin logic to the
//! host's call-and-return entry points.

pub mod input;
pub mod output;

use std::time::Duration;

/// Cadence of the sampling worker's calls into user `collect`.
pub const COLLECT_INTERVAL: Duration = Duration::from_micros(1);

/// The redistributor releases the drain lock at least once per window,
/// so a continuously producing collector cannot starve the host drain.
pub const REDISTRIBUTE_WINDOW: Duration = Duration::from_secs(1);

/// Capacity of the staging queue between sampler and redistributor.
pub const STAGING_CAPACITY: usize = 16;

/// Capacity of the primary buffer drained by the host. Sized to absorb a
/// full redistribution window of production; a producer that outruns it
/// stalls rather than drops.
pub const PRIMARY_CAPACITY: usize = 300_000;

pub use input::InputPipeline;
pub use output::OutputPipeline;
