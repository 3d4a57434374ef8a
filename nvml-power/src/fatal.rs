//! Start/stop wrappers for benchmark harnesses that have no way to recover
//! from a broken NVML setup: any failure is logged and the process exits.

use std::path::Path;
use tracing::error;

use crate::config::SamplerConfig;
use crate::error::SamplerError;
use crate::poller::SessionSummary;
use crate::sampler::PowerSampler;

/// Exit status used when sampling cannot start or stop cleanly.
pub const EXIT_FAILURE: i32 = 1;

/// Start sampling into `output` (or the default file), exiting the process
/// on failure.
pub fn start_or_exit<P: AsRef<Path>>(output: Option<P>) -> PowerSampler {
    let mut sampler = PowerSampler::new(SamplerConfig::from_output(output));
    if let Err(e) = sampler.start() {
        exit_with(&e);
    }
    sampler
}

/// Stop sampling, exiting the process if the session or NVML shutdown failed.
pub fn stop_or_exit(mut sampler: PowerSampler) -> SessionSummary {
    match sampler.stop() {
        Ok(summary) => summary,
        Err(e) => exit_with(&e),
    }
}

fn exit_with(err: &SamplerError) -> ! {
    match err.vendor_kind() {
        Some(kind) => error!("{} (NVML error code {})", err, kind.code()),
        None => error!("{}", err),
    }
    eprintln!("{}", err);
    std::process::exit(EXIT_FAILURE)
}
