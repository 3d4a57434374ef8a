use nvml_wrapper::Nvml;
use std::io::{Seek, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, info, warn};

use crate::error::{Result, SamplerError};
use crate::probe::{nvml, DeviceProbe, NvmlProbe};
use crate::sample::Sample;
use crate::sink::SampleSink;

/// What a finished polling session recorded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionSummary {
    /// Lines written, equal to the count stored in the file header
    pub samples: u64,
    /// Samples whose power management mode query failed (power left at zero)
    pub power_mode_failures: u64,
    /// Samples whose power read was attempted and failed
    pub power_read_failures: u64,
    /// Samples whose temperature read failed
    pub temperature_read_failures: u64,
}

/// Background thread sampling one device until stopped.
///
/// There is no delay between iterations; the rate is bounded only by how
/// fast the probe answers. An iteration always runs to completion before
/// the running flag is checked again.
pub struct Poller {
    running: Arc<AtomicBool>,
    handle: JoinHandle<Result<SessionSummary>>,
}

impl Poller {
    /// Poll an owned probe.
    pub fn spawn<P, W>(probe: P, sink: SampleSink<W>) -> Result<Self>
    where
        P: DeviceProbe + Send + 'static,
        W: Write + Seek + Send + 'static,
    {
        Self::launch(move |running| poll_loop(&probe, sink, running))
    }

    /// Poll GPU `index`. The device handle is resolved once on the polling
    /// thread and borrowed from `nvml` for the whole session.
    pub fn spawn_nvml<W>(nvml: Arc<Nvml>, index: u32, sink: SampleSink<W>) -> Result<Self>
    where
        W: Write + Seek + Send + 'static,
    {
        Self::launch(move |running| {
            let device = nvml::handle(&nvml, index)?;
            poll_loop(&NvmlProbe::new(device), sink, running)
        })
    }

    fn launch<F>(body: F) -> Result<Self>
    where
        F: FnOnce(&AtomicBool) -> Result<SessionSummary> + Send + 'static,
    {
        let running = Arc::new(AtomicBool::new(true));
        let flag = running.clone();

        let handle = thread::Builder::new()
            .name("power-poll".into())
            .spawn(move || body(&flag))
            .map_err(SamplerError::Spawn)?;

        debug!("Power polling thread started");
        Ok(Self { running, handle })
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire) && !self.handle.is_finished()
    }

    /// Clear the running flag and wait for the thread to exit.
    pub fn stop(self) -> Result<SessionSummary> {
        self.running.store(false, Ordering::Release);
        let summary = self
            .handle
            .join()
            .map_err(|_| SamplerError::PollerPanicked)??;

        info!(
            "Power polling stopped after {} sample(s) ({} power mode, {} power, {} temperature read failures)",
            summary.samples,
            summary.power_mode_failures,
            summary.power_read_failures,
            summary.temperature_read_failures
        );
        Ok(summary)
    }
}

/// Sample until `running` clears or a line cannot be written. The header is
/// finalized in both cases; a write failure is returned after that.
fn poll_loop<P, W>(probe: &P, mut sink: SampleSink<W>, running: &AtomicBool) -> Result<SessionSummary>
where
    P: DeviceProbe,
    W: Write + Seek,
{
    let mut summary = SessionSummary::default();
    let mut write_error = None;

    while running.load(Ordering::Acquire) {
        let sample = read_sample(probe, sink.count(), &mut summary);
        if let Err(e) = sink.append(&sample) {
            warn!("Failed to write sample {}: {}", sample.index, e);
            running.store(false, Ordering::Release);
            write_error = Some(e);
            break;
        }
    }

    let (samples, _) = sink.finish()?;
    summary.samples = samples;

    match write_error {
        Some(e) => Err(e),
        None => Ok(summary),
    }
}

fn read_sample<P: DeviceProbe>(probe: &P, index: u64, summary: &mut SessionSummary) -> Sample {
    let mut sample = Sample::new(index);

    let enabled = match probe.power_management_enabled() {
        Ok(enabled) => enabled,
        Err(e) => {
            warn!("NVML power management mode query fail: {} (code {})", e, e.code());
            summary.power_mode_failures += 1;
            false
        }
    };

    if enabled {
        match probe.power_usage_mw() {
            Ok(mw) => sample = sample.with_power_mw(mw),
            Err(e) => {
                warn!("NVML power measurement fail: {} (code {})", e, e.code());
                summary.power_read_failures += 1;
            }
        }
    }

    match probe.temperature_c() {
        Ok(c) => sample = sample.with_temperature(c),
        Err(e) => {
            warn!("NVML temp measurement fail: {} (code {})", e, e.code());
            summary.temperature_read_failures += 1;
        }
    }

    sample
}
