use nvml_wrapper::Nvml;
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::SamplerConfig;
use crate::error::{Result, SamplerError};
use crate::poller::{Poller, SessionSummary};
use crate::probe::{nvml, DeviceReport};
use crate::sink::SampleSink;

struct ActiveSession {
    nvml: Arc<Nvml>,
    poller: Poller,
}

/// Samples power and temperature of one GPU into a text file.
///
/// `start` brings NVML up and launches the polling thread; `stop` joins it,
/// finalizes the file and shuts NVML down. A sampler can be started again
/// after it has been stopped.
pub struct PowerSampler {
    config: SamplerConfig,
    devices: Vec<DeviceReport>,
    session: Option<ActiveSession>,
}

impl PowerSampler {
    pub fn new(config: SamplerConfig) -> Self {
        Self {
            config,
            devices: Vec::new(),
            session: None,
        }
    }

    pub fn config(&self) -> &SamplerConfig {
        &self.config
    }

    /// Devices seen by the last successful `start`.
    pub fn devices(&self) -> &[DeviceReport] {
        &self.devices
    }

    pub fn is_running(&self) -> bool {
        self.session.as_ref().is_some_and(|s| s.poller.is_running())
    }

    pub fn start(&mut self) -> Result<()> {
        if self.session.is_some() {
            return Err(SamplerError::AlreadyRunning);
        }

        let nvml = nvml::init()?;
        let devices = nvml::enumerate(&nvml)?;

        if devices.is_empty() {
            return Err(SamplerError::NoDevices);
        }
        let index = self.config.device_index;
        // Confirms the target resolves before anything is written.
        nvml::handle(&nvml, index)?;

        let sink = SampleSink::create(&self.config.output)?;
        let poller = Poller::spawn_nvml(nvml.clone(), index, sink)?;

        info!(
            "Sampling GPU {} into {}",
            index,
            self.config.output.display()
        );
        self.devices = devices;
        self.session = Some(ActiveSession { nvml, poller });
        Ok(())
    }

    pub fn stop(&mut self) -> Result<SessionSummary> {
        let session = self.session.take().ok_or(SamplerError::NotRunning)?;

        // NVML is shut down even if the polling thread reported an error.
        let polled = session.poller.stop();
        let shutdown = nvml::shutdown(session.nvml);

        let summary = polled?;
        shutdown?;
        Ok(summary)
    }
}

impl Drop for PowerSampler {
    fn drop(&mut self) {
        if self.session.is_some() {
            if let Err(e) = self.stop() {
                warn!("Failed to stop power sampler on drop: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stop_without_start() {
        let mut sampler = PowerSampler::new(SamplerConfig::default());
        assert!(matches!(sampler.stop(), Err(SamplerError::NotRunning)));
        assert!(!sampler.is_running());
    }

    #[test]
    fn test_power_sampler_session() {
        // This test will only pass on systems with NVIDIA GPUs
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("session.txt");

        let mut sampler = PowerSampler::new(SamplerConfig::default().with_output(&output));
        match sampler.start() {
            Ok(()) => {
                assert!(matches!(sampler.start(), Err(SamplerError::AlreadyRunning)));
                std::thread::sleep(std::time::Duration::from_millis(50));

                let summary = sampler.stop().unwrap();
                let text = std::fs::read_to_string(&output).unwrap();
                assert_eq!(text.lines().count() as u64, summary.samples + 2);
                println!("Recorded {} samples", summary.samples);
            }
            Err(e) => {
                println!("NVML not available: {}", e);
            }
        }
    }
}
