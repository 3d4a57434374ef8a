use nvml_wrapper::enum_wrappers::device::{ComputeMode, TemperatureSensor};
use nvml_wrapper::error::NvmlError;
use nvml_wrapper::{Device, Nvml};
use std::sync::Arc;
use tracing::{debug, info};

use super::DeviceProbe;
use crate::error::{Result, SamplerError, VendorError, VendorErrorKind};

/// Identity of one enumerated GPU, gathered to confirm it is usable.
#[derive(Debug, Clone)]
pub struct DeviceReport {
    pub index: u32,
    pub name: String,
    pub pci_bus_id: String,
    /// `None` when the device does not report a compute mode
    pub compute_mode: Option<ComputeMode>,
}

/// Initialize NVML.
pub fn init() -> Result<Arc<Nvml>> {
    info!("Initializing NVML for power sampling");
    let nvml = Nvml::init().map_err(|e| SamplerError::Init(e.into()))?;
    Ok(Arc::new(nvml))
}

/// Query every device NVML knows about, failing on the first one that
/// cannot be described.
pub fn enumerate(nvml: &Nvml) -> Result<Vec<DeviceReport>> {
    let count = nvml
        .device_count()
        .map_err(|e| SamplerError::DeviceCount(e.into()))?;
    info!("NVML found {} GPU(s)", count);

    (0..count).map(|i| describe_device(nvml, i)).collect()
}

/// Resolve the handle for `index` and read its name, PCI info and compute mode.
pub fn describe_device(nvml: &Nvml, index: u32) -> Result<DeviceReport> {
    let device = handle(nvml, index)?;

    let name = device.name().map_err(|e| SamplerError::DeviceName {
        index,
        source: e.into(),
    })?;

    let pci = device.pci_info().map_err(|e| SamplerError::PciInfo {
        index,
        source: e.into(),
    })?;

    let compute_mode = match device.compute_mode() {
        Ok(mode) => Some(mode),
        Err(NvmlError::NotSupported) => {
            info!("GPU {} ({}) is not a CUDA-capable device", index, name);
            None
        }
        Err(e) => {
            return Err(SamplerError::ComputeMode {
                index,
                source: e.into(),
            })
        }
    };

    debug!(
        "GPU {}: {} at {}, compute mode {:?}",
        index, name, pci.bus_id, compute_mode
    );

    Ok(DeviceReport {
        index,
        name,
        pci_bus_id: pci.bus_id,
        compute_mode,
    })
}

/// Resolve the device handle for `index`.
pub fn handle(nvml: &Nvml, index: u32) -> Result<Device<'_>> {
    nvml.device_by_index(index)
        .map_err(|e| SamplerError::DeviceHandle {
            index,
            source: e.into(),
        })
}

/// Shut NVML down. Fails with `Shutdown` if another owner still holds it.
pub fn shutdown(nvml: Arc<Nvml>) -> Result<()> {
    match Arc::try_unwrap(nvml) {
        Ok(nvml) => {
            nvml.shutdown().map_err(|e| SamplerError::Shutdown(e.into()))?;
            info!("NVML shut down");
            Ok(())
        }
        Err(_) => Err(SamplerError::Shutdown(VendorError::new(
            VendorErrorKind::Other,
            "NVML is still in use by another owner",
        ))),
    }
}

/// [`DeviceProbe`] backed by an NVML device handle resolved once up front.
pub struct NvmlProbe<'nvml> {
    device: Device<'nvml>,
}

impl<'nvml> NvmlProbe<'nvml> {
    pub fn new(device: Device<'nvml>) -> Self {
        Self { device }
    }
}

impl DeviceProbe for NvmlProbe<'_> {
    #[allow(deprecated)]
    fn power_management_enabled(&self) -> std::result::Result<bool, VendorError> {
        Ok(self.device.is_power_management_algo_active()?)
    }

    fn power_usage_mw(&self) -> std::result::Result<u32, VendorError> {
        Ok(self.device.power_usage()?)
    }

    fn temperature_c(&self) -> std::result::Result<u32, VendorError> {
        Ok(self.device.temperature(TemperatureSensor::Gpu)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nvml_enumeration() {
        // This test will only pass on systems with NVIDIA GPUs
        match init() {
            Ok(nvml) => {
                let reports = enumerate(&nvml).unwrap();
                for r in &reports {
                    println!("GPU {}: {} ({})", r.index, r.name, r.pci_bus_id);
                    assert!(!r.name.is_empty());
                }

                if !reports.is_empty() {
                    let probe = NvmlProbe::new(handle(&nvml, 0).unwrap());
                    match probe.temperature_c() {
                        Ok(t) => assert!(t < 120),
                        Err(e) => println!("Temperature unavailable: {} (code {})", e, e.code()),
                    }
                }

                shutdown(nvml).unwrap();
            }
            Err(e) => {
                println!("NVML not available: {}", e);
            }
        }
    }
}
