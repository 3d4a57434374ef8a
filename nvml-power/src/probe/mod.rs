pub mod nvml;

pub use nvml::{DeviceReport, NvmlProbe};

use crate::error::VendorError;

/// The per-iteration queries the polling loop issues against one GPU.
pub trait DeviceProbe {
    /// Whether the device reports power management (and so power draw).
    fn power_management_enabled(&self) -> Result<bool, VendorError>;

    /// Instantaneous power draw in milliwatts.
    fn power_usage_mw(&self) -> Result<u32, VendorError>;

    /// GPU core temperature in degrees Celsius.
    fn temperature_c(&self) -> Result<u32, VendorError>;
}
