// Re-export main components for easy access
pub use config::{SamplerConfig, DEFAULT_OUTPUT};
pub use error::{Result, SamplerError, VendorError, VendorErrorKind};
pub use fatal::{start_or_exit, stop_or_exit};
pub use poller::{Poller, SessionSummary};
pub use probe::{DeviceProbe, DeviceReport, NvmlProbe};
pub use sample::Sample;
pub use sampler::PowerSampler;
pub use sink::SampleSink;

pub mod config;
pub mod error;
pub mod fatal;
pub mod poller;
pub mod probe;
pub mod sample;
pub mod sampler;
pub mod sink;

/// Version of the nvml-power library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get library version
pub fn version() -> &'static str {
    VERSION
}
