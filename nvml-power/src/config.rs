use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// File written when no output path is given.
pub const DEFAULT_OUTPUT: &str = "Power_data.txt";

/// Sampler configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SamplerConfig {
    /// File the samples are written to (truncated on start)
    #[serde(default = "default_output")]
    pub output: PathBuf,

    /// NVML index of the polled GPU
    #[serde(default)]
    pub device_index: u32,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            output: default_output(),
            device_index: 0,
        }
    }
}

impl SamplerConfig {
    /// Build a config from an optional output path, falling back to
    /// [`DEFAULT_OUTPUT`].
    pub fn from_output<P: AsRef<Path>>(output: Option<P>) -> Self {
        match output {
            Some(path) => Self::default().with_output(path),
            None => Self::default(),
        }
    }

    pub fn with_output(mut self, output: impl AsRef<Path>) -> Self {
        self.output = output.as_ref().to_path_buf();
        self
    }
}

fn default_output() -> PathBuf {
    PathBuf::from(DEFAULT_OUTPUT)
}
