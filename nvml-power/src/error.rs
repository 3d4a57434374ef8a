use nvml_wrapper::error::NvmlError;
use thiserror::Error;

/// Classification of a failed vendor library call.
///
/// `code()` yields the small integer callers have historically switched on;
/// conditions with no dedicated variant collapse into `Other` (code 0).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VendorErrorKind {
    Uninitialized,
    InvalidArgument,
    NotSupported,
    NoPermission,
    AlreadyInitialized,
    NotFound,
    InsufficientSize,
    InsufficientPower,
    DriverNotLoaded,
    Timeout,
    IrqIssue,
    LibraryNotFound,
    FunctionNotFound,
    CorruptedInforom,
    GpuLost,
    Unknown,
    Other,
}

impl VendorErrorKind {
    pub fn code(self) -> u8 {
        match self {
            VendorErrorKind::Other => 0,
            VendorErrorKind::Uninitialized => 1,
            VendorErrorKind::InvalidArgument => 2,
            VendorErrorKind::NotSupported => 3,
            VendorErrorKind::NoPermission => 4,
            VendorErrorKind::AlreadyInitialized => 5,
            VendorErrorKind::NotFound => 6,
            VendorErrorKind::InsufficientSize => 7,
            VendorErrorKind::InsufficientPower => 8,
            VendorErrorKind::DriverNotLoaded => 9,
            VendorErrorKind::Timeout => 10,
            VendorErrorKind::IrqIssue => 11,
            VendorErrorKind::LibraryNotFound => 12,
            VendorErrorKind::FunctionNotFound => 13,
            VendorErrorKind::CorruptedInforom => 14,
            VendorErrorKind::GpuLost => 15,
            VendorErrorKind::Unknown => 16,
        }
    }
}

impl From<&NvmlError> for VendorErrorKind {
    #[allow(deprecated)]
    fn from(err: &NvmlError) -> Self {
        match err {
            NvmlError::Uninitialized => VendorErrorKind::Uninitialized,
            NvmlError::InvalidArg => VendorErrorKind::InvalidArgument,
            NvmlError::NotSupported => VendorErrorKind::NotSupported,
            NvmlError::NoPermission => VendorErrorKind::NoPermission,
            NvmlError::AlreadyInitialized => VendorErrorKind::AlreadyInitialized,
            NvmlError::NotFound => VendorErrorKind::NotFound,
            NvmlError::InsufficientSize(_) => VendorErrorKind::InsufficientSize,
            NvmlError::InsufficientPower => VendorErrorKind::InsufficientPower,
            NvmlError::DriverNotLoaded => VendorErrorKind::DriverNotLoaded,
            NvmlError::Timeout => VendorErrorKind::Timeout,
            NvmlError::IrqIssue => VendorErrorKind::IrqIssue,
            NvmlError::LibraryNotFound | NvmlError::LibloadingError(_) => {
                VendorErrorKind::LibraryNotFound
            }
            NvmlError::FunctionNotFound | NvmlError::FailedToLoadSymbol(_) => {
                VendorErrorKind::FunctionNotFound
            }
            NvmlError::CorruptedInfoROM => VendorErrorKind::CorruptedInforom,
            NvmlError::GpuLost => VendorErrorKind::GpuLost,
            NvmlError::Unknown => VendorErrorKind::Unknown,
            _ => VendorErrorKind::Other,
        }
    }
}

/// A failed vendor call together with its classification.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct VendorError {
    pub kind: VendorErrorKind,
    pub message: String,
}

impl VendorError {
    pub fn new(kind: VendorErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn code(&self) -> u8 {
        self.kind.code()
    }
}

impl From<NvmlError> for VendorError {
    fn from(err: NvmlError) -> Self {
        Self {
            kind: VendorErrorKind::from(&err),
            message: err.to_string(),
        }
    }
}

#[derive(Error, Debug)]
pub enum SamplerError {
    #[error("NVML init fail: {0}")]
    Init(#[source] VendorError),

    #[error("Failed to query device count: {0}")]
    DeviceCount(#[source] VendorError),

    #[error("No GPU devices found")]
    NoDevices,

    #[error("Failed to get handle for device {index}: {source}")]
    DeviceHandle { index: u32, source: VendorError },

    #[error("Failed to get name of device {index}: {source}")]
    DeviceName { index: u32, source: VendorError },

    #[error("Failed to get PCI info of device {index}: {source}")]
    PciInfo { index: u32, source: VendorError },

    #[error("Failed to get compute mode for device {index}: {source}")]
    ComputeMode { index: u32, source: VendorError },

    #[error("Failed to shut down NVML: {0}")]
    Shutdown(#[source] VendorError),

    #[error("Failed to spawn polling thread: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Sampler is already running")]
    AlreadyRunning,

    #[error("Sampler is not running")]
    NotRunning,

    #[error("Polling thread panicked")]
    PollerPanicked,
}

impl SamplerError {
    /// Vendor classification of the underlying failure, if it came from NVML.
    pub fn vendor_kind(&self) -> Option<VendorErrorKind> {
        match self {
            SamplerError::Init(e) | SamplerError::DeviceCount(e) | SamplerError::Shutdown(e) => {
                Some(e.kind)
            }
            SamplerError::DeviceHandle { source, .. }
            | SamplerError::DeviceName { source, .. }
            | SamplerError::PciInfo { source, .. }
            | SamplerError::ComputeMode { source, .. } => Some(source.kind),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, SamplerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification_codes() {
        assert_eq!(VendorErrorKind::from(&NvmlError::Uninitialized).code(), 1);
        assert_eq!(VendorErrorKind::from(&NvmlError::InvalidArg).code(), 2);
        assert_eq!(VendorErrorKind::from(&NvmlError::NotSupported).code(), 3);
        assert_eq!(VendorErrorKind::from(&NvmlError::NoPermission).code(), 4);
        #[allow(deprecated)]
        let already = NvmlError::AlreadyInitialized;
        assert_eq!(VendorErrorKind::from(&already).code(), 5);
        assert_eq!(VendorErrorKind::from(&NvmlError::InsufficientSize(None)).code(), 7);
        assert_eq!(VendorErrorKind::from(&NvmlError::DriverNotLoaded).code(), 9);
        assert_eq!(VendorErrorKind::from(&NvmlError::GpuLost).code(), 15);
        assert_eq!(VendorErrorKind::from(&NvmlError::Unknown).code(), 16);
    }

    #[test]
    fn test_unmapped_errors_are_zero() {
        assert_eq!(VendorErrorKind::from(&NvmlError::UnexpectedVariant(99)), VendorErrorKind::Other);
        assert_eq!(VendorErrorKind::Other.code(), 0);
    }

    #[test]
    fn test_vendor_kind_surfaces_through_sampler_error() {
        let err = SamplerError::PciInfo {
            index: 2,
            source: VendorError::from(NvmlError::NoPermission),
        };
        assert_eq!(err.vendor_kind(), Some(VendorErrorKind::NoPermission));
        assert!(err.to_string().starts_with("Failed to get PCI info of device 2"));

        assert_eq!(SamplerError::NotRunning.vendor_kind(), None);
    }
}
