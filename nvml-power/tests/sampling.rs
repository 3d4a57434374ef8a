use nvml_power::{
    DeviceProbe, Poller, SampleSink, SamplerConfig, VendorError, VendorErrorKind, DEFAULT_OUTPUT,
};
use pretty_assertions::assert_eq;
use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Ramps power by 1 W per read and fails every third temperature read.
struct RampProbe {
    reads: Arc<AtomicU32>,
}

impl DeviceProbe for RampProbe {
    fn power_management_enabled(&self) -> Result<bool, VendorError> {
        Ok(true)
    }

    fn power_usage_mw(&self) -> Result<u32, VendorError> {
        Ok(100_000 + self.reads.load(Ordering::SeqCst) * 1_000)
    }

    fn temperature_c(&self) -> Result<u32, VendorError> {
        let n = self.reads.fetch_add(1, Ordering::SeqCst);
        if n % 3 == 2 {
            Err(VendorError::new(VendorErrorKind::Unknown, "Unknown Error"))
        } else {
            Ok(60)
        }
    }
}

struct PowerManagementOff;

impl DeviceProbe for PowerManagementOff {
    fn power_management_enabled(&self) -> Result<bool, VendorError> {
        Ok(false)
    }

    fn power_usage_mw(&self) -> Result<u32, VendorError> {
        panic!("power must not be read while power management is disabled");
    }

    fn temperature_c(&self) -> Result<u32, VendorError> {
        Ok(35)
    }
}

fn read_output(path: &Path) -> (String, Vec<String>) {
    let text = std::fs::read_to_string(path).unwrap();
    let mut lines = text.lines().map(str::to_string);
    let header = lines.next().unwrap();
    assert_eq!(lines.next().as_deref(), Some(""));
    (header, lines.collect())
}

#[test]
fn test_file_header_matches_samples() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ramp.txt");

    let reads = Arc::new(AtomicU32::new(0));
    let sink = SampleSink::create(&path).unwrap();
    let poller = Poller::spawn(RampProbe { reads: reads.clone() }, sink).unwrap();
    while reads.load(Ordering::SeqCst) < 6 {
        std::thread::yield_now();
    }
    let summary = poller.stop().unwrap();

    let (header, data) = read_output(&path);
    assert_eq!(header.trim_end(), format!("number of samples, {}", summary.samples));
    assert_eq!(data.len() as u64, summary.samples);
    assert!(summary.temperature_read_failures >= 2);
    assert_eq!(summary.power_read_failures, 0);

    assert_eq!(data[0], "100.000, 60");
    assert_eq!(data[1], "101.000, 60");
    assert_eq!(data[2], "102.000, 0");
    assert_eq!(data[3], "103.000, 60");
}

#[test]
fn test_finished_sink_without_samples() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("empty.txt");

    let sink = SampleSink::create(&path).unwrap();
    let (count, _) = sink.finish().unwrap();
    assert_eq!(count, 0);

    let (header, data) = read_output(&path);
    assert_eq!(header.trim_end(), "number of samples, 0");
    assert!(data.is_empty());
}

#[test]
fn test_disabled_power_management_writes_zero_power() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pm_off.txt");

    let poller = Poller::spawn(PowerManagementOff, SampleSink::create(&path).unwrap()).unwrap();
    std::thread::sleep(Duration::from_millis(10));
    let summary = poller.stop().unwrap();

    let (_, data) = read_output(&path);
    assert_eq!(data.len() as u64, summary.samples);
    assert!(data.iter().all(|line| line == "0.000, 35"));
}

#[test]
fn test_stop_waits_for_thread_exit() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("join.txt");

    let poller = Poller::spawn(PowerManagementOff, SampleSink::create(&path).unwrap()).unwrap();
    assert!(poller.is_running());
    let summary = poller.stop().unwrap();

    // Nothing is appended once stop has returned.
    let (_, before) = read_output(&path);
    std::thread::sleep(Duration::from_millis(10));
    let (_, after) = read_output(&path);
    assert_eq!(before, after);
    assert_eq!(after.len() as u64, summary.samples);
}

#[test]
fn test_default_output_location() {
    assert_eq!(
        SamplerConfig::from_output(None::<&str>).output,
        SamplerConfig::from_output(Some(DEFAULT_OUTPUT)).output
    );
}
