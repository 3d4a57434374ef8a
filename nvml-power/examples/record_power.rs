use nvml_power::{start_or_exit, stop_or_exit};
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Any NVML setup or shutdown failure ends the process from here.
    let sampler = start_or_exit(std::env::args().nth(1));
    for device in sampler.devices() {
        info!("GPU {}: {} ({})", device.index, device.name, device.pci_bus_id);
    }
    let output = sampler.config().output.clone();

    std::thread::sleep(Duration::from_secs(5));

    let summary = stop_or_exit(sampler);
    info!(
        "Wrote {} samples to {} ({} power mode, {} power, {} temperature read failures)",
        summary.samples,
        output.display(),
        summary.power_mode_failures,
        summary.power_read_failures,
        summary.temperature_read_failures
    );
}
