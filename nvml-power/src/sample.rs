/// Width in bytes of the header region reserved at the top of the output.
pub const HEADER_WIDTH: usize = 50;

/// One power/temperature reading pair.
///
/// `None` marks a reading that was skipped or failed. The text format
/// writes those as zero, so they only stay distinguishable in memory and in
/// the session summary.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub index: u64,
    pub power_w: Option<f64>,
    pub temperature_c: Option<u32>,
}

impl Sample {
    pub fn new(index: u64) -> Self {
        Self {
            index,
            power_w: None,
            temperature_c: None,
        }
    }

    /// Record a power reading given in milliwatts.
    pub fn with_power_mw(mut self, milliwatts: u32) -> Self {
        self.power_w = Some(f64::from(milliwatts) / 1000.0);
        self
    }

    pub fn with_temperature(mut self, celsius: u32) -> Self {
        self.temperature_c = Some(celsius);
        self
    }

    /// `"<watts, 3 decimals>, <celsius>"`, no trailing newline.
    pub fn to_line(&self) -> String {
        format!(
            "{:.3}, {}",
            self.power_w.unwrap_or(0.0),
            self.temperature_c.unwrap_or(0)
        )
    }
}

/// The blank region written before any samples exist.
pub fn reserved_header() -> String {
    " ".repeat(HEADER_WIDTH)
}

/// Final header, padded to [`HEADER_WIDTH`] so it fits the reserved region.
pub fn header_line(count: u64) -> String {
    format!("{:<width$}", format!("number of samples, {}", count), width = HEADER_WIDTH)
}
