use std::fs::File;
use std::io::{BufWriter, Seek, SeekFrom, Write};
use std::path::Path;

use tracing::debug;

use crate::error::Result;
use crate::sample::{header_line, reserved_header, Sample};

/// Text file of samples with a header rewritten once sampling ends.
///
/// Layout: the reserved header line, a blank line, then one line per
/// sample. `finish` overwrites the header in place with the sample count.
pub struct SampleSink<W: Write + Seek> {
    writer: W,
    count: u64,
}

impl SampleSink<BufWriter<File>> {
    /// Create (or truncate) the output file and reserve its header.
    pub fn create(path: &Path) -> Result<Self> {
        debug!("Opening sample output {}", path.display());
        let file = File::create(path)?;
        Self::new(BufWriter::new(file))
    }
}

impl<W: Write + Seek> SampleSink<W> {
    pub fn new(mut writer: W) -> Result<Self> {
        writeln!(writer, "{}", reserved_header())?;
        writeln!(writer)?;
        Ok(Self { writer, count: 0 })
    }

    /// Write one sample line. The line goes out in a single `write_all`, and
    /// the count only moves once it has been accepted.
    pub fn append(&mut self, sample: &Sample) -> Result<()> {
        let mut line = sample.to_line();
        line.push('\n');
        self.writer.write_all(line.as_bytes())?;
        self.count += 1;
        Ok(())
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    /// Rewrite the header with the final count and flush.
    pub fn finish(mut self) -> Result<(u64, W)> {
        self.writer.seek(SeekFrom::Start(0))?;
        write!(self.writer, "{}", header_line(self.count))?;
        self.writer.flush()?;
        Ok((self.count, self.writer))
    }
}
