use std::io::Write;

use anyhow::Context;

use crate::ResultRecord;

/// Accepts result records one at a time and appends them to some output.
pub trait RecordEncoder {
    fn encode(&mut self, record: &ResultRecord) -> anyhow::Result<()>;
}

/// Writes each record as a single line of JSON.
#[derive(Debug)]
pub struct JsonRecordEncoder<W: Write> {
    writer: W,
    count: u64,
}

impl<W: Write> JsonRecordEncoder<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, count: 0 }
    }

    /// The number of records written so far.
    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn flush(&mut self) -> anyhow::Result<()> {
        self.writer.flush().context("Failed to flush result records")
    }

    pub fn get_ref(&self) -> &W {
        &self.writer
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> RecordEncoder for JsonRecordEncoder<W> {
    fn encode(&mut self, record: &ResultRecord) -> anyhow::Result<()> {
        serde_json::to_writer(&mut self.writer, record).context("Failed to encode result record")?;
        self.writer
            .write_all(b"\n")
            .context("Failed to write result record")?;
        self.count += 1;

        Ok(())
    }
}
