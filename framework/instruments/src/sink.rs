use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::encoder::{JsonRecordEncoder, RecordEncoder};
use crate::ResultRecord;

/// The name of the result file for one scenario of a run.
pub fn result_file_name(run_id: &str, scenario_name: &str) -> String {
    format!("{run_id}_{scenario_name}.json")
}

/// The result file for a single scenario execution.
///
/// The file is created when the sink is created and stays open until [ResultSink::close] is
/// called or the sink is dropped. Dropping a sink that was never closed flushes whatever has been
/// buffered and logs any failure, so a failed scenario still leaves its partial results on disk.
#[derive(Debug)]
pub struct ResultSink {
    path: PathBuf,
    encoder: JsonRecordEncoder<BufWriter<File>>,
    closed: bool,
}

impl ResultSink {
    /// Create (or truncate) `file_name` inside `dir`.
    ///
    /// The directory must already exist.
    pub fn create(dir: &Path, file_name: &str) -> anyhow::Result<Self> {
        let path = dir.join(file_name);
        let file = File::create(&path)
            .with_context(|| format!("Failed to create result file {}", path.display()))?;

        log::debug!("Opened result file {}", path.display());

        Ok(Self {
            path,
            encoder: JsonRecordEncoder::new(BufWriter::new(file)),
            closed: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn encoder(&mut self) -> &mut JsonRecordEncoder<BufWriter<File>> {
        &mut self.encoder
    }

    /// Flush all buffered records to disk and release the file.
    pub fn close(mut self) -> anyhow::Result<PathBuf> {
        self.closed = true;

        self.encoder
            .flush()
            .with_context(|| format!("Failed to flush result file {}", self.path.display()))?;
        self.encoder
            .get_ref()
            .get_ref()
            .sync_all()
            .with_context(|| format!("Failed to sync result file {}", self.path.display()))?;

        log::debug!(
            "Closed result file {} after {} records",
            self.path.display(),
            self.encoder.count()
        );

        Ok(self.path.clone())
    }
}

impl RecordEncoder for ResultSink {
    fn encode(&mut self, record: &ResultRecord) -> anyhow::Result<()> {
        self.encoder.encode(record)
    }
}

impl Drop for ResultSink {
    fn drop(&mut self) {
        if self.closed {
            return;
        }

        if let Err(e) = self.encoder.flush() {
            log::error!(
                "Failed to flush result file {} while discarding it: {:?}",
                self.path.display(),
                e
            );
        }
    }
}
