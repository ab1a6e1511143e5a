use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use super::{Sink, WriteReceipt};
use crate::error::WriteError;
use crate::snapshot::SensorSnapshot;

/// Local spreadsheet: one CSV row per snapshot, header on the first write.
pub struct CsvSink {
    path: PathBuf,
}

impl CsvSink {
    pub fn new(path: &Path) -> Self {
        CsvSink {
            path: path.to_path_buf(),
        }
    }
}

impl Sink for CsvSink {
    fn name(&self) -> &'static str {
        "csv"
    }

    fn write(&mut self, snapshot: &SensorSnapshot) -> Result<WriteReceipt, WriteError> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let is_new = file.metadata()?.len() == 0;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(is_new)
            .from_writer(file);
        writer.serialize(snapshot)?;
        writer.flush()?;

        Ok(WriteReceipt {
            location: self.path.display().to_string(),
        })
    }
}
