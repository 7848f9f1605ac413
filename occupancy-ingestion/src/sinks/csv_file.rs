use std::{
    collections::BTreeMap,
    fs::{File, OpenOptions},
    path::PathBuf,
};

use futures::StreamExt;
use occupancy_client::domain::OccupancyRecord;

use crate::pipeline::{Envelope, PipelineError, Sink};

/// Append-only CSV history of occupancy records.
///
/// The header row is written only when the file does not exist yet. The file
/// is opened on the first record, so an empty stream leaves the disk untouched.
pub struct CsvFileSink {
    path: PathBuf,
}

impl CsvFileSink {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    fn open_writer(&self) -> Result<csv::Writer<File>, PipelineError> {
        let is_new = !self.path.exists();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| {
                PipelineError::Sink(format!("failed to open {}: {e}", self.path.display()))
            })?;

        tracing::debug!(path = %self.path.display(), is_new, "opened occupancy history");

        Ok(csv::WriterBuilder::new()
            .has_headers(is_new)
            .from_writer(file))
    }
}

#[async_trait::async_trait]
impl Sink<OccupancyRecord> for CsvFileSink {
    async fn run<S>(&self, mut input: S) -> Result<usize, PipelineError>
    where
        S: futures::Stream<Item = Result<Envelope<OccupancyRecord>, PipelineError>>
            + Send
            + Unpin
            + 'static,
    {
        let mut writer: Option<csv::Writer<File>> = None;
        let mut written = 0;
        let mut per_source: BTreeMap<&'static str, usize> = BTreeMap::new();

        while let Some(item) = input.next().await {
            let env = item?;

            if writer.is_none() {
                writer = Some(self.open_writer()?);
            }
            if let Some(w) = writer.as_mut() {
                w.serialize(&env.payload)
                    .map_err(|e| PipelineError::Sink(format!("failed to write row: {e}")))?;
                written += 1;
                *per_source.entry(env.source).or_default() += 1;
            }
        }

        if let Some(mut w) = writer {
            w.flush().map_err(|e| {
                PipelineError::Sink(format!("failed to flush {}: {e}", self.path.display()))
            })?;
        }

        for (source, rows) in &per_source {
            tracing::debug!(source, rows, path = %self.path.display(), "rows appended");
        }

        Ok(written)
    }
}
