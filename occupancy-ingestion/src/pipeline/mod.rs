use std::pin::Pin;

use futures::{Stream, StreamExt};
use time::OffsetDateTime;

#[derive(Debug, Clone)]
pub struct Envelope<T> {
    pub payload: T,
    /// Name of the source that produced the payload; sinks report row counts by it.
    pub source: &'static str,
}

#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    #[error("source error: {0}")]
    Source(String),
    #[error("sink error: {0}")]
    Sink(String),
}

pub type EnvelopeStream<T> = Pin<Box<dyn Stream<Item = Result<Envelope<T>, PipelineError>> + Send>>;

#[async_trait::async_trait]
pub trait Source<T>: Send + Sync {
    fn name(&self) -> &'static str;

    /// Stream every record of one collection run, all stamped with `collected_at`.
    async fn stream(&self, collected_at: OffsetDateTime) -> EnvelopeStream<T>;
}

#[async_trait::async_trait]
pub trait Sink<T>: Send + Sync {
    /// Persist the stream and return how many records were written.
    async fn run<S>(&self, input: S) -> Result<usize, PipelineError>
    where
        S: Stream<Item = Result<Envelope<T>, PipelineError>> + Send + Unpin + 'static;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceOutcome {
    pub name: &'static str,
    pub records: usize,
    pub failed: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub sources: Vec<SourceOutcome>,
    pub rows_written: usize,
}

impl RunSummary {
    pub fn failed_sources(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.sources.iter().filter(|s| s.failed).map(|s| s.name)
    }
}

/// Runs every source in order, then hands the combined records to the sink.
///
/// A failing source contributes no records and never stops the sources after
/// it. The sink is only invoked when at least one record was collected.
pub struct Pipeline<T, K> {
    pub sources: Vec<Box<dyn Source<T>>>,
    pub sink: K,
}

impl<T, K> Pipeline<T, K>
where
    T: Send + Unpin + 'static,
    K: Sink<T> + Send + Sync + 'static,
{
    pub async fn run(self, collected_at: OffsetDateTime) -> Result<RunSummary, PipelineError> {
        let mut summary = RunSummary::default();
        let mut collected: Vec<Envelope<T>> = Vec::new();

        for source in &self.sources {
            let name = source.name();
            match drain(source.as_ref(), collected_at).await {
                Ok(batch) => {
                    tracing::debug!(source = name, records = batch.len(), "source drained");
                    summary.sources.push(SourceOutcome {
                        name,
                        records: batch.len(),
                        failed: false,
                    });
                    collected.extend(batch);
                }
                Err(e) => {
                    tracing::error!(source = name, error = %e, "occupancy source failed; no records for this source");
                    summary.sources.push(SourceOutcome {
                        name,
                        records: 0,
                        failed: true,
                    });
                }
            }
        }

        if collected.is_empty() {
            return Ok(summary);
        }

        let input = futures::stream::iter(collected.into_iter().map(Ok));
        summary.rows_written = self.sink.run(input).await?;

        Ok(summary)
    }
}

async fn drain<T>(
    source: &dyn Source<T>,
    collected_at: OffsetDateTime,
) -> Result<Vec<Envelope<T>>, PipelineError> {
    let mut stream = source.stream(collected_at).await;
    let mut out = Vec::new();
    while let Some(item) = stream.next().await {
        out.push(item?);
    }
    Ok(out)
}
