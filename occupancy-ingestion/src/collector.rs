//! Wiring of the pool and parking sources into the CSV history.

use occupancy_client::domain::OccupancyRecord;
use time::OffsetDateTime;

use crate::config::AppConfig;
use crate::pipeline::{Pipeline, Source};
use crate::sinks::CsvFileSink;
use crate::sources::{
    opendata::FetchError, OpenDataClient, ParkingClassifier, ParkingOccupancySource,
    PoolOccupancySource,
};

pub type OccupancyPipeline = Pipeline<OccupancyRecord, CsvFileSink>;

/// Pool source first, then parking, both appending to `output.path`.
pub fn build_pipeline(cfg: &AppConfig) -> Result<OccupancyPipeline, FetchError> {
    build_pipeline_with(cfg, ParkingClassifier::default())
}

pub fn build_pipeline_with(
    cfg: &AppConfig,
    classifier: ParkingClassifier,
) -> Result<OccupancyPipeline, FetchError> {
    let client = OpenDataClient::new(cfg.api.base_url.clone())?;

    let sources: Vec<Box<dyn Source<OccupancyRecord>>> = vec![
        Box::new(PoolOccupancySource::new(client.clone(), cfg.pool.clone())),
        Box::new(ParkingOccupancySource::new(
            client,
            cfg.parking.clone(),
            classifier,
        )),
    ];

    Ok(Pipeline {
        sources,
        sink: CsvFileSink::new(cfg.output.path.clone()),
    })
}

/// Collection timestamp shared by every record of a run.
///
/// Call before any worker thread exists: the local offset can only be read
/// while the process is single-threaded. Falls back to UTC otherwise.
pub fn collection_timestamp() -> OffsetDateTime {
    OffsetDateTime::now_local().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "local UTC offset unavailable, stamping records in UTC");
        OffsetDateTime::now_utc()
    })
}
