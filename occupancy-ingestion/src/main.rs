use anyhow::Result;
use occupancy_ingestion::{
    collector::{build_pipeline, collection_timestamp},
    config::AppConfig,
    observability,
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    observability::init_tracing();

    let collected_at = collection_timestamp();

    let cfg = AppConfig::load()?;
    let pipeline = build_pipeline(&cfg)?;

    // Per-source failures are logged by the pipeline; only sink errors surface here.
    let summary = pipeline.run(collected_at).await?;

    if summary.rows_written > 0 {
        tracing::info!(
            rows = summary.rows_written,
            path = %cfg.output.path.display(),
            "{} rows appended (pool + parking)",
            summary.rows_written
        );
    } else {
        tracing::warn!(
            failed_sources = ?summary.failed_sources().collect::<Vec<_>>(),
            "no occupancy data retrieved"
        );
    }

    Ok(())
}
