use occupancy_client::domain::{saturation_rate, Category, OccupancyRecord, Subtype};
use time::OffsetDateTime;

use crate::config::PoolConfig;
use crate::pipeline::{Envelope, EnvelopeStream, PipelineError, Source};
use crate::sources::opendata::{field_i64, field_str, OpenDataClient, SearchResponse};

pub const SOURCE_NAME: &str = "pool";

const OCCUPANCY_FIELD: &str = "fmicourante";
const ZONE_MAX_FIELD: &str = "fmizonmax";
const ZONE_LABEL_FIELD: &str = "fmizonlib";

/// Map a pool-attendance search response to occupancy records.
///
/// Records missing the current occupancy or the zone maximum are skipped.
/// A zone without capacity gets a saturation rate of 0.
pub fn extract_pool_records(
    resp: &SearchResponse,
    config: &PoolConfig,
    collected_at: OffsetDateTime,
) -> Vec<OccupancyRecord> {
    if resp.nhits == 0 {
        return Vec::new();
    }

    resp.records
        .iter()
        .filter_map(|record| {
            let fields = &record.fields;
            let occupied = field_i64(fields, OCCUPANCY_FIELD)?;
            let capacity = field_i64(fields, ZONE_MAX_FIELD)?;
            let zone = field_str(fields, ZONE_LABEL_FIELD).unwrap_or(config.default_zone.as_str());

            Some(OccupancyRecord::new(
                collected_at,
                Category::Pool,
                Subtype::Sport,
                format!("{} - {zone}", config.facility),
                occupied,
                capacity,
                saturation_rate(occupied, capacity).unwrap_or(0.0),
            ))
        })
        .collect()
}

pub struct PoolOccupancySource {
    client: OpenDataClient,
    config: PoolConfig,
}

impl PoolOccupancySource {
    pub fn new(client: OpenDataClient, config: PoolConfig) -> Self {
        Self { client, config }
    }
}

#[async_trait::async_trait]
impl Source<OccupancyRecord> for PoolOccupancySource {
    fn name(&self) -> &'static str {
        SOURCE_NAME
    }

    async fn stream(&self, collected_at: OffsetDateTime) -> EnvelopeStream<OccupancyRecord> {
        let client = self.client.clone();
        let config = self.config.clone();
        let s = async_stream::try_stream! {
            let resp = client
                .search(&config.search_query())
                .await
                .map_err(|e| PipelineError::Source(format!("pool search failed: {e}")))?;

            for payload in extract_pool_records(&resp, &config, collected_at) {
                yield Envelope {
                    payload,
                    source: SOURCE_NAME,
                };
            }
        };

        Box::pin(s)
    }
}
