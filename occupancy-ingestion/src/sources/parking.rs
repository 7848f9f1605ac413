use occupancy_client::domain::{saturation_rate, Category, OccupancyRecord, Subtype};
use time::OffsetDateTime;

use crate::config::ParkingConfig;
use crate::pipeline::{Envelope, EnvelopeStream, PipelineError, Source};
use crate::sources::opendata::{field_i64, field_str, OpenDataClient, SearchResponse};

pub const SOURCE_NAME: &str = "parking";

const NAME_FIELD: &str = "nom";
const TOTAL_FIELD: &str = "total";
const FREE_FIELD: &str = "libres";
const UNKNOWN_NAME: &str = "Inconnu";

pub const CENTER_PARKINGS: [&str; 8] = [
    "Pey-Berland",
    "Tourny",
    "Bourse",
    "Jean Jaurès",
    "Mériadeck",
    "Grands Hommes",
    "Victor Hugo",
    "Salinières",
];

pub const PERIPHERY_PARKINGS: [&str; 9] = [
    "Buttinière",
    "Arlac",
    "Quatre Chemins",
    "Arts et Métiers",
    "Galin",
    "Stalingrad",
    "La Gardette",
    "Brandenburg",
    "Ravezies",
];

/// Tags parking structures as centre or park-and-ride by name.
///
/// Matching is a case-insensitive substring test; the centre list wins when a
/// name matches both.
#[derive(Debug, Clone)]
pub struct ParkingClassifier {
    center: Vec<String>,
    periphery: Vec<String>,
}

impl ParkingClassifier {
    pub fn new<C, P>(center: C, periphery: P) -> Self
    where
        C: IntoIterator,
        C::Item: AsRef<str>,
        P: IntoIterator,
        P::Item: AsRef<str>,
    {
        Self {
            center: center.into_iter().map(|n| n.as_ref().to_lowercase()).collect(),
            periphery: periphery.into_iter().map(|n| n.as_ref().to_lowercase()).collect(),
        }
    }

    pub fn classify(&self, name: &str) -> Option<Subtype> {
        let name = name.to_lowercase();

        if contains_any(&name, &self.center) {
            Some(Subtype::ParkingCentre)
        } else if contains_any(&name, &self.periphery) {
            Some(Subtype::ParkingRelay)
        } else {
            None
        }
    }
}

fn contains_any(name: &str, entries: &[String]) -> bool {
    entries.iter().any(|entry| name.contains(entry.as_str()))
}

impl Default for ParkingClassifier {
    fn default() -> Self {
        Self::new(CENTER_PARKINGS, PERIPHERY_PARKINGS)
    }
}

/// Map a parking-status search response to occupancy records.
///
/// Only classified structures with a positive capacity are kept.
pub fn extract_parking_records(
    resp: &SearchResponse,
    classifier: &ParkingClassifier,
    collected_at: OffsetDateTime,
) -> Vec<OccupancyRecord> {
    if resp.nhits == 0 {
        return Vec::new();
    }

    resp.records
        .iter()
        .filter_map(|record| {
            let fields = &record.fields;
            let name = field_str(fields, NAME_FIELD).unwrap_or(UNKNOWN_NAME);
            let total = field_i64(fields, TOTAL_FIELD).unwrap_or(0);
            let free = field_i64(fields, FREE_FIELD).unwrap_or(0);

            let subtype = classifier.classify(name)?;
            let occupied = total - free;
            let rate = saturation_rate(occupied, total)?;

            Some(OccupancyRecord::new(
                collected_at,
                Category::Mobility,
                subtype,
                name,
                occupied,
                total,
                rate,
            ))
        })
        .collect()
}

pub struct ParkingOccupancySource {
    client: OpenDataClient,
    config: ParkingConfig,
    classifier: ParkingClassifier,
}

impl ParkingOccupancySource {
    pub fn new(client: OpenDataClient, config: ParkingConfig, classifier: ParkingClassifier) -> Self {
        Self {
            client,
            config,
            classifier,
        }
    }
}

#[async_trait::async_trait]
impl Source<OccupancyRecord> for ParkingOccupancySource {
    fn name(&self) -> &'static str {
        SOURCE_NAME
    }

    async fn stream(&self, collected_at: OffsetDateTime) -> EnvelopeStream<OccupancyRecord> {
        let client = self.client.clone();
        let config = self.config.clone();
        let classifier = self.classifier.clone();
        let s = async_stream::try_stream! {
            let resp = client
                .search(&config.search_query())
                .await
                .map_err(|e| PipelineError::Source(format!("parking search failed: {e}")))?;

            for payload in extract_parking_records(&resp, &classifier, collected_at) {
                yield Envelope {
                    payload,
                    source: SOURCE_NAME,
                };
            }
        };

        Box::pin(s)
    }
}
