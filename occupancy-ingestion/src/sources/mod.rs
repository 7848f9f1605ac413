pub mod opendata;
pub mod parking;
pub mod pool;

pub use opendata::{OpenDataClient, SearchQuery, SearchResponse};
pub use parking::{ParkingClassifier, ParkingOccupancySource};
pub use pool::PoolOccupancySource;
