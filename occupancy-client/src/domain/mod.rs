mod occupancy;

pub use occupancy::{saturation_rate, Category, OccupancyRecord, Subtype};
