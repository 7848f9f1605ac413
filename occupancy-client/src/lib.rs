pub mod domain;

pub use domain::{Category, OccupancyRecord, Subtype};
