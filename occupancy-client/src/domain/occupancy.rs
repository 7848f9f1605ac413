use std::fmt;

use time::OffsetDateTime;

/// Top-level facility category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Pool,
    Mobility,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pool => "Piscine",
            Self::Mobility => "Mobilité",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Finer classification inside a [`Category`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Subtype {
    Sport,
    /// Parking structure in the city centre.
    ParkingCentre,
    /// Park-and-ride structure on the periphery.
    ParkingRelay,
}

impl Subtype {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sport => "Sport",
            Self::ParkingCentre => "Parking Centre",
            Self::ParkingRelay => "Parking P+R",
        }
    }
}

impl fmt::Display for Subtype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One occupancy observation for a pool zone or a parking structure.
///
/// Field order matches the persisted column order:
/// `date, heure, type, sous_type, nom, occupe, capacite, taux_saturation`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct OccupancyRecord {
    #[cfg_attr(feature = "serde", serde(with = "collected_at"))]
    pub date: OffsetDateTime,
    #[cfg_attr(feature = "serde", serde(rename = "heure"))]
    pub hour: u8,
    #[cfg_attr(feature = "serde", serde(rename = "type", serialize_with = "as_label"))]
    pub category: Category,
    #[cfg_attr(feature = "serde", serde(rename = "sous_type", serialize_with = "as_label"))]
    pub subtype: Subtype,
    #[cfg_attr(feature = "serde", serde(rename = "nom"))]
    pub name: String,
    #[cfg_attr(feature = "serde", serde(rename = "occupe"))]
    pub occupied: i64,
    #[cfg_attr(feature = "serde", serde(rename = "capacite"))]
    pub capacity: i64,
    #[cfg_attr(
        feature = "serde",
        serde(rename = "taux_saturation", serialize_with = "one_decimal")
    )]
    pub saturation_rate: f64,
}

impl OccupancyRecord {
    /// Build a record; `hour` is derived from `date`.
    pub fn new(
        date: OffsetDateTime,
        category: Category,
        subtype: Subtype,
        name: impl Into<String>,
        occupied: i64,
        capacity: i64,
        saturation_rate: f64,
    ) -> Self {
        Self {
            date,
            hour: date.hour(),
            category,
            subtype,
            name: name.into(),
            occupied,
            capacity,
            saturation_rate,
        }
    }
}

/// `occupied / capacity * 100`, rounded to one decimal with ties to even.
///
/// Returns `None` when `capacity` is not positive; callers decide whether that
/// means a zero rate or a dropped record.
pub fn saturation_rate(occupied: i64, capacity: i64) -> Option<f64> {
    if capacity <= 0 {
        return None;
    }
    let pct = occupied as f64 / capacity as f64 * 100.0;
    Some((pct * 10.0).round_ties_even() / 10.0)
}

#[cfg(feature = "serde")]
mod collected_at {
    use serde::Serializer;
    use time::{macros::format_description, OffsetDateTime};

    pub fn serialize<S: Serializer>(ts: &OffsetDateTime, s: S) -> Result<S::Ok, S::Error> {
        let fmt = format_description!("[year]-[month]-[day] [hour]:[minute]:[second].[subsecond digits:6]");
        let text = ts.format(&fmt).map_err(serde::ser::Error::custom)?;
        s.serialize_str(&text)
    }
}

#[cfg(feature = "serde")]
fn as_label<T: fmt::Display, S: serde::Serializer>(v: &T, s: S) -> Result<S::Ok, S::Error> {
    s.collect_str(v)
}

#[cfg(feature = "serde")]
fn one_decimal<S: serde::Serializer>(v: &f64, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&format!("{v:.1}"))
}
