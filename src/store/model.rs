//! Station and reading records.

use std::cmp::Ordering;

use chrono::{DateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};

/// Columns a station listing may be ordered by.
pub const STATION_COLUMNS: &[&str] = &["code", "name", "latitude", "longitude", "elevation"];

/// Columns a readings listing may be ordered by.
pub const READING_COLUMNS: &[&str] = &[
    "station_code",
    "weather_date",
    "temperature",
    "relative_humidity",
    "wind_speed",
    "wind_direction",
    "precipitation",
    "ffmc",
    "dmc",
    "dc",
    "isi",
    "bui",
    "fwi",
];

/// A weather station.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Station {
    pub code: String,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub elevation: Option<f64>,
}

/// One hourly observation from a station, with fire weather indices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub station_code: String,
    pub weather_date: DateTime<Utc>,
    /// Noon observation used for daily indices.
    #[serde(default)]
    pub daily: Option<bool>,
    #[serde(default)]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub relative_humidity: Option<f64>,
    #[serde(default)]
    pub wind_speed: Option<f64>,
    #[serde(default)]
    pub wind_direction: Option<f64>,
    #[serde(default)]
    pub precipitation: Option<f64>,
    #[serde(default)]
    pub ffmc: Option<f64>,
    #[serde(default)]
    pub dmc: Option<f64>,
    #[serde(default)]
    pub dc: Option<f64>,
    #[serde(default)]
    pub isi: Option<f64>,
    #[serde(default)]
    pub bui: Option<f64>,
    #[serde(default)]
    pub fwi: Option<f64>,
}

impl Reading {
    pub fn is_daily(&self) -> bool {
        self.daily.unwrap_or_else(|| self.weather_date.hour() == 12)
    }
}

/// Nulls sort last in ascending order.
fn cmp_opt(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.total_cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Records that can be ordered by a named column.
pub trait Sortable {
    /// Compare on `column`; unknown columns compare equal.
    fn compare_by(&self, other: &Self, column: &str) -> Ordering;
}

impl Sortable for Station {
    fn compare_by(&self, other: &Self, column: &str) -> Ordering {
        match column {
            "code" => self.code.cmp(&other.code),
            "name" => self.name.cmp(&other.name),
            "latitude" => self.latitude.total_cmp(&other.latitude),
            "longitude" => self.longitude.total_cmp(&other.longitude),
            "elevation" => cmp_opt(self.elevation, other.elevation),
            _ => Ordering::Equal,
        }
    }
}

impl Sortable for Reading {
    fn compare_by(&self, other: &Self, column: &str) -> Ordering {
        match column {
            "station_code" => self.station_code.cmp(&other.station_code),
            "weather_date" => self.weather_date.cmp(&other.weather_date),
            "temperature" => cmp_opt(self.temperature, other.temperature),
            "relative_humidity" => cmp_opt(self.relative_humidity, other.relative_humidity),
            "wind_speed" => cmp_opt(self.wind_speed, other.wind_speed),
            "wind_direction" => cmp_opt(self.wind_direction, other.wind_direction),
            "precipitation" => cmp_opt(self.precipitation, other.precipitation),
            "ffmc" => cmp_opt(self.ffmc, other.ffmc),
            "dmc" => cmp_opt(self.dmc, other.dmc),
            "dc" => cmp_opt(self.dc, other.dc),
            "isi" => cmp_opt(self.isi, other.isi),
            "bui" => cmp_opt(self.bui, other.bui),
            "fwi" => cmp_opt(self.fwi, other.fwi),
            _ => Ordering::Equal,
        }
    }
}
