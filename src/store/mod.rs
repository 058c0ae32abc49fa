//! Station data storage.
//!
//! # Responsibilities
//! - Define the query surface the API controllers rely on
//! - Apply area filters, ordering and paging
//!
//! # Design Decisions
//! - Storage is behind an async trait so a database backend can replace the
//!   in-memory one without touching controllers
//! - Queries arrive already parsed; the store never sees raw request text

pub mod memory;
pub mod model;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

pub use memory::MemoryStore;
pub use model::{Reading, Sortable, Station, READING_COLUMNS, STATION_COLUMNS};

const EARTH_RADIUS_METRES: f64 = 6_371_008.8;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read seed file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse seed data: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Geographic restriction on a listing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Area {
    BoundingBox {
        xmin: f64,
        ymin: f64,
        xmax: f64,
        ymax: f64,
    },
    /// Great-circle distance from a point, in metres.
    Radius { long: f64, lat: f64, metres: f64 },
}

impl Area {
    pub fn contains(&self, long: f64, lat: f64) -> bool {
        match *self {
            Area::BoundingBox { xmin, ymin, xmax, ymax } => {
                long >= xmin && long <= xmax && lat >= ymin && lat <= ymax
            }
            Area::Radius {
                long: center_long,
                lat: center_lat,
                metres,
            } => haversine_metres(center_long, center_lat, long, lat) <= metres,
        }
    }
}

pub fn haversine_metres(long1: f64, lat1: f64, long2: f64, lat2: f64) -> f64 {
    let (phi1, phi2) = (lat1.to_radians(), lat2.to_radians());
    let d_phi = (lat2 - lat1).to_radians();
    let d_lambda = (long2 - long1).to_radians();
    let a = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_METRES * a.sqrt().asin()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub column: String,
    pub descending: bool,
}

impl OrderBy {
    pub fn asc(column: &str) -> Self {
        Self {
            column: column.to_string(),
            descending: false,
        }
    }
}

/// Zero-based page of `rows` records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub page: u64,
    pub rows: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StationQuery {
    pub page: Page,
    pub area: Option<Area>,
    pub order: Vec<OrderBy>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReadingQuery {
    pub page: Page,
    pub area: Option<Area>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// Empty means every station.
    pub stations: Vec<String>,
    pub dailies_only: bool,
    pub order: Vec<OrderBy>,
}

/// One page of a listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PagedResult<T> {
    pub page: u64,
    pub rows: u64,
    pub total_pages: u64,
    pub collection: Vec<T>,
}

impl<T> PagedResult<T> {
    /// Slice `items` (already filtered and ordered) down to `page`.
    pub fn paginate(items: Vec<T>, page: Page) -> Self {
        let total = items.len() as u64;
        let total_pages = if page.rows == 0 { 0 } else { total.div_ceil(page.rows) };
        let skip = page.page.saturating_mul(page.rows);
        let collection = items
            .into_iter()
            .skip(usize::try_from(skip).unwrap_or(usize::MAX))
            .take(usize::try_from(page.rows).unwrap_or(usize::MAX))
            .collect();
        Self {
            page: page.page,
            rows: page.rows,
            total_pages,
            collection,
        }
    }
}

#[async_trait]
pub trait StationStore: Send + Sync {
    async fn stations(&self, query: &StationQuery) -> Result<PagedResult<Station>, StoreError>;

    /// Stations with exactly this code (zero or one).
    async fn station(&self, code: &str) -> Result<Vec<Station>, StoreError>;

    async fn readings(&self, query: &ReadingQuery) -> Result<PagedResult<Reading>, StoreError>;

    /// Availability check used by the health endpoint.
    async fn ping(&self) -> Result<(), StoreError>;
}
