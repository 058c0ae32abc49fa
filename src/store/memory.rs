//! In-memory station store.
//!
//! Loads a JSON seed (`{"stations": [...], "readings": [...]}`) once and
//! answers every query by filtering, sorting and slicing in memory.

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};

use async_trait::async_trait;
use serde::Deserialize;

use crate::store::model::{Reading, Sortable, Station};
use crate::store::{OrderBy, PagedResult, ReadingQuery, StationQuery, StationStore, StoreError};

#[derive(Debug, Default, Deserialize)]
struct Seed {
    #[serde(default)]
    stations: Vec<Station>,
    #[serde(default)]
    readings: Vec<Reading>,
}

#[derive(Debug)]
pub struct MemoryStore {
    stations: Vec<Station>,
    readings: Vec<Reading>,
    /// Station coordinates by code, for area filters on readings.
    locations: HashMap<String, (f64, f64)>,
    available: AtomicBool,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(Vec::new(), Vec::new())
    }
}

impl MemoryStore {
    pub fn new(stations: Vec<Station>, readings: Vec<Reading>) -> Self {
        let locations = stations
            .iter()
            .map(|s| (s.code.clone(), (s.longitude, s.latitude)))
            .collect();
        Self {
            stations,
            readings,
            locations,
            available: AtomicBool::new(true),
        }
    }

    pub fn from_json(json: &str) -> Result<Self, StoreError> {
        let seed: Seed = serde_json::from_str(json)?;
        Ok(Self::new(seed.stations, seed.readings))
    }

    pub async fn from_seed_file(path: &Path) -> Result<Self, StoreError> {
        let content = tokio::fs::read_to_string(path).await?;
        let store = Self::from_json(&content)?;
        tracing::info!(
            path = %path.display(),
            stations = store.stations.len(),
            readings = store.readings.len(),
            "Loaded seed data"
        );
        Ok(store)
    }

    /// Simulate an outage; every query fails while unavailable.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, AtomicOrdering::SeqCst);
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.available.load(AtomicOrdering::SeqCst) {
            Ok(())
        } else {
            Err(StoreError::Unavailable("memory store is offline".to_string()))
        }
    }
}

fn sort_records<T: Sortable>(records: &mut [&T], order: &[OrderBy]) {
    records.sort_by(|a, b| {
        order
            .iter()
            .map(|o| {
                let ord = a.compare_by(b, &o.column);
                if o.descending {
                    ord.reverse()
                } else {
                    ord
                }
            })
            .find(|ord| ord.is_ne())
            .unwrap_or(std::cmp::Ordering::Equal)
    });
}

#[async_trait]
impl StationStore for MemoryStore {
    async fn stations(&self, query: &StationQuery) -> Result<PagedResult<Station>, StoreError> {
        self.check_available()?;

        let mut matched: Vec<&Station> = self
            .stations
            .iter()
            .filter(|s| match query.area {
                None => true,
                Some(area) => area.contains(s.longitude, s.latitude),
            })
            .collect();

        let mut order = query.order.clone();
        order.push(OrderBy::asc("code"));
        sort_records(&mut matched, &order);

        Ok(PagedResult::paginate(
            matched.into_iter().cloned().collect(),
            query.page,
        ))
    }

    async fn station(&self, code: &str) -> Result<Vec<Station>, StoreError> {
        self.check_available()?;
        Ok(self.stations.iter().filter(|s| s.code == code).cloned().collect())
    }

    async fn readings(&self, query: &ReadingQuery) -> Result<PagedResult<Reading>, StoreError> {
        self.check_available()?;

        let mut matched: Vec<&Reading> = self
            .readings
            .iter()
            .filter(|r| r.weather_date >= query.start && r.weather_date <= query.end)
            .filter(|r| !query.dailies_only || r.is_daily())
            .filter(|r| query.stations.is_empty() || query.stations.contains(&r.station_code))
            .filter(|r| match query.area {
                None => true,
                Some(area) => self
                    .locations
                    .get(&r.station_code)
                    .is_some_and(|&(long, lat)| area.contains(long, lat)),
            })
            .collect();

        let mut order = query.order.clone();
        order.push(OrderBy::asc("weather_date"));
        order.push(OrderBy::asc("station_code"));
        sort_records(&mut matched, &order);

        Ok(PagedResult::paginate(
            matched.into_iter().cloned().collect(),
            query.page,
        ))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.check_available()
    }
}
