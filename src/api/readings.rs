//! `/readings` endpoints.

use std::sync::Arc;

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use serde_json::json;

use crate::api::{query, query_failed, DataAccess};
use crate::http::error::{HandlerError, ValidationErrors};
use crate::http::handler::{Arguments, HandlerRef, Reply};
use crate::routing::declare::{ControllerDecl, ControllerDefinition, EndpointDecl};
use crate::store::{ReadingQuery, StationStore, READING_COLUMNS};

/// Longest range a single query may cover.
pub const MAX_RANGE_DAYS: i64 = 31;

pub const RANGE_TOO_LONG: &str =
    "Invalid date range. Queries cannot exceed 31 days. For bulk queries please download from the Datamart store";

pub struct ReadingsController {
    store: Arc<dyn StationStore>,
    access: DataAccess,
}

impl ReadingsController {
    pub fn new(store: Arc<dyn StationStore>, access: DataAccess) -> Self {
        Self { store, access }
    }

    fn bind_query(endpoint: EndpointDecl<'_>) -> EndpointDecl<'_> {
        endpoint
            .query(0, "page")
            .query(1, "rows")
            .query(2, "bbox")
            .query(3, "start")
            .query(4, "end")
            .query(5, "stations")
            .query(6, "point")
            .query(7, "radius")
            .query(8, "order")
    }
}

impl ControllerDefinition for ReadingsController {
    fn name(&self) -> &str {
        "ReadingsController"
    }

    fn declare(&self, controller: &mut ControllerDecl<'_>) {
        controller.route("readings");

        let store = self.store.clone();
        let endpoint = controller.endpoint("getReadings").get("/").success(200, "OK");
        Self::bind_query(self.access.apply(endpoint)).handler(HandlerRef::new(
            "getReadings",
            move |args: Arguments| list_readings(store.clone(), args, false),
        ));

        let store = self.store.clone();
        let endpoint = controller
            .endpoint("getReadingsDailies")
            .get("/dailies")
            .success(200, "OK");
        Self::bind_query(self.access.apply(endpoint)).handler(HandlerRef::new(
            "getReadingsDailies",
            move |args: Arguments| list_readings(store.clone(), args, true),
        ));
    }
}

async fn list_readings(
    store: Arc<dyn StationStore>,
    args: Arguments,
    dailies_only: bool,
) -> Result<Reply, HandlerError> {
    let now = Utc::now();
    let mut errors = ValidationErrors::new();

    let page = query::page(&args, 0, 1, query::READING_ROWS);
    let start = query::date("start", args.text(3), now - Duration::hours(24), &mut errors);
    let end = query::date("end", args.text(4), now, &mut errors);
    let stations = query::station_list(args.text(5));
    let area = query::area(args.text(2), args.text(6), args.parse(7));
    let order = query::order(args.text(8), READING_COLUMNS, &mut errors);
    errors.into_result()?;

    if end - start > Duration::days(MAX_RANGE_DAYS) {
        return Ok(Reply::explicit(StatusCode::BAD_REQUEST, json!(RANGE_TOO_LONG)));
    }

    let query = ReadingQuery {
        page,
        area,
        start,
        end,
        stations,
        dailies_only,
        order,
    };
    tracing::debug!(
        start = %query.start,
        end = %query.end,
        stations = query.stations.len(),
        dailies_only,
        "Listing readings"
    );

    let endpoint = if dailies_only { "getReadingsDailies" } else { "getReadings" };
    match store.readings(&query).await {
        Ok(result) => Reply::json(&result),
        Err(e) => Ok(query_failed(endpoint, e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::handler::Argument;
    use crate::store::MemoryStore;

    const SEED: &str = r#"{
        "stations": [{"code": "101", "name": "Kamloops", "latitude": 50.67, "longitude": -120.33}],
        "readings": [
            {"station_code": "101", "weather_date": "2024-07-01T12:00:00Z", "temperature": 28.5},
            {"station_code": "101", "weather_date": "2024-07-01T15:00:00Z", "temperature": 30.2}
        ]
    }"#;

    fn store() -> Arc<dyn StationStore> {
        Arc::new(MemoryStore::from_json(SEED).unwrap())
    }

    fn args(start: &str, end: &str) -> Arguments {
        let mut slots = vec![Argument::Null; 9];
        slots[3] = Argument::Text(start.to_string());
        slots[4] = Argument::Text(end.to_string());
        Arguments::new(slots)
    }

    #[tokio::test]
    async fn test_lists_and_filters_dailies() {
        let reply = list_readings(store(), args("2024-07-01", "2024-07-02"), false).await.unwrap();
        let Reply::Value(body) = reply else {
            panic!("expected a plain value");
        };
        assert_eq!(body["rows"], 2000);
        assert_eq!(body["collection"].as_array().unwrap().len(), 2);

        let reply = list_readings(store(), args("2024-07-01", "2024-07-02"), true).await.unwrap();
        let Reply::Value(body) = reply else {
            panic!("expected a plain value");
        };
        assert_eq!(body["collection"].as_array().unwrap().len(), 1);
        assert_eq!(body["collection"][0]["temperature"], 28.5);
    }

    #[tokio::test]
    async fn test_range_limit() {
        let exactly = list_readings(store(), args("2024-07-01", "2024-08-01"), false).await.unwrap();
        assert!(matches!(exactly, Reply::Value(_)));

        let too_long = list_readings(store(), args("2024-07-01", "2024-08-01T00:00:01Z"), false)
            .await
            .unwrap();
        assert_eq!(too_long, Reply::explicit(StatusCode::BAD_REQUEST, json!(RANGE_TOO_LONG)));
    }

    #[tokio::test]
    async fn test_bad_date_is_validation_error() {
        let err = list_readings(store(), args("soon", "2024-07-02"), false).await.unwrap_err();
        let HandlerError::Validation(details) = err else {
            panic!("expected validation failure");
        };
        assert!(details.get("start").is_some());
        assert!(details.get("end").is_none());
    }
}
