//! `/stations` endpoints.

use std::sync::Arc;

use serde_json::{json, Value};

use crate::api::{query, query_failed, DataAccess};
use crate::http::error::{HandlerError, ValidationErrors};
use crate::http::handler::{Arguments, HandlerRef, Reply};
use crate::routing::declare::{ControllerDecl, ControllerDefinition};
use crate::store::{Station, StationQuery, StationStore, STATION_COLUMNS};

pub struct StationsController {
    store: Arc<dyn StationStore>,
    access: DataAccess,
}

impl StationsController {
    pub fn new(store: Arc<dyn StationStore>, access: DataAccess) -> Self {
        Self { store, access }
    }
}

impl ControllerDefinition for StationsController {
    fn name(&self) -> &str {
        "StationsController"
    }

    fn declare(&self, controller: &mut ControllerDecl<'_>) {
        controller.route("stations");

        let store = self.store.clone();
        let endpoint = controller
            .endpoint("getStations")
            .get("/")
            .success(200, "OK");
        self.access
            .apply(endpoint)
            .query(0, "page")
            .query(1, "rows")
            .query(2, "asGeojson")
            .query(3, "bbox")
            .query(4, "point")
            .query(5, "radius")
            .query(6, "order")
            .handler(HandlerRef::new("getStations", move |args: Arguments| {
                get_stations(store.clone(), args)
            }));

        let store = self.store.clone();
        let endpoint = controller
            .endpoint("getStation")
            .get("/{code}")
            .success(200, "OK");
        self.access
            .apply(endpoint)
            .path(0, "code")
            .handler(HandlerRef::new("getStation", move |args: Arguments| {
                get_station(store.clone(), args)
            }));
    }
}

async fn get_stations(store: Arc<dyn StationStore>, args: Arguments) -> Result<Reply, HandlerError> {
    let mut errors = ValidationErrors::new();
    let page = query::page(&args, 0, 1, query::STATION_ROWS);
    let as_geojson = query::is_truthy(args.text(2));
    let area = query::area(args.text(3), args.text(4), args.parse(5));
    let order = query::order(args.text(6), STATION_COLUMNS, &mut errors);
    errors.into_result()?;

    tracing::debug!(page = page.page, rows = page.rows, as_geojson, area = ?area, "Listing stations");

    let result = match store.stations(&StationQuery { page, area, order }).await {
        Ok(result) => result,
        Err(e) => return Ok(query_failed("getStations", e)),
    };

    if as_geojson {
        Ok(Reply::Value(feature_collection(&result.collection)))
    } else {
        Reply::json(&result)
    }
}

async fn get_station(store: Arc<dyn StationStore>, args: Arguments) -> Result<Reply, HandlerError> {
    let Some(code) = args.text(0) else {
        return Ok(Reply::Value(json!([])));
    };
    match store.station(code).await {
        Ok(stations) => Reply::json(&stations),
        Err(e) => Ok(query_failed("getStation", e)),
    }
}

/// GeoJSON `FeatureCollection` with one point feature per station.
pub fn feature_collection(stations: &[Station]) -> Value {
    let features: Vec<Value> = stations
        .iter()
        .map(|s| {
            json!({
                "type": "Feature",
                "geometry": {
                    "type": "Point",
                    "coordinates": [s.longitude, s.latitude],
                },
                "properties": {
                    "code": s.code,
                    "name": s.name,
                    "elevation": s.elevation,
                },
            })
        })
        .collect();
    json!({ "type": "FeatureCollection", "features": features })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::handler::Argument;
    use crate::store::MemoryStore;

    fn store() -> Arc<dyn StationStore> {
        Arc::new(MemoryStore::new(
            vec![
                Station {
                    code: "101".into(),
                    name: "Kamloops".into(),
                    latitude: 50.67,
                    longitude: -120.33,
                    elevation: Some(345.0),
                },
                Station {
                    code: "102".into(),
                    name: "Vernon".into(),
                    latitude: 50.27,
                    longitude: -119.27,
                    elevation: None,
                },
            ],
            Vec::new(),
        ))
    }

    fn args(values: &[(usize, &str)], len: usize) -> Arguments {
        let mut slots = vec![Argument::Null; len];
        for (i, v) in values {
            slots[*i] = Argument::Text(v.to_string());
        }
        Arguments::new(slots)
    }

    #[tokio::test]
    async fn test_paged_listing() {
        let reply = get_stations(store(), args(&[(1, "1")], 7)).await.unwrap();
        let Reply::Value(body) = reply else {
            panic!("expected a plain value");
        };
        assert_eq!(body["page"], 0);
        assert_eq!(body["rows"], 1);
        assert_eq!(body["totalPages"], 2);
        assert_eq!(body["collection"][0]["code"], "101");
    }

    #[tokio::test]
    async fn test_geojson_listing() {
        let reply = get_stations(store(), args(&[(2, "yes")], 7)).await.unwrap();
        let Reply::Value(body) = reply else {
            panic!("expected a plain value");
        };
        assert_eq!(body["type"], "FeatureCollection");
        assert_eq!(body["features"][1]["geometry"]["coordinates"], json!([-119.27, 50.27]));
    }

    #[tokio::test]
    async fn test_bad_order_is_validation_error() {
        let err = get_stations(store(), args(&[(6, "height")], 7)).await.unwrap_err();
        assert!(matches!(err, HandlerError::Validation(_)));
    }

    #[tokio::test]
    async fn test_store_failure_is_explicit_500() {
        let memory = Arc::new(MemoryStore::default());
        memory.set_available(false);
        let reply = get_station(memory, args(&[(0, "101")], 1)).await.unwrap();
        assert_eq!(
            reply,
            Reply::explicit(
                axum::http::StatusCode::INTERNAL_SERVER_ERROR,
                json!("Failed to execute query.")
            )
        );
    }
}
