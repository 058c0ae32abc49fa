//! Query-string interpretation shared by the data endpoints.
//!
//! Lenient by default: a missing or malformed paging, area or flag value
//! falls back to its default. Ordering columns and dates are checked, since a
//! silently ignored typo there would return misleading data.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::json;

use crate::http::error::ValidationErrors;
use crate::http::handler::Arguments;
use crate::store::{Area, OrderBy, Page};

pub const STATION_ROWS: u64 = 10;
pub const READING_ROWS: u64 = 2000;

/// Page from positional `page`/`rows` arguments. Zero or unparseable rows use the default.
pub fn page(args: &Arguments, page_index: usize, rows_index: usize, default_rows: u64) -> Page {
    Page {
        page: args.parse::<u64>(page_index).unwrap_or(0),
        rows: args
            .parse::<u64>(rows_index)
            .filter(|rows| *rows > 0)
            .unwrap_or(default_rows),
    }
}

/// `true`, `t`, `1`, `y` and `yes`, in any case.
pub fn is_truthy(value: Option<&str>) -> bool {
    value
        .map(|v| v.trim().to_ascii_lowercase())
        .is_some_and(|v| matches!(v.as_str(), "true" | "t" | "1" | "y" | "yes"))
}

fn floats(text: &str) -> Option<Vec<f64>> {
    text.split(',').map(|part| part.trim().parse::<f64>().ok()).collect()
}

/// A valid `xmin,ymin,xmax,ymax` box wins; otherwise a `long,lat` point with a
/// positive radius in metres; otherwise no area.
pub fn area(bbox: Option<&str>, point: Option<&str>, radius: Option<f64>) -> Option<Area> {
    if let Some([xmin, ymin, xmax, ymax]) = bbox.and_then(floats).as_deref() {
        return Some(Area::BoundingBox {
            xmin: *xmin,
            ymin: *ymin,
            xmax: *xmax,
            ymax: *ymax,
        });
    }

    match (point.and_then(floats).as_deref(), radius) {
        (Some([long, lat]), Some(metres)) if metres > 0.0 => Some(Area::Radius {
            long: *long,
            lat: *lat,
            metres,
        }),
        (Some([_, _]), _) => {
            tracing::debug!("Point supplied without a positive radius; ignoring");
            None
        }
        _ => None,
    }
}

/// Parse `col[,ASC|DESC][,col[,ASC|DESC]...]`. Unknown columns are reported under `order`.
pub fn order(text: Option<&str>, columns: &[&str], errors: &mut ValidationErrors) -> Vec<OrderBy> {
    let mut order: Vec<OrderBy> = Vec::new();
    let Some(text) = text else {
        return order;
    };

    for token in text.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        let direction = token.to_ascii_uppercase();
        if direction == "ASC" || direction == "DESC" {
            if let Some(last) = order.last_mut() {
                last.descending = direction == "DESC";
                continue;
            }
        }
        if columns.contains(&token) {
            order.push(OrderBy::asc(token));
        } else {
            errors.add("order", format!("Unknown column '{token}'"), Some(json!(text)));
        }
    }
    order
}

/// RFC 3339, `YYYY-MM-DDTHH:MM:SS` (UTC) or `YYYY-MM-DD` (midnight UTC).
pub fn parse_date(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S") {
        return Some(dt.and_utc());
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

/// Date argument, `default` when absent. Unparseable text is reported under `field`.
pub fn date(
    field: &str,
    text: Option<&str>,
    default: DateTime<Utc>,
    errors: &mut ValidationErrors,
) -> DateTime<Utc> {
    match text {
        None => default,
        Some(text) => parse_date(text).unwrap_or_else(|| {
            errors.add(field, "Invalid date", Some(json!(text)));
            default
        }),
    }
}

/// Comma-separated station codes.
pub fn station_list(text: Option<&str>) -> Vec<String> {
    text.map(|t| {
        t.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect()
    })
    .unwrap_or_default()
}
