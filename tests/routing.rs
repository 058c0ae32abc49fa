//! Declaration-to-request tests for the routing engine, driven in-process.

mod common;

use axum::{
    body::Body,
    http::{header, HeaderValue, Method, Request, StatusCode},
    middleware::Next,
    Router,
};
use datamart_api::config::AppConfig;
use datamart_api::http::middleware::{insert_property, upload_single, MiddlewareRef};
use datamart_api::http::{ApiResponse, Arguments, HandlerError, HandlerRef, Reply};
use datamart_api::lifecycle::assemble;
use datamart_api::routing::{AxumRouteSink, Declarations, RegistrationError, Registry};
use serde_json::{json, Value};

use common::{get, multipart_body, request, send};

fn handler(name: &str, f: fn(Arguments) -> Result<Reply, HandlerError>) -> HandlerRef {
    HandlerRef::new(name, move |args: Arguments| async move { f(args) })
}

fn router(decls: Declarations) -> Router {
    assemble(decls, &AppConfig::default())
        .expect("assembles")
        .server
        .router()
}

/// Appends `tag` to the `x-trace` request header.
fn tag(tag: &'static str) -> MiddlewareRef {
    MiddlewareRef::new(tag, move |mut request: Request<Body>, next: Next| async move {
        let current = request
            .headers()
            .get("x-trace")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let value = HeaderValue::from_str(&format!("{current}{tag}")).unwrap();
        request.headers_mut().insert("x-trace", value);
        next.run(request).await
    })
}

#[tokio::test]
async fn test_path_parameter_is_served() {
    let mut decls = Declarations::new(Registry::new());
    let mut stations = decls.controller("Stations");
    stations.route("/stations/");
    stations
        .endpoint("one")
        .get("/{code}")
        .path(0, "code")
        .handler(handler("one", |args| Ok(Reply::Value(json!({ "code": args.text(0) })))));

    let app = router(decls);
    let response = get(&app, "/stations/101").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, json!({ "code": "101" }));
}

#[tokio::test]
async fn test_duplicate_index_keeps_first_binding() {
    let mut decls = Declarations::new(Registry::new());
    decls
        .controller("C")
        .endpoint("e")
        .get("/dup")
        .query(0, "first")
        .query(0, "second")
        .handler(handler("e", |args| Ok(Reply::Value(json!(args.text(0))))));
    assert_eq!(decls.errors().len(), 1);

    let app = router(decls);
    let response = get(&app, "/dup?first=a&second=b").await;
    assert_eq!(response.body, json!("a"));
}

#[tokio::test]
async fn test_middleware_runs_in_declaration_order() {
    let mut decls = Declarations::new(Registry::new());
    decls
        .controller("C")
        .endpoint("trace")
        .get("/trace")
        .middleware(tag("a"))
        .middleware(tag("b"))
        .middleware(tag("c"))
        .header(0, "x-trace")
        .handler(handler("trace", |args| Ok(Reply::Value(json!(args.text(0))))));

    let app = router(decls);
    let response = get(&app, "/trace").await;
    assert_eq!(response.body, json!("abc"));
}

#[tokio::test]
async fn test_middleware_can_short_circuit() {
    let deny = MiddlewareRef::new("deny", |_request: Request<Body>, _next: Next| async move {
        axum::response::IntoResponse::into_response(StatusCode::FORBIDDEN)
    });
    let mut decls = Declarations::new(Registry::new());
    decls
        .controller("C")
        .endpoint("locked")
        .get("/locked")
        .middleware(deny)
        .handler(handler("locked", |_| panic!("handler must not run")));

    let app = router(decls);
    assert_eq!(get(&app, "/locked").await.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_materialize_twice_is_rejected() {
    let mut decls = Declarations::new(Registry::new());
    decls
        .controller("C")
        .endpoint("e")
        .get("/")
        .handler(handler("e", |_| Ok(Reply::Value(Value::Null))));
    let (mut registry, _) = decls.finish();

    let mut sink = AxumRouteSink::new();
    assert_eq!(registry.materialize(&mut sink).unwrap().routes.len(), 1);
    let mut second = AxumRouteSink::new();
    assert_eq!(
        registry.materialize(&mut second).unwrap_err(),
        RegistrationError::AlreadyMaterialized
    );
}

#[tokio::test]
async fn test_query_source_name_defaults_and_overrides() {
    let mut decls = Declarations::new(Registry::new());
    decls
        .controller("Search")
        .endpoint("near")
        .get("/near")
        .query(0, "radius")
        .query_as(1, "stationList", "stations")
        .handler(handler("near", |args| {
            Ok(Reply::Value(json!([args.parse::<f64>(0), args.text(1)])))
        }));

    let app = router(decls);
    let response = get(&app, "/near?radius=500&stations=101,102&stationList=ignored").await;
    assert_eq!(response.body, json!([500.0, "101,102"]));

    let response = get(&app, "/near").await;
    assert_eq!(response.body, json!([null, null]));
}

#[tokio::test]
async fn test_declared_status_and_explicit_override() {
    let mut decls = Declarations::new(Registry::new());
    let mut items = decls.controller("Items");
    items.route("items");
    items
        .endpoint("create")
        .post("/")
        .success(201, "Created")
        .body(0, "item")
        .handler(handler("create", |args| match args.json(0) {
            Some(item) => Ok(Reply::Value(item.clone())),
            None => Ok(Reply::Explicit(ApiResponse::new(
                StatusCode::BAD_REQUEST,
                json!({ "message": "item required" }),
            ))),
        }));

    let app = router(decls);
    let created = send(
        &app,
        Request::builder()
            .method(Method::POST)
            .uri("/items")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"name":"anemometer"}"#))
            .unwrap(),
    )
    .await;
    assert_eq!(created.status, StatusCode::CREATED);
    assert_eq!(created.body, json!({ "name": "anemometer" }));

    let rejected = send(
        &app,
        Request::builder()
            .method(Method::POST)
            .uri("/items")
            .body(Body::from("not json"))
            .unwrap(),
    )
    .await;
    assert_eq!(rejected.status, StatusCode::BAD_REQUEST);
    assert_eq!(rejected.body, json!({ "message": "item required" }));
}

#[tokio::test]
async fn test_validation_failure_shape() {
    let mut decls = Declarations::new(Registry::new());
    decls
        .controller("C")
        .endpoint("check")
        .get("/check")
        .query(0, "limit")
        .handler(handler("check", |args| match args.parse::<u32>(0) {
            Some(limit) => Ok(Reply::Value(json!(limit))),
            None => Err(HandlerError::invalid_field(
                "limit",
                "must be a positive integer",
                args.text(0).map(|t| json!(t)),
            )),
        }));

    let app = router(decls);
    let response = get(&app, "/check?limit=lots").await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        response.body,
        json!({
            "message": "Validation Failed",
            "details": { "limit": { "message": "must be a positive integer", "value": "lots" } }
        })
    );
}

#[tokio::test]
async fn test_undeclared_and_incomplete_routes_are_not_found() {
    let mut decls = Declarations::new(Registry::new());
    let mut c = decls.controller("C");
    c.endpoint("no_handler").get("/half");
    c.endpoint("whole")
        .get("/whole")
        .handler(handler("whole", |_| Ok(Reply::Value(json!("ok")))));

    let app = router(decls);
    assert_eq!(get(&app, "/whole").await.status, StatusCode::OK);

    for uri in ["/half", "/nowhere"] {
        let response = get(&app, uri).await;
        assert_eq!(response.status, StatusCode::NOT_FOUND);
        assert_eq!(response.body, json!({ "message": "Not Found" }));
    }
}

#[tokio::test]
async fn test_wrong_method_on_declared_path_is_not_found() {
    let mut decls = Declarations::new(Registry::new());
    let mut stations = decls.controller("Stations");
    stations.route("/stations");
    stations
        .endpoint("list")
        .get("/")
        .handler(handler("list", |_| Ok(Reply::Value(json!([])))));
    stations
        .endpoint("one")
        .get("/{code}")
        .path(0, "code")
        .middleware(tag("a"))
        .handler(handler("one", |args| Ok(Reply::Value(json!(args.text(0))))));

    let app = router(decls);
    for (method, uri) in [(Method::POST, "/stations"), (Method::DELETE, "/stations/101")] {
        let response = send(&app, request(method, uri)).await;
        assert_eq!(response.status, StatusCode::NOT_FOUND);
        assert_eq!(response.body, json!({ "message": "Not Found" }));
    }
    assert_eq!(get(&app, "/stations/101").await.body, json!("101"));
}

#[tokio::test]
async fn test_unroutable_paths_are_skipped_at_startup() {
    let mut decls = Declarations::new(Registry::new());
    let mut stations = decls.controller("Stations");
    stations.route("/stations");
    stations
        .endpoint("one")
        .get("/{code}")
        .path(0, "code")
        .handler(handler("one", |args| Ok(Reply::Value(json!(args.text(0))))));
    stations
        .endpoint("remove")
        .delete("/{id}")
        .path(0, "id")
        .handler(handler("remove", |_| Ok(Reply::Value(json!("removed")))));
    stations
        .endpoint("everything")
        .get("/files/*")
        .handler(handler("everything", |_| Ok(Reply::Value(json!("all")))));
    stations
        .endpoint("suffixed")
        .get("/{code}.json")
        .handler(handler("suffixed", |_| Ok(Reply::Value(json!("json")))));
    stations
        .endpoint("near")
        .get("/near")
        .handler(handler("near", |_| Ok(Reply::Value(json!("near")))));
    stations
        .endpoint("near_again")
        .get("/near/")
        .handler(handler("near_again", |_| Ok(Reply::Value(json!("again")))));

    let app = assemble(decls, &AppConfig::default()).expect("assembles despite bad routes");
    let endpoints: Vec<_> = app.routes.iter().map(|r| r.endpoint.as_str()).collect();
    assert_eq!(endpoints, vec!["one", "near"]);
    assert!(app
        .registration_errors
        .iter()
        .any(|e| matches!(e, RegistrationError::RouteConflict { .. })));
    assert!(app
        .registration_errors
        .iter()
        .any(|e| matches!(e, RegistrationError::DuplicateRoute { .. })));
    assert_eq!(
        app.registration_errors
            .iter()
            .filter(|e| matches!(e, RegistrationError::InvalidPath { .. }))
            .count(),
        2
    );

    let router = app.server.router();
    assert_eq!(get(&router, "/stations/101").await.body, json!("101"));
    assert_eq!(get(&router, "/stations/near").await.body, json!("near"));
    let removed = send(&router, request(Method::DELETE, "/stations/101")).await;
    assert_eq!(removed.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unroutable_paths_abort_strict_startup() {
    let mut decls = Declarations::new(Registry::new());
    decls
        .controller("C")
        .endpoint("all")
        .get("/*")
        .handler(handler("all", |_| Ok(Reply::Value(Value::Null))));

    let mut config = AppConfig::default();
    config.server.strict_routes = true;
    let err = assemble(decls, &config).err().expect("strict startup fails");
    assert!(matches!(
        err,
        datamart_api::lifecycle::StartupError::Registration(ref errors) if errors.len() == 1
    ));
}

#[tokio::test]
async fn test_multipart_single_upload() {
    let mut decls = Declarations::new(Registry::new());
    decls
        .controller("Uploads")
        .endpoint("upload")
        .post("/upload")
        .middleware(upload_single("report"))
        .form_field(0, "station")
        .files(1, "report")
        .handler(handler("upload", |args| {
            let file = args.file(1).map(|f| {
                json!({
                    "name": f.file_name,
                    "size": f.data.len(),
                })
            });
            Ok(Reply::Value(json!({ "station": args.text(0), "file": file })))
        }));

    let app = router(decls);
    let boundary = "XBOUNDARYX";
    let body = multipart_body(
        boundary,
        &[("station", None, "101"), ("report", Some("obs.csv"), "a,b,c")],
    );
    let response = send(
        &app,
        Request::builder()
            .method(Method::POST)
            .uri("/upload")
            .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={boundary}"))
            .body(Body::from(body))
            .unwrap(),
    )
    .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(
        response.body,
        json!({ "station": "101", "file": { "name": "obs.csv", "size": 5 } })
    );
}

#[tokio::test]
async fn test_property_set_by_middleware() {
    let mut decls = Declarations::new(Registry::new());
    decls
        .controller("C")
        .endpoint("who")
        .get("/who")
        .middleware(insert_property("principal", json!({ "role": "ops" })))
        .property(0, "user", "principal")
        .property(1, "missing", "nothing")
        .handler(handler("who", |args| {
            Ok(Reply::Value(json!([args.json(0), args.get(1).is_absent()])))
        }));

    let app = router(decls);
    let response = get(&app, "/who").await;
    assert_eq!(response.body, json!([{ "role": "ops" }, true]));
}
