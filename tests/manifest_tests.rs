//! Integration tests for controller manifests
//!
//! # Test Coverage
//!
//! Loads a manifest from disk, builds the echo registry and dispatches
//! against it, the same path the CLI takes.

use std::io::Write;
use std::sync::Arc;

use endpoints::config::DispatchConfig;
use endpoints::dispatcher::Dispatcher;
use endpoints::manifest::Manifest;
use endpoints::server::CallRequest;
use serde_json::json;

const MANIFEST: &str = r#"
prefix: shop
modules:
  shop:
    classes:
      Default: [GET]
  shop.orders:
    classes:
      Default: [GET, POST]
      Items:
        methods: [DELETE]
        default_version: v1
        versions:
          GET:
            GET_a: ["v1"]
            GET_b: ["v2", "v3"]
    symbols: [Helper]
  shop.reports:
    deferred: true
    classes:
      Daily: [GET]
"#;

fn dispatcher() -> Dispatcher {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(MANIFEST.as_bytes()).unwrap();
    let manifest = Manifest::load(file.path()).unwrap();
    let prefix = manifest.prefix.clone().unwrap();
    Dispatcher::new(DispatchConfig::new(prefix), Arc::new(manifest.registry().unwrap())).unwrap()
}

#[test]
fn test_echo_reports_resolution() {
    let dispatcher = dispatcher();
    let res = dispatcher.handle(&CallRequest::post("/orders/17?gift=1").with_body(json!({"qty": 2})));
    assert_eq!(res.status, 200);
    let body = res.body().unwrap();
    assert_eq!(body["module"], "shop.orders");
    assert_eq!(body["class"], "Default");
    assert_eq!(body["method"], "POST");
    assert_eq!(body["args"], json!(["17"]));
    assert_eq!(body["kwargs"], json!({"gift": "1"}));
    assert_eq!(body["body"], json!({"qty": 2}));
}

#[test]
fn test_versions_section_builds_overrides() {
    let dispatcher = dispatcher();

    let res = dispatcher.handle(&CallRequest::get("/orders/items"));
    assert_eq!(res.body().unwrap()["handler"], "GET_a");

    let res = dispatcher.handle(
        &CallRequest::get("/orders/items").with_header("Accept", "application/json;version=v3"),
    );
    assert_eq!(res.body().unwrap()["handler"], "GET_b");

    let res = dispatcher.handle(
        &CallRequest::get("/orders/items").with_header("Accept", "application/json;version=v4"),
    );
    assert_eq!(res.status, 406);

    let res = dispatcher.handle(&CallRequest::new(http::Method::DELETE, "/orders/items/3"));
    assert_eq!(res.status, 200);
    assert_eq!(res.body().unwrap()["args"], json!(["3"]));
}

#[test]
fn test_symbols_and_deferred_modules() {
    let dispatcher = dispatcher();

    let res = dispatcher.handle(&CallRequest::get("/orders/helper"));
    assert_eq!(res.body().unwrap()["class"], "Default");

    let res = dispatcher.handle(&CallRequest::get("/reports/daily"));
    assert_eq!(res.body().unwrap()["module"], "shop.reports");
    assert_eq!(res.body().unwrap()["class"], "Daily");

    assert_eq!(dispatcher.handle(&CallRequest::get("/reports")).status, 404);
}
