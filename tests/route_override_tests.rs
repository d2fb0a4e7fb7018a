//! Integration tests for route overrides
//!
//! # Test Coverage
//!
//! Classes that bind several alternatives to one visible method, dispatched
//! end to end:
//! - [`PathRoute`]: leading path arguments pick the alternative, 405 otherwise
//! - [`ParamRoute`]: required query keys and value/pattern matches, 400 otherwise
//! - [`VersionRoute`]: the negotiated `Accept` version, 406 otherwise
//! - [`FnRoute`]: arbitrary predicates, and declaration-order precedence
//!
//! # Key Test Cases
//!
//! - Overrides take precedence over a plain method of the same name
//! - When nothing matches, the first declared alternative decides the status

mod common;

use endpoints::controller::ControllerClass;
use endpoints::route::{FnRoute, ParamRoute, PathRoute, VersionRoute};
use endpoints::server::CallRequest;
use regex::Regex;
use serde_json::json;

fn handler_name(res: &endpoints::CallResponse) -> Option<&str> {
    res.body().and_then(|b| b["handler"].as_str())
}

#[test]
fn test_path_route() {
    let dispatcher = common::single_module(
        "pathroute",
        vec![ControllerClass::stateless("Foo")
            .route("GET", "GET_bar", PathRoute::new(["bar"]), |_, _| {
                Ok(json!({"handler": "GET_bar"}))
            })
            .route("GET", "GET_che", PathRoute::new(["che/boo"]), |_, call| {
                Ok(json!({"handler": "GET_che", "args": call.args()}))
            })
            .build()],
    );

    let res = dispatcher.handle(&CallRequest::get("/foo/bar"));
    assert_eq!(res.status, 200);
    assert_eq!(handler_name(&res), Some("GET_bar"));

    let res = dispatcher.handle(&CallRequest::get("/foo/che/boo/1"));
    assert_eq!(handler_name(&res), Some("GET_che"));
    assert_eq!(res.body().unwrap()["args"], json!(["che", "boo", "1"]));

    let res = dispatcher.handle(&CallRequest::get("/foo/che"));
    assert_eq!(res.status, 405);
    assert_eq!(
        res.body(),
        Some(&json!({"error": "Could not find a method to satisfy /foo/che"}))
    );

    assert_eq!(dispatcher.handle(&CallRequest::get("/foo")).status, 405);
}

#[test]
fn test_param_route() {
    let dispatcher = common::single_module(
        "paramroute",
        vec![ControllerClass::stateless("Default")
            .route(
                "GET",
                "GET_numeric",
                ParamRoute::new(["id"]).with_pattern("id", Regex::new(r"^\d+$").unwrap()),
                |_, _| Ok(json!({"handler": "GET_numeric"})),
            )
            .route(
                "GET",
                "GET_flag",
                ParamRoute::new(["id", "full"]).with_value("full", true),
                |_, _| Ok(json!({"handler": "GET_flag"})),
            )
            .route("GET", "GET_any", ParamRoute::new(["id"]), |_, call| {
                Ok(json!({"handler": "GET_any", "id": call.kwarg_str("id")}))
            })
            .build()],
    );

    let res = dispatcher.handle(&CallRequest::get("/?id=42"));
    assert_eq!(handler_name(&res), Some("GET_numeric"));

    let res = dispatcher.handle(&CallRequest::get("/?id=abc&full=yes"));
    assert_eq!(handler_name(&res), Some("GET_flag"));

    let res = dispatcher.handle(&CallRequest::get("/?id=abc&full=0"));
    assert_eq!(handler_name(&res), Some("GET_any"));
    assert_eq!(res.body().unwrap()["id"], "abc");

    // a repeated parameter is judged by its last value
    let res = dispatcher.handle(&CallRequest::get("/?id=abc&id=7"));
    assert_eq!(handler_name(&res), Some("GET_numeric"));

    let res = dispatcher.handle(&CallRequest::get("/"));
    assert_eq!(res.status, 400);
}

#[test]
fn test_version_route() {
    let dispatcher = common::single_module(
        "versionroute",
        vec![ControllerClass::stateless("Default")
            .route("GET", "GET_1", VersionRoute::new(["", "v1"]), |_, _| {
                Ok(json!({"handler": "GET_1"}))
            })
            .route("GET", "GET_2", VersionRoute::new(["v2"]), |_, _| {
                Ok(json!({"handler": "GET_2"}))
            })
            .build()],
    );

    let get = |accept: Option<&str>| {
        let mut request = CallRequest::get("/");
        if let Some(accept) = accept {
            request.set_header("Accept", accept.to_string());
        }
        dispatcher.handle(&request)
    };

    assert_eq!(handler_name(&get(None)), Some("GET_1"));
    assert_eq!(handler_name(&get(Some("application/json;version=v1"))), Some("GET_1"));
    assert_eq!(handler_name(&get(Some("application/json;version=v2"))), Some("GET_2"));
    assert_eq!(handler_name(&get(Some("*/*;version=v2"))), Some("GET_2"));
    assert_eq!(
        handler_name(&get(Some("text/html, application/json;version=v2;q=0.9"))),
        Some("GET_2")
    );

    let res = get(Some("application/json;version=v3"));
    assert_eq!(res.status, 406);
}

#[test]
fn test_version_route_uses_class_default() {
    let dispatcher = common::single_module(
        "versiondefault",
        vec![ControllerClass::stateless("Default")
            .default_version("v2")
            .route("GET", "GET_1", VersionRoute::new(["v1"]), |_, _| {
                Ok(json!({"handler": "GET_1"}))
            })
            .route("GET", "GET_2", VersionRoute::new(["v2"]), |_, _| {
                Ok(json!({"handler": "GET_2"}))
            })
            .build()],
    );
    let res = dispatcher.handle(&CallRequest::get("/"));
    assert_eq!(handler_name(&res), Some("GET_2"));
}

#[test]
fn test_version_route_without_content_type_is_500() {
    let dispatcher = common::single_module(
        "nocontenttype",
        vec![ControllerClass::stateless("Default")
            .without_content_type()
            .route("GET", "GET_1", VersionRoute::new(["v1"]), |_, _| Ok(json!(1)))
            .build()],
    );
    let res = dispatcher.handle(&CallRequest::get("/"));
    assert_eq!(res.status, 500);
    assert_eq!(res.body(), Some(&json!({"error": "Internal Server Error"})));
}

#[test]
fn test_override_beats_plain_method_and_order_matters() {
    let dispatcher = common::single_module(
        "precedence",
        vec![ControllerClass::stateless("Default")
            .method("GET", |_, _| Ok(json!({"handler": "GET"})))
            .route(
                "GET",
                "GET_two",
                FnRoute::new(|ctx| ctx.args().len() == 2),
                |_, _| Ok(json!({"handler": "GET_two"})),
            )
            .route(
                "GET",
                "GET_some",
                FnRoute::new(|ctx| !ctx.args().is_empty()),
                |_, _| Ok(json!({"handler": "GET_some"})),
            )
            .build()],
    );

    let res = dispatcher.handle(&CallRequest::get("/a/b"));
    assert_eq!(handler_name(&res), Some("GET_two"));

    let res = dispatcher.handle(&CallRequest::get("/a"));
    assert_eq!(handler_name(&res), Some("GET_some"));

    // the plain `GET` is shadowed by the override group
    let res = dispatcher.handle(&CallRequest::get("/"));
    assert_eq!(res.status, 405);
}

#[test]
fn test_first_alternative_decides_failure() {
    let dispatcher = common::single_module(
        "failure",
        vec![
            ControllerClass::stateless("Params")
                .route("POST", "POST_a", ParamRoute::new(["a"]), |_, _| Ok(json!(1)))
                .route("POST", "POST_v", VersionRoute::new(["v1"]), |_, _| Ok(json!(2)))
                .build(),
            ControllerClass::stateless("Versions")
                .route("POST", "POST_v", VersionRoute::new(["v1"]), |_, _| Ok(json!(2)))
                .route("POST", "POST_a", ParamRoute::new(["a"]), |_, _| Ok(json!(1)))
                .build(),
        ],
    );
    assert_eq!(dispatcher.handle(&CallRequest::post("/params")).status, 400);
    assert_eq!(dispatcher.handle(&CallRequest::post("/versions")).status, 406);
}
