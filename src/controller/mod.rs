//! # Controller Module
//!
//! The controller module defines handler classes: the unit the resolver
//! lands on and the dispatcher instantiates for every request.
//!
//! ## Overview
//!
//! A class is described once, at startup, with a builder:
//!
//! ```rust
//! use endpoints::controller::{Call, ControllerClass, HandlerResult};
//! use serde_json::json;
//!
//! let bar = ControllerClass::stateless("Bar")
//!     .method("GET", |_, call: &mut Call<'_>| -> HandlerResult {
//!         Ok(json!({ "args": call.args() }))
//!     })
//!     .method("POST", |_, _| Ok(json!("created")))
//!     .build();
//!
//! assert!(bar.responds_to("GET"));
//! assert!(!bar.responds_to("DELETE"));
//! ```
//!
//! Classes that need per-request state implement [`Controller`]; its
//! constructor receives the request and the response sink, so it can set
//! headers before any method runs.
//!
//! ## Method Names
//!
//! Methods are looked up by the upper-cased HTTP method (`GET`, `POST`).
//! Classes built with [`ClassBuilder::versioned_methods`] resolve to
//! `GET_<version>` instead, using the version negotiated from the `Accept`
//! header.
//!
//! ## Route Overrides
//!
//! [`ClassBuilder::route`] binds several alternative implementations to one
//! visible method name. Each alternative carries a predicate from
//! [`crate::route`]; the first matching alternative in declaration order
//! runs. When a class declares both a plain method and an override group
//! under the same name, the override group wins.
//!
//! ## OPTIONS
//!
//! Every class answers `OPTIONS`. Unless the class defines its own, the
//! default [`preflight`] reflects the CORS request headers back.

mod core;

pub use core::{
    preflight, Call, ClassBuilder, Controller, ControllerClass, HandlerResult, Stateless,
    DEFAULT_CLASS, DEFAULT_CONTENT_TYPE,
};
