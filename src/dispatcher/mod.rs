//! # Dispatcher Module
//!
//! The dispatcher drives a request from resolution to a finished response.
//!
//! ## Overview
//!
//! For every request the dispatcher:
//! - Resolves the module, class and method with the [`Resolver`](crate::router::Resolver)
//! - Instantiates the controller class with the request and response
//! - Picks a route-override alternative, or the plain method
//! - Sets `Content-Type` from the class and invokes the method
//! - Converts any failure, including a panic, into a status code and body
//!
//! ## Error Mapping
//!
//! | Failure | Status | Body |
//! |---------|--------|------|
//! | nothing resolves | 404 | `{"error": ...}` |
//! | method missing / no route matched | 405 | `{"error": ...}` |
//! | param route exhausted | 400 | `{"error": ...}` |
//! | access denied | 401 + `WWW-Authenticate` | `{"error": ...}` |
//! | version mismatch | 406 | `{"error": ...}` |
//! | redirect | 302 + `Location` | none |
//! | explicit stop | given code | given body |
//! | configuration, internal, panic | 500 | generic message |
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use endpoints::config::DispatchConfig;
//! use endpoints::controller::ControllerClass;
//! use endpoints::dispatcher::Dispatcher;
//! use endpoints::namespace::{ControllerRegistry, Module};
//! use endpoints::server::CallRequest;
//! use serde_json::json;
//!
//! let mut registry = ControllerRegistry::new();
//! registry.register(Module::new("controllers").with_controller(
//!     ControllerClass::stateless("Default")
//!         .method("GET", |_, call| Ok(json!({ "args": call.args() })))
//!         .build(),
//! ));
//! let dispatcher =
//!     Dispatcher::new(DispatchConfig::new("controllers"), Arc::new(registry)).unwrap();
//!
//! let response = dispatcher.handle(&CallRequest::get("/a/b"));
//! assert_eq!(response.status, 200);
//! assert_eq!(response.body(), Some(&json!({ "args": ["a", "b"] })));
//!
//! let response = dispatcher.handle(&CallRequest::post("/"));
//! assert_eq!(response.status, 405);
//! ```

mod core;

pub use core::{DispatchState, Dispatcher};
