//! # endpoints
//!
//! **endpoints** is a convention-based request dispatch core. Instead of a
//! route table, requests are mapped onto a hierarchy of controller modules:
//! `METHOD /module/class/args?kwargs` runs `prefix.module.Class.METHOD(args, kwargs)`.
//!
//! ## Overview
//!
//! Given a method, a path, headers and an optional JSON body, the crate
//! finds the longest matching controller module, then the handler class,
//! then the method; builds positional arguments from the leftover path
//! segments and keyword arguments from the query string; invokes the
//! method; and turns the outcome (return value, error, or panic) into a
//! response with a status code.
//!
//! ## Architecture
//!
//! - **[`media`]** - `Accept` header parsing and version extraction
//! - **[`namespace`]** - Controller module registry and the cached namespace walk
//! - **[`controller`]** - Handler class definitions and the per-call context
//! - **[`route`]** - Route overrides: path, parameter and version predicates
//! - **[`router`]** - Resolution of requests to module, class and method
//! - **[`dispatcher`]** - The per-request state machine and error mapping
//! - **[`server`]** - Request and response views exchanged with a transport
//! - **[`config`]** - Dispatch settings from code, YAML or environment
//! - **[`logging`]** - `tracing` subscriber setup
//! - **[`manifest`]** - YAML controller trees of echo handlers, used by the CLI
//!
//! ### Request Handling Flow
//!
//! ```text
//! CallRequest
//!   -> Resolver        (NamespaceIndex walk, class lookup, method name)
//!   -> ResolutionResult{module, class, method, args, kwargs}
//!   -> Dispatcher      (instantiate, select route override, invoke)
//!   -> CallResponse    (status, headers, body)
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use endpoints::config::DispatchConfig;
//! use endpoints::controller::ControllerClass;
//! use endpoints::dispatcher::Dispatcher;
//! use endpoints::namespace::{ControllerRegistry, Module};
//! use endpoints::route::VersionRoute;
//! use endpoints::server::CallRequest;
//! use serde_json::json;
//!
//! let users = ControllerClass::stateless("Default")
//!     .route("GET", "GET_1", VersionRoute::new(["", "v1"]), |_, call| {
//!         Ok(json!({ "v": 1, "id": call.require_arg(0)? }))
//!     })
//!     .route("GET", "GET_2", VersionRoute::new(["v2"]), |_, call| {
//!         Ok(json!({ "v": 2, "id": call.require_arg(0)? }))
//!     })
//!     .build();
//!
//! let mut registry = ControllerRegistry::new();
//! registry.register(Module::new("api.users").with_controller(users));
//!
//! let dispatcher = Dispatcher::new(DispatchConfig::new("api"), Arc::new(registry)).unwrap();
//!
//! let request = CallRequest::get("/users/42").with_header("Accept", "application/json;version=v2");
//! let response = dispatcher.handle(&request);
//! assert_eq!(response.status, 200);
//! assert_eq!(response.body(), Some(&json!({ "v": 2, "id": "42" })));
//! ```

pub mod cli;
pub mod config;
pub mod controller;
pub mod dispatcher;
mod echo;
pub mod error;
pub mod ids;
pub mod logging;
pub mod manifest;
pub mod media;
pub mod namespace;
pub mod route;
pub mod router;
pub mod server;

pub use config::DispatchConfig;
pub use controller::{Call, Controller, ControllerClass, HandlerResult};
pub use dispatcher::Dispatcher;
pub use error::{CallError, ConfigError, LoadError};
pub use router::{ResolutionResult, Resolver};
pub use server::{CallRequest, CallResponse};
