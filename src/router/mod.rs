//! # Router Module
//!
//! The router resolves an incoming request to the controller class and
//! method that should handle it.
//!
//! ## Overview
//!
//! Paths are interpreted against a hierarchy of controller modules rather
//! than a route table. With the controller prefix `controllers`:
//!
//! - `GET /` runs `controllers.Default.GET`
//! - `GET /foo` runs `controllers.foo.Default.GET` if `controllers.foo` exists,
//!   otherwise `controllers.Default.GET("foo")`
//! - `POST /foo/bar/che?x=1` runs `controllers.foo.Bar.POST` with positional
//!   argument `che` and keyword argument `x`
//!
//! ## Algorithm
//!
//! 1. **Root**: the controller prefix, or `prefix.<version>` when namespace
//!    versioning is on.
//! 2. **Module**: greedily extend the root with leading path segments while
//!    the extended name is a known module (see
//!    [`NamespaceIndex`](crate::namespace::NamespaceIndex)).
//! 3. **Class**: if the next segment, first letter upper-cased, names a
//!    handler class in that module it is consumed; otherwise `Default`.
//! 4. **Method**: the upper-cased HTTP method, optionally suffixed with the
//!    negotiated version.
//!
//! Everything not consumed becomes positional arguments; the query string
//! becomes keyword arguments.
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use endpoints::config::DispatchConfig;
//! use endpoints::controller::ControllerClass;
//! use endpoints::namespace::{ControllerRegistry, Module};
//! use endpoints::router::Resolver;
//! use endpoints::server::CallRequest;
//!
//! let mut registry = ControllerRegistry::new();
//! registry.register(
//!     Module::new("controllers.foo").with_controller(
//!         ControllerClass::stateless("Bar")
//!             .method("GET", |_, _| Ok(serde_json::Value::Null))
//!             .build(),
//!     ),
//! );
//! let resolver =
//!     Resolver::from_registry(DispatchConfig::new("controllers"), Arc::new(registry)).unwrap();
//!
//! let res = resolver.resolve(&CallRequest::get("/foo/bar/happy")).unwrap();
//! assert_eq!(res.module_name, "controllers.foo");
//! assert_eq!(res.class_name, "Bar");
//! assert_eq!(res.positional_args, vec!["happy"]);
//! ```

mod core;

pub use core::{ResolutionResult, Resolver, DEFAULT_MODULE};
pub(crate) use core::capitalize;
