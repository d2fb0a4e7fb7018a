//! Shared fixtures for the integration tests.
//!
//! [`controller_tree`] builds the same small controller hierarchy most test
//! files route against:
//!
//! ```text
//! pkg               Default(GET)
//! pkg.default       Default(GET)
//! pkg.foo           Default(GET, POST)  Bar(GET, POST)  Helper (symbol)
//! pkg.foo.baz       Default(GET)        Che(GET, POST)
//! pkg.foo.boom      Bang(GET)
//! ```
//!
//! Every method answers with [`describe`], so assertions can check where a
//! request landed by looking at the response body.

#![allow(dead_code)]

use std::sync::Arc;

use endpoints::config::DispatchConfig;
use endpoints::controller::{Call, ControllerClass, HandlerResult};
use endpoints::dispatcher::Dispatcher;
use endpoints::namespace::{ControllerRegistry, Module};
use endpoints::router::Resolver;
use serde_json::{json, Value};

pub const PREFIX: &str = "pkg";

/// Body every fixture method answers with.
pub fn describe(method: &str, call: &Call<'_>) -> Value {
    json!({
        "module": call.resolution.module_name,
        "class": call.resolution.class_name,
        "method": method,
        "args": call.args(),
        "kwargs": call.kwargs(),
    })
}

fn echo(name: &str, methods: &[&'static str]) -> Arc<ControllerClass> {
    let mut builder = ControllerClass::stateless(name);
    for &method in methods {
        builder = builder.method(method, move |_, call| -> HandlerResult { Ok(describe(method, call)) });
    }
    builder.build()
}

/// The fixture tree described in the module docs.
pub fn controller_tree() -> ControllerRegistry {
    let mut registry = ControllerRegistry::new();
    registry
        .register(Module::new("pkg").with_controller(echo("Default", &["GET"])))
        .register(Module::new("pkg.default").with_controller(echo("Default", &["GET"])))
        .register(
            Module::new("pkg.foo")
                .with_controller(echo("Default", &["GET", "POST"]))
                .with_controller(echo("Bar", &["GET", "POST"]))
                .with_symbol("Helper"),
        )
        .register(
            Module::new("pkg.foo.baz")
                .with_controller(echo("Default", &["GET"]))
                .with_controller(echo("Che", &["GET", "POST"])),
        )
        .register(Module::new("pkg.foo.boom").with_controller(echo("Bang", &["GET"])));
    registry
}

pub fn resolver() -> Resolver {
    Resolver::from_registry(DispatchConfig::new(PREFIX), Arc::new(controller_tree())).unwrap()
}

pub fn dispatcher() -> Dispatcher {
    Dispatcher::new(DispatchConfig::new(PREFIX), Arc::new(controller_tree())).unwrap()
}

/// Dispatcher over a single module `prefix` holding `classes`.
pub fn single_module(prefix: &str, classes: Vec<Arc<ControllerClass>>) -> Dispatcher {
    let mut module = Module::new(prefix);
    for class in classes {
        module = module.with_controller(class);
    }
    let mut registry = ControllerRegistry::new();
    registry.register(module);
    Dispatcher::new(DispatchConfig::new(prefix), Arc::new(registry)).unwrap()
}
