use serde_json::json;

use crate::controller::{Call, ClassBuilder, ControllerClass, HandlerResult, Stateless};
use crate::route::VersionRoute;

// Echo handler: answers with where the request landed
fn echo(handler: &str, call: &Call<'_>) -> HandlerResult {
    let res = call.resolution;
    Ok(json!({
        "module": res.module_name,
        "class": res.class_name,
        "method": res.method_name,
        "handler": handler,
        "args": res.positional_args,
        "kwargs": res.keyword_args,
        "version": res.version,
        "body": call.request.body,
    }))
}

/// Start an echo class; every method added with [`with_echo_method`] and
/// [`with_echo_version`] answers with the resolution it was reached through.
pub(crate) fn echo_class(name: &str) -> ClassBuilder<Stateless> {
    ControllerClass::stateless(name)
}

pub(crate) fn with_echo_method(builder: ClassBuilder<Stateless>, method: &str) -> ClassBuilder<Stateless> {
    let handler = method.to_string();
    builder.method(method, move |_, call| echo(&handler, call))
}

/// Bind `alternative` under `visible`, selected when the negotiated version is in `versions`.
pub(crate) fn with_echo_version(
    builder: ClassBuilder<Stateless>,
    visible: &str,
    alternative: &str,
    versions: &[String],
) -> ClassBuilder<Stateless> {
    let handler = alternative.to_string();
    builder.route(
        visible,
        alternative,
        VersionRoute::new(versions.iter().cloned()),
        move |_, call| echo(&handler, call),
    )
}
