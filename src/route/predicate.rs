use regex::Regex;
use serde_json::Value;

use super::{RouteContext, RouteOverride};
use crate::error::CallError;

/// Predicate backed by a closure over the route context.
pub struct FnRoute<F> {
    callback: F,
}

impl<F> FnRoute<F>
where
    F: Fn(&RouteContext<'_>) -> bool + Send + Sync,
{
    #[must_use]
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

impl<F> RouteOverride for FnRoute<F>
where
    F: Fn(&RouteContext<'_>) -> bool + Send + Sync,
{
    fn matches(&self, ctx: &RouteContext<'_>) -> Result<bool, CallError> {
        Ok((self.callback)(ctx))
    }
}

/// Matches when the leading positional arguments equal `paths`.
///
/// `PathRoute::new(["bar", "che"])` on class `Foo` only serves `/foo/bar/che...`.
/// Each path may itself contain slashes; it is split into segments first.
#[derive(Debug, Clone)]
pub struct PathRoute {
    paths: Vec<String>,
}

impl PathRoute {
    #[must_use]
    pub fn new<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let paths = paths
            .into_iter()
            .flat_map(|p| {
                p.as_ref()
                    .split('/')
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect::<Vec<_>>()
            })
            .collect();
        Self { paths }
    }
}

impl RouteOverride for PathRoute {
    fn matches(&self, ctx: &RouteContext<'_>) -> Result<bool, CallError> {
        let args = ctx.args();
        Ok(args.len() >= self.paths.len()
            && self.paths.iter().zip(args).all(|(want, got)| want == got))
    }
}

/// How a [`ParamRoute`] compares one query parameter.
#[derive(Debug, Clone)]
pub enum ParamMatch {
    /// The parameter, read as the JSON type of the value, must equal it.
    /// A parameter that does not parse as that type does not match.
    Value(Value),
    /// The parameter must match the pattern.
    Pattern(Regex),
}

impl ParamMatch {
    fn accepts(&self, raw: &str) -> bool {
        match self {
            ParamMatch::Pattern(re) => re.is_match(raw),
            ParamMatch::Value(Value::String(s)) => s == raw,
            ParamMatch::Value(Value::Bool(b)) => parse_bool(raw) == Some(*b),
            ParamMatch::Value(Value::Number(n)) => {
                if let Some(want) = n.as_i64() {
                    raw.trim().parse::<i64>().ok() == Some(want)
                } else {
                    n.as_f64()
                        .zip(raw.trim().parse::<f64>().ok())
                        .is_some_and(|(want, got)| want == got)
                }
            }
            ParamMatch::Value(Value::Null) => raw.is_empty(),
            ParamMatch::Value(other) => serde_json::from_str::<Value>(raw).ok().as_ref() == Some(other),
        }
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Matches on query parameters: every key in `keys` must be present and every
/// `(key, match)` pair must hold. Fails the request with 400.
#[derive(Debug, Clone, Default)]
pub struct ParamRoute {
    keys: Vec<String>,
    matches: Vec<(String, ParamMatch)>,
}

impl ParamRoute {
    /// Require the given query keys.
    #[must_use]
    pub fn new<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keys: keys.into_iter().map(Into::into).collect(),
            matches: Vec::new(),
        }
    }

    /// Require `key` to equal `value` once coerced to its JSON type.
    #[must_use]
    pub fn with_value(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.matches
            .push((key.to_string(), ParamMatch::Value(value.into())));
        self
    }

    /// Require `key` to match `pattern`.
    #[must_use]
    pub fn with_pattern(mut self, key: &str, pattern: Regex) -> Self {
        self.matches
            .push((key.to_string(), ParamMatch::Pattern(pattern)));
        self
    }
}

/// Raw string for a keyword argument; the last value if it was repeated.
fn kwarg_raw<'a>(ctx: &RouteContext<'a>, key: &str) -> Option<&'a str> {
    match ctx.resolution.keyword_args.get(key)? {
        Value::String(s) => Some(s.as_str()),
        Value::Array(values) => values.last().and_then(Value::as_str),
        _ => None,
    }
}

impl RouteOverride for ParamRoute {
    fn matches(&self, ctx: &RouteContext<'_>) -> Result<bool, CallError> {
        let kwargs = &ctx.resolution.keyword_args;
        if !self.keys.iter().all(|k| kwargs.contains_key(k)) {
            return Ok(false);
        }
        Ok(self
            .matches
            .iter()
            .all(|(key, want)| kwarg_raw(ctx, key).is_some_and(|raw| want.accepts(raw))))
    }

    fn failure(&self, ctx: &RouteContext<'_>) -> CallError {
        CallError::bad_request(format!(
            "Could not find a method to satisfy {}",
            ctx.request.path
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::ControllerClass;
    use crate::router::ResolutionResult;
    use crate::server::CallRequest;
    use serde_json::json;

    fn resolution(request: &CallRequest, args: &[&str]) -> ResolutionResult {
        ResolutionResult {
            module_name: "pkg".to_string(),
            namespace_path: vec!["pkg".to_string()],
            class_name: "Foo".to_string(),
            method_name: "GET".to_string(),
            class: ControllerClass::stateless("Foo").build(),
            positional_args: args.iter().map(|s| s.to_string()).collect(),
            keyword_args: request.query_kwargs(),
            version: None,
        }
    }

    fn check(route: &dyn RouteOverride, target: &str, args: &[&str]) -> bool {
        let request = CallRequest::get(target);
        let res = resolution(&request, args);
        matches!(route.matches(&RouteContext::new(&request, &res)), Ok(true))
    }

    #[test]
    fn test_path_route_prefix() {
        let route = PathRoute::new(["bar", "che"]);
        assert!(check(&route, "/foo/bar/che", &["bar", "che"]));
        assert!(check(&route, "/foo/bar/che/1", &["bar", "che", "1"]));
        assert!(!check(&route, "/foo/bar", &["bar"]));
        assert!(!check(&route, "/foo/che/bar", &["che", "bar"]));
    }

    #[test]
    fn test_path_route_splits_slashes() {
        let route = PathRoute::new(["/bar/che/"]);
        assert!(check(&route, "/foo/bar/che", &["bar", "che"]));
        assert!(check(&PathRoute::new(Vec::<String>::new()), "/foo", &[]));
    }

    #[test]
    fn test_param_route_keys() {
        let route = ParamRoute::new(["foo", "bar"]);
        assert!(check(&route, "/?foo=1&bar=2", &[]));
        assert!(!check(&route, "/?foo=1", &[]));
    }

    #[test]
    fn test_param_route_typed_values() {
        let route = ParamRoute::default().with_value("foo", 1);
        assert!(check(&route, "/?foo=1", &[]));
        assert!(!check(&route, "/?foo=2", &[]));
        assert!(!check(&route, "/?foo=one", &[]));
        assert!(!check(&route, "/", &[]));

        let route = ParamRoute::default().with_value("mode", "fast");
        assert!(check(&route, "/?mode=fast", &[]));
        assert!(!check(&route, "/?mode=slow", &[]));

        let route = ParamRoute::default().with_value("on", true);
        assert!(check(&route, "/?on=true", &[]));
        assert!(!check(&route, "/?on=false", &[]));

        let route = ParamRoute::default().with_value("ratio", json!(0.5));
        assert!(check(&route, "/?ratio=0.50", &[]));
    }

    #[test]
    fn test_param_route_repeated_uses_last() {
        let route = ParamRoute::default().with_value("foo", 2);
        assert!(check(&route, "/?foo=1&foo=2", &[]));
    }

    #[test]
    fn test_param_route_pattern() {
        let route = ParamRoute::default().with_pattern("id", Regex::new(r"^\d+$").unwrap());
        assert!(check(&route, "/?id=123", &[]));
        assert!(!check(&route, "/?id=abc", &[]));
    }

    #[test]
    fn test_param_route_fails_with_400() {
        let request = CallRequest::get("/foo");
        let res = resolution(&request, &[]);
        let err = ParamRoute::new(["x"]).failure(&RouteContext::new(&request, &res));
        assert_eq!(err.status(), 400);
    }
}
