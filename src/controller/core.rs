use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::error::CallError;
use crate::route::{Alternative, RouteOverride, RouteTable};
use crate::router::ResolutionResult;
use crate::server::{CallRequest, CallResponse, Kwargs};

/// Class name used when no path segment names a handler class.
pub const DEFAULT_CLASS: &str = "Default";

/// Content type a class declares unless told otherwise.
pub const DEFAULT_CONTENT_TYPE: &str = "application/json";

/// What a controller method returns: the response body, or a failure that
/// the dispatcher maps to a status code.
pub type HandlerResult = Result<Value, CallError>;

/// A handler class. One instance is built per dispatched request.
///
/// The constructor sees the request and may prime the response (headers,
/// status) before the method runs.
pub trait Controller: Send + 'static {
    fn new(request: &CallRequest, response: &mut CallResponse) -> Self
    where
        Self: Sized;
}

/// Controller with no per-request state, for classes built entirely from closures.
#[derive(Debug, Default, Clone, Copy)]
pub struct Stateless;

impl Controller for Stateless {
    fn new(_request: &CallRequest, _response: &mut CallResponse) -> Self {
        Stateless
    }
}

/// Everything a controller method gets to look at while it runs.
///
/// `resolution` is a lookup-only reference back to the dispatch context that
/// produced this call.
pub struct Call<'a> {
    pub request: &'a CallRequest,
    pub response: &'a mut CallResponse,
    pub resolution: &'a ResolutionResult,
}

impl<'a> Call<'a> {
    /// Positional arguments: the unconsumed path segments.
    #[must_use]
    pub fn args(&self) -> &[String] {
        &self.resolution.positional_args
    }

    /// Keyword arguments: the query parameters.
    #[must_use]
    pub fn kwargs(&self) -> &Kwargs {
        &self.resolution.keyword_args
    }

    #[must_use]
    pub fn arg(&self, index: usize) -> Option<&str> {
        self.args().get(index).map(String::as_str)
    }

    /// A positional argument the method cannot do without.
    ///
    /// A missing segment means the path does not name a resource this method
    /// serves, so it is reported as 404.
    pub fn require_arg(&self, index: usize) -> Result<&str, CallError> {
        self.arg(index).ok_or_else(|| {
            CallError::not_found(format!(
                "{} not found: missing path segment {}",
                self.request.path,
                index + 1
            ))
        })
    }

    #[must_use]
    pub fn kwarg(&self, name: &str) -> Option<&Value> {
        self.kwargs().get(name)
    }

    /// String value of a keyword argument; the last one if it was repeated.
    #[must_use]
    pub fn kwarg_str(&self, name: &str) -> Option<&str> {
        match self.kwarg(name)? {
            Value::String(s) => Some(s),
            Value::Array(values) => values.last().and_then(Value::as_str),
            _ => None,
        }
    }
}

/// Default cross-origin preflight answer.
///
/// Reflects `Origin`, `Access-Control-Request-Method` and
/// `Access-Control-Request-Headers` into the matching `Access-Control-Allow-*`
/// response headers when the client sent them. No body.
pub fn preflight(call: &mut Call<'_>) -> HandlerResult {
    let reflections = [
        ("origin", "Access-Control-Allow-Origin"),
        ("access-control-request-method", "Access-Control-Allow-Methods"),
        ("access-control-request-headers", "Access-Control-Allow-Headers"),
    ];
    for (requested, allowed) in reflections {
        if let Some(value) = call.request.get_header(requested) {
            call.response.set_header(allowed, value.to_string());
        }
    }
    Ok(Value::Null)
}

type MethodFn<C> = Arc<dyn Fn(&mut C, &mut Call<'_>) -> HandlerResult + Send + Sync>;
type MethodMap<C> = Arc<HashMap<String, MethodFn<C>>>;

/// A live controller instance with its method table bound.
pub(crate) trait Instance {
    /// Run `method`, or `None` if the class does not define it.
    fn invoke(&mut self, method: &str, call: &mut Call<'_>) -> Option<HandlerResult>;
}

struct Bound<C> {
    controller: C,
    methods: MethodMap<C>,
}

impl<C: Controller> Instance for Bound<C> {
    fn invoke(&mut self, method: &str, call: &mut Call<'_>) -> Option<HandlerResult> {
        let f = self.methods.get(method)?;
        Some(f(&mut self.controller, call))
    }
}

/// Type-erased half of a [`ControllerClass`]: knows how to build instances.
trait ClassHandle: Send + Sync {
    fn instantiate(&self, request: &CallRequest, response: &mut CallResponse) -> Box<dyn Instance>;
    fn defines(&self, method: &str) -> bool;
    fn method_names(&self) -> Vec<String>;
}

struct TypedClass<C> {
    methods: MethodMap<C>,
}

impl<C: Controller> ClassHandle for TypedClass<C> {
    fn instantiate(&self, request: &CallRequest, response: &mut CallResponse) -> Box<dyn Instance> {
        Box::new(Bound {
            controller: C::new(request, response),
            methods: Arc::clone(&self.methods),
        })
    }

    fn defines(&self, method: &str) -> bool {
        self.methods.contains_key(method)
    }

    fn method_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.methods.keys().cloned().collect();
        names.sort();
        names
    }
}

/// Static definition of a handler class: its name, declared content type,
/// method table and route-override bindings.
///
/// Built once at startup with [`ControllerClass::builder`] and shared
/// read-only between requests.
pub struct ControllerClass {
    name: String,
    content_type: Option<String>,
    default_version: Option<String>,
    version_suffixed: bool,
    routes: RouteTable,
    handle: Box<dyn ClassHandle>,
}

impl ControllerClass {
    /// Start defining a class backed by controller type `C`.
    #[must_use]
    pub fn builder<C: Controller>(name: &str) -> ClassBuilder<C> {
        ClassBuilder {
            name: name.to_string(),
            content_type: Some(DEFAULT_CONTENT_TYPE.to_string()),
            default_version: None,
            version_suffixed: false,
            methods: HashMap::new(),
            routes: RouteTable::default(),
        }
    }

    /// Start defining a class whose methods need no per-request state.
    #[must_use]
    pub fn stateless(name: &str) -> ClassBuilder<Stateless> {
        Self::builder::<Stateless>(name)
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    #[must_use]
    pub fn default_version(&self) -> Option<&str> {
        self.default_version.as_deref()
    }

    /// Whether method names carry the negotiated version (`GET_v2`).
    #[must_use]
    pub fn version_suffixed(&self) -> bool {
        self.version_suffixed
    }

    #[must_use]
    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    /// Whether a concrete method of this exact name exists.
    #[must_use]
    pub fn defines(&self, method: &str) -> bool {
        self.handle.defines(method)
    }

    /// Whether a request for `method` has anything to land on: a concrete
    /// method, a route-override group, or the default `OPTIONS` preflight.
    #[must_use]
    pub fn responds_to(&self, method: &str) -> bool {
        method == "OPTIONS" || self.defines(method) || self.routes.alternatives(method).is_some()
    }

    /// Defined method names, sorted.
    #[must_use]
    pub fn method_names(&self) -> Vec<String> {
        self.handle.method_names()
    }

    pub(crate) fn instantiate(
        &self,
        request: &CallRequest,
        response: &mut CallResponse,
    ) -> Box<dyn Instance> {
        self.handle.instantiate(request, response)
    }

    /// Invoke `method` on `instance`, falling back to [`preflight`] for an
    /// undefined `OPTIONS`. `None` when nothing answers.
    pub(crate) fn invoke(
        &self,
        instance: &mut dyn Instance,
        method: &str,
        call: &mut Call<'_>,
    ) -> Option<HandlerResult> {
        match instance.invoke(method, call) {
            Some(result) => Some(result),
            None if method == "OPTIONS" => Some(preflight(call)),
            None => None,
        }
    }
}

impl fmt::Debug for ControllerClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControllerClass")
            .field("name", &self.name)
            .field("content_type", &self.content_type)
            .field("default_version", &self.default_version)
            .field("version_suffixed", &self.version_suffixed)
            .field("methods", &self.method_names())
            .field("routes", &self.routes)
            .finish()
    }
}

/// Builder for [`ControllerClass`].
pub struct ClassBuilder<C> {
    name: String,
    content_type: Option<String>,
    default_version: Option<String>,
    version_suffixed: bool,
    methods: HashMap<String, MethodFn<C>>,
    routes: RouteTable,
}

impl<C: Controller> ClassBuilder<C> {
    /// Content type set on successful responses and used for version negotiation.
    #[must_use]
    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Declare no content type. Version negotiation on such a class is a
    /// configuration error.
    #[must_use]
    pub fn without_content_type(mut self) -> Self {
        self.content_type = None;
        self
    }

    /// Version assumed when the `Accept` header carries none.
    #[must_use]
    pub fn default_version(mut self, version: impl Into<String>) -> Self {
        self.default_version = Some(version.into());
        self
    }

    /// Resolve `GET` to `GET_<version>` using the negotiated version.
    #[must_use]
    pub fn versioned_methods(mut self) -> Self {
        self.version_suffixed = true;
        self
    }

    /// Define an entry point such as `GET`, `POST` or `GET_v1`.
    #[must_use]
    pub fn method<F>(mut self, name: &str, f: F) -> Self
    where
        F: Fn(&mut C, &mut Call<'_>) -> HandlerResult + Send + Sync + 'static,
    {
        self.methods.insert(name.to_string(), Arc::new(f));
        self
    }

    /// Define `alternative` as one candidate implementation of the visible
    /// method `visible`, chosen when `predicate` matches.
    ///
    /// Candidates are tried in the order they are declared here.
    #[must_use]
    pub fn route<R, F>(mut self, visible: &str, alternative: &str, predicate: R, f: F) -> Self
    where
        R: RouteOverride + 'static,
        F: Fn(&mut C, &mut Call<'_>) -> HandlerResult + Send + Sync + 'static,
    {
        self.routes.push(
            visible,
            Alternative {
                name: alternative.to_string(),
                predicate: Arc::new(predicate),
            },
        );
        self.method(alternative, f)
    }

    #[must_use]
    pub fn build(self) -> Arc<ControllerClass> {
        Arc::new(ControllerClass {
            name: self.name,
            content_type: self.content_type,
            default_version: self.default_version,
            version_suffixed: self.version_suffixed,
            routes: self.routes,
            handle: Box::new(TypedClass {
                methods: Arc::new(self.methods),
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::route::FnRoute;
    use serde_json::json;

    struct Counter {
        origin: Option<String>,
    }

    impl Controller for Counter {
        fn new(request: &CallRequest, _response: &mut CallResponse) -> Self {
            Counter {
                origin: request.get_header("origin").map(str::to_string),
            }
        }
    }

    fn resolution_for(class: &Arc<ControllerClass>, args: &[&str]) -> ResolutionResult {
        ResolutionResult {
            module_name: "pkg".to_string(),
            namespace_path: vec!["pkg".to_string()],
            class_name: class.name().to_string(),
            method_name: "GET".to_string(),
            class: Arc::clone(class),
            positional_args: args.iter().map(|s| s.to_string()).collect(),
            keyword_args: Kwargs::new(),
            version: None,
        }
    }

    #[test]
    fn test_builder_records_methods_and_routes() {
        let class = ControllerClass::stateless("Bar")
            .method("POST", |_, _| Ok(Value::Null))
            .route("GET", "GET_1", FnRoute::new(|_| true), |_, _| Ok(json!(1)))
            .build();
        assert_eq!(class.name(), "Bar");
        assert_eq!(class.content_type(), Some(DEFAULT_CONTENT_TYPE));
        assert_eq!(class.method_names(), vec!["GET_1", "POST"]);
        assert!(class.responds_to("GET"));
        assert!(class.responds_to("POST"));
        assert!(class.responds_to("OPTIONS"));
        assert!(!class.responds_to("DELETE"));
        assert!(!class.defines("GET"));
    }

    #[test]
    fn test_instance_sees_constructor_state() {
        let class = ControllerClass::builder::<Counter>("Default")
            .method("GET", |this: &mut Counter, _call: &mut Call<'_>| {
                Ok(json!(this.origin.clone()))
            })
            .build();
        let request = CallRequest::get("/").with_header("Origin", "http://example.com");
        let mut response = CallResponse::new();
        let resolution = resolution_for(&class, &[]);
        let mut instance = class.instantiate(&request, &mut response);
        let mut call = Call {
            request: &request,
            response: &mut response,
            resolution: &resolution,
        };
        let result = class.invoke(instance.as_mut(), "GET", &mut call);
        assert_eq!(result.map(|r| r.ok()), Some(Some(json!("http://example.com"))));
        assert!(class.invoke(instance.as_mut(), "PUT", &mut call).is_none());
    }

    #[test]
    fn test_default_preflight_reflects_request() {
        let class = ControllerClass::stateless("Cors")
            .method("POST", |_, _| Ok(Value::Null))
            .build();
        let request = CallRequest::new(http::Method::OPTIONS, "/")
            .with_header("Origin", "http://example.com")
            .with_header("Access-Control-Request-Method", "POST")
            .with_header("Access-Control-Request-Headers", "xone, xtwo");
        let mut response = CallResponse::new();
        let resolution = resolution_for(&class, &[]);
        let mut instance = class.instantiate(&request, &mut response);
        let mut call = Call {
            request: &request,
            response: &mut response,
            resolution: &resolution,
        };
        let result = class.invoke(instance.as_mut(), "OPTIONS", &mut call);
        assert!(matches!(result, Some(Ok(Value::Null))));
        assert_eq!(
            response.get_header("Access-Control-Allow-Origin"),
            Some("http://example.com")
        );
        assert_eq!(response.get_header("Access-Control-Allow-Methods"), Some("POST"));
        assert_eq!(
            response.get_header("Access-Control-Allow-Headers"),
            Some("xone, xtwo")
        );
    }

    #[test]
    fn test_preflight_without_origin_sets_nothing() {
        let class = ControllerClass::stateless("Cors").build();
        let request = CallRequest::new(http::Method::OPTIONS, "/");
        let mut response = CallResponse::new();
        let resolution = resolution_for(&class, &[]);
        let mut call = Call {
            request: &request,
            response: &mut response,
            resolution: &resolution,
        };
        assert!(preflight(&mut call).is_ok());
        assert!(response.headers.is_empty());
    }

    #[test]
    fn test_call_argument_helpers() {
        let class = ControllerClass::stateless("Default").build();
        let request = CallRequest::get("/happy?x=1&x=2&y=3");
        let mut response = CallResponse::new();
        let mut resolution = resolution_for(&class, &["happy"]);
        resolution.keyword_args = request.query_kwargs();
        let call = Call {
            request: &request,
            response: &mut response,
            resolution: &resolution,
        };
        assert_eq!(call.arg(0), Some("happy"));
        assert_eq!(call.require_arg(0).ok(), Some("happy"));
        assert_eq!(call.require_arg(1).map_err(|e| e.status()).err(), Some(404));
        assert_eq!(call.kwarg_str("x"), Some("2"));
        assert_eq!(call.kwarg_str("y"), Some("3"));
        assert!(call.kwarg("z").is_none());
    }
}
