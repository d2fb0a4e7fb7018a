use std::any::Any;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, error, info, warn};

use crate::config::DispatchConfig;
use crate::controller::{Call, HandlerResult};
use crate::error::{CallError, ConfigError};
use crate::ids::RequestId;
use crate::namespace::ControllerRegistry;
use crate::route::RouteContext;
use crate::router::Resolver;
use crate::server::{CallRequest, CallResponse};

/// Body used for every failure whose details must not leak to the client.
const GENERIC_ERROR: &str = "Internal Server Error";

/// Lifecycle of one dispatched request.
///
/// ```text
/// Unresolved -> NamespaceResolved -> ClassResolved -> MethodSelected -> Invoked -> Responded
///      \______________\__________________\_______________\______________\-> Failed -> Responded
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DispatchState {
    Unresolved,
    NamespaceResolved,
    ClassResolved,
    MethodSelected,
    Invoked,
    Responded,
    Failed,
}

impl DispatchState {
    /// Whether moving from `self` to `next` is a legal step.
    #[must_use]
    pub fn can_transition_to(self, next: DispatchState) -> bool {
        use DispatchState::*;
        match (self, next) {
            (Unresolved, NamespaceResolved)
            | (NamespaceResolved, ClassResolved)
            | (ClassResolved, MethodSelected)
            | (MethodSelected, Invoked)
            | (Invoked, Responded)
            | (Failed, Responded) => true,
            (Responded | Failed, Failed) => false,
            (_, Failed) => true,
            _ => false,
        }
    }

    #[must_use]
    pub fn is_terminal(self) -> bool {
        self == DispatchState::Responded
    }
}

impl fmt::Display for DispatchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Tracks the state of a single dispatch and logs every transition.
struct Dispatch {
    request_id: RequestId,
    state: DispatchState,
}

impl Dispatch {
    fn new(request_id: RequestId) -> Self {
        Self {
            request_id,
            state: DispatchState::Unresolved,
        }
    }

    fn advance(&mut self, next: DispatchState) {
        if !self.state.can_transition_to(next) {
            warn!(
                request_id = %self.request_id,
                from = %self.state,
                to = %next,
                "Unexpected dispatch transition"
            );
        }
        debug!(request_id = %self.request_id, from = %self.state, to = %next, "Dispatch state");
        self.state = next;
    }
}

/// Turns requests into responses.
///
/// [`Dispatcher::handle`] never fails and never panics: resolution errors,
/// route-selection errors, handler errors and handler panics all end up as
/// a populated [`CallResponse`].
pub struct Dispatcher {
    resolver: Resolver,
}

impl Dispatcher {
    /// Dispatcher over the modules in `registry`.
    pub fn new(config: DispatchConfig, registry: Arc<ControllerRegistry>) -> Result<Self, ConfigError> {
        Ok(Self::with_resolver(Resolver::from_registry(config, registry)?))
    }

    #[must_use]
    pub fn with_resolver(resolver: Resolver) -> Self {
        Self { resolver }
    }

    #[must_use]
    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    /// Dispatch `request` and return the populated response.
    pub fn handle(&self, request: &CallRequest) -> CallResponse {
        let mut response = CallResponse::new();
        let mut dispatch = Dispatch::new(request.request_id);

        let outcome = catch_unwind(AssertUnwindSafe(|| {
            self.run(request, &mut response, &mut dispatch)
        }))
        .unwrap_or_else(|panic| {
            let panic_message = panic_message(panic.as_ref());
            let backtrace = std::backtrace::Backtrace::capture();
            error!(
                request_id = %request.request_id,
                method = %request.method,
                path = %request.path,
                panic_message = %panic_message,
                backtrace = %backtrace,
                "Handler panicked"
            );
            Err(CallError::Internal(anyhow::anyhow!(
                "handler panicked: {panic_message}"
            )))
        });

        match outcome {
            Ok(body) => response.set_body(body),
            Err(err) => {
                dispatch.advance(DispatchState::Failed);
                apply_error(request, &mut response, &err);
            }
        }
        dispatch.advance(DispatchState::Responded);

        info!(
            request_id = %request.request_id,
            method = %request.method,
            path = %request.path,
            status = response.status,
            "Request dispatched"
        );
        response
    }

    fn run(
        &self,
        request: &CallRequest,
        response: &mut CallResponse,
        dispatch: &mut Dispatch,
    ) -> HandlerResult {
        let resolution = self.resolver.resolve(request)?;
        dispatch.advance(DispatchState::NamespaceResolved);
        let class = Arc::clone(&resolution.class);
        dispatch.advance(DispatchState::ClassResolved);

        let mut instance = class.instantiate(request, response);

        let ctx = RouteContext::new(request, &resolution);
        let method = class
            .routes()
            .select(&resolution.method_name, &ctx)?
            .unwrap_or(resolution.method_name.as_str())
            .to_string();
        if !class.defines(&method) && method != "OPTIONS" {
            return Err(not_supported(request));
        }
        debug!(
            request_id = %request.request_id,
            module = %resolution.module_name,
            class = %resolution.class_name,
            method = %method,
            "Handling request with callback"
        );
        dispatch.advance(DispatchState::MethodSelected);

        if let Some(content_type) = class.content_type() {
            response.set_header("Content-Type", content_type.to_string());
        }

        dispatch.advance(DispatchState::Invoked);
        let mut call = Call {
            request,
            response,
            resolution: &resolution,
        };
        class
            .invoke(instance.as_mut(), &method, &mut call)
            .unwrap_or_else(|| Err(not_supported(request)))
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("config", self.resolver.config())
            .finish_non_exhaustive()
    }
}

fn not_supported(request: &CallRequest) -> CallError {
    CallError::method_not_allowed(format!("{} {} not supported", request.method, request.path))
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// Write `err` into `response`. The only place a failure becomes wire output.
pub(crate) fn apply_error(request: &CallRequest, response: &mut CallResponse, err: &CallError) {
    let status = err.status();
    response.status = status;

    if status >= 500 {
        error!(request_id = %request.request_id, status, error = %err, "Request failed");
    } else if status >= 400 {
        warn!(request_id = %request.request_id, status, error = %err, "Request rejected");
    } else {
        debug!(request_id = %request.request_id, status, error = %err, "Request stopped");
    }

    match err {
        CallError::Redirect { location, .. } => {
            response.set_header("Location", location.clone());
            response.clear_body();
        }
        CallError::Stop { body, .. } => {
            response.set_body(body.clone().unwrap_or(Value::Null));
        }
        explicit if explicit.is_explicit() => {
            if let Some(challenge) = explicit.challenge() {
                response.set_header("WWW-Authenticate", challenge);
            }
            set_error_body(response, &explicit.to_string());
        }
        _ => set_error_body(response, GENERIC_ERROR),
    }
}

fn set_error_body(response: &mut CallResponse, message: &str) {
    response.set_header("Content-Type", "application/json".to_string());
    response.set_body(json!({ "error": message }));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::ControllerClass;
    use crate::namespace::Module;

    #[test]
    fn test_state_transitions() {
        use DispatchState::*;
        assert!(Unresolved.can_transition_to(NamespaceResolved));
        assert!(NamespaceResolved.can_transition_to(ClassResolved));
        assert!(ClassResolved.can_transition_to(MethodSelected));
        assert!(MethodSelected.can_transition_to(Invoked));
        assert!(Invoked.can_transition_to(Responded));
        assert!(Unresolved.can_transition_to(Failed));
        assert!(Invoked.can_transition_to(Failed));
        assert!(Failed.can_transition_to(Responded));

        assert!(!Unresolved.can_transition_to(Invoked));
        assert!(!Responded.can_transition_to(Failed));
        assert!(!Failed.can_transition_to(Failed));
        assert!(!Responded.can_transition_to(Unresolved));
        assert!(Responded.is_terminal());
        assert!(!Failed.is_terminal());
    }

    #[test]
    fn test_dispatch_tracker_follows_states() {
        let mut dispatch = Dispatch::new(RequestId::new());
        dispatch.advance(DispatchState::NamespaceResolved);
        dispatch.advance(DispatchState::Failed);
        dispatch.advance(DispatchState::Responded);
        assert_eq!(dispatch.state, DispatchState::Responded);
    }

    #[test]
    fn test_panic_message() {
        let boxed: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(boxed.as_ref()), "boom");
        let boxed: Box<dyn Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(boxed.as_ref()), "bang");
        let boxed: Box<dyn Any + Send> = Box::new(42_u8);
        assert_eq!(panic_message(boxed.as_ref()), "unknown panic payload");
    }

    #[test]
    fn test_apply_error_bodies() {
        let request = CallRequest::get("/");

        let mut response = CallResponse::new();
        apply_error(&request, &mut response, &CallError::not_found("/x not found"));
        assert_eq!(response.status, 404);
        assert_eq!(response.body(), Some(&json!({"error": "/x not found"})));

        let mut response = CallResponse::new();
        apply_error(
            &request,
            &mut response,
            &CallError::Internal(anyhow::anyhow!("db password is hunter2")),
        );
        assert_eq!(response.status, 500);
        assert_eq!(response.body(), Some(&json!({"error": GENERIC_ERROR})));

        let mut response = CallResponse::new();
        apply_error(&request, &mut response, &CallError::redirect("http://example.com"));
        assert_eq!(response.status, 302);
        assert_eq!(response.get_header("Location"), Some("http://example.com"));
        assert!(response.body().is_none());

        let mut response = CallResponse::new();
        apply_error(&request, &mut response, &CallError::access_denied(Some("basic")));
        assert_eq!(response.status, 401);
        assert_eq!(response.get_header("WWW-Authenticate"), Some("Basic"));
    }

    #[test]
    fn test_dispatcher_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Dispatcher>();
    }

    #[test]
    fn test_handle_sets_class_content_type() {
        let mut registry = ControllerRegistry::new();
        registry.register(
            Module::new("controllers").with_controller(
                ControllerClass::stateless("Default")
                    .content_type("text/plain")
                    .method("GET", |_, _| Ok(json!("hi")))
                    .build(),
            ),
        );
        let dispatcher =
            Dispatcher::new(DispatchConfig::new("controllers"), Arc::new(registry)).unwrap();
        let response = dispatcher.handle(&CallRequest::get("/"));
        assert_eq!(response.status, 200);
        assert_eq!(response.get_header("content-type"), Some("text/plain"));
        assert_eq!(response.body(), Some(&json!("hi")));
    }
}
