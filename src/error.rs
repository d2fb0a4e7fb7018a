//! Error types shared by resolution and dispatch.
//!
//! [`CallError`] is the single failure type that flows out of the resolver,
//! the route-override selection and handler methods. Every variant knows its
//! HTTP status; the dispatcher is the only place that turns one into a
//! response.

use serde_json::Value;

use crate::router::capitalize;

/// Configuration problems detected while resolving or building a dispatcher.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// The controller prefix (namespace root) is empty.
    #[error("controller prefix is empty")]
    EmptyPrefix,
    /// The namespace root is not known to the namespace source.
    #[error("namespace root `{0}` could not be loaded")]
    RootNotLoadable(String),
    /// Version negotiation was requested for a class that declares no content type.
    #[error("versioning a call with no content type")]
    MissingContentType,
}

/// Failure to load a module from the registry.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// No module is registered under that name.
    #[error("no module named `{0}`")]
    Missing(String),
    /// The module's deferred initialiser failed.
    #[error("module `{name}` failed to initialise: {source}")]
    Init {
        name: String,
        #[source]
        source: anyhow::Error,
    },
}

/// A request-level failure carrying (or implying) an HTTP status code.
#[derive(Debug, thiserror::Error)]
pub enum CallError {
    /// No namespace/class combination matches the request (404).
    #[error("{0}")]
    NotFound(String),
    /// The route resolved but nothing answers the HTTP method (405).
    #[error("{0}")]
    MethodNotAllowed(String),
    /// Parameter-pattern routing failed or the handler rejected its input (400).
    #[error("{0}")]
    BadRequest(String),
    /// The handler denied access (401, with a `WWW-Authenticate` challenge).
    #[error("{message}")]
    AccessDenied {
        scheme: Option<String>,
        realm: Option<String>,
        message: String,
    },
    /// Accept-header version negotiation failed (406).
    #[error(
        "expected accept header with {content_type};version=N media type, got {}",
        .requested.as_deref().unwrap_or("no version")
    )]
    VersionMismatch {
        content_type: String,
        requested: Option<String>,
        accepted: Vec<String>,
    },
    /// Handler asked for a redirect.
    #[error("redirect to {location}")]
    Redirect { code: u16, location: String },
    /// Handler short-circuited with an explicit code and body.
    #[error("call stopped with status {code}")]
    Stop { code: u16, body: Option<Value> },
    /// Application error with an explicit status code.
    #[error("{message}")]
    Status { code: u16, message: String },
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Anything else. Always reported as 500.
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl CallError {
    pub fn not_found(message: impl Into<String>) -> Self {
        CallError::NotFound(message.into())
    }

    pub fn method_not_allowed(message: impl Into<String>) -> Self {
        CallError::MethodNotAllowed(message.into())
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        CallError::BadRequest(message.into())
    }

    /// Application error with an explicit status code and message.
    pub fn http(code: u16, message: impl Into<String>) -> Self {
        CallError::Status {
            code,
            message: message.into(),
        }
    }

    /// Stop the call with `code`, answering with `body` (dropped for bodiless codes).
    pub fn stop(code: u16, body: Option<Value>) -> Self {
        CallError::Stop { code, body }
    }

    /// 302 redirect to `location`.
    pub fn redirect(location: impl Into<String>) -> Self {
        CallError::Redirect {
            code: 302,
            location: location.into(),
        }
    }

    /// 401 with an optional auth scheme (e.g. `basic`, `bearer`).
    pub fn access_denied(scheme: Option<&str>) -> Self {
        CallError::AccessDenied {
            scheme: scheme.map(str::to_string),
            realm: None,
            message: "access denied".to_string(),
        }
    }

    /// HTTP status this failure maps to.
    #[must_use]
    pub fn status(&self) -> u16 {
        match self {
            CallError::NotFound(_) => 404,
            CallError::MethodNotAllowed(_) => 405,
            CallError::BadRequest(_) => 400,
            CallError::AccessDenied { .. } => 401,
            CallError::VersionMismatch { .. } => 406,
            CallError::Redirect { code, .. } => *code,
            CallError::Stop { code, .. } => *code,
            CallError::Status { code, .. } => *code,
            CallError::Config(_) | CallError::Internal(_) => 500,
        }
    }

    /// Whether the error was raised on purpose with a known status.
    ///
    /// Opaque failures (`Config`, `Internal`) are the only ones whose message
    /// is kept out of the response body.
    #[must_use]
    pub fn is_explicit(&self) -> bool {
        !matches!(self, CallError::Config(_) | CallError::Internal(_))
    }

    /// `WWW-Authenticate` challenge for [`CallError::AccessDenied`].
    #[must_use]
    pub fn challenge(&self) -> Option<String> {
        match self {
            CallError::AccessDenied { scheme, realm, .. } => {
                let scheme = scheme
                    .as_deref()
                    .filter(|s| !s.is_empty())
                    .map(capitalize)
                    .unwrap_or_else(|| "Auth".to_string());
                Some(match realm {
                    Some(realm) => format!("{scheme} realm=\"{realm}\""),
                    None => scheme,
                })
            }
            _ => None,
        }
    }
}
