use std::collections::BTreeMap;
use std::sync::Arc;

use http::Method;
use serde_json::Value;
use smallvec::SmallVec;
use tracing::debug;

use crate::ids::{RequestId, REQUEST_ID_HEADER};
use crate::media::AcceptHeader;

/// Maximum inline headers before heap allocation.
/// Most requests have ≤16 headers.
pub const MAX_INLINE_HEADERS: usize = 16;

/// Header storage shared by requests and responses.
///
/// Names are matched case-insensitively (RFC 7230) and kept as `Arc<str>`
/// because the same few names repeat on every call.
pub type HeaderVec = SmallVec<[(Arc<str>, String); MAX_INLINE_HEADERS]>;

/// Keyword arguments handed to a controller method: query parameter name to
/// value. A parameter given once maps to a JSON string; a repeated parameter
/// maps to an array of strings in the order they were sent.
pub type Kwargs = BTreeMap<String, Value>;

/// Case-insensitive header lookup over a [`HeaderVec`].
pub(crate) fn find_header<'a>(headers: &'a HeaderVec, name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

/// Replace any header with the same (case-insensitive) name.
pub(crate) fn replace_header(headers: &mut HeaderVec, name: &str, value: String) {
    headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
    headers.push((Arc::from(name), value));
}

/// Split a URL path into its non-empty, percent-decoded segments.
///
/// `/foo//bar/` and `foo/bar` both yield `["foo", "bar"]`. A segment that
/// does not decode to UTF-8 is kept verbatim.
#[must_use]
pub fn split_path(path: &str) -> Vec<String> {
    path.split('/')
        .filter(|s| !s.is_empty())
        .map(|s| {
            urlencoding::decode(s)
                .map(|d| d.into_owned())
                .unwrap_or_else(|_| s.to_string())
        })
        .collect()
}

/// Parse a query string (without the leading `?`) into ordered pairs.
///
/// Repeated keys are preserved in the order they appear.
#[must_use]
pub fn parse_query_params(query: &str) -> Vec<(String, String)> {
    url::form_urlencoded::parse(query.as_bytes())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}

/// The dispatcher's read-only view of an inbound HTTP request.
///
/// Built by the transport adapter (or directly in tests) from a method and a
/// request target such as `/foo/bar?che=1`.
#[derive(Debug, Clone)]
pub struct CallRequest {
    /// Correlation id, taken from `X-Request-Id` when it is a valid ULID
    pub request_id: RequestId,
    /// HTTP method
    pub method: Method,
    /// Path without the query string
    pub path: String,
    path_args: Vec<String>,
    query: Vec<(String, String)>,
    headers: HeaderVec,
    /// Request body parsed as JSON (if present)
    pub body: Option<Value>,
}

impl CallRequest {
    /// Build a request for `target`, which may carry a query string.
    #[must_use]
    pub fn new(method: Method, target: &str) -> Self {
        let (path, query) = match target.split_once('?') {
            Some((path, query)) => (path, parse_query_params(query)),
            None => (target, Vec::new()),
        };
        let path = if path.is_empty() { "/" } else { path };
        Self {
            request_id: RequestId::new(),
            method,
            path: path.to_string(),
            path_args: split_path(path),
            query,
            headers: HeaderVec::new(),
            body: None,
        }
    }

    #[must_use]
    pub fn get(target: &str) -> Self {
        Self::new(Method::GET, target)
    }

    #[must_use]
    pub fn post(target: &str) -> Self {
        Self::new(Method::POST, target)
    }

    /// Builder-style header setter.
    #[must_use]
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set_header(name, value.into());
        self
    }

    /// Builder-style query parameter (appended, so repeats are kept).
    #[must_use]
    pub fn with_query(mut self, name: &str, value: impl Into<String>) -> Self {
        self.query.push((name.to_string(), value.into()));
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Set a header, replacing an existing one with the same name.
    ///
    /// Setting `X-Request-Id` to a valid ULID also adopts it as the request id.
    pub fn set_header(&mut self, name: &str, value: String) {
        if name.eq_ignore_ascii_case(REQUEST_ID_HEADER) {
            self.request_id = RequestId::from_header_or_new(Some(&value));
        }
        replace_header(&mut self.headers, name, value);
    }

    /// Get a header by name (case-insensitive per RFC 7230)
    #[inline]
    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    #[must_use]
    pub fn headers(&self) -> &HeaderVec {
        &self.headers
    }

    /// Non-empty path segments, in order.
    #[must_use]
    pub fn path_args(&self) -> &[String] {
        &self.path_args
    }

    /// Raw query pairs in the order they were sent.
    #[must_use]
    pub fn query(&self) -> &[(String, String)] {
        &self.query
    }

    /// Get a query parameter by name
    ///
    /// Uses "last write wins" semantics for repeated parameters.
    #[inline]
    #[must_use]
    pub fn get_query_param(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .rfind(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Query parameters folded into keyword arguments.
    #[must_use]
    pub fn query_kwargs(&self) -> Kwargs {
        let mut kwargs = Kwargs::new();
        for (key, value) in &self.query {
            let value = Value::String(value.clone());
            match kwargs.get_mut(key) {
                Some(Value::Array(values)) => values.push(value),
                Some(existing) => {
                    let first = existing.take();
                    *existing = Value::Array(vec![first, value]);
                }
                None => {
                    kwargs.insert(key.clone(), value);
                }
            }
        }
        kwargs
    }

    /// Parsed `Accept` header (empty when absent).
    #[must_use]
    pub fn accept(&self) -> AcceptHeader {
        AcceptHeader::from_header(self.get_header("accept"))
    }

    /// Version requested through the `Accept` header for `content_type`.
    ///
    /// This accessor never enforces anything: it returns `None` when the
    /// header is missing or carries no `version` parameter. Use
    /// [`negotiate_version`](crate::route::negotiate_version) to apply a
    /// default and fail with 406.
    #[must_use]
    pub fn version(&self, content_type: &str) -> Option<String> {
        let version = self.accept().version(content_type).map(str::to_string);
        debug!(
            request_id = %self.request_id,
            content_type = %content_type,
            version = ?version,
            "Accept header version extracted"
        );
        version
    }
}
