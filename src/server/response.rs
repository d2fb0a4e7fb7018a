use serde::Serialize;
use serde_json::Value;

use super::request::{find_header, replace_header, HeaderVec};

/// Reason phrase for the status codes this crate produces.
#[must_use]
pub fn status_reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        201 => "Created",
        204 => "No Content",
        205 => "Reset Content",
        301 => "Moved Permanently",
        302 => "Found",
        304 => "Not Modified",
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        405 => "Method Not Allowed",
        406 => "Not Acceptable",
        500 => "Internal Server Error",
        _ => "Unknown",
    }
}

/// Whether a response with `status` may carry a body (RFC 7230 §3.3).
#[must_use]
pub fn status_allows_body(status: u16) -> bool {
    !((100..200).contains(&status) || status == 204 || status == 304)
}

/// Response sink populated by the dispatcher and handed back to the transport.
#[derive(Debug, Clone, Serialize)]
pub struct CallResponse {
    /// HTTP status code (200 unless something says otherwise)
    pub status: u16,
    /// HTTP response headers
    #[serde(skip_serializing)]
    pub headers: HeaderVec,
    body: Option<Value>,
}

impl Default for CallResponse {
    fn default() -> Self {
        Self::new()
    }
}

impl CallResponse {
    #[must_use]
    pub fn new() -> Self {
        Self {
            status: 200,
            headers: HeaderVec::new(),
            body: None,
        }
    }

    /// Create a JSON response with a content type header
    #[must_use]
    pub fn json(status: u16, body: Value) -> Self {
        let mut res = Self::new();
        res.status = status;
        res.set_header("content-type", "application/json".to_string());
        res.set_body(body);
        res
    }

    /// Create an error response with an `{"error": message}` body
    #[must_use]
    pub fn error(status: u16, message: &str) -> Self {
        Self::json(status, serde_json::json!({ "error": message }))
    }

    /// Set the body. `null` clears it.
    pub fn set_body(&mut self, body: Value) {
        self.body = match body {
            Value::Null => None,
            other => Some(other),
        };
    }

    pub fn clear_body(&mut self) {
        self.body = None;
    }

    /// The body, unless the status forbids one.
    #[must_use]
    pub fn body(&self) -> Option<&Value> {
        if status_allows_body(self.status) {
            self.body.as_ref()
        } else {
            None
        }
    }

    /// The body serialized as JSON bytes; empty when there is no body.
    #[must_use]
    pub fn body_bytes(&self) -> Vec<u8> {
        self.body()
            .and_then(|b| serde_json::to_vec(b).ok())
            .unwrap_or_default()
    }

    /// Get a header by name
    #[inline]
    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    /// Add or update a header
    pub fn set_header(&mut self, name: &str, value: String) {
        replace_header(&mut self.headers, name, value);
    }

    #[must_use]
    pub fn reason(&self) -> &'static str {
        status_reason(self.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_reason() {
        assert_eq!(status_reason(200), "OK");
        assert_eq!(status_reason(404), "Not Found");
        assert_eq!(status_reason(406), "Not Acceptable");
    }

    #[test]
    fn test_bodiless_statuses_hide_body() {
        let mut res = CallResponse::new();
        res.set_body(json!("this is ignored"));
        res.status = 204;
        assert!(res.body().is_none());
        assert!(res.body_bytes().is_empty());
        res.status = 200;
        assert_eq!(res.body(), Some(&json!("this is ignored")));
        assert_eq!(res.body_bytes(), b"\"this is ignored\"".to_vec());
    }

    #[test]
    fn test_null_clears_body() {
        let mut res = CallResponse::json(200, json!({"a": 1}));
        res.set_body(Value::Null);
        assert!(res.body().is_none());
        assert_eq!(res.get_header("Content-Type"), Some("application/json"));
    }

    #[test]
    fn test_error_body() {
        let res = CallResponse::error(404, "nope");
        assert_eq!(res.status, 404);
        assert_eq!(res.body(), Some(&json!({"error": "nope"})));
    }
}
