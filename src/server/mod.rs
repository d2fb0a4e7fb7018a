//! Request and response views exchanged with the transport adapter.
//!
//! The transport owns the socket and builds a [`CallRequest`]; the
//! dispatcher fills in a [`CallResponse`] that the transport writes back.

pub mod request;
pub mod response;

pub use request::{parse_query_params, split_path, CallRequest, HeaderVec, Kwargs, MAX_INLINE_HEADERS};
pub use response::{status_allows_body, status_reason, CallResponse};
