//! # Media Type Module
//!
//! Parses `Accept` header values into ordered media-type entries and filters
//! them against a content type. The dispatcher uses this to pull a
//! `version=N` parameter out of the client's preferred media type for
//! content-type based API versioning:
//!
//! ```rust
//! use endpoints::media::AcceptHeader;
//!
//! let accept = AcceptHeader::parse("text/html;q=0.5, application/json;version=v2");
//! assert_eq!(accept.version("application/json"), Some("v2"));
//! ```
//!
//! Parsing never fails: malformed entries are skipped and an empty header
//! yields no entries.

mod accept;

pub use accept::{AcceptHeader, MediaTypeEntry};
