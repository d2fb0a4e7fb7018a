use std::collections::BTreeSet;

use super::{RouteContext, RouteOverride};
use crate::error::{CallError, ConfigError};
use crate::server::CallRequest;

/// Negotiate the version a request asks for through its `Accept` header.
///
/// Falls back to `default` when no matching media range carries a
/// `version` parameter. Fails with 406 when neither is available, and with a
/// configuration error when there is no content type to negotiate against.
pub fn negotiate_version(
    request: &CallRequest,
    content_type: Option<&str>,
    default: Option<&str>,
) -> Result<String, CallError> {
    let content_type = content_type.ok_or(ConfigError::MissingContentType)?;
    match request
        .version(content_type)
        .or_else(|| default.map(str::to_string))
    {
        Some(version) => Ok(version),
        None => Err(CallError::VersionMismatch {
            content_type: content_type.to_string(),
            requested: None,
            accepted: Vec::new(),
        }),
    }
}

/// Matches when the requested version is one of `versions`.
///
/// The requested version comes from the `Accept` header, else the class
/// default. A request with neither only matches when `""` is listed.
#[derive(Debug, Clone)]
pub struct VersionRoute {
    versions: BTreeSet<String>,
}

impl VersionRoute {
    #[must_use]
    pub fn new<I, S>(versions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            versions: versions.into_iter().map(Into::into).collect(),
        }
    }

    fn requested(&self, ctx: &RouteContext<'_>) -> Result<(String, Option<String>), CallError> {
        let content_type = ctx.content_type().ok_or(ConfigError::MissingContentType)?;
        let requested = ctx
            .request
            .version(content_type)
            .or_else(|| ctx.default_version().map(str::to_string));
        Ok((content_type.to_string(), requested))
    }
}

impl RouteOverride for VersionRoute {
    fn matches(&self, ctx: &RouteContext<'_>) -> Result<bool, CallError> {
        let (_, requested) = self.requested(ctx)?;
        Ok(self.versions.contains(requested.as_deref().unwrap_or("")))
    }

    fn failure(&self, ctx: &RouteContext<'_>) -> CallError {
        match self.requested(ctx) {
            Ok((content_type, requested)) => CallError::VersionMismatch {
                content_type,
                requested,
                accepted: self.versions.iter().cloned().collect(),
            },
            Err(e) => e,
        }
    }
}
