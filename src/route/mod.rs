//! Route overrides: choosing between alternative implementations of one
//! visible method.
//!
//! A class may bind several methods (`GET_1`, `GET_2`) to the visible name
//! `GET`, each guarded by a [`RouteOverride`] predicate. At dispatch time the
//! alternatives are tried in declaration order and the first match runs.
//! When none match, the first declared alternative decides how the request
//! fails.
//!
//! Predicates in this module:
//!
//! - [`FnRoute`]: an arbitrary closure over the request (405 on failure)
//! - [`PathRoute`]: leading path arguments must equal fixed values (405)
//! - [`ParamRoute`]: required query keys and optional value matches (400)
//! - [`VersionRoute`]: the negotiated `Accept` version must be listed (406)

mod predicate;
mod version;

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::error::CallError;
use crate::router::ResolutionResult;
use crate::server::CallRequest;

pub use predicate::{FnRoute, ParamMatch, ParamRoute, PathRoute};
pub use version::{negotiate_version, VersionRoute};

/// What a predicate can see: the request and the resolution that led to it.
#[derive(Clone, Copy)]
pub struct RouteContext<'a> {
    pub request: &'a CallRequest,
    pub resolution: &'a ResolutionResult,
}

impl<'a> RouteContext<'a> {
    #[must_use]
    pub fn new(request: &'a CallRequest, resolution: &'a ResolutionResult) -> Self {
        Self { request, resolution }
    }

    /// Content type declared by the resolved class.
    #[must_use]
    pub fn content_type(&self) -> Option<&'a str> {
        self.resolution.class.content_type()
    }

    /// Version the resolved class assumes when the client names none.
    #[must_use]
    pub fn default_version(&self) -> Option<&'a str> {
        self.resolution.class.default_version()
    }

    #[must_use]
    pub fn args(&self) -> &'a [String] {
        &self.resolution.positional_args
    }
}

/// Predicate guarding one alternative implementation of a method.
pub trait RouteOverride: Send + Sync {
    /// Whether this alternative should serve the request.
    ///
    /// An `Err` aborts selection and becomes the response.
    fn matches(&self, ctx: &RouteContext<'_>) -> Result<bool, CallError>;

    /// Error raised when no alternative in the group matched and this
    /// predicate belongs to the first declared alternative.
    fn failure(&self, ctx: &RouteContext<'_>) -> CallError {
        unsatisfied(ctx)
    }
}

/// 405 "Could not find a method to satisfy {path}".
pub(crate) fn unsatisfied(ctx: &RouteContext<'_>) -> CallError {
    CallError::method_not_allowed(format!(
        "Could not find a method to satisfy {}",
        ctx.request.path
    ))
}

/// One candidate implementation for a visible method name.
#[derive(Clone)]
pub struct Alternative {
    /// Concrete method name (`GET_1`)
    pub name: String,
    pub predicate: Arc<dyn RouteOverride>,
}

impl fmt::Debug for Alternative {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Alternative").field("name", &self.name).finish_non_exhaustive()
    }
}

/// Visible method name to its ordered alternatives.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    groups: BTreeMap<String, Vec<Alternative>>,
}

impl RouteTable {
    /// Append `alternative` to the group for `visible`, keeping declaration order.
    pub fn push(&mut self, visible: &str, alternative: Alternative) {
        self.groups
            .entry(visible.to_string())
            .or_default()
            .push(alternative);
    }

    #[must_use]
    pub fn alternatives(&self, visible: &str) -> Option<&[Alternative]> {
        self.groups.get(visible).map(Vec::as_slice)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Pick the concrete method for `visible`.
    ///
    /// `Ok(None)` means the class has no override group under that name and
    /// the plain method (if any) should be used.
    pub fn select(&self, visible: &str, ctx: &RouteContext<'_>) -> Result<Option<&str>, CallError> {
        let Some(alternatives) = self.alternatives(visible) else {
            return Ok(None);
        };
        for alternative in alternatives {
            if alternative.predicate.matches(ctx)? {
                debug!(
                    request_id = %ctx.request.request_id,
                    visible = %visible,
                    selected = %alternative.name,
                    "Route override selected"
                );
                return Ok(Some(alternative.name.as_str()));
            }
        }
        debug!(
            request_id = %ctx.request.request_id,
            visible = %visible,
            candidates = alternatives.len(),
            "No route override matched"
        );
        Err(match alternatives.first() {
            Some(first) => first.predicate.failure(ctx),
            None => unsatisfied(ctx),
        })
    }
}
